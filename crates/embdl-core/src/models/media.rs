//! Media selection types.
//!
//! The CLI speaks `both`/`video`/`audio`; the helper service speaks
//! `video-and-audio`/`video`/`audio`. `MediaType` sits between the two.

use std::fmt;
use std::str::FromStr;

use crate::error::ArgsError;

/// Which streams of the source video to download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MediaType {
    Both,
    VideoOnly,
    AudioOnly,
}

impl MediaType {
    /// Token sent to the helper in the `type` query parameter.
    pub fn as_url_arg(&self) -> &'static str {
        match self {
            MediaType::Both => "video-and-audio",
            MediaType::VideoOnly => "video",
            MediaType::AudioOnly => "audio",
        }
    }

    /// Token accepted on the command line.
    pub fn as_cli_arg(&self) -> &'static str {
        match self {
            MediaType::Both => "both",
            MediaType::VideoOnly => "video",
            MediaType::AudioOnly => "audio",
        }
    }
}

impl FromStr for MediaType {
    type Err = ArgsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "both" => Ok(MediaType::Both),
            "video" => Ok(MediaType::VideoOnly),
            "audio" => Ok(MediaType::AudioOnly),
            other => Err(ArgsError::InvalidMediaType(other.to_string())),
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_cli_arg())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_cli_tokens() {
        assert_eq!("both".parse::<MediaType>().unwrap(), MediaType::Both);
        assert_eq!("video".parse::<MediaType>().unwrap(), MediaType::VideoOnly);
        assert_eq!("audio".parse::<MediaType>().unwrap(), MediaType::AudioOnly);
    }

    #[test]
    fn url_args_match_helper_tokens() {
        let pairs = [
            ("both", "video-and-audio"),
            ("video", "video"),
            ("audio", "audio"),
        ];
        for (cli, url) in pairs {
            let t: MediaType = cli.parse().unwrap();
            assert_eq!(t.as_url_arg(), url);
            assert_eq!(t.to_string(), cli);
        }
    }

    #[test]
    fn rejects_unknown_tokens() {
        for bad in ["", "Both", "VIDEO", "video-and-audio", "mp3"] {
            assert_eq!(
                bad.parse::<MediaType>(),
                Err(ArgsError::InvalidMediaType(bad.to_string()))
            );
        }
    }
}
