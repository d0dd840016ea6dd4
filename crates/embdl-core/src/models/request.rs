//! One fully-described download: source, streams, destination.

use std::fmt;
use std::path::PathBuf;

use super::media::MediaType;

/// Output directory for a download.
///
/// `CurrentDir` is resolved when the request URL is built, not when the
/// arguments are parsed.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OutputDir {
    CurrentDir,
    Path(String),
}

impl OutputDir {
    /// Absolute directory string to hand to the helper.
    pub fn resolve(&self) -> std::io::Result<String> {
        match self {
            OutputDir::Path(p) => Ok(p.clone()),
            OutputDir::CurrentDir => {
                let cwd: PathBuf = std::env::current_dir()?;
                Ok(cwd.to_string_lossy().into_owned())
            }
        }
    }
}

impl fmt::Display for OutputDir {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OutputDir::CurrentDir => f.write_str("."),
            OutputDir::Path(p) => f.write_str(p),
        }
    }
}

/// A single (url, type, dir, filename) combination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub url: String,
    pub media_type: MediaType,
    pub dir: OutputDir,
    pub filename: String,
}

impl fmt::Display for DownloadRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} [{}] -> {}/{}",
            self.url, self.media_type, self.dir, self.filename
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn explicit_path_resolves_verbatim() {
        let dir = OutputDir::Path("/srv/media".into());
        assert_eq!(dir.resolve().unwrap(), "/srv/media");
    }

    #[test]
    fn current_dir_resolves_absolute() {
        let resolved = OutputDir::CurrentDir.resolve().unwrap();
        assert!(std::path::Path::new(&resolved).is_absolute());
    }

    #[test]
    fn display_is_compact() {
        let req = DownloadRequest {
            url: "https://example.com/v".into(),
            media_type: MediaType::AudioOnly,
            dir: OutputDir::Path("/tmp".into()),
            filename: "clip".into(),
        };
        assert_eq!(req.to_string(), "https://example.com/v [audio] -> /tmp/clip");
    }
}
