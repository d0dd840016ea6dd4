//! Command-line parsing.
//!
//! Flags use the single-dash long style (`-url`, `-dir`, `-vt`), so this is a
//! small hand-rolled scanner rather than a derive parser. Every flag takes
//! exactly one value; all but `-url` may repeat.

use std::collections::BTreeSet;

use chrono::Local;

use crate::error::{ArgsError, UsageError};
use crate::models::{DownloadRequest, MediaType, OutputDir};

pub const USAGE: &str = "\
Usage: embdl -url <url> [--video-type|-vt <type>]... [-dir <path>]... [--filename|-fn <name>]...

  -url           - The URL of the video
                   (required: yes; duplicates: no)
  --video-type   - The type of the video to download
                   (required: no; options: 'both', 'video', 'audio'; default: 'both'; duplicates: yes)
  -vt            - Shortcut for --video-type
  -dir           - The directory where the video will be saved (absolute path)
                   (required: no; default: the current directory; duplicates: yes)
  --filename     - The name of the file, without extension
                   (required: no; default: 'emb_' + current time; duplicates: yes)
  -fn            - Shortcut for --filename

Environment:
  EMBDL_HELPER_CMD       helper command line (default: python src/downloader/app.py)
  EMBDL_HELPER_URL       helper endpoint (default: http://127.0.0.1:5000/download)
  EMBDL_STARTUP_WAIT_MS  wait for the helper to accept connections (default: 5000, 0 disables)
  EMBDL_TIMEOUT_SECS     per-request timeout (default: none)
  EMBDL_STOP_GRACE_MS    time the helper gets to exit after SIGTERM (default: 3000)
  RUST_LOG               log filter (e.g. info, debug)";

/// Validated arguments with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedArguments {
    pub url: String,
    pub media_types: BTreeSet<MediaType>,
    pub dirs: BTreeSet<OutputDir>,
    pub filenames: BTreeSet<String>,
}

impl ParsedArguments {
    /// Cross product of media types × directories × filenames.
    pub fn requests(&self) -> Vec<DownloadRequest> {
        let mut out =
            Vec::with_capacity(self.media_types.len() * self.dirs.len() * self.filenames.len());
        for media_type in &self.media_types {
            for dir in &self.dirs {
                for filename in &self.filenames {
                    out.push(DownloadRequest {
                        url: self.url.clone(),
                        media_type: *media_type,
                        dir: dir.clone(),
                        filename: filename.clone(),
                    });
                }
            }
        }
        out
    }
}

/// `"emb_"` followed by the local date-time, e.g. `emb_2024-05-01T09:30:12.345678901`.
pub fn default_filename() -> String {
    format!("emb_{}", Local::now().format("%Y-%m-%dT%H:%M:%S%.f"))
}

/// Parse raw tokens (program name already stripped).
///
/// A repeated `-url` is recorded and scanning resumes at the token right
/// after the flag, so the repeated value is itself scanned. Any other error
/// stops the scan. The parse fails if anything was recorded.
pub fn parse<I>(tokens: I) -> Result<ParsedArguments, UsageError>
where
    I: IntoIterator,
    I::Item: Into<String>,
{
    let tokens: Vec<String> = tokens.into_iter().map(Into::into).collect();

    let mut url: Option<String> = None;
    let mut media_types = BTreeSet::new();
    let mut dirs = BTreeSet::new();
    let mut filenames = BTreeSet::new();
    let mut errors = Vec::new();

    let mut i = 0;
    while i < tokens.len() {
        let step = match tokens[i].as_str() {
            "-url" => {
                if url.is_some() {
                    errors.push(ArgsError::DuplicateUrl);
                    i += 1;
                    continue;
                }
                value_at(&tokens, i, "-url").map(|v| url = Some(v.to_string()))
            }
            "-vt" | "--video-type" => value_at(&tokens, i, "--video-type or -vt")
                .and_then(|v| v.parse::<MediaType>())
                .map(|t| {
                    media_types.insert(t);
                }),
            "-dir" => value_at(&tokens, i, "-dir").map(|v| {
                dirs.insert(OutputDir::Path(v.to_string()));
            }),
            "-fn" | "--filename" => value_at(&tokens, i, "--filename or -fn").map(|v| {
                filenames.insert(v.to_string());
            }),
            other => Err(ArgsError::UnexpectedArgument(other.to_string())),
        };

        if let Err(e) = step {
            errors.push(e);
            return Err(UsageError { errors });
        }
        i += 2;
    }

    if !errors.is_empty() {
        return Err(UsageError { errors });
    }

    let url = match url {
        Some(u) => u,
        None => {
            return Err(UsageError {
                errors: vec![ArgsError::MissingUrl],
            })
        }
    };

    if media_types.is_empty() {
        media_types.insert(MediaType::Both);
    }
    if filenames.is_empty() {
        filenames.insert(default_filename());
    }
    if dirs.is_empty() {
        dirs.insert(OutputDir::CurrentDir);
    }

    Ok(ParsedArguments {
        url,
        media_types,
        dirs,
        filenames,
    })
}

fn value_at<'a>(tokens: &'a [String], i: usize, flag: &'static str) -> Result<&'a str, ArgsError> {
    tokens
        .get(i + 1)
        .map(String::as_str)
        .ok_or(ArgsError::MissingValue(flag))
}
