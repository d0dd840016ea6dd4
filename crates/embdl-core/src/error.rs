//! Error types for each stage: argument parsing, helper lifecycle, dispatch.

use thiserror::Error;

/// A single problem found on the command line.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgsError {
    #[error("Duplicate argument for -url")]
    DuplicateUrl,

    #[error("Missing value for {0}")]
    MissingValue(&'static str),

    #[error("Unexpected argument given: {0}")]
    UnexpectedArgument(String),

    #[error("invalid video type. got: {0}; expected 'both', 'video' or 'audio'")]
    InvalidMediaType(String),

    #[error("Missing URL argument")]
    MissingUrl,
}

/// Parsing failed. Holds every error recorded, in the order seen.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid arguments ({} error(s))", .errors.len())]
pub struct UsageError {
    pub errors: Vec<ArgsError>,
}

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("helper command is empty")]
    EmptyCommand,

    #[error("failed to start helper `{command}`: {source}")]
    Spawn {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DispatchError {
    #[error("cannot download while the helper service is offline")]
    ServiceNotRunning,

    #[error("cannot resolve current directory: {0}")]
    CurrentDir(String),

    #[error("request to helper failed: {0}")]
    Transport(String),

    #[error("failed to read helper response: {0}")]
    Body(String),

    #[error("helper rejected download (HTTP {status}): {message}")]
    Rejected { status: u16, message: String },
}
