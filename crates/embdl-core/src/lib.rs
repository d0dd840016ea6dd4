//! embdl-core — download orchestration over a local media helper.
//!
//! The helper service does the actual fetching and muxing. This crate parses
//! what the user wants, keeps the helper process alive for the duration of a
//! batch, and sends it one request per combination.
//!
//! # Pipeline
//!
//! ```text
//! args::parse ─▶ HelperService::start ─▶ Dispatcher::run_batch ─▶ HelperService::stop
//!                  (Drop stops it too)       (BatchReport)
//! ```

pub mod args;
pub mod config;
pub mod dispatch;
pub mod error;
pub mod models;
pub mod service;
pub mod transport;

pub use args::{parse, ParsedArguments, USAGE};
pub use config::ServiceConfig;
pub use dispatch::{BatchReport, Dispatcher, HelperReply};
pub use error::{ArgsError, DispatchError, ServiceError, UsageError};
pub use models::*;
pub use service::HelperService;
pub use transport::{HelperClient, UreqClient};
