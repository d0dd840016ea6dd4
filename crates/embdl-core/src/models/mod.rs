//! embdl data models.
//!
//! Small value types: what to fetch, where to put it. Everything here is
//! immutable once built and consumed by the dispatcher.

pub mod media;
pub mod request;

pub use media::MediaType;
pub use request::{DownloadRequest, OutputDir};
