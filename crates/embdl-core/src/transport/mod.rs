/// Status and full text body of a helper response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub body: String,
}

/// Blocking GET against the helper service.
///
/// The dispatcher only talks to the network through this trait. `UreqClient`
/// is the real implementation; tests substitute recording stubs.
pub trait HelperClient {
    fn get(&self, url: &str) -> Result<RawResponse, crate::error::DispatchError>;
}

pub mod http;

pub use http::UreqClient;
