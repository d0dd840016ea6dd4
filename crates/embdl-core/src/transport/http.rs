//! HTTP transport to the helper — a single blocking GET per request.
//!
//! Non-2xx statuses are returned as responses, not errors, so the helper's
//! error body reaches the caller.

use std::time::Duration;

use ureq::Agent;

use super::{HelperClient, RawResponse};
use crate::error::DispatchError;

pub struct UreqClient {
    agent: Agent,
}

impl UreqClient {
    /// `timeout` bounds each whole request; `None` waits indefinitely.
    pub fn new(timeout: Option<Duration>) -> Self {
        let config = Agent::config_builder()
            .http_status_as_error(false)
            .timeout_global(timeout)
            .proxy(None)
            .build();
        Self {
            agent: config.into(),
        }
    }
}

impl Default for UreqClient {
    fn default() -> Self {
        Self::new(None)
    }
}

impl HelperClient for UreqClient {
    fn get(&self, url: &str) -> Result<RawResponse, DispatchError> {
        let mut response = self
            .agent
            .get(url)
            .call()
            .map_err(|e| DispatchError::Transport(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .body_mut()
            .read_to_string()
            .map_err(|e| DispatchError::Body(e.to_string()))?;
        Ok(RawResponse { status, body })
    }
}
