//! Helper service configuration.
//!
//! Defaults match the bundled helper layout; each value can be overridden
//! from the environment.

use std::time::Duration;

pub const ENV_HELPER_CMD: &str = "EMBDL_HELPER_CMD";
pub const ENV_HELPER_URL: &str = "EMBDL_HELPER_URL";
pub const ENV_STARTUP_WAIT_MS: &str = "EMBDL_STARTUP_WAIT_MS";
pub const ENV_TIMEOUT_SECS: &str = "EMBDL_TIMEOUT_SECS";
pub const ENV_STOP_GRACE_MS: &str = "EMBDL_STOP_GRACE_MS";

pub const DEFAULT_HELPER_CMD: &str = "python src/downloader/app.py";
pub const DEFAULT_HELPER_URL: &str = "http://127.0.0.1:5000/download";
pub const DEFAULT_STARTUP_WAIT_MS: u64 = 5000;
pub const DEFAULT_STOP_GRACE_MS: u64 = 3000;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// Program followed by its arguments.
    pub helper_command: Vec<String>,
    /// Base address and path of the download endpoint, without a query.
    pub endpoint: String,
    /// How long to wait for the helper to accept connections after spawn.
    pub startup_wait: Duration,
    /// Per-request timeout. `None` blocks until the helper answers.
    pub request_timeout: Option<Duration>,
    /// Time the helper gets to exit after SIGTERM before it is killed.
    pub stop_grace: Duration,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            helper_command: split_command(DEFAULT_HELPER_CMD),
            endpoint: DEFAULT_HELPER_URL.to_string(),
            startup_wait: Duration::from_millis(DEFAULT_STARTUP_WAIT_MS),
            request_timeout: None,
            stop_grace: Duration::from_millis(DEFAULT_STOP_GRACE_MS),
        }
    }
}

impl ServiceConfig {
    /// Defaults overridden by any `EMBDL_*` variables that are set.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as `from_env`, reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Self::default();

        if let Some(cmd) = lookup(ENV_HELPER_CMD) {
            let parts = split_command(&cmd);
            if parts.is_empty() {
                log::warn!("embdl: {} is blank, using default", ENV_HELPER_CMD);
            } else {
                config.helper_command = parts;
            }
        }

        if let Some(url) = lookup(ENV_HELPER_URL) {
            let url = url.trim();
            if url.is_empty() {
                log::warn!("embdl: {} is blank, using default", ENV_HELPER_URL);
            } else {
                config.endpoint = url.trim_end_matches('?').to_string();
            }
        }

        if let Some(ms) = lookup(ENV_STARTUP_WAIT_MS) {
            match ms.trim().parse::<u64>() {
                Ok(ms) => config.startup_wait = Duration::from_millis(ms),
                Err(_) => log::warn!(
                    "embdl: invalid {}={:?}, using default",
                    ENV_STARTUP_WAIT_MS,
                    ms
                ),
            }
        }

        if let Some(secs) = lookup(ENV_TIMEOUT_SECS) {
            match secs.trim().parse::<u64>() {
                Ok(0) => config.request_timeout = None,
                Ok(s) => config.request_timeout = Some(Duration::from_secs(s)),
                Err(_) => log::warn!(
                    "embdl: invalid {}={:?}, requests will not time out",
                    ENV_TIMEOUT_SECS,
                    secs
                ),
            }
        }

        if let Some(ms) = lookup(ENV_STOP_GRACE_MS) {
            match ms.trim().parse::<u64>() {
                Ok(ms) => config.stop_grace = Duration::from_millis(ms),
                Err(_) => log::warn!(
                    "embdl: invalid {}={:?}, using default",
                    ENV_STOP_GRACE_MS,
                    ms
                ),
            }
        }

        config
    }

    /// Human-readable command line, for log and error messages.
    pub fn command_line(&self) -> String {
        self.helper_command.join(" ")
    }
}

fn split_command(cmd: &str) -> Vec<String> {
    cmd.split_whitespace().map(String::from).collect()
}
