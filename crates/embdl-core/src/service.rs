//! Helper service lifecycle.
//!
//! Owns the helper subprocess. `start` and `stop` are idempotent, and the
//! child is stopped when the handle is dropped, so early returns and panics
//! in the caller never leave a helper behind.
//!
//! Stopping asks first: on unix the helper gets SIGTERM and `stop_grace` to
//! exit (and take down any server process it forked), then SIGKILL.

use std::net::{SocketAddr, TcpStream, ToSocketAddrs};
use std::process::{Child, Command, Stdio};
use std::thread;
use std::time::{Duration, Instant};

use parking_lot::Mutex;

use crate::config::ServiceConfig;
use crate::error::ServiceError;

const READY_POLL: Duration = Duration::from_millis(100);
const CONNECT_TIMEOUT: Duration = Duration::from_millis(200);
#[cfg(unix)]
const STOP_POLL: Duration = Duration::from_millis(25);

/// Handle to the local helper process.
pub struct HelperService {
    command: Vec<String>,
    stop_grace: Duration,
    /// `Some` while running.
    child: Mutex<Option<Child>>,
}

impl HelperService {
    pub fn new(config: &ServiceConfig) -> Self {
        Self {
            command: config.helper_command.clone(),
            stop_grace: config.stop_grace,
            child: Mutex::new(None),
        }
    }

    /// Spawn the helper. No-op when already running.
    pub fn start(&self) -> Result<(), ServiceError> {
        let mut child = self.child.lock();
        if child.is_some() {
            return Ok(());
        }

        let (program, args) = self.command.split_first().ok_or(ServiceError::EmptyCommand)?;
        let spawned = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|source| ServiceError::Spawn {
                command: self.command.join(" "),
                source,
            })?;

        log::info!("embdl: helper started (pid {})", spawned.id());
        *child = Some(spawned);
        Ok(())
    }

    /// Terminate the helper. No-op when stopped; failures are only logged.
    pub fn stop(&self) {
        let Some(mut child) = self.child.lock().take() else {
            return;
        };
        let pid = child.id();

        terminate(&mut child, self.stop_grace);
        match child.wait() {
            Ok(status) => log::info!("embdl: helper stopped (pid {}, {})", pid, status),
            Err(e) => log::warn!("embdl: failed to reap helper (pid {}): {}", pid, e),
        }
    }

    pub fn is_running(&self) -> bool {
        self.child.lock().is_some()
    }

    /// OS process id of the running helper.
    pub fn pid(&self) -> Option<u32> {
        self.child.lock().as_ref().map(Child::id)
    }

    /// Block until the endpoint accepts TCP connections or `timeout` passes.
    ///
    /// Returns false when stopped, when the helper exits while we wait, or
    /// on timeout. A zero timeout skips the probe and reports the running
    /// state.
    pub fn wait_ready(&self, endpoint: &str, timeout: Duration) -> bool {
        if !self.is_running() {
            return false;
        }
        if timeout.is_zero() {
            return true;
        }

        let Some(addrs) = socket_addrs(endpoint) else {
            log::warn!("embdl: cannot resolve helper endpoint {}", endpoint);
            return false;
        };

        let deadline = Instant::now() + timeout;
        loop {
            if addrs
                .iter()
                .any(|addr| TcpStream::connect_timeout(addr, CONNECT_TIMEOUT).is_ok())
            {
                return true;
            }
            if self.exited_early() {
                log::warn!("embdl: helper exited before accepting connections");
                return false;
            }
            if Instant::now() >= deadline {
                log::warn!(
                    "embdl: helper not accepting connections at {} after {:?}",
                    endpoint,
                    timeout
                );
                return false;
            }
            thread::sleep(READY_POLL);
        }
    }

    fn exited_early(&self) -> bool {
        match self.child.lock().as_mut() {
            Some(child) => matches!(child.try_wait(), Ok(Some(_))),
            None => true,
        }
    }
}

/// SIGTERM, wait up to `grace` for the child to exit, then SIGKILL.
#[cfg(unix)]
fn terminate(child: &mut Child, grace: Duration) {
    let pid = child.id();

    match send_signal(pid, libc::SIGTERM) {
        Ok(()) => {
            let deadline = Instant::now() + grace;
            loop {
                match child.try_wait() {
                    Ok(Some(_)) => return,
                    Ok(None) if Instant::now() < deadline => thread::sleep(STOP_POLL),
                    Ok(None) => {
                        log::warn!(
                            "embdl: helper (pid {}) still running {:?} after SIGTERM, killing",
                            pid,
                            grace
                        );
                        break;
                    }
                    Err(e) => {
                        log::warn!("embdl: failed to poll helper (pid {}): {}", pid, e);
                        break;
                    }
                }
            }
        }
        Err(e) => log::warn!("embdl: failed to send SIGTERM to helper (pid {}): {}", pid, e),
    }

    if let Err(e) = child.kill() {
        log::warn!("embdl: failed to kill helper (pid {}): {}", pid, e);
    }
}

#[cfg(not(unix))]
fn terminate(child: &mut Child, _grace: Duration) {
    if let Err(e) = child.kill() {
        log::warn!("embdl: failed to kill helper (pid {}): {}", child.id(), e);
    }
}

#[cfg(unix)]
fn send_signal(pid: u32, signal: libc::c_int) -> std::io::Result<()> {
    let pid = libc::pid_t::try_from(pid)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidInput, e))?;
    // SAFETY: kill(2) takes plain integers and touches no memory of ours.
    if unsafe { libc::kill(pid, signal) } == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

impl Drop for HelperService {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Host and port of an `http://` or `https://` endpoint.
fn socket_addrs(endpoint: &str) -> Option<Vec<SocketAddr>> {
    let uri: ureq::http::Uri = endpoint.parse().ok()?;
    let host = uri.host()?.trim_start_matches('[').trim_end_matches(']');
    let port = uri
        .port_u16()
        .unwrap_or(if uri.scheme_str() == Some("https") { 443 } else { 80 });
    let addrs: Vec<SocketAddr> = (host, port).to_socket_addrs().ok()?.collect();
    if addrs.is_empty() {
        None
    } else {
        Some(addrs)
    }
}
