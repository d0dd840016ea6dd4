//! Download dispatcher — turns requests into helper calls.
//!
//! One GET per `DownloadRequest`, issued in order on the calling thread. A
//! failed request is recorded and the batch moves on; only a stopped
//! helper aborts the batch.

use serde_json::Value;

use crate::error::DispatchError;
use crate::models::DownloadRequest;
use crate::service::HelperService;
use crate::transport::{HelperClient, RawResponse};

/// A helper response that reported success.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperReply {
    pub status: u16,
    /// Raw response text, unmodified.
    pub body: String,
    /// `video_title` from a JSON body, when present.
    pub title: Option<String>,
}

/// Outcome of a batch, one entry per request.
#[derive(Debug, Default)]
pub struct BatchReport {
    pub succeeded: Vec<(DownloadRequest, HelperReply)>,
    pub failed: Vec<(DownloadRequest, DispatchError)>,
}

impl BatchReport {
    pub fn total(&self) -> usize {
        self.succeeded.len() + self.failed.len()
    }

    pub fn is_clean(&self) -> bool {
        self.failed.is_empty()
    }

    /// `"N succeeded, M failed"`.
    pub fn summary(&self) -> String {
        format!(
            "{} succeeded, {} failed",
            self.succeeded.len(),
            self.failed.len()
        )
    }
}

/// Build the helper URL for one request.
///
/// `{endpoint}?url=..&type=..&dir=..&fn=..`, each value percent-encoded as
/// UTF-8. `OutputDir::CurrentDir` is resolved here.
pub fn build_request_url(
    endpoint: &str,
    request: &DownloadRequest,
) -> Result<String, DispatchError> {
    let dir = request
        .dir
        .resolve()
        .map_err(|e| DispatchError::CurrentDir(e.to_string()))?;

    Ok(format!(
        "{}?url={}&type={}&dir={}&fn={}",
        endpoint,
        urlencoding::encode(&request.url),
        urlencoding::encode(request.media_type.as_url_arg()),
        urlencoding::encode(&dir),
        urlencoding::encode(&request.filename),
    ))
}

/// Sort a raw response into success or rejection.
///
/// Non-2xx, or a JSON body carrying a non-null `error`, is a rejection.
/// Fields are read one at a time so a malformed one never hides another.
fn interpret(raw: RawResponse) -> Result<HelperReply, DispatchError> {
    let data: Value = serde_json::from_str(&raw.body).unwrap_or(Value::Null);

    let error = match &data["error"] {
        Value::Null => None,
        Value::String(msg) => Some(msg.clone()),
        other => Some(other.to_string()),
    };

    if !(200..300).contains(&raw.status) || error.is_some() {
        let message = error.unwrap_or_else(|| raw.body.trim().to_string());
        return Err(DispatchError::Rejected {
            status: raw.status,
            message,
        });
    }

    Ok(HelperReply {
        status: raw.status,
        title: data["video_title"].as_str().map(String::from),
        body: raw.body,
    })
}

pub struct Dispatcher<'a> {
    service: &'a HelperService,
    client: &'a dyn HelperClient,
    endpoint: &'a str,
}

impl<'a> Dispatcher<'a> {
    pub fn new(
        service: &'a HelperService,
        client: &'a dyn HelperClient,
        endpoint: &'a str,
    ) -> Self {
        Self {
            service,
            client,
            endpoint,
        }
    }

    /// Send one request. Fails without touching the network if the helper
    /// is not running.
    pub fn dispatch(&self, request: &DownloadRequest) -> Result<HelperReply, DispatchError> {
        if !self.service.is_running() {
            return Err(DispatchError::ServiceNotRunning);
        }

        let url = build_request_url(self.endpoint, request)?;
        log::debug!("embdl: GET {}", url);

        let raw = self.client.get(&url)?;
        log::info!("embdl: helper replied ({}): {}", raw.status, raw.body);
        interpret(raw)
    }

    /// Send every request in order, isolating failures.
    ///
    /// Returns `Err(ServiceNotRunning)` as soon as the helper is found
    /// offline; everything else lands in the report.
    pub fn run_batch<I>(&self, requests: I) -> Result<BatchReport, DispatchError>
    where
        I: IntoIterator<Item = DownloadRequest>,
    {
        let mut report = BatchReport::default();

        for request in requests {
            match self.dispatch(&request) {
                Ok(reply) => report.succeeded.push((request, reply)),
                Err(DispatchError::ServiceNotRunning) => {
                    return Err(DispatchError::ServiceNotRunning)
                }
                Err(e) => {
                    log::warn!("embdl: download failed for {}: {}", request, e);
                    report.failed.push((request, e));
                }
            }
        }

        Ok(report)
    }
}


#[cfg(test)]
mod tests {
    use super::stub::RecordingClient;
    use super::*;
    use crate::config::ServiceConfig;
    use crate::models::{MediaType, OutputDir};

    const ENDPOINT: &str = "http://127.0.0.1:5000/download";

    fn request(t: MediaType, dir: &str, filename: &str) -> DownloadRequest {
        DownloadRequest {
            url: "https://www.youtube.com/watch?v=abc&t=10".into(),
            media_type: t,
            dir: OutputDir::Path(dir.into()),
            filename: filename.into(),
        }
    }

    fn stopped_service() -> HelperService {
        HelperService::new(&ServiceConfig::default())
    }

    #[cfg(unix)]
    fn running_service() -> HelperService {
        let config = ServiceConfig {
            helper_command: vec!["sleep".into(), "30".into()],
            ..ServiceConfig::default()
        };
        let svc = HelperService::new(&config);
        svc.start().unwrap();
        svc
    }

    #[test]
    fn request_url_encodes_every_field() {
        let req = request(MediaType::Both, "/home/me/My Videos", "clip #1");
        let url = build_request_url(ENDPOINT, &req).unwrap();
        assert_eq!(
            url,
            "http://127.0.0.1:5000/download\
             ?url=https%3A%2F%2Fwww.youtube.com%2Fwatch%3Fv%3Dabc%26t%3D10\
             &type=video-and-audio\
             &dir=%2Fhome%2Fme%2FMy%20Videos\
             &fn=clip%20%231"
        );
    }

    #[test]
    fn request_url_encodes_non_ascii_as_utf8() {
        let req = request(MediaType::AudioOnly, "/tmp", "café");
        let url = build_request_url(ENDPOINT, &req).unwrap();
        assert!(url.ends_with("&type=audio&dir=%2Ftmp&fn=caf%C3%A9"), "{url}");
    }

    #[test]
    fn current_dir_sentinel_resolves_to_cwd() {
        let mut req = request(MediaType::VideoOnly, "/unused", "f");
        req.dir = OutputDir::CurrentDir;
        let url = build_request_url(ENDPOINT, &req).unwrap();
        let cwd = std::env::current_dir().unwrap();
        let expected = urlencoding::encode(&cwd.to_string_lossy()).into_owned();
        assert!(url.contains(&format!("&dir={}&", expected)), "{url}");
    }

    #[test]
    fn dispatch_while_stopped_makes_no_call() {
        let svc = stopped_service();
        let client = RecordingClient::ok();
        let dispatcher = Dispatcher::new(&svc, &client, ENDPOINT);

        let err = dispatcher
            .dispatch(&request(MediaType::Both, "/a", "f"))
            .unwrap_err();
        assert_eq!(err, DispatchError::ServiceNotRunning);

        let err = dispatcher
            .run_batch(vec![request(MediaType::Both, "/a", "f")])
            .unwrap_err();
        assert_eq!(err, DispatchError::ServiceNotRunning);
        assert_eq!(client.call_count(), 0);
    }

    #[test]
    fn interpret_success_extracts_title() {
        let reply = interpret(RawResponse {
            status: 200,
            body: r#"{"message": "Download successful!", "video_title": "Clip", "video_size": 10}"#
                .into(),
        })
        .unwrap();
        assert_eq!(reply.title.as_deref(), Some("Clip"));
        assert_eq!(reply.status, 200);
    }

    #[test]
    fn interpret_accepts_opaque_text() {
        let reply = interpret(RawResponse {
            status: 200,
            body: "done".into(),
        })
        .unwrap();
        assert_eq!(reply.body, "done");
        assert_eq!(reply.title, None);
    }

    #[test]
    fn interpret_rejects_error_status() {
        let err = interpret(RawResponse {
            status: 400,
            body: r#"{"error": "DownloadErrorUnsupported URL"}"#.into(),
        })
        .unwrap_err();
        assert_eq!(
            err,
            DispatchError::Rejected {
                status: 400,
                message: "DownloadErrorUnsupported URL".into()
            }
        );
    }

    #[test]
    fn interpret_rejects_error_body_with_ok_status() {
        let err = interpret(RawResponse {
            status: 200,
            body: r#"{"error": "Missing 'fn' parameter"}"#.into(),
        })
        .unwrap_err();
        assert!(matches!(err, DispatchError::Rejected { status: 200, .. }));
    }

    #[test]
    fn interpret_error_survives_malformed_sibling_field() {
        let err = interpret(RawResponse {
            status: 200,
            body: r#"{"error": "x", "video_title": 5}"#.into(),
        })
        .unwrap_err();
        assert_eq!(
            err,
            DispatchError::Rejected {
                status: 200,
                message: "x".into()
            }
        );
    }

    #[test]
    fn interpret_non_string_error_is_still_rejection() {
        let err = interpret(RawResponse {
            status: 200,
            body: r#"{"error": {"code": 7}}"#.into(),
        })
        .unwrap_err();
        assert_eq!(
            err,
            DispatchError::Rejected {
                status: 200,
                message: r#"{"code":7}"#.into()
            }
        );
    }

    #[test]
    fn interpret_ignores_non_string_title() {
        let reply = interpret(RawResponse {
            status: 200,
            body: r#"{"message": "Download successful!", "video_title": 5}"#.into(),
        })
        .unwrap();
        assert_eq!(reply.title, None);
    }

    #[test]
    fn interpret_rejects_plain_text_error_status() {
        let err = interpret(RawResponse {
            status: 500,
            body: "Internal Server Error\n".into(),
        })
        .unwrap_err();
        assert_eq!(
            err,
            DispatchError::Rejected {
                status: 500,
                message: "Internal Server Error".into()
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn batch_issues_one_request_per_combination() {
        let svc = running_service();
        let client = RecordingClient::ok();
        let dispatcher = Dispatcher::new(&svc, &client, ENDPOINT);

        let requests = vec![
            request(MediaType::VideoOnly, "/a", "f"),
            request(MediaType::VideoOnly, "/b", "f"),
            request(MediaType::AudioOnly, "/a", "f"),
            request(MediaType::AudioOnly, "/b", "f"),
        ];
        let report = dispatcher.run_batch(requests).unwrap();

        assert_eq!(report.total(), 4);
        assert!(report.is_clean());
        let calls = client.calls.borrow();
        assert_eq!(calls.len(), 4);
        for (t, d) in [("video", "%2Fa"), ("video", "%2Fb"), ("audio", "%2Fa"), ("audio", "%2Fb")] {
            let pair = format!("&type={}&dir={}&fn=f", t, d);
            assert_eq!(calls.iter().filter(|c| c.contains(&pair)).count(), 1, "{pair}");
        }
    }

    #[cfg(unix)]
    #[test]
    fn transport_failure_does_not_stop_batch() {
        let svc = running_service();
        let client = RecordingClient::scripted(vec![
            None,
            Some(RawResponse {
                status: 400,
                body: r#"{"error": "bad"}"#.into(),
            }),
            Some(RawResponse {
                status: 200,
                body: r#"{"video_title": "ok"}"#.into(),
            }),
        ]);
        let dispatcher = Dispatcher::new(&svc, &client, ENDPOINT);

        let report = dispatcher
            .run_batch(vec![
                request(MediaType::Both, "/a", "one"),
                request(MediaType::Both, "/a", "two"),
                request(MediaType::Both, "/a", "three"),
            ])
            .unwrap();

        assert_eq!(client.call_count(), 3);
        assert_eq!(report.summary(), "1 succeeded, 2 failed");
        assert_eq!(report.failed[0].0.filename, "one");
        assert!(matches!(report.failed[0].1, DispatchError::Transport(_)));
        assert_eq!(report.failed[1].0.filename, "two");
        assert_eq!(report.succeeded[0].0.filename, "three");
        assert_eq!(report.succeeded[0].1.title.as_deref(), Some("ok"));
    }

    #[cfg(unix)]
    #[test]
    fn batch_aborts_when_helper_goes_offline() {
        struct StopAfterFirst<'a> {
            svc: &'a HelperService,
            inner: RecordingClient,
        }
        impl HelperClient for StopAfterFirst<'_> {
            fn get(&self, url: &str) -> Result<RawResponse, DispatchError> {
                let resp = self.inner.get(url);
                self.svc.stop();
                resp
            }
        }

        let svc = running_service();
        let client = StopAfterFirst {
            svc: &svc,
            inner: RecordingClient::ok(),
        };
        let dispatcher = Dispatcher::new(&svc, &client, ENDPOINT);

        let err = dispatcher
            .run_batch(vec![
                request(MediaType::Both, "/a", "one"),
                request(MediaType::Both, "/a", "two"),
            ])
            .unwrap_err();
        assert_eq!(err, DispatchError::ServiceNotRunning);
        assert_eq!(client.inner.call_count(), 1);
    }
}
