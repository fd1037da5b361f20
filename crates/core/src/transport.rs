//! Fire-and-forget HTTP delivery toward the ingestion endpoint.

use crate::report::Deliver;
use faultline_common::ErrorRecord;
use std::fmt;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT_SECS: u64 = 5;

/// Posts records as JSON to the fixed ingestion path and discards the
/// outcome. Delivery runs on a detached runtime task so `deliver` returns
/// immediately and works from any thread, including the panic-hook thread.
pub struct HttpTransport {
    client: reqwest::Client,
    endpoint: String,
    handle: tokio::runtime::Handle,
}

impl fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HttpTransport")
            .field("endpoint", &self.endpoint)
            .finish_non_exhaustive()
    }
}

impl HttpTransport {
    /// Build a transport targeting `endpoint` (full URL including the
    /// ingestion path). Must be called from within a tokio runtime; the
    /// runtime handle is captured here so later deliveries need none.
    pub fn new(endpoint: String) -> Result<Self, String> {
        let handle = tokio::runtime::Handle::try_current()
            .map_err(|_| "HttpTransport::new requires a running tokio runtime".to_string())?;
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()
            .map_err(|err| format!("Failed to create HTTP client: {err}"))?;
        Ok(Self {
            client,
            endpoint,
            handle,
        })
    }
}

impl Deliver for HttpTransport {
    fn deliver(&self, record: ErrorRecord) {
        let client = self.client.clone();
        let endpoint = self.endpoint.clone();
        // At-most-once-attempt: no retry, no queue. Success and failure both
        // end in the same no-op continuation.
        let _detached = self.handle.spawn(async move {
            match client.post(&endpoint).json(&record).send().await {
                Ok(_) => {}
                Err(err) => {
                    debug!(error = %err, "Dropped error report");
                }
            }
        });
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use faultline_common::INGEST_PATH;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn record(message: &str) -> ErrorRecord {
        ErrorRecord {
            message: message.into(),
            ..ErrorRecord::default()
        }
    }

    #[tokio::test]
    async fn delivers_record_as_json_post() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(INGEST_PATH))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(format!("{}{}", server.uri(), INGEST_PATH)).unwrap();
        transport.deliver(record("boom"));

        // Delivery is detached; poll until the mock has seen it.
        for _ in 0..50 {
            let requests = server.received_requests().await.unwrap_or_default();
            if !requests.is_empty() {
                let body: ErrorRecord = serde_json::from_slice(&requests[0].body).unwrap();
                assert_eq!(body.message, "boom");
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        unreachable!("record never reached the ingestion endpoint");
    }

    #[tokio::test]
    async fn network_failure_never_surfaces_to_the_caller() {
        // Nothing listens here; the connection is refused.
        let transport =
            HttpTransport::new(format!("http://127.0.0.1:9{}", INGEST_PATH)).unwrap();
        transport.deliver(record("offline"));
        transport.deliver(record("offline again"));
        tokio::time::sleep(Duration::from_millis(100)).await;
        // Reaching this point is the assertion: deliver returned and the
        // failed sends were swallowed on the detached task.
    }

    #[tokio::test]
    async fn response_errors_are_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path(INGEST_PATH))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let transport = HttpTransport::new(format!("{}{}", server.uri(), INGEST_PATH)).unwrap();
        transport.deliver(record("rejected"));
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
}
