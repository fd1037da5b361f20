//! Pipeline configuration with environment overrides.

use crate::dedup::{DEFAULT_TTL, Deduplicator};
use crate::report::{Deliver, ReportContext, Reporter};
use crate::transport::HttpTransport;
use faultline_common::{INGEST_PATH, SERVER_PORT};
use std::sync::Arc;
use std::time::Duration;

/// Capture pipeline configuration.
///
/// Environment variables mirror the CLI's `FAULTLINE_LOG` convention:
/// `FAULTLINE_ENDPOINT` overrides the full ingestion URL and
/// `FAULTLINE_DEDUP_TTL_MS` the suppression window.
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Full URL of the ingestion endpoint, including the path.
    pub endpoint: String,
    /// Trailing window during which identical records are suppressed.
    pub dedup_ttl: Duration,
    /// Host application location stamped onto records.
    pub url: String,
    /// Client identification stamped onto records.
    pub user_agent: String,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            endpoint: format!("http://127.0.0.1:{SERVER_PORT}{INGEST_PATH}"),
            dedup_ttl: DEFAULT_TTL,
            url: String::new(),
            user_agent: concat!("faultline/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl CaptureConfig {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(endpoint) = std::env::var("FAULTLINE_ENDPOINT") {
            config.endpoint = endpoint;
        }
        if let Some(ttl_ms) = std::env::var("FAULTLINE_DEDUP_TTL_MS")
            .ok()
            .and_then(|raw| raw.parse::<u64>().ok())
        {
            config.dedup_ttl = Duration::from_millis(ttl_ms);
        }
        config
    }

    /// Build the shared reporter over an HTTP transport.
    /// Must be called from within a tokio runtime.
    pub fn build_reporter(&self) -> Result<Arc<Reporter>, String> {
        let transport = HttpTransport::new(self.endpoint.clone())?;
        Ok(Arc::new(Reporter::new(
            Deduplicator::new(self.dedup_ttl),
            Arc::new(transport) as Arc<dyn Deliver>,
            ReportContext {
                url: self.url.clone(),
                user_agent: self.user_agent.clone(),
            },
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_endpoint_targets_the_canonical_ingestion_path() {
        let config = CaptureConfig::default();
        assert!(config.endpoint.ends_with(INGEST_PATH));
        assert_eq!(config.dedup_ttl, Duration::from_millis(5000));
    }

    #[tokio::test]
    async fn build_reporter_succeeds_inside_a_runtime() {
        let config = CaptureConfig::default();
        assert!(config.build_reporter().is_ok());
    }
}
