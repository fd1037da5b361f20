//! faultline-core: the error capture and reporting pipeline.
//!
//! Four producers feed one pipeline: the global panic hook and task observer
//! ([`hooks`]), the log-layer capture ([`console::CaptureLayer`]), and the
//! render-failure boundary ([`boundary::RenderBoundary`]). Each normalizes a
//! failure into an [`ErrorRecord`], which flows through the [`Reporter`]
//! (deduplication) into a fire-and-forget [`transport`] toward the ingestion
//! server in [`server`]. The [`dev`] module is the development-time side
//! channel: tool errors into the same log, plus the debounced reload watcher.
//!
//! ```ignore
//! let config = CaptureConfig::from_env();
//! let reporter = config.build_reporter()?;
//! faultline_core::hooks::install(Arc::clone(&reporter));
//!
//! tracing_subscriber::registry()
//!     .with(fmt_layer)
//!     .with(CaptureLayer::new(Arc::clone(&reporter)))
//!     .init();
//! ```

pub mod boundary;
pub mod config;
pub mod console;
pub mod dedup;
pub mod dev;
pub mod hooks;
pub mod report;
pub mod server;
pub mod transport;

pub use boundary::{FallbackView, RenderBoundary, RenderError, Rendered};
pub use config::CaptureConfig;
pub use console::CaptureLayer;
pub use dedup::Deduplicator;
pub use faultline_common::{ErrorRecord, Severity};
pub use hooks::{Failure, install, spawn_reported};
pub use report::{Deliver, ReportContext, Reporter};
pub use server::{Reload, Shutdown, run_server};
pub use transport::HttpTransport;
