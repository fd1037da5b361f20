//! Shared types for the faultline pipeline.
//!
//! This crate contains the wire-level error record and the file-backed log
//! sink used by both the `faultline` CLI and the capture library.

pub mod record;
pub mod sink;

use std::path::PathBuf;

// Re-export commonly used types
pub use record::{ErrorRecord, Severity, UNKNOWN_MESSAGE};
pub use sink::LogSink;

/// Default port for the ingestion server.
pub const SERVER_PORT: u16 = 8460;
/// Port range probed when the default port is taken.
pub const SERVER_PORT_START: u16 = 8460;
pub const SERVER_PORT_END: u16 = 8499;

/// Ingestion path accepted by the server and targeted by the transport.
pub const INGEST_PATH: &str = "/api/logs/frontend";

/// Directory for faultline data (~/.faultline/logs)
const LOG_DIR: &str = ".faultline/logs";

/// Log file receiving records accepted by the ingestion endpoint.
pub const FRONTEND_LOG_FILE: &str = "frontend-error.log";
/// Log file receiving server/tooling errors from the dev bridge.
pub const BACKEND_LOG_FILE: &str = "backend-error.log";

/// Line prefix for records accepted by the ingestion endpoint.
pub const FRONTEND_PREFIX: &str = "FrontendError";
/// Line prefix for dev-bridge tool errors.
pub const TOOL_PREFIX: &str = "ToolError";

/// Get the log directory path: `FAULTLINE_LOG_DIR` when set, otherwise
/// `~/.faultline/logs`.
pub fn log_dir() -> Result<PathBuf, String> {
    resolve_log_dir(std::env::var_os("FAULTLINE_LOG_DIR"))
}

fn resolve_log_dir(override_dir: Option<std::ffi::OsString>) -> Result<PathBuf, String> {
    if let Some(dir) = override_dir.filter(|dir| !dir.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    let home = dirs::home_dir().ok_or("Could not determine home directory")?;
    Ok(home.join(LOG_DIR))
}
