//! Append-only file sink for the shared error log.
//!
//! One formatted line per event: `[<RFC 3339 timestamp>] <prefix> <message>`.
//! Server-side failures and forwarded client records interleave in one
//! chronological file. Sink failures (missing directory, full disk) are
//! swallowed: the reporting pipeline must never cascade into the host.

use chrono::{SecondsFormat, Utc};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::debug;

#[derive(Debug, Clone)]
pub struct LogSink {
    path: PathBuf,
}

impl LogSink {
    /// Create a sink for the given file, best-effort creating the parent
    /// directory and touching the file so it can be tailed immediately.
    pub fn new(path: PathBuf) -> Self {
        if let Some(parent) = path.parent() {
            if let Err(err) = fs::create_dir_all(parent) {
                debug!(error = %err, "Failed to create log directory");
            }
        }
        if !path.exists() {
            if let Err(err) = OpenOptions::new().create(true).append(true).open(&path) {
                debug!(error = %err, "Failed to touch log file");
            }
        }
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one event line. Failures are logged at debug level and dropped.
    pub fn append(&self, prefix: &str, message: &str) {
        let stamp = Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true);
        let line = format!("[{stamp}] {prefix} {message}\n");
        let result = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .and_then(|mut file| file.write_all(line.as_bytes()));
        if let Err(err) = result {
            debug!(error = %err, path = %self.path.display(), "Dropped log line");
        }
    }

    /// Read the last `count` lines, for `faultline logs`.
    pub fn tail(&self, count: usize) -> Result<Vec<String>, String> {
        let contents = fs::read_to_string(&self.path)
            .map_err(|err| format!("Failed to read {}: {err}", self.path.display()))?;
        let lines: Vec<String> = contents.lines().map(str::to_string).collect();
        let start = lines.len().saturating_sub(count);
        Ok(lines[start..].to_vec())
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;
    use tempfile::tempdir;

    #[test]
    fn append_writes_one_prefixed_line_per_event() {
        let dir = tempdir().unwrap();
        let sink = LogSink::new(dir.path().join("frontend-error.log"));

        sink.append("FrontendError", "severity=error | message=boom");
        sink.append("ToolError", "watcher died");

        let lines = sink.tail(10).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[0].starts_with('['));
        assert!(lines[0].contains("] FrontendError severity=error | message=boom"));
        assert!(lines[1].contains("] ToolError watcher died"));
    }

    #[test]
    fn append_into_missing_directory_is_swallowed() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("gone").join("log");
        let sink = LogSink::new(path.clone());
        fs::remove_dir_all(dir.path().join("gone")).unwrap();

        // Must not panic or surface the write failure.
        sink.append("ToolError", "after directory removal");
    }

    #[test]
    fn tail_returns_only_the_last_lines() {
        let dir = tempdir().unwrap();
        let sink = LogSink::new(dir.path().join("log"));
        for i in 0..5 {
            sink.append("FrontendError", &format!("message={i}"));
        }
        let lines = sink.tail(2).unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines[1].contains("message=4"));
    }
}
