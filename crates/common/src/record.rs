//! The normalized representation of one captured failure.

use serde::{Deserialize, Serialize};

/// Message used when a failure carries no usable message of its own.
pub const UNKNOWN_MESSAGE: &str = "Unknown error";

/// Severity of a captured failure. `Warn` only arises from log-layer capture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    #[default]
    Error,
    Warn,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Error => "error",
            Self::Warn => "warn",
        }
    }
}

/// One captured failure, normalized for the wire.
///
/// Every field has a total default so a record never reaches the ingestion
/// endpoint with a missing field, and partial bodies deserialize cleanly on
/// the server side. Records are immutable once constructed; deduplication and
/// transport never modify them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct ErrorRecord {
    #[serde(default)]
    pub severity: Severity,
    #[serde(default)]
    pub message: String,
    #[serde(default)]
    pub stack: String,
    /// Originating file, or a literal capture-origin tag
    /// ("log", "render-boundary", "task").
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub line: u32,
    #[serde(default)]
    pub col: u32,
    /// Host application location context at capture time.
    #[serde(default)]
    pub url: String,
    #[serde(default, rename = "userAgent")]
    pub user_agent: String,
    /// Ordered textual trace of the UI tree location of a render failure.
    /// Empty for every other capture path.
    #[serde(default, rename = "componentStack")]
    pub component_stack: String,
}

impl ErrorRecord {
    /// Content signature used as the deduplication key.
    pub fn signature(&self) -> String {
        format!(
            "{}|{}|{}|{}|{}",
            self.message, self.stack, self.source, self.line, self.col
        )
    }

    /// Single-line rendering used by the ingestion server's log sink.
    /// The stack is appended on its own lines when present, matching the
    /// original backend's formatter.
    pub fn to_log_line(&self) -> String {
        let mut line = format!(
            "severity={} | message={} | source={} | line={} | col={} | url={} | userAgent={}",
            self.severity.as_str(),
            self.message,
            self.source,
            self.line,
            self.col,
            self.url,
            self.user_agent,
        );
        if !self.component_stack.is_empty() {
            line.push_str(" | componentStack=");
            line.push_str(&self.component_stack);
        }
        if !self.stack.is_empty() {
            line.push('\n');
            line.push_str(&self.stack);
        }
        line
    }
}
