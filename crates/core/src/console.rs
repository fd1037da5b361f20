//! Log-layer capture: error/warn events mirrored into the pipeline.
//!
//! Instead of patching a global print function, the host composes
//! [`CaptureLayer`] onto its subscriber registry next to the usual fmt layer.
//! Layers are additive, so the original emitters keep running unmodified and
//! stay visible in the normal log output; this layer only observes.

use crate::report::Reporter;
use faultline_common::{ErrorRecord, Severity, UNKNOWN_MESSAGE};
use std::backtrace::Backtrace;
use std::fmt::Write as _;
use std::sync::Arc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::{Context, Layer};

/// Capture-origin tag for log-layer records.
pub const SOURCE_LOG: &str = "log";

/// A `tracing` layer that converts WARN and ERROR events into records.
#[derive(Debug)]
pub struct CaptureLayer {
    reporter: Arc<Reporter>,
}

impl CaptureLayer {
    pub fn new(reporter: Arc<Reporter>) -> Self {
        Self { reporter }
    }
}

impl<S: Subscriber> Layer<S> for CaptureLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let level = *event.metadata().level();
        // Level ordering puts ERROR lowest; anything past WARN is ignored.
        if level > Level::WARN {
            return;
        }

        let mut visitor = EventVisitor::default();
        event.record(&mut visitor);

        let severity = if level == Level::ERROR {
            Severity::Error
        } else {
            Severity::Warn
        };

        let mut message = format!("log.{}:", level.as_str().to_lowercase());
        if visitor.message.is_empty() && visitor.rest.is_empty() {
            message.push(' ');
            message.push_str(UNKNOWN_MESSAGE);
        } else {
            if !visitor.message.is_empty() {
                message.push(' ');
                message.push_str(&visitor.message);
            }
            for part in &visitor.rest {
                message.push(' ');
                message.push_str(part);
            }
        }

        // Stack from the first error-typed field if any, else a trace
        // captured at the emission site.
        let stack = visitor
            .error_chain
            .unwrap_or_else(|| Backtrace::force_capture().to_string());

        let context = self.reporter.context();
        self.reporter.report(ErrorRecord {
            severity,
            message,
            stack,
            source: SOURCE_LOG.to_string(),
            line: event.metadata().line().unwrap_or(0),
            col: 0,
            url: context.url.clone(),
            user_agent: context.user_agent.clone(),
            component_stack: String::new(),
        });
    }
}

/// Collects the event's message field, remaining fields as `key=value`
/// pairs, and the source chain of the first recorded error value.
#[derive(Default)]
struct EventVisitor {
    message: String,
    rest: Vec<String>,
    error_chain: Option<String>,
}

impl Visit for EventVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.rest.push(format!("{}={}", field.name(), value));
        }
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        if self.error_chain.is_none() {
            let mut chain = value.to_string();
            let mut cause = value.source();
            while let Some(current) = cause {
                let _ = write!(chain, "\ncaused by: {current}");
                cause = current.source();
            }
            self.error_chain = Some(chain);
        }
        self.rest.push(format!("{}={}", field.name(), value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let serialized = format!("{value:?}");
        if field.name() == "message" {
            self.message = serialized;
        } else {
            self.rest.push(format!("{}={}", field.name(), serialized));
        }
    }
}
