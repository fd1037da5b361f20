//! Render-failure boundary: contain a failed subtree, report it, fall back.
//!
//! A two-state machine driven by the `Result` the subtree build returns, not
//! by unwinding. Once an instance enters `Failed` it stays there; recovery is
//! an external re-mount (a fresh boundary).

use crate::report::Reporter;
use faultline_common::{ErrorRecord, Severity};
use std::backtrace::Backtrace;
use std::sync::Arc;
use thiserror::Error;

/// Capture-origin tag for boundary records.
pub const SOURCE_BOUNDARY: &str = "render-boundary";

/// A failure raised while constructing or updating a subtree.
#[derive(Debug, Clone, Error)]
#[error("{message}")]
pub struct RenderError {
    pub message: String,
    pub stack: String,
}

impl RenderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: String::new(),
        }
    }

    pub fn with_stack(message: impl Into<String>, stack: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            stack: stack.into(),
        }
    }
}

/// Static view shown in place of a failed subtree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FallbackView {
    pub heading: &'static str,
    pub detail: Option<String>,
}

impl FallbackView {
    fn new(detail: Option<String>) -> Self {
        Self {
            heading: "Something went wrong.",
            detail,
        }
    }
}

/// Outcome of one render pass beneath a boundary.
#[derive(Debug)]
pub enum Rendered<T> {
    Ok(T),
    Fallback(FallbackView),
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum State {
    Healthy,
    Failed { message: String },
}

/// Outermost failure-catching scope for a renderable tree.
///
/// While `Healthy`, `render` runs the build closure and passes its output
/// through. The first `Err` transitions the instance to `Failed`: the failure
/// is reported (best-effort, never raised back to the caller) and every
/// render from then on returns the fallback without invoking the closure.
/// Sibling boundaries are unaffected.
#[derive(Debug)]
pub struct RenderBoundary {
    name: String,
    reporter: Arc<Reporter>,
    state: State,
}

impl RenderBoundary {
    pub fn new(name: impl Into<String>, reporter: Arc<Reporter>) -> Self {
        Self {
            name: name.into(),
            reporter,
            state: State::Healthy,
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.state, State::Failed { .. })
    }

    /// Build the subtree named `subtree` beneath this boundary.
    pub fn render<T>(
        &mut self,
        subtree: &str,
        build: impl FnOnce() -> Result<T, RenderError>,
    ) -> Rendered<T> {
        if let State::Failed { message } = &self.state {
            return Rendered::Fallback(FallbackView::new(Some(message.clone())));
        }

        match build() {
            Ok(view) => Rendered::Ok(view),
            Err(err) => {
                self.report_failure(subtree, &err);
                self.state = State::Failed {
                    message: err.message.clone(),
                };
                Rendered::Fallback(FallbackView::new(Some(err.message)))
            }
        }
    }

    fn report_failure(&self, subtree: &str, err: &RenderError) {
        let stack = if err.stack.is_empty() {
            Backtrace::force_capture().to_string()
        } else {
            err.stack.clone()
        };
        let context = self.reporter.context();
        self.reporter.report(ErrorRecord {
            severity: Severity::Error,
            message: err.message.clone(),
            stack,
            source: SOURCE_BOUNDARY.to_string(),
            line: 0,
            col: 0,
            url: context.url.clone(),
            user_agent: context.user_agent.clone(),
            component_stack: format!("in {subtree}\n in {}", self.name),
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::report::test_support::memory_reporter;

    #[test]
    fn healthy_boundary_passes_the_view_through() {
        let (reporter, transport) = memory_reporter();
        let mut boundary = RenderBoundary::new("App", reporter);
        let rendered = boundary.render("Header", || Ok("<header/>"));
        assert!(matches!(rendered, Rendered::Ok("<header/>")));
        assert!(transport.delivered().is_empty());
        assert!(!boundary.is_failed());
    }

    #[test]
    fn first_failure_reports_once_and_shows_the_fallback() {
        let (reporter, transport) = memory_reporter();
        let mut boundary = RenderBoundary::new("App", reporter);

        let rendered = boundary
            .render("Chart", || Err::<&str, _>(RenderError::new("missing dataset")));
        match rendered {
            Rendered::Fallback(view) => {
                assert_eq!(view.heading, "Something went wrong.");
                assert_eq!(view.detail.as_deref(), Some("missing dataset"));
            }
            Rendered::Ok(_) => unreachable!("failed render produced a view"),
        }

        let delivered = transport.delivered();
        assert_eq!(delivered.len(), 1);
        assert_eq!(delivered[0].source, SOURCE_BOUNDARY);
        assert_eq!(delivered[0].message, "missing dataset");
        assert_eq!(delivered[0].component_stack, "in Chart\n in App");
        assert!(!delivered[0].stack.is_empty());
    }

    #[test]
    fn failed_state_is_terminal_for_the_instance() {
        let (reporter, transport) = memory_reporter();
        let mut boundary = RenderBoundary::new("App", reporter);
        let _ = boundary.render("Chart", || Err::<(), _>(RenderError::new("boom")));

        // Later renders never run the closure again.
        let rendered = boundary.render::<()>("Chart", || {
            unreachable!("closure invoked after terminal failure")
        });
        assert!(matches!(rendered, Rendered::Fallback(_)));
        assert!(boundary.is_failed());
        assert_eq!(transport.delivered().len(), 1);
    }

    #[test]
    fn sibling_boundaries_keep_operating_after_a_failure() {
        let (reporter, transport) = memory_reporter();
        let mut left = RenderBoundary::new("Left", Arc::clone(&reporter));
        let mut right = RenderBoundary::new("Right", reporter);

        let _ = left.render("Chart", || Err::<(), _>(RenderError::new("boom")));
        let rendered = right.render("Table", || Ok("<table/>"));

        assert!(matches!(rendered, Rendered::Ok("<table/>")));
        assert!(!right.is_failed());
        assert_eq!(transport.delivered().len(), 1);
    }

    #[test]
    fn provided_stack_is_forwarded_verbatim() {
        let (reporter, transport) = memory_reporter();
        let mut boundary = RenderBoundary::new("App", reporter);
        let _ = boundary.render("Chart", || {
            Err::<(), _>(RenderError::with_stack("boom", "at chart::draw"))
        });
        assert_eq!(transport.delivered()[0].stack, "at chart::draw");
    }
}
