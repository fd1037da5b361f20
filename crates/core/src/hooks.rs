//! Process-wide capture of uncaught failures.
//!
//! [`install`] chains the panic hook exactly once per process; the previous
//! hook still runs, so default platform behavior (the stderr message, test
//! harness capture) is preserved. [`spawn_reported`] is the counterpart for
//! background tasks whose failures would otherwise vanish: an `Err` result or
//! a task panic is normalized and reported instead of silently dropped.

use crate::report::{ReportContext, Reporter};
use faultline_common::{ErrorRecord, Severity, UNKNOWN_MESSAGE};
use std::backtrace::Backtrace;
use std::panic::PanicHookInfo;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock};

/// Capture-origin tag for panic records.
pub const SOURCE_PANIC: &str = "panic";
/// Capture-origin tag for background-task failures.
pub const SOURCE_TASK: &str = "task";

static INSTALLED: AtomicBool = AtomicBool::new(false);
static GLOBAL_REPORTER: OnceLock<Arc<Reporter>> = OnceLock::new();

/// Serializes every take_hook/set_hook pair in this crate; concurrent
/// installs would otherwise race the swap and drop one hook's chaining.
pub(crate) static HOOK_CHAIN: Mutex<()> = Mutex::new(());

/// A failure on its way to becoming a record: either structured (it carried
/// its own message and trace) or an opaque value we can only stringify.
#[derive(Debug, Clone)]
pub enum Failure {
    Structured { message: String, stack: String },
    Opaque(String),
}

impl Failure {
    /// Build a structured failure from an error, folding its source chain
    /// into the stack text.
    pub fn from_error(err: &(dyn std::error::Error + 'static)) -> Self {
        let mut stack = String::new();
        let mut cause = err.source();
        while let Some(current) = cause {
            stack.push_str("caused by: ");
            stack.push_str(&current.to_string());
            stack.push('\n');
            cause = current.source();
        }
        Self::Structured {
            message: err.to_string(),
            stack,
        }
    }

    /// Total conversion into a record. The message falls back to a fixed
    /// placeholder, and an empty stack is replaced by a trace captured here.
    pub fn into_record(self, source: &str, context: &ReportContext) -> ErrorRecord {
        let (message, stack) = match self {
            Self::Structured { message, stack } => (message, stack),
            Self::Opaque(value) => (value, String::new()),
        };
        let message = if message.is_empty() {
            UNKNOWN_MESSAGE.to_string()
        } else {
            message
        };
        let stack = if stack.is_empty() {
            Backtrace::force_capture().to_string()
        } else {
            stack
        };
        ErrorRecord {
            severity: Severity::Error,
            message,
            stack,
            source: source.to_string(),
            line: 0,
            col: 0,
            url: context.url.clone(),
            user_agent: context.user_agent.clone(),
            component_stack: String::new(),
        }
    }
}

/// Install the process-wide panic hook. Idempotent: the first call wins and
/// every later call is a no-op, so listeners are never double-registered.
pub fn install(reporter: Arc<Reporter>) {
    let _chain = match HOOK_CHAIN.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }
    let _ = GLOBAL_REPORTER.set(reporter);

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        // Default handling first: the panic stays observed, not intercepted.
        previous(info);
        if let Some(reporter) = GLOBAL_REPORTER.get() {
            reporter.report(record_from_panic(info, reporter.context()));
        }
    }));
}

/// Normalize a panic into a record: payload downcast for the message,
/// location for source/line/col, forced backtrace for the stack.
fn record_from_panic(info: &PanicHookInfo<'_>, context: &ReportContext) -> ErrorRecord {
    let message = if let Some(text) = info.payload().downcast_ref::<&str>() {
        (*text).to_string()
    } else if let Some(text) = info.payload().downcast_ref::<String>() {
        text.clone()
    } else {
        UNKNOWN_MESSAGE.to_string()
    };

    let (source, line, col) = info
        .location()
        .map(|loc| (loc.file().to_string(), loc.line(), loc.column()))
        .unwrap_or_else(|| (SOURCE_PANIC.to_string(), 0, 0));

    ErrorRecord {
        severity: Severity::Error,
        message,
        stack: Backtrace::force_capture().to_string(),
        source,
        line,
        col,
        url: context.url.clone(),
        user_agent: context.user_agent.clone(),
        component_stack: String::new(),
    }
}

/// Spawn a fallible background task and report its failure, if any.
///
/// An `Err` result becomes a structured record (source chain as stack); a
/// panic inside the task becomes an opaque one. The successful path is
/// untouched. Returns the observer handle so callers may still join.
pub fn spawn_reported<F, E>(
    reporter: Arc<Reporter>,
    fut: F,
) -> tokio::task::JoinHandle<()>
where
    F: std::future::Future<Output = Result<(), E>> + Send + 'static,
    E: std::error::Error + Send + 'static,
{
    tokio::spawn(async move {
        let inner = tokio::spawn(fut);
        match inner.await {
            Ok(Ok(())) => {}
            Ok(Err(err)) => reporter.capture(Failure::from_error(&err), SOURCE_TASK),
            Err(join_err) => {
                reporter.capture(Failure::Opaque(join_err.to_string()), SOURCE_TASK);
            }
        }
    })
}
