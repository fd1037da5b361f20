//! Development-time tooling bridge.
//!
//! Mirrors server/tooling failures into the same log file the ingestion
//! endpoint writes to, so server-side and client-side errors interleave in
//! one chronological stream, and watches backend sources to force a full
//! client reload.

use crate::server::{Reload, Shutdown};
use faultline_common::{LogSink, TOOL_PREFIX};
use notify::{RecursiveMode, Watcher};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::field::{Field, Visit};
use tracing::{Event, Subscriber, debug, warn};
use tracing_subscriber::layer::{Context, Layer};

/// Quiet interval required after the last change before a reload fires.
const DEBOUNCE: Duration = Duration::from_millis(120);

static TOOL_HOOK_INSTALLED: AtomicBool = AtomicBool::new(false);

/// Append uncaught process-level failures to the tool error log.
/// Idempotent; chains the previous hook so default handling still runs.
pub fn install_tool_error_hook(sink: LogSink) {
    let _chain = match crate::hooks::HOOK_CHAIN.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    };
    if TOOL_HOOK_INSTALLED.swap(true, Ordering::SeqCst) {
        return;
    }
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        previous(info);
        sink.append(TOOL_PREFIX, &format!("Uncaught panic: {info}"));
    }));
}

/// A `tracing` layer appending ERROR events to the tool error log, the way
/// the backend's own loggers write to it.
#[derive(Debug)]
pub struct SinkLayer {
    sink: LogSink,
}

impl SinkLayer {
    pub fn new(sink: LogSink) -> Self {
        Self { sink }
    }
}

impl<S: Subscriber> Layer<S> for SinkLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        if *event.metadata().level() != tracing::Level::ERROR {
            return;
        }
        let mut visitor = LineVisitor::default();
        event.record(&mut visitor);
        let target = event.metadata().target();
        self.sink
            .append(TOOL_PREFIX, &format!("{target} | {}", visitor.line));
    }
}

#[derive(Default)]
struct LineVisitor {
    line: String,
}

impl Visit for LineVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        if !self.line.is_empty() {
            self.line.push(' ');
        }
        if field.name() == "message" {
            self.line.push_str(&format!("{value:?}"));
        } else {
            self.line.push_str(&format!("{}={value:?}", field.name()));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if !self.line.is_empty() {
            self.line.push(' ');
        }
        if field.name() == "message" {
            self.line.push_str(value);
        } else {
            self.line.push_str(&format!("{}={value}", field.name()));
        }
    }
}

/// Watch backend sources and signal a full client reload on change.
///
/// Only files whose extension is in `extensions` trigger the signal. Bursts
/// are debounced: after a matching change the watcher waits for the quiet
/// interval, draining further events, and fires once.
pub fn start_reload_watcher(
    dir: PathBuf,
    extensions: Vec<String>,
    reload_tx: broadcast::Sender<Reload>,
    mut shutdown_rx: broadcast::Receiver<Shutdown>,
) {
    tokio::spawn(async move {
        let (tx, mut rx) = tokio::sync::mpsc::channel::<notify::Event>(100);

        let mut watcher = match notify::recommended_watcher(
            move |result: Result<notify::Event, notify::Error>| {
                if let Ok(event) = result {
                    let _ = tx.blocking_send(event);
                }
            },
        ) {
            Ok(watcher) => watcher,
            Err(err) => {
                warn!("Failed to create reload watcher: {err}");
                return;
            }
        };

        if let Err(err) = watcher.watch(&dir, RecursiveMode::Recursive) {
            warn!("Failed to watch {}: {err}", dir.display());
            return;
        }
        debug!(dir = %dir.display(), "Reload watcher started.");

        loop {
            let event = tokio::select! {
                biased;
                result = shutdown_rx.recv() => {
                    match result {
                        Ok(Shutdown::Stop) | Err(_) => {
                            debug!("Reload watcher stopping.");
                            break;
                        }
                    }
                }
                event = rx.recv() => {
                    match event {
                        Some(event) => event,
                        None => break,
                    }
                }
            };

            if !is_relevant(&event, &extensions) {
                continue;
            }

            // Debounce: wait for the burst to settle, draining whatever
            // arrives in the meantime.
            loop {
                tokio::time::sleep(DEBOUNCE).await;
                let mut received_more = false;
                while let Ok(extra) = rx.try_recv() {
                    if is_relevant(&extra, &extensions) {
                        received_more = true;
                    }
                }
                if !received_more {
                    break;
                }
            }

            debug!("Backend source changed, signaling reload.");
            let _ = reload_tx.send(Reload);
        }
    });
}

fn is_relevant(event: &notify::Event, extensions: &[String]) -> bool {
    if !matches!(
        event.kind,
        notify::EventKind::Modify(_) | notify::EventKind::Create(_)
    ) {
        return false;
    }
    event.paths.iter().any(|path| {
        path.extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| extensions.iter().any(|want| want == ext))
    })
}
