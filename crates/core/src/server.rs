//! Ingestion server: accepts client error reports and appends them to the
//! shared log file, alongside the dev-bridge reload and shutdown plumbing.

use axum::Router;
use axum::body::Bytes;
use axum::extract::State;
use axum::http::StatusCode;
use axum::routing::{get, post};
use faultline_common::{ErrorRecord, FRONTEND_PREFIX, INGEST_PATH, LogSink};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tracing::{debug, warn};

/// Shutdown signal type for the server.
/// Single authority for coordinating shutdown across all components.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shutdown {
    Stop,
}

/// Live-reload signal emitted by the dev watcher and consumed by clients.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reload;

/// Shared application state for the ingestion server.
#[derive(Debug, Clone)]
struct AppState {
    sink: LogSink,
    shutdown_tx: broadcast::Sender<Shutdown>,
    reload_tx: broadcast::Sender<Reload>,
}

/// Run the ingestion server on a pre-bound listener.
/// The listener is passed in to avoid races with port allocation.
pub async fn run_server(
    listener: TcpListener,
    sink: LogSink,
    shutdown_tx: broadcast::Sender<Shutdown>,
    reload_tx: broadcast::Sender<Reload>,
) -> Result<(), String> {
    let local_addr = listener
        .local_addr()
        .map_err(|err| format!("Failed to get listener address: {err}"))?;
    debug!(addr = %local_addr, log = %sink.path().display(), "Starting ingestion server.");

    let state = AppState {
        sink,
        shutdown_tx: shutdown_tx.clone(),
        reload_tx,
    };

    let app = Router::new()
        .route(INGEST_PATH, post(ingest))
        .route("/health", get(health))
        .route("/reload", get(reload))
        .route("/stop", get(stop))
        .with_state(state);

    let mut shutdown_rx = shutdown_tx.subscribe();
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            match shutdown_rx.recv().await {
                Ok(Shutdown::Stop) => debug!("Stop signal received, shutting down server."),
                Err(_) => debug!("Shutdown channel closed."),
            }
        })
        .await
        .map_err(|err| format!("Server error: {err}"))?;

    Ok(())
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Accept one error record and append it to the log file.
///
/// Partial bodies are tolerated (every record field defaults); bodies that
/// are not JSON at all are rejected without affecting the server.
async fn ingest(State(state): State<AppState>, body: Bytes) -> StatusCode {
    let record: ErrorRecord = match serde_json::from_slice(&body) {
        Ok(record) => record,
        Err(err) => {
            warn!(error = %err, "Rejected malformed error report");
            return StatusCode::BAD_REQUEST;
        }
    };

    state.sink.append(FRONTEND_PREFIX, &record.to_log_line());
    StatusCode::OK
}

/// Long-poll until the next reload signal.
async fn reload(State(state): State<AppState>) -> StatusCode {
    let mut rx = state.reload_tx.subscribe();
    match rx.recv().await {
        Ok(Reload) => StatusCode::OK,
        Err(_) => StatusCode::NO_CONTENT,
    }
}

async fn stop(State(state): State<AppState>) -> StatusCode {
    debug!("Received server stop request.");
    let _ = state.shutdown_tx.send(Shutdown::Stop);
    StatusCode::OK
}
