//! `faultline serve`: the ingestion server plus the dev-time bridge.

use clap::Args;
use faultline_common::{BACKEND_LOG_FILE, FRONTEND_LOG_FILE, LogSink};
use faultline_core::dev::{SinkLayer, install_tool_error_hook, start_reload_watcher};
use faultline_core::{Reload, Shutdown, run_server};
use std::path::PathBuf;
use tokio::sync::broadcast;
use tracing::{error, info};

#[derive(Debug, Args)]
pub struct ServeArgs {
    /// Port to bind; a free port in the default range is probed when omitted
    #[arg(long)]
    pub port: Option<u16>,

    /// Directory for the error log files (default: FAULTLINE_LOG_DIR, then
    /// ~/.faultline/logs)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Backend source directory to watch for reload signaling
    #[arg(long)]
    pub watch: Option<PathBuf>,

    /// File extensions that trigger a reload (repeatable)
    #[arg(long = "watch-ext", default_values_t = ["py".to_string()])]
    pub watch_exts: Vec<String>,
}

pub async fn run(args: ServeArgs) -> i32 {
    let log_dir = match args.log_dir.map(Ok).unwrap_or_else(faultline_common::log_dir) {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    let frontend_sink = LogSink::new(log_dir.join(FRONTEND_LOG_FILE));
    let backend_sink = LogSink::new(log_dir.join(BACKEND_LOG_FILE));

    // Dev bridge: tool errors and uncaught panics land in the backend log.
    crate::init_tracing(Some(SinkLayer::new(backend_sink.clone())));
    install_tool_error_hook(backend_sink);

    let listener = match bind_listener(args.port).await {
        Ok(listener) => listener,
        Err(err) => {
            error!("{err}");
            return 1;
        }
    };
    let addr = match listener.local_addr() {
        Ok(addr) => addr,
        Err(err) => {
            error!("Failed to read listener address: {err}");
            return 1;
        }
    };

    let (shutdown_tx, _) = broadcast::channel::<Shutdown>(16);
    let (reload_tx, _) = broadcast::channel::<Reload>(16);

    if let Some(watch_dir) = args.watch {
        start_reload_watcher(
            watch_dir,
            args.watch_exts,
            reload_tx.clone(),
            shutdown_tx.subscribe(),
        );
    }

    // Ctrl-C feeds the same shutdown authority as GET /stop.
    let ctrl_c_shutdown = shutdown_tx.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping server.");
            let _ = ctrl_c_shutdown.send(Shutdown::Stop);
        }
    });

    info!(%addr, log_dir = %log_dir.display(), "faultline ingestion server listening");

    match run_server(listener, frontend_sink, shutdown_tx, reload_tx).await {
        Ok(()) => 0,
        Err(err) => {
            error!("{err}");
            1
        }
    }
}

/// Bind the requested port, or probe the default range from a random offset
/// to reduce collisions when several servers start at once.
async fn bind_listener(port: Option<u16>) -> Result<tokio::net::TcpListener, String> {
    use faultline_common::{SERVER_PORT_END, SERVER_PORT_START};
    use rand::Rng;

    if let Some(port) = port {
        return tokio::net::TcpListener::bind(("127.0.0.1", port))
            .await
            .map_err(|err| format!("Failed to bind port {port}: {err}"));
    }

    let range_size = (SERVER_PORT_END - SERVER_PORT_START + 1) as usize;
    let offset = rand::thread_rng().gen_range(0..range_size);
    for i in 0..range_size {
        let candidate = SERVER_PORT_START + ((offset + i) % range_size) as u16;
        if let Ok(listener) = tokio::net::TcpListener::bind(("127.0.0.1", candidate)).await {
            return Ok(listener);
        }
    }
    Err(format!(
        "No available ports in range {SERVER_PORT_START}-{SERVER_PORT_END}"
    ))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]

    use super::*;

    #[tokio::test]
    async fn bind_listener_probes_the_default_range() {
        let first = bind_listener(None).await.unwrap();
        let second = bind_listener(None).await.unwrap();
        let (a, b) = (
            first.local_addr().unwrap().port(),
            second.local_addr().unwrap().port(),
        );
        assert_ne!(a, b);
        for port in [a, b] {
            assert!((faultline_common::SERVER_PORT_START..=faultline_common::SERVER_PORT_END)
                .contains(&port));
        }
    }
}
