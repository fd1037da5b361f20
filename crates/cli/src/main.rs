//! faultline CLI: run the ingestion server, inspect the error logs.

use clap::{CommandFactory, Parser, Subcommand};

mod logs;
mod serve;

#[derive(Parser)]
#[command(
    name = "faultline",
    version,
    about = "faultline captures and centralizes client-side errors"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the error ingestion server with the dev-time bridge
    Serve(serve::ServeArgs),
    /// Display captured error logs
    Logs(logs::LogsArgs),
}

fn main() {
    let runtime = match tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(err) => {
            eprintln!("Failed to create tokio runtime: {err}");
            std::process::exit(1);
        }
    };

    std::process::exit(runtime.block_on(run(Cli::parse())));
}

async fn run(cli: Cli) -> i32 {
    match cli.command {
        Some(Commands::Serve(args)) => serve::run(args).await,
        Some(Commands::Logs(args)) => logs::run(args),
        None => {
            let mut cmd = Cli::command();
            let _ = cmd.print_help();
            println!();
            0
        }
    }
}

/// Initialize tracing for the CLI, with an optional layer mirroring ERROR
/// events into the tool error log.
///
/// `FAULTLINE_LOG` controls the log level: a plain level ("debug") or a full
/// tracing filter spec ("faultline_core=debug,hyper=warn").
fn init_tracing(sink_layer: Option<faultline_core::dev::SinkLayer>) {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::layer::{Layer as _, SubscriberExt};
    use tracing_subscriber::util::SubscriberInitExt;

    let filter = match std::env::var("FAULTLINE_LOG") {
        Ok(level) if is_plain_level(&level) => format!("faultline={level},faultline_core={level}"),
        Ok(spec) => spec,
        Err(_) => "faultline=info,faultline_core=info".to_string(),
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(true)
        .with_filter(EnvFilter::new(filter));

    if tracing_subscriber::registry()
        .with(sink_layer)
        .with(fmt_layer)
        .try_init()
        .is_err()
    {
        eprintln!("Warning: tracing subscriber already initialized");
    }
}

fn is_plain_level(s: &str) -> bool {
    matches!(
        s.to_ascii_lowercase().as_str(),
        "trace" | "debug" | "info" | "warn" | "error"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_safe_to_call_repeatedly() {
        // The second call hits the already-initialized branch without
        // panicking.
        init_tracing(None);
        init_tracing(None);
    }

    #[test]
    fn plain_levels_are_recognized_case_insensitively() {
        assert!(is_plain_level("debug"));
        assert!(is_plain_level("WARN"));
        assert!(!is_plain_level("faultline_core=debug"));
    }
}
