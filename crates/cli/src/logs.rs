//! `faultline logs`: print the tail of the captured error logs.

use clap::Args;
use console::style;
use faultline_common::{BACKEND_LOG_FILE, FRONTEND_LOG_FILE, LogSink};
use std::path::PathBuf;

#[derive(Debug, Args)]
pub struct LogsArgs {
    /// Directory holding the error log files (default: ~/.faultline/logs)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// Number of lines to show from each log
    #[arg(short = 'n', long, default_value_t = 50)]
    pub lines: usize,

    /// Show only the client-side (frontend) log
    #[arg(long, conflicts_with = "backend")]
    pub frontend: bool,

    /// Show only the server/tooling (backend) log
    #[arg(long)]
    pub backend: bool,
}

pub fn run(args: LogsArgs) -> i32 {
    crate::init_tracing(None);

    let log_dir = match args.log_dir.map(Ok).unwrap_or_else(faultline_common::log_dir) {
        Ok(dir) => dir,
        Err(err) => {
            eprintln!("{err}");
            return 1;
        }
    };

    let mut selected: Vec<(&str, &str)> = Vec::new();
    if !args.backend {
        selected.push(("frontend", FRONTEND_LOG_FILE));
    }
    if !args.frontend {
        selected.push(("backend", BACKEND_LOG_FILE));
    }

    let mut status = 0;
    for (label, file) in selected {
        println!("{}", style(format!("── {label} ({file})")).bold());
        let sink = LogSink::new(log_dir.join(file));
        match sink.tail(args.lines) {
            Ok(lines) if lines.is_empty() => println!("{}", style("(empty)").dim()),
            Ok(lines) => {
                for line in lines {
                    println!("{line}");
                }
            }
            Err(err) => {
                eprintln!("{err}");
                status = 1;
            }
        }
        println!();
    }
    status
}
