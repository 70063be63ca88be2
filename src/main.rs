mod cli;
mod engine;
mod error;
mod metrics;
mod model;
mod orchestrator;
mod reduce;
mod report;
mod stats;
mod storage;
mod text_summary;
#[cfg(feature = "tui")]
mod tui;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Logs go to stderr. The TUI owns the terminal, so logging stays off there
/// unless `PERF_REDUCE_LOG` asks for it.
fn init_tracing(tui: bool) {
    let default = if tui { "off" } else { "warn" };
    let filter = EnvFilter::try_from_env("PERF_REDUCE_LOG").unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = cli::Cli::parse();
    let is_silent = args.silent;
    let is_non_tui = !args.is_tui();
    init_tracing(!is_non_tui);

    match cli::run(args).await {
        Ok(()) => {
            // Explicitly exit with code 0 on success, especially for non-TUI modes
            if is_non_tui {
                std::process::exit(0);
            }
            Ok(())
        }
        Err(e) => {
            if is_silent {
                println!("{:#}", e);
                std::process::exit(1);
            } else {
                Err(e)
            }
        }
    }
}
