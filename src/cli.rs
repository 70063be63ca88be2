use crate::engine::{BenchDriver, EngineControl};
use crate::error::Error;
use crate::model::{DriverEvent, Labels, Report, RunCollection, RunConfig};
use crate::report::{spawn_output_writer, JsonReporter, OutputLine, Reporter, TextReporter};
use crate::stats::DEFAULT_THRESHOLD;
use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

#[derive(Debug, Parser, Clone)]
#[command(
    name = "perf-reduce",
    version,
    about = "Run a benchmark client many times, drop outliers, average and plot the curves"
)]
pub struct Cli {
    /// Benchmark client executable
    #[arg(long, default_value = "./client")]
    pub client: PathBuf,

    /// Arguments passed to the client (after `--`)
    #[arg(last = true)]
    pub client_args: Vec<String>,

    /// Number of client invocations
    #[arg(long, default_value_t = 50)]
    pub runs: usize,

    /// Z-score cutoff; samples with |z| >= threshold are dropped
    #[arg(long, default_value_t = DEFAULT_THRESHOLD)]
    pub threshold: f64,

    /// Pin the client to this CPU with `taskset -c`
    #[arg(long)]
    pub cpu: Option<usize>,

    /// Run the client through sudo
    #[arg(long)]
    pub sudo: bool,

    /// Kill a run that takes longer than this
    #[arg(long)]
    pub run_timeout: Option<humantime::Duration>,

    /// Drop this many leading lines of client output before parsing
    #[arg(long, default_value_t = 0)]
    pub skip_rows: usize,

    /// Series labels, one per measurement category
    #[arg(
        long,
        value_delimiter = ',',
        default_values = ["kernel", "user", "kernel to user"]
    )]
    pub labels: Vec<String>,

    /// Chart title
    #[arg(long, default_value = "perf")]
    pub title: String,

    /// X axis title
    #[arg(long, default_value = "n-th fibonacci")]
    pub x_label: String,

    /// Y axis title
    #[arg(long, default_value = "time (ns)")]
    pub y_label: String,

    /// Print JSON result and exit (no TUI)
    #[arg(long)]
    pub json: bool,

    /// Print text summary and exit (no TUI)
    #[arg(long)]
    pub text: bool,

    /// Run silently: suppress all output except errors (for cron usage)
    #[arg(long)]
    pub silent: bool,

    /// Export results as JSON
    #[arg(long)]
    pub export_json: Option<PathBuf>,

    /// Export results as CSV
    #[arg(long)]
    pub export_csv: Option<PathBuf>,

    /// Use --auto-save true or --auto-save false to override
    #[arg(long, default_value_t = true, action = clap::ArgAction::Set)]
    pub auto_save: bool,
}

impl Cli {
    /// Whether the interactive UI will own the terminal.
    pub fn is_tui(&self) -> bool {
        cfg!(feature = "tui") && !self.json && !self.text && !self.silent
    }

    pub fn labels(&self) -> Labels {
        Labels {
            title: self.title.clone(),
            x_label: self.x_label.clone(),
            y_label: self.y_label.clone(),
            series: self.labels.clone(),
        }
    }
}

fn validate(args: &Cli) -> Result<()> {
    // Validate that --silent can only be used with --json
    if args.silent && !args.json {
        return Err(anyhow::anyhow!(
            "--silent can only be used with --json. Use --silent --json together."
        ));
    }
    if args.runs == 0 {
        return Err(Error::invalid("--runs must be at least 1").into());
    }
    if !args.threshold.is_finite() || args.threshold <= 0.0 {
        return Err(Error::invalid(format!(
            "--threshold must be a positive number, got {}",
            args.threshold
        ))
        .into());
    }
    Ok(())
}

pub async fn run(args: Cli) -> Result<()> {
    validate(&args)?;

    // Silent mode takes precedence over other output modes
    if args.silent {
        return run_json(args, true).await;
    }

    if !args.json && !args.text {
        #[cfg(feature = "tui")]
        {
            return crate::tui::run(args).await;
        }
        #[cfg(not(feature = "tui"))]
        {
            // Fallback when built without TUI support.
            return run_text(args).await;
        }
    }

    if args.json {
        return run_json(args, false).await;
    }

    run_text(args).await
}

/// Build a `RunConfig` from CLI arguments.
pub fn build_config(args: &Cli) -> RunConfig {
    RunConfig {
        client: args.client.clone(),
        client_args: args.client_args.clone(),
        runs: args.runs,
        threshold: args.threshold,
        cpu: args.cpu,
        sudo: args.sudo,
        run_timeout: args.run_timeout.map(Duration::from),
        skip_rows: args.skip_rows,
    }
}

/// A driver task plus the Ctrl-C listener that can cancel it.
struct DriverTask {
    driver: JoinHandle<Result<RunCollection>>,
    ctrl_c: JoinHandle<()>,
}

impl DriverTask {
    /// Wait for the driver, then stop listening for Ctrl-C.
    async fn join(self) -> Result<RunCollection> {
        let res = self.driver.await;
        self.ctrl_c.abort();
        res.context("benchmark driver task failed")?
            .context("benchmark failed")
    }
}

/// Spawn the driver with Ctrl-C wired to cancellation.
fn spawn_driver(cfg: RunConfig, evt_tx: mpsc::UnboundedSender<DriverEvent>) -> DriverTask {
    let (ctrl_tx, ctrl_rx) = mpsc::unbounded_channel::<EngineControl>();
    let ctrl_c = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = ctrl_tx.send(EngineControl::Cancel);
        }
    });
    let driver = BenchDriver::new(cfg);
    let driver = tokio::spawn(async move { driver.run(evt_tx, ctrl_rx).await });
    DriverTask { driver, ctrl_c }
}

/// JSON mode. `silent` suppresses everything but errors.
async fn run_json(args: Cli, silent: bool) -> Result<()> {
    let cfg = build_config(&args);
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<DriverEvent>();
    let task = spawn_driver(cfg.clone(), evt_tx);

    // Progress is not shown in JSON mode
    while evt_rx.recv().await.is_some() {}

    let collection = task.join().await?;
    let report = crate::orchestrator::build_report(&args, &cfg, collection)?;

    // Handle exports (errors will propagate)
    handle_exports(&args, &report)?;

    if silent {
        if args.auto_save {
            crate::storage::save_report(&report).context("failed to save report")?;
        }
        return Ok(());
    }

    let (out_tx, out_handle) = spawn_output_writer();
    JsonReporter::new(out_tx.clone()).report(&report)?;
    if args.auto_save {
        if let Ok(p) = crate::storage::save_report(&report) {
            let _ = out_tx.send(OutputLine::Stderr(format!("Saved: {}", p.display())));
        }
    }
    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

async fn run_text(args: Cli) -> Result<()> {
    let cfg = build_config(&args);
    let (out_tx, out_handle) = spawn_output_writer();
    let (evt_tx, mut evt_rx) = mpsc::unbounded_channel::<DriverEvent>();
    let task = spawn_driver(cfg.clone(), evt_tx);

    while let Some(ev) = evt_rx.recv().await {
        match ev {
            DriverEvent::RunFinished {
                index,
                total,
                elapsed,
            } => {
                let _ = out_tx.send(OutputLine::Stderr(format!(
                    "Run {}/{} done in {:.1} ms",
                    index + 1,
                    total,
                    elapsed.as_secs_f64() * 1000.0
                )));
            }
            DriverEvent::Info(msg) | DriverEvent::Failed(msg) => {
                let _ = out_tx.send(OutputLine::Stderr(msg));
            }
            DriverEvent::RunStarted { .. } | DriverEvent::Completed { .. } => {}
        }
    }

    let collection = task.join().await?;
    let report = crate::orchestrator::build_report(&args, &cfg, collection)?;

    handle_exports(&args, &report)?;
    TextReporter::new(out_tx.clone()).report(&report)?;
    if args.auto_save {
        if let Ok(p) = crate::storage::save_report(&report) {
            let _ = out_tx.send(OutputLine::Stderr(format!("Saved: {}", p.display())));
        }
    }
    drop(out_tx);
    let _ = out_handle.await;
    Ok(())
}

/// Handle export operations (JSON and CSV) for both text and JSON modes.
fn handle_exports(args: &Cli, report: &Report) -> Result<()> {
    if let Some(p) = args.export_json.as_deref() {
        crate::storage::export_json(p, report)?;
    }
    if let Some(p) = args.export_csv.as_deref() {
        crate::storage::export_csv(p, report)?;
    }
    Ok(())
}
