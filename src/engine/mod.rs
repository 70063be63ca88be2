mod parse;

pub use parse::{parse_table, ParsedOutput};

use crate::error::Error;
use crate::model::{DriverEvent, RunCollection, RunConfig};
use anyhow::Result;
use std::ffi::OsString;
use std::process::Stdio;
use std::time::Instant;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// How much of the client's stderr we keep in a failure message.
const STDERR_TAIL: usize = 512;

#[derive(Debug, Clone)]
pub enum EngineControl {
    /// Stop after killing the in-flight client
    Cancel,
}

/// Runs the benchmark client `cfg.runs` times, one invocation at a time.
pub struct BenchDriver {
    cfg: RunConfig,
}

impl BenchDriver {
    pub fn new(cfg: RunConfig) -> Self {
        Self { cfg }
    }

    /// Full argv: `[sudo] [taskset -c CPU] client args...`
    pub fn command_line(&self) -> Vec<OsString> {
        let mut argv: Vec<OsString> = Vec::new();
        if self.cfg.sudo {
            argv.push("sudo".into());
        }
        if let Some(cpu) = self.cfg.cpu {
            argv.push("taskset".into());
            argv.push("-c".into());
            argv.push(cpu.to_string().into());
        }
        argv.push(self.cfg.client.clone().into_os_string());
        argv.extend(self.cfg.client_args.iter().map(OsString::from));
        argv
    }

    pub async fn run(
        self,
        event_tx: mpsc::UnboundedSender<DriverEvent>,
        mut control_rx: mpsc::UnboundedReceiver<EngineControl>,
    ) -> Result<RunCollection> {
        let total = self.cfg.runs;
        if total == 0 {
            return Err(Error::invalid("run count must be at least 1").into());
        }

        info!(
            runs = total,
            command = ?self.command_line(),
            "starting benchmark runs"
        );

        let mut collection = RunCollection::with_capacity(total);
        // A dropped control sender means nobody can cancel; stop polling it.
        let mut control_open = true;

        for index in 0..total {
            let _ = event_tx.send(DriverEvent::RunStarted { index, total });
            let started = Instant::now();

            let run = self.run_once(index);
            tokio::pin!(run);
            let parsed = loop {
                tokio::select! {
                    res = &mut run => break res?,
                    ctrl = control_rx.recv(), if control_open => match ctrl {
                        Some(EngineControl::Cancel) => {
                            info!(run = index, "cancelled");
                            return Err(Error::Cancelled.into());
                        }
                        None => control_open = false,
                    },
                }
            };

            let elapsed = started.elapsed();
            debug!(run = index, shape = ?parsed.table.shape(), ?elapsed, "run finished");

            if collection.is_empty() {
                collection.x_axis = parsed.x_axis;
            } else if collection.x_axis != parsed.x_axis {
                warn!(run = index, "x-axis differs from the first run; keeping the first");
            }
            collection.runs.push(parsed.table);

            let _ = event_tx.send(DriverEvent::RunFinished {
                index,
                total,
                elapsed,
            });
        }

        Ok(collection)
    }

    async fn run_once(&self, run: usize) -> Result<ParsedOutput, Error> {
        let fail = |reason: String| Error::ExternalProcessFailure { run, reason };

        let argv = self.command_line();
        let mut cmd = Command::new(&argv[0]);
        cmd.args(&argv[1..])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let child = cmd
            .spawn()
            .map_err(|e| fail(format!("spawn {}: {e}", argv[0].to_string_lossy())))?;

        let output = match self.cfg.run_timeout {
            Some(limit) => tokio::time::timeout(limit, child.wait_with_output())
                .await
                .map_err(|_| {
                    fail(format!(
                        "timed out after {}",
                        humantime::format_duration(limit)
                    ))
                })?,
            None => child.wait_with_output().await,
        }
        .map_err(|e| fail(format!("wait: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let stderr = stderr.trim();
            let mut start = stderr.len().saturating_sub(STDERR_TAIL);
            while !stderr.is_char_boundary(start) {
                start += 1;
            }
            return Err(fail(format!("{}: {}", output.status, &stderr[start..])));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        parse_table(&stdout, self.cfg.skip_rows)
            .map_err(|e| fail(format!("unparseable output: {e}")))
    }
}
