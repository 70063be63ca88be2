//! Run lifecycle controller.
//!
//! Owns start/cancel/restart orchestration and emits events for presentation layers.

use crate::cli::{build_config, Cli};
use crate::engine::{BenchDriver, EngineControl};
use crate::model::{DriverEvent, RunCollection, RunConfig};
use anyhow::Result;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};
use tokio::time::Duration;
use tracing::debug;

use super::post_process::process_run_completion;

/// Commands emitted by UI layers to control the benchmark.
#[derive(Debug, Clone)]
pub(crate) enum UiCommand {
    Restart,
    Quit,
}

/// Internal handle for a running batch of benchmark runs.
struct RunCtx {
    cfg: RunConfig,
    ctrl_tx: UnboundedSender<EngineControl>,
    handle: Option<tokio::task::JoinHandle<Result<RunCollection>>>,
}

/// Spawn the driver and return its control handle.
fn start_run(args: &Cli, event_tx: UnboundedSender<DriverEvent>) -> RunCtx {
    let cfg = build_config(args);
    let (ctrl_tx, ctrl_rx) = tokio::sync::mpsc::unbounded_channel::<EngineControl>();
    let driver = BenchDriver::new(cfg.clone());
    let handle = tokio::spawn(async move { driver.run(event_tx, ctrl_rx).await });
    RunCtx {
        cfg,
        ctrl_tx,
        handle: Some(handle),
    }
}

/// Orchestrate benchmark batches based on UI commands and emit events back to presentation layers.
pub(crate) async fn run_controller(
    args: &Cli,
    event_tx: UnboundedSender<DriverEvent>,
    mut cmd_rx: UnboundedReceiver<UiCommand>,
) -> Result<()> {
    let mut run_ctx = Some(start_run(args, event_tx.clone()));
    let mut restart_pending = false;
    let mut quit_pending = false;
    // Cancel watchdog: if a cancel takes too long, emit a status message to keep UI feedback alive.
    let mut cancel_deadline: Option<tokio::time::Instant> = None;
    let mut watchdog = tokio::time::interval(Duration::from_millis(500));

    let res = loop {
        tokio::select! {
            cmd = cmd_rx.recv() => {
                match cmd {
                    Some(UiCommand::Restart) => {
                        // Restart is serialized: cancel the active batch first, then start a new one
                        // once we observe completion. Two batches never overlap.
                        restart_pending = true;
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::Cancel);
                            let _ = event_tx.send(DriverEvent::Info("Cancelling…".into()));
                            cancel_deadline = Some(tokio::time::Instant::now() + Duration::from_secs(3));
                        } else {
                            run_ctx = Some(start_run(args, event_tx.clone()));
                            restart_pending = false;
                            let _ = event_tx.send(DriverEvent::Info("Restarting…".into()));
                        }
                    }
                    Some(UiCommand::Quit) | None => {
                        quit_pending = true;
                        if let Some(ctx) = &run_ctx {
                            let _ = ctx.ctrl_tx.send(EngineControl::Cancel);
                            cancel_deadline = Some(tokio::time::Instant::now() + Duration::from_secs(3));
                        } else {
                            break Ok(());
                        }
                    }
                }
            }
            // Do not take the JoinHandle before this branch wins; otherwise it can be dropped
            // if another select branch is chosen, and we'll never observe completion.
            maybe_done = async {
                if let Some(ctx) = &mut run_ctx {
                    if let Some(h) = ctx.handle.as_mut() {
                        return Some(h.await);
                    }
                }
                futures::future::pending().await
            } => {
                if let Some(join_res) = maybe_done {
                    let Some(ctx) = run_ctx.take() else { continue };
                    match join_res {
                        Ok(Ok(collection)) => match process_run_completion(args, &ctx.cfg, collection) {
                            Ok(processed) => {
                                for msg in processed.export_messages {
                                    let _ = event_tx.send(DriverEvent::Info(msg));
                                }
                                if let Some(p) = processed.auto_saved_path {
                                    let _ = event_tx.send(DriverEvent::Info(format!("Saved: {}", p.display())));
                                }
                                let _ = event_tx.send(DriverEvent::Completed {
                                    report: Box::new(processed.report),
                                });
                            }
                            Err(e) => {
                                let _ = event_tx.send(DriverEvent::Failed(format!("{e:#}")));
                            }
                        },
                        Ok(Err(e)) => {
                            debug!("benchmark batch ended: {e:#}");
                            let _ = event_tx.send(DriverEvent::Failed(format!("{e:#}")));
                        }
                        Err(e) => {
                            let _ = event_tx.send(DriverEvent::Failed(format!("driver task failed: {e}")));
                        }
                    }
                    cancel_deadline = None;
                    if quit_pending {
                        break Ok(());
                    }
                    if restart_pending {
                        run_ctx = Some(start_run(args, event_tx.clone()));
                        restart_pending = false;
                    }
                }
            }
            // If cancel stalls (e.g., a child slow to exit), keep the user informed.
            _ = watchdog.tick() => {
                if let Some(deadline) = cancel_deadline {
                    if tokio::time::Instant::now() >= deadline && run_ctx.is_some() {
                        let _ = event_tx.send(DriverEvent::Info("Still cancelling…".into()));
                        cancel_deadline = None;
                    }
                }
            }
        }
    };

    res
}
