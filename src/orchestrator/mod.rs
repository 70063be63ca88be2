//! Application-level orchestration utilities.
//!
//! This module owns batch lifecycle control (start/cancel/restart) and post-run processing
//! such as reduction, auto-save and exports. UI/CLI layers call into this module to keep
//! responsibilities separated.

#[cfg(feature = "tui")]
mod controller;
mod post_process;

#[cfg(feature = "tui")]
pub(crate) use controller::{run_controller, UiCommand};
pub(crate) use post_process::build_report;
