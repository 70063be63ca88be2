use crate::model::Report;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use std::sync::mpsc as std_mpsc;
use std::sync::OnceLock;
use std::time::Duration;

use super::state::UiState;

// Global clipboard manager channel - initialized once on first use
static CLIPBOARD_SENDER: OnceLock<std_mpsc::Sender<String>> = OnceLock::new();

fn export_in(dir: &Path, r: &Report, ext: &str, body: &str) -> Result<PathBuf> {
    let stem = crate::storage::file_stem("perf-reduce", r);
    crate::storage::write_unique(dir, &stem, ext, body.as_bytes())
}

/// Save the current report and update state.info with the saved path message.
pub fn save_and_show_path(state: &mut UiState) {
    let Some(r) = state.report.as_ref() else {
        state.info = "Nothing to save yet".into();
        return;
    };
    match crate::storage::save_report(r) {
        Ok(path) => state.info = format!("Saved: {}", path.display()),
        Err(e) => state.info = format!("Save failed: {e:#}"),
    }
}

/// Export JSON into the current directory.
/// Returns the absolute path of the exported file.
pub fn export_report_json(r: &Report) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("get current directory")?;
    export_in(&current_dir, r, "json", &crate::storage::render_json(r)?)
}

/// Export CSV into the current directory.
/// Returns the absolute path of the exported file.
pub fn export_report_csv(r: &Report) -> Result<PathBuf> {
    let current_dir = std::env::current_dir().context("get current directory")?;
    export_in(&current_dir, r, "csv", &crate::storage::render_csv(r))
}

/// Run one of the exporters against the current report and record the outcome in state.
pub fn export_and_show_path(
    state: &mut UiState,
    kind: &str,
    export: fn(&Report) -> Result<PathBuf>,
) {
    let Some(r) = state.report.as_ref() else {
        state.info = "Nothing to export yet".into();
        return;
    };
    match export(r) {
        Ok(path) => {
            state.info = format!("Exported {kind}: {}", path.display());
            state.last_exported_path = Some(path.display().to_string());
        }
        Err(e) => state.info = format!("Export {kind} failed: {e:#}"),
    }
}

/// Initialize the clipboard manager thread if not already initialized.
/// This creates a background thread that processes clipboard operations sequentially,
/// keeping each clipboard instance alive for a sufficient duration.
fn init_clipboard_manager() -> Result<&'static std_mpsc::Sender<String>> {
    CLIPBOARD_SENDER.get_or_init(|| {
        let (tx, rx) = std_mpsc::channel::<String>();

        std::thread::spawn(move || {
            use arboard::Clipboard;

            for text in rx {
                if let Ok(mut clipboard) = Clipboard::new() {
                    if clipboard.set_text(&text).is_ok() {
                        // Clipboard managers on Linux read lazily from the owning instance
                        std::thread::sleep(Duration::from_secs(2));
                    }
                }
            }
        });

        tx
    });

    CLIPBOARD_SENDER
        .get()
        .ok_or_else(|| anyhow::anyhow!("Failed to initialize clipboard manager"))
}

/// Copy text to clipboard without blocking the UI thread.
pub fn copy_to_clipboard(text: &str) -> Result<()> {
    let sender = init_clipboard_manager()?;
    sender
        .send(text.to_string())
        .map_err(|_| anyhow::anyhow!("Clipboard manager channel closed"))?;
    Ok(())
}
