//! Post-run processing utilities.
//!
//! Reduces the collected run tables into a report, then handles auto-save and exports.

use crate::cli::Cli;
use crate::model::{Report, RunCollection, RunConfig};
use crate::{reduce, storage};
use anyhow::{Context, Result};
use tracing::{info, warn};

/// Result of post-run processing, ready for presentation layers.
#[cfg_attr(not(feature = "tui"), allow(dead_code))]
pub(crate) struct ProcessedRun {
    pub report: Report,
    pub export_messages: Vec<String>,
    pub auto_saved_path: Option<std::path::PathBuf>,
}

/// Reduce every run into one table and wrap it with labels and run context.
pub(crate) fn build_report(args: &Cli, cfg: &RunConfig, collection: RunCollection) -> Result<Report> {
    let reduced = reduce::data_processing(&collection.runs, cfg.threshold)
        .with_context(|| format!("reduce {} run tables", collection.len()))?;
    info!(shape = ?reduced.shape(), runs = collection.len(), "reduced run tables");
    Ok(Report::new(cfg, &args.labels(), collection.x_axis, &reduced))
}

/// Process a completed collection: reduce, auto-save, and export.
///
/// Save and export failures become messages; only the reduction itself can fail.
#[cfg_attr(not(feature = "tui"), allow(dead_code))]
pub(crate) fn process_run_completion(
    args: &Cli,
    cfg: &RunConfig,
    collection: RunCollection,
) -> Result<ProcessedRun> {
    let report = build_report(args, cfg, collection)?;

    let auto_saved_path = if args.auto_save {
        match storage::save_report(&report) {
            Ok(p) => Some(p),
            Err(e) => {
                warn!("auto-save failed: {e:#}");
                None
            }
        }
    } else {
        None
    };

    let mut export_messages = Vec::new();
    if let Some(export_path) = args.export_json.as_deref() {
        match storage::export_json(export_path, &report) {
            Ok(_) => export_messages.push(format!("Exported JSON: {}", export_path.display())),
            Err(e) => export_messages.push(format!("Export JSON failed: {e:#}")),
        }
    }
    if let Some(export_path) = args.export_csv.as_deref() {
        match storage::export_csv(export_path, &report) {
            Ok(_) => export_messages.push(format!("Exported CSV: {}", export_path.display())),
            Err(e) => export_messages.push(format!("Export CSV failed: {e:#}")),
        }
    }

    Ok(ProcessedRun {
        report,
        export_messages,
        auto_saved_path,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::model::Table;
    use clap::Parser;

    fn args(extra: &[&str]) -> Cli {
        let mut argv = vec!["perf-reduce", "--auto-save", "false"];
        argv.extend_from_slice(extra);
        Cli::parse_from(argv)
    }

    #[test]
    fn labels_and_reduced_values_land_in_report() {
        let args = args(&["--labels", "kernel,user"]);
        let cfg = crate::cli::build_config(&args);
        let collection = RunCollection {
            x_axis: vec![1.0, 2.0],
            runs: vec![Table::filled(3, 2, 5.0); 4],
        };
        let report = build_report(&args, &cfg, collection).unwrap();
        assert_eq!(report.x, vec![1.0, 2.0]);
        let labels: Vec<&str> = report.series.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, ["kernel", "user", "series 3"]);
        assert!(report.series.iter().all(|s| s.values == vec![5.0, 5.0]));
    }

    #[test]
    fn shape_mismatch_surfaces_typed() {
        let args = args(&[]);
        let cfg = crate::cli::build_config(&args);
        let collection = RunCollection {
            x_axis: vec![1.0],
            runs: vec![Table::filled(3, 1, 1.0), Table::filled(2, 1, 1.0)],
        };
        let err = build_report(&args, &cfg, collection).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<Error>(),
            Some(Error::ShapeMismatch { run: 1, .. })
        ));
    }

    #[test]
    fn exports_are_reported_as_messages() {
        let dir = tempfile::tempdir().unwrap();
        let csv = dir.path().join("out.csv");
        let bad_json = dir.path().join("missing").join("out.json");
        let args = args(&[
            "--export-csv",
            csv.to_str().unwrap(),
            "--export-json",
            bad_json.to_str().unwrap(),
        ]);
        let cfg = crate::cli::build_config(&args);
        let collection = RunCollection {
            x_axis: vec![0.0],
            runs: vec![Table::filled(1, 1, 2.0); 2],
        };
        let processed = process_run_completion(&args, &cfg, collection).unwrap();
        assert!(processed.auto_saved_path.is_none());
        assert!(processed.export_messages[0].starts_with("Export JSON failed"));
        assert!(processed.export_messages[1].starts_with("Exported CSV"));
        assert!(csv.exists());
    }
}
