//! Text summary builder for CLI output.
//!
//! This module computes per-series metrics and formats human-readable lines for text mode.

use crate::metrics;
use crate::model::Report;
use anyhow::{Context, Result};

/// Pre-formatted lines for text output.
pub(crate) struct TextSummary {
    pub lines: Vec<String>,
}

/// Build a text summary from a reduced report.
pub(crate) fn build_text_summary(report: &Report) -> Result<TextSummary> {
    let mut lines = Vec::new();

    let mut command = report.client.display().to_string();
    for arg in &report.client_args {
        command.push(' ');
        command.push_str(arg);
    }
    lines.push(format!("Client: {command}"));
    let pinning = report
        .cpu
        .map(|c| format!("cpu {c}"))
        .unwrap_or_else(|| "unpinned".into());
    lines.push(format!(
        "Runs: {} ({pinning}), outlier threshold: z < {}",
        report.runs, report.threshold
    ));

    let width = report
        .series
        .iter()
        .map(|s| s.label.len())
        .max()
        .unwrap_or(0);
    for series in &report.series {
        let (mean, median, p25, p75) = metrics::compute_metrics(&series.values)
            .with_context(|| format!("series {:?} has no reduced values", series.label))?;
        lines.push(format!(
            "{:<width$}  avg {:.1} med {:.1} p25 {:.1} p75 {:.1} {}",
            format!("{}:", series.label),
            mean,
            median,
            p25,
            p75,
            report.y_label,
            width = width + 1
        ));
    }

    lines.push(String::new());
    let mut header = format!("{:>12}", report.x_label);
    for series in &report.series {
        header.push_str(&format!(" {:>16}", series.label));
    }
    lines.push(header);
    for (i, x) in report.x.iter().enumerate() {
        let mut row = format!("{:>12}", x);
        for series in &report.series {
            match series.values.get(i) {
                Some(v) => row.push_str(&format!(" {:>16.2}", v)),
                None => row.push_str(&format!(" {:>16}", "-")),
            }
        }
        lines.push(row);
    }

    Ok(TextSummary { lines })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_series_and_rows() {
        let summary = build_text_summary(&Report::sample()).unwrap();
        assert_eq!(summary.lines[0], "Client: ./client 3");
        assert!(summary.lines[1].contains("cpu 7"));
        assert!(summary.lines[2].starts_with("kernel:"));
        assert!(summary.lines[2].contains("avg 15.0"));
        assert!(summary.lines[3].starts_with("user:"));
        // blank, header, two data rows
        assert_eq!(summary.lines.len(), 8);
        assert!(summary.lines[7].contains("40.00"));
    }

    #[test]
    fn empty_series_is_an_error() {
        let mut report = Report::sample();
        report.series[1].values.clear();
        assert!(build_text_summary(&report).is_err());
    }
}
