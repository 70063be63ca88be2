//! Presentation of a reduced report.
//!
//! The reducer never formats anything; everything that turns a [`Report`] into
//! output implements [`Reporter`]. Lines go through a dedicated writer task so
//! async code never blocks on stdout.

use crate::model::Report;
use crate::text_summary;
use anyhow::{Context, Result};
use std::io::Write;
use tokio::sync::mpsc;

/// Output line routing for stdout/stderr writer.
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum OutputLine {
    Stdout(String),
    Stderr(String),
}

/// Spawn a blocking writer for stdout/stderr to avoid blocking async tasks.
pub(crate) fn spawn_output_writer() -> (
    mpsc::UnboundedSender<OutputLine>,
    tokio::task::JoinHandle<()>,
) {
    let (tx, mut rx) = mpsc::unbounded_channel::<OutputLine>();
    let handle = tokio::task::spawn_blocking(move || {
        let stdout = std::io::stdout();
        let stderr = std::io::stderr();
        let mut out = std::io::LineWriter::new(stdout.lock());
        let mut err = std::io::LineWriter::new(stderr.lock());

        while let Some(line) = rx.blocking_recv() {
            match line {
                OutputLine::Stdout(msg) => {
                    let _ = writeln!(out, "{}", msg);
                }
                OutputLine::Stderr(msg) => {
                    let _ = writeln!(err, "{}", msg);
                }
            }
        }

        let _ = out.flush();
        let _ = err.flush();
    });
    (tx, handle)
}

pub(crate) trait Reporter {
    fn report(&mut self, report: &Report) -> Result<()>;
}

/// Pretty-printed JSON on stdout.
pub(crate) struct JsonReporter {
    out: mpsc::UnboundedSender<OutputLine>,
}

impl JsonReporter {
    pub fn new(out: mpsc::UnboundedSender<OutputLine>) -> Self {
        Self { out }
    }
}

impl Reporter for JsonReporter {
    fn report(&mut self, report: &Report) -> Result<()> {
        let body = serde_json::to_string_pretty(report).context("serialize report")?;
        let _ = self.out.send(OutputLine::Stdout(body));
        Ok(())
    }
}

/// Human-readable summary and value table on stdout.
pub(crate) struct TextReporter {
    out: mpsc::UnboundedSender<OutputLine>,
}

impl TextReporter {
    pub fn new(out: mpsc::UnboundedSender<OutputLine>) -> Self {
        Self { out }
    }
}

impl Reporter for TextReporter {
    fn report(&mut self, report: &Report) -> Result<()> {
        let summary = text_summary::build_text_summary(report)?;
        for line in summary.lines {
            let _ = self.out.send(OutputLine::Stdout(line));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drain(rx: &mut mpsc::UnboundedReceiver<OutputLine>) -> Vec<OutputLine> {
        let mut lines = Vec::new();
        while let Ok(line) = rx.try_recv() {
            lines.push(line);
        }
        lines
    }

    #[test]
    fn json_reporter_emits_one_document() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        JsonReporter::new(tx).report(&Report::sample()).unwrap();
        let lines = drain(&mut rx);
        assert_eq!(lines.len(), 1);
        let OutputLine::Stdout(body) = &lines[0] else {
            panic!("expected stdout");
        };
        let v: serde_json::Value = serde_json::from_str(body).unwrap();
        assert_eq!(v["series"][0]["label"], "kernel");
        assert_eq!(v["runs"], 50);
    }

    #[test]
    fn text_reporter_writes_summary_lines() {
        let (tx, mut rx) = mpsc::unbounded_channel();
        TextReporter::new(tx).report(&Report::sample()).unwrap();
        let lines = drain(&mut rx);
        assert_eq!(
            lines.first(),
            Some(&OutputLine::Stdout("Client: ./client 3".into()))
        );
        assert!(lines.iter().all(|l| matches!(l, OutputLine::Stdout(_))));
    }
}
