use crate::model::Report;
use anyhow::{Context, Result};
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

/// Directory where auto-saved reports live.
pub fn runs_dir() -> Result<PathBuf> {
    let base = dirs::data_local_dir().context("no local data directory for this platform")?;
    Ok(base.join("perf-reduce").join("runs"))
}

/// `<prefix>-<timestamp>` with the characters file systems dislike replaced.
pub(crate) fn file_stem(prefix: &str, report: &Report) -> String {
    format!(
        "{prefix}-{}",
        report.timestamp_utc.replace(':', "-").replace('T', "_")
    )
}

/// Create `dir/stem.ext`, or `stem-1.ext`, `stem-2.ext`, ... if it is taken,
/// and write `body` into it. Never overwrites an existing file.
pub(crate) fn write_unique(dir: &Path, stem: &str, ext: &str, body: &[u8]) -> Result<PathBuf> {
    let mut n = 0u32;
    loop {
        let name = match n {
            0 => format!("{stem}.{ext}"),
            n => format!("{stem}-{n}.{ext}"),
        };
        let path = dir.join(name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(body)
                    .with_context(|| format!("write {}", path.display()))?;
                return Ok(path);
            }
            Err(e) if e.kind() == ErrorKind::AlreadyExists => n += 1,
            Err(e) => return Err(e).with_context(|| format!("create {}", path.display())),
        }
    }
}

/// Save a report as JSON into [`runs_dir`].
pub fn save_report(report: &Report) -> Result<PathBuf> {
    save_report_in(&runs_dir()?, report)
}

pub(crate) fn save_report_in(dir: &Path, report: &Report) -> Result<PathBuf> {
    std::fs::create_dir_all(dir).with_context(|| format!("create {}", dir.display()))?;
    write_unique(dir, &file_stem("run", report), "json", render_json(report)?.as_bytes())
}

pub(crate) fn render_json(report: &Report) -> Result<String> {
    serde_json::to_string_pretty(report).context("serialize report")
}

pub fn export_json(path: &Path, report: &Report) -> Result<()> {
    std::fs::write(path, render_json(report)?).with_context(|| format!("write {}", path.display()))
}

/// One header row (`x` then every series label), then one row per sample point.
pub fn export_csv(path: &Path, report: &Report) -> Result<()> {
    std::fs::write(path, render_csv(report)).with_context(|| format!("write {}", path.display()))
}

fn csv_field(s: &str) -> String {
    if s.contains([',', '"', '\n']) {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

pub(crate) fn render_csv(report: &Report) -> String {
    let mut out = String::from("x");
    for series in &report.series {
        out.push(',');
        out.push_str(&csv_field(&series.label));
    }
    out.push('\n');
    for (i, x) in report.x.iter().enumerate() {
        out.push_str(&x.to_string());
        for series in &report.series {
            out.push(',');
            if let Some(v) = series.values.get(i) {
                out.push_str(&v.to_string());
            }
        }
        out.push('\n');
    }
    out
}
