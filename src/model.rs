use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    pub client: PathBuf,
    #[serde(default)]
    pub client_args: Vec<String>,
    pub runs: usize,
    pub threshold: f64,
    pub cpu: Option<usize>,
    #[serde(default)]
    pub sudo: bool,
    #[serde(default, with = "humantime_serde")]
    pub run_timeout: Option<Duration>,
    /// Leading lines of client output dropped before parsing.
    #[serde(default)]
    pub skip_rows: usize,
}

/// A dense `[category][sample]` grid, stored row-major.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    categories: usize,
    samples: usize,
    data: Vec<f64>,
}

impl Table {
    pub fn filled(categories: usize, samples: usize, value: f64) -> Self {
        Self {
            categories,
            samples,
            data: vec![value; categories * samples],
        }
    }

    /// Build a table from one `Vec` per category. Ragged input is rejected.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let samples = rows.first().map(Vec::len).unwrap_or(0);
        if let Some((i, row)) = rows.iter().enumerate().find(|(_, r)| r.len() != samples) {
            return Err(Error::invalid(format!(
                "category {i} has {} samples, expected {samples}",
                row.len()
            )));
        }
        let categories = rows.len();
        Ok(Self {
            categories,
            samples,
            data: rows.into_iter().flatten().collect(),
        })
    }

    /// `(categories, samples)`
    pub fn shape(&self) -> (usize, usize) {
        (self.categories, self.samples)
    }

    pub fn get(&self, category: usize, sample: usize) -> f64 {
        self.data[category * self.samples + sample]
    }

    pub fn set(&mut self, category: usize, sample: usize, value: f64) {
        self.data[category * self.samples + sample] = value;
    }

    pub fn row(&self, category: usize) -> &[f64] {
        let start = category * self.samples;
        &self.data[start..start + self.samples]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[f64]> {
        (0..self.categories).map(move |c| self.row(c))
    }
}

/// Per-run tables in run order, plus the independent-variable axis.
#[derive(Debug, Clone, Default)]
pub struct RunCollection {
    pub x_axis: Vec<f64>,
    pub runs: Vec<Table>,
}

impl RunCollection {
    pub fn with_capacity(runs: usize) -> Self {
        Self {
            x_axis: Vec::new(),
            runs: Vec::with_capacity(runs),
        }
    }

    pub fn len(&self) -> usize {
        self.runs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.runs.is_empty()
    }
}

/// Chart annotations carried alongside the reduced data.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Labels {
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub series: Vec<String>,
}

impl Labels {
    /// Label for category `idx`, falling back to a positional name.
    pub fn series_label(&self, idx: usize) -> String {
        self.series
            .get(idx)
            .cloned()
            .unwrap_or_else(|| format!("series {}", idx + 1))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Series {
    pub label: String,
    pub values: Vec<f64>,
}

impl Series {
    /// `(x, y)` pairs for charting.
    pub fn points(&self, x_axis: &[f64]) -> Vec<(f64, f64)> {
        x_axis.iter().copied().zip(self.values.iter().copied()).collect()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Report {
    pub timestamp_utc: String,
    pub client: PathBuf,
    #[serde(default)]
    pub client_args: Vec<String>,
    pub runs: usize,
    pub threshold: f64,
    #[serde(default)]
    pub cpu: Option<usize>,
    pub title: String,
    pub x_label: String,
    pub y_label: String,
    pub x: Vec<f64>,
    pub series: Vec<Series>,
}

impl Report {
    pub fn new(cfg: &RunConfig, labels: &Labels, x_axis: Vec<f64>, reduced: &Table) -> Self {
        let series = reduced
            .rows()
            .enumerate()
            .map(|(i, row)| Series {
                label: labels.series_label(i),
                values: row.to_vec(),
            })
            .collect();
        Self {
            timestamp_utc: time::OffsetDateTime::now_utc()
                .format(&time::format_description::well_known::Rfc3339)
                .unwrap_or_else(|_| "now".into()),
            client: cfg.client.clone(),
            client_args: cfg.client_args.clone(),
            runs: cfg.runs,
            threshold: cfg.threshold,
            cpu: cfg.cpu,
            title: labels.title.clone(),
            x_label: labels.x_label.clone(),
            y_label: labels.y_label.clone(),
            x: x_axis,
            series,
        }
    }

    /// Largest reduced value over every series, or 0 when there is none.
    pub fn max_value(&self) -> f64 {
        self.series
            .iter()
            .flat_map(|s| s.values.iter().copied())
            .fold(0.0, f64::max)
    }
}

#[cfg(test)]
impl Report {
    pub(crate) fn sample() -> Self {
        Self {
            timestamp_utc: "2026-10-15T00:00:00Z".into(),
            client: PathBuf::from("./client"),
            client_args: vec!["3".into()],
            runs: 50,
            threshold: 2.0,
            cpu: Some(7),
            title: "perf".into(),
            x_label: "n".into(),
            y_label: "ns".into(),
            x: vec![0.0, 1.0],
            series: vec![
                Series {
                    label: "kernel".into(),
                    values: vec![10.0, 20.0],
                },
                Series {
                    label: "user".into(),
                    values: vec![30.0, 40.0],
                },
            ],
        }
    }
}

#[derive(Debug, Clone)]
pub enum DriverEvent {
    RunStarted {
        index: usize,
        total: usize,
    },
    RunFinished {
        index: usize,
        total: usize,
        elapsed: Duration,
    },
    Info(String),
    Completed {
        // Boxed to keep the enum small.
        report: Box<Report>,
    },
    Failed(String),
}
