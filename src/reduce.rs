//! Per-cell reduction of a run collection.

use crate::error::{Error, Result};
use crate::model::Table;
use crate::stats;

/// Collapse `runs` into one table: each cell is the outlier-filtered mean of
/// that cell across every run.
///
/// All runs must share the first run's shape. Cells are independent, so the
/// result does not depend on traversal order.
pub fn data_processing(runs: &[Table], threshold: f64) -> Result<Table> {
    let first = runs
        .first()
        .ok_or_else(|| Error::invalid("no run tables to reduce"))?;
    let expected = first.shape();
    for (run, table) in runs.iter().enumerate().skip(1) {
        if table.shape() != expected {
            return Err(Error::ShapeMismatch {
                run,
                expected,
                found: table.shape(),
            });
        }
    }

    let (categories, samples) = expected;
    let mut reduced = Table::filled(categories, samples, 0.0);
    let mut column = Vec::with_capacity(runs.len());
    for c in 0..categories {
        for s in 0..samples {
            column.clear();
            column.extend(runs.iter().map(|t| t.get(c, s)));
            let value = stats::filtered_mean(&column, threshold).map_err(|e| match e {
                Error::InvalidInput(msg) => {
                    Error::InvalidInput(format!("category {c}, sample {s}: {msg}"))
                }
                other => other,
            })?;
            reduced.set(c, s, value);
        }
    }
    Ok(reduced)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: Vec<Vec<f64>>) -> Table {
        Table::from_rows(rows).unwrap()
    }

    #[test]
    fn constant_runs_reduce_to_constant() {
        let runs = vec![Table::filled(3, 4, 42.0); 10];
        let reduced = data_processing(&runs, 2.0).unwrap();
        assert_eq!(reduced, Table::filled(3, 4, 42.0));
    }

    #[test]
    fn three_single_cell_runs() {
        let runs = vec![table(vec![vec![1.0]]), table(vec![vec![2.0]]), table(vec![vec![100.0]])];
        let reduced = data_processing(&runs, 2.0).unwrap();
        assert!((reduced.get(0, 0) - 103.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn outlier_dropped_per_cell() {
        let mut runs = vec![table(vec![vec![10.0, 5.0]]); 9];
        runs.push(table(vec![vec![100.0, 5.0]]));
        let reduced = data_processing(&runs, 2.0).unwrap();
        assert_eq!(reduced.get(0, 0), 10.0);
        assert_eq!(reduced.get(0, 1), 5.0);
    }

    #[test]
    fn shape_mismatch_names_the_run() {
        let runs = vec![
            Table::filled(3, 4, 1.0),
            Table::filled(3, 4, 1.0),
            Table::filled(3, 5, 1.0),
        ];
        let err = data_processing(&runs, 2.0).unwrap_err();
        assert_eq!(
            err,
            Error::ShapeMismatch {
                run: 2,
                expected: (3, 4),
                found: (3, 5),
            }
        );
    }

    #[test]
    fn empty_collection_is_invalid() {
        assert!(matches!(
            data_processing(&[], 2.0),
            Err(Error::InvalidInput(_))
        ));
    }

    #[test]
    fn reducing_twice_is_identical() {
        let runs = vec![
            table(vec![vec![1.0, 9.0], vec![3.0, 4.0]]),
            table(vec![vec![1.5, 8.0], vec![3.5, 4.5]]),
            table(vec![vec![0.5, 70.0], vec![2.5, 4.0]]),
        ];
        let a = data_processing(&runs, 2.0).unwrap();
        let b = data_processing(&runs, 2.0).unwrap();
        assert_eq!(a, b);
    }
}
