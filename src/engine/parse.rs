//! Parser for the benchmark client's whitespace-delimited output.
//!
//! The client prints one line per sample point: the independent variable
//! first, then one column per measurement category. We transpose that into
//! an x-axis plus a `[category][sample]` table.
//!
//! Everything from `#` to the end of a line is a comment. The first
//! `skip_rows` lines are dropped unread, and any non-numeric lines before
//! the first data line (a `n = 100` banner, a column header) are treated as
//! a header. Once data has started every line must be numeric.

use crate::error::{Error, Result};
use crate::model::Table;

#[derive(Debug, Clone, PartialEq)]
pub struct ParsedOutput {
    pub x_axis: Vec<f64>,
    pub table: Table,
}

fn parse_fields(line: &str, lineno: usize) -> Result<Vec<f64>> {
    line.split_whitespace()
        .map(|tok| {
            tok.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| Error::invalid(format!("line {lineno}: not a number: {tok:?}")))
        })
        .collect()
}

pub fn parse_table(text: &str, skip_rows: usize) -> Result<ParsedOutput> {
    let mut columns: Vec<Vec<f64>> = Vec::new();

    for (lineno, line) in text.lines().enumerate().skip(skip_rows) {
        let lineno = lineno + 1;
        let line = line.split_once('#').map_or(line, |(data, _)| data).trim();
        if line.is_empty() {
            continue;
        }

        let fields = match parse_fields(line, lineno) {
            Ok(fields) => fields,
            Err(_) if columns.is_empty() => continue,
            Err(e) => return Err(e),
        };

        if columns.is_empty() {
            if fields.len() < 2 {
                return Err(Error::invalid(format!(
                    "line {lineno}: expected an x value and at least one measurement"
                )));
            }
            columns = vec![Vec::new(); fields.len()];
        } else if fields.len() != columns.len() {
            return Err(Error::invalid(format!(
                "line {lineno}: {} columns, expected {}",
                fields.len(),
                columns.len()
            )));
        }

        for (col, v) in columns.iter_mut().zip(fields) {
            col.push(v);
        }
    }

    if columns.is_empty() {
        return Err(Error::invalid("no data lines in output"));
    }

    let x_axis = columns.remove(0);
    let table = Table::from_rows(columns)?;
    Ok(ParsedOutput { x_axis, table })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn transposes_lines_into_categories() {
        let out = parse_table("0 10 20 30\n1 11 21 31\n2 12 22 32\n", 0).unwrap();
        assert_eq!(out.x_axis, vec![0.0, 1.0, 2.0]);
        assert_eq!(out.table.shape(), (3, 3));
        assert_eq!(out.table.row(0), &[10.0, 11.0, 12.0]);
        assert_eq!(out.table.row(2), &[30.0, 31.0, 32.0]);
    }

    #[test]
    fn skips_comments_and_blank_lines() {
        let out = parse_table("# n kernel\n\n  1\t5.5 \n2 6.5 # warm\n", 0).unwrap();
        assert_eq!(out.x_axis, vec![1.0, 2.0]);
        assert_eq!(out.table.row(0), &[5.5, 6.5]);
    }

    #[test]
    fn rejects_ragged_lines() {
        let err = parse_table("1 2 3\n4 5\n", 0).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m.contains("line 2")));
    }

    #[test]
    fn rejects_non_numeric_tokens() {
        assert!(matches!(
            parse_table("1 2\n3 oops\n", 0),
            Err(Error::InvalidInput(_))
        ));
        assert!(matches!(
            parse_table("1 2\n3 nan\n", 0),
            Err(Error::InvalidInput(ref m)) if m.contains("line 2")
        ));
    }

    #[test]
    fn rejects_empty_and_x_only_output() {
        assert!(parse_table("", 0).is_err());
        assert!(parse_table("# nothing\n", 0).is_err());
        assert!(parse_table("1\n2\n", 0).is_err());
        assert!(parse_table("header only\n", 0).is_err());
    }

    #[test]
    fn benchmark_client_banner_and_header_are_skipped() {
        let text = "n = 2\n\
                    round      ker_time   user_time  time_lag  \n\
                    0          120        400        280       \n\
                    1          130        410        280       \n\
                    2          125        405        280       \n";
        let out = parse_table(text, 0).unwrap();
        assert_eq!(out.x_axis, vec![0.0, 1.0, 2.0]);
        assert_eq!(out.table.shape(), (3, 3));
        assert_eq!(out.table.row(0), &[120.0, 130.0, 125.0]);
        assert_eq!(out.table.row(2), &[280.0, 280.0, 280.0]);
    }

    #[test]
    fn skip_rows_drops_leading_lines_unread() {
        // A numeric preamble is only dropped when asked to.
        let text = "100 3\n0 1.5\n1 2.5\n";
        assert_eq!(parse_table(text, 0).unwrap().x_axis, vec![100.0, 0.0, 1.0]);
        let out = parse_table(text, 1).unwrap();
        assert_eq!(out.x_axis, vec![0.0, 1.0]);
        assert_eq!(out.table.row(0), &[1.5, 2.5]);
        // Line numbers in errors still count the skipped lines.
        let err = parse_table("junk\n0 1\n1 x\n", 1).unwrap_err();
        assert!(matches!(err, Error::InvalidInput(ref m) if m.contains("line 3")));
        assert!(parse_table(text, 3).is_err());
    }

    #[test]
    fn inline_comments_are_stripped() {
        let out = parse_table("0 1 2 # first\n1 3 4#second\n", 0).unwrap();
        assert_eq!(out.table.row(0), &[1.0, 3.0]);
        assert_eq!(out.table.row(1), &[2.0, 4.0]);
    }
}
