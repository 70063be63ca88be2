use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    symbols,
    text::{Line, Span},
    widgets::{Axis, Block, Borders, Chart, Dataset, GraphType, LegendPosition, Paragraph},
    Frame,
};

use crate::model::Report;

const SERIES_COLORS: [Color; 6] = [
    Color::Green,
    Color::Cyan,
    Color::Magenta,
    Color::Yellow,
    Color::Blue,
    Color::LightRed,
];

pub fn series_color(idx: usize) -> Color {
    SERIES_COLORS[idx % SERIES_COLORS.len()]
}

/// `(min, max)` of the x-axis, widened when degenerate so the chart has a span.
fn x_bounds(x: &[f64]) -> [f64; 2] {
    let lo = x.iter().copied().fold(f64::INFINITY, f64::min);
    let hi = x.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    if !lo.is_finite() || !hi.is_finite() {
        return [0.0, 1.0];
    }
    if hi > lo {
        [lo, hi]
    } else {
        [lo - 0.5, hi + 0.5]
    }
}

/// Y runs from zero to 10% above the largest reduced value.
fn y_upper(report: &Report) -> f64 {
    let max = report.max_value();
    if max > 0.0 {
        max * 1.10
    } else {
        1.0
    }
}

fn axis_labels<'a>(lo: f64, hi: f64) -> Vec<Span<'a>> {
    let mid = (lo + hi) / 2.0;
    vec![
        Span::raw(format!("{:.0}", lo)),
        Span::raw(format!("{:.0}", mid)),
        Span::raw(format!("{:.0}", hi)),
    ]
}

/// The reduced curves: one line per series with a legend, plus a metrics line per series.
pub fn render_report_chart(f: &mut Frame, area: Rect, report: &Report) {
    let inner = if area.width > 2 && area.height > 2 {
        Rect {
            x: area.x + 1,
            y: area.y + 1,
            width: area.width.saturating_sub(2),
            height: area.height.saturating_sub(2),
        }
    } else {
        area
    };

    let metrics_rows = report.series.len() as u16;
    let chart_metrics = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(8), Constraint::Length(metrics_rows)].as_ref())
        .split(inner);

    // Datasets borrow their points, so build them first.
    let points: Vec<Vec<(f64, f64)>> = report
        .series
        .iter()
        .map(|s| s.points(&report.x))
        .collect();
    let datasets: Vec<Dataset> = report
        .series
        .iter()
        .zip(points.iter())
        .enumerate()
        .map(|(i, (series, pts))| {
            Dataset::default()
                .name(series.label.clone())
                .graph_type(GraphType::Line)
                .marker(symbols::Marker::Braille)
                .style(Style::default().fg(series_color(i)))
                .data(pts)
        })
        .collect();

    let [x_lo, x_hi] = x_bounds(&report.x);
    let y_hi = y_upper(report);
    let chart = Chart::new(datasets)
        .x_axis(
            Axis::default()
                .title(report.x_label.clone())
                .bounds([x_lo, x_hi])
                .labels(axis_labels(x_lo, x_hi)),
        )
        .y_axis(
            Axis::default()
                .title(report.y_label.clone())
                .bounds([0.0, y_hi])
                .labels(axis_labels(0.0, y_hi)),
        )
        .legend_position(Some(LegendPosition::TopLeft))
        .hidden_legend_constraints((Constraint::Ratio(1, 2), Constraint::Ratio(1, 2)));
    f.render_widget(chart, chart_metrics[0]);

    let lines: Vec<Line> = report
        .series
        .iter()
        .enumerate()
        .filter_map(|(i, s)| {
            crate::metrics::compute_metrics(&s.values)
                .map(|m| render_metrics_text(&s.label, m, series_color(i)))
        })
        .collect();
    f.render_widget(
        Paragraph::new(lines).alignment(Alignment::Center),
        chart_metrics[1],
    );

    let title = Line::from(vec![
        Span::raw(format!("{} ", report.title)),
        Span::styled(
            format!("({} runs, z < {})", report.runs, report.threshold),
            Style::default().fg(Color::Gray),
        ),
    ]);
    let block = Block::default().borders(Borders::ALL).title(title);
    f.render_widget(block, area);
}

/// Wall time of each finished run while the batch is in progress.
pub fn render_run_times(f: &mut Frame, area: Rect, run_times: &[(f64, f64)], total_runs: usize) {
    let block = Block::default().borders(Borders::ALL).title("Run time (ms)");
    if run_times.is_empty() {
        f.render_widget(Paragraph::new("Waiting for first run...").block(block), area);
        return;
    }

    let y_max = run_times
        .iter()
        .map(|(_, y)| *y)
        .fold(0.0, f64::max)
        .max(1.0)
        * 1.10;
    let x_max = (total_runs.max(1)) as f64;
    let ds = Dataset::default()
        .graph_type(GraphType::Line)
        .marker(symbols::Marker::Braille)
        .style(Style::default().fg(Color::Green))
        .data(run_times);
    let chart = Chart::new(vec![ds])
        .block(block)
        .x_axis(
            Axis::default()
                .title("run")
                .bounds([1.0, x_max.max(2.0)])
                .labels(axis_labels(1.0, x_max.max(2.0))),
        )
        .y_axis(
            Axis::default()
                .bounds([0.0, y_max])
                .labels(axis_labels(0.0, y_max)),
        );
    f.render_widget(chart, area);
}

/// Helper function to render metrics text (avg, med, p25, p75) for one series
fn render_metrics_text<'a>(label: &str, metrics: (f64, f64, f64, f64), color: Color) -> Line<'a> {
    let (mean_val, median_val, p25_val, p75_val) = metrics;
    Line::from(vec![
        Span::styled(format!("{label}: "), Style::default().fg(color)),
        Span::styled("avg", Style::default().fg(Color::Gray)),
        Span::styled(format!(" {:.0}", mean_val), Style::default().fg(color)),
        Span::raw(" "),
        Span::styled("med", Style::default().fg(Color::Gray)),
        Span::styled(format!(" {:.0}", median_val), Style::default().fg(color)),
        Span::raw(" "),
        Span::styled("p25", Style::default().fg(Color::Gray)),
        Span::styled(format!(" {:.0}", p25_val), Style::default().fg(color)),
        Span::raw(" "),
        Span::styled("p75", Style::default().fg(Color::Gray)),
        Span::styled(format!(" {:.0}", p75_val), Style::default().fg(color)),
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn x_bounds_widen_single_point() {
        assert_eq!(x_bounds(&[3.0]), [2.5, 3.5]);
        assert_eq!(x_bounds(&[]), [0.0, 1.0]);
        assert_eq!(x_bounds(&[4.0, 1.0, 9.0]), [1.0, 9.0]);
    }

    #[test]
    fn y_headroom_is_ten_percent() {
        let report = Report::sample();
        assert!((y_upper(&report) - 44.0).abs() < 1e-9);
    }
}
