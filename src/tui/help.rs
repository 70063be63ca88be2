use ratatui::{
    layout::Rect,
    style::Color,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

fn key_line<'a>(key: &'a str, pad: usize, what: &'a str) -> Line<'a> {
    Line::from(vec![
        Span::raw("  "),
        Span::styled(key, Style::default().fg(Color::Magenta)),
        Span::raw(" ".repeat(pad)),
        Span::raw(what),
    ])
}

pub fn draw_help(area: Rect, f: &mut Frame) {
    let p = Paragraph::new(vec![
        Line::from("Keybinds:"),
        Line::from(vec![
            Span::raw("  "),
            Span::styled("q", Style::default().fg(Color::Magenta)),
            Span::raw(" / "),
            Span::styled("Ctrl-C", Style::default().fg(Color::Magenta)),
            Span::raw("  Quit"),
        ]),
        key_line("r", 11, "Rerun the whole batch"),
        key_line("s", 11, "Save JSON"),
        key_line("e", 11, "Export JSON to current directory"),
        key_line("c", 11, "Export CSV to current directory"),
        key_line("y", 11, "Copy exported path to clipboard"),
        key_line("?", 11, "Show this help"),
        Line::from(""),
        Line::from("Outliers: a run's value is dropped for a point when its"),
        Line::from("z-score against all runs at that point reaches the threshold."),
    ])
    .block(Block::default().borders(Borders::ALL).title("Help"));
    f.render_widget(Clear, area);
    f.render_widget(p, area);
}
