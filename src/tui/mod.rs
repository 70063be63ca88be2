mod charts;
mod export;
mod help;
mod state;

use crate::cli::Cli;
use crate::model::DriverEvent;
use crate::orchestrator::{self, UiCommand};
use anyhow::{Context, Result};
use crossterm::{
    event::{self, Event, KeyCode, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Terminal,
};
use state::UiState;
use std::{io, time::Duration, time::Instant};
use tokio::sync::mpsc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender};

pub async fn run(args: Cli) -> Result<()> {
    // Unbounded channels avoid backpressure between the driver and the render loop.
    let (event_tx, event_rx) = mpsc::unbounded_channel::<DriverEvent>();
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<UiCommand>();

    // TUI runs in a dedicated thread to keep all blocking I/O out of the Tokio runtime.
    let ui_args = args.clone();
    let ui_handle = std::thread::spawn(move || run_threaded(ui_args, event_rx, cmd_tx));

    let res = orchestrator::run_controller(&args, event_tx, cmd_rx).await;

    let join_res = tokio::task::spawn_blocking(move || ui_handle.join()).await;
    if let Ok(joined) = join_res {
        match joined {
            Ok(Ok(())) => {}
            Ok(Err(e)) => return Err(e),
            Err(_) => return Err(anyhow::anyhow!("TUI thread panicked")),
        }
    }

    res
}

/// Run the TUI loop on a dedicated thread.
fn run_threaded(
    args: Cli,
    mut event_rx: UnboundedReceiver<DriverEvent>,
    cmd_tx: UnboundedSender<UiCommand>,
) -> Result<()> {
    enable_raw_mode().context("enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).ok();

    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("create terminal")?;
    terminal.clear().ok();

    // UiState is owned by the UI thread only; no cross-thread mutation.
    let mut state = UiState {
        total_runs: args.runs,
        auto_save: args.auto_save,
        ..Default::default()
    };

    let tick_rate = Duration::from_millis(100);
    let mut last_tick = Instant::now();

    let res = loop {
        // Drain events without blocking to keep UI responsive.
        while let Ok(ev) = event_rx.try_recv() {
            state.apply_event(ev);
        }

        if last_tick.elapsed() >= tick_rate {
            terminal.draw(|f| draw(f.area(), f, &state)).ok();
            last_tick = Instant::now();
        }

        // Poll input with a short timeout to avoid blocking the render loop.
        if event::poll(Duration::from_millis(10)).unwrap_or(false) {
            if let Ok(Event::Key(k)) = event::read() {
                if k.kind != KeyEventKind::Press {
                    continue;
                }
                match (k.modifiers, k.code) {
                    (_, KeyCode::Char('q')) | (KeyModifiers::CONTROL, KeyCode::Char('c')) => {
                        let _ = cmd_tx.send(UiCommand::Quit);
                        break Ok(());
                    }
                    (_, KeyCode::Char('r')) => {
                        let _ = cmd_tx.send(UiCommand::Restart);
                    }
                    (_, KeyCode::Char('s')) => export::save_and_show_path(&mut state),
                    (_, KeyCode::Char('e')) => {
                        export::export_and_show_path(&mut state, "JSON", export::export_report_json)
                    }
                    (_, KeyCode::Char('c')) => {
                        export::export_and_show_path(&mut state, "CSV", export::export_report_csv)
                    }
                    (_, KeyCode::Char('y')) => match state.last_exported_path.clone() {
                        Some(path) => match export::copy_to_clipboard(&path) {
                            Ok(()) => state.info = format!("Copied: {path}"),
                            Err(e) => state.info = format!("Copy failed: {e:#}"),
                        },
                        None => state.info = "Export first (e or c)".into(),
                    },
                    (_, KeyCode::Char('?')) => state.show_help = !state.show_help,
                    (_, KeyCode::Esc) => state.show_help = false,
                    _ => {}
                }
            }
        }
    };

    disable_raw_mode().ok();
    let mut stdout = io::stdout();
    execute!(stdout, LeaveAlternateScreen).ok();
    res
}

fn draw(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let main = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Min(10), Constraint::Length(3)].as_ref())
        .split(area);

    if let Some(report) = state.report.as_ref() {
        charts::render_report_chart(f, main[0], report);
    } else {
        draw_progress(main[0], f, state);
    }

    draw_status(main[1], f, state);

    if state.show_help {
        let w = area.width.min(64);
        let h = area.height.min(14);
        let popup = Rect {
            x: area.x + (area.width - w) / 2,
            y: area.y + (area.height - h) / 2,
            width: w,
            height: h,
        };
        help::draw_help(popup, f);
    }
}

fn draw_progress(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Min(5)].as_ref())
        .split(area);

    let label = match state.current_run {
        Some(i) => format!("run {}/{}", i + 1, state.total_runs),
        None => format!("{}/{} runs", state.completed_runs, state.total_runs),
    };
    let gauge = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title("Benchmark"))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(state.progress())
        .label(label);
    f.render_widget(gauge, rows[0]);

    if let Some(err) = state.failure.as_deref() {
        let p = Paragraph::new(vec![
            Line::from(Span::styled("Failed", Style::default().fg(Color::Red))),
            Line::from(err.to_string()),
            Line::from(""),
            Line::from("Press r to rerun or q to quit."),
        ])
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::ALL).title("Error"));
        f.render_widget(p, rows[1]);
    } else {
        charts::render_run_times(f, rows[1], &state.run_times, state.total_runs);
    }
}

fn draw_status(area: Rect, f: &mut ratatui::Frame, state: &UiState) {
    let auto = if state.auto_save { "on" } else { "off" };
    let line = Line::from(vec![
        Span::raw(state.info.clone()),
        Span::raw("  "),
        Span::styled(
            format!("auto-save {auto}"),
            Style::default().fg(Color::Gray),
        ),
        Span::raw("  "),
        Span::styled("? help", Style::default().fg(Color::Magenta)),
    ]);
    let p = Paragraph::new(line).block(Block::default().borders(Borders::ALL).title("Status"));
    f.render_widget(p, area);
}
