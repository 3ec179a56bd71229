use std::{
    io,
    sync::{Arc, Mutex},
    time::{Duration, Instant},
};
use crossterm::{
    event::{self, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    symbols::Marker,
    text::{Line, Span},
    widgets::{
        canvas::{Canvas, Line as CanvasLine},
        Block, BorderType, Borders, Cell, Paragraph, Row, Table, TableState,
    },
    Frame, Terminal,
};

use crate::app::{App, View};
use crate::feed::SharedFeed;
use crate::util::{format_clock, format_heart_rate, format_optional, format_speed, format_steps};

pub fn run(app: App, feed: Arc<Mutex<SharedFeed>>, tick_rate: Duration) -> io::Result<App> {
    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app_loop(&mut terminal, app, &feed, tick_rate);

    // Cleanup
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    res
}

fn run_app_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    mut app: App,
    feed: &Mutex<SharedFeed>,
    tick_rate: Duration,
) -> io::Result<App> {
    // Pick up anything queued before the first draw
    app.on_tick(feed);

    loop {
        terminal.draw(|f| draw(f, &app))?;

        // Handle input
        let timeout = tick_rate
            .checked_sub(app.last_tick.elapsed())
            .unwrap_or_else(|| Duration::from_secs(0));
        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key(key.code) {
                    return Ok(app);
                }
            }
        }
        if app.last_tick.elapsed() >= tick_rate {
            app.on_tick(feed);
            app.last_tick = Instant::now();
        }
    }
}

pub fn draw(f: &mut Frame, app: &App) {
    // ============= whole screen layout ============
    let main_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),   // Active view
            Constraint::Length(1), // Bottom Status Bar
        ])
        .split(f.size());

    match &app.view {
        View::Dashboard => draw_dashboard(f, app, main_chunks[0]),
        View::AthleteDetail(id) => draw_detail(f, app, id, main_chunks[0]),
    }
    draw_status_bar(f, app, main_chunks[1]);
}

fn heart_rate_color(bpm: f64) -> Color {
    if bpm >= 170.0 {
        Color::Red
    } else if bpm >= 140.0 {
        Color::LightYellow
    } else {
        Color::Green
    }
}

// "  Label: value" line of the detail side panel
fn stat_line(label: &'static str, value: String) -> Line<'static> {
    Line::from(vec![
        Span::styled(label, Style::default().fg(Color::DarkGray)),
        Span::raw(value),
    ])
}

fn draw_dashboard(f: &mut Frame, app: &App, area: Rect) {
    let header_style = Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD);
    let header_cells = [
        "Athlete",
        "Heart Rate",
        "Avg / Min / Max",
        "Speed",
        "Avg / Max",
        "Steps",
        "Status",
    ]
    .iter()
    .map(|h| Cell::from(*h).style(header_style));
    let header = Row::new(header_cells)
        .style(Style::default().bg(Color::Rgb(40, 40, 40)))
        .height(1);

    let rows = app.dashboard_rows().into_iter().map(|row| {
        let name = if row.holds_record {
            format!("★ {}", row.name)
        } else {
            row.name.clone()
        };
        let hr_summary = row
            .stats
            .map(|s| {
                let hr = s.heart_rate;
                format!("{:.0} / {:.0} / {:.0}", hr.avg, hr.min, hr.max)
            })
            .unwrap_or_else(|| "-".to_string());
        let speed_summary = row
            .stats
            .map(|s| format!("{:.2} / {:.2}", s.speed.avg, s.speed.max))
            .unwrap_or_else(|| "-".to_string());
        let steps = match (row.latest, row.step_goal) {
            (Some(m), Some(goal)) => format!("{} / {}", format_steps(m.steps), format_steps(goal)),
            (Some(m), None) => format_steps(m.steps),
            (None, _) => "-".to_string(),
        };
        let (status, status_color) = if row.latest.is_some() {
            ("Live", Color::Green)
        } else {
            ("No signal", Color::DarkGray)
        };
        let hr_color = row.latest.map_or(Color::DarkGray, |m| heart_rate_color(m.heart_rate));
        let name_color = if row.holds_record { Color::Magenta } else { Color::White };
        let heart_rate = format_optional(row.latest.map(|m| m.heart_rate), format_heart_rate);
        let speed = format_optional(row.latest.map(|m| m.speed), format_speed);

        Row::new(vec![
            Cell::from(name).style(Style::default().fg(name_color)),
            Cell::from(heart_rate).style(Style::default().fg(hr_color)),
            Cell::from(hr_summary).style(Style::default().fg(Color::Gray)),
            Cell::from(speed).style(Style::default().fg(Color::Cyan)),
            Cell::from(speed_summary).style(Style::default().fg(Color::Gray)),
            Cell::from(steps),
            Cell::from(status).style(Style::default().fg(status_color)),
        ])
        .height(1)
    });

    let table = Table::new(
        rows,
        [
            Constraint::Percentage(20),
            Constraint::Percentage(12),
            Constraint::Percentage(18),
            Constraint::Percentage(12),
            Constraint::Percentage(14),
            Constraint::Percentage(14),
            Constraint::Percentage(10),
        ],
    )
    .header(header)
    .highlight_style(Style::default().bg(Color::Rgb(60, 60, 90)).add_modifier(Modifier::BOLD))
    .block(
        Block::default()
            .title(" Athletes ")
            .borders(Borders::ALL)
            .border_type(BorderType::Rounded)
            .border_style(Style::default().fg(Color::Cyan)),
    );

    let mut state = TableState::default();
    state.select(Some(app.selected_index()));
    f.render_stateful_widget(table, area, &mut state);
}

fn draw_detail(f: &mut Frame, app: &App, athlete_id: &str, area: Rect) {
    let block = Block::default()
        .borders(Borders::ALL)
        .title(format!(" {} [{}] ", app.roster.display_name(athlete_id), athlete_id))
        .border_type(BorderType::Rounded)
        .border_style(Style::default().fg(Color::Cyan));
    f.render_widget(block.clone(), area);

    let inner = block.inner(area);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(75), Constraint::Percentage(25)])
        .split(inner);

    // ======== Left Graphs (Heart Rate / Speed) ========
    let chart_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(columns[0]);

    let label = Style::default().fg(Color::DarkGray);
    let window = app.history_window;

    match app.store.dataset(athlete_id).filter(|d| !d.is_empty()) {
        Some(dataset) => {
            let heart_rate = dataset.recent_heart_rate(window);
            let speed = dataset.recent_speed(window);
            let (hr_area, speed_area) = (chart_chunks[0], chart_chunks[1]);
            render_series(f, hr_area, " Heart Rate ", heart_rate, window, 200.0, Color::Red);
            render_series(f, speed_area, " Speed ", speed, window, 20.0, Color::Blue);
        }
        None => {
            f.render_widget(Paragraph::new("Waiting for samples").style(label), columns[0]);
        }
    }

    // textual stats on the right
    let mut lines = Vec::new();

    if let Some(sample) = app.store.latest(athlete_id) {
        let m = sample.metrics;
        let hr_style = Style::default()
            .fg(heart_rate_color(m.heart_rate))
            .add_modifier(Modifier::BOLD);
        let speed_style = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
        lines.push(Line::from(vec![
            Span::raw("♥ "),
            Span::styled(format_heart_rate(m.heart_rate), hr_style),
        ]));
        lines.push(Line::from(vec![
            Span::raw("» "),
            Span::styled(format_speed(m.speed), speed_style),
        ]));
        lines.push(stat_line("  Steps: ", format_steps(m.steps)));
        lines.push(stat_line("  At:    ", format_clock(&sample.timestamp)));
    } else {
        lines.push(Line::from(Span::styled("No signal this cycle", label)));
    }
    lines.push(Line::from(""));

    if let Some(stats) = app.store.stats(athlete_id) {
        lines.push(stat_line("  Samples: ", stats.num_measurements.to_string()));
        lines.push(stat_line("  HR min:  ", format_heart_rate(stats.heart_rate.min)));
        lines.push(stat_line("  HR avg:  ", format_heart_rate(stats.heart_rate.avg)));
        lines.push(stat_line("  HR max:  ", format_heart_rate(stats.heart_rate.max)));
        lines.push(stat_line("  Spd avg: ", format_speed(stats.speed.avg)));
        lines.push(stat_line("  Spd max: ", format_speed(stats.speed.max)));
    }

    if let Some(profile) = app.profile(athlete_id) {
        lines.push(Line::from(""));
        lines.push(stat_line("  Goal:    ", format_steps(profile.step_goal)));
        lines.push(stat_line("  Best:    ", format_steps(profile.step_record)));
        lines.push(stat_line("  PB spd:  ", format_speed(profile.speed_record)));
    }

    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("←/→ athlete  Esc back", label)));

    f.render_widget(Paragraph::new(lines), columns[1]);
}

/// Line chart over `values`; `None` points break the line.
fn render_series(
    f: &mut Frame,
    area: Rect,
    title: &str,
    values: &[Option<f64>],
    window: usize,
    floor_max: f64,
    color: Color,
) {
    let max = values.iter().flatten().cloned().fold(floor_max, f64::max) * 1.1;
    let x_limit = window.max(values.len()).max(2) as f64 - 1.0;

    let canvas = Canvas::default()
        .block(Block::default().title(title).title_style(Style::default().fg(color)))
        .marker(Marker::Braille)
        .x_bounds([0.0, x_limit])
        .y_bounds([0.0, max])
        .paint(|ctx| {
            for (i, pair) in values.windows(2).enumerate() {
                if let [Some(y1), Some(y2)] = pair {
                    ctx.draw(&CanvasLine {
                        x1: i as f64,
                        y1: *y1,
                        x2: (i + 1) as f64,
                        y2: *y2,
                        color,
                    });
                }
            }
            // A lone point between gaps still gets a mark
            for (i, value) in values.iter().enumerate() {
                let prev = i.checked_sub(1).and_then(|p| values[p]);
                let next = values.get(i + 1).copied().flatten();
                if let (Some(y), None, None) = (value, prev, next) {
                    ctx.draw(&CanvasLine {
                        x1: i as f64,
                        y1: 0.0,
                        x2: i as f64,
                        y2: *y,
                        color,
                    });
                }
            }
        });
    f.render_widget(canvas, area);
}

fn draw_status_bar(f: &mut Frame, app: &App, area: Rect) {
    let dim = Style::default().fg(Color::DarkGray);
    let record = match app.store.speed_record() {
        Some(record) => vec![
            Span::styled(
                "MAX SPEED: ",
                Style::default().fg(Color::Magenta).add_modifier(Modifier::BOLD),
            ),
            Span::raw(format!("{} ", format_speed(record.record_value))),
            Span::raw(format!("by {} ", app.roster.display_name(&record.athlete_id))),
            Span::styled(format!("(@{})", format_clock(&record.timestamp)), dim),
        ],
        None => vec![Span::styled("MAX SPEED: -", dim)],
    };

    let feed_state = if app.feed_finished { "feed ended" } else { "live" };
    let mut spans = vec![
        Span::styled(
            " GLOBAL RECORD ",
            Style::default()
                .bg(Color::White)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(" | "),
    ];
    spans.extend(record);
    spans.push(Span::raw(format!(
        " | cycle {} ({}) | q quit, ↑/↓ select, Enter open",
        app.store.num_measurements(),
        feed_state
    )));

    let status_bar =
        Paragraph::new(Line::from(spans)).style(Style::default().bg(Color::Rgb(20, 20, 20)));
    f.render_widget(status_bar, area);
}
