//! Dashboard screen components
//!
//! One frame layout shared by all kinds: title, a kind-specific results
//! body, a status panel and a help line.

pub mod speedtest;
pub mod top_disk;

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use crate::app::state::{DashboardState, RunPhase};
use crate::models::RunResults;
use crate::util::units::format_duration;

/// Render the whole dashboard
pub fn render(f: &mut Frame, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Title
            Constraint::Min(6),    // Results
            Constraint::Length(4), // Status/Error area
            Constraint::Length(3), // Help text
        ])
        .split(f.size());

    render_title(f, chunks[0], state);
    render_body(f, chunks[1], state);
    render_status(f, chunks[2], state);
    render_help(f, chunks[3]);
}

fn phase_color(phase: &RunPhase) -> Color {
    match phase {
        RunPhase::Waiting => Color::Yellow,
        RunPhase::Running => Color::Cyan,
        RunPhase::Completed => Color::Green,
        RunPhase::Failed(_) => Color::Red,
    }
}

fn render_title(f: &mut Frame, area: Rect, state: &DashboardState) {
    let phase = match state.phase() {
        RunPhase::Waiting => "Starting",
        RunPhase::Running => "Running",
        RunPhase::Completed => "Completed",
        RunPhase::Failed(_) => "Failed",
    };
    let color = phase_color(state.phase());
    let title = format!(
        "{} on {} - {}   {}",
        state.kind().description(),
        state.target(),
        phase,
        chrono::Local::now().format("%H:%M:%S")
    );

    let widget = Paragraph::new(title)
        .style(Style::default().fg(color).add_modifier(Modifier::BOLD))
        .alignment(Alignment::Center)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(color)),
        );
    f.render_widget(widget, area);
}

fn render_body(f: &mut Frame, area: Rect, state: &DashboardState) {
    match state.latest() {
        Some(RunResults::Drive(results)) => speedtest::render_drive(f, area, results),
        Some(RunResults::Object(result)) => speedtest::render_object(f, area, result.as_ref()),
        Some(RunResults::Disk(_)) => top_disk::render(f, area, state),
        None => {
            let waiting = Paragraph::new(vec![
                Line::from(""),
                Line::from("Waiting for results from the cluster..."),
            ])
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .title("Results")
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Cyan)),
            );
            f.render_widget(waiting, area);
        }
    }
}

fn render_status(f: &mut Frame, area: Rect, state: &DashboardState) {
    let color = phase_color(state.phase());
    let lines = match state.phase() {
        RunPhase::Failed(error) => vec![
            Line::from(Span::styled(
                "Error occurred:",
                Style::default().fg(Color::Red).add_modifier(Modifier::BOLD),
            )),
            Line::from(Span::styled(error.clone(), Style::default().fg(Color::Red))),
        ],
        RunPhase::Completed => vec![Line::from(Span::styled(
            "Run completed",
            Style::default().fg(Color::Green).add_modifier(Modifier::BOLD),
        ))],
        RunPhase::Waiting | RunPhase::Running => vec![
            Line::from(format!("Elapsed: {}", format_duration(state.elapsed()))),
            Line::from(format!(
                "Heartbeats: {}   Updates: {}",
                state.heartbeats(),
                state.updates()
            )),
        ],
    };

    let status = Paragraph::new(lines).alignment(Alignment::Center).block(
        Block::default()
            .title("Status")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(color)),
    );
    f.render_widget(status, area);
}

fn render_help(f: &mut Frame, area: Rect) {
    let key = Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD);
    let help = Paragraph::new(Line::from(vec![
        Span::styled("q", key),
        Span::raw("/"),
        Span::styled("Esc", key),
        Span::raw("/"),
        Span::styled("Ctrl+C", key),
        Span::raw(" Quit"),
    ]))
    .alignment(Alignment::Center)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Yellow)),
    );
    f.render_widget(help, area);
}
