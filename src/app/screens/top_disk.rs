//! Busiest-disks table

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Row, Table},
    Frame,
};

use crate::app::state::DashboardState;
use crate::util::units::{format_await, format_per_sec, format_percent, format_rate};

fn util_color(utilization: f64) -> Color {
    if utilization >= 90.0 {
        Color::Red
    } else if utilization >= 60.0 {
        Color::Yellow
    } else {
        Color::Green
    }
}

pub fn render(f: &mut Frame, area: Rect, state: &DashboardState) {
    let rows: Vec<Row> = state
        .top_disks()
        .into_iter()
        .map(|row| {
            let color = util_color(row.rates.utilization);
            Row::new(vec![
                row.disk,
                format_per_sec(row.rates.tps, "io"),
                format_rate(row.rates.read_bytes_per_sec),
                format_rate(row.rates.write_bytes_per_sec),
                format_await(row.rates.await_ms),
                format_percent(row.rates.utilization),
            ])
            .style(Style::default().fg(color))
        })
        .collect();

    let title = if rows.is_empty() {
        format!("Disks ({} seen, collecting second sample)", state.disks_seen())
    } else {
        format!("Top {} of {} disks by utilization", rows.len(), state.disks_seen())
    };

    let table = Table::new(
        rows,
        [
            Constraint::Min(16),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(8),
        ],
    )
    .header(
        Row::new(vec!["Disk", "TPS", "Read", "Write", "Await", "Util"]).style(
            Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
        ),
    )
    .block(
        Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)),
    )
    .column_spacing(2);

    f.render_widget(table, area);
}
