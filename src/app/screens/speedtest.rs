//! Drive and object speedtest tables

use ratatui::{
    layout::{Constraint, Rect},
    style::{Color, Modifier, Style},
    widgets::{Block, Borders, Row, Table},
    Frame,
};

use crate::models::{DriveSpeedTestResult, ObjectSpeedTestResult};
use crate::util::units::{format_bytes, format_per_sec, format_rate};

fn header(cells: Vec<&'static str>) -> Row<'static> {
    Row::new(cells).style(
        Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
    )
}

fn results_block(title: String) -> Block<'static> {
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
}

/// One row per drive, endpoint errors take a whole row
pub fn drive_rows(results: &[DriveSpeedTestResult]) -> Vec<Row<'static>> {
    let error_style = Style::default().fg(Color::Red);
    let mut rows = Vec::new();
    for result in results {
        if let Some(error) = &result.error {
            rows.push(
                Row::new(vec![
                    result.endpoint.clone(),
                    String::new(),
                    String::new(),
                    String::new(),
                    error.clone(),
                ])
                .style(error_style),
            );
            continue;
        }
        for drive in &result.drive_perf {
            let row = match &drive.error {
                Some(error) => Row::new(vec![
                    result.endpoint.clone(),
                    drive.path.clone(),
                    String::new(),
                    String::new(),
                    error.clone(),
                ])
                .style(error_style),
                None => Row::new(vec![
                    result.endpoint.clone(),
                    drive.path.clone(),
                    format_rate(drive.read_throughput as f64),
                    format_rate(drive.write_throughput as f64),
                    "ok".to_string(),
                ]),
            };
            rows.push(row);
        }
    }
    rows
}

pub fn render_drive(f: &mut Frame, area: Rect, results: &[DriveSpeedTestResult]) {
    let table = Table::new(
        drive_rows(results),
        [
            Constraint::Min(20),
            Constraint::Min(16),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Min(8),
        ],
    )
    .header(header(vec!["Endpoint", "Drive", "Read", "Write", "Status"]))
    .block(results_block(format!("Drives ({} endpoints)", results.len())))
    .column_spacing(2);

    f.render_widget(table, area);
}

pub fn render_object(f: &mut Frame, area: Rect, result: Option<&ObjectSpeedTestResult>) {
    let Some(result) = result else {
        let table = Table::new(Vec::<Row>::new(), [Constraint::Min(10)])
            .block(results_block("Objects".to_string()));
        f.render_widget(table, area);
        return;
    };

    let mut rows: Vec<Row> = result
        .put_stats
        .servers
        .iter()
        .map(|put| {
            let get = result
                .get_stats
                .servers
                .iter()
                .find(|get| get.endpoint == put.endpoint);
            let status = put
                .err
                .clone()
                .or_else(|| get.and_then(|g| g.err.clone()))
                .unwrap_or_else(|| "ok".to_string());
            Row::new(vec![
                put.endpoint.clone(),
                format_rate(put.throughput_per_sec as f64),
                format_per_sec(put.objects_per_sec as f64, "obj"),
                get.map(|g| format_rate(g.throughput_per_sec as f64))
                    .unwrap_or_default(),
                get.map(|g| format_per_sec(g.objects_per_sec as f64, "obj"))
                    .unwrap_or_default(),
                status,
            ])
        })
        .collect();

    rows.push(
        Row::new(vec![
            "Total".to_string(),
            format_rate(result.put_stats.throughput_per_sec as f64),
            format_per_sec(result.put_stats.objects_per_sec as f64, "obj"),
            format_rate(result.get_stats.throughput_per_sec as f64),
            format_per_sec(result.get_stats.objects_per_sec as f64, "obj"),
            String::new(),
        ])
        .style(Style::default().add_modifier(Modifier::BOLD)),
    );

    let title = format!(
        "Objects: {} servers, {} drives, {} objects, {} concurrent",
        result.servers,
        result.disks,
        format_bytes(result.size),
        result.concurrent
    );
    let table = Table::new(
        rows,
        [
            Constraint::Min(20),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Min(8),
        ],
    )
    .header(header(vec!["Server", "PUT", "PUT obj", "GET", "GET obj", "Status"]))
    .block(results_block(title))
    .column_spacing(2);

    f.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::DrivePerf;

    #[test]
    fn test_drive_rows_one_per_drive() {
        let results = vec![
            DriveSpeedTestResult {
                version: "1".to_string(),
                endpoint: "node1".to_string(),
                drive_perf: vec![
                    DrivePerf {
                        path: "/d1".to_string(),
                        read_throughput: 1,
                        write_throughput: 1,
                        error: None,
                    },
                    DrivePerf {
                        path: "/d2".to_string(),
                        read_throughput: 0,
                        write_throughput: 0,
                        error: Some("faulty".to_string()),
                    },
                ],
                error: None,
            },
            DriveSpeedTestResult {
                version: "1".to_string(),
                endpoint: "node2".to_string(),
                drive_perf: Vec::new(),
                error: Some("offline".to_string()),
            },
        ];
        assert_eq!(drive_rows(&results).len(), 3);
    }
}
