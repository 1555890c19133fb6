//! Plain-text tables and coloured notifications for the terminal.

use crate::domain::{CheckInStatus, Driver, LogEntry, Notification, NotificationKind};
use crossterm::ExecutableCommand;
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use std::io::{Write, stdout};

const MAX_CELL: usize = 40;

fn cell(s: &str, width: usize) -> String {
    let count = s.chars().count();
    if count > width {
        let cut: String = s.chars().take(width.saturating_sub(1)).collect();
        format!("{}…", cut)
    } else {
        format!("{}{}", s, " ".repeat(width - count))
    }
}

/// Render rows under a header, column widths fitted to content (capped).
fn table(header: &[&str], rows: &[Vec<String>]) -> String {
    let mut widths: Vec<usize> = header.iter().map(|h| h.chars().count()).collect();
    for row in rows {
        for (w, value) in widths.iter_mut().zip(row) {
            *w = (*w).max(value.chars().count()).min(MAX_CELL);
        }
    }
    let line = |values: Vec<String>| -> String {
        values
            .iter()
            .zip(&widths)
            .map(|(v, w)| cell(v, *w))
            .collect::<Vec<_>>()
            .join("  ")
            .trim_end()
            .to_string()
    };
    let mut out = String::new();
    out.push_str(&line(header.iter().map(|h| h.to_string()).collect()));
    out.push('\n');
    out.push_str(
        &widths
            .iter()
            .map(|w| "─".repeat(*w))
            .collect::<Vec<_>>()
            .join("  "),
    );
    out.push('\n');
    for row in rows {
        out.push_str(&line(row.clone()));
        out.push('\n');
    }
    out
}

fn status_label(status: CheckInStatus) -> &'static str {
    match status {
        CheckInStatus::Success => "SUCCESS",
        CheckInStatus::Failed => "FAILED",
        CheckInStatus::Error => "ERROR",
    }
}

pub fn log_table(logs: &[LogEntry]) -> String {
    if logs.is_empty() {
        return "No check-in activity yet.\n".to_string();
    }
    let rows: Vec<Vec<String>> = logs
        .iter()
        .map(|l| {
            vec![
                l.name.clone(),
                l.employee_id.clone(),
                l.timestamp.format("%Y-%m-%d %H:%M:%S UTC").to_string(),
                status_label(l.status).to_string(),
                l.details.clone(),
            ]
        })
        .collect();
    table(&["Name", "ID", "Time", "Status", "Details"], &rows)
}

pub fn driver_table(drivers: &[Driver]) -> String {
    if drivers.is_empty() {
        return "No drivers found.\n".to_string();
    }
    let rows: Vec<Vec<String>> = drivers
        .iter()
        .map(|d| {
            vec![
                d.name.clone(),
                d.employee_id.clone(),
                d.vehicle.clone(),
                d.plate.clone(),
            ]
        })
        .collect();
    table(&["Name", "ID", "Vehicle", "Plate"], &rows)
}

/// One-line label for menus and pickers.
pub fn driver_label(d: &Driver) -> String {
    format!("{} ({}) · {} · {}", d.name, d.employee_id, d.vehicle, d.plate)
}

fn print_colored(color: Color, text: &str) {
    let mut out = stdout();
    let _ = out.execute(SetForegroundColor(color));
    let _ = out.execute(Print(text));
    let _ = out.execute(ResetColor);
    let _ = out.flush();
}

pub fn print_notification(n: &Notification) {
    let color = match n.kind {
        NotificationKind::Info => Color::Green,
        NotificationKind::Destructive => Color::Red,
    };
    let mut text = format!("\n■ {}\n", n.title);
    if let Some(d) = &n.description {
        text.push_str(&format!("  {}\n", d));
    }
    print_colored(color, &text);
}

pub fn print_error(title: &str, description: &str) {
    print_notification(&Notification::destructive(title, description));
}

pub fn print_heading(title: &str) {
    print_colored(Color::Yellow, &format!("\n{}\n\n", title));
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    #[test]
    fn empty_states() {
        assert_eq!(log_table(&[]), "No check-in activity yet.\n");
        assert_eq!(driver_table(&[]), "No drivers found.\n");
    }

    #[test]
    fn log_rows_are_aligned() {
        let logs = vec![LogEntry {
            id: "1".into(),
            name: "Ana".into(),
            employee_id: "SPX1".into(),
            status: CheckInStatus::Failed,
            details: "User is 612m away from target.".into(),
            timestamp: Utc.with_ymd_and_hms(2025, 3, 4, 8, 30, 0).unwrap(),
        }];
        let out = log_table(&logs);
        let lines: Vec<_> = out.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("Name  ID    Time"));
        assert!(lines[2].contains("2025-03-04 08:30:00 UTC"));
        assert!(lines[2].contains("FAILED"));
        assert!(lines[2].ends_with("User is 612m away from target."));
    }

    #[test]
    fn long_cells_are_truncated() {
        assert_eq!(cell("abcdef", 4), "abc…");
        assert_eq!(cell("ab", 4), "ab  ");
    }
}
