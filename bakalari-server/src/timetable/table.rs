//! Fixed-column text rendering of flattened timetable rows.
//!
//! The output is a bordered ASCII table sized to its widest cells, the
//! form an agent (or a human on a terminal) can read without any further
//! processing.

use chrono::{DateTime, Duration, Utc};

use super::flatten::FlatRow;

/// Column headers, in display order.
const HEADERS: [&str; 10] = [
    "Date",
    "Day",
    "Hour",
    "Begin Time",
    "End Time",
    "Group",
    "Subject",
    "Teacher",
    "Room",
    "Theme",
];

/// Render rows as a bordered, fixed-column text table.
pub fn render_table(rows: &[FlatRow]) -> String {
    let widths = column_widths(rows);
    let border = border(&widths);

    let mut out = String::new();
    out.push_str(&border);
    out.push('\n');

    let mut header = String::from("|");
    for (title, &width) in HEADERS.iter().zip(&widths) {
        header.push_str(&format!(" {title:^width$} |"));
    }
    out.push_str(&header);
    out.push('\n');
    out.push_str(&border);
    out.push('\n');

    for row in rows {
        let mut line = String::from("|");
        for (cell, &width) in columns(row).iter().zip(&widths) {
            line.push_str(&format!(" {cell:<width$} |"));
        }
        out.push_str(&line);
        out.push('\n');
    }

    out.push_str(&border);
    out
}

/// Trailer line reporting the current wall-clock time.
///
/// The backend's home timezone is UTC+1; reporting it lets the reader
/// judge how current the rendered week is.
pub fn current_time_line() -> String {
    time_line(Utc::now())
}

fn time_line(now: DateTime<Utc>) -> String {
    let local = now + Duration::hours(1);
    format!("Current time is {}", local.format("%Y-%m-%d %H:%M:%S"))
}

fn columns(row: &FlatRow) -> [&str; 10] {
    [
        &row.date,
        &row.day,
        &row.hour,
        &row.begin_time,
        &row.end_time,
        &row.group,
        &row.subject,
        &row.teacher,
        &row.room,
        &row.theme,
    ]
}

fn column_widths(rows: &[FlatRow]) -> Vec<usize> {
    let mut widths: Vec<usize> = HEADERS.iter().map(|h| h.len()).collect();
    for row in rows {
        for (width, cell) in widths.iter_mut().zip(columns(row)) {
            *width = (*width).max(cell.len());
        }
    }
    widths
}

fn border(widths: &[usize]) -> String {
    let mut line = String::from("+");
    for &width in widths {
        line.push_str(&"-".repeat(width + 2));
        line.push('+');
    }
    line
}
