//! Text rendering of the dashboard projection.
//!
//! Every function returns a `String` so output can be checked without a
//! terminal.

use std::fmt::Write;

use colored::Colorize;

use chemviz_application::{Notice, NoticeLevel};
use chemviz_core::history::HistoryState;
use chemviz_core::projection::{ChartData, DashboardView, StatCards};
use chemviz_core::upload::RowRecord;
use chemviz_telemetry::DiagnosticEvent;

const BAR_WIDTH: u64 = 30;
const TABLE_HEADERS: [&str; 5] = ["Equipment", "Type", "Flow", "Pressure", "Temp"];

pub fn notice(notice: &Notice) -> String {
    match notice.level {
        NoticeLevel::Info => format!("{} {}", "✓".green(), notice.message),
        NoticeLevel::Error => format!("{} {}", "✗".red(), notice.message.red()),
    }
}

/// Recent uploads, most recent first, with the selected one marked.
pub fn history(history: &HistoryState) -> String {
    if history.items().is_empty() {
        return format!("{}\n", "No uploads yet.".bright_black());
    }

    let selected = history.selected_id();
    let mut out = String::new();
    for item in history.items() {
        let marker = if Some(item.id) == selected { "*" } else { " " };
        let _ = writeln!(
            out,
            "{} #{:<5} {:<32} {}  {} records",
            marker,
            item.id,
            item.name,
            item.uploaded_at.format("%Y-%m-%d %H:%M"),
            item.summary.total_records
        );
    }
    out
}

/// The full dashboard: header, stat cards, insight, chart and row table.
pub fn dashboard(view: &DashboardView<'_>, search: &str) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{} {}",
        format!("#{} {}", view.upload.id, view.upload.name).bold(),
        view.upload
            .uploaded_at
            .format("%Y-%m-%d %H:%M UTC")
            .to_string()
            .bright_black()
    );
    out.push('\n');
    out.push_str(&stat_cards(&view.stats));

    if let Some(insight) = &view.insight {
        let _ = writeln!(out, "\n{}", insight.sentence().cyan());
    }

    if !view.chart.categories.is_empty() {
        let _ = writeln!(out, "\n{}", "Equipment Type Distribution".bold());
        out.push_str(&chart(&view.chart));
    }

    out.push('\n');
    if view.rows.is_empty() && !search.is_empty() {
        let _ = writeln!(out, "{}", format!("No rows match \"{}\"", search).bright_black());
    } else {
        out.push_str(&table(&view.rows));
    }
    out
}

fn stat_cards(stats: &StatCards) -> String {
    let cards = [
        ("Total Records", stats.total_records.to_string()),
        ("Avg Flowrate", stats.display_flowrate()),
        ("Avg Pressure", stats.display_pressure()),
        ("Avg Temperature", stats.display_temperature()),
    ];

    let mut out = String::new();
    for (label, value) in cards {
        let _ = writeln!(out, "  {:<16} {}", label, value.bold());
    }
    out
}

/// Horizontal bars scaled to the largest count.
fn chart(chart: &ChartData) -> String {
    let max = chart.values.iter().copied().max().unwrap_or(0);
    let label_width = chart
        .categories
        .iter()
        .map(|c| c.chars().count())
        .max()
        .unwrap_or(0);

    let mut out = String::new();
    for (category, &value) in chart.categories.iter().zip(&chart.values) {
        let len = match max {
            0 => 0,
            max => {
                let scaled = u128::from(value) * u128::from(BAR_WIDTH) / u128::from(max);
                (scaled as usize).max(usize::from(value > 0))
            }
        };
        let bar = "█".repeat(len);
        let _ = writeln!(out, "  {:<label_width$} {} {}", category, bar.blue(), value);
    }
    out
}

fn table(rows: &[&RowRecord]) -> String {
    let cells: Vec<[String; 5]> = rows
        .iter()
        .map(|row| {
            [
                row.equipment_name(),
                row.equipment_type(),
                row.flowrate(),
                row.pressure(),
                row.temperature(),
            ]
        })
        .collect();

    let mut widths = TABLE_HEADERS.map(|h| h.chars().count());
    for row in &cells {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    let header: Vec<String> = TABLE_HEADERS
        .iter()
        .zip(widths)
        .map(|(h, w)| format!("{:<w$}", h))
        .collect();
    let _ = writeln!(out, "{}", header.join("  ").trim_end().bold());

    for row in &cells {
        let line: Vec<String> = row
            .iter()
            .zip(widths)
            .map(|(cell, w)| format!("{:<w$}", cell))
            .collect();
        let _ = writeln!(out, "{}", line.join("  ").trim_end());
    }
    out
}

/// Failure causes captured while the command ran.
pub fn diagnostics(events: &[DiagnosticEvent]) -> String {
    let mut out = format!("{}\n", "Diagnostics:".bold());
    for event in events {
        let operation = event.operation().unwrap_or("-");
        let _ = write!(out, "  [{}] {}: {}", event.level, operation, event.message);
        if let Some(error) = event.error() {
            let _ = write!(out, " ({})", error);
        }
        out.push('\n');
    }
    out
}
