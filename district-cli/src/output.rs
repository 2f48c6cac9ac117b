//! Output formatting utilities

use colored::Colorize;
use comfy_table::{presets::UTF8_FULL_CONDENSED, Cell, CellAlignment, ContentArrangement, Table};
use serde::Serialize;

use district_core::domain::insight::format_won;
use district_core::domain::{MeasureValue, Summary};
use district_core::OperationResult;

pub fn success(msg: &str) {
    println!("{}", msg.green());
}

pub fn error(msg: &str) {
    eprintln!("{}", msg.red());
}

pub fn warning(msg: &str) {
    println!("{}", msg.yellow());
}

pub fn info(msg: &str) {
    println!("{}", msg.cyan());
}

pub fn heading(msg: &str) {
    println!("{}", msg.bold());
}

pub fn create_table() -> Table {
    let mut table = Table::new();
    table.load_preset(UTF8_FULL_CONDENSED);
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table
}

/// Wrap data in an `OperationResult` and print it as pretty JSON
pub fn print_json<T: Serialize>(data: T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(&OperationResult::ok(data))?);
    Ok(())
}

pub fn format_value(value: &MeasureValue) -> String {
    match value {
        MeasureValue::Count(c) => c.to_string(),
        MeasureValue::Amount(a) => format!("{} 원", format_won(*a)),
        MeasureValue::Mean(Some(m)) => format!("{} 원", format_won(*m)),
        MeasureValue::Mean(None) => "-".to_string(),
    }
}

/// One row per group: key columns, then measure columns right-aligned
pub fn summary_table(summary: &Summary) -> Table {
    let mut table = create_table();

    let mut header: Vec<String> = summary.group_keys.iter().map(|k| k.title().to_string()).collect();
    header.extend(summary.measures.iter().map(|m| m.title().to_string()));
    table.set_header(header);

    for row in &summary.rows {
        let mut cells: Vec<Cell> = row.keys.iter().map(|k| Cell::new(k.to_string())).collect();
        cells.extend(
            row.values
                .iter()
                .map(|v| Cell::new(format_value(v)).set_alignment(CellAlignment::Right)),
        );
        table.add_row(cells);
    }
    table
}

/// Print a titled summary, or an explicit no-data line
pub fn print_summary(title: &str, summary: &Summary) {
    heading(title);
    if summary.is_empty() {
        warning("  데이터 없음");
    } else {
        println!("{}", summary_table(summary));
    }
    println!();
}

pub fn format_size(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;

    if bytes >= MB {
        format!("{:.1} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.1} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} bytes", bytes)
    }
}
