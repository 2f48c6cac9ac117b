//! Logs command - view and manage the event log

use std::path::PathBuf;

use anyhow::Result;
use clap::Subcommand;
use colored::Colorize;
use dialoguer::Confirm;

use super::get_district_dir;
use crate::output;
use district_core::services::{EntryPoint, LoggingService};

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Subcommand)]
pub enum LogsCommands {
    /// Show recent log entries
    List {
        /// Number of entries to show
        #[arg(short, long, default_value = "50")]
        limit: usize,
        /// Show only errors
        #[arg(long)]
        errors: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Clear old log entries
    Clear {
        /// Delete logs older than N days
        #[arg(long, default_value = "30")]
        older_than_days: u64,
        /// Skip confirmation prompt
        #[arg(long, short = 'f')]
        force: bool,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Show log statistics and database path
    Stats {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Copy the log database to a file for troubleshooting
    Export {
        /// Destination file
        #[arg(short, long, default_value = "district_logs.duckdb")]
        output: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

impl LogsCommands {
    pub fn json(&self) -> bool {
        match self {
            LogsCommands::List { json, .. }
            | LogsCommands::Clear { json, .. }
            | LogsCommands::Stats { json }
            | LogsCommands::Export { json, .. } => *json,
        }
    }
}

fn get_logging_service() -> Result<LoggingService> {
    let district_dir = get_district_dir()?;
    LoggingService::new(&district_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION"))
}

fn format_timestamp(timestamp_ms: i64) -> String {
    use chrono::{Local, TimeZone};
    Local
        .timestamp_millis_opt(timestamp_ms)
        .single()
        .map(|dt| dt.format("%Y-%m-%d %H:%M:%S").to_string())
        .unwrap_or_else(|| timestamp_ms.to_string())
}

pub fn run(command: LogsCommands) -> Result<()> {
    match command {
        LogsCommands::List { limit, errors, json } => {
            let service = get_logging_service()?;
            let entries = if errors {
                service.get_errors(limit)?
            } else {
                service.get_recent(limit)?
            };

            if json {
                return output::print_json(&entries);
            }

            if entries.is_empty() {
                println!("No log entries found.");
                return Ok(());
            }

            let mut table = output::create_table();
            table.set_header(vec!["Time", "Entry", "Event", "Context", "Duration", "Error"]);

            for entry in &entries {
                let context = [entry.command.as_deref(), entry.region.as_deref()]
                    .iter()
                    .filter_map(|&s| s)
                    .collect::<Vec<_>>()
                    .join(", ");

                let duration = entry
                    .duration_ms
                    .map(|ms| format!("{} ms", ms))
                    .unwrap_or_default();

                let error_indicator = if entry.error_message.is_some() {
                    "!".red().to_string()
                } else {
                    String::new()
                };

                table.add_row(vec![
                    format_timestamp(entry.timestamp),
                    entry.entry_point.clone(),
                    entry.event.clone(),
                    context,
                    duration,
                    error_indicator,
                ]);
            }

            println!("{}", table);

            if !errors {
                let recent_errors = service.get_errors(3)?;
                if !recent_errors.is_empty() {
                    println!();
                    println!("{}", "Recent Errors:".red().bold());
                    for err in &recent_errors {
                        println!(
                            "  {} [{}]: {}",
                            format_timestamp(err.timestamp).dimmed(),
                            err.event,
                            err.error_message.as_deref().unwrap_or("Unknown error")
                        );
                    }
                }
            }
        }
        LogsCommands::Clear {
            older_than_days,
            force,
            json,
        } => {
            let service = get_logging_service()?;
            let cutoff_ms = chrono::Utc::now().timestamp_millis() - older_than_days as i64 * DAY_MS;

            if !force && !json {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Delete logs older than {} days?", older_than_days))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Cancelled.");
                    return Ok(());
                }
            }

            let deleted = service.delete_before(cutoff_ms)?;

            if json {
                return output::print_json(serde_json::json!({ "deleted": deleted }));
            }
            output::success(&format!("Deleted {} log entries", deleted));
        }
        LogsCommands::Stats { json } => {
            let service = get_logging_service()?;
            let total = service.count()?;
            let errors = service.get_errors(1000)?.len();
            let db_path = service.db_path().to_path_buf();
            let size_bytes = std::fs::metadata(&db_path).map(|m| m.len()).unwrap_or(0);

            if json {
                return output::print_json(serde_json::json!({
                    "total_entries": total,
                    "error_count": errors,
                    "database_path": db_path.to_string_lossy(),
                    "database_size_bytes": size_bytes
                }));
            }

            output::heading("Log Statistics");
            println!("  Total entries: {}", total);
            println!("  Errors: {}", errors);
            println!("  Database: {}", db_path.display());
            println!("  Size: {}", output::format_size(size_bytes));
        }
        LogsCommands::Export { output: path, json } => {
            let service = get_logging_service()?;
            let written = service.export(&path)?;
            let size_bytes = std::fs::metadata(&written).map(|m| m.len()).unwrap_or(0);

            if json {
                return output::print_json(serde_json::json!({
                    "path": written.to_string_lossy(),
                    "size_bytes": size_bytes
                }));
            }
            output::success(&format!(
                "Exported event log to {} ({})",
                written.display(),
                output::format_size(size_bytes)
            ));
        }
    }

    Ok(())
}
