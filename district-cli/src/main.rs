//! District CLI - commercial-district sales analytics in your terminal

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{categories, compare, describe, insights, logs, overview, report};
use district_core::OperationResult;

/// District - card sales analytics for commercial districts
#[derive(Parser)]
#[command(name = "district", version, about, long_about = None)]
struct Cli {
    /// Region key under the data directory, or an http(s) CSV URL
    #[arg(long, short, global = true, env = "DISTRICT_REGION")]
    region: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List business categories of the region
    Categories {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Monthly, gender, age, weekday and hour breakdown of a major category
    Overview {
        /// Major business category
        major: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Compare up to three subcategories side by side
    Compare {
        /// Major business category
        major: Option<String>,
        /// Comma-separated subcategories
        #[arg(long, value_delimiter = ',')]
        minor: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Derive insights and campaign ideas for one subcategory
    Insights {
        /// Major business category
        major: Option<String>,
        /// Subcategory
        minor: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Build the PDF report for one subcategory
    Report {
        /// Major business category
        major: Option<String>,
        /// Subcategory
        minor: Option<String>,
        /// Chart images (PNG or JPEG), one page each in the given order
        #[arg(long = "chart")]
        charts: Vec<PathBuf>,
        /// Output file
        #[arg(short, long, default_value = "district_report.pdf")]
        output: PathBuf,
        /// Report title
        #[arg(long)]
        title: Option<String>,
        /// Append a region description from the text service
        #[arg(long)]
        describe: bool,
        /// Region name sent to the text service (defaults to the region)
        #[arg(long)]
        region_name: Option<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Describe one or more regions with the text service
    Describe {
        /// Region names
        #[arg(required = true)]
        names: Vec<String>,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// View and manage the event log
    Logs {
        #[command(subcommand)]
        command: logs::LogsCommands,
    },
}

impl Commands {
    fn json(&self) -> bool {
        match self {
            Commands::Categories { json }
            | Commands::Overview { json, .. }
            | Commands::Compare { json, .. }
            | Commands::Insights { json, .. }
            | Commands::Report { json, .. }
            | Commands::Describe { json, .. } => *json,
            Commands::Logs { command } => command.json(),
        }
    }
}

fn init_tracing() {
    let filter = EnvFilter::try_from_env("DISTRICT_LOG").unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn main() -> ExitCode {
    init_tracing();
    let cli = Cli::parse();
    let json = cli.command.json();

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if json {
                let failure = OperationResult::<()>::fail(e.to_string());
                match serde_json::to_string_pretty(&failure) {
                    Ok(body) => println!("{}", body),
                    Err(_) => output::error(&e.to_string()),
                }
            } else {
                match e.downcast_ref::<district_core::Error>() {
                    Some(err) if err.is_user_facing() => output::warning(&err.to_string()),
                    _ => output::error(&format!("Error: {:#}", e)),
                }
            }
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<()> {
    let region = cli.region;
    match cli.command {
        Commands::Categories { json } => categories::run(region, json),
        Commands::Overview { major, json } => overview::run(region, major, json),
        Commands::Compare { major, minor, json } => compare::run(region, major, minor, json),
        Commands::Insights { major, minor, json } => insights::run(region, major, minor, json),
        Commands::Report {
            major,
            minor,
            charts,
            output,
            title,
            describe,
            region_name,
            json,
        } => report::run(report::ReportArgs {
            region,
            major,
            minor,
            charts,
            output,
            title,
            describe,
            region_name,
            json,
        }),
        Commands::Describe { names, json } => describe::run(names, json),
        Commands::Logs { command } => logs::run(command),
    }
}
