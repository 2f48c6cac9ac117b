//! CLI command implementations

pub mod categories;
pub mod compare;
pub mod describe;
pub mod insights;
pub mod logs;
pub mod overview;
pub mod report;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::{anyhow, Context, Result};
use dialoguer::{MultiSelect, Select};
use indicatif::{ProgressBar, ProgressStyle};

use district_core::services::{EntryPoint, LogEvent, LoggingService};
use district_core::{DistrictContext, Error, Selection};

/// Get the logging service for CLI operations
///
/// Returns None if logging fails to initialize (never blocks a command)
pub fn get_logger() -> Option<LoggingService> {
    let district_dir = get_district_dir().ok()?;
    LoggingService::new(&district_dir, EntryPoint::Cli, env!("CARGO_PKG_VERSION")).ok()
}

/// Log an event, ignoring any errors
pub fn log_event(logger: &Option<LoggingService>, event: LogEvent) {
    if let Some(l) = logger {
        let _ = l.log(event);
    }
}

/// District directory from `DISTRICT_DIR` or `~/.district`
pub fn get_district_dir() -> Result<PathBuf> {
    if let Ok(dir) = std::env::var("DISTRICT_DIR") {
        return Ok(PathBuf::from(dir));
    }
    dirs::home_dir()
        .map(|home| home.join(".district"))
        .ok_or_else(|| anyhow!("Could not find home directory; set DISTRICT_DIR"))
}

pub fn get_context() -> Result<DistrictContext> {
    let district_dir = get_district_dir()?;
    std::fs::create_dir_all(&district_dir)
        .with_context(|| format!("Failed to create district directory: {:?}", district_dir))?;

    DistrictContext::new(&district_dir).context("Failed to initialize district context")
}

fn interactive() -> bool {
    atty::is(atty::Stream::Stdin) && atty::is(atty::Stream::Stdout)
}

fn spinner(message: String) -> ProgressBar {
    let bar = ProgressBar::new_spinner();
    if let Ok(style) = ProgressStyle::with_template("{spinner:.cyan} {msg}") {
        bar.set_style(style);
    }
    bar.set_message(message);
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

/// Resolve and load the region for this command
///
/// Without `--region` (or `DISTRICT_REGION`) an interactive terminal is
/// offered the regions found under the data directory.
pub fn open_region(
    ctx: &mut DistrictContext,
    region: Option<String>,
    logger: &Option<LoggingService>,
    command: &str,
) -> Result<()> {
    let raw = match region.filter(|r| !r.trim().is_empty()) {
        Some(r) => r,
        None => pick_region(ctx)?,
    };

    let show_progress = interactive();
    let bar = show_progress.then(|| spinner(format!("Loading region {}...", raw)));
    let started = Instant::now();
    let outcome = ctx.select_region(&raw);
    if let Some(bar) = bar {
        bar.finish_and_clear();
    }

    let outcome = outcome?;
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match outcome.failure {
        None => {
            if !outcome.from_cache {
                log_event(
                    logger,
                    LogEvent::new("region_loaded")
                        .with_command(command)
                        .with_region(raw.as_str())
                        .with_duration_ms(elapsed_ms),
                );
            }
            Ok(())
        }
        Some(e) => {
            log_event(
                logger,
                LogEvent::new("region_load_failed")
                    .with_command(command)
                    .with_region(raw.as_str())
                    .with_error(e.to_string()),
            );
            Err(e.into())
        }
    }
}

fn pick_region(ctx: &DistrictContext) -> Result<String> {
    let no_region = || Error::precondition("No region selected. Pass --region or set DISTRICT_REGION.");
    if !interactive() {
        return Err(no_region().into());
    }

    let regions = ctx.available_regions()?;
    if regions.is_empty() {
        return Err(Error::precondition(format!(
            "No region datasets found in {}",
            ctx.config.data_dir.display()
        ))
        .into());
    }

    let idx = Select::new()
        .with_prompt("Region")
        .items(&regions)
        .default(0)
        .interact_opt()?
        .ok_or_else(no_region)?;
    Ok(regions[idx].clone())
}

/// Major category from the flag, or picked interactively
pub fn resolve_major(ctx: &DistrictContext, major: Option<String>) -> Result<String> {
    if let Some(m) = major.filter(|m| !m.trim().is_empty()) {
        return Ok(m);
    }
    let none = || Error::precondition("No business category selected. Pass --major.");
    if !interactive() {
        return Err(none().into());
    }

    let majors = ctx.dataset()?.major_categories();
    let idx = Select::new()
        .with_prompt("업종 대분류")
        .items(&majors)
        .default(0)
        .interact_opt()?
        .ok_or_else(none)?;
    Ok(majors[idx].clone())
}

/// Minor categories from the flag, or picked interactively
///
/// `max` bounds an interactive pick; flags are validated by `Selection`.
pub fn resolve_minors(
    ctx: &DistrictContext,
    major: &str,
    minors: Vec<String>,
    max: usize,
) -> Result<Vec<String>> {
    if !minors.is_empty() || !interactive() {
        return Ok(minors);
    }

    let options = ctx.dataset()?.minor_categories(major);
    if options.is_empty() {
        return Ok(Vec::new());
    }

    if max == 1 {
        let picked = Select::new()
            .with_prompt("업종 소분류")
            .items(&options)
            .default(0)
            .interact_opt()?;
        return Ok(picked.map(|i| vec![options[i].clone()]).unwrap_or_default());
    }

    let picked = MultiSelect::new()
        .with_prompt(format!("업종 소분류 (최대 {}개)", max))
        .items(&options)
        .interact_opt()?
        .unwrap_or_default();
    Ok(picked.into_iter().map(|i| options[i].clone()).collect())
}

/// Single-subcategory selection used by insights and report
pub fn resolve_single(
    ctx: &mut DistrictContext,
    major: Option<String>,
    minor: Option<String>,
) -> Result<Selection> {
    let major = resolve_major(ctx, major)?;
    let minors = resolve_minors(ctx, &major, minor.into_iter().collect(), 1)?;
    let minor = minors.into_iter().next().unwrap_or_default();
    let selection = Selection::single(&major, &minor)?;
    ctx.select(selection.clone());
    Ok(selection)
}
