//! Compare command - subcategories side by side

use anyhow::Result;

use super::{get_context, get_logger, log_event, open_region, resolve_major, resolve_minors};
use crate::output;
use district_core::domain::MAX_COMPARED_MINORS;
use district_core::services::LogEvent;
use district_core::Selection;

pub fn run(region: Option<String>, major: Option<String>, minors: Vec<String>, json: bool) -> Result<()> {
    let logger = get_logger();
    let mut ctx = get_context()?;
    open_region(&mut ctx, region, &logger, "compare")?;

    let major = resolve_major(&ctx, major)?;
    let minors = resolve_minors(&ctx, &major, minors, MAX_COMPARED_MINORS)?;
    ctx.select(Selection::compare(&major, &minors)?);
    let view = ctx.current_view()?;
    let bundle = ctx.analysis.comparison(&view)?;

    log_event(
        &logger,
        LogEvent::new("command_executed")
            .with_command("compare")
            .with_region(view.dataset().region().as_str()),
    );

    if json {
        return output::print_json(&bundle);
    }

    output::heading(&format!("{} ({} rows)", bundle.selection, bundle.rows));
    println!();
    output::print_summary("연월별 매출", &bundle.year_month);
    output::print_summary("성별 매출", &bundle.gender);
    output::print_summary("연령대별 매출", &bundle.age);
    output::print_summary("시간대별 매출", &bundle.hour);
    output::print_summary("요일별 매출", &bundle.weekday);
    Ok(())
}
