//! Insights command - report figures for one subcategory

use anyhow::Result;
use colored::Colorize;
use comfy_table::{Cell, CellAlignment};

use super::{get_context, get_logger, log_event, open_region, resolve_single};
use crate::output;
use district_core::domain::insight::format_won;
use district_core::domain::Season;
use district_core::services::LogEvent;

pub fn run(region: Option<String>, major: Option<String>, minor: Option<String>, json: bool) -> Result<()> {
    let logger = get_logger();
    let mut ctx = get_context()?;
    open_region(&mut ctx, region, &logger, "insights")?;

    resolve_single(&mut ctx, major, minor)?;
    let view = ctx.current_view()?;
    let bundle = ctx.analysis.report_bundle(&view)?;

    log_event(
        &logger,
        LogEvent::new("command_executed")
            .with_command("insights")
            .with_region(view.dataset().region().as_str()),
    );

    if json {
        return output::print_json(&bundle);
    }

    output::heading(&bundle.insights.selection.describe());
    for sentence in bundle.insights.sentences() {
        println!("  {}", sentence);
    }
    println!();

    output::print_summary("시간대별 매출", &bundle.hour);
    output::print_summary("요일별 매출", &bundle.weekday);
    output::print_summary("요일 x 시간대 매출", &bundle.weekday_hour);

    output::heading("월별 매출 추이");
    let mut seasons = output::create_table();
    seasons.set_header(vec!["연월", "매출", "구분"]);
    for month in &bundle.seasonality {
        let label = match month.season {
            Season::High => month.season.label().green().to_string(),
            Season::Low => month.season.label().dimmed().to_string(),
        };
        seasons.add_row(vec![
            Cell::new(month.month.to_string()),
            Cell::new(format!("{} 원", format_won(month.amount))).set_alignment(CellAlignment::Right),
            Cell::new(label),
        ]);
    }
    println!("{}", seasons);
    if let Some(mean) = bundle.insights.monthly_mean {
        output::info(&format!("  월 평균 매출: {} 원", format_won(mean)));
    }
    println!();

    output::heading("캠페인 아이디어");
    for idea in &bundle.campaign_ideas {
        println!("  - {}", idea);
    }
    Ok(())
}
