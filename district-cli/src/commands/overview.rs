//! Overview command - major-category breakdown

use anyhow::Result;
use comfy_table::{Cell, CellAlignment};

use super::{get_context, get_logger, log_event, open_region, resolve_major};
use crate::output;
use district_core::domain::insight::format_won;
use district_core::services::LogEvent;
use district_core::Selection;

pub fn run(region: Option<String>, major: Option<String>, json: bool) -> Result<()> {
    let logger = get_logger();
    let mut ctx = get_context()?;
    open_region(&mut ctx, region, &logger, "overview")?;

    let major = resolve_major(&ctx, major)?;
    ctx.select(Selection::major(&major)?);
    let view = ctx.current_view()?;
    let bundle = ctx.analysis.overview(&view)?;

    log_event(
        &logger,
        LogEvent::new("command_executed")
            .with_command("overview")
            .with_region(view.dataset().region().as_str()),
    );

    if json {
        return output::print_json(&bundle);
    }

    output::heading(&format!("{} ({} rows)", bundle.selection, bundle.rows));
    println!();

    output::print_summary("월별 매출", &bundle.monthly);

    output::heading("성별 매출 비중");
    let mut shares = output::create_table();
    shares.set_header(vec!["성별", "매출", "비중"]);
    for share in &bundle.gender_share {
        shares.add_row(vec![
            Cell::new(&share.label),
            Cell::new(format!("{} 원", format_won(share.amount))).set_alignment(CellAlignment::Right),
            Cell::new(format!("{}%", share.percent)).set_alignment(CellAlignment::Right),
        ]);
    }
    println!("{}", shares);
    println!();

    output::print_summary("성별 x 연령대 매출", &bundle.gender_age);
    output::print_summary("요일별 매출", &bundle.weekday);
    output::print_summary("시간대별 매출", &bundle.hour);
    Ok(())
}
