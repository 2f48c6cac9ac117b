//! Categories command - business categories of a region

use anyhow::Result;
use comfy_table::Cell;

use super::{get_context, get_logger, log_event, open_region};
use crate::output;
use district_core::services::{LogEvent, RegionInfo};

pub fn run(region: Option<String>, json: bool) -> Result<()> {
    let logger = get_logger();
    let mut ctx = get_context()?;
    open_region(&mut ctx, region, &logger, "categories")?;

    let catalogue = ctx.categories()?;
    log_event(
        &logger,
        LogEvent::new("command_executed")
            .with_command("categories")
            .with_region(catalogue.region.as_str()),
    );

    if json {
        return output::print_json(&catalogue);
    }

    let dataset = ctx.dataset()?;
    let info = RegionInfo::of(&dataset);
    output::heading(&format!("{} ({} rows)", info.name, info.rows));
    println!();

    let mut table = output::create_table();
    table.set_header(vec!["대분류", "소분류"]);
    for entry in &catalogue.categories {
        table.add_row(vec![Cell::new(&entry.major), Cell::new(entry.minors.join(", "))]);
    }
    println!("{}", table);
    Ok(())
}
