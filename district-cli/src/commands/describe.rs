//! Describe command - region blurbs from the text service

use anyhow::Result;

use super::{get_context, get_logger, log_event};
use crate::output;
use district_core::services::LogEvent;

pub fn run(names: Vec<String>, json: bool) -> Result<()> {
    let logger = get_logger();
    let ctx = get_context()?;

    if !ctx.enrichment.is_available() && !json {
        output::warning("OPENAI_API_KEY is not set; showing placeholders.");
    }

    let blurbs = ctx.enrichment.describe_all(&names);
    for blurb in blurbs.iter().filter(|b| b.degraded) {
        let mut event = LogEvent::new("enrichment_failed").with_command("describe");
        if let Some(reason) = &blurb.failure {
            event = event.with_error(reason.as_str());
        }
        log_event(&logger, event);
    }
    log_event(&logger, LogEvent::new("command_executed").with_command("describe"));

    if json {
        return output::print_json(&blurbs);
    }

    for blurb in &blurbs {
        output::heading(&blurb.region);
        if blurb.degraded {
            output::warning(&format!("  {}", blurb.text));
        } else {
            println!("  {}", blurb.text);
        }
        println!();
    }
    Ok(())
}
