//! Report command - PDF report for one subcategory

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use serde::Serialize;

use super::{get_context, get_logger, log_event, open_region, resolve_single};
use crate::output;
use district_core::services::{charts_from_bytes, LogEvent, RegionBlurb, ReportService};

pub struct ReportArgs {
    pub region: Option<String>,
    pub major: Option<String>,
    pub minor: Option<String>,
    pub charts: Vec<PathBuf>,
    pub output: PathBuf,
    pub title: Option<String>,
    pub describe: bool,
    pub region_name: Option<String>,
    pub json: bool,
}

#[derive(Serialize)]
struct ReportSummary {
    path: String,
    title: String,
    bytes: usize,
    charts: usize,
    sentences: Vec<String>,
    region_blurb: Option<RegionBlurb>,
}

pub fn run(args: ReportArgs) -> Result<()> {
    let logger = get_logger();
    let mut ctx = get_context()?;
    open_region(&mut ctx, args.region, &logger, "report")?;

    let selection = resolve_single(&mut ctx, args.major, args.minor)?;
    let view = ctx.current_view()?;
    let region = view.dataset().region().clone();
    let bundle = ctx.analysis.report_bundle(&view)?;

    let blurb = if args.describe {
        let name = args.region_name.unwrap_or_else(|| region.display_name());
        let blurb = ctx.enrichment.describe_or_placeholder(&name);
        if blurb.degraded {
            let mut event = LogEvent::new("enrichment_failed")
                .with_command("report")
                .with_region(region.as_str());
            if let Some(reason) = &blurb.failure {
                event = event.with_error(reason.as_str());
            }
            log_event(&logger, event);
            if !args.json {
                output::warning(&format!("Region description unavailable: {}", blurb.text));
            }
        }
        Some(blurb)
    } else {
        None
    };

    let mut sentences = ctx.report_sentences(&bundle.insights, blurb.as_ref());
    sentences.extend(bundle.campaign_ideas.iter().cloned());

    let mut buffers = Vec::with_capacity(args.charts.len());
    for path in &args.charts {
        let bytes = std::fs::read(path).with_context(|| format!("Failed to read chart {:?}", path))?;
        buffers.push(bytes);
    }
    let charts = charts_from_bytes(buffers)?
        .into_iter()
        .zip(&args.charts)
        .map(|(chart, path)| match path.file_stem() {
            Some(stem) => chart.with_caption(stem.to_string_lossy()),
            None => chart,
        })
        .collect::<Vec<_>>();
    let chart_count = charts.len();

    let title = args
        .title
        .filter(|t| !t.trim().is_empty())
        .unwrap_or_else(|| ReportService::default_title(&selection));

    let started = Instant::now();
    let built = ctx.report_service.build(&title, sentences.clone(), charts);
    let bytes = match built {
        Ok(bytes) => bytes,
        Err(e) => {
            log_event(
                &logger,
                LogEvent::new("report_failed")
                    .with_command("report")
                    .with_region(region.as_str())
                    .with_error(e.to_string())
                    .with_error_details(format!("{:?}", e)),
            );
            return Err(e.into());
        }
    };

    std::fs::write(&args.output, &bytes)
        .with_context(|| format!("Failed to write report to {:?}", args.output))?;

    log_event(
        &logger,
        LogEvent::new("report_generated")
            .with_command("report")
            .with_region(region.as_str())
            .with_duration_ms(started.elapsed().as_millis() as u64),
    );

    if args.json {
        return output::print_json(ReportSummary {
            path: args.output.to_string_lossy().to_string(),
            title,
            bytes: bytes.len(),
            charts: chart_count,
            sentences,
            region_blurb: blurb,
        });
    }

    output::success(&format!("Report written to {}", args.output.display()));
    output::info(&format!(
        "  {} ({} chart pages, {})",
        title,
        chart_count,
        output::format_size(bytes.len() as u64)
    ));
    Ok(())
}
