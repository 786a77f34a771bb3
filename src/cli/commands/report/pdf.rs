//! PDF execution report

use chrono::Local;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::PathBuf;

use crate::cli::helpers::resolve_cycle;
use crate::cli::GlobalOpts;
use crate::core::Context;
use crate::report::{ChartRenderer, HttpFetcher, ReportCompositor, ReportInput, StatusCharts};

#[derive(clap::Args, Debug)]
pub struct PdfArgs {
    /// Output file (default: QA_<cycle title>.pdf)
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: PdfArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;

    let test_cases = ctx.store.list_test_cases(cycle.id)?;
    let charts = StatusCharts.render(&test_cases)?;
    let input = ReportInput {
        cycle_title: cycle.title.clone(),
        test_cases,
        criteria: ctx.store.list_criteria(cycle.id)?,
        evidence: ctx.store.list_evidence(cycle.id)?,
        charts,
        generated_at: Local::now().naive_local(),
    };

    let compositor = ReportCompositor::new(HttpFetcher::new(ctx.config.evidence_timeout()));
    let bytes = compositor.compose(&input)?;

    let path = args
        .output
        .unwrap_or_else(|| PathBuf::from(cycle.report_file_name()));
    fs::write(&path, &bytes).into_diagnostic()?;

    if !global.quiet {
        println!(
            "{} Report written to {} ({} KiB)",
            style("✓").green(),
            style(path.display()).cyan(),
            bytes.len().div_ceil(1024)
        );
    }
    Ok(())
}
