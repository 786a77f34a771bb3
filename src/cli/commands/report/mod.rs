//! `qag report` command - Execution reports

mod pdf;
mod summary;

use clap::Subcommand;
use miette::{IntoDiagnostic, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::PathBuf;

use crate::cli::GlobalOpts;

pub use pdf::PdfArgs;
pub use summary::SummaryArgs;

#[derive(Subcommand, Debug)]
pub enum ReportCommands {
    /// PDF execution report (cover, summary with charts, criteria, details with evidence)
    Pdf(PdfArgs),

    /// Markdown status summary of the cycle
    Summary(SummaryArgs),
}

pub fn run(cmd: ReportCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        ReportCommands::Pdf(args) => pdf::run(args, global),
        ReportCommands::Summary(args) => summary::run(args, global),
    }
}

// Shared helper functions

pub(crate) fn write_output(content: &str, output_path: Option<PathBuf>) -> Result<()> {
    match output_path {
        Some(path) => {
            let file = File::create(&path).into_diagnostic()?;
            let mut writer = BufWriter::new(file);
            writer.write_all(content.as_bytes()).into_diagnostic()?;
            writer.flush().into_diagnostic()?;
            println!("Report written to: {}", path.display());
        }
        None => {
            print!("{}", content);
        }
    }
    Ok(())
}
