//! `qag evid` command - Evidence image uploads

use chrono::Local;
use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::cli::helpers::resolve_cycle;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::GlobalOpts;
use crate::core::{Context, ObjectKey, ObjectStore, StoreError};
use crate::entities::Evidence;

/// File extensions accepted as evidence
const IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg"];

#[derive(Subcommand, Debug)]
pub enum EvidCommands {
    /// Upload screenshots for a test case
    Add(AddArgs),

    /// List uploaded evidence
    List(ListArgs),
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Test case ID (e.g. CT-002)
    pub test_case: String,

    /// Image files, or directories to search for png/jpg/jpeg files
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only evidence of this test case
    pub test_case: Option<String>,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 6),
    ColumnDef::new("test_case", "TEST CASE", 9),
    ColumnDef::new("date", "DATE", 10),
    ColumnDef::new("url", "URL", 70),
];

pub fn run(cmd: EvidCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        EvidCommands::Add(args) => run_add(args, global),
        EvidCommands::List(args) => run_list(args, global),
    }
}

fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|e| IMAGE_EXTENSIONS.contains(&e.to_lowercase().as_str()))
        .unwrap_or(false)
}

/// Expand the given paths into the image files to upload
fn collect_images(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut images = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = WalkDir::new(path)
                .follow_links(true)
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.file_type().is_file() && is_image(e.path()))
                .map(|e| e.into_path())
                .collect();
            found.sort();
            images.extend(found);
        } else if path.is_file() {
            if !is_image(path) {
                return Err(miette::miette!(
                    "{} is not a png/jpg/jpeg file",
                    path.display()
                ));
            }
            images.push(path.clone());
        } else {
            return Err(miette::miette!("File not found: {}", path.display()));
        }
    }
    Ok(images)
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;

    let test_id = args.test_case.trim().to_uppercase();
    if ctx.store.get_test_case(cycle.id, &test_id)?.is_none() {
        return Err(StoreError::NotFound {
            what: "test case",
            key: test_id,
        }
        .into());
    }

    let images = collect_images(&args.paths)?;
    if images.is_empty() {
        println!("{} No png/jpg/jpeg files found", style("!").yellow());
        return Ok(());
    }

    let objects = ctx.objects();
    let today = Local::now().date_naive();
    for image in &images {
        let file_name = image
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let bytes = fs::read(image).into_diagnostic()?;

        // Re-uploading the same file name replaces the stored object
        let key = ObjectKey::evidence(cycle.id, &test_id, &file_name);
        let url = objects.upload(&key, &bytes, true)?;
        ctx.store
            .insert_evidence(cycle.id, &test_id, url.as_str(), today)?;

        if !global.quiet {
            println!(
                "{} Uploaded {} for {}",
                style("✓").green(),
                style(&file_name).cyan(),
                test_id
            );
        }
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;

    let filter = args.test_case.map(|t| t.trim().to_uppercase());
    let evidence: Vec<Evidence> = ctx
        .store
        .list_evidence(cycle.id)?
        .into_iter()
        .filter(|e| filter.as_deref().map_or(true, |t| e.belongs_to(t)))
        .collect();

    let rows = evidence
        .iter()
        .map(|e| {
            TableRow::new(e.url.clone())
                .cell("id", CellValue::Number(e.id))
                .cell("test_case", CellValue::Id(e.test_case_id.clone()))
                .cell("date", CellValue::Date(e.date))
                .cell("url", CellValue::Text(e.url.clone()))
        })
        .collect();

    let format = global.effective_format(ctx.config.default_format.as_deref());
    TableFormatter::new(COLUMNS, "evidence item")
        .quiet(global.quiet)
        .output(&evidence, rows, format)
}
