//! `qag bug` command - Bug management

use clap::Subcommand;
use console::style;
use miette::Result;

use super::utils::confirm;
use crate::cli::helpers::{resolve_cycle, set_if};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::GlobalOpts;
use crate::core::entity::Priority;
use crate::core::{Context, CycleId, StoreError};
use crate::entities::{Bug, BugStatus};

#[derive(Subcommand, Debug)]
pub enum BugCommands {
    /// Report a bug
    New(NewArgs),

    /// List the bugs of the cycle
    List(ListArgs),

    /// Update fields of one bug
    Set(SetArgs),

    /// Delete a bug
    Rm(RmArgs),
}

#[derive(clap::Args, Debug, Default)]
pub struct BugFields {
    #[arg(long)]
    pub description: Option<String>,

    /// Application under test
    #[arg(long, short = 'a')]
    pub application: Option<String>,

    /// Environment the bug was observed in
    #[arg(long, short = 'e')]
    pub environment: Option<String>,

    /// Priority: Low, Medium, High or Critical
    #[arg(long, short = 'p')]
    pub priority: Option<Priority>,

    /// Functional module
    #[arg(long, short = 'm')]
    pub module: Option<String>,

    /// Status: New, In Progress, Validated or Cancelled
    #[arg(long, short = 's')]
    pub status: Option<BugStatus>,

    /// External tracker reference (e.g. JIRA-123); an empty string unlinks
    #[arg(long)]
    pub tracker: Option<String>,
}

impl BugFields {
    fn apply(self, bug: &mut Bug) {
        set_if(&mut bug.description, self.description);
        set_if(&mut bug.application, self.application);
        set_if(&mut bug.environment, self.environment);
        if self.priority.is_some() {
            bug.priority = self.priority;
        }
        set_if(&mut bug.module, self.module);
        set_if(&mut bug.status, self.status);
        if let Some(tracker) = self.tracker {
            bug.external_tracker_id = Some(tracker.trim().to_string()).filter(|t| !t.is_empty());
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Short summary
    #[arg(long, short = 't')]
    pub title: String,

    #[command(flatten)]
    pub fields: BugFields,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only bugs with this status
    #[arg(long, short = 's')]
    pub status: Option<BugStatus>,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Bug ID
    pub id: i64,

    /// New title
    #[arg(long, short = 't')]
    pub title: Option<String>,

    #[command(flatten)]
    pub fields: BugFields,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Bug ID
    pub id: i64,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 6),
    ColumnDef::new("title", "TITLE", 36),
    ColumnDef::new("module", "MODULE", 16),
    ColumnDef::new("priority", "PRIORITY", 8),
    ColumnDef::new("status", "STATUS", 11),
    ColumnDef::new("tracker", "TRACKER", 14),
    ColumnDef::new("integration", "INTEGRATION", 14),
];

pub fn run(cmd: BugCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        BugCommands::New(args) => run_new(args, global),
        BugCommands::List(args) => run_list(args, global),
        BugCommands::Set(args) => run_set(args, global),
        BugCommands::Rm(args) => run_rm(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;

    let title = args.title.trim();
    if title.is_empty() {
        return Err(miette::miette!("Bug title cannot be empty"));
    }

    let mut bug = Bug {
        id: 0,
        title: title.to_string(),
        description: String::new(),
        application: String::new(),
        environment: String::new(),
        priority: None,
        module: String::new(),
        status: BugStatus::New,
        external_tracker_id: None,
    };
    args.fields.apply(&mut bug);
    let bug = ctx.store.insert_bug(cycle.id, &bug)?;

    if !global.quiet {
        println!(
            "{} Created bug {} {} ({})",
            style("✓").green(),
            style(bug.id).cyan(),
            bug.title,
            bug.integration_status()
        );
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;

    let bugs: Vec<Bug> = ctx
        .store
        .list_bugs(cycle.id)?
        .into_iter()
        .filter(|b| args.status.map_or(true, |s| b.status == s))
        .collect();

    let rows = bugs
        .iter()
        .map(|b| {
            TableRow::new(b.id.to_string())
                .cell("id", CellValue::Number(b.id))
                .cell("title", CellValue::Text(b.title.clone()))
                .cell("module", CellValue::Text(b.module.clone()))
                .cell("priority", CellValue::Priority(b.priority))
                .cell("status", CellValue::BugStatus(b.status))
                .cell(
                    "tracker",
                    CellValue::Text(b.external_tracker_id.clone().unwrap_or_default()),
                )
                .cell("integration", CellValue::Integration(b.integration_status()))
        })
        .collect();

    let format = global.effective_format(ctx.config.default_format.as_deref());
    TableFormatter::new(COLUMNS, "bug")
        .quiet(global.quiet)
        .output(&bugs, rows, format)
}

fn find_bug(ctx: &Context, cycle: CycleId, id: i64) -> Result<Bug> {
    let bug = ctx.store.get_bug(cycle, id)?.ok_or(StoreError::NotFound {
        what: "bug",
        key: id.to_string(),
    })?;
    Ok(bug)
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;
    let mut bug = find_bug(&ctx, cycle.id, args.id)?;

    if let Some(title) = args.title {
        let title = title.trim().to_string();
        if title.is_empty() {
            return Err(miette::miette!("Bug title cannot be empty"));
        }
        bug.title = title;
    }
    args.fields.apply(&mut bug);
    ctx.store.update_bug(cycle.id, &bug)?;

    if !global.quiet {
        println!(
            "{} Updated bug {} ({}, {})",
            style("✓").green(),
            style(bug.id).cyan(),
            bug.status,
            bug.integration_status()
        );
    }
    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;
    let bug = find_bug(&ctx, cycle.id, args.id)?;

    if !confirm(&format!("Delete bug {} '{}'?", bug.id, bug.title), args.yes)? {
        println!("{} Cancelled", style("!").yellow());
        return Ok(());
    }

    ctx.store.delete_bug(cycle.id, bug.id)?;

    if !global.quiet {
        println!("{} Deleted bug {}", style("✓").green(), style(bug.id).cyan());
    }
    Ok(())
}
