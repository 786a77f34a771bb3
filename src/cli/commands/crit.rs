//! `qag crit` command - Acceptance criteria management

use clap::Subcommand;
use console::style;
use miette::Result;

use super::utils::edit_yaml;
use crate::cli::helpers::{resolve_cycle, set_if};
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::GlobalOpts;
use crate::core::entity::{ExecStatus, Priority};
use crate::core::{next_display_id, Context, RecordFamily, StoreError};
use crate::entities::Criterion;

#[derive(Subcommand, Debug)]
pub enum CritCommands {
    /// Add a criterion with the next CA-NNN ID
    New(NewArgs),

    /// List the criteria of the cycle
    List,

    /// Update fields of one criterion
    Set(SetArgs),

    /// Edit all criteria of the cycle as YAML in your editor
    Edit,
}

#[derive(clap::Args, Debug, Default)]
pub struct CritFields {
    /// Functional module
    #[arg(long, short = 'm')]
    pub module: Option<String>,

    /// What has to hold for the criterion to pass
    #[arg(long, short = 'd')]
    pub description: Option<String>,

    /// Classification (functional, performance, ...)
    #[arg(long = "type", short = 't')]
    pub criterion_type: Option<String>,

    /// Priority: Low, Medium, High or Critical
    #[arg(long, short = 'p')]
    pub priority: Option<Priority>,

    /// Person responsible
    #[arg(long, short = 'o')]
    pub owner: Option<String>,

    /// Status: Pending, Running, OK, Failed, Blocked or N/A
    #[arg(long, short = 's')]
    pub status: Option<ExecStatus>,
}

impl CritFields {
    fn apply(self, crit: &mut Criterion) {
        set_if(&mut crit.module, self.module);
        set_if(&mut crit.description, self.description);
        set_if(&mut crit.criterion_type, self.criterion_type);
        if self.priority.is_some() {
            crit.priority = self.priority;
        }
        set_if(&mut crit.owner, self.owner);
        set_if(&mut crit.status, self.status);
    }
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub fields: CritFields,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Criterion ID (e.g. CA-003)
    pub id: String,

    #[command(flatten)]
    pub fields: CritFields,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 8),
    ColumnDef::new("module", "MODULE", 16),
    ColumnDef::new("description", "DESCRIPTION", 40),
    ColumnDef::new("type", "TYPE", 14),
    ColumnDef::new("priority", "PRIORITY", 8),
    ColumnDef::new("owner", "OWNER", 16),
    ColumnDef::new("status", "STATUS", 8),
];

const EDIT_HEADER: &str = "\
# Acceptance criteria. Saving replaces every criterion of the cycle.
# status: Pending, Running, OK, Failed, Blocked, N/A
# priority: Low, Medium, High, Critical
";

pub fn run(cmd: CritCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CritCommands::New(args) => run_new(args, global),
        CritCommands::List => run_list(global),
        CritCommands::Set(args) => run_set(args, global),
        CritCommands::Edit => run_edit(global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;

    let allocation = next_display_id(&ctx.store, RecordFamily::Criteria, cycle.id)?;
    if let Some(err) = &allocation.recovered_from {
        eprintln!(
            "{} Latest criterion ID could not be read ({}); starting over at {}",
            style("!").yellow(),
            err,
            allocation.id
        );
    }

    let mut crit = Criterion::new(allocation.id);
    args.fields.apply(&mut crit);
    ctx.store.insert_criterion(cycle.id, &crit)?;

    if !global.quiet {
        println!(
            "{} Created criterion {} in cycle {}",
            style("✓").green(),
            style(&crit.display_id).cyan(),
            cycle.title
        );
    }
    Ok(())
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;
    let criteria = ctx.store.list_criteria(cycle.id)?;

    let rows = criteria
        .iter()
        .map(|c| {
            TableRow::new(c.display_id.clone())
                .cell("id", CellValue::Id(c.display_id.clone()))
                .cell("module", CellValue::Text(c.module.clone()))
                .cell("description", CellValue::Text(c.description.clone()))
                .cell("type", CellValue::Text(c.criterion_type.clone()))
                .cell("priority", CellValue::Priority(c.priority))
                .cell("owner", CellValue::Text(c.owner.clone()))
                .cell("status", CellValue::Status(c.status))
        })
        .collect();

    let format = global.effective_format(ctx.config.default_format.as_deref());
    TableFormatter::new(COLUMNS, "criterion")
        .quiet(global.quiet)
        .output(&criteria, rows, format)
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;

    let mut crit = ctx
        .store
        .list_criteria(cycle.id)?
        .into_iter()
        .find(|c| c.display_id.eq_ignore_ascii_case(args.id.trim()))
        .ok_or_else(|| StoreError::NotFound {
            what: "criterion",
            key: args.id.clone(),
        })?;

    args.fields.apply(&mut crit);
    ctx.store.update_criterion(cycle.id, &crit)?;

    if !global.quiet {
        println!(
            "{} Updated criterion {}",
            style("✓").green(),
            style(&crit.display_id).cyan()
        );
    }
    Ok(())
}

fn run_edit(global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;
    let criteria = ctx.store.list_criteria(cycle.id)?;

    let Some(edited) = edit_yaml(&ctx.config, &criteria, "criteria", EDIT_HEADER)? else {
        println!("{} No changes", style("!").yellow());
        return Ok(());
    };

    ctx.store.replace_criteria(cycle.id, &edited)?;

    if !global.quiet {
        println!(
            "{} Saved {} criteria in cycle {}",
            style("✓").green(),
            style(edited.len()).cyan(),
            cycle.title
        );
    }
    Ok(())
}
