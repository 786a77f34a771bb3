//! `qag cycle` command - QA cycle management

use chrono::Local;
use clap::Subcommand;
use console::style;
use miette::Result;
use std::collections::HashMap;

use super::utils::confirm;
use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::GlobalOpts;
use crate::core::{Context, Session};

#[derive(Subcommand, Debug)]
pub enum CycleCommands {
    /// Open a new cycle owned by the logged-in user and make it active
    New(NewArgs),

    /// List cycles
    List,

    /// Make a cycle the active one for this session
    Use(UseArgs),

    /// Delete a cycle with all of its criteria, test cases, bugs and evidence
    Rm(RmArgs),
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    /// Cycle title (also names the exported report)
    pub title: String,

    /// Do not make the new cycle active
    #[arg(long)]
    pub no_use: bool,
}

#[derive(clap::Args, Debug)]
pub struct UseArgs {
    /// Cycle ID or exact title
    pub cycle: String,
}

#[derive(clap::Args, Debug)]
pub struct RmArgs {
    /// Cycle ID or exact title
    pub cycle: String,

    /// Skip the confirmation prompt
    #[arg(long, short = 'y')]
    pub yes: bool,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("active", "", 1),
    ColumnDef::new("id", "ID", 6),
    ColumnDef::new("title", "TITLE", 40),
    ColumnDef::new("owner", "OWNER", 24),
    ColumnDef::new("created", "CREATED", 10),
];

pub fn run(cmd: CycleCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CycleCommands::New(args) => run_new(args, global),
        CycleCommands::List => run_list(global),
        CycleCommands::Use(args) => run_use(args, global),
        CycleCommands::Rm(args) => run_rm(args, global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::open(global.project.as_deref())?;
    let mut session = ctx.session()?;

    let title = args.title.trim();
    if title.is_empty() {
        return Err(miette::miette!("Cycle title cannot be empty"));
    }

    let cycle = ctx
        .store
        .create_cycle(session.user_id, title, Local::now().date_naive())?;
    if !args.no_use {
        session.set_active_cycle(&ctx.project, cycle.id)?;
    }

    if !global.quiet {
        println!(
            "{} Created cycle {} {}",
            style("✓").green(),
            style(cycle.id).cyan(),
            cycle.title
        );
        if !args.no_use {
            println!("   Now the active cycle");
        }
    }
    Ok(())
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global.project.as_deref())?;
    let cycles = ctx.store.list_cycles()?;
    let users: HashMap<_, _> = ctx
        .store
        .list_users()?
        .into_iter()
        .map(|u| (u.id, u.name))
        .collect();
    let active = Session::load(&ctx.project)?.and_then(|s| s.active_cycle);

    let rows = cycles
        .iter()
        .map(|c| {
            let marker = if Some(c.id) == active { "*" } else { "" };
            TableRow::new(c.id.to_string())
                .cell("active", CellValue::Text(marker.to_string()))
                .cell("id", CellValue::Number(c.id.0))
                .cell("title", CellValue::Text(c.title.clone()))
                .cell(
                    "owner",
                    CellValue::Text(users.get(&c.owner).cloned().unwrap_or_default()),
                )
                .cell("created", CellValue::Date(c.created))
        })
        .collect();

    let format = global.effective_format(ctx.config.default_format.as_deref());
    TableFormatter::new(COLUMNS, "cycle")
        .quiet(global.quiet)
        .output(&cycles, rows, format)
}

fn run_use(args: UseArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global.project.as_deref())?;
    let mut session = ctx.session()?;
    let cycle = ctx.store.find_cycle(&args.cycle)?;

    session.set_active_cycle(&ctx.project, cycle.id)?;

    if !global.quiet {
        println!(
            "{} Active cycle is now {} {}",
            style("✓").green(),
            style(cycle.id).cyan(),
            cycle.title
        );
    }
    Ok(())
}

fn run_rm(args: RmArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::open(global.project.as_deref())?;
    let cycle = ctx.store.find_cycle(&args.cycle)?;

    let prompt = format!(
        "Delete cycle {} '{}' and all of its records?",
        cycle.id, cycle.title
    );
    if !confirm(&prompt, args.yes)? {
        println!("{} Cancelled", style("!").yellow());
        return Ok(());
    }

    ctx.store.delete_cycle(cycle.id)?;

    // Forget the cycle if it was the active one
    if let Some(mut session) = Session::load(&ctx.project)? {
        if session.active_cycle == Some(cycle.id) {
            session.active_cycle = None;
            session.save(&ctx.project)?;
        }
    }

    if !global.quiet {
        println!(
            "{} Deleted cycle {} {}",
            style("✓").green(),
            style(cycle.id).cyan(),
            cycle.title
        );
    }
    Ok(())
}
