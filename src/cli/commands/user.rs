//! `qag user` command - User management

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::table::{CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::GlobalOpts;
use crate::core::Context;

#[derive(Subcommand, Debug)]
pub enum UserCommands {
    /// Register a user
    Add(AddArgs),

    /// List registered users
    List,
}

#[derive(clap::Args, Debug)]
pub struct AddArgs {
    /// Display name
    #[arg(long, short = 'n')]
    pub name: String,

    /// E-mail address used to log in
    #[arg(long, short = 'e')]
    pub email: String,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 6),
    ColumnDef::new("name", "NAME", 30),
    ColumnDef::new("email", "EMAIL", 40),
];

pub fn run(cmd: UserCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        UserCommands::Add(args) => run_add(args, global),
        UserCommands::List => run_list(global),
    }
}

fn run_add(args: AddArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::open(global.project.as_deref())?;

    let email = args.email.trim();
    if email.is_empty() {
        return Err(miette::miette!("E-mail address cannot be empty"));
    }

    let user = ctx.store.add_user(args.name.trim(), email)?;

    if !global.quiet {
        println!(
            "{} Added user {} <{}>",
            style("✓").green(),
            style(&user.name).cyan(),
            user.email
        );
    }
    Ok(())
}

fn run_list(global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global.project.as_deref())?;
    let users = ctx.store.list_users()?;

    let rows = users
        .iter()
        .map(|u| {
            TableRow::new(u.email.clone())
                .cell("id", CellValue::Number(u.id.0))
                .cell("name", CellValue::Text(u.name.clone()))
                .cell("email", CellValue::Text(u.email.clone()))
        })
        .collect();

    let format = global.effective_format(ctx.config.default_format.as_deref());
    TableFormatter::new(COLUMNS, "user")
        .quiet(global.quiet)
        .output(&users, rows, format)
}
