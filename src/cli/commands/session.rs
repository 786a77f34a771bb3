//! `qag login`, `qag logout` and `qag whoami` - Session lifecycle

use console::style;
use miette::Result;

use crate::cli::GlobalOpts;
use crate::core::{Context, Session};

#[derive(clap::Args, Debug)]
pub struct LoginArgs {
    /// E-mail address of a registered user
    pub email: String,
}

pub fn run_login(args: LoginArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global.project.as_deref())?;
    let session = Session::login(&ctx.project, &ctx.store, &args.email)?;

    if !global.quiet {
        println!(
            "{} Logged in as {} <{}>",
            style("✓").green(),
            style(&session.name).cyan(),
            session.email
        );
    }
    Ok(())
}

pub fn run_logout(global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global.project.as_deref())?;
    let existed = Session::logout(&ctx.project)?;

    if !global.quiet {
        if existed {
            println!("{} Logged out", style("✓").green());
        } else {
            println!("{} Not logged in", style("!").yellow());
        }
    }
    Ok(())
}

pub fn run_whoami(global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global.project.as_deref())?;
    let Some(session) = Session::load(&ctx.project)? else {
        println!("{} Not logged in", style("!").yellow());
        return Ok(());
    };

    println!(
        "{} <{}>",
        style(&session.name).cyan().bold(),
        session.email
    );

    let cycle = match session.active_cycle {
        Some(id) => ctx.store.get_cycle(id)?,
        None => None,
    };
    match cycle {
        Some(cycle) => println!(
            "Active cycle: {} {}",
            style(cycle.id).cyan(),
            cycle.title
        ),
        None => println!("Active cycle: {}", style("none").dim()),
    }
    println!(
        "Session started: {}",
        style(session.started.format("%Y-%m-%d %H:%M UTC")).dim()
    );
    Ok(())
}
