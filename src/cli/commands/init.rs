//! `qag init` command - Initialize a new QAG project

use console::style;
use miette::{IntoDiagnostic, Result};
use std::path::Path;

use crate::core::project::{Project, ProjectError};
use crate::core::Store;

#[derive(clap::Args, Debug)]
pub struct InitArgs {
    /// Directory to initialize (default: current directory)
    #[arg(default_value = ".")]
    pub path: std::path::PathBuf,

    /// Force initialization even if .qag/ already exists
    #[arg(long)]
    pub force: bool,
}

pub fn run(args: InitArgs) -> Result<()> {
    let path = if args.path.as_os_str() == "." {
        std::env::current_dir().into_diagnostic()?
    } else {
        args.path.clone()
    };

    if !path.exists() {
        std::fs::create_dir_all(&path).into_diagnostic()?;
        println!(
            "{} Created directory {}",
            style("✓").green(),
            style(path.display()).cyan()
        );
    }

    let project = if args.force {
        Project::init_force(&path)
    } else {
        Project::init(&path)
    };

    match project {
        Ok(project) => {
            // Creates the database and its schema
            Store::open(&project)?;

            println!(
                "{} Initialized QAG project at {}",
                style("✓").green(),
                style(project.root().display()).cyan()
            );
            println!();
            println!("Created project structure:");
            print_structure(&project);
            println!();
            println!("Next steps:");
            println!(
                "  {} Register a user",
                style("qag user add --name <NAME> --email <EMAIL>").yellow()
            );
            println!("  {} Start a session", style("qag login <EMAIL>").yellow());
            println!(
                "  {} Open your first QA cycle",
                style("qag cycle new <TITLE>").yellow()
            );
            Ok(())
        }
        Err(ProjectError::AlreadyExists(path)) => {
            println!(
                "{} QAG project already exists at {}",
                style("!").yellow(),
                style(path.display()).cyan()
            );
            println!();
            println!("Use {} to reinitialize", style("qag init --force").yellow());
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

fn print_structure(project: &Project) {
    let entries = [
        project.config_path(),
        project.db_path(),
        project.objects_dir(),
    ];

    for entry in entries {
        if entry.exists() {
            let shown = relative(project.root(), &entry);
            println!("  {}", style(shown).dim());
        }
    }
}

fn relative(root: &Path, path: &Path) -> String {
    let rel = path.strip_prefix(root).unwrap_or(path);
    if path.is_dir() {
        format!("{}/", rel.display())
    } else {
        rel.display().to_string()
    }
}
