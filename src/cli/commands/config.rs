//! `qag config` command - Configuration inspection
//!
//! Values come from, in increasing priority: built-in defaults, the global
//! config file, the project config file, and `QAG_*` environment variables.

use clap::Subcommand;
use console::style;
use miette::Result;

use crate::cli::GlobalOpts;
use crate::core::project::Project;
use crate::core::Config;

#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show effective configuration values
    Show(ShowArgs),

    /// Show paths to configuration files
    Path,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Show only this key's value
    pub key: Option<String>,
}

/// Valid configuration keys
const VALID_KEYS: &[(&str, &str)] = &[
    ("editor", "Editor command for `qag crit edit` and `qag case edit`"),
    (
        "evidence_timeout_secs",
        "Seconds to wait for each evidence image in `qag report pdf`",
    ),
    ("object_store", "Directory holding uploaded evidence"),
    (
        "default_format",
        "Default output format (auto, tsv, json, csv, md, yaml, id)",
    ),
];

pub fn run(cmd: ConfigCommands, global: &GlobalOpts) -> Result<()> {
    let project = match &global.project {
        Some(root) => Project::discover_from(root).ok(),
        None => Project::discover().ok(),
    };

    match cmd {
        ConfigCommands::Show(args) => run_show(args, project.as_ref()),
        ConfigCommands::Path => run_path(project.as_ref()),
    }
}

fn config_value(config: &Config, project: Option<&Project>, key: &str) -> Option<String> {
    match key {
        "editor" => Some(config.editor()),
        "evidence_timeout_secs" => Some(config.evidence_timeout().as_secs().to_string()),
        "object_store" => project.map(|p| config.object_store_dir(p).display().to_string()),
        "default_format" => config.default_format.clone(),
        _ => None,
    }
}

fn run_show(args: ShowArgs, project: Option<&Project>) -> Result<()> {
    let config = Config::load(project)?;

    if let Some(key) = &args.key {
        if !VALID_KEYS.iter().any(|(k, _)| *k == key.as_str()) {
            let keys: Vec<&str> = VALID_KEYS.iter().map(|(k, _)| *k).collect();
            return Err(miette::miette!(
                "Unknown key '{}'. Valid keys: {}",
                key,
                keys.join(", ")
            ));
        }
        return match config_value(&config, project, key) {
            Some(v) => {
                println!("{}", v);
                Ok(())
            }
            None => Err(miette::miette!("Key '{}' is not set", key)),
        };
    }

    println!("{}", style("Effective Configuration").bold().underlined());
    println!();
    for (key, description) in VALID_KEYS {
        let value = config_value(&config, project, key);
        match value {
            Some(v) => println!("  {} = {}", style(key).cyan(), style(v).yellow()),
            None => println!("  {} = {}", style(key).cyan(), style("(not set)").dim()),
        }
        println!("    {}", style(description).dim());
    }

    println!();
    println!("{}", style("Config Sources (in priority order):").dim());
    println!("  1. Environment variables (QAG_EDITOR, QAG_EVIDENCE_TIMEOUT, QAG_OBJECT_STORE)");
    println!("  2. Project config (.qag/config.yaml)");
    println!("  3. Global config (~/.config/qag/config.yaml)");
    Ok(())
}

fn run_path(project: Option<&Project>) -> Result<()> {
    match Config::global_config_path() {
        Some(path) => {
            let marker = if path.exists() { "" } else { " (not created)" };
            println!(
                "{}: {}{}",
                style("Global").bold(),
                path.display(),
                style(marker).dim()
            );
        }
        None => println!("{}: {}", style("Global").bold(), style("unavailable").dim()),
    }

    match project {
        Some(project) => println!(
            "{}: {}",
            style("Project").bold(),
            project.config_path().display()
        ),
        None => println!(
            "{}: {}",
            style("Project").bold(),
            style("not in a QAG project").dim()
        ),
    }
    Ok(())
}
