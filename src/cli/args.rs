//! CLI argument definitions using clap derive

use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

use crate::cli::commands::{
    bug::BugCommands,
    case::CaseCommands,
    completions::CompletionsArgs,
    config::ConfigCommands,
    crit::CritCommands,
    cycle::CycleCommands,
    evid::EvidCommands,
    init::InitArgs,
    report::ReportCommands,
    session::LoginArgs,
    user::UserCommands,
};

#[derive(Parser)]
#[command(name = "qag")]
#[command(author, version, about = "QA Governance")]
#[command(
    long_about = "Track QA test cycles (acceptance criteria, test cases, bugs and evidence) and export PDF execution reports."
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub global: GlobalOpts,
}

#[derive(clap::Args, Clone, Debug)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Suppress non-essential output
    #[arg(long, short = 'q', global = true)]
    pub quiet: bool,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(long, short = 'v', global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Project root (default: auto-detect by finding .qag/)
    #[arg(long, global = true)]
    pub project: Option<PathBuf>,

    /// Cycle to act on, by ID or exact title (default: the session's active cycle)
    #[arg(long, global = true, env = "QAG_CYCLE")]
    pub cycle: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new QAG project
    Init(InitArgs),

    /// User management
    #[command(subcommand)]
    User(UserCommands),

    /// Start a session as a registered user
    Login(LoginArgs),

    /// End the current session
    Logout,

    /// Show the current session
    Whoami,

    /// QA cycle management
    #[command(subcommand)]
    Cycle(CycleCommands),

    /// Acceptance criteria management (CA-NNN)
    #[command(subcommand)]
    Crit(CritCommands),

    /// Test case management (CT-NNN)
    #[command(subcommand)]
    Case(CaseCommands),

    /// Bug management
    #[command(subcommand)]
    Bug(BugCommands),

    /// Evidence image uploads
    #[command(subcommand)]
    Evid(EvidCommands),

    /// Execution reports (PDF, status summary)
    #[command(subcommand)]
    Report(ReportCommands),

    /// Show configuration
    #[command(subcommand)]
    Config(ConfigCommands),

    /// Generate shell completion scripts
    Completions(CompletionsArgs),
}

#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Automatically detect based on context (yaml for show, table for list)
    #[default]
    Auto,
    /// YAML format (full fidelity)
    Yaml,
    /// Tab-separated values (for piping)
    Tsv,
    /// JSON format (for programming)
    Json,
    /// CSV format (for spreadsheets)
    Csv,
    /// Markdown tables
    Md,
    /// Just IDs, one per line
    Id,
}

impl GlobalOpts {
    /// The requested format, falling back to the configured `default_format`
    pub fn effective_format(&self, configured: Option<&str>) -> OutputFormat {
        if self.format != OutputFormat::Auto {
            return self.format;
        }
        configured
            .and_then(|name| OutputFormat::from_str(name, true).ok())
            .unwrap_or(OutputFormat::Auto)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbose_counts() {
        let cli = Cli::parse_from(["qag", "-vv", "whoami"]);
        assert_eq!(cli.global.verbose, 2);
        assert!(!cli.global.quiet);
    }

    #[test]
    fn test_effective_format() {
        let cli = Cli::parse_from(["qag", "whoami"]);
        assert_eq!(cli.global.effective_format(None), OutputFormat::Auto);
        assert_eq!(cli.global.effective_format(Some("csv")), OutputFormat::Csv);
        assert_eq!(cli.global.effective_format(Some("bogus")), OutputFormat::Auto);

        let cli = Cli::parse_from(["qag", "-f", "json", "whoami"]);
        assert_eq!(cli.global.effective_format(Some("csv")), OutputFormat::Json);
    }
}
