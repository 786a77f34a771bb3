use clap::Parser;
use miette::Result;
use qag::cli::commands;
use qag::cli::{Cli, Commands};

fn main() -> Result<()> {
    // Reset SIGPIPE to default behavior (terminate silently) for proper Unix piping.
    // Without this, piping to `head`, `grep -q`, etc. causes a panic on broken pipe.
    #[cfg(unix)]
    {
        unsafe {
            libc::signal(libc::SIGPIPE, libc::SIG_DFL);
        }
    }
    miette::set_hook(Box::new(|_| {
        Box::new(
            miette::MietteHandlerOpts::new()
                .terminal_links(true)
                .unicode(true)
                .context_lines(2)
                .tab_width(4)
                .build(),
        )
    }))?;

    let cli = Cli::parse();
    let global = cli.global;
    qag::core::logging::init(global.verbose, global.quiet);

    match cli.command {
        Commands::Init(args) => commands::init::run(args),
        Commands::User(cmd) => commands::user::run(cmd, &global),
        Commands::Login(args) => commands::session::run_login(args, &global),
        Commands::Logout => commands::session::run_logout(&global),
        Commands::Whoami => commands::session::run_whoami(&global),
        Commands::Cycle(cmd) => commands::cycle::run(cmd, &global),
        Commands::Crit(cmd) => commands::crit::run(cmd, &global),
        Commands::Case(cmd) => commands::case::run(cmd, &global),
        Commands::Bug(cmd) => commands::bug::run(cmd, &global),
        Commands::Evid(cmd) => commands::evid::run(cmd, &global),
        Commands::Report(cmd) => commands::report::run(cmd, &global),
        Commands::Config(cmd) => commands::config::run(cmd, &global),
        Commands::Completions(args) => commands::completions::run(args),
    }
}
