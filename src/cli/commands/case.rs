//! `qag case` command - Test case management

use clap::Subcommand;
use console::style;
use miette::Result;

use super::utils::edit_yaml;
use crate::cli::helpers::{or_dash, resolve_cycle, set_if};
use crate::cli::table::{print_record, CellValue, ColumnDef, TableFormatter, TableRow};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::entity::ExecStatus;
use crate::core::{next_display_id, Context, CycleId, RecordFamily, StoreError};
use crate::entities::TestCase;

#[derive(Subcommand, Debug)]
pub enum CaseCommands {
    /// Add a test case with the next CT-NNN ID
    New(NewArgs),

    /// List the test cases of the cycle
    List(ListArgs),

    /// Show a test case with its evidence
    Show(ShowArgs),

    /// Update fields of one test case
    Set(SetArgs),

    /// Edit all test cases of the cycle as YAML in your editor
    Edit,
}

#[derive(clap::Args, Debug, Default)]
pub struct CaseFields {
    /// Functional module
    #[arg(long, short = 'm')]
    pub module: Option<String>,

    /// Short title
    #[arg(long, short = 't')]
    pub title: Option<String>,

    /// Steps to execute
    #[arg(long)]
    pub steps: Option<String>,

    /// Expected result
    #[arg(long, short = 'e')]
    pub expected: Option<String>,

    /// Status: Pending, Running, OK, Failed, Blocked or N/A
    #[arg(long, short = 's')]
    pub status: Option<ExecStatus>,

    /// Tester observation (an empty string clears it)
    #[arg(long, short = 'n')]
    pub note: Option<String>,
}

impl CaseFields {
    fn apply(self, tc: &mut TestCase) {
        set_if(&mut tc.module, self.module);
        set_if(&mut tc.title, self.title);
        set_if(&mut tc.steps, self.steps);
        set_if(&mut tc.expected_result, self.expected);
        set_if(&mut tc.status, self.status);
        if let Some(note) = self.note {
            tc.note = Some(note).filter(|n| !n.trim().is_empty());
        }
    }
}

#[derive(clap::Args, Debug)]
pub struct NewArgs {
    #[command(flatten)]
    pub fields: CaseFields,
}

#[derive(clap::Args, Debug)]
pub struct ListArgs {
    /// Only test cases with this status
    #[arg(long, short = 's')]
    pub status: Option<ExecStatus>,

    /// Only test cases of this module
    #[arg(long, short = 'm')]
    pub module: Option<String>,
}

#[derive(clap::Args, Debug)]
pub struct ShowArgs {
    /// Test case ID (e.g. CT-002)
    pub id: String,
}

#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Test case ID (e.g. CT-002)
    pub id: String,

    #[command(flatten)]
    pub fields: CaseFields,
}

const COLUMNS: &[ColumnDef] = &[
    ColumnDef::new("id", "ID", 8),
    ColumnDef::new("module", "MODULE", 16),
    ColumnDef::new("title", "TITLE", 36),
    ColumnDef::new("status", "STATUS", 8),
    ColumnDef::new("note", "NOTE", 30),
];

const EDIT_HEADER: &str = "\
# Test cases. Saving replaces every test case of the cycle.
# Evidence stays linked by id, so keep ids stable when reordering.
# status: Pending, Running, OK, Failed, Blocked, N/A
";

pub fn run(cmd: CaseCommands, global: &GlobalOpts) -> Result<()> {
    match cmd {
        CaseCommands::New(args) => run_new(args, global),
        CaseCommands::List(args) => run_list(args, global),
        CaseCommands::Show(args) => run_show(args, global),
        CaseCommands::Set(args) => run_set(args, global),
        CaseCommands::Edit => run_edit(global),
    }
}

fn run_new(args: NewArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;

    let allocation = next_display_id(&ctx.store, RecordFamily::TestCases, cycle.id)?;
    if let Some(err) = &allocation.recovered_from {
        eprintln!(
            "{} Latest test case ID could not be read ({}); starting over at {}",
            style("!").yellow(),
            err,
            allocation.id
        );
    }

    let mut tc = TestCase::new(allocation.id);
    args.fields.apply(&mut tc);
    ctx.store.insert_test_case(cycle.id, &tc)?;

    if !global.quiet {
        println!(
            "{} Created test case {} in cycle {}",
            style("✓").green(),
            style(&tc.display_id).cyan(),
            cycle.title
        );
    }
    Ok(())
}

fn run_list(args: ListArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;

    let cases: Vec<TestCase> = ctx
        .store
        .list_test_cases(cycle.id)?
        .into_iter()
        .filter(|tc| args.status.map_or(true, |s| tc.status == s))
        .filter(|tc| {
            args.module
                .as_deref()
                .map_or(true, |m| tc.module.eq_ignore_ascii_case(m))
        })
        .collect();

    let rows = cases
        .iter()
        .map(|tc| {
            TableRow::new(tc.display_id.clone())
                .cell("id", CellValue::Id(tc.display_id.clone()))
                .cell("module", CellValue::Text(tc.module.clone()))
                .cell("title", CellValue::Text(tc.title.clone()))
                .cell("status", CellValue::Status(tc.status))
                .cell(
                    "note",
                    CellValue::Text(tc.visible_note().unwrap_or_default().to_string()),
                )
        })
        .collect();

    let format = global.effective_format(ctx.config.default_format.as_deref());
    TableFormatter::new(COLUMNS, "test case")
        .quiet(global.quiet)
        .output(&cases, rows, format)
}

fn find_case(ctx: &Context, cycle: CycleId, id: &str) -> Result<TestCase> {
    let id = id.trim().to_uppercase();
    let tc = ctx
        .store
        .get_test_case(cycle, &id)?
        .ok_or(StoreError::NotFound {
            what: "test case",
            key: id,
        })?;
    Ok(tc)
}

fn run_show(args: ShowArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;
    let tc = find_case(&ctx, cycle.id, &args.id)?;

    let format = global.effective_format(ctx.config.default_format.as_deref());
    if matches!(format, OutputFormat::Json | OutputFormat::Yaml) {
        return print_record(&tc, format);
    }

    let evidence: Vec<_> = ctx
        .store
        .list_evidence(cycle.id)?
        .into_iter()
        .filter(|e| e.belongs_to(&tc.display_id))
        .collect();

    println!(
        "{} {}",
        style(&tc.display_id).cyan().bold(),
        style(or_dash(&tc.title)).bold()
    );
    println!("{}", style("─".repeat(60)).dim());
    println!("{}: {}", style("Module").bold(), or_dash(&tc.module));
    println!("{}: {}", style("Status").bold(), tc.status);
    println!();
    println!("{}", style("Steps").bold());
    println!("{}", or_dash(&tc.steps));
    println!();
    println!("{}", style("Expected result").bold());
    println!("{}", or_dash(&tc.expected_result));

    if let Some(note) = tc.visible_note() {
        println!();
        println!("{}: {}", style("Note").bold().red(), note);
    }

    if !evidence.is_empty() {
        println!();
        println!("{}", style("Evidence").bold());
        for e in &evidence {
            println!("  {} {}", style(e.date.format("%Y-%m-%d")).dim(), e.url);
        }
    }
    Ok(())
}

fn run_set(args: SetArgs, global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;
    let mut tc = find_case(&ctx, cycle.id, &args.id)?;

    args.fields.apply(&mut tc);
    ctx.store.update_test_case(cycle.id, &tc)?;

    if !global.quiet {
        println!(
            "{} Updated test case {} ({})",
            style("✓").green(),
            style(&tc.display_id).cyan(),
            tc.status
        );
    }
    Ok(())
}

fn run_edit(global: &GlobalOpts) -> Result<()> {
    let mut ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;
    let cases = ctx.store.list_test_cases(cycle.id)?;

    let Some(edited) = edit_yaml(&ctx.config, &cases, "test-cases", EDIT_HEADER)? else {
        println!("{} No changes", style("!").yellow());
        return Ok(());
    };

    ctx.store.replace_test_cases(cycle.id, &edited)?;

    if !global.quiet {
        println!(
            "{} Saved {} test case(s) in cycle {}",
            style("✓").green(),
            style(edited.len()).cyan(),
            cycle.title
        );
    }
    Ok(())
}
