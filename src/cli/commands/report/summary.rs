//! Markdown status summary of a cycle

use miette::Result;
use std::path::PathBuf;
use tabled::{builder::Builder, settings::Style};

use crate::cli::helpers::{resolve_cycle, truncate_str};
use crate::cli::GlobalOpts;
use crate::core::entity::{priority_label, ExecStatus};
use crate::core::Context;
use crate::entities::{Bug, BugStatus, Criterion, IntegrationStatus, TestCase};
use crate::report::status_counts;

use super::write_output;

#[derive(clap::Args, Debug)]
pub struct SummaryArgs {
    /// Output to file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(args: SummaryArgs, global: &GlobalOpts) -> Result<()> {
    let ctx = Context::open(global.project.as_deref())?;
    let cycle = resolve_cycle(&ctx, global)?;

    let test_cases = ctx.store.list_test_cases(cycle.id)?;
    let criteria = ctx.store.list_criteria(cycle.id)?;
    let bugs = ctx.store.list_bugs(cycle.id)?;

    let output = render(&cycle.title, &test_cases, &criteria, &bugs);
    write_output(&output, args.output)
}

fn render(title: &str, test_cases: &[TestCase], criteria: &[Criterion], bugs: &[Bug]) -> String {
    let mut output = String::new();
    output.push_str(&format!("# QA Execution Summary: {}\n\n", title));

    output.push_str("## Test Cases\n\n");
    if test_cases.is_empty() {
        output.push_str("No test cases.\n");
    } else {
        let mut summary = Builder::default();
        summary.push_record(["Status", "Count"]);
        for (status, count) in status_counts(test_cases) {
            summary.push_record([status.to_string(), count.to_string()]);
        }
        summary.push_record(["Total".to_string(), test_cases.len().to_string()]);
        output.push_str(&summary.build().with(Style::markdown()).to_string());
        output.push('\n');

        let decided: Vec<&TestCase> = test_cases
            .iter()
            .filter(|tc| matches!(tc.status, ExecStatus::Ok | ExecStatus::Failed))
            .collect();
        if !decided.is_empty() {
            let passed = decided
                .iter()
                .filter(|tc| tc.status == ExecStatus::Ok)
                .count();
            let pass_rate = (passed as f64 / decided.len() as f64) * 100.0;
            output.push_str(&format!("\nPass rate (OK / OK + Failed): {:.1}%\n", pass_rate));
        }

        let failures: Vec<&TestCase> = test_cases
            .iter()
            .filter(|tc| matches!(tc.status, ExecStatus::Failed | ExecStatus::Blocked))
            .collect();
        if !failures.is_empty() {
            output.push_str("\n### Failed or Blocked\n\n");
            let mut table = Builder::default();
            table.push_record(["ID", "Module", "Title", "Status", "Note"]);
            for tc in failures {
                table.push_record([
                    tc.display_id.clone(),
                    tc.module.clone(),
                    truncate_str(&tc.title, 40),
                    tc.status.to_string(),
                    truncate_str(tc.visible_note().unwrap_or_default(), 40),
                ]);
            }
            output.push_str(&table.build().with(Style::markdown()).to_string());
            output.push('\n');
        }
    }

    if !criteria.is_empty() {
        output.push_str("\n## Acceptance Criteria\n\n");
        let mut table = Builder::default();
        table.push_record(["ID", "Module", "Description", "Priority", "Status"]);
        for crit in criteria {
            table.push_record([
                crit.display_id.clone(),
                crit.module.clone(),
                truncate_str(&crit.description, 50),
                priority_label(crit.priority).to_string(),
                crit.status.to_string(),
            ]);
        }
        output.push_str(&table.build().with(Style::markdown()).to_string());
        output.push('\n');
    }

    if !bugs.is_empty() {
        output.push_str("\n## Bugs\n\n");
        let open = bugs
            .iter()
            .filter(|b| matches!(b.status, BugStatus::New | BugStatus::InProgress))
            .count();
        let integrated = bugs
            .iter()
            .filter(|b| b.integration_status() == IntegrationStatus::Integrated)
            .count();

        let mut table = Builder::default();
        table.push_record(["Metric", "Count"]);
        table.push_record(["Total".to_string(), bugs.len().to_string()]);
        table.push_record(["Open".to_string(), open.to_string()]);
        table.push_record(["Integrated".to_string(), integrated.to_string()]);
        output.push_str(&table.build().with(Style::markdown()).to_string());
        output.push('\n');
    }

    output
}

#[cfg(test)]
mod tests {
    use super::*;

    fn case(id: &str, status: ExecStatus) -> TestCase {
        let mut tc = TestCase::new(id);
        tc.title = format!("Case {id}");
        tc.status = status;
        tc
    }

    #[test]
    fn test_summary_counts_and_pass_rate() {
        let cases = vec![
            case("CT-001", ExecStatus::Ok),
            case("CT-002", ExecStatus::Ok),
            case("CT-003", ExecStatus::Failed),
            case("CT-004", ExecStatus::Pending),
        ];
        let out = render("Sprint 7", &cases, &[], &[]);

        assert!(out.starts_with("# QA Execution Summary: Sprint 7"));
        assert!(out.contains("| OK "));
        assert!(out.contains("Pass rate (OK / OK + Failed): 66.7%"));
        assert!(out.contains("### Failed or Blocked"));
        assert!(out.contains("CT-003"));
        assert!(!out.contains("## Bugs"));
    }

    #[test]
    fn test_summary_without_records() {
        let out = render("Empty", &[], &[], &[]);
        assert!(out.contains("No test cases."));
        assert!(!out.contains("## Acceptance Criteria"));
    }

    #[test]
    fn test_summary_bug_metrics() {
        let bug = |status, tracker: Option<&str>| Bug {
            id: 1,
            title: "Crash".to_string(),
            description: String::new(),
            application: String::new(),
            environment: String::new(),
            priority: None,
            module: String::new(),
            status,
            external_tracker_id: tracker.map(str::to_string),
        };
        let bugs = vec![
            bug(BugStatus::New, Some("JIRA-1")),
            bug(BugStatus::Validated, None),
        ];
        let out = render("Bugs", &[], &[], &bugs);
        assert!(out.contains("## Bugs"));
        let open = out.lines().find(|l| l.contains("Open")).unwrap();
        assert!(open.contains(" 1 "));
        let integrated = out.lines().find(|l| l.contains("Integrated")).unwrap();
        assert!(integrated.contains(" 1 "));
    }
}
