//! Table formatting utilities for CLI list commands
//!
//! Every list command builds [`TableRow`]s and hands them to a
//! [`TableFormatter`] together with the serializable records, so all formats
//! behave the same across commands:
//!
//! - `auto` and `md` render with `tabled`
//! - `tsv` is one tab-separated line per row (for piping)
//! - `csv` goes through the `csv` writer (RFC 4180 quoting)
//! - `json` and `yaml` serialize the records themselves
//! - `id` prints the ID column only

use std::io::{self, Write};

use chrono::NaiveDate;
use console::style;
use miette::{IntoDiagnostic, Result};
use serde::Serialize;
use tabled::{builder::Builder, settings::Style};

use crate::cli::OutputFormat;
use crate::core::entity::{priority_label, ExecStatus, Priority};
use crate::entities::{BugStatus, IntegrationStatus};

/// A typed cell value
#[derive(Debug, Clone)]
pub enum CellValue {
    /// Record identifier
    Id(String),
    /// Plain text, truncated to the column width in tables
    Text(String),
    Status(ExecStatus),
    BugStatus(BugStatus),
    Integration(IntegrationStatus),
    /// Optional priority (empty if None)
    Priority(Option<Priority>),
    Date(NaiveDate),
    Number(i64),
}

impl CellValue {
    /// Get raw string value (no truncation)
    pub fn raw(&self) -> String {
        match self {
            CellValue::Id(id) => id.clone(),
            CellValue::Text(s) => s.clone(),
            CellValue::Status(s) => s.to_string(),
            CellValue::BugStatus(s) => s.to_string(),
            CellValue::Integration(s) => s.to_string(),
            CellValue::Priority(p) => priority_label(*p).to_string(),
            CellValue::Date(d) => d.format("%Y-%m-%d").to_string(),
            CellValue::Number(n) => n.to_string(),
        }
    }

    /// Value as shown in a rendered table
    fn display(&self, width: usize) -> String {
        match self {
            CellValue::Text(s) => super::helpers::truncate_str(s, width),
            CellValue::Priority(None) => "-".to_string(),
            other => other.raw(),
        }
    }

    /// Value for tab-separated output: tabs and newlines become spaces
    fn tsv(&self) -> String {
        self.raw().replace(['\t', '\n', '\r'], " ")
    }

    /// Value for a markdown cell, pipes escaped
    fn md(&self, width: usize) -> String {
        self.display(width).replace('|', "\\|").replace('\n', " ")
    }
}

/// Column definition with key, header label and maximum display width
#[derive(Debug, Clone)]
pub struct ColumnDef {
    pub key: &'static str,
    pub header: &'static str,
    pub width: usize,
}

impl ColumnDef {
    pub const fn new(key: &'static str, header: &'static str, width: usize) -> Self {
        Self { key, header, width }
    }
}

/// A row of cell values for table output
pub struct TableRow {
    pub id: String,
    pub cells: Vec<(&'static str, CellValue)>,
}

impl TableRow {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            cells: Vec::new(),
        }
    }

    pub fn cell(mut self, key: &'static str, value: CellValue) -> Self {
        self.cells.push((key, value));
        self
    }

    pub fn get(&self, key: &str) -> Option<&CellValue> {
        self.cells.iter().find(|(k, _)| *k == key).map(|(_, v)| v)
    }
}

/// Table formatter that outputs rows in various formats
pub struct TableFormatter<'a> {
    columns: &'a [ColumnDef],
    entity_name: &'static str,
    show_summary: bool,
}

impl<'a> TableFormatter<'a> {
    pub fn new(columns: &'a [ColumnDef], entity_name: &'static str) -> Self {
        Self {
            columns,
            entity_name,
            show_summary: true,
        }
    }

    /// Hide the "N item(s) found" line
    pub fn quiet(mut self, quiet: bool) -> Self {
        self.show_summary = !quiet;
        self
    }

    /// Output records in the requested format
    ///
    /// `records` are used for `json`/`yaml`, `rows` for everything else.
    pub fn output<T: Serialize>(
        &self,
        records: &[T],
        rows: Vec<TableRow>,
        format: OutputFormat,
    ) -> Result<()> {
        match format {
            OutputFormat::Json => {
                let json = serde_json::to_string_pretty(records).into_diagnostic()?;
                println!("{}", json);
            }
            OutputFormat::Yaml => {
                let yaml = serde_yml::to_string(records).into_diagnostic()?;
                print!("{}", yaml);
            }
            OutputFormat::Tsv => self.output_tsv(&rows),
            OutputFormat::Csv => self.output_csv(&rows)?,
            OutputFormat::Md => println!("{}", self.render(&rows, true)),
            OutputFormat::Id => {
                for row in &rows {
                    println!("{}", row.id);
                }
            }
            OutputFormat::Auto => {
                if rows.is_empty() {
                    if self.show_summary {
                        println!("No {}s found.", self.entity_name);
                    }
                    return Ok(());
                }
                println!("{}", self.render(&rows, false));
                if self.show_summary {
                    println!(
                        "{} {}(s) found.",
                        style(rows.len()).cyan(),
                        self.entity_name
                    );
                }
            }
        }
        Ok(())
    }

    fn render(&self, rows: &[TableRow], markdown: bool) -> String {
        let mut builder = Builder::default();
        builder.push_record(self.columns.iter().map(|c| c.header.to_string()));
        for row in rows {
            builder.push_record(self.columns.iter().map(|col| {
                row.get(col.key)
                    .map(|v| v.md(col.width))
                    .unwrap_or_else(|| "-".to_string())
            }));
        }

        let mut table = builder.build();
        if markdown {
            table.with(Style::markdown());
        } else {
            table.with(Style::sharp());
        }
        table.to_string()
    }

    fn output_tsv(&self, rows: &[TableRow]) {
        let headers: Vec<&str> = self.columns.iter().map(|c| c.key).collect();
        println!("{}", headers.join("\t"));
        for row in rows {
            let values: Vec<String> = self
                .columns
                .iter()
                .map(|col| row.get(col.key).map(CellValue::tsv).unwrap_or_default())
                .collect();
            println!("{}", values.join("\t"));
        }
    }

    fn output_csv(&self, rows: &[TableRow]) -> Result<()> {
        let stdout = io::stdout();
        let mut writer = csv::Writer::from_writer(stdout.lock());
        writer
            .write_record(self.columns.iter().map(|c| c.key))
            .into_diagnostic()?;
        for row in rows {
            writer
                .write_record(
                    self.columns
                        .iter()
                        .map(|col| row.get(col.key).map(CellValue::raw).unwrap_or_default()),
                )
                .into_diagnostic()?;
        }
        writer.flush().into_diagnostic()?;
        Ok(())
    }
}

/// Print a single record: JSON when asked for, YAML otherwise
pub fn print_record<T: Serialize>(record: &T, format: OutputFormat) -> Result<()> {
    let mut out = io::stdout().lock();
    match format {
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(record).into_diagnostic()?;
            writeln!(out, "{}", json).into_diagnostic()?;
        }
        _ => {
            let yaml = serde_yml::to_string(record).into_diagnostic()?;
            write!(out, "{}", yaml).into_diagnostic()?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const COLUMNS: &[ColumnDef] = &[
        ColumnDef::new("id", "ID", 8),
        ColumnDef::new("title", "TITLE", 10),
        ColumnDef::new("status", "STATUS", 10),
    ];

    fn row(id: &str, title: &str, status: ExecStatus) -> TableRow {
        TableRow::new(id)
            .cell("id", CellValue::Id(id.to_string()))
            .cell("title", CellValue::Text(title.to_string()))
            .cell("status", CellValue::Status(status))
    }

    #[test]
    fn test_cell_values() {
        assert_eq!(CellValue::Status(ExecStatus::NotApplicable).raw(), "N/A");
        assert_eq!(CellValue::Priority(None).raw(), "");
        assert_eq!(CellValue::Priority(None).display(5), "-");
        assert_eq!(CellValue::Priority(Some(Priority::High)).raw(), "High");
        assert_eq!(
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 3, 9).unwrap()).raw(),
            "2024-03-09"
        );
        assert_eq!(CellValue::Text("a\tb\nc".to_string()).tsv(), "a b c");
        assert_eq!(CellValue::Text("a|b".to_string()).md(10), "a\\|b");
    }

    #[test]
    fn test_text_is_truncated_in_tables() {
        let cell = CellValue::Text("Login with expired password".to_string());
        assert_eq!(cell.display(10), "Login w...");
        assert_eq!(cell.raw(), "Login with expired password");
    }

    #[test]
    fn test_table_row_builder() {
        let r = row("CT-001", "Login", ExecStatus::Ok);
        assert_eq!(r.id, "CT-001");
        assert!(r.get("title").is_some());
        assert!(r.get("missing").is_none());
    }

    #[test]
    fn test_markdown_render() {
        let formatter = TableFormatter::new(COLUMNS, "test case");
        let rendered = formatter.render(
            &[
                row("CT-001", "Login", ExecStatus::Ok),
                row("CT-002", "Logout", ExecStatus::Failed),
            ],
            true,
        );
        let lines: Vec<&str> = rendered.lines().collect();
        assert_eq!(lines.len(), 4);
        assert!(lines[0].contains("TITLE"));
        assert!(lines[2].contains("CT-001") && lines[2].contains("OK"));
        assert!(lines[3].contains("Failed"));
    }
}
