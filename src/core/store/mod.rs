//! SQLite-backed data store for QA records
//!
//! One table per record family (`users`, `cycles`, `criteria`, `test_cases`,
//! `bugs`, `evidence`), every child row keyed by `cycle_id`. Rows are read by
//! column name into raw row structs and mapped onto the domain types field by
//! field, so a bad value in the database surfaces as
//! [`StoreError::InvalidField`] instead of a silently misaligned record.
//!
//! Bulk saves (`replace_criteria`, `replace_test_cases`) delete and reinsert
//! the whole family for a cycle inside a single transaction.

mod queries;
mod schema;

use std::fs;
use std::path::Path;
use std::str::FromStr;

use chrono::NaiveDate;
use rusqlite::Connection;
use thiserror::Error;

use crate::core::project::Project;

/// Current schema version, stored in `PRAGMA user_version`
const SCHEMA_VERSION: i64 = 1;

/// Date format of all date columns
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Errors raised by the data store
#[derive(Debug, Error, miette::Diagnostic)]
pub enum StoreError {
    #[error("database error: {0}")]
    #[diagnostic(code(qag::store::sqlite))]
    Sqlite(#[from] rusqlite::Error),

    #[error("could not prepare database directory: {0}")]
    #[diagnostic(code(qag::store::io))]
    Io(#[from] std::io::Error),

    #[error("invalid value '{value}' in {table}.{column}: {reason}")]
    #[diagnostic(code(qag::store::invalid_field))]
    InvalidField {
        table: &'static str,
        column: &'static str,
        value: String,
        reason: String,
    },

    #[error("{what} not found: {key}")]
    #[diagnostic(code(qag::store::not_found))]
    NotFound { what: &'static str, key: String },

    #[error("{what} '{key}' matches {count} records")]
    #[diagnostic(code(qag::store::ambiguous), help("refer to it by numeric ID instead"))]
    Ambiguous {
        what: &'static str,
        key: String,
        count: usize,
    },

    #[error("{what} already exists: {key}")]
    #[diagnostic(code(qag::store::duplicate))]
    Duplicate { what: &'static str, key: String },

    #[error("database schema version {found} is newer than supported version {supported}")]
    #[diagnostic(code(qag::store::schema), help("upgrade qag to open this project"))]
    SchemaTooNew { found: i64, supported: i64 },
}

/// Handle to the QA database
pub struct Store {
    conn: Connection,
}

impl Store {
    /// Open (creating if needed) the database of a project
    pub fn open(project: &Project) -> Result<Self, StoreError> {
        Self::open_path(&project.db_path())
    }

    /// Open (creating if needed) a database file
    pub fn open_path(path: &Path) -> Result<Self, StoreError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let conn = Connection::open(path)?;
        conn.execute_batch("PRAGMA journal_mode=WAL;")?;
        tracing::debug!(path = %path.display(), "opened store");

        Self::from_connection(conn)
    }

    /// Open a private in-memory database
    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::from_connection(Connection::open_in_memory()?)
    }

    fn from_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        let mut store = Self { conn };
        store.ensure_schema()?;
        Ok(store)
    }

    fn ensure_schema(&mut self) -> Result<(), StoreError> {
        let version: i64 = self
            .conn
            .query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version > SCHEMA_VERSION {
            return Err(StoreError::SchemaTooNew {
                found: version,
                supported: SCHEMA_VERSION,
            });
        }
        if version < SCHEMA_VERSION {
            self.init_schema()?;
        }
        Ok(())
    }
}

/// Parse a text column into a domain enum
fn parse_column<T>(table: &'static str, column: &'static str, value: &str) -> Result<T, StoreError>
where
    T: FromStr<Err = String>,
{
    value.parse().map_err(|reason| StoreError::InvalidField {
        table,
        column,
        value: value.to_string(),
        reason,
    })
}

/// Parse a nullable text column; NULL and blank both mean "unset"
fn parse_optional_column<T>(
    table: &'static str,
    column: &'static str,
    value: Option<&str>,
) -> Result<Option<T>, StoreError>
where
    T: FromStr<Err = String>,
{
    match value.map(str::trim) {
        None | Some("") => Ok(None),
        Some(v) => parse_column(table, column, v).map(Some),
    }
}

fn parse_date(table: &'static str, column: &'static str, value: &str) -> Result<NaiveDate, StoreError> {
    NaiveDate::parse_from_str(value, DATE_FORMAT).map_err(|e| StoreError::InvalidField {
        table,
        column,
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

/// Blank optional text is stored as NULL
fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
