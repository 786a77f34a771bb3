//! Shared utilities for CLI commands

use console::style;
use dialoguer::Confirm;
use miette::{IntoDiagnostic, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs;
use std::io::Write;

use crate::core::Config;
use crate::yaml::parse_yaml_str;

/// Ask for confirmation unless `--yes` was given
///
/// Without a terminal to ask on, the answer is "no".
pub fn confirm(prompt: &str, yes: bool) -> Result<bool> {
    if yes {
        return Ok(true);
    }
    if !console::user_attended() {
        return Ok(false);
    }
    Confirm::new()
        .with_prompt(prompt)
        .default(false)
        .interact()
        .into_diagnostic()
}

/// Open `records` as a YAML list in the editor and parse the result
///
/// Returns `None` when the file was saved unchanged. A syntax error is
/// returned as a diagnostic pointing into the edited text; nothing is
/// written to the store in that case.
pub fn edit_yaml<T>(config: &Config, records: &[T], name: &str, header: &str) -> Result<Option<Vec<T>>>
where
    T: Serialize + DeserializeOwned,
{
    let body = if records.is_empty() {
        "[]\n".to_string()
    } else {
        serde_yml::to_string(records).into_diagnostic()?
    };
    let original = format!("{header}{body}");

    let mut file = tempfile::Builder::new()
        .prefix(&format!("qag-{name}-"))
        .suffix(".yaml")
        .tempfile()
        .into_diagnostic()?;
    file.write_all(original.as_bytes()).into_diagnostic()?;
    file.flush().into_diagnostic()?;

    println!(
        "Opening {} in {}...",
        style(name).cyan(),
        style(config.editor()).yellow()
    );
    let status = config.run_editor(file.path()).into_diagnostic()?;
    if !status.success() {
        return Err(miette::miette!(
            "Editor exited with {}; nothing was saved",
            status
        ));
    }

    let edited = fs::read_to_string(file.path()).into_diagnostic()?;
    if edited == original {
        return Ok(None);
    }

    let parsed: Vec<T> = parse_yaml_str(&edited, &format!("{name}.yaml"))?;
    Ok(Some(parsed))
}
