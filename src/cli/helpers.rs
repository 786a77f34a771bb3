//! Shared helper functions for CLI commands
//!
//! This module contains utility functions that are used across multiple
//! command modules to avoid code duplication.

use miette::Result;

use crate::cli::GlobalOpts;
use crate::core::{Context, StoreError};
use crate::entities::Cycle;

/// Truncate a string to max_len characters, adding "..." if truncated
///
/// Useful for table columns that need fixed-width output.
pub fn truncate_str(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", head)
    }
}

/// Show an empty string as "-" in human-readable output
pub fn or_dash(s: &str) -> &str {
    if s.trim().is_empty() {
        "-"
    } else {
        s
    }
}

/// Resolve the cycle a command acts on
///
/// `--cycle` (or `QAG_CYCLE`) wins; otherwise the session's active cycle is
/// used, which requires being logged in.
pub fn resolve_cycle(ctx: &Context, global: &GlobalOpts) -> Result<Cycle> {
    if let Some(reference) = &global.cycle {
        return Ok(ctx.store.find_cycle(reference)?);
    }

    let session = ctx.session()?;
    let id = session.cycle(None)?;
    let cycle = ctx.store.get_cycle(id)?.ok_or_else(|| StoreError::NotFound {
        what: "cycle",
        key: id.to_string(),
    })?;
    Ok(cycle)
}

/// Apply a `--field value` override if present
pub fn set_if<T>(target: &mut T, value: Option<T>) {
    if let Some(v) = value {
        *target = v;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_str() {
        assert_eq!(truncate_str("hello", 10), "hello");
        assert_eq!(truncate_str("hello world", 8), "hello...");
        assert_eq!(truncate_str("hi", 2), "hi");
        assert_eq!(truncate_str("ééééé", 4), "é...");
    }

    #[test]
    fn test_or_dash() {
        assert_eq!(or_dash(""), "-");
        assert_eq!(or_dash("  "), "-");
        assert_eq!(or_dash("auth"), "auth");
    }

    #[test]
    fn test_set_if() {
        let mut module = "auth".to_string();
        set_if(&mut module, None);
        assert_eq!(module, "auth");
        set_if(&mut module, Some("billing".to_string()));
        assert_eq!(module, "billing");
    }
}
