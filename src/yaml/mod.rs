//! YAML parsing for hand-edited record lists

pub mod diagnostics;

pub use diagnostics::YamlSyntaxError;

use serde::de::DeserializeOwned;

/// Parse YAML text, reporting failures against the source
///
/// An empty document parses as `T::default()` (an empty list for the
/// `crit edit` / `case edit` files).
pub fn parse_yaml_str<T>(source: &str, filename: &str) -> Result<T, YamlSyntaxError>
where
    T: DeserializeOwned + Default,
{
    let parsed: Option<T> = serde_yml::from_str(source)
        .map_err(|e| YamlSyntaxError::from_serde_error(&e, source, filename))?;
    Ok(parsed.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{ExecStatus, Priority};
    use crate::entities::{Criterion, TestCase};

    #[test]
    fn test_parse_list_of_test_cases() {
        let src = "- id: CT-001\n  title: Login\n  status: OK\n- id: CT-002\n";
        let cases: Vec<TestCase> = parse_yaml_str(src, "cases.yaml").unwrap();
        assert_eq!(cases.len(), 2);
        assert_eq!(cases[0].status, ExecStatus::Ok);
        assert_eq!(cases[1].status, ExecStatus::Pending);
    }

    #[test]
    fn test_empty_document_is_empty_list() {
        let cases: Vec<TestCase> = parse_yaml_str("# nothing\n", "cases.yaml").unwrap();
        assert!(cases.is_empty());
    }

    #[test]
    fn test_statuses_and_priorities_are_case_insensitive() {
        let src = "- id: CT-001\n  status: ok\n- id: CT-002\n  status: na\n- id: CT-003\n  status: failed\n";
        let cases: Vec<TestCase> = parse_yaml_str(src, "cases.yaml").unwrap();
        let statuses: Vec<ExecStatus> = cases.iter().map(|c| c.status).collect();
        assert_eq!(
            statuses,
            vec![ExecStatus::Ok, ExecStatus::NotApplicable, ExecStatus::Failed]
        );

        let src = "- id: CA-001\n  priority: high\n  status: n/a\n";
        let criteria: Vec<Criterion> = parse_yaml_str(src, "criteria.yaml").unwrap();
        assert_eq!(criteria[0].priority, Some(Priority::High));
        assert_eq!(criteria[0].status, ExecStatus::NotApplicable);
    }

    #[test]
    fn test_unknown_status_is_reported() {
        let src = "- id: CT-001\n  status: Done\n";
        let err = parse_yaml_str::<Vec<TestCase>>(src, "cases.yaml").unwrap_err();
        assert!(err.message().contains("Done"));
    }
}
