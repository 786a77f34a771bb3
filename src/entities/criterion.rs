//! Acceptance criterion entity type

use serde::{Deserialize, Serialize};

use crate::core::entity::{ExecStatus, Priority};

/// An acceptance criterion tracked within a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Criterion {
    /// Display ID (`CA-NNN`), unique within the cycle at allocation time
    #[serde(rename = "id")]
    pub display_id: String,

    /// Functional module the criterion applies to
    #[serde(default)]
    pub module: String,

    #[serde(default)]
    pub description: String,

    /// Free-form classification (functional, performance, ...)
    #[serde(rename = "type", default)]
    pub criterion_type: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    /// Person responsible for the criterion
    #[serde(default)]
    pub owner: String,

    #[serde(default)]
    pub status: ExecStatus,
}

impl Criterion {
    /// A blank criterion as created by `qag crit new`
    pub fn new(display_id: impl Into<String>) -> Self {
        Self {
            display_id: display_id.into(),
            module: String::new(),
            description: String::new(),
            criterion_type: String::new(),
            priority: None,
            owner: String::new(),
            status: ExecStatus::Pending,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_uses_short_field_names() {
        let mut crit = Criterion::new("CA-001");
        crit.criterion_type = "functional".to_string();
        crit.priority = Some(Priority::High);
        let yaml = serde_yml::to_string(&crit).unwrap();
        assert!(yaml.contains("id: CA-001"));
        assert!(yaml.contains("type: functional"));
        assert!(yaml.contains("priority: High"));
    }

    #[test]
    fn test_missing_fields_default() {
        let crit: Criterion = serde_yml::from_str("id: CA-009\n").unwrap();
        assert_eq!(crit, Criterion::new("CA-009"));
    }
}
