//! Bug entity type

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::core::entity::Priority;

/// Workflow state of a bug
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String")]
pub enum BugStatus {
    #[default]
    New,
    #[serde(rename = "In Progress")]
    InProgress,
    Validated,
    Cancelled,
}

impl BugStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            BugStatus::New => "New",
            BugStatus::InProgress => "In Progress",
            BugStatus::Validated => "Validated",
            BugStatus::Cancelled => "Cancelled",
        }
    }
}

impl fmt::Display for BugStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BugStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['_', '-'], " ").as_str() {
            "new" => Ok(BugStatus::New),
            "in progress" | "inprogress" => Ok(BugStatus::InProgress),
            "validated" => Ok(BugStatus::Validated),
            "cancelled" | "canceled" => Ok(BugStatus::Cancelled),
            _ => Err(format!(
                "Unknown bug status: '{}'. Use New, In Progress, Validated or Cancelled",
                s
            )),
        }
    }
}

impl TryFrom<String> for BugStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Whether a bug is linked to an external tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrationStatus {
    Integrated,
    #[serde(rename = "Not Integrated")]
    NotIntegrated,
}

impl IntegrationStatus {
    /// Integrated iff the tracker reference is non-empty after trimming
    pub fn derive(external_tracker_id: Option<&str>) -> Self {
        match external_tracker_id.map(str::trim) {
            Some(id) if !id.is_empty() => IntegrationStatus::Integrated,
            _ => IntegrationStatus::NotIntegrated,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            IntegrationStatus::Integrated => "Integrated",
            IntegrationStatus::NotIntegrated => "Not Integrated",
        }
    }
}

impl fmt::Display for IntegrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A defect found during a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Bug {
    /// Store-assigned key
    pub id: i64,

    pub title: String,

    #[serde(default)]
    pub description: String,

    /// Application under test
    #[serde(default)]
    pub application: String,

    /// Environment the bug was observed in
    #[serde(default)]
    pub environment: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,

    #[serde(default)]
    pub module: String,

    #[serde(default)]
    pub status: BugStatus,

    /// Reference in an external tracker (e.g. `JIRA-123`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub external_tracker_id: Option<String>,
}

impl Bug {
    /// Integration status, always derived from the tracker reference
    pub fn integration_status(&self) -> IntegrationStatus {
        IntegrationStatus::derive(self.external_tracker_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integration_status_derivation() {
        assert_eq!(IntegrationStatus::derive(None), IntegrationStatus::NotIntegrated);
        assert_eq!(IntegrationStatus::derive(Some("")), IntegrationStatus::NotIntegrated);
        assert_eq!(IntegrationStatus::derive(Some(" ")), IntegrationStatus::NotIntegrated);
        assert_eq!(IntegrationStatus::derive(Some("JIRA-1")), IntegrationStatus::Integrated);
        assert_eq!(IntegrationStatus::derive(Some("  JIRA-1 ")), IntegrationStatus::Integrated);
    }

    #[test]
    fn test_bug_status_deserializes_like_the_cli() {
        let statuses: Vec<BugStatus> =
            serde_yml::from_str("[new, in progress, IN_PROGRESS, canceled, Validated]").unwrap();
        assert_eq!(
            statuses,
            vec![
                BugStatus::New,
                BugStatus::InProgress,
                BugStatus::InProgress,
                BugStatus::Cancelled,
                BugStatus::Validated,
            ]
        );
        assert!(serde_yml::from_str::<BugStatus>("closed").is_err());
        assert_eq!(serde_json::to_string(&BugStatus::InProgress).unwrap(), "\"In Progress\"");
    }

    #[test]
    fn test_bug_integration_follows_tracker_field() {
        let mut bug = Bug {
            id: 1,
            title: "Login button unresponsive".to_string(),
            description: String::new(),
            application: "portal".to_string(),
            environment: "staging".to_string(),
            priority: Some(Priority::High),
            module: "auth".to_string(),
            status: BugStatus::New,
            external_tracker_id: None,
        };
        assert_eq!(bug.integration_status(), IntegrationStatus::NotIntegrated);

        bug.external_tracker_id = Some("JIRA-1".to_string());
        assert_eq!(bug.integration_status(), IntegrationStatus::Integrated);

        bug.external_tracker_id = Some(" ".to_string());
        assert_eq!(bug.integration_status(), IntegrationStatus::NotIntegrated);
    }

    #[test]
    fn test_bug_status_parse() {
        assert_eq!("in progress".parse::<BugStatus>().unwrap(), BugStatus::InProgress);
        assert_eq!("in_progress".parse::<BugStatus>().unwrap(), BugStatus::InProgress);
        assert_eq!("Canceled".parse::<BugStatus>().unwrap(), BugStatus::Cancelled);
        assert!("closed".parse::<BugStatus>().is_err());
    }
}
