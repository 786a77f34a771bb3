//! Shared value types used across QA records

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Store key of a cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CycleId(pub i64);

impl fmt::Display for CycleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Store key of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub i64);

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Execution status shared by acceptance criteria and test cases
///
/// Serialized with its display label; deserialized through [`FromStr`], so
/// hand-edited YAML accepts the same spellings as the CLI flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(try_from = "String")]
pub enum ExecStatus {
    #[default]
    Pending,
    Running,
    #[serde(rename = "OK")]
    Ok,
    Failed,
    Blocked,
    #[serde(rename = "N/A")]
    NotApplicable,
}

impl ExecStatus {
    /// All statuses in their canonical display order
    pub const ALL: [ExecStatus; 6] = [
        ExecStatus::Pending,
        ExecStatus::Running,
        ExecStatus::Ok,
        ExecStatus::Failed,
        ExecStatus::Blocked,
        ExecStatus::NotApplicable,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ExecStatus::Pending => "Pending",
            ExecStatus::Running => "Running",
            ExecStatus::Ok => "OK",
            ExecStatus::Failed => "Failed",
            ExecStatus::Blocked => "Blocked",
            ExecStatus::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for ExecStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExecStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "pending" => Ok(ExecStatus::Pending),
            "running" => Ok(ExecStatus::Running),
            "ok" => Ok(ExecStatus::Ok),
            "failed" => Ok(ExecStatus::Failed),
            "blocked" => Ok(ExecStatus::Blocked),
            "n/a" | "na" => Ok(ExecStatus::NotApplicable),
            _ => Err(format!(
                "Unknown status: '{}'. Use Pending, Running, OK, Failed, Blocked or N/A",
                s
            )),
        }
    }
}

impl TryFrom<String> for ExecStatus {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Priority of acceptance criteria and bugs
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Default,
)]
#[serde(try_from = "String")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
    Critical,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Medium",
            Priority::High => "High",
            Priority::Critical => "Critical",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            "critical" => Ok(Priority::Critical),
            _ => Err(format!(
                "Unknown priority: '{}'. Use Low, Medium, High or Critical",
                s
            )),
        }
    }
}

impl TryFrom<String> for Priority {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

/// Display an optional priority, empty when unset
pub fn priority_label(priority: Option<Priority>) -> &'static str {
    priority.map(|p| p.as_str()).unwrap_or("")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exec_status_parse_is_case_insensitive() {
        assert_eq!("ok".parse::<ExecStatus>().unwrap(), ExecStatus::Ok);
        assert_eq!("FAILED".parse::<ExecStatus>().unwrap(), ExecStatus::Failed);
        assert_eq!("n/a".parse::<ExecStatus>().unwrap(), ExecStatus::NotApplicable);
        assert_eq!("NA".parse::<ExecStatus>().unwrap(), ExecStatus::NotApplicable);
        assert!("done".parse::<ExecStatus>().is_err());
    }

    #[test]
    fn test_exec_status_serde_labels() {
        let json = serde_json::to_string(&ExecStatus::NotApplicable).unwrap();
        assert_eq!(json, "\"N/A\"");
        let back: ExecStatus = serde_json::from_str("\"OK\"").unwrap();
        assert_eq!(back, ExecStatus::Ok);
    }

    #[test]
    fn test_deserialize_accepts_cli_spellings() {
        let statuses: Vec<ExecStatus> =
            serde_yml::from_str("[ok, failed, na, N/A, \" Running \"]").unwrap();
        assert_eq!(
            statuses,
            vec![
                ExecStatus::Ok,
                ExecStatus::Failed,
                ExecStatus::NotApplicable,
                ExecStatus::NotApplicable,
                ExecStatus::Running,
            ]
        );
        let priorities: Vec<Priority> = serde_yml::from_str("[high, CRITICAL]").unwrap();
        assert_eq!(priorities, vec![Priority::High, Priority::Critical]);
        assert!(serde_yml::from_str::<ExecStatus>("done").is_err());
    }

    #[test]
    fn test_display_matches_as_str() {
        for status in ExecStatus::ALL {
            assert_eq!(status.to_string(), status.as_str());
        }
        assert_eq!(Priority::Critical.to_string(), "Critical");
    }

    #[test]
    fn test_priority_label() {
        assert_eq!(priority_label(None), "");
        assert_eq!(priority_label(Some(Priority::High)), "High");
    }
}
