//! Test case entity type

use serde::{Deserialize, Serialize};

use crate::core::entity::ExecStatus;

/// A test case executed within a cycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestCase {
    /// Display ID (`CT-NNN`); evidence is linked by this string
    #[serde(rename = "id")]
    pub display_id: String,

    #[serde(default)]
    pub module: String,

    #[serde(default)]
    pub title: String,

    /// Steps to execute (free text)
    #[serde(default)]
    pub steps: String,

    #[serde(default)]
    pub expected_result: String,

    #[serde(default)]
    pub status: ExecStatus,

    /// Observation recorded by the tester
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl TestCase {
    /// A blank test case as created by `qag case new`
    pub fn new(display_id: impl Into<String>) -> Self {
        Self {
            display_id: display_id.into(),
            module: String::new(),
            title: String::new(),
            steps: String::new(),
            expected_result: String::new(),
            status: ExecStatus::Pending,
            note: None,
        }
    }

    /// The note, if it carries any visible text
    pub fn visible_note(&self) -> Option<&str> {
        self.note
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_visible_note() {
        let mut tc = TestCase::new("CT-001");
        assert_eq!(tc.visible_note(), None);
        tc.note = Some("   ".to_string());
        assert_eq!(tc.visible_note(), None);
        tc.note = Some(" flaky on staging ".to_string());
        assert_eq!(tc.visible_note(), Some("flaky on staging"));
    }
}
