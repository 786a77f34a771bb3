//! Evidence entity type (uploaded screenshot for a test case)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::entity::CycleId;

/// An image uploaded to the object store and linked to a test case
///
/// The link is by display ID string, not by foreign key: evidence whose
/// `test_case_id` no longer matches any test case is simply never rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evidence {
    pub id: i64,
    pub cycle_id: CycleId,
    pub test_case_id: String,
    pub url: String,
    pub date: NaiveDate,
}

impl Evidence {
    /// Whether this evidence belongs to the given test case display ID
    pub fn belongs_to(&self, display_id: &str) -> bool {
        self.test_case_id == display_id
    }
}
