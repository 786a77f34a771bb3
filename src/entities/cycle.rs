//! Cycle entity type (a named QA execution round)

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::core::entity::{CycleId, UserId};

/// A QA execution cycle grouping criteria, test cases, bugs and evidence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cycle {
    pub id: CycleId,
    pub title: String,
    pub owner: UserId,
    pub created: NaiveDate,
}

impl Cycle {
    /// Default file name of the exported PDF report
    ///
    /// Path separators in the title are replaced so the name stays a single
    /// path component.
    pub fn report_file_name(&self) -> String {
        let safe: String = self
            .title
            .chars()
            .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
            .collect();
        format!("QA_{}.pdf", safe)
    }
}
