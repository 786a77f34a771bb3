//! Sequential display IDs (`CA-001`, `CT-002`, ...)
//!
//! A new ID is derived from the most recently inserted record of the same
//! family in the same cycle. Uniqueness is only attempted at allocation time:
//! reordering rows through a bulk save, or two concurrent allocations, can
//! still produce gaps or duplicates.

use std::fmt;
use thiserror::Error;

use crate::core::entity::CycleId;
use crate::core::store::StoreError;

/// Record families that carry sequential display IDs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordFamily {
    Criteria,
    TestCases,
}

impl RecordFamily {
    /// Display ID prefix
    pub fn prefix(&self) -> &'static str {
        match self {
            RecordFamily::Criteria => "CA",
            RecordFamily::TestCases => "CT",
        }
    }

    /// Store table holding the family
    pub fn table(&self) -> &'static str {
        match self {
            RecordFamily::Criteria => "criteria",
            RecordFamily::TestCases => "test_cases",
        }
    }

    /// Column holding the display ID
    pub fn id_column(&self) -> &'static str {
        match self {
            RecordFamily::Criteria => "crit_id",
            RecordFamily::TestCases => "test_id",
        }
    }
}

impl fmt::Display for RecordFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table())
    }
}

/// Source of the most recently inserted display ID for a family
pub trait LatestDisplayId {
    fn latest_display_id(
        &self,
        family: RecordFamily,
        cycle: CycleId,
    ) -> Result<Option<String>, StoreError>;
}

/// Why an existing display ID could not be incremented
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdParseError {
    #[error("display ID '{id}' has no '-' separator")]
    MissingSeparator { id: String },

    #[error("display ID '{id}' has non-numeric suffix '{suffix}'")]
    InvalidNumber { id: String, suffix: String },

    #[error("display ID '{id}' cannot be incremented further")]
    Overflow { id: String },
}

/// Outcome of an allocation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Allocation {
    /// The allocated display ID
    pub id: String,
    /// Set when the latest ID was malformed and the first ID was used instead
    pub recovered_from: Option<IdParseError>,
}

/// The ID used when a family has no records in a cycle
pub fn first_id(prefix: &str) -> String {
    format!("{}-001", prefix)
}

/// Increment an existing display ID
///
/// The numeric part is the segment after the first `-` (up to any further
/// `-`). The result is zero-padded to three digits; values of 1000 and above
/// simply render wider.
pub fn increment(prefix: &str, latest: &str) -> Result<String, IdParseError> {
    let suffix = latest
        .split('-')
        .nth(1)
        .ok_or_else(|| IdParseError::MissingSeparator {
            id: latest.to_string(),
        })?;

    let number = suffix
        .parse::<u64>()
        .map_err(|_| IdParseError::InvalidNumber {
            id: latest.to_string(),
            suffix: suffix.to_string(),
        })?;

    let next = number.checked_add(1).ok_or_else(|| IdParseError::Overflow {
        id: latest.to_string(),
    })?;

    Ok(format!("{}-{:03}", prefix, next))
}

/// Compute the next display ID for a family within a cycle
///
/// A malformed latest ID falls back to the family's first ID; the parse error
/// is returned in [`Allocation::recovered_from`] and logged.
pub fn next_display_id(
    source: &impl LatestDisplayId,
    family: RecordFamily,
    cycle: CycleId,
) -> Result<Allocation, StoreError> {
    let prefix = family.prefix();

    let Some(latest) = source.latest_display_id(family, cycle)? else {
        return Ok(Allocation {
            id: first_id(prefix),
            recovered_from: None,
        });
    };

    match increment(prefix, &latest) {
        Ok(id) => Ok(Allocation {
            id,
            recovered_from: None,
        }),
        Err(err) => {
            tracing::warn!(%family, %cycle, latest = %latest, error = %err, "falling back to first display ID");
            Ok(Allocation {
                id: first_id(prefix),
                recovered_from: Some(err),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    /// Latest-ID source backed by a map, standing in for the store
    #[derive(Default)]
    struct FakeSource {
        latest: HashMap<(RecordFamily, CycleId), String>,
    }

    impl FakeSource {
        fn with(family: RecordFamily, cycle: CycleId, id: &str) -> Self {
            let mut source = Self::default();
            source.latest.insert((family, cycle), id.to_string());
            source
        }
    }

    impl LatestDisplayId for FakeSource {
        fn latest_display_id(
            &self,
            family: RecordFamily,
            cycle: CycleId,
        ) -> Result<Option<String>, StoreError> {
            Ok(self.latest.get(&(family, cycle)).cloned())
        }
    }

    #[test]
    fn test_no_records_gives_first_id() {
        let source = FakeSource::default();
        let alloc = next_display_id(&source, RecordFamily::TestCases, CycleId(1)).unwrap();
        assert_eq!(alloc.id, "CT-001");
        assert!(alloc.recovered_from.is_none());

        let alloc = next_display_id(&source, RecordFamily::Criteria, CycleId(1)).unwrap();
        assert_eq!(alloc.id, "CA-001");
    }

    #[test]
    fn test_increments_latest() {
        let source = FakeSource::with(RecordFamily::TestCases, CycleId(1), "CT-007");
        let alloc = next_display_id(&source, RecordFamily::TestCases, CycleId(1)).unwrap();
        assert_eq!(alloc.id, "CT-008");
    }

    #[test]
    fn test_scoped_by_cycle_and_family() {
        let source = FakeSource::with(RecordFamily::TestCases, CycleId(1), "CT-007");
        let other_cycle = next_display_id(&source, RecordFamily::TestCases, CycleId(2)).unwrap();
        assert_eq!(other_cycle.id, "CT-001");
        let other_family = next_display_id(&source, RecordFamily::Criteria, CycleId(1)).unwrap();
        assert_eq!(other_family.id, "CA-001");
    }

    #[test]
    fn test_malformed_latest_falls_back() {
        let source = FakeSource::with(RecordFamily::TestCases, CycleId(1), "CT-abc");
        let alloc = next_display_id(&source, RecordFamily::TestCases, CycleId(1)).unwrap();
        assert_eq!(alloc.id, "CT-001");
        assert_eq!(
            alloc.recovered_from,
            Some(IdParseError::InvalidNumber {
                id: "CT-abc".to_string(),
                suffix: "abc".to_string(),
            })
        );
    }

    #[test]
    fn test_missing_separator_falls_back() {
        let source = FakeSource::with(RecordFamily::Criteria, CycleId(4), "CA007");
        let alloc = next_display_id(&source, RecordFamily::Criteria, CycleId(4)).unwrap();
        assert_eq!(alloc.id, "CA-001");
        assert!(matches!(
            alloc.recovered_from,
            Some(IdParseError::MissingSeparator { .. })
        ));
    }

    #[test]
    fn test_increment_padding_and_width() {
        assert_eq!(increment("CT", "CT-009").unwrap(), "CT-010");
        assert_eq!(increment("CT", "CT-099").unwrap(), "CT-100");
        assert_eq!(increment("CT", "CT-999").unwrap(), "CT-1000");
        assert_eq!(increment("CT", "CT-1000").unwrap(), "CT-1001");
    }

    #[test]
    fn test_increment_uses_segment_after_first_separator() {
        assert_eq!(increment("CT", "CT-004-retest").unwrap(), "CT-005");
        // The prefix of the latest ID is not checked
        assert_eq!(increment("CT", "XX-002").unwrap(), "CT-003");
    }

    #[test]
    fn test_increment_overflow() {
        let latest = format!("CT-{}", u64::MAX);
        assert!(matches!(
            increment("CT", &latest),
            Err(IdParseError::Overflow { .. })
        ));
    }
}
