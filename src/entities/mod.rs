//! QA record types
//!
//! Every record except [`User`] belongs to a [`Cycle`]:
//!
//! - [`Criterion`] - Acceptance criteria (`CA-NNN`)
//! - [`TestCase`] - Test cases with steps and expected results (`CT-NNN`)
//! - [`Bug`] - Defects with a derived external-tracker integration status
//! - [`Evidence`] - Uploaded images linked to a test case by display ID

pub mod bug;
pub mod criterion;
pub mod cycle;
pub mod evidence;
pub mod test_case;
pub mod user;

pub use bug::{Bug, BugStatus, IntegrationStatus};
pub use criterion::Criterion;
pub use cycle::Cycle;
pub use evidence::Evidence;
pub use test_case::TestCase;
pub use user::User;
