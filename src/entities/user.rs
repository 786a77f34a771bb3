//! User entity type

use serde::{Deserialize, Serialize};

use crate::core::entity::UserId;

/// A person who owns cycles and records QA work
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
}
