//! Core module - fundamental types and utilities

pub mod config;
pub mod entity;
pub mod ids;
pub mod logging;
pub mod objects;
pub mod project;
pub mod session;
pub mod store;

pub use config::{Config, ConfigError};
pub use entity::{CycleId, ExecStatus, Priority, UserId};
pub use ids::{next_display_id, Allocation, IdParseError, LatestDisplayId, RecordFamily};
pub use objects::{LocalObjectStore, ObjectKey, ObjectStore, ObjectStoreError};
pub use project::{Project, ProjectError};
pub use session::{Context, Session, SessionError};
pub use store::{Store, StoreError};
