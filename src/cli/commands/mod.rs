//! CLI command implementations

pub mod utils;

pub mod bug;
pub mod case;
pub mod completions;
pub mod config;
pub mod crit;
pub mod cycle;
pub mod evid;
pub mod init;
pub mod report;
pub mod session;
pub mod user;
