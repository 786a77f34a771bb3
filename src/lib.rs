//! QAG: QA Governance
//!
//! A Unix-style toolkit for tracking QA test cycles (acceptance criteria,
//! test cases, bugs and evidence) and exporting PDF execution reports.

pub mod cli;
pub mod core;
pub mod entities;
pub mod report;
pub mod yaml;
