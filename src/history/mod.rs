//! Completed-session history.
//!
//! The engine writes one record per finished work session through the
//! [`SessionLog`] trait and reads the whole history once at construction.
//! Three stores are provided:
//! - [`MemoryLog`] keeps records in a `Vec`
//! - [`SqliteLog`] stores one row per record in `pomo.db`
//! - [`JsonFileLog`] rewrites a single JSON array file on every append
//!
//! [`FocusReport`] summarizes a history slice for the `report` command.

mod json;
mod log;
pub mod report;
mod sqlite;

pub use json::JsonFileLog;
pub use log::{MemoryLog, SessionLog};
pub use report::{FocusReport, ReportPeriod};
pub use sqlite::SqliteLog;

#[cfg(test)]
pub use log::MockSessionLog;
