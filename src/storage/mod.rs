//! Local data storage for pomo.
//!
//! `SQLite` persistence for the completed-session history.

mod database;
mod migrations;

pub use database::Database;
