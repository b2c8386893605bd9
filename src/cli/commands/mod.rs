//! Command implementations for pomo.
//!
//! Each command returns the text to print; `main` does the printing.

mod completions;
mod config;
mod history;
mod plan;
mod report;
mod run;

pub use completions::completions;
pub use config::config;
pub use history::history;
pub use plan::plan;
pub use report::report;
pub use run::run;

use serde::Serialize;

use crate::config::{Config, Paths, StorageBackend};
use crate::engine::CompletedSessionRecord;
use crate::error::PomoError;
use crate::history::SessionLog;

/// Serialize a value as pretty-printed JSON.
///
/// # Errors
///
/// Returns an error if serialization fails.
pub fn to_json<T: Serialize>(value: &T) -> Result<String, PomoError> {
    Ok(serde_json::to_string_pretty(value)?)
}

/// Load every stored record from the configured backend.
///
/// A database that was never created reads as an empty history and is not
/// created here.
fn load_records(paths: &Paths, config: &Config) -> Result<Vec<CompletedSessionRecord>, PomoError> {
    if config.storage.backend == StorageBackend::Sqlite && !paths.database.exists() {
        tracing::debug!(path = %paths.database.display(), "no history database yet");
        return Ok(Vec::new());
    }
    config.storage.backend.open(paths)?.load_all()
}
