//! Single-file JSON history.
//!
//! The whole history is one JSON array, rewritten on every append.

use std::path::{Path, PathBuf};

use super::log::SessionLog;
use crate::engine::CompletedSessionRecord;
use crate::error::PomoError;

/// History stored as a JSON array in one file.
#[derive(Debug, Clone)]
pub struct JsonFileLog {
    path: PathBuf,
}

impl JsonFileLog {
    /// Use the file at `path`. It is created on first append.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Location of the backing file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write_all(&self, records: &[CompletedSessionRecord]) -> Result<(), PomoError> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let contents = serde_json::to_string_pretty(records)?;
        let tmp = self.path.with_extension("json.tmp");
        std::fs::write(&tmp, contents)?;
        std::fs::rename(&tmp, &self.path)?;
        Ok(())
    }
}

impl SessionLog for JsonFileLog {
    fn append(&mut self, record: &CompletedSessionRecord) -> Result<(), PomoError> {
        let mut records = self.load_all()?;
        records.push(record.clone());
        self.write_all(&records)
    }

    fn load_all(&self) -> Result<Vec<CompletedSessionRecord>, PomoError> {
        if !self.path.exists() {
            return Ok(Vec::new());
        }

        let contents = std::fs::read_to_string(&self.path)?;
        if contents.trim().is_empty() {
            return Ok(Vec::new());
        }

        serde_json::from_str(&contents).map_err(|e| {
            PomoError::Persistence(format!(
                "Failed to parse history file {}: {e}",
                self.path.display()
            ))
        })
    }
}
