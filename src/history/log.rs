//! The history store interface.

use crate::engine::CompletedSessionRecord;
use crate::error::PomoError;

/// Append-only store of completed work sessions.
#[cfg_attr(test, mockall::automock)]
pub trait SessionLog {
    /// Persist one record after the ones already stored.
    ///
    /// # Errors
    ///
    /// Returns a storage error; callers treat it as non-fatal.
    fn append(&mut self, record: &CompletedSessionRecord) -> Result<(), PomoError>;

    /// Read every stored record, oldest first.
    ///
    /// # Errors
    ///
    /// Returns a storage error; callers treat it as non-fatal.
    fn load_all(&self) -> Result<Vec<CompletedSessionRecord>, PomoError>;
}

impl<L: SessionLog + ?Sized> SessionLog for Box<L> {
    fn append(&mut self, record: &CompletedSessionRecord) -> Result<(), PomoError> {
        (**self).append(record)
    }

    fn load_all(&self) -> Result<Vec<CompletedSessionRecord>, PomoError> {
        (**self).load_all()
    }
}

/// History kept only for the lifetime of the process.
#[derive(Debug, Clone, Default)]
pub struct MemoryLog {
    records: Vec<CompletedSessionRecord>,
}

impl MemoryLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a log pre-filled with records.
    #[must_use]
    pub const fn with_records(records: Vec<CompletedSessionRecord>) -> Self {
        Self { records }
    }

    /// Records appended so far.
    #[must_use]
    pub fn records(&self) -> &[CompletedSessionRecord] {
        &self.records
    }
}

impl SessionLog for MemoryLog {
    fn append(&mut self, record: &CompletedSessionRecord) -> Result<(), PomoError> {
        self.records.push(record.clone());
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<CompletedSessionRecord>, PomoError> {
        Ok(self.records.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::{SessionConfig, SessionProgress};

    fn record(completed: u32) -> CompletedSessionRecord {
        let progress = SessionProgress {
            completed_sessions: completed,
            ..SessionProgress::default()
        };
        CompletedSessionRecord::new(SessionConfig::default(), progress, None)
    }

    #[test]
    fn test_memory_log_append_and_load() {
        let mut log = MemoryLog::new();
        log.append(&record(1)).unwrap();
        log.append(&record(3)).unwrap();

        let loaded = log.load_all().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].progress.completed_sessions, 1);
        assert_eq!(loaded[1].progress.completed_sessions, 3);
    }

    #[test]
    fn test_boxed_log_delegates() {
        let mut log: Box<dyn SessionLog> = Box::new(MemoryLog::with_records(vec![record(1)]));
        log.append(&record(3)).unwrap();
        assert_eq!(log.load_all().unwrap().len(), 2);
    }
}
