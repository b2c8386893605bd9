//! `SQLite`-backed history.

use chrono::{DateTime, Duration, Utc};
use rusqlite::{params, Row};

use super::log::SessionLog;
use crate::engine::{CompletedSessionRecord, SessionConfig, SessionProgress};
use crate::error::PomoError;
use crate::storage::Database;

/// History stored in the `completed_sessions` table.
pub struct SqliteLog {
    db: Database,
}

impl SqliteLog {
    /// Create storage with an existing database connection.
    #[must_use]
    pub const fn with_database(db: Database) -> Self {
        Self { db }
    }

    /// Open (or create) the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open(path: &std::path::Path) -> Result<Self, PomoError> {
        Database::open_at(path).map(Self::with_database)
    }

    /// Number of stored records.
    ///
    /// # Errors
    ///
    /// Returns an error if the count query fails.
    pub fn count(&self) -> Result<usize, PomoError> {
        let count: i64 = self
            .db
            .connection()
            .query_row("SELECT COUNT(*) FROM completed_sessions", [], |row| row.get(0))
            .map_err(|e| PomoError::Database(format!("Failed to count sessions: {e}")))?;
        Ok(usize::try_from(count).unwrap_or(0))
    }

    /// Delete every stored record.
    ///
    /// # Errors
    ///
    /// Returns an error if the delete fails.
    pub fn clear(&self) -> Result<usize, PomoError> {
        self.db
            .connection()
            .execute("DELETE FROM completed_sessions", [])
            .map_err(|e| PomoError::Database(format!("Failed to delete sessions: {e}")))
    }
}

impl SessionLog for SqliteLog {
    fn append(&mut self, record: &CompletedSessionRecord) -> Result<(), PomoError> {
        self.db
            .connection()
            .execute(
                r"INSERT INTO completed_sessions
                  (recorded_at, work_seconds, short_break_seconds, long_break_seconds,
                   sessions_until_long_break, completed_sessions, total_focus_seconds,
                   focus_seconds, linked_task)
                  VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    record.recorded_at.to_rfc3339(),
                    record.config.work.num_seconds(),
                    record.config.short_break.num_seconds(),
                    record.config.long_break.num_seconds(),
                    record.config.sessions_until_long_break,
                    record.progress.completed_sessions,
                    record.progress.total_focus_time.num_seconds(),
                    record.focus_time.num_seconds(),
                    record.linked_task,
                ],
            )
            .map_err(|e| PomoError::Database(format!("Failed to insert session: {e}")))?;
        Ok(())
    }

    fn load_all(&self) -> Result<Vec<CompletedSessionRecord>, PomoError> {
        let conn = self.db.connection();

        let mut stmt = conn
            .prepare(
                r"SELECT recorded_at, work_seconds, short_break_seconds, long_break_seconds,
                         sessions_until_long_break, completed_sessions, total_focus_seconds,
                         focus_seconds, linked_task
                  FROM completed_sessions
                  ORDER BY id ASC",
            )
            .map_err(|e| PomoError::Database(format!("Failed to prepare query: {e}")))?;

        let rows = stmt
            .query_map([], row_to_record)
            .map_err(|e| PomoError::Database(format!("Failed to query sessions: {e}")))?;

        let records = rows
            .map(|row| row.map_err(|e| PomoError::Database(e.to_string())))
            .collect::<Result<Vec<_>, _>>()?;

        Ok(records)
    }
}

fn seconds(row: &Row<'_>, idx: usize) -> Result<Duration, rusqlite::Error> {
    let secs: i64 = row.get(idx)?;
    Duration::try_seconds(secs).ok_or(rusqlite::Error::IntegralValueOutOfRange(idx, secs))
}

/// Convert a database row to a record.
fn row_to_record(row: &Row<'_>) -> Result<CompletedSessionRecord, rusqlite::Error> {
    let recorded_at_str: String = row.get(0)?;
    let recorded_at = DateTime::parse_from_rfc3339(&recorded_at_str)
        .map(|t| t.with_timezone(&Utc))
        .map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(0, rusqlite::types::Type::Text, Box::new(e))
        })?;

    let config = SessionConfig {
        work: seconds(row, 1)?,
        short_break: seconds(row, 2)?,
        long_break: seconds(row, 3)?,
        sessions_until_long_break: row.get(4)?,
    };
    let progress = SessionProgress {
        completed_sessions: row.get(5)?,
        total_focus_time: seconds(row, 6)?,
    };

    Ok(CompletedSessionRecord {
        recorded_at,
        config,
        progress,
        focus_time: seconds(row, 7)?,
        linked_task: row.get(8)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_log() -> SqliteLog {
        let db = Database::open_in_memory().unwrap();
        SqliteLog::with_database(db)
    }

    fn record(completed: u32, task: Option<&str>) -> CompletedSessionRecord {
        let progress = SessionProgress {
            completed_sessions: completed,
            total_focus_time: Duration::minutes(25 * i64::from(completed)),
        };
        CompletedSessionRecord::new(
            SessionConfig::default(),
            progress,
            task.map(ToString::to_string),
        )
    }

    #[test]
    fn test_append_and_load() {
        let mut log = create_test_log();
        let first = record(1, Some("task123"));
        let second = record(3, None);

        log.append(&first).unwrap();
        log.append(&second).unwrap();

        let loaded = log.load_all().unwrap();
        assert_eq!(loaded, vec![first, second]);
        assert_eq!(log.count().unwrap(), 2);
    }

    #[test]
    fn test_load_empty() {
        let log = create_test_log();
        assert!(log.load_all().unwrap().is_empty());
    }

    #[test]
    fn test_persists_across_reopen() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let path = temp_dir.path().join("pomo.db");

        {
            let mut log = SqliteLog::open(&path).unwrap();
            log.append(&record(1, None)).unwrap();
        }

        let log = SqliteLog::open(&path).unwrap();
        let loaded = log.load_all().unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].focus_time, Duration::minutes(25));
    }

    #[test]
    fn test_clear() {
        let mut log = create_test_log();
        log.append(&record(1, None)).unwrap();

        assert_eq!(log.clear().unwrap(), 1);
        assert_eq!(log.count().unwrap(), 0);
    }
}
