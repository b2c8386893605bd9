//! `SQLite` database connection.
//!
//! The database lives at `~/.pomo/pomo.db` and holds the completed-session
//! history.

use std::path::Path;
use std::time::Duration;

use rusqlite::Connection;

use crate::error::PomoError;

use super::migrations;

/// How long a writer waits on a lock held by another `pomo` process.
const BUSY_TIMEOUT: Duration = Duration::from_secs(2);

/// Migrated connection to the history database.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Open (creating if needed) the database file at `path`.
    ///
    /// # Errors
    ///
    /// Returns `PomoError::Database` if the file cannot be opened or the
    /// schema cannot be brought up to date.
    pub fn open_at(path: &Path) -> Result<Self, PomoError> {
        let conn = Connection::open(path).map_err(|e| {
            PomoError::Database(format!("Failed to open database {}: {e}", path.display()))
        })?;
        tracing::debug!(path = %path.display(), "opened database");
        Self::from_connection(conn)
    }

    /// Open a throwaway database with the current schema.
    ///
    /// # Errors
    ///
    /// Returns `PomoError::Database` if migrations fail.
    pub fn open_in_memory() -> Result<Self, PomoError> {
        let conn = Connection::open_in_memory().map_err(|e| {
            PomoError::Database(format!("Failed to open in-memory database: {e}"))
        })?;
        Self::from_connection(conn)
    }

    fn from_connection(conn: Connection) -> Result<Self, PomoError> {
        conn.busy_timeout(BUSY_TIMEOUT)
            .map_err(|e| PomoError::Database(format!("Failed to set busy timeout: {e}")))?;
        migrations::run(&conn)?;
        Ok(Self { conn })
    }

    /// Schema version stored in `PRAGMA user_version`.
    ///
    /// # Errors
    ///
    /// Returns `PomoError::Database` if the pragma cannot be read.
    pub fn schema_version(&self) -> Result<i32, PomoError> {
        migrations::get_version(&self.conn)
    }

    /// The underlying connection.
    #[must_use]
    pub const fn connection(&self) -> &Connection {
        &self.conn
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn has_column(db: &Database, column: &str) -> bool {
        let mut stmt = db
            .connection()
            .prepare("SELECT name FROM pragma_table_info('completed_sessions')")
            .unwrap();
        let names: Vec<String> = stmt
            .query_map([], |row| row.get(0))
            .unwrap()
            .collect::<Result<_, _>>()
            .unwrap();
        names.iter().any(|n| n == column)
    }

    #[test]
    fn test_in_memory_schema_is_current() {
        let db = Database::open_in_memory().unwrap();
        assert_eq!(db.schema_version().unwrap(), 2);
        assert!(has_column(&db, "focus_seconds"));
        assert!(has_column(&db, "linked_task"));
    }

    #[test]
    fn test_open_creates_file() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("pomo.db");

        let db = Database::open_at(&db_path).unwrap();
        assert_eq!(db.schema_version().unwrap(), 2);
        assert!(db_path.exists());
    }

    #[test]
    fn test_reopen_keeps_rows() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("pomo.db");

        {
            let db = Database::open_at(&db_path).unwrap();
            db.connection()
                .execute(
                    "INSERT INTO completed_sessions (recorded_at, work_seconds, short_break_seconds,
                     long_break_seconds, sessions_until_long_break, completed_sessions,
                     total_focus_seconds, focus_seconds) VALUES ('2024-03-15T10:00:00Z', 1500, 300, 900, 4, 1, 1500, 1500)",
                    [],
                )
                .unwrap();
        }

        let db = Database::open_at(&db_path).unwrap();
        let count: i64 = db
            .connection()
            .query_row("SELECT COUNT(*) FROM completed_sessions", [], |row| row.get(0))
            .unwrap();
        assert_eq!(count, 1);
    }

    #[test]
    fn test_open_in_missing_directory_fails() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let db_path = temp_dir.path().join("missing").join("pomo.db");
        assert!(matches!(Database::open_at(&db_path), Err(PomoError::Database(_))));
    }
}
