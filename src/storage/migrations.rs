//! Database migrations for pomo.
//!
//! Each migration is a function that upgrades the schema by one version.
//! Migrations are run automatically when the database is opened.

use rusqlite::Connection;

use crate::error::PomoError;

/// Current schema version.
const CURRENT_VERSION: i32 = 2;

/// Get the current schema version from the database.
///
/// Returns 0 if no version has been set (new database).
pub fn get_version(conn: &Connection) -> Result<i32, PomoError> {
    conn.query_row("PRAGMA user_version", [], |row| row.get(0))
        .map_err(|e| PomoError::Database(format!("Failed to get schema version: {e}")))
}

/// Set the schema version in the database.
fn set_version(conn: &Connection, version: i32) -> Result<(), PomoError> {
    conn.execute_batch(&format!("PRAGMA user_version = {version};"))
        .map_err(|e| PomoError::Database(format!("Failed to set schema version: {e}")))
}

/// Run all pending migrations.
pub fn run(conn: &Connection) -> Result<(), PomoError> {
    let current = get_version(conn)?;

    if current >= CURRENT_VERSION {
        return Ok(());
    }

    for version in (current + 1)..=CURRENT_VERSION {
        tracing::debug!(version, "running database migration");
        run_migration(conn, version)?;
        set_version(conn, version)?;
    }

    Ok(())
}

/// Run a specific migration.
fn run_migration(conn: &Connection, version: i32) -> Result<(), PomoError> {
    match version {
        1 => migrate_v1(conn),
        2 => migrate_v2(conn),
        _ => Err(PomoError::Database(format!(
            "Unknown migration version: {version}"
        ))),
    }
}

/// Migration v1: completed work sessions.
fn migrate_v1(conn: &Connection) -> Result<(), PomoError> {
    conn.execute_batch(
        r"
        CREATE TABLE IF NOT EXISTS completed_sessions (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            recorded_at TEXT NOT NULL,
            work_seconds INTEGER NOT NULL,
            short_break_seconds INTEGER NOT NULL,
            long_break_seconds INTEGER NOT NULL,
            sessions_until_long_break INTEGER NOT NULL,
            completed_sessions INTEGER NOT NULL,
            total_focus_seconds INTEGER NOT NULL,
            focus_seconds INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_completed_sessions_recorded
        ON completed_sessions(recorded_at);
        ",
    )
    .map_err(|e| PomoError::Database(format!("Migration v1 failed: {e}")))
}

/// Migration v2: optional task link per session.
fn migrate_v2(conn: &Connection) -> Result<(), PomoError> {
    conn.execute_batch("ALTER TABLE completed_sessions ADD COLUMN linked_task TEXT;")
        .map_err(|e| PomoError::Database(format!("Migration v2 failed: {e}")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_migrations() {
        let conn = Connection::open_in_memory().unwrap();

        run(&conn).unwrap();
        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);

        conn.execute(
            "INSERT INTO completed_sessions
             (recorded_at, work_seconds, short_break_seconds, long_break_seconds,
              sessions_until_long_break, completed_sessions, total_focus_seconds,
              focus_seconds, linked_task)
             VALUES ('2024-01-01T10:00:00Z', 1500, 300, 900, 4, 1, 1500, 1500, 'abc')",
            [],
        )
        .unwrap();
    }

    #[test]
    fn test_migration_idempotent() {
        let conn = Connection::open_in_memory().unwrap();

        run(&conn).unwrap();
        run(&conn).unwrap();

        assert_eq!(get_version(&conn).unwrap(), CURRENT_VERSION);
    }

    #[test]
    fn test_upgrade_from_v1() {
        let conn = Connection::open_in_memory().unwrap();
        migrate_v1(&conn).unwrap();
        set_version(&conn, 1).unwrap();

        run(&conn).unwrap();

        assert_eq!(get_version(&conn).unwrap(), 2);
        let has_column: bool = conn
            .prepare("SELECT linked_task FROM completed_sessions")
            .is_ok();
        assert!(has_column);
    }

    #[test]
    fn test_get_version_new_database() {
        let conn = Connection::open_in_memory().unwrap();
        assert_eq!(get_version(&conn).unwrap(), 0);
    }
}
