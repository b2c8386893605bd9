//! Error types for pomo.

use thiserror::Error;

/// Errors produced by the session engine, its stores and the CLI.
#[derive(Debug, Error)]
pub enum PomoError {
    /// A session configuration was rejected.
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// The completed-session log could not be read or written.
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// `SQLite` failure.
    #[error("Database error: {0}")]
    Database(String),

    /// Configuration file or path problem.
    #[error("Config error: {0}")]
    Config(String),

    /// Input that could not be parsed (durations, periods, ...).
    #[error("Parse error: {0}")]
    Parse(String),

    /// Underlying I/O failure.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization failure.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl PomoError {
    /// Whether the error came from a store rather than from the caller's input.
    #[must_use]
    pub const fn is_storage(&self) -> bool {
        matches!(self, Self::Persistence(_) | Self::Database(_) | Self::Io(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let err = PomoError::InvalidConfiguration("work must be positive".to_string());
        assert_eq!(err.to_string(), "Invalid configuration: work must be positive");
    }

    #[test]
    fn test_is_storage() {
        assert!(PomoError::Database("locked".to_string()).is_storage());
        assert!(PomoError::Persistence("disk full".to_string()).is_storage());
        assert!(!PomoError::Parse("bad".to_string()).is_storage());
    }

    #[test]
    fn test_from_io() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: PomoError = io.into();
        assert!(matches!(err, PomoError::Io(_)));
    }
}
