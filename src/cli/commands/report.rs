//! Focus report command.

use crate::cli::args::OutputFormat;
use crate::cli::commands::{load_records, to_json};
use crate::config::{Config, Paths};
use crate::error::PomoError;
use crate::history::{FocusReport, ReportPeriod};

/// Execute the report command.
///
/// # Errors
///
/// Returns an error if the period is unknown, the history store cannot be
/// read, or output formatting fails.
pub fn report(
    paths: &Paths,
    config: &Config,
    period: &str,
    format: OutputFormat,
) -> Result<String, PomoError> {
    let period: ReportPeriod = period.parse()?;
    let records = load_records(paths, config)?;
    let report = FocusReport::generate(&records, period);

    match format {
        OutputFormat::Json => to_json(&report),
        OutputFormat::Pretty => Ok(report.format()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StorageBackend;
    use tempfile::TempDir;

    fn memory_config() -> Config {
        let mut config = Config::default();
        config.storage.backend = StorageBackend::Memory;
        config
    }

    #[test]
    fn test_unknown_period() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::with_root(temp_dir.path().to_path_buf());
        let err = report(&paths, &memory_config(), "decade", OutputFormat::Pretty).unwrap_err();
        assert!(matches!(err, PomoError::Parse(_)));
    }

    #[test]
    fn test_empty_report_json() {
        let temp_dir = TempDir::new().unwrap();
        let paths = Paths::with_root(temp_dir.path().to_path_buf());
        let json = report(&paths, &memory_config(), "week", OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["period"], "This Week");
        assert_eq!(value["completed_sessions"], 0);
    }
}
