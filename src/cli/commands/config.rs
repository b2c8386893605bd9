//! Configuration commands.

use colored::Colorize;

use crate::cli::args::{ConfigCommands, OutputFormat};
use crate::cli::commands::to_json;
use crate::config::{Config, Paths};
use crate::error::PomoError;

/// Execute config subcommands.
///
/// # Errors
///
/// Returns an error if the config file cannot be read or written, or the
/// new timer settings are invalid.
pub fn config(
    paths: &Paths,
    config: Config,
    cmd: ConfigCommands,
    format: OutputFormat,
) -> Result<String, PomoError> {
    match cmd {
        ConfigCommands::Show => show(paths, &config, format),
        ConfigCommands::Init { force } => init(paths, force),
        ConfigCommands::SetTimer {
            work,
            short_break,
            long_break,
            long_break_every,
        } => {
            let mut updated = config;
            if let Some(minutes) = work {
                updated.timer.work_minutes = minutes;
            }
            if let Some(minutes) = short_break {
                updated.timer.short_break_minutes = minutes;
            }
            if let Some(minutes) = long_break {
                updated.timer.long_break_minutes = minutes;
            }
            if let Some(n) = long_break_every {
                updated.timer.sessions_until_long_break = n;
            }
            set_timer(paths, &updated, format)
        }
    }
}

fn show(paths: &Paths, config: &Config, format: OutputFormat) -> Result<String, PomoError> {
    match format {
        OutputFormat::Json => to_json(config),
        OutputFormat::Pretty => {
            let mut output = Vec::new();
            output.push(format!("# {}", paths.config_file.display()).dimmed().to_string());
            output.push(config.to_yaml()?.trim_end().to_string());
            Ok(output.join("\n"))
        }
    }
}

fn init(paths: &Paths, force: bool) -> Result<String, PomoError> {
    if paths.config_file.exists() && !force {
        return Err(PomoError::Config(format!(
            "Config file already exists: {}\nUse --force to overwrite.",
            paths.config_file.display()
        )));
    }

    Config::default().save_to_path(&paths.config_file)?;
    tracing::info!(path = %paths.config_file.display(), "wrote default config");
    Ok(format!(
        "{} {}",
        "Created".green(),
        paths.config_file.display()
    ))
}

fn set_timer(paths: &Paths, config: &Config, format: OutputFormat) -> Result<String, PomoError> {
    config.timer.to_session_config()?;
    config.save_to_path(&paths.config_file)?;

    match format {
        OutputFormat::Json => to_json(&config.timer),
        OutputFormat::Pretty => Ok(format!(
            "{} work {}m, short break {}m, long break {}m, long break every {} sessions",
            "Timer updated:".green(),
            config.timer.work_minutes,
            config.timer.short_break_minutes,
            config.timer.long_break_minutes,
            config.timer.sessions_until_long_break
        )),
    }
}
