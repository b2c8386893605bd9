use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use clap_complete::Shell;
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "pomo")]
#[command(about = "A Pomodoro timer for the terminal")]
#[command(long_about = "pomo - A Pomodoro timer for the terminal

Runs work sessions and breaks in a fixed rotation: work, short break, work,
short break, ... with a long break every few completed sessions. Finished
work sessions are kept in a local history for reports.

QUICK START:
  pomo run                  Start the interactive timer
  pomo run --work 50m       Use 50 minute work sessions
  pomo plan                 Show the upcoming rotation
  pomo report --period week Focus statistics for the last 7 days

OUTPUT FORMATS:
  --output pretty    Human-readable colored output (default)
  --output json      Machine-readable JSON for scripting")]
#[command(version, propagate_version = true)]
pub struct Cli {
    /// Output format for command results
    ///
    /// Defaults to `general.default_output` from the config file.
    #[arg(short, long, value_enum, global = true)]
    pub output: Option<OutputFormat>,

    /// Data directory (config, history)
    #[arg(long, global = true, env = "POMO_HOME", value_name = "DIR")]
    pub home: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Commands,
}

/// Output format for command results.
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// Human-readable colored output.
    #[default]
    Pretty,
    /// Machine-readable JSON output.
    Json,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the interactive timer
    ///
    /// Keys: space start/pause, s stop, r reset, q quit.
    ///
    /// # Examples
    ///
    ///   pomo run
    ///   pomo run --work 50m --short-break 10m
    ///   pomo run --task "write report"
    #[command(alias = "r")]
    Run(RunArgs),

    /// Show the upcoming session rotation
    ///
    /// Lists which session type follows each completed count with the
    /// configured durations.
    Plan {
        /// Number of sessions to show
        #[arg(long, short = 'n', default_value = "8")]
        count: u32,
    },

    /// List completed work sessions
    #[command(alias = "h")]
    History {
        /// Maximum number of sessions to show (newest first)
        #[arg(long, short = 'l', default_value = "10")]
        limit: usize,
    },

    /// Show focus statistics
    Report {
        /// Period: today, week, month, all
        #[arg(long, short = 'p', default_value = "today")]
        period: String,
    },

    /// Manage configuration
    Config(ConfigArgs),

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Arguments for `pomo run`.
#[derive(Args, Debug, Default)]
pub struct RunArgs {
    /// Work session length (e.g., 25m, 1h, 50)
    #[arg(long, short = 'w')]
    pub work: Option<String>,

    /// Short break length
    #[arg(long)]
    pub short_break: Option<String>,

    /// Long break length
    #[arg(long)]
    pub long_break: Option<String>,

    /// Completed sessions between long breaks
    #[arg(long)]
    pub long_break_every: Option<u32>,

    /// Label recorded with each completed work session
    #[arg(long, short = 't')]
    pub task: Option<String>,

    /// Do not read or write the session history
    #[arg(long)]
    pub no_history: bool,
}

/// Arguments for `pomo config`.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommands,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write a default config file
    Init {
        /// Overwrite an existing file
        #[arg(long, short = 'f')]
        force: bool,
    },

    /// Change session durations (minutes)
    SetTimer {
        /// Work session minutes
        #[arg(long)]
        work: Option<u32>,

        /// Short break minutes
        #[arg(long)]
        short_break: Option<u32>,

        /// Long break minutes
        #[arg(long)]
        long_break: Option<u32>,

        /// Completed sessions between long breaks
        #[arg(long)]
        long_break_every: Option<u32>,
    },
}
