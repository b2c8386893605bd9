use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;

use pomo::cli::args::{Cli, Commands};
use pomo::cli::commands;
use pomo::config::{Config, Paths};

fn main() {
    if let Err(e) = run() {
        eprintln!("{}: {:#}", "error".red().bold(), e);
        std::process::exit(1);
    }
}

fn init_tracing(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_level))
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn run() -> Result<()> {
    let cli = Cli::parse();

    let paths = Paths::resolve(cli.home).context("resolving the pomo data directory")?;
    let config = Config::load_from_path(&paths.config_file)?;
    init_tracing(&config.general.log_level);

    let format = cli.output.unwrap_or(config.general.default_output);
    tracing::debug!(root = %paths.root.display(), ?format, "starting");

    let output = match cli.command {
        Commands::Run(args) => commands::run(&paths, &config, args, format)?,
        Commands::Plan { count } => commands::plan(&config, count, format)?,
        Commands::History { limit } => commands::history(&paths, &config, limit, format)?,
        Commands::Report { period } => commands::report(&paths, &config, &period, format)?,
        Commands::Config(args) => commands::config(&paths, config, args.command, format)?,
        Commands::Completions { shell } => commands::completions(shell)?,
    };

    if !output.is_empty() {
        println!("{output}");
    }
    Ok(())
}
