//! Interactive timer.
//!
//! Drives a [`SessionEngine`] on the system clock and maps single keypresses
//! to engine commands. The countdown is redrawn in place on one line.

use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver};

use colored::Colorize;
use crossterm::{
    cursor,
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute, queue,
    terminal::{disable_raw_mode, enable_raw_mode, Clear, ClearType},
};
use serde::Serialize;

use crate::cli::args::{OutputFormat, RunArgs};
use crate::cli::commands::to_json;
use crate::config::{Config, Paths, StorageBackend};
use crate::engine::{
    format_duration, format_duration_mmss, parse_duration, EngineEvent, EngineSnapshot,
    SessionConfig, SessionEngine, SessionType, SystemClock, TimerQueue, TimerState,
};
use crate::error::PomoError;
use crate::history::{MemoryLog, SessionLog};

/// Longest wait between redraws when no timer is armed.
const IDLE_POLL: std::time::Duration = std::time::Duration::from_millis(500);

type LiveEngine = SessionEngine<TimerQueue<SystemClock>, Box<dyn SessionLog>>;

/// What a keypress asks the engine to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyCommand {
    /// Start when stopped, pause when running
    Toggle,
    /// Abandon the current countdown
    Stop,
    /// Restart the rotation
    Reset,
    /// Leave the timer
    Quit,
}

/// Summary printed when the timer exits.
#[derive(Debug, Clone, Serialize)]
pub struct RunSummary {
    /// Sessions of any type completed during this run
    pub completed_this_run: usize,
    /// Work sessions completed during this run
    pub work_sessions_this_run: usize,
    /// Engine state at exit
    pub last: EngineSnapshot,
    /// Persistence problems seen during the run
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub warnings: Vec<String>,
}

/// Map a key event to a command.
#[must_use]
pub fn key_command(key: &KeyEvent) -> Option<KeyCommand> {
    if key.kind != KeyEventKind::Press {
        return None;
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return Some(KeyCommand::Quit);
    }

    match key.code {
        KeyCode::Char(' ' | 'p') | KeyCode::Enter => Some(KeyCommand::Toggle),
        KeyCode::Char('s') => Some(KeyCommand::Stop),
        KeyCode::Char('r') => Some(KeyCommand::Reset),
        KeyCode::Char('q') | KeyCode::Esc => Some(KeyCommand::Quit),
        _ => None,
    }
}

/// Render the one-line status shown while the timer runs.
#[must_use]
pub fn render_status(snapshot: &EngineSnapshot) -> String {
    let label = format!("[{}]", snapshot.session_type.display_name());
    let label = match snapshot.session_type {
        SessionType::Work => label.green().bold(),
        SessionType::ShortBreak => label.cyan().bold(),
        SessionType::LongBreak => label.blue().bold(),
    };

    let state = match snapshot.state {
        TimerState::Idle => "idle".dimmed(),
        TimerState::Running => "running".green(),
        TimerState::Paused => "paused".yellow(),
        TimerState::Completed => "done".bold(),
    };

    let mut line = format!(
        "{} {} {} {}",
        label,
        format_duration_mmss(snapshot.remaining()),
        progress_bar(snapshot.progress_fraction(), 20),
        state
    );
    line.push_str(&format!(
        "  #{} {}",
        snapshot.progress.completed_sessions,
        format_duration(snapshot.progress.total_focus_time).dimmed()
    ));
    if let Some(task) = &snapshot.linked_task {
        line.push_str(&format!("  {}", task.italic()));
    }
    line
}

fn progress_bar(fraction: f64, width: usize) -> String {
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    let filled = ((fraction.clamp(0.0, 1.0) * width as f64).round() as usize).min(width);
    format!("{}{}", "█".repeat(filled), "░".repeat(width - filled))
}

/// Restores the terminal when dropped, on every exit path.
struct TerminalGuard<F: FnMut()> {
    restore: F,
}

impl<F: FnMut()> Drop for TerminalGuard<F> {
    fn drop(&mut self) {
        (self.restore)();
    }
}

/// Switch the terminal into timer mode. The guard exists before the second
/// step runs, so a failure there still restores the terminal.
fn enter_terminal<F: FnMut()>(
    enable: impl FnOnce() -> io::Result<()>,
    hide_cursor: impl FnOnce() -> io::Result<()>,
    restore: F,
) -> Result<TerminalGuard<F>, PomoError> {
    enable()?;
    let guard = TerminalGuard { restore };
    hide_cursor()?;
    Ok(guard)
}

fn restore_terminal() {
    disable_raw_mode().ok();
    execute!(io::stdout(), cursor::Show).ok();
}

/// Open the history store for a run.
///
/// A store that cannot be opened is replaced by an in-memory one; the
/// returned message explains what happened.
fn open_log(
    paths: &Paths,
    backend: StorageBackend,
    no_history: bool,
) -> (Box<dyn SessionLog>, Option<String>) {
    if no_history {
        return (Box::new(MemoryLog::new()), None);
    }

    match backend.open(paths) {
        Ok(log) => (log, None),
        Err(e) => {
            tracing::warn!(error = %e, "history store unavailable, keeping sessions in memory");
            (
                Box::new(MemoryLog::new()),
                Some(format!(
                    "History store unavailable, sessions from this run are not saved: {e}"
                )),
            )
        }
    }
}

/// Apply command-line overrides on top of the configured timer.
///
/// # Errors
///
/// Returns an error if a duration cannot be parsed or the result is invalid.
pub fn session_config(config: &Config, args: &RunArgs) -> Result<SessionConfig, PomoError> {
    let mut session = SessionConfig::new(
        chrono::Duration::minutes(i64::from(config.timer.work_minutes)),
        chrono::Duration::minutes(i64::from(config.timer.short_break_minutes)),
        chrono::Duration::minutes(i64::from(config.timer.long_break_minutes)),
        config.timer.sessions_until_long_break,
    );

    if let Some(work) = &args.work {
        session.work = parse_duration(work)?;
    }
    if let Some(short_break) = &args.short_break {
        session.short_break = parse_duration(short_break)?;
    }
    if let Some(long_break) = &args.long_break {
        session.long_break = parse_duration(long_break)?;
    }
    if let Some(n) = args.long_break_every {
        session.sessions_until_long_break = n;
    }

    session.validate()?;
    Ok(session)
}

/// Execute the run command.
///
/// # Errors
///
/// Returns an error if the configuration is invalid or the terminal cannot
/// be driven.
pub fn run(
    paths: &Paths,
    config: &Config,
    args: RunArgs,
    format: OutputFormat,
) -> Result<String, PomoError> {
    let session = session_config(config, &args)?;

    let (log, store_warning) = open_log(paths, config.storage.backend, args.no_history);
    if let Some(warning) = &store_warning {
        eprintln!("{} {}", "warning:".yellow().bold(), warning);
    }

    let mut engine: LiveEngine =
        SessionEngine::new(session, TimerQueue::new(SystemClock::new()), log)?;
    engine.link_task(args.task);

    let (tx, rx) = mpsc::channel();
    engine.subscribe(tx);

    println!(
        "{}",
        "space start/pause  s stop  r reset  q quit".dimmed()
    );

    let guard = enter_terminal(
        enable_raw_mode,
        || execute!(io::stdout(), cursor::Hide),
        restore_terminal,
    )?;
    let result = run_loop(&mut engine, &rx, &mut io::stdout());
    drop(guard);
    println!();

    engine.flush_pending();
    let (completed_this_run, work_sessions_this_run) = result?;
    let mut warnings: Vec<String> = store_warning.into_iter().collect();
    warnings.extend(engine.take_warnings());
    let summary = RunSummary {
        completed_this_run,
        work_sessions_this_run,
        last: engine.snapshot(),
        warnings,
    };
    tracing::debug!(completed = completed_this_run, "timer closed");

    match format {
        OutputFormat::Json => to_json(&summary),
        OutputFormat::Pretty => Ok(format_summary(&summary)),
    }
}

/// Event loop. Returns (all completions, work completions).
fn run_loop<W: Write>(
    engine: &mut LiveEngine,
    rx: &Receiver<EngineEvent>,
    out: &mut W,
) -> Result<(usize, usize), PomoError> {
    let mut completed = 0;
    let mut work = 0;

    loop {
        draw(out, &engine.snapshot())?;
        engine.flush_pending();

        let timeout = engine
            .scheduler()
            .time_until_next()
            .map_or(IDLE_POLL, |t| t.min(IDLE_POLL));

        if event::poll(timeout)? {
            if let Event::Key(key) = event::read()? {
                match key_command(&key) {
                    Some(KeyCommand::Quit) => break,
                    Some(KeyCommand::Toggle) => {
                        if engine.state() == TimerState::Running {
                            engine.pause();
                        } else {
                            engine.start();
                        }
                    }
                    Some(KeyCommand::Stop) => engine.stop(),
                    Some(KeyCommand::Reset) => engine.reset(),
                    None => {}
                }
            }
        }

        engine.run_due();

        for event in rx.try_iter() {
            match event {
                EngineEvent::SessionCompleted(session_type) => {
                    completed += 1;
                    if session_type == SessionType::Work {
                        work += 1;
                    }
                    let next = engine.session_type();
                    queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
                    write!(
                        out,
                        "{} {} complete, next: {}\x07\r\n",
                        "✓".green().bold(),
                        session_type,
                        next
                    )?;
                }
                EngineEvent::PersistenceFailed(message) => {
                    queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
                    write!(
                        out,
                        "{} {}\r\n",
                        "warning:".yellow().bold(),
                        message
                    )?;
                }
                _ => {}
            }
        }
    }

    Ok((completed, work))
}

fn draw<W: Write>(out: &mut W, snapshot: &EngineSnapshot) -> Result<(), PomoError> {
    queue!(out, cursor::MoveToColumn(0), Clear(ClearType::CurrentLine))?;
    write!(out, "{}", render_status(snapshot))?;
    out.flush()?;
    Ok(())
}

fn format_summary(summary: &RunSummary) -> String {
    let mut output = Vec::new();

    output.push(format!(
        "{} {} sessions completed ({} work)",
        "Done.".bold(),
        summary.completed_this_run,
        summary.work_sessions_this_run
    ));
    output.push(format!(
        "   Total focus: {}",
        format_duration(summary.last.progress.total_focus_time)
    ));
    output.push(format!("   Next session: {}", summary.last.session_type));

    for warning in &summary.warnings {
        output.push(format!("{} {}", "warning:".yellow().bold(), warning));
    }

    output.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::SessionProgress;
    use chrono::Duration;
    use crossterm::event::KeyEventState;

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    fn snapshot(state: TimerState, remaining_seconds: i64) -> EngineSnapshot {
        EngineSnapshot {
            state,
            session_type: SessionType::Work,
            remaining_seconds,
            progress: SessionProgress::default(),
            config: SessionConfig::default(),
            linked_task: Some("essay".to_string()),
        }
    }

    #[test]
    fn test_key_command_mapping() {
        assert_eq!(key_command(&key(KeyCode::Char(' '))), Some(KeyCommand::Toggle));
        assert_eq!(key_command(&key(KeyCode::Char('s'))), Some(KeyCommand::Stop));
        assert_eq!(key_command(&key(KeyCode::Char('r'))), Some(KeyCommand::Reset));
        assert_eq!(key_command(&key(KeyCode::Char('q'))), Some(KeyCommand::Quit));
        assert_eq!(key_command(&key(KeyCode::Char('x'))), None);

        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        assert_eq!(key_command(&ctrl_c), Some(KeyCommand::Quit));
    }

    #[test]
    fn test_key_release_ignored() {
        let release = KeyEvent::new_with_kind_and_state(
            KeyCode::Char('q'),
            KeyModifiers::NONE,
            KeyEventKind::Release,
            KeyEventState::NONE,
        );
        assert_eq!(key_command(&release), None);
    }

    #[test]
    fn test_render_status() {
        let line = render_status(&snapshot(TimerState::Running, 24 * 60 + 59));
        assert!(line.contains("Work"));
        assert!(line.contains("24:59"));
        assert!(line.contains("running"));
        assert!(line.contains("essay"));
    }

    #[test]
    fn test_progress_bar_bounds() {
        assert_eq!(progress_bar(0.0, 4), "░░░░");
        assert_eq!(progress_bar(0.5, 4), "██░░");
        assert_eq!(progress_bar(2.0, 4), "████");
    }

    #[test]
    fn test_session_config_overrides() {
        let args = RunArgs {
            work: Some("50m".to_string()),
            long_break_every: Some(3),
            ..RunArgs::default()
        };
        let session = session_config(&Config::default(), &args).unwrap();
        assert_eq!(session.work, Duration::minutes(50));
        assert_eq!(session.short_break, Duration::minutes(5));
        assert_eq!(session.sessions_until_long_break, 3);
    }

    #[test]
    fn test_session_config_rejects_bad_duration() {
        let args = RunArgs {
            short_break: Some("soon".to_string()),
            ..RunArgs::default()
        };
        assert!(matches!(
            session_config(&Config::default(), &args),
            Err(PomoError::Parse(_))
        ));
    }

    #[test]
    fn test_terminal_restored_when_setup_fails_midway() {
        let restored = std::cell::Cell::new(0);

        let result = enter_terminal(
            || Ok(()),
            || Err(io::Error::new(io::ErrorKind::Other, "no cursor")),
            || restored.set(restored.get() + 1),
        );
        assert!(matches!(result, Err(PomoError::Io(_))));
        assert_eq!(restored.get(), 1);
    }

    #[test]
    fn test_terminal_untouched_when_enable_fails() {
        let restored = std::cell::Cell::new(0);

        let result = enter_terminal(
            || Err(io::Error::new(io::ErrorKind::Other, "not a tty")),
            || Ok(()),
            || restored.set(restored.get() + 1),
        );
        assert!(result.is_err());
        assert_eq!(restored.get(), 0);
    }

    #[test]
    fn test_terminal_restored_on_drop() {
        let restored = std::cell::Cell::new(0);
        {
            let _guard = enter_terminal(|| Ok(()), || Ok(()), || restored.set(restored.get() + 1))
                .unwrap();
            assert_eq!(restored.get(), 0);
        }
        assert_eq!(restored.get(), 1);
    }

    #[test]
    fn test_unusable_store_falls_back_to_memory() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let paths = Paths::with_root(temp_dir.path().to_path_buf());
        std::fs::write(&paths.database, "not a database ".repeat(100)).unwrap();

        let (log, warning) = open_log(&paths, StorageBackend::Sqlite, false);
        assert!(log.load_all().unwrap().is_empty());
        assert!(warning.unwrap().contains("History store unavailable"));
    }

    #[test]
    fn test_no_history_skips_store() {
        let temp_dir = tempfile::TempDir::new().unwrap();
        let paths = Paths::with_root(temp_dir.path().join(".pomo"));

        let (_log, warning) = open_log(&paths, StorageBackend::Sqlite, true);
        assert!(warning.is_none());
        assert!(!paths.root.exists());
    }

    #[test]
    fn test_summary_lists_warnings() {
        let summary = RunSummary {
            completed_this_run: 2,
            work_sessions_this_run: 1,
            last: snapshot(TimerState::Idle, 300),
            warnings: vec!["Failed to save completed session: disk full".to_string()],
        };
        let text = format_summary(&summary);
        assert!(text.contains("2 sessions completed (1 work)"));
        assert!(text.contains("disk full"));
    }
}
