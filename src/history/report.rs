//! Focus reports built from the completed-session history.

use std::collections::HashMap;
use std::str::FromStr;

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone};
use serde::{Deserialize, Serialize};

use crate::engine::timer::format_duration;
use crate::engine::CompletedSessionRecord;
use crate::error::PomoError;

/// Report time period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportPeriod {
    /// Today only
    Today,
    /// Last 7 days
    Week,
    /// Last 30 days
    Month,
    /// All time
    AllTime,
}

impl ReportPeriod {
    /// First local date included in the period, `None` for all time.
    #[must_use]
    pub fn start_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Today => Some(today),
            Self::Week => Some(today - Duration::days(6)),
            Self::Month => Some(today - Duration::days(29)),
            Self::AllTime => None,
        }
    }

    /// Get display name.
    #[must_use]
    pub const fn display_name(&self) -> &'static str {
        match self {
            Self::Today => "Today",
            Self::Week => "This Week",
            Self::Month => "This Month",
            Self::AllTime => "All Time",
        }
    }
}

impl FromStr for ReportPeriod {
    type Err = PomoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "today" | "t" | "d" => Ok(Self::Today),
            "week" | "w" | "7d" => Ok(Self::Week),
            "month" | "m" | "30d" => Ok(Self::Month),
            "all" | "alltime" | "all-time" => Ok(Self::AllTime),
            other => Err(PomoError::Parse(format!(
                "unknown period '{other}' (expected today, week, month or all)"
            ))),
        }
    }
}

/// Focus report data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusReport {
    /// Report period name
    pub period: String,
    /// Work sessions completed in the period
    pub completed_sessions: usize,
    /// Total focus time in minutes
    pub total_minutes: i64,
    /// Average focus per session in minutes
    pub avg_session_minutes: f64,
    /// Work sessions completed today
    pub sessions_today: usize,
    /// Focus time today in minutes
    pub minutes_today: i64,
    /// Focus time by linked task
    pub by_task: Vec<TaskFocusTime>,
    /// Daily breakdown, newest first
    pub daily: Vec<DailyFocusTime>,
    /// Consecutive days with focus time, ending today or yesterday
    pub streak_days: i64,
}

/// Focus time per task.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskFocusTime {
    /// Task label, `None` for unlinked sessions
    pub task: Option<String>,
    /// Total focus minutes
    pub minutes: i64,
    /// Session count
    pub sessions: usize,
}

/// Focus time per day.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyFocusTime {
    /// Local date
    pub date: NaiveDate,
    /// Total focus minutes
    pub minutes: i64,
    /// Session count
    pub sessions: usize,
}

impl FocusReport {
    /// Generate a report for the given period as of now.
    #[must_use]
    pub fn generate(records: &[CompletedSessionRecord], period: ReportPeriod) -> Self {
        Self::generate_at(records, period, Local::now())
    }

    /// Generate a report relative to an explicit "now".
    #[must_use]
    pub fn generate_at<Tz: TimeZone>(
        records: &[CompletedSessionRecord],
        period: ReportPeriod,
        now: DateTime<Tz>,
    ) -> Self {
        let tz = now.timezone();
        let today = now.date_naive();
        let local_date = |r: &CompletedSessionRecord| r.recorded_at.with_timezone(&tz).date_naive();

        let start = period.start_date(today);
        let in_period: Vec<(NaiveDate, &CompletedSessionRecord)> = records
            .iter()
            .map(|r| (local_date(r), r))
            .filter(|(date, _)| *date <= today && start.map_or(true, |s| *date >= s))
            .collect();

        let total_seconds: i64 = in_period.iter().map(|(_, r)| r.focus_time.num_seconds()).sum();
        let completed_sessions = in_period.len();

        #[allow(clippy::cast_precision_loss)]
        let avg_session_minutes = if completed_sessions > 0 {
            total_seconds as f64 / 60.0 / completed_sessions as f64
        } else {
            0.0
        };

        let todays: Vec<_> = records.iter().filter(|r| local_date(r) == today).collect();
        let sessions_today = todays.len();
        let seconds_today: i64 = todays.iter().map(|r| r.focus_time.num_seconds()).sum();

        // Buckets sum whole seconds; minutes are taken once per bucket.
        let mut task_map: HashMap<Option<String>, (i64, usize)> = HashMap::new();
        let mut daily_map: HashMap<NaiveDate, (i64, usize)> = HashMap::new();
        for (date, record) in &in_period {
            let seconds = record.focus_time.num_seconds();

            let task = task_map.entry(record.linked_task.clone()).or_default();
            task.0 += seconds;
            task.1 += 1;

            let day = daily_map.entry(*date).or_default();
            day.0 += seconds;
            day.1 += 1;
        }

        let mut by_task: Vec<TaskFocusTime> = task_map
            .into_iter()
            .map(|(task, (seconds, sessions))| TaskFocusTime {
                task,
                minutes: seconds / 60,
                sessions,
            })
            .collect();
        by_task.sort_by(|a, b| b.minutes.cmp(&a.minutes).then_with(|| a.task.cmp(&b.task)));

        let mut daily: Vec<DailyFocusTime> = daily_map
            .into_iter()
            .map(|(date, (seconds, sessions))| DailyFocusTime {
                date,
                minutes: seconds / 60,
                sessions,
            })
            .collect();
        daily.sort_by(|a, b| b.date.cmp(&a.date));

        let mut dates: Vec<NaiveDate> = records.iter().map(local_date).collect();
        dates.sort_unstable();
        dates.dedup();

        Self {
            period: period.display_name().to_string(),
            completed_sessions,
            total_minutes: total_seconds / 60,
            avg_session_minutes,
            sessions_today,
            minutes_today: seconds_today / 60,
            by_task,
            daily,
            streak_days: calculate_streak(&dates, today),
        }
    }

    /// Format the report for display.
    #[must_use]
    pub fn format(&self) -> String {
        let mut lines = Vec::new();

        lines.push(format!("Focus Report: {}", self.period));
        lines.push("═".repeat(50));
        lines.push(String::new());

        lines.push("Summary".to_string());
        lines.push("─".repeat(40));
        lines.push(format!(
            "  Total focus time:    {}",
            format_duration(Duration::minutes(self.total_minutes))
        ));
        lines.push(format!("  Completed sessions:  {}", self.completed_sessions));
        lines.push(format!(
            "  Average session:     {:.0} minutes",
            self.avg_session_minutes
        ));
        lines.push(format!(
            "  Today:               {} sessions, {}",
            self.sessions_today,
            format_duration(Duration::minutes(self.minutes_today))
        ));
        lines.push(format!("  Current streak:      {} days", self.streak_days));

        if !self.by_task.is_empty() {
            lines.push(String::new());
            lines.push("Top Tasks".to_string());
            lines.push("─".repeat(40));

            for task in self.by_task.iter().take(5) {
                let name = task.task.as_deref().unwrap_or("(No Task)");
                let name: String = if name.chars().count() > 25 {
                    format!("{}...", name.chars().take(22).collect::<String>())
                } else {
                    name.to_string()
                };
                lines.push(format!(
                    "  {:<25} {:>4}m ({} sessions)",
                    name, task.minutes, task.sessions
                ));
            }
        }

        if !self.daily.is_empty() {
            lines.push(String::new());
            lines.push("Recent Days".to_string());
            lines.push("─".repeat(40));

            for day in self.daily.iter().take(7) {
                lines.push(format!(
                    "  {} {:>4}m ({} sessions)",
                    day.date, day.minutes, day.sessions
                ));
            }
        }

        lines.join("\n")
    }
}

/// Count consecutive days ending today (or yesterday) present in `dates`.
fn calculate_streak(dates: &[NaiveDate], today: NaiveDate) -> i64 {
    let has = |d: &NaiveDate| dates.binary_search(d).is_ok();

    let mut check_date = today;
    if !has(&check_date) {
        check_date = today - Duration::days(1);
    }

    let mut streak = 0;
    while has(&check_date) {
        streak += 1;
        check_date -= Duration::days(1);
    }

    streak
}
