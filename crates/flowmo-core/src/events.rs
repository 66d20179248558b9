use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::timer::{TimerMode, TimerStatus};

/// Every timer transition produces zero or more Events.
/// The CLI prints them; `LogRecorded` is the stats-refresh trigger.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    TimerStarted {
        mode: TimerMode,
        /// Break countdown target; absent for focus cycles.
        end_time: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
    TimerPaused {
        total_time_ms: i64,
        at: DateTime<Utc>,
    },
    TimerResumed {
        total_time_ms: i64,
        at: DateTime<Utc>,
    },
    TimerStopped {
        from: TimerMode,
        to: TimerMode,
        break_ratio: f64,
        total_time_ms: i64,
        at: DateTime<Utc>,
    },
    /// Stop issued while paused: the paused focus time becomes the break
    /// budget without writing a log.
    PauseDiscarded {
        from: TimerMode,
        to: TimerMode,
        break_ratio: f64,
        total_time_ms: i64,
        at: DateTime<Utc>,
    },
    /// A break countdown reached zero on tick.
    BreakElapsed {
        at: DateTime<Utc>,
    },
    LogRecorded {
        log_id: i64,
        start_time: DateTime<Utc>,
        end_time: DateTime<Utc>,
        task_id: Option<i64>,
        task_name: Option<String>,
    },
    LogSkipped {
        reason: LogSkipReason,
    },
    LogFailed {
        error: String,
        at: DateTime<Utc>,
    },
    StateSnapshot {
        status: TimerStatus,
        mode: TimerMode,
        total_time_ms: i64,
        display_time_secs: i64,
        start_time: Option<DateTime<Utc>>,
        end_time: Option<DateTime<Utc>>,
        at: DateTime<Utc>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogSkipReason {
    Unauthenticated,
    BreakMode,
    NotStarted,
}
