use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimerStatus {
    #[default]
    Idle,
    Running,
    Paused,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TimerMode {
    #[default]
    Focus,
    Break,
}

impl TimerMode {
    pub fn flipped(self) -> Self {
        match self {
            TimerMode::Focus => TimerMode::Break,
            TimerMode::Break => TimerMode::Focus,
        }
    }
}

/// The timer record. Only `total_time_ms` and the timestamps are
/// authoritative; `display_time_secs` is a cache for rendering.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct TimerState {
    /// Anchor of the current running interval. Always set while running.
    pub start_time: Option<DateTime<Utc>>,
    /// Break countdown target. Left over from the last break while focusing.
    pub end_time: Option<DateTime<Utc>>,
    /// Accumulated focus time, or the break budget once a focus cycle stops.
    pub total_time_ms: i64,
    pub display_time_secs: i64,
    pub mode: TimerMode,
    pub status: TimerStatus,
    /// Break alarm queued by the last break start, until it rings or is dismissed.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alarm_id: Option<String>,
}

impl TimerState {
    pub fn is_running(&self) -> bool {
        self.status == TimerStatus::Running
    }

    pub(crate) fn refresh_display(&mut self, ms: i64) {
        self.display_time_secs = ms.div_euclid(1000);
    }
}
