//! Row shapes exchanged with the [`Store`](super::Store).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub type UserId = String;

/// One persisted focus interval.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogRow {
    pub id: i64,
    pub user_id: UserId,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub task_id: Option<i64>,
    pub task_name: Option<String>,
    /// Only present when an external writer scored the session;
    /// the timer never writes one.
    pub focus_score: Option<f64>,
    pub created_at: DateTime<Utc>,
}

impl LogRow {
    /// Length of the interval in minutes, 0 for open-ended rows.
    pub fn duration_min(&self) -> f64 {
        self.end_time
            .map(|end| (end - self.start_time).num_milliseconds() as f64 / 60_000.0)
            .unwrap_or(0.0)
    }
}

/// Insert payload for the `logs` table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewLog {
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub task_id: Option<i64>,
    pub task_name: Option<String>,
    #[serde(default)]
    pub focus_score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskRow {
    pub id: i64,
    pub user_id: UserId,
    pub name: String,
    pub completed: bool,
    pub created_at: DateTime<Utc>,
}

/// Filter for [`Store::tasks`](super::Store::tasks). Results are always
/// newest-first.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub completed: Option<bool>,
    pub limit: Option<usize>,
}

impl TaskFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn open() -> Self {
        Self {
            completed: Some(false),
            limit: None,
        }
    }

    pub fn completed(limit: usize) -> Self {
        Self {
            completed: Some(true),
            limit: Some(limit),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum FocusMode {
    Deep,
    #[default]
    Balanced,
    Light,
}

/// Per-user preferences read by the microagents.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// Minutes.
    pub work_duration: u32,
    pub break_duration: u32,
    pub long_break_duration: u32,
    pub sessions_before_long_break: u32,
    pub auto_start_breaks: bool,
    pub auto_start_work: bool,
    pub notification_sound: bool,
    pub focus_mode: FocusMode,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            work_duration: 25,
            break_duration: 5,
            long_break_duration: 15,
            sessions_before_long_break: 4,
            auto_start_breaks: true,
            auto_start_work: false,
            notification_sound: true,
            focus_mode: FocusMode::Balanced,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn duration_of_open_row_is_zero() {
        let start = Utc::now();
        let mut row = LogRow {
            id: 1,
            user_id: "u".into(),
            start_time: start,
            end_time: None,
            task_id: None,
            task_name: None,
            focus_score: None,
            created_at: start,
        };
        assert_eq!(row.duration_min(), 0.0);
        row.end_time = Some(start + Duration::seconds(90));
        assert_eq!(row.duration_min(), 1.5);
    }

    #[test]
    fn preferences_parse_focus_mode_lowercase() {
        let json = serde_json::to_value(UserPreferences::default()).unwrap();
        assert_eq!(json["focus_mode"], "balanced");
    }
}
