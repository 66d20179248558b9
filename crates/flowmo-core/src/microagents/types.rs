use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Timelike, Utc};
use serde::{Deserialize, Serialize};

use super::analytics::Insight;
use super::tasks::TaskInsights;
use crate::storage::{LogRow, Store, UserPreferences};
use crate::task::FocusingTask;

/// A past work interval as the agents see it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkSession {
    pub id: String,
    pub start_time: DateTime<Utc>,
    /// Absent for sessions that never closed.
    pub end_time: Option<DateTime<Utc>>,
    pub task_id: Option<String>,
    pub task_name: Option<String>,
    pub focus_score: Option<f64>,
    pub interruptions: u32,
    pub completed: bool,
}

impl WorkSession {
    /// Interruptions and completion are not tracked by the log store and
    /// stay at their defaults.
    pub fn from_log(row: &LogRow) -> Self {
        Self {
            id: row.id.to_string(),
            start_time: row.start_time,
            end_time: row.end_time,
            task_id: row.task_id.map(|id| id.to_string()),
            task_name: row.task_name.clone(),
            focus_score: row.focus_score,
            interruptions: 0,
            completed: false,
        }
    }

    pub fn duration(&self) -> Duration {
        self.end_time
            .map(|end| end - self.start_time)
            .unwrap_or_else(Duration::zero)
    }
}

/// Read-only input shared by every agent in one aggregation call.
pub struct MicroagentContext<'a> {
    pub store: &'a dyn Store,
    pub user_id: String,
    pub current_task: Option<FocusingTask>,
    /// Newest-first.
    pub work_session_history: Vec<WorkSession>,
    pub user_preferences: UserPreferences,
    /// Captured once so all agents agree on "now".
    pub now: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FocusRecommendationType {
    TaskPrioritization,
    TimeBlocking,
    DistractionAvoidance,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FocusRecommendation {
    #[serde(rename = "type")]
    pub kind: FocusRecommendationType,
    pub message: String,
    pub confidence: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakRecommendationType {
    MicroBreak,
    StretchBreak,
    EyeBreak,
    MentalBreak,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BreakRecommendation {
    #[serde(rename = "type")]
    pub kind: BreakRecommendationType,
    pub message: String,
    /// Minutes.
    pub duration: u32,
    pub confidence: f64,
    pub activities: Vec<String>,
}

/// Structured payload of a successful response, one variant per agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "agent", rename_all = "snake_case")]
pub enum AgentData {
    Focus {
        recommendations: Vec<FocusRecommendation>,
    },
    Break {
        recommendations: Vec<BreakRecommendation>,
    },
    Task(TaskInsights),
    Analytics {
        insights: Vec<Insight>,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MicroagentResponse {
    pub success: bool,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<AgentData>,
    #[serde(default)]
    pub recommendations: Vec<String>,
}

impl MicroagentResponse {
    pub fn success(message: impl Into<String>, data: AgentData, recommendations: Vec<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
            recommendations,
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
            recommendations: Vec::new(),
        }
    }
}

/// A heuristic analyzer run by the manager.
pub trait Microagent {
    fn name(&self) -> &'static str;

    fn description(&self) -> &'static str;

    /// Never fails: internal errors come back as a `success: false` response.
    fn execute(&self, context: &MicroagentContext<'_>) -> MicroagentResponse;
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AgentInfo {
    pub name: String,
    pub description: String,
}

/// Hour of day (0-23) in the local timezone.
pub(crate) fn local_hour(ts: DateTime<Utc>) -> u32 {
    ts.with_timezone(&Local).hour()
}

/// Start of `date` in the local timezone, as UTC.
pub(crate) fn local_midnight(date: NaiveDate) -> DateTime<Utc> {
    let naive = date.and_hms_opt(0, 0, 0).unwrap_or_default();
    Local
        .from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .unwrap_or_else(|| Utc.from_utc_datetime(&naive))
}
