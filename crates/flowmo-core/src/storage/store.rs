use super::models::{LogRow, NewLog, TaskFilter, TaskRow, UserId, UserPreferences};
use crate::error::Result;

/// The persistence collaborator behind the timer and the microagents.
///
/// Implementations own identity, settings, logs and tasks. Every call is
/// synchronous; callers decide per operation whether a failure is fatal.
pub trait Store {
    /// The signed-in user, if any.
    fn current_user(&self) -> Result<Option<UserId>>;

    /// Stored break ratio; `None` when the user has no settings row.
    fn break_ratio(&self, user_id: &str) -> Result<Option<f64>>;

    /// Upsert the break ratio.
    fn set_break_ratio(&self, user_id: &str, ratio: f64) -> Result<()>;

    fn preferences(&self, user_id: &str) -> Result<Option<UserPreferences>>;

    /// Upsert the preferences record.
    fn save_preferences(&self, user_id: &str, preferences: &UserPreferences) -> Result<()>;

    /// Insert a log row and return its id.
    fn insert_log(&self, user_id: &str, log: &NewLog) -> Result<i64>;

    /// Most recent logs first, at most `limit` rows.
    fn recent_logs(&self, user_id: &str, limit: usize) -> Result<Vec<LogRow>>;

    /// Tasks matching `filter`, newest-first.
    fn tasks(&self, user_id: &str, filter: TaskFilter) -> Result<Vec<TaskRow>>;

    fn insert_task(&self, user_id: &str, name: &str) -> Result<TaskRow>;

    fn set_task_completed(&self, user_id: &str, task_id: i64, completed: bool) -> Result<()>;
}
