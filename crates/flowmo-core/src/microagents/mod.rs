//! Heuristic productivity advisors.
//!
//! Four agents read the same [`MicroagentContext`] and each return a
//! [`MicroagentResponse`]. The [`MicroagentsManager`] builds the context
//! from the store and isolates agent failures from one another.

mod analytics;
mod breaks;
mod focus;
mod manager;
mod tasks;
mod types;

pub use analytics::{
    weekly_trend, AnalyticsAgent, DayStats, FocusTrend, Insight, VolumeTrend, WELCOME_MESSAGE,
};
pub use breaks::BreakAgent;
pub use focus::FocusAgent;
pub use manager::{MicroagentsManager, HISTORY_LIMIT};
pub use tasks::{CompletionStats, TaskAgent, TaskInsights, CATEGORY_WORDS, NO_TASKS_MESSAGE};
pub use types::{
    AgentData, AgentInfo, BreakRecommendation, BreakRecommendationType, FocusRecommendation,
    FocusRecommendationType, Microagent, MicroagentContext, MicroagentResponse, WorkSession,
};
