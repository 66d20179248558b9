use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use indexmap::IndexMap;

use super::analytics::AnalyticsAgent;
use super::breaks::BreakAgent;
use super::focus::FocusAgent;
use super::tasks::TaskAgent;
use super::types::{AgentInfo, Microagent, MicroagentContext, MicroagentResponse, WorkSession};
use crate::clock::{Clock, SystemClock};
use crate::storage::{Store, UserPreferences};
use crate::task::FocusingTask;

/// Number of logs loaded into the shared session history.
pub const HISTORY_LIMIT: usize = 50;

/// Runs the fixed set of agents against one user's data.
pub struct MicroagentsManager<'a> {
    store: &'a dyn Store,
    clock: Arc<dyn Clock>,
    agents: Vec<Box<dyn Microagent>>,
}

impl<'a> MicroagentsManager<'a> {
    pub fn new(store: &'a dyn Store) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: &'a dyn Store, clock: Arc<dyn Clock>) -> Self {
        Self {
            store,
            clock,
            agents: vec![
                Box::new(FocusAgent),
                Box::new(BreakAgent),
                Box::new(TaskAgent),
                Box::new(AnalyticsAgent),
            ],
        }
    }

    /// Run every agent in order. The result holds one entry per agent,
    /// keyed by name, even when an agent fails.
    pub fn execute_all(
        &self,
        user_id: &str,
        current_task: Option<FocusingTask>,
    ) -> IndexMap<String, MicroagentResponse> {
        let context = self.build_context(user_id, current_task);
        self.agents
            .iter()
            .map(|agent| (agent.name().to_string(), run_guarded(agent.as_ref(), &context)))
            .collect()
    }

    pub fn execute_agent(
        &self,
        name: &str,
        user_id: &str,
        current_task: Option<FocusingTask>,
    ) -> MicroagentResponse {
        let Some(agent) = self.agents.iter().find(|a| a.name() == name) else {
            return MicroagentResponse::failure(format!("Agent \"{name}\" not found"));
        };
        let context = self.build_context(user_id, current_task);
        run_guarded(agent.as_ref(), &context)
    }

    pub fn list_agents(&self) -> Vec<AgentInfo> {
        self.agents
            .iter()
            .map(|a| AgentInfo {
                name: a.name().to_string(),
                description: a.description().to_string(),
            })
            .collect()
    }

    /// Missing or unreadable data falls back to defaults.
    fn build_context(&self, user_id: &str, current_task: Option<FocusingTask>) -> MicroagentContext<'a> {
        let user_preferences = match self.store.preferences(user_id) {
            Ok(prefs) => prefs.unwrap_or_default(),
            Err(e) => {
                tracing::warn!(error = %e, user = %user_id, "preferences unavailable, using defaults");
                UserPreferences::default()
            }
        };

        let work_session_history = match self.store.recent_logs(user_id, HISTORY_LIMIT) {
            Ok(rows) => rows.iter().map(WorkSession::from_log).collect(),
            Err(e) => {
                tracing::warn!(error = %e, user = %user_id, "session history unavailable");
                Vec::new()
            }
        };

        MicroagentContext {
            store: self.store,
            user_id: user_id.to_string(),
            current_task,
            work_session_history,
            user_preferences,
            now: self.clock.now(),
        }
    }
}

fn run_guarded(agent: &dyn Microagent, context: &MicroagentContext<'_>) -> MicroagentResponse {
    match panic::catch_unwind(AssertUnwindSafe(|| agent.execute(context))) {
        Ok(response) => response,
        Err(payload) => {
            let reason = panic_message(payload.as_ref());
            tracing::error!(agent = agent.name(), %reason, "agent panicked");
            MicroagentResponse::failure(format!("Agent execution failed: {reason}"))
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "Unknown error".to_string()
    }
}
