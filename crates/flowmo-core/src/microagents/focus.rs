//! Focus agent: distraction, task-switching and time-blocking tips drawn
//! from the last day of sessions.

use std::collections::BTreeMap;

use chrono::Duration;

use super::types::{
    local_hour, AgentData, FocusRecommendation, FocusRecommendationType, Microagent,
    MicroagentContext, MicroagentResponse, WorkSession,
};

const LOOKBACK_HOURS: i64 = 24;
const LOW_FOCUS_SCORE: f64 = 70.0;
const MAX_TASK_SWITCHES: usize = 3;

#[derive(Debug, Clone, Copy, Default)]
pub struct FocusAgent;

impl FocusAgent {
    pub fn recommendations(&self, context: &MicroagentContext<'_>) -> Vec<FocusRecommendation> {
        let lookback = Duration::hours(LOOKBACK_HOURS);
        let mut recent: Vec<&WorkSession> = context
            .work_session_history
            .iter()
            .filter(|s| s.end_time.is_some_and(|end| context.now - end < lookback))
            .collect();
        recent.sort_by(|a, b| b.start_time.cmp(&a.start_time));

        let mut recommendations = Vec::new();

        if average_focus_score(&recent) < LOW_FOCUS_SCORE {
            recommendations.push(FocusRecommendation {
                kind: FocusRecommendationType::DistractionAvoidance,
                message: "Your recent focus scores are lower than usual. Consider enabling \"Do Not Disturb\" mode during work sessions.".into(),
                confidence: 0.8,
                action: Some("enable_dnd".into()),
            });
        }

        let switches = task_switches(&recent);
        if switches > MAX_TASK_SWITCHES {
            recommendations.push(FocusRecommendation {
                kind: FocusRecommendationType::TaskPrioritization,
                message: format!(
                    "You've switched tasks {switches} times recently. Try focusing on one task at a time for better productivity."
                ),
                confidence: 0.7,
                action: Some("single_task_focus".into()),
            });
        }

        if let Some(hour) = busiest_start_hour(&recent) {
            recommendations.push(FocusRecommendation {
                kind: FocusRecommendationType::TimeBlocking,
                message: format!(
                    "Based on your patterns, {hour}:00 - {}:00 seems to be your most productive time. Schedule important tasks then.",
                    hour + 1
                ),
                confidence: 0.6,
                action: None,
            });
        }

        recommendations
    }
}

impl Microagent for FocusAgent {
    fn name(&self) -> &'static str {
        "Focus Agent"
    }

    fn description(&self) -> &'static str {
        "Provides intelligent focus recommendations and distraction prevention"
    }

    fn execute(&self, context: &MicroagentContext<'_>) -> MicroagentResponse {
        let recommendations = self.recommendations(context);
        let messages = recommendations.iter().map(|r| r.message.clone()).collect();
        MicroagentResponse::success(
            "Focus recommendations generated",
            AgentData::Focus { recommendations },
            messages,
        )
    }
}

/// Mean score with unscored sessions counted as 0. An empty list averages 0.
fn average_focus_score(sessions: &[&WorkSession]) -> f64 {
    let total: f64 = sessions.iter().map(|s| s.focus_score.unwrap_or(0.0)).sum();
    total / sessions.len().max(1) as f64
}

/// Number of times the tracked task id changes, the first tracked task
/// included. Sessions without a task are ignored.
fn task_switches(sessions: &[&WorkSession]) -> usize {
    let mut switches = 0;
    let mut last: Option<&str> = None;
    for session in sessions {
        if let Some(id) = session.task_id.as_deref() {
            if last != Some(id) {
                switches += 1;
                last = Some(id);
            }
        }
    }
    switches
}

/// Most common local start hour; the earliest hour wins a tie.
fn busiest_start_hour(sessions: &[&WorkSession]) -> Option<u32> {
    let mut counts: BTreeMap<u32, usize> = BTreeMap::new();
    for session in sessions {
        *counts.entry(local_hour(session.start_time)).or_default() += 1;
    }
    let mut best: Option<(u32, usize)> = None;
    for (hour, count) in counts {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((hour, count));
        }
    }
    best.map(|(hour, _)| hour)
}
