//! Task agent: task-list hygiene and time-of-day suggestions.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use super::types::{local_hour, AgentData, Microagent, MicroagentContext, MicroagentResponse};
use crate::error::Result;
use crate::storage::{TaskFilter, TaskRow};

/// Words recognised as a task category when they appear in a task name.
pub const CATEGORY_WORDS: [&str; 8] = [
    "email", "meeting", "coding", "design", "research", "writing", "review", "call",
];

const COMPLETED_SAMPLE: usize = 50;
/// Completion times are not recorded, so every completed task is assumed
/// to have taken this long.
const ASSUMED_COMPLETION_MINUTES: f64 = 30.0;
const LONG_TASK_MINUTES: f64 = 120.0;
const MIN_CATEGORIES_FOR_BATCHING: usize = 3;
const MIN_BATCH_SIZE: usize = 3;

pub const NO_TASKS_MESSAGE: &str =
    "No active tasks found. Consider adding some tasks to get started!";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct CompletionStats {
    pub avg_completion_minutes: f64,
    /// Percent of sampled tasks that are completed.
    pub completion_rate: f64,
    pub completed_tasks: usize,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TaskInsights {
    pub open_tasks: usize,
    pub completion: CompletionStats,
    /// Category word to open-task count, in order of first appearance.
    pub categories: IndexMap<String, usize>,
    pub recommendations: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TaskAgent;

impl TaskAgent {
    pub fn insights(&self, context: &MicroagentContext<'_>) -> Result<TaskInsights> {
        let open = context.store.tasks(&context.user_id, TaskFilter::open())?;
        if open.is_empty() {
            return Ok(TaskInsights {
                recommendations: vec![NO_TASKS_MESSAGE.to_string()],
                ..TaskInsights::default()
            });
        }

        let completed = context
            .store
            .tasks(&context.user_id, TaskFilter::completed(COMPLETED_SAMPLE))?;
        let completion = completion_stats(completed.len(), open.len());
        let categories = categorize(&open);

        let mut recommendations = Vec::new();

        if completion.avg_completion_minutes > LONG_TASK_MINUTES {
            recommendations.push(format!(
                "Your tasks take about {} minutes on average. Consider breaking larger tasks into smaller subtasks.",
                completion.avg_completion_minutes.round()
            ));
        }

        if categories.len() >= MIN_CATEGORIES_FOR_BATCHING {
            if let Some((name, count)) = largest_category(&categories) {
                if count >= MIN_BATCH_SIZE {
                    recommendations.push(format!(
                        "You have {count} tasks in \"{name}\". Consider batching similar tasks together for better efficiency."
                    ));
                }
            }
        }

        match local_hour(context.now) {
            9..=11 => recommendations.push(
                "Morning hours are great for tackling your most important tasks. Consider working on high-priority items now.".into(),
            ),
            14..=16 => recommendations.push(
                "Afternoon slump time! This might be a good time for routine tasks or taking a break.".into(),
            ),
            _ => {}
        }

        Ok(TaskInsights {
            open_tasks: open.len(),
            completion,
            categories,
            recommendations,
        })
    }
}

impl Microagent for TaskAgent {
    fn name(&self) -> &'static str {
        "Task Agent"
    }

    fn description(&self) -> &'static str {
        "Provides intelligent task management and prioritization suggestions"
    }

    fn execute(&self, context: &MicroagentContext<'_>) -> MicroagentResponse {
        match self.insights(context) {
            Ok(insights) => {
                let messages = insights.recommendations.clone();
                MicroagentResponse::success(
                    "Task recommendations generated",
                    AgentData::Task(insights),
                    messages,
                )
            }
            Err(e) => {
                tracing::warn!(error = %e, user = %context.user_id, "task analysis failed");
                MicroagentResponse::failure(format!("Failed to generate task recommendations: {e}"))
            }
        }
    }
}

fn completion_stats(completed: usize, open: usize) -> CompletionStats {
    if completed == 0 {
        return CompletionStats::default();
    }
    CompletionStats {
        avg_completion_minutes: ASSUMED_COMPLETION_MINUTES,
        completion_rate: completed as f64 / (completed + open) as f64 * 100.0,
        completed_tasks: completed,
    }
}

/// Counts tasks per category. A task belongs to the first category word
/// found among its whitespace-separated, lowercased words.
fn categorize(tasks: &[TaskRow]) -> IndexMap<String, usize> {
    let mut categories = IndexMap::new();
    for task in tasks {
        let name = task.name.to_lowercase();
        if let Some(word) = name.split_whitespace().find(|w| CATEGORY_WORDS.contains(w)) {
            *categories.entry(word.to_string()).or_insert(0) += 1;
        }
    }
    categories
}

/// Biggest category; the earliest seen wins a tie.
fn largest_category(categories: &IndexMap<String, usize>) -> Option<(&str, usize)> {
    let mut best: Option<(&str, usize)> = None;
    for (name, &count) in categories {
        if best.map_or(true, |(_, c)| count > c) {
            best = Some((name.as_str(), count));
        }
    }
    best
}
