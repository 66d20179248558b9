//! The task the user is focusing on and where it came from.

use serde::{Deserialize, Serialize};

/// Origin of a focusing task.
///
/// Tasks from the built-in list are logged by numeric id; tasks pulled from
/// a third-party integration are logged by name since their ids mean
/// nothing to the `tasks` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TaskSource {
    #[default]
    Flowmo,
    Todoist,
    TickTick,
    MicrosoftTodo,
}

impl TaskSource {
    pub fn is_canonical(self) -> bool {
        matches!(self, TaskSource::Flowmo)
    }
}

impl std::str::FromStr for TaskSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "flowmo" => Ok(TaskSource::Flowmo),
            "todoist" => Ok(TaskSource::Todoist),
            "ticktick" => Ok(TaskSource::TickTick),
            "microsofttodo" | "microsoft-todo" | "mstodo" => Ok(TaskSource::MicrosoftTodo),
            other => Err(format!("unknown task source: {other}")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FocusingTask {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub source: TaskSource,
}

impl FocusingTask {
    /// Log reference for this task: `(task_id, task_name)`, exactly one set.
    ///
    /// A canonical task whose id is not an integer is logged with neither.
    pub fn log_reference(&self) -> (Option<i64>, Option<String>) {
        if self.source.is_canonical() {
            (self.id.trim().parse::<i64>().ok(), None)
        } else {
            (None, Some(self.name.clone()))
        }
    }
}
