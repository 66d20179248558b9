//! Task management commands for CLI.

use clap::Subcommand;
use flowmo_core::storage::{Store, TaskFilter};
use flowmo_core::Database;

use super::{print_json, require_user};

#[derive(Subcommand)]
pub enum TaskAction {
    /// Create a new task
    Add {
        /// Task name
        name: String,
    },
    /// List tasks, open ones by default
    List {
        /// Include completed tasks
        #[arg(long, conflicts_with = "completed")]
        all: bool,
        /// Only completed tasks
        #[arg(long)]
        completed: bool,
    },
    /// Mark a task as completed
    Complete {
        /// Task ID
        id: i64,
    },
    /// Mark a completed task as open again
    Reopen {
        /// Task ID
        id: i64,
    },
}

pub fn run(action: TaskAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let user = require_user(&db)?;

    match action {
        TaskAction::Add { name } => {
            let task = db.insert_task(&user, &name)?;
            print_json(&task)?;
        }
        TaskAction::List { all, completed } => {
            let filter = if all {
                TaskFilter::all()
            } else {
                TaskFilter {
                    completed: Some(completed),
                    limit: None,
                }
            };
            let tasks = db.tasks(&user, filter)?;
            print_json(&tasks)?;
        }
        TaskAction::Complete { id } => {
            db.set_task_completed(&user, id, true)?;
            println!("task {id} completed");
        }
        TaskAction::Reopen { id } => {
            db.set_task_completed(&user, id, false)?;
            println!("task {id} reopened");
        }
    }
    Ok(())
}
