use clap::Subcommand;
use flowmo_core::{Database, FocusingTask, MicroagentsManager};

use super::{print_json, require_user};

#[derive(Subcommand)]
pub enum InsightsAction {
    /// Run every agent
    All {
        /// ID of the task being worked on
        #[arg(long)]
        task_id: Option<String>,
        /// Name of the task being worked on
        #[arg(long)]
        task_name: Option<String>,
    },
    /// Run one agent by name, e.g. "Break Agent"
    Run {
        name: String,
    },
    /// List the available agents
    List,
}

pub fn run(action: InsightsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let manager = MicroagentsManager::new(&db);

    match action {
        InsightsAction::All { task_id, task_name } => {
            let user = require_user(&db)?;
            let current_task = (task_id.is_some() || task_name.is_some()).then(|| FocusingTask {
                id: task_id.unwrap_or_default(),
                name: task_name.unwrap_or_default(),
                source: Default::default(),
            });
            print_json(&manager.execute_all(&user, current_task))?;
        }
        InsightsAction::Run { name } => {
            let user = require_user(&db)?;
            let response = manager.execute_agent(&name, &user, None);
            print_json(&response)?;
            if !response.success {
                return Err(response.message.into());
            }
        }
        InsightsAction::List => print_json(&manager.list_agents())?,
    }
    Ok(())
}
