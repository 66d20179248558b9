use clap::Subcommand;
use flowmo_core::storage::{Store, UserPreferences};
use flowmo_core::{Database, TimerEngine};

use super::{print_json, require_user};

#[derive(Subcommand)]
pub enum SettingsAction {
    /// Show or set the break ratio (focus time divided by this gives the break)
    BreakRatio {
        /// New ratio, must be positive
        value: Option<f64>,
    },
    /// Show or replace the microagent preferences
    Preferences {
        /// Full preferences record as JSON
        #[arg(long)]
        json: Option<String>,
    },
}

pub fn run(action: SettingsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;

    match action {
        SettingsAction::BreakRatio { value: Some(ratio) } => {
            let user = require_user(&db)?;
            db.set_break_ratio(&user, ratio)?;
            println!("{ratio}");
        }
        SettingsAction::BreakRatio { value: None } => {
            // The ratio the timer would apply right now, defaults included.
            println!("{}", TimerEngine::new().break_ratio(&db));
        }
        SettingsAction::Preferences { json: Some(json) } => {
            let user = require_user(&db)?;
            let prefs: UserPreferences = serde_json::from_str(&json)?;
            db.save_preferences(&user, &prefs)?;
            print_json(&prefs)?;
        }
        SettingsAction::Preferences { json: None } => {
            let user = require_user(&db)?;
            let prefs = db.preferences(&user)?.unwrap_or_default();
            print_json(&prefs)?;
        }
    }
    Ok(())
}
