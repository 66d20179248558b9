use chrono::{DateTime, Local, Utc};
use clap::Subcommand;
use flowmo_core::Database;

use super::{print_json, require_user};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Today's stats
    Today,
    /// All-time stats
    All,
}

pub fn run(action: StatsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let user = require_user(&db)?;

    let since = match action {
        StatsAction::Today => Local::now()
            .date_naive()
            .and_hms_opt(0, 0, 0)
            .and_then(|t| t.and_local_timezone(Local).earliest())
            .map(|t| t.with_timezone(&Utc))
            .unwrap_or_else(Utc::now),
        StatsAction::All => DateTime::<Utc>::default(),
    };
    print_json(&db.stats_since(&user, since)?)?;
    Ok(())
}
