pub mod auth;
pub mod config;
pub mod insights;
pub mod settings;
pub mod stats;
pub mod task;
pub mod timer;

use flowmo_core::storage::Store;
use flowmo_core::Database;

/// The signed-in user, or an error telling how to sign in.
pub fn require_user(db: &Database) -> Result<String, Box<dyn std::error::Error>> {
    db.current_user()?
        .ok_or_else(|| "not signed in (run `flowmo auth login <user>`)".into())
}

pub fn print_json<T: serde::Serialize>(value: &T) -> Result<(), Box<dyn std::error::Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
