mod config;
pub mod database;
pub mod models;
mod store;

pub use config::{Config, LoggingConfig, NotificationsConfig, TimerConfig};
pub use database::Database;
pub use models::{
    FocusMode, LogRow, NewLog, TaskFilter, TaskRow, UserId, UserPreferences,
};
pub use store::Store;

use std::path::PathBuf;

use crate::error::ConfigError;

/// Returns `~/.config/flowmo[-dev]/` based on FLOWMO_ENV.
///
/// Set FLOWMO_ENV=dev to use development data directory.
///
/// # Errors
/// Returns an error if creating the config directory fails.
pub fn data_dir() -> Result<PathBuf, ConfigError> {
    let base_dir = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".config");

    let env = std::env::var("FLOWMO_ENV").unwrap_or_else(|_| "production".to_string());

    let dir = if env == "dev" {
        base_dir.join("flowmo-dev")
    } else {
        base_dir.join("flowmo")
    };

    std::fs::create_dir_all(&dir)
        .map_err(|e| ConfigError::DataDir(format!("{}: {e}", dir.display())))?;
    Ok(dir)
}
