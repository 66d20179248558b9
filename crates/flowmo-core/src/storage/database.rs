//! SQLite-backed implementation of [`Store`].
//!
//! Provides persistent storage for:
//! - Per-user settings (break ratio and microagent preferences)
//! - Focus logs and tasks
//! - Scheduled alarms for the notification queue
//! - Key-value store for application state (signed-in user, timer state)

use std::path::Path;

use chrono::{DateTime, SecondsFormat, Utc};
use indoc::indoc;
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::data_dir;
use super::models::{LogRow, NewLog, TaskFilter, TaskRow, UserId, UserPreferences};
use super::store::Store;
use crate::error::{DatabaseError, Result, ValidationError};

const AUTH_USER_KEY: &str = "auth_user";

/// Aggregate of focus logs over a time window.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct Stats {
    pub sessions: u64,
    pub focus_min: f64,
}

/// SQLite database for settings, logs and tasks.
pub struct Database {
    conn: Connection,
}

impl Database {
    /// Get a reference to the underlying SQLite connection.
    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    /// Open the database at `~/.config/flowmo/flowmo.db`.
    ///
    /// Creates the database file and schema if they don't exist.
    ///
    /// # Errors
    /// Returns an error if the database cannot be opened or migrated.
    pub fn open() -> Result<Self> {
        let path = data_dir()?.join("flowmo.db");
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).map_err(|source| DatabaseError::OpenFailed {
            path: path.to_path_buf(),
            source,
        })?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    /// Open an in-memory database (for tests).
    pub fn open_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&self) -> Result<()> {
        self.conn
            .execute_batch(indoc! {"
                CREATE TABLE IF NOT EXISTS settings (
                    user_id     TEXT PRIMARY KEY,
                    break_ratio REAL,
                    preferences TEXT
                );

                CREATE TABLE IF NOT EXISTS logs (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id     TEXT NOT NULL,
                    start_time  TEXT NOT NULL,
                    end_time    TEXT,
                    task_id     INTEGER,
                    task_name   TEXT,
                    focus_score REAL,
                    created_at  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS tasks (
                    id          INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id     TEXT NOT NULL,
                    name        TEXT NOT NULL,
                    completed   INTEGER NOT NULL DEFAULT 0,
                    created_at  TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS alarms (
                    id          TEXT PRIMARY KEY,
                    channel_id  TEXT NOT NULL,
                    title       TEXT NOT NULL,
                    body        TEXT NOT NULL,
                    sound       TEXT,
                    fire_at     TEXT NOT NULL
                );

                CREATE TABLE IF NOT EXISTS kv (
                    key   TEXT PRIMARY KEY,
                    value TEXT NOT NULL
                );

                CREATE INDEX IF NOT EXISTS idx_logs_user_created ON logs(user_id, created_at);
                CREATE INDEX IF NOT EXISTS idx_tasks_user_completed ON tasks(user_id, completed);
                CREATE INDEX IF NOT EXISTS idx_alarms_fire_at ON alarms(fire_at);
            "})
            .map_err(|e| DatabaseError::MigrationFailed(e.to_string()))?;
        Ok(())
    }

    // ── Identity ─────────────────────────────────────────────────────

    /// Remember `user_id` as the signed-in identity.
    pub fn sign_in(&self, user_id: &str) -> Result<()> {
        if user_id.trim().is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "user_id".into(),
                message: "must not be empty".into(),
            }
            .into());
        }
        self.kv_set(AUTH_USER_KEY, user_id)
    }

    pub fn sign_out(&self) -> Result<()> {
        self.kv_delete(AUTH_USER_KEY)
    }

    // ── Stats ────────────────────────────────────────────────────────

    /// Count and total minutes of logs created at or after `since`.
    pub fn stats_since(&self, user_id: &str, since: DateTime<Utc>) -> Result<Stats> {
        let mut stmt = self.conn.prepare(
            "SELECT start_time, end_time FROM logs WHERE user_id = ?1 AND created_at >= ?2",
        )?;
        let rows = stmt.query_map(params![user_id, format_ts(since)], |row| {
            Ok((
                parse_ts(0, &row.get::<_, String>(0)?)?,
                parse_opt_ts(1, row.get::<_, Option<String>>(1)?)?,
            ))
        })?;

        let mut stats = Stats::default();
        for row in rows {
            let (start, end) = row?;
            stats.sessions += 1;
            if let Some(end) = end {
                stats.focus_min += (end - start).num_milliseconds() as f64 / 60_000.0;
            }
        }
        Ok(stats)
    }

    // ── Key-value ────────────────────────────────────────────────────

    /// Get a value from the kv store.
    pub fn kv_get(&self, key: &str) -> Result<Option<String>> {
        let value = self
            .conn
            .query_row("SELECT value FROM kv WHERE key = ?1", params![key], |row| {
                row.get::<_, String>(0)
            })
            .optional()?;
        Ok(value)
    }

    /// Set a value in the kv store.
    pub fn kv_set(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR REPLACE INTO kv (key, value) VALUES (?1, ?2)",
            params![key, value],
        )?;
        Ok(())
    }

    pub fn kv_delete(&self, key: &str) -> Result<()> {
        self.conn
            .execute("DELETE FROM kv WHERE key = ?1", params![key])?;
        Ok(())
    }

    fn ensure_settings_row(&self, user_id: &str) -> Result<()> {
        self.conn.execute(
            "INSERT OR IGNORE INTO settings (user_id) VALUES (?1)",
            params![user_id],
        )?;
        Ok(())
    }
}

impl Store for Database {
    fn current_user(&self) -> Result<Option<UserId>> {
        self.kv_get(AUTH_USER_KEY)
    }

    fn break_ratio(&self, user_id: &str) -> Result<Option<f64>> {
        let ratio = self
            .conn
            .query_row(
                "SELECT break_ratio FROM settings WHERE user_id = ?1",
                params![user_id],
                |row| row.get::<_, Option<f64>>(0),
            )
            .optional()?;
        Ok(ratio.flatten())
    }

    fn set_break_ratio(&self, user_id: &str, ratio: f64) -> Result<()> {
        if !ratio.is_finite() || ratio <= 0.0 {
            return Err(ValidationError::InvalidValue {
                field: "break_ratio".into(),
                message: format!("must be a positive number, got {ratio}"),
            }
            .into());
        }
        self.ensure_settings_row(user_id)?;
        self.conn.execute(
            "UPDATE settings SET break_ratio = ?2 WHERE user_id = ?1",
            params![user_id, ratio],
        )?;
        Ok(())
    }

    fn preferences(&self, user_id: &str) -> Result<Option<UserPreferences>> {
        let json = self
            .conn
            .query_row(
                "SELECT preferences FROM settings WHERE user_id = ?1",
                params![user_id],
                |row| row.get::<_, Option<String>>(0),
            )
            .optional()?
            .flatten();

        match json {
            Some(json) => {
                let prefs = serde_json::from_str(&json).map_err(|e| DatabaseError::CorruptValue {
                    column: "settings.preferences".into(),
                    message: e.to_string(),
                })?;
                Ok(Some(prefs))
            }
            None => Ok(None),
        }
    }

    fn save_preferences(&self, user_id: &str, preferences: &UserPreferences) -> Result<()> {
        let json = serde_json::to_string(preferences)?;
        self.ensure_settings_row(user_id)?;
        self.conn.execute(
            "UPDATE settings SET preferences = ?2 WHERE user_id = ?1",
            params![user_id, json],
        )?;
        Ok(())
    }

    fn insert_log(&self, user_id: &str, log: &NewLog) -> Result<i64> {
        if log.end_time < log.start_time {
            return Err(ValidationError::InvalidTimeRange {
                start: log.start_time,
                end: log.end_time,
            }
            .into());
        }
        // A log row is created when its interval ends.
        self.conn.execute(
            "INSERT INTO logs (user_id, start_time, end_time, task_id, task_name, focus_score, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                user_id,
                format_ts(log.start_time),
                format_ts(log.end_time),
                log.task_id,
                log.task_name,
                log.focus_score,
                format_ts(log.end_time),
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    fn recent_logs(&self, user_id: &str, limit: usize) -> Result<Vec<LogRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, start_time, end_time, task_id, task_name, focus_score, created_at
             FROM logs
             WHERE user_id = ?1
             ORDER BY created_at DESC, id DESC
             LIMIT ?2",
        )?;
        let rows = stmt.query_map(params![user_id, limit as i64], |row| {
            Ok(LogRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                start_time: parse_ts(2, &row.get::<_, String>(2)?)?,
                end_time: parse_opt_ts(3, row.get(3)?)?,
                task_id: row.get(4)?,
                task_name: row.get(5)?,
                focus_score: row.get(6)?,
                created_at: parse_ts(7, &row.get::<_, String>(7)?)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn tasks(&self, user_id: &str, filter: TaskFilter) -> Result<Vec<TaskRow>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, user_id, name, completed, created_at
             FROM tasks
             WHERE user_id = ?1 AND (?2 IS NULL OR completed = ?2)
             ORDER BY created_at DESC, id DESC
             LIMIT ?3",
        )?;
        // SQLite treats a negative LIMIT as "no limit".
        let limit = filter.limit.map(|l| l as i64).unwrap_or(-1);
        let rows = stmt.query_map(params![user_id, filter.completed, limit], |row| {
            Ok(TaskRow {
                id: row.get(0)?,
                user_id: row.get(1)?,
                name: row.get(2)?,
                completed: row.get(3)?,
                created_at: parse_ts(4, &row.get::<_, String>(4)?)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }

    fn insert_task(&self, user_id: &str, name: &str) -> Result<TaskRow> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ValidationError::InvalidValue {
                field: "name".into(),
                message: "must not be empty".into(),
            }
            .into());
        }
        let created_at = Utc::now();
        self.conn.execute(
            "INSERT INTO tasks (user_id, name, completed, created_at) VALUES (?1, ?2, 0, ?3)",
            params![user_id, name, format_ts(created_at)],
        )?;
        Ok(TaskRow {
            id: self.conn.last_insert_rowid(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            completed: false,
            created_at,
        })
    }

    fn set_task_completed(&self, user_id: &str, task_id: i64, completed: bool) -> Result<()> {
        let changed = self.conn.execute(
            "UPDATE tasks SET completed = ?3 WHERE user_id = ?1 AND id = ?2",
            params![user_id, task_id, completed],
        )?;
        if changed == 0 {
            return Err(ValidationError::NotFound {
                entity: "Task".into(),
                id: task_id.to_string(),
            }
            .into());
        }
        Ok(())
    }
}

/// Fixed-width RFC 3339 so text ordering matches time ordering.
pub(crate) fn format_ts(ts: DateTime<Utc>) -> String {
    ts.to_rfc3339_opts(SecondsFormat::Millis, true)
}

pub(crate) fn parse_ts(idx: usize, value: &str) -> rusqlite::Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn parse_opt_ts(idx: usize, value: Option<String>) -> rusqlite::Result<Option<DateTime<Utc>>> {
    value.map(|v| parse_ts(idx, &v)).transpose()
}
