//! Alarm queue persisted in the `alarms` table.
//!
//! The CLI has no platform scheduler, so alerts wait in SQLite until the
//! watch loop asks for the ones that are due.

use chrono::{DateTime, Utc};
use rusqlite::params;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Alert, Channel, Notifier};
use crate::error::Result;
use crate::storage::database::{format_ts, parse_ts};
use crate::storage::Database;

/// An alert whose trigger time has passed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DueAlert {
    pub id: String,
    pub channel_id: String,
    pub title: String,
    pub body: String,
    pub sound: Option<String>,
    pub fire_at: DateTime<Utc>,
}

pub struct AlarmQueue<'a> {
    db: &'a Database,
}

impl<'a> AlarmQueue<'a> {
    pub fn new(db: &'a Database) -> Self {
        Self { db }
    }

    /// Alerts not yet fired, soonest first.
    pub fn pending(&self) -> Result<Vec<DueAlert>> {
        self.select(
            "SELECT id, channel_id, title, body, sound, fire_at FROM alarms ORDER BY fire_at",
            params![],
        )
    }

    /// Remove and return every alert due at `now`.
    pub fn take_due(&self, now: DateTime<Utc>) -> Result<Vec<DueAlert>> {
        let due = self.select(
            "SELECT id, channel_id, title, body, sound, fire_at FROM alarms WHERE fire_at <= ?1 ORDER BY fire_at",
            params![format_ts(now)],
        )?;
        for alert in &due {
            self.cancel(&alert.id)?;
        }
        Ok(due)
    }

    fn select<P: rusqlite::Params>(&self, sql: &str, params: P) -> Result<Vec<DueAlert>> {
        let mut stmt = self.db.conn().prepare(sql)?;
        let rows = stmt.query_map(params, |row| {
            Ok(DueAlert {
                id: row.get(0)?,
                channel_id: row.get(1)?,
                title: row.get(2)?,
                body: row.get(3)?,
                sound: row.get(4)?,
                fire_at: parse_ts(5, &row.get::<_, String>(5)?)?,
            })
        })?;
        Ok(rows.collect::<Result<Vec<_>, _>>()?)
    }
}

impl Notifier for AlarmQueue<'_> {
    fn request_permission(&self) -> Result<bool> {
        Ok(true)
    }

    fn create_channel(&self, channel: &Channel) -> Result<String> {
        self.db.kv_set(
            &format!("notification_channel:{}", channel.id),
            &serde_json::to_string(channel)?,
        )?;
        Ok(channel.id.clone())
    }

    fn schedule(&self, alert: &Alert) -> Result<String> {
        let id = Uuid::new_v4().to_string();
        self.db.conn().execute(
            "INSERT INTO alarms (id, channel_id, title, body, sound, fire_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                alert.channel_id,
                alert.title,
                alert.body,
                alert.sound,
                format_ts(alert.fire_at),
            ],
        )?;
        tracing::debug!(id = %id, fire_at = %alert.fire_at, "alarm scheduled");
        Ok(id)
    }

    fn cancel(&self, notification_id: &str) -> Result<()> {
        self.db
            .conn()
            .execute("DELETE FROM alarms WHERE id = ?1", params![notification_id])?;
        Ok(())
    }
}
