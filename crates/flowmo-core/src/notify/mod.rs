//! Notification collaborator.
//!
//! The timer only needs four capabilities: ask for permission, declare a
//! channel, schedule a one-shot alert at a timestamp, and cancel it. The
//! platform behind them is someone else's problem.

mod alarm_queue;

pub use alarm_queue::{AlarmQueue, DueAlert};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Action id that dismisses a delivered alert.
pub const MARK_AS_READ_ACTION: &str = "mark-as-read";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Importance {
    Default,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    Private,
    Public,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Channel {
    pub id: String,
    pub name: String,
    pub importance: Importance,
    pub visibility: Visibility,
    pub sound: Option<String>,
}

impl Channel {
    /// The high-priority channel break alarms are delivered on.
    pub fn important() -> Self {
        Self {
            id: "important".into(),
            name: "Default Channel".into(),
            importance: Importance::High,
            visibility: Visibility::Public,
            sound: Some("alarm".into()),
        }
    }
}

/// A one-shot alert fired at `fire_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Alert {
    pub channel_id: String,
    pub title: String,
    pub body: String,
    /// Android-style sound resource name.
    pub sound: Option<String>,
    /// iOS-style bundled sound file.
    pub ios_sound: Option<String>,
    pub fire_at: DateTime<Utc>,
    pub allow_while_idle: bool,
    pub light_up_screen: bool,
}

impl Alert {
    /// The "back to work" alarm scheduled when a break starts.
    pub fn break_over(channel_id: &str, fire_at: DateTime<Utc>) -> Self {
        Self {
            channel_id: channel_id.to_string(),
            title: "Flowmo".into(),
            body: "Time to get back to work!".into(),
            sound: Some("alarm".into()),
            ios_sound: Some("alarm.wav".into()),
            fire_at,
            allow_while_idle: true,
            light_up_screen: true,
        }
    }
}

pub trait Notifier {
    /// Ask the platform for permission. Returns whether it was granted.
    fn request_permission(&self) -> Result<bool>;

    /// Declare a channel and return its id.
    fn create_channel(&self, channel: &Channel) -> Result<String>;

    /// Schedule an alert and return its notification id.
    fn schedule(&self, alert: &Alert) -> Result<String>;

    fn cancel(&self, notification_id: &str) -> Result<()>;
}

/// React to a button pressed on a delivered alert.
///
/// Only "mark as read" does anything: it cancels the alert. Returns whether
/// the action was handled.
pub fn handle_action<N: Notifier + ?Sized>(
    notifier: &N,
    action_id: &str,
    notification_id: &str,
) -> Result<bool> {
    if action_id != MARK_AS_READ_ACTION {
        return Ok(false);
    }
    notifier.cancel(notification_id)?;
    Ok(true)
}

/// A notifier that accepts everything and delivers nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentNotifier;

impl Notifier for SilentNotifier {
    fn request_permission(&self) -> Result<bool> {
        Ok(false)
    }

    fn create_channel(&self, channel: &Channel) -> Result<String> {
        Ok(channel.id.clone())
    }

    fn schedule(&self, _alert: &Alert) -> Result<String> {
        Ok(String::new())
    }

    fn cancel(&self, _notification_id: &str) -> Result<()> {
        Ok(())
    }
}
