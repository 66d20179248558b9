//! # Flowmo Core Library
//!
//! Core logic for the Flowmo focus timer. A focus cycle counts up; stopping
//! it converts the focused time into a break that counts down. Alongside the
//! timer, four heuristic microagents turn the user's history into advice.
//!
//! ## Architecture
//!
//! - **Timer Engine**: A wall-clock-based state machine that requires the caller
//!   to periodically invoke `tick()` for progress updates
//! - **Storage**: SQLite-backed [`Store`] and TOML-based configuration
//! - **Notifications**: the [`Notifier`] seam and a persisted alarm queue
//! - **Microagents**: focus, break, task and analytics advisors
//!
//! ## Key Components
//!
//! - [`TimerEngine`]: Core timer state machine
//! - [`Database`]: Logs, tasks and settings persistence
//! - [`Config`]: Application configuration management
//! - [`MicroagentsManager`]: Runs the advisors against one user's data

pub mod clock;
pub mod error;
pub mod events;
pub mod microagents;
pub mod notify;
pub mod storage;
pub mod task;
pub mod timer;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{ConfigError, CoreError, DatabaseError, ValidationError};
pub use events::{Event, LogSkipReason};
pub use microagents::{MicroagentResponse, MicroagentsManager};
pub use notify::{AlarmQueue, Notifier, SilentNotifier};
pub use storage::{Config, Database, Store};
pub use task::{FocusingTask, TaskSource};
pub use timer::{TimerEngine, TimerMode, TimerState, TimerStatus};
