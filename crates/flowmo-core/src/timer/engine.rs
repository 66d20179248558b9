//! Timer engine implementation.
//!
//! The timer engine is a wall-clock-based state machine. It does not use
//! internal threads - the caller is responsible for calling `tick()` periodically.
//!
//! ## State Transitions
//!
//! ```text
//! Idle --start--> Running --pause--> Paused --resume--> Running
//! Running --stop--> Idle          (flips mode, logs focus intervals)
//! Paused  --stop--> Idle          (discard pause: no log, flips mode)
//! ```
//!
//! A focus cycle counts up. Stopping it turns the accumulated time divided by
//! the user's break ratio into the budget of the following break, which
//! counts down and stops itself on `tick()` when it runs out.
//!
//! ## Usage
//!
//! ```ignore
//! let mut engine = TimerEngine::new();
//! engine.start(&notifier)?;
//! // In a loop:
//! engine.tick(&store);
//! // Later:
//! engine.stop(&store, Some(&task));
//! ```

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};

use super::state::{TimerMode, TimerState, TimerStatus};
use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::events::{Event, LogSkipReason};
use crate::notify::{Alert, Channel, Notifier};
use crate::storage::{NewLog, Store};
use crate::task::FocusingTask;

/// Break ratio used when the user is signed out or never chose one.
pub const DEFAULT_BREAK_RATIO: f64 = 5.0;

/// Slack added to the break alarm so the tick loop stops the break first.
const ALARM_GRACE_MS: i64 = 1000;

/// Core timer engine.
///
/// Owns the [`TimerState`]; the store and notifier are borrowed per call.
#[derive(Clone)]
pub struct TimerEngine {
    state: TimerState,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for TimerEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerEngine")
            .field("state", &self.state)
            .finish_non_exhaustive()
    }
}

impl Default for TimerEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerEngine {
    pub fn new() -> Self {
        Self::with_clock(Arc::new(SystemClock))
    }

    pub fn with_clock(clock: Arc<dyn Clock>) -> Self {
        Self::from_state(TimerState::default(), clock)
    }

    /// Rebuild an engine around a previously persisted state.
    pub fn from_state(state: TimerState, clock: Arc<dyn Clock>) -> Self {
        Self { state, clock }
    }

    // ── Queries ──────────────────────────────────────────────────────

    pub fn state(&self) -> &TimerState {
        &self.state
    }

    pub fn status(&self) -> TimerStatus {
        self.state.status
    }

    pub fn mode(&self) -> TimerMode {
        self.state.mode
    }

    pub fn snapshot(&self) -> Event {
        Event::StateSnapshot {
            status: self.state.status,
            mode: self.state.mode,
            total_time_ms: self.state.total_time_ms,
            display_time_secs: self.state.display_time_secs,
            start_time: self.state.start_time,
            end_time: self.state.end_time,
            at: self.clock.now(),
        }
    }

    /// The break ratio to apply right now.
    ///
    /// Read from the store on every call. Falls back to
    /// [`DEFAULT_BREAK_RATIO`] when signed out, unset, non-positive, or
    /// unreadable.
    pub fn break_ratio<S: Store + ?Sized>(&self, store: &S) -> f64 {
        let user = match store.current_user() {
            Ok(Some(user)) => user,
            Ok(None) => return DEFAULT_BREAK_RATIO,
            Err(e) => {
                tracing::warn!(error = %e, "identity lookup failed, using default break ratio");
                return DEFAULT_BREAK_RATIO;
            }
        };
        match store.break_ratio(&user) {
            Ok(Some(ratio)) if ratio.is_finite() && ratio > 0.0 => ratio,
            Ok(_) => DEFAULT_BREAK_RATIO,
            Err(e) => {
                tracing::warn!(error = %e, user = %user, "break ratio read failed, using default");
                DEFAULT_BREAK_RATIO
            }
        }
    }

    // ── Commands ─────────────────────────────────────────────────────

    /// Idle → Running.
    ///
    /// Starting a break also schedules the "back to work" alarm. A
    /// notifier failure is returned after the state has already changed.
    pub fn start<N: Notifier + ?Sized>(&mut self, notifier: &N) -> Result<Vec<Event>> {
        if self.state.status != TimerStatus::Idle {
            return Ok(Vec::new());
        }

        match self.state.mode {
            TimerMode::Break => {
                let granted = notifier.request_permission()?;
                let now = self.clock.now();
                let end_time = now + Duration::milliseconds(self.state.total_time_ms);
                self.state.start_time = Some(now);
                self.state.end_time = Some(end_time);
                self.state.status = TimerStatus::Running;
                tracing::debug!(%end_time, "break started");

                if granted {
                    let channel_id = notifier.create_channel(&Channel::important())?;
                    let fire_at = end_time + Duration::milliseconds(ALARM_GRACE_MS);
                    let alarm_id = notifier.schedule(&Alert::break_over(&channel_id, fire_at))?;
                    self.state.alarm_id = Some(alarm_id);
                } else {
                    tracing::info!("notification permission denied, break alarm not scheduled");
                }

                Ok(vec![Event::TimerStarted {
                    mode: TimerMode::Break,
                    end_time: Some(end_time),
                    at: now,
                }])
            }
            TimerMode::Focus => {
                let now = self.clock.now();
                self.state.start_time = Some(now);
                self.state.status = TimerStatus::Running;
                tracing::debug!("focus started");
                Ok(vec![Event::TimerStarted {
                    mode: TimerMode::Focus,
                    end_time: None,
                    at: now,
                }])
            }
        }
    }

    /// Running → Idle or Paused → Idle. See [`TimerEngine::discard_pause`]
    /// for the paused case.
    pub fn stop<S: Store + ?Sized>(
        &mut self,
        store: &S,
        task: Option<&FocusingTask>,
    ) -> Vec<Event> {
        match self.state.status {
            TimerStatus::Idle => Vec::new(),
            TimerStatus::Paused => vec![self.discard_pause(store)],
            TimerStatus::Running => {
                let break_ratio = self.break_ratio(store);
                let now = self.clock.now();
                let mut events = vec![self.log_at(store, task, now)];

                let from = self.state.mode;
                let total = match from {
                    TimerMode::Focus => {
                        let elapsed = self.elapsed_since_start(now);
                        ((self.state.total_time_ms + elapsed) as f64 / break_ratio) as i64
                    }
                    TimerMode::Break => 0,
                };
                self.state.end_time = Some(now);
                self.state.total_time_ms = total;
                self.state.refresh_display(total);
                self.state.mode = from.flipped();
                self.state.status = TimerStatus::Idle;
                tracing::debug!(?from, total_ms = total, break_ratio, "timer stopped");

                events.push(Event::TimerStopped {
                    from,
                    to: self.state.mode,
                    break_ratio,
                    total_time_ms: total,
                    at: now,
                });
                events
            }
        }
    }

    /// Stop issued while paused.
    ///
    /// The time already accumulated (and logged by the pause) is divided by
    /// the break ratio and the mode flips. Nothing is written to the store.
    fn discard_pause<S: Store + ?Sized>(&mut self, store: &S) -> Event {
        let break_ratio = self.break_ratio(store);
        let from = self.state.mode;
        let total = (self.state.total_time_ms as f64 / break_ratio) as i64;
        self.state.total_time_ms = total;
        self.state.refresh_display(total);
        self.state.mode = from.flipped();
        self.state.status = TimerStatus::Idle;
        tracing::debug!(?from, total_ms = total, break_ratio, "pause discarded");

        Event::PauseDiscarded {
            from,
            to: self.state.mode,
            break_ratio,
            total_time_ms: total,
            at: self.clock.now(),
        }
    }

    /// Running → Paused. Logs the interval that just ended.
    pub fn pause<S: Store + ?Sized>(
        &mut self,
        store: &S,
        task: Option<&FocusingTask>,
    ) -> Vec<Event> {
        if self.state.status != TimerStatus::Running {
            return Vec::new();
        }
        let now = self.clock.now();
        let log = self.log_at(store, task, now);
        self.state.total_time_ms += self.elapsed_since_start(now);
        self.state.status = TimerStatus::Paused;
        vec![
            log,
            Event::TimerPaused {
                total_time_ms: self.state.total_time_ms,
                at: now,
            },
        ]
    }

    /// Paused → Running.
    pub fn resume(&mut self) -> Vec<Event> {
        if self.state.status != TimerStatus::Paused {
            return Vec::new();
        }
        let now = self.clock.now();
        self.state.start_time = Some(now);
        self.state.status = TimerStatus::Running;
        vec![Event::TimerResumed {
            total_time_ms: self.state.total_time_ms,
            at: now,
        }]
    }

    /// Call periodically. Refreshes the display and ends a break whose
    /// countdown reached zero.
    pub fn tick<S: Store + ?Sized>(&mut self, store: &S) -> Vec<Event> {
        if self.state.status != TimerStatus::Running {
            return Vec::new();
        }
        let now = self.clock.now();
        let time = match self.state.mode {
            TimerMode::Focus => self.state.total_time_ms + self.elapsed_since_start(now),
            TimerMode::Break => self
                .state
                .end_time
                .map(|end| (end - now).num_milliseconds())
                .unwrap_or(0),
        };

        if self.state.mode == TimerMode::Break && time <= 0 {
            // The alarm is left queued to ring.
            self.state.alarm_id = None;
            let mut events = self.stop(store, None);
            self.state.status = TimerStatus::Idle;
            self.state.display_time_secs = 0;
            events.push(Event::BreakElapsed { at: now });
            return events;
        }

        self.state.refresh_display(time);
        Vec::new()
    }

    /// Withdraw the break alarm of a break that was stopped by hand.
    ///
    /// No-op unless an alarm is still outstanding and the timer has left
    /// the running break.
    pub fn dismiss_alarm<N: Notifier + ?Sized>(&mut self, notifier: &N) -> Result<()> {
        if self.state.mode == TimerMode::Break && self.state.status != TimerStatus::Idle {
            return Ok(());
        }
        if let Some(id) = self.state.alarm_id.take() {
            notifier.cancel(&id)?;
            tracing::debug!(id = %id, "break alarm dismissed");
        }
        Ok(())
    }

    /// Persist the interval from `start_time` to now as a focus log.
    ///
    /// Skipped when signed out, in break mode, or never started. A failed
    /// insert is reported as [`Event::LogFailed`] and not retried.
    pub fn log<S: Store + ?Sized>(&self, store: &S, task: Option<&FocusingTask>) -> Event {
        self.log_at(store, task, self.clock.now())
    }

    // ── Internal ─────────────────────────────────────────────────────

    fn log_at<S: Store + ?Sized>(
        &self,
        store: &S,
        task: Option<&FocusingTask>,
        now: DateTime<Utc>,
    ) -> Event {
        let user = match store.current_user() {
            Ok(Some(user)) => user,
            Ok(None) => {
                return Event::LogSkipped {
                    reason: LogSkipReason::Unauthenticated,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "identity lookup failed, focus log dropped");
                return Event::LogFailed {
                    error: e.to_string(),
                    at: now,
                };
            }
        };

        if self.state.mode == TimerMode::Break {
            return Event::LogSkipped {
                reason: LogSkipReason::BreakMode,
            };
        }
        let Some(start_time) = self.state.start_time else {
            return Event::LogSkipped {
                reason: LogSkipReason::NotStarted,
            };
        };

        let (task_id, task_name) = task.map(FocusingTask::log_reference).unwrap_or_default();
        let log = NewLog {
            start_time,
            end_time: now,
            task_id,
            task_name,
            focus_score: None,
        };

        match store.insert_log(&user, &log) {
            Ok(log_id) => {
                tracing::debug!(log_id, user = %user, "focus log recorded");
                Event::LogRecorded {
                    log_id,
                    start_time: log.start_time,
                    end_time: log.end_time,
                    task_id: log.task_id,
                    task_name: log.task_name,
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, user = %user, "focus log insert failed");
                Event::LogFailed {
                    error: e.to_string(),
                    at: now,
                }
            }
        }
    }

    fn elapsed_since_start(&self, now: DateTime<Utc>) -> i64 {
        self.state
            .start_time
            .map(|start| (now - start).num_milliseconds())
            .unwrap_or(0)
    }
}
