use std::sync::Arc;

use chrono::{Local, Utc};
use clap::{Args, Subcommand};
use flowmo_core::notify::{AlarmQueue, DueAlert, Notifier, SilentNotifier};
use flowmo_core::storage::Store;
use flowmo_core::{
    Config, Database, Event, FocusingTask, SystemClock, TaskSource, TimerEngine, TimerState,
};

use super::print_json;

const STATE_KEY: &str = "timer_state";

#[derive(Subcommand)]
pub enum TimerAction {
    /// Start a focus cycle, or the pending break
    Start,
    /// Stop the current cycle and switch between focus and break
    Stop {
        #[command(flatten)]
        task: TaskArgs,
    },
    /// Pause the running cycle
    Pause {
        #[command(flatten)]
        task: TaskArgs,
    },
    /// Resume a paused cycle
    Resume,
    /// Print current timer state as JSON
    Status,
    /// Keep ticking until Ctrl-C, ringing alarms as they fall due
    Watch,
}

/// The task credited with the focus interval being logged.
#[derive(Args, Debug, Default)]
pub struct TaskArgs {
    /// Task ID
    #[arg(long)]
    task_id: Option<String>,
    /// Task name
    #[arg(long)]
    task_name: Option<String>,
    /// Where the task comes from (flowmo, todoist, ticktick, microsofttodo)
    #[arg(long, default_value = "flowmo")]
    source: TaskSource,
}

impl TaskArgs {
    fn focusing_task(self) -> Option<FocusingTask> {
        if self.task_id.is_none() && self.task_name.is_none() {
            return None;
        }
        Some(FocusingTask {
            id: self.task_id.unwrap_or_default(),
            name: self.task_name.unwrap_or_default(),
            source: self.source,
        })
    }
}

fn load_engine(db: &Database) -> TimerEngine {
    let state = match db.kv_get(STATE_KEY) {
        Ok(Some(json)) => serde_json::from_str::<TimerState>(&json).unwrap_or_else(|e| {
            tracing::warn!(error = %e, "stored timer state unreadable, starting fresh");
            TimerState::default()
        }),
        Ok(None) => TimerState::default(),
        Err(e) => {
            tracing::warn!(error = %e, "timer state unavailable, starting fresh");
            TimerState::default()
        }
    };
    TimerEngine::from_state(state, Arc::new(SystemClock))
}

fn save_engine(db: &Database, engine: &TimerEngine) -> Result<(), Box<dyn std::error::Error>> {
    let json = serde_json::to_string(engine.state())?;
    db.kv_set(STATE_KEY, &json)?;
    Ok(())
}

/// Print events; a recorded log also prints today's refreshed stats.
fn emit(db: &Database, events: &[Event]) -> Result<(), Box<dyn std::error::Error>> {
    for event in events {
        println!("{}", serde_json::to_string(event)?);
        if matches!(event, Event::LogRecorded { .. }) {
            if let Some(user) = db.current_user()? {
                let midnight = Local::now()
                    .date_naive()
                    .and_hms_opt(0, 0, 0)
                    .and_then(|t| t.and_local_timezone(Local).earliest())
                    .map(|t| t.with_timezone(&Utc))
                    .unwrap_or_else(Utc::now);
                let stats = db.stats_since(&user, midnight)?;
                println!("{}", serde_json::to_string(&stats)?);
            }
        }
    }
    Ok(())
}

fn ring(alert: &DueAlert) {
    tracing::info!(id = %alert.id, "alarm due");
    eprintln!("\x07{}: {}", alert.title, alert.body);
}

pub fn run(action: TimerAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let config = Config::load_or_default();
    let mut engine = load_engine(&db);

    let events = match action {
        TimerAction::Start => {
            let queue = AlarmQueue::new(&db);
            let notifier: &dyn Notifier = if config.notifications.enabled {
                &queue
            } else {
                &SilentNotifier
            };
            // The transition stands even if scheduling the alarm failed.
            let result = engine.start(notifier);
            save_engine(&db, &engine)?;
            result?
        }
        TimerAction::Stop { task } => {
            let events = engine.stop(&db, task.focusing_task().as_ref());
            if let Err(e) = engine.dismiss_alarm(&AlarmQueue::new(&db)) {
                tracing::warn!(error = %e, "break alarm could not be dismissed");
            }
            events
        }
        TimerAction::Pause { task } => engine.pause(&db, task.focusing_task().as_ref()),
        TimerAction::Resume => engine.resume(),
        TimerAction::Status => {
            let events = engine.tick(&db);
            print_json(&engine.snapshot())?;
            events
        }
        TimerAction::Watch => {
            let tick_ms = config.timer.tick_interval_ms.max(50);
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()?;
            return runtime.block_on(watch(&db, tick_ms));
        }
    };

    emit(&db, &events)?;
    save_engine(&db, &engine)?;
    Ok(())
}

/// Tick loop for `timer watch`.
///
/// The state is reloaded on every tick and written back only when the tick
/// itself changed it, so commands run from other shells are never reverted.
async fn watch(db: &Database, tick_ms: u64) -> Result<(), Box<dyn std::error::Error>> {
    let queue = AlarmQueue::new(db);
    let mut interval = tokio::time::interval(std::time::Duration::from_millis(tick_ms));
    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);
    let mut last_display = None;

    loop {
        tokio::select! {
            _ = interval.tick() => {
                let mut engine = load_engine(db);
                let events = engine.tick(db);
                if !events.is_empty() {
                    save_engine(db, &engine)?;
                }
                emit(db, &events)?;
                for alert in queue.take_due(Utc::now())? {
                    ring(&alert);
                }
                let display = engine.state().display_time_secs;
                if last_display != Some(display) {
                    eprint!("\r{:?} {:?} {display}s   ", engine.mode(), engine.status());
                    last_display = Some(display);
                }
            }
            _ = &mut ctrl_c => {
                eprintln!();
                break;
            }
        }
    }
    Ok(())
}
