//! Integration tests for the microagents manager.
//!
//! Runs the full agent set against the SQLite store, including stores that
//! fail or panic part-way through an aggregation.

use std::sync::Arc;

use chrono::{DateTime, Duration, TimeZone, Utc};
use flowmo_core::error::{CoreError, Result};
use flowmo_core::microagents::{
    AgentData, BreakRecommendationType, MicroagentsManager, WELCOME_MESSAGE,
};
use flowmo_core::storage::{LogRow, NewLog, Store, TaskFilter, TaskRow, UserId, UserPreferences};
use flowmo_core::{Database, ManualClock};

fn at(h: u32, m: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 3, 2, h, m, 0).unwrap()
}

fn record(db: &Database, start: DateTime<Utc>, end: DateTime<Utc>) {
    db.insert_log(
        "ada",
        &NewLog {
            start_time: start,
            end_time: end,
            task_id: None,
            task_name: None,
            focus_score: None,
        },
    )
    .unwrap();
}

/// How the wrapped store misbehaves on task reads.
#[derive(Clone, Copy)]
enum Fault {
    Error,
    Panic,
}

/// Delegates to a real database but breaks `tasks`.
struct FaultyStore {
    db: Database,
    fault: Fault,
}

impl Store for FaultyStore {
    fn current_user(&self) -> Result<Option<UserId>> {
        self.db.current_user()
    }

    fn break_ratio(&self, user_id: &str) -> Result<Option<f64>> {
        self.db.break_ratio(user_id)
    }

    fn set_break_ratio(&self, user_id: &str, ratio: f64) -> Result<()> {
        self.db.set_break_ratio(user_id, ratio)
    }

    fn preferences(&self, user_id: &str) -> Result<Option<UserPreferences>> {
        self.db.preferences(user_id)
    }

    fn save_preferences(&self, user_id: &str, preferences: &UserPreferences) -> Result<()> {
        self.db.save_preferences(user_id, preferences)
    }

    fn insert_log(&self, user_id: &str, log: &NewLog) -> Result<i64> {
        self.db.insert_log(user_id, log)
    }

    fn recent_logs(&self, user_id: &str, limit: usize) -> Result<Vec<LogRow>> {
        self.db.recent_logs(user_id, limit)
    }

    fn tasks(&self, _user_id: &str, _filter: TaskFilter) -> Result<Vec<TaskRow>> {
        match self.fault {
            Fault::Error => Err(CoreError::Custom("tasks table unavailable".into())),
            Fault::Panic => panic!("tasks table exploded"),
        }
    }

    fn insert_task(&self, user_id: &str, name: &str) -> Result<TaskRow> {
        self.db.insert_task(user_id, name)
    }

    fn set_task_completed(&self, user_id: &str, task_id: i64, completed: bool) -> Result<()> {
        self.db.set_task_completed(user_id, task_id, completed)
    }
}

fn faulty(fault: Fault) -> FaultyStore {
    let db = Database::open_memory().unwrap();
    record(&db, at(9, 0), at(9, 25));
    FaultyStore { db, fault }
}

fn clock() -> Arc<ManualClock> {
    Arc::new(ManualClock::new(at(11, 20)))
}

#[test]
fn test_store_errors_become_failed_responses() {
    let store = faulty(Fault::Error);
    let manager = MicroagentsManager::with_clock(&store, clock());
    let results = manager.execute_all("ada", None);

    assert_eq!(results.len(), 4);
    assert!(results["Focus Agent"].success);
    assert!(results["Break Agent"].success);

    let task = &results["Task Agent"];
    assert!(!task.success);
    assert_eq!(
        task.message,
        "Failed to generate task recommendations: tasks table unavailable"
    );
    assert!(task.data.is_none());

    let analytics = &results["Analytics Agent"];
    assert!(!analytics.success);
    assert!(analytics
        .message
        .starts_with("Failed to generate productivity insights:"));
}

#[test]
fn test_panicking_agent_does_not_abort_aggregation() {
    let store = faulty(Fault::Panic);
    let manager = MicroagentsManager::with_clock(&store, clock());
    let results = manager.execute_all("ada", None);

    assert_eq!(results.len(), 4);
    assert!(results["Focus Agent"].success);
    assert!(results["Break Agent"].success);
    assert_eq!(
        results["Task Agent"].message,
        "Agent execution failed: tasks table exploded"
    );
    assert!(!results["Analytics Agent"].success);
}

#[test]
fn test_back_to_back_sessions_recommend_mental_break() {
    let db = Database::open_memory().unwrap();
    record(&db, at(10, 0), at(10, 25));
    record(&db, at(10, 26), at(10, 50));
    record(&db, at(10, 51), at(11, 15));

    let manager = MicroagentsManager::with_clock(&db, clock());
    let response = manager.execute_agent("Break Agent", "ada", None);
    assert!(response.success);

    let Some(AgentData::Break { recommendations }) = response.data else {
        panic!("expected break data");
    };
    assert_eq!(recommendations.len(), 1);
    assert_eq!(recommendations[0].kind, BreakRecommendationType::MentalBreak);
    assert_eq!(recommendations[0].duration, 15);
}

#[test]
fn test_long_break_duration_comes_from_preferences() {
    let db = Database::open_memory().unwrap();
    record(&db, at(10, 0), at(10, 25));
    record(&db, at(10, 26), at(10, 50));
    record(&db, at(10, 51), at(11, 15));
    let prefs = UserPreferences {
        long_break_duration: 30,
        ..UserPreferences::default()
    };
    db.save_preferences("ada", &prefs).unwrap();

    let manager = MicroagentsManager::with_clock(&db, clock());
    let response = manager.execute_agent("Break Agent", "ada", None);
    let Some(AgentData::Break { recommendations }) = response.data else {
        panic!("expected break data");
    };
    assert_eq!(recommendations[0].duration, 30);
}

#[test]
fn test_new_user_gets_welcome_and_no_task_hint() {
    let db = Database::open_memory().unwrap();
    let manager = MicroagentsManager::with_clock(&db, clock());
    let results = manager.execute_all("newcomer", None);

    assert_eq!(
        results["Analytics Agent"].recommendations,
        vec![WELCOME_MESSAGE.to_string()]
    );
    assert_eq!(
        results["Task Agent"].recommendations,
        vec!["No active tasks found. Consider adding some tasks to get started!".to_string()]
    );
    assert!(results["Break Agent"].recommendations.is_empty());
}

#[test]
fn test_history_is_limited_to_recent_logs() {
    let db = Database::open_memory().unwrap();
    let base = at(0, 0) - Duration::days(30);
    for i in 0..60 {
        let start = base + Duration::hours(i);
        record(&db, start, start + Duration::minutes(25));
    }
    let manager = MicroagentsManager::with_clock(&db, clock());
    let response = manager.execute_agent("Focus Agent", "ada", None);
    // Everything is older than a day, so only the low-focus tip applies.
    assert_eq!(response.recommendations.len(), 1);
}
