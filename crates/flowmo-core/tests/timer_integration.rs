//! Integration tests for the timer engine against the SQLite store.
//!
//! Covers the focus → break → focus cycle end to end and checks the engine
//! invariants over arbitrary command sequences.

use std::sync::Arc;

use chrono::{Duration, TimeZone, Utc};
use flowmo_core::notify::{AlarmQueue, SilentNotifier};
use flowmo_core::storage::Store;
use flowmo_core::{
    Clock, Database, Event, FocusingTask, ManualClock, TaskSource, TimerEngine, TimerMode,
    TimerStatus,
};
use proptest::prelude::*;

fn setup() -> (TimerEngine, ManualClock, Database) {
    let clock = ManualClock::new(Utc.with_ymd_and_hms(2026, 3, 2, 9, 0, 0).unwrap());
    let engine = TimerEngine::with_clock(Arc::new(clock.clone()));
    let db = Database::open_memory().unwrap();
    db.sign_in("ada").unwrap();
    (engine, clock, db)
}

fn log_count(db: &Database) -> usize {
    db.recent_logs("ada", 10_000).unwrap().len()
}

#[test]
fn test_full_focus_break_cycle() {
    let (mut engine, clock, db) = setup();
    let queue = AlarmQueue::new(&db);
    let task = FocusingTask {
        id: "12".into(),
        name: "Write report".into(),
        source: TaskSource::Flowmo,
    };

    engine.start(&queue).unwrap();
    clock.advance(Duration::minutes(25));
    let events = engine.stop(&db, Some(&task));
    assert!(matches!(
        events[0],
        Event::LogRecorded {
            task_id: Some(12),
            ..
        }
    ));
    assert_eq!(engine.mode(), TimerMode::Break);
    assert_eq!(engine.state().total_time_ms, 300_000);
    assert_eq!(engine.state().display_time_secs, 300);

    // Break: alarm queued one second after the countdown ends.
    let break_start = clock.now();
    engine.start(&queue).unwrap();
    let pending = queue.pending().unwrap();
    assert_eq!(pending.len(), 1);
    assert_eq!(
        pending[0].fire_at,
        break_start + Duration::minutes(5) + Duration::seconds(1)
    );

    clock.advance(Duration::minutes(2));
    assert!(engine.tick(&db).is_empty());
    assert_eq!(engine.state().display_time_secs, 180);

    clock.advance(Duration::minutes(3));
    let events = engine.tick(&db);
    assert!(events.iter().any(|e| matches!(e, Event::BreakElapsed { .. })));
    assert_eq!(engine.status(), TimerStatus::Idle);
    assert_eq!(engine.mode(), TimerMode::Focus);
    assert_eq!(engine.state().display_time_secs, 0);
    assert_eq!(engine.state().total_time_ms, 0);

    // The crossing is handled once.
    clock.advance(Duration::seconds(1));
    assert!(engine.tick(&db).is_empty());

    assert_eq!(log_count(&db), 1);
    let due = queue.take_due(clock.now()).unwrap();
    assert_eq!(due.len(), 1);
}

#[test]
fn test_manual_break_stop_dismisses_alarm() {
    let (mut engine, clock, db) = setup();
    let queue = AlarmQueue::new(&db);

    engine.start(&queue).unwrap();
    clock.advance(Duration::minutes(25));
    engine.stop(&db, None);
    engine.start(&queue).unwrap();
    assert_eq!(queue.pending().unwrap().len(), 1);

    // Still in the break: nothing to withdraw yet.
    engine.dismiss_alarm(&queue).unwrap();
    assert_eq!(queue.pending().unwrap().len(), 1);

    clock.advance(Duration::minutes(1));
    engine.stop(&db, None);
    assert_eq!(engine.mode(), TimerMode::Focus);
    engine.dismiss_alarm(&queue).unwrap();
    assert!(queue.pending().unwrap().is_empty());
    assert!(engine.state().alarm_id.is_none());

    clock.advance(Duration::minutes(10));
    assert!(queue.take_due(clock.now()).unwrap().is_empty());
}

#[test]
fn test_elapsed_break_keeps_alarm_queued() {
    let (mut engine, clock, db) = setup();
    let queue = AlarmQueue::new(&db);

    engine.start(&queue).unwrap();
    clock.advance(Duration::minutes(25));
    engine.stop(&db, None);
    engine.start(&queue).unwrap();

    clock.advance(Duration::minutes(5));
    engine.tick(&db);
    assert_eq!(engine.status(), TimerStatus::Idle);
    engine.dismiss_alarm(&queue).unwrap();
    assert_eq!(queue.pending().unwrap().len(), 1);
}

#[test]
fn test_stop_while_paused_never_logs() {
    let (mut engine, clock, db) = setup();
    engine.start(&SilentNotifier).unwrap();
    clock.advance(Duration::minutes(10));
    engine.pause(&db, None);
    assert_eq!(log_count(&db), 1);

    clock.advance(Duration::minutes(10));
    let events = engine.stop(&db, None);
    assert!(matches!(events[..], [Event::PauseDiscarded { .. }]));
    assert_eq!(log_count(&db), 1);
    assert_eq!(engine.mode(), TimerMode::Break);
    assert_eq!(engine.state().total_time_ms, 120_000);
}

#[test]
fn test_break_ratio_is_read_at_stop() {
    let (mut engine, clock, db) = setup();
    engine.start(&SilentNotifier).unwrap();
    clock.advance(Duration::minutes(30));
    db.set_break_ratio("ada", 3.0).unwrap();
    engine.stop(&db, None);
    assert_eq!(engine.state().total_time_ms, 600_000);
}

#[test]
fn test_signed_out_cycle_uses_defaults_and_skips_logs() {
    let (mut engine, clock, db) = setup();
    db.set_break_ratio("ada", 2.0).unwrap();
    db.sign_out().unwrap();

    engine.start(&SilentNotifier).unwrap();
    clock.advance(Duration::minutes(25));
    engine.stop(&db, None);
    assert_eq!(engine.state().total_time_ms, 300_000);
    assert_eq!(log_count(&db), 0);
}

#[derive(Debug, Clone)]
enum Op {
    Start,
    Stop,
    Pause,
    Resume,
    Tick,
    Advance(i64),
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        Just(Op::Start),
        Just(Op::Stop),
        Just(Op::Pause),
        Just(Op::Resume),
        Just(Op::Tick),
        (1_i64..900_000).prop_map(Op::Advance),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn timer_invariants_hold(ops in prop::collection::vec(op(), 1..60)) {
        let (mut engine, clock, db) = setup();

        for op in ops {
            let status = engine.status();
            let mode = engine.mode();
            let total = engine.state().total_time_ms;
            let logs = log_count(&db);

            match op {
                Op::Start => {
                    engine.start(&SilentNotifier).unwrap();
                }
                Op::Stop => {
                    engine.stop(&db, None);
                    prop_assert_eq!(engine.status(), TimerStatus::Idle);
                    match status {
                        TimerStatus::Idle => {
                            prop_assert_eq!(engine.mode(), mode);
                        }
                        TimerStatus::Paused => {
                            prop_assert_eq!(log_count(&db), logs);
                            prop_assert_eq!(engine.mode(), mode.flipped());
                            prop_assert_eq!(
                                engine.state().total_time_ms,
                                (total as f64 / 5.0) as i64
                            );
                        }
                        TimerStatus::Running => {
                            let expected = usize::from(mode == TimerMode::Focus);
                            prop_assert_eq!(log_count(&db), logs + expected);
                            prop_assert_eq!(engine.mode(), mode.flipped());
                        }
                    }
                }
                Op::Pause => {
                    engine.pause(&db, None);
                }
                Op::Resume => {
                    engine.resume();
                }
                Op::Tick => {
                    engine.tick(&db);
                }
                Op::Advance(ms) => clock.advance(Duration::milliseconds(ms)),
            }

            if engine.status() == TimerStatus::Running {
                prop_assert!(engine.state().start_time.is_some());
            }
            prop_assert!(engine.state().total_time_ms >= 0);
        }
    }
}
