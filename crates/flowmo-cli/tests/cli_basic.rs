//! Basic CLI E2E tests.
//!
//! Tests run the built binary against a throwaway home directory and
//! verify outputs.

mod common;

use std::thread;
use std::time::Duration;

use common::{parse_json, Sandbox};
use serde_json::Value;

#[test]
fn test_commands_require_sign_in() {
    let sb = Sandbox::new();
    let stderr = sb.run_cli_failure(&["task", "list"]);
    assert!(stderr.contains("error: not signed in"));
}

#[test]
fn test_auth_roundtrip() {
    let sb = Sandbox::new();
    assert_eq!(sb.run_cli_success(&["auth", "whoami"]).trim(), "not signed in");
    sb.run_cli_success(&["auth", "login", "ada"]);
    assert_eq!(sb.run_cli_success(&["auth", "whoami"]).trim(), "ada");
    sb.run_cli_success(&["auth", "logout"]);
    assert_eq!(sb.run_cli_success(&["auth", "whoami"]).trim(), "not signed in");
}

#[test]
fn test_task_lifecycle() {
    let sb = Sandbox::new();
    sb.run_cli_success(&["auth", "login", "ada"]);

    let task: Value = parse_json(&sb.run_cli_success(&["task", "add", "Write report"]));
    let id = task["id"].as_i64().unwrap().to_string();

    let open: Vec<Value> = parse_json(&sb.run_cli_success(&["task", "list"]));
    assert_eq!(open.len(), 1);
    assert_eq!(open[0]["name"], "Write report");

    sb.run_cli_success(&["task", "complete", &id]);
    let open: Vec<Value> = parse_json(&sb.run_cli_success(&["task", "list"]));
    assert!(open.is_empty());
    let done: Vec<Value> = parse_json(&sb.run_cli_success(&["task", "list", "--completed"]));
    assert_eq!(done.len(), 1);

    sb.run_cli_failure(&["task", "complete", "999"]);
}

#[test]
fn test_break_ratio_defaults_and_updates() {
    let sb = Sandbox::new();
    assert_eq!(sb.run_cli_success(&["settings", "break-ratio"]).trim(), "5");

    sb.run_cli_success(&["auth", "login", "ada"]);
    sb.run_cli_success(&["settings", "break-ratio", "3"]);
    assert_eq!(sb.run_cli_success(&["settings", "break-ratio"]).trim(), "3");

    sb.run_cli_failure(&["settings", "break-ratio", "0"]);
}

#[test]
fn test_timer_focus_cycle() {
    let sb = Sandbox::new();
    sb.run_cli_success(&["auth", "login", "ada"]);

    let started = sb.run_cli_success(&["timer", "start"]);
    let event: Value = parse_json(started.lines().next().unwrap());
    assert_eq!(event["type"], "timer_started");
    assert_eq!(event["mode"], "focus");

    let status: Value = parse_json(&sb.run_cli_success(&["timer", "status"]));
    assert_eq!(status["status"], "running");

    let stopped =
        sb.run_cli_success(&["timer", "stop", "--task-name", "Inbox", "--source", "todoist"]);
    let lines: Vec<Value> = stopped.lines().map(parse_json::<Value>).collect();
    assert_eq!(lines[0]["type"], "log_recorded");
    assert_eq!(lines[0]["task_name"], "Inbox");
    // Today's stats follow a recorded log.
    assert_eq!(lines[1]["sessions"], 1);
    assert_eq!(lines.last().unwrap()["type"], "timer_stopped");
    assert_eq!(lines.last().unwrap()["to"], "break");

    let stats: Value = parse_json(&sb.run_cli_success(&["stats", "today"]));
    assert_eq!(stats["sessions"], 1);
}

#[test]
fn test_watch_does_not_revert_stop_from_another_shell() {
    let sb = Sandbox::new();
    sb.run_cli_success(&["auth", "login", "ada"]);
    sb.run_cli_success(&["config", "set", "timer.tick_interval_ms", "100"]);
    sb.run_cli_success(&["timer", "start"]);

    let mut watch = sb.spawn_cli(&["timer", "watch"]);
    thread::sleep(Duration::from_millis(500));

    sb.run_cli_success(&["timer", "stop"]);
    // Give the watch loop several ticks to overwrite the stop.
    thread::sleep(Duration::from_millis(800));

    let status: Value = parse_json(&sb.run_cli_success(&["timer", "status"]));
    watch.kill().expect("Failed to stop watch");
    let _ = watch.wait();

    assert_eq!(status["status"], "idle");
    assert_eq!(status["mode"], "break");

    sb.run_cli_success(&["timer", "stop"]);
    let stats: Value = parse_json(&sb.run_cli_success(&["stats", "all"]));
    assert_eq!(stats["sessions"], 1);
}

#[test]
fn test_insights_for_new_user() {
    let sb = Sandbox::new();
    sb.run_cli_success(&["auth", "login", "ada"]);

    let agents: Vec<Value> = parse_json(&sb.run_cli_success(&["insights", "list"]));
    assert_eq!(agents.len(), 4);

    let all: Value = parse_json(&sb.run_cli_success(&["insights", "all"]));
    assert_eq!(all["Analytics Agent"]["success"], true);
    assert_eq!(all["Analytics Agent"]["data"]["insights"][0]["type"], "welcome");

    let stderr = sb.run_cli_failure(&["insights", "run", "Sleep Agent"]);
    assert!(stderr.contains("Agent \"Sleep Agent\" not found"));
}

#[test]
fn test_config_get_set() {
    let sb = Sandbox::new();
    assert_eq!(
        sb.run_cli_success(&["config", "get", "timer.tick_interval_ms"]).trim(),
        "1000"
    );
    sb.run_cli_success(&["config", "set", "timer.tick_interval_ms", "250"]);
    assert_eq!(
        sb.run_cli_success(&["config", "get", "timer.tick_interval_ms"]).trim(),
        "250"
    );
    sb.run_cli_failure(&["config", "get", "timer.nope"]);
}

#[test]
fn test_completions() {
    let sb = Sandbox::new();
    let script = sb.run_cli_success(&["completions", "bash"]);
    assert!(script.contains("flowmo"));
}
