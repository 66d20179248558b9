//! Common utilities for CLI E2E tests.

use std::process::{Child, Command, Stdio};

use tempfile::TempDir;

/// A scratch home directory so each test gets its own database and config.
pub struct Sandbox {
    home: TempDir,
}

impl Sandbox {
    pub fn new() -> Self {
        Self {
            home: TempDir::new().expect("Failed to create temp home"),
        }
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(env!("CARGO_BIN_EXE_flowmo"));
        cmd.args(args)
            .env("HOME", self.home.path())
            .env("RUST_LOG", "off")
            .env_remove("FLOWMO_ENV");
        cmd
    }

    /// Invoke a CLI command and return `(stdout, stderr, code)`.
    pub fn run_cli(&self, args: &[&str]) -> (String, String, i32) {
        let output = self
            .command(args)
            .output()
            .expect("Failed to execute CLI command");

        let stdout = String::from_utf8_lossy(&output.stdout).to_string();
        let stderr = String::from_utf8_lossy(&output.stderr).to_string();
        let code = output.status.code().unwrap_or(-1);

        (stdout, stderr, code)
    }

    /// Start a long-running CLI command in the background.
    pub fn spawn_cli(&self, args: &[&str]) -> Child {
        self.command(args)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .expect("Failed to spawn CLI command")
    }

    /// Invoke a CLI command and expect success.
    pub fn run_cli_success(&self, args: &[&str]) -> String {
        let (stdout, stderr, code) = self.run_cli(args);
        assert_eq!(code, 0, "CLI command failed: {args:?}\nstderr: {stderr}");
        stdout
    }

    /// Invoke a CLI command and expect failure, returning stderr.
    pub fn run_cli_failure(&self, args: &[&str]) -> String {
        let (_, stderr, code) = self.run_cli(args);
        assert_ne!(code, 0, "CLI command unexpectedly succeeded: {args:?}");
        stderr
    }
}

/// Parse JSON output from CLI.
pub fn parse_json<T: for<'de> serde::Deserialize<'de>>(json: &str) -> T {
    serde_json::from_str(json).expect("Failed to parse JSON output")
}
