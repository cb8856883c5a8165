//! Test helpers for behavioral specifications.

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic, dead_code)]

use std::path::{Path, PathBuf};
use std::process::{Command, Output};

const LOOPCTL_TIMEOUT_CONNECT_MS: &str = "2000";
const LOOPCTL_TIMEOUT_EXIT_MS: &str = "500";
const LOOPCTL_TIMEOUT_IPC_MS: &str = "500";
const LOOPCTL_CONNECT_POLL_MS: &str = "5";

fn binary_path(name: &str) -> PathBuf {
    let manifest_dir = Path::new(env!("CARGO_MANIFEST_DIR"));
    let standard = manifest_dir.join("target/debug").join(name);
    if standard.exists() {
        return standard;
    }
    if let Ok(exe) = std::env::current_exe() {
        if let Some(debug_dir) = exe.parent().and_then(|d| d.parent()) {
            let fallback = debug_dir.join(name);
            if fallback.exists() {
                return fallback;
            }
        }
    }
    standard
}

fn loopctl_binary() -> PathBuf {
    binary_path("loopctl")
}

pub fn loopctld_binary() -> PathBuf {
    binary_path("loopctld")
}

pub fn cli() -> CliBuilder {
    CliBuilder::new()
}

/// High-level builder for fluent CLI assertions, one fresh state dir per
/// test so daemons started by different tests never collide.
pub struct CliBuilder {
    args: Vec<String>,
    state_dir: Option<PathBuf>,
    envs: Vec<(String, String)>,
}

impl CliBuilder {
    fn new() -> Self {
        Self {
            args: Vec::new(),
            state_dir: None,
            envs: vec![
                ("LOOPCTL_DAEMON_BINARY".into(), loopctld_binary().to_string_lossy().into()),
                ("LOOPCTL_TIMEOUT_CONNECT_MS".into(), LOOPCTL_TIMEOUT_CONNECT_MS.into()),
                ("LOOPCTL_TIMEOUT_EXIT_MS".into(), LOOPCTL_TIMEOUT_EXIT_MS.into()),
                ("LOOPCTL_TIMEOUT_IPC_MS".into(), LOOPCTL_TIMEOUT_IPC_MS.into()),
                ("LOOPCTL_CONNECT_POLL_MS".into(), LOOPCTL_CONNECT_POLL_MS.into()),
            ],
        }
    }

    pub fn args(mut self, args: &[&str]) -> Self {
        self.args.extend(args.iter().map(|s| s.to_string()));
        self
    }

    pub fn state_dir(mut self, path: impl Into<PathBuf>) -> Self {
        self.state_dir = Some(path.into());
        self
    }

    pub fn command(self) -> Command {
        let mut cmd = Command::new(loopctl_binary());
        cmd.args(&self.args);
        if let Some(dir) = self.state_dir {
            cmd.env("LOOPCTL_STATE_DIR", dir);
        }
        for (key, value) in self.envs {
            cmd.env(key, value);
        }
        cmd
    }

    pub fn passes(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            output.status.success(),
            "expected command to pass, got exit code {:?}\nstdout: {}\nstderr: {}",
            output.status.code(),
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }

    pub fn fails(self) -> RunAssert {
        let mut cmd = self.command();
        let output = cmd.output().expect("command should run");
        assert!(
            !output.status.success(),
            "expected command to fail, but it passed\nstdout: {}\nstderr: {}",
            String::from_utf8_lossy(&output.stdout),
            String::from_utf8_lossy(&output.stderr)
        );
        RunAssert { output }
    }
}

pub struct RunAssert {
    output: Output,
}

impl RunAssert {
    pub fn stdout(&self) -> String {
        String::from_utf8_lossy(&self.output.stdout).into_owned()
    }

    pub fn stderr(&self) -> String {
        String::from_utf8_lossy(&self.output.stderr).into_owned()
    }

    pub fn stdout_has(self, expected: &str) -> Self {
        let stdout = self.stdout();
        assert!(stdout.contains(expected), "stdout does not contain '{expected}'\nstdout: {stdout}");
        self
    }

    pub fn stderr_has(self, expected: &str) -> Self {
        let stderr = self.stderr();
        assert!(stderr.contains(expected), "stderr does not contain '{expected}'\nstderr: {stderr}");
        self
    }
}

/// Stop the daemon started against `state_dir`, if any, and remove its
/// state directory. Intended for a test's teardown.
pub fn stop_daemon(state_dir: &Path) {
    let pid_path = state_dir.join("daemon.pid");
    if let Ok(pid) = std::fs::read_to_string(&pid_path) {
        if let Ok(pid) = pid.trim().parse::<i32>() {
            let _ = Command::new("kill").args(["-15", &pid.to_string()]).status();
            std::thread::sleep(std::time::Duration::from_millis(200));
        }
    }
}
