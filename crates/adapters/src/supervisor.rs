// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The process supervisor: spawns and tracks child agent processes,
//! bridges their stdio to the output parser, and enforces lifecycle
//! signals.
//!
//! Owns a process table keyed by loop id. Refuses to spawn a second
//! process for a loop already present, preserving the at-most-one-child
//! invariant the engine relies on.

use crate::agent::{AgentAdapter, LaunchSpec};
use crate::parser::{OutputParser, ParserEvent};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::process::{Child, Command};
use tokio::sync::{mpsc, Mutex as AsyncMutex};

/// Grace period between "terminate" and "kill" on stop, per the documented
/// bound of ~2s (total stop latency must stay ≤5s).
pub const STOP_GRACE: Duration = Duration::from_secs(2);

#[derive(Debug, Error)]
pub enum SupervisorError {
    #[error("a process is already attached to loop {0}")]
    AlreadyRunning(String),
    #[error("no live process for loop {0}")]
    NotRunning(String),
    #[error("failed to spawn: {0}")]
    SpawnFailed(#[from] std::io::Error),
    #[error("signal delivery failed: {0}")]
    SignalFailed(String),
}

/// Event delivered from a supervised child to whoever is driving the
/// engine loop for a given loop id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SupervisorEvent {
    /// A parsed event from stdout or stderr, in the order it was observed
    /// on that stream. Ordering across the two streams is not guaranteed;
    /// ordering within a single loop's log writes still holds because the
    /// journal append serializes them.
    Parsed(ParserEvent),
    /// The child process has exited.
    Exit { code: Option<i32> },
}

struct ProcessEntry {
    pid: u32,
    stdin: Arc<AsyncMutex<tokio::process::ChildStdin>>,
    /// Set once `stop` has been requested, so the exit handler can tell
    /// an operator-initiated stop from an unexpected exit.
    stopped: Arc<std::sync::atomic::AtomicBool>,
}

/// Spawns, signals, and reaps child agent processes.
#[derive(Clone, Default)]
pub struct ProcessSupervisor {
    processes: Arc<Mutex<HashMap<String, ProcessEntry>>>,
}

impl ProcessSupervisor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_live_process(&self, loop_id: &str) -> bool {
        self.processes.lock().contains_key(loop_id)
    }

    /// Spawn a child for `loop_id` using `spec` as argv (never a shell),
    /// with `cwd` as its working directory and the environment inherited.
    /// Stdout and stderr are read concurrently, fed through `adapter`'s
    /// session-id recognition and the token parser; every event is sent
    /// on the returned channel, terminated by exactly one `Exit` event.
    pub fn spawn(
        &self,
        loop_id: &str,
        spec: LaunchSpec,
        cwd: &Path,
        adapter: Arc<dyn AgentAdapter>,
    ) -> Result<mpsc::Receiver<SupervisorEvent>, SupervisorError> {
        if self.has_live_process(loop_id) {
            return Err(SupervisorError::AlreadyRunning(loop_id.to_string()));
        }

        let mut child = Command::new(&spec.cmd)
            .args(&spec.args)
            .current_dir(cwd)
            .stdin(std::process::Stdio::piped())
            .stdout(std::process::Stdio::piped())
            .stderr(std::process::Stdio::piped())
            .spawn()?;

        let pid = child.id().unwrap_or(0);
        let stdin = child.stdin.take().expect("stdin was piped");
        let stdout = child.stdout.take().expect("stdout was piped");
        let stderr = child.stderr.take().expect("stderr was piped");

        let (tx, rx) = mpsc::channel(256);
        let stopped = Arc::new(std::sync::atomic::AtomicBool::new(false));

        spawn_reader(stdout, adapter.clone(), tx.clone());
        spawn_reader(stderr, adapter, tx.clone());
        spawn_reaper(child, tx);

        self.processes.lock().insert(
            loop_id.to_string(),
            ProcessEntry {
                pid,
                stdin: Arc::new(AsyncMutex::new(stdin)),
                stopped,
            },
        );

        Ok(rx)
    }

    pub fn pid(&self, loop_id: &str) -> Option<u32> {
        self.processes.lock().get(loop_id).map(|e| e.pid)
    }

    /// Write `message` followed by a newline to the child's stdin.
    pub async fn intervene(&self, loop_id: &str, message: &str) -> Result<(), SupervisorError> {
        let stdin = {
            let table = self.processes.lock();
            table
                .get(loop_id)
                .map(|e| e.stdin.clone())
                .ok_or_else(|| SupervisorError::NotRunning(loop_id.to_string()))?
        };
        let mut stdin = stdin.lock().await;
        stdin.write_all(message.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    /// Send the OS "stop" signal (SIGSTOP). Platforms lacking the
    /// primitive should never reach this call — the engine falls back to
    /// cross-session resume semantics instead, per the supervisor
    /// contract's graceful-degradation note.
    #[cfg(unix)]
    pub fn pause(&self, loop_id: &str) -> Result<(), SupervisorError> {
        self.signal(loop_id, nix::sys::signal::Signal::SIGSTOP)
    }

    #[cfg(unix)]
    pub fn resume(&self, loop_id: &str) -> Result<(), SupervisorError> {
        self.signal(loop_id, nix::sys::signal::Signal::SIGCONT)
    }

    #[cfg(unix)]
    fn signal(&self, loop_id: &str, sig: nix::sys::signal::Signal) -> Result<(), SupervisorError> {
        let pid = self
            .pid(loop_id)
            .ok_or_else(|| SupervisorError::NotRunning(loop_id.to_string()))?;
        nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), sig)
            .map_err(|e| SupervisorError::SignalFailed(e.to_string()))
    }

    /// Terminate, then after [`STOP_GRACE`] kill if still alive.
    #[cfg(unix)]
    pub async fn stop(&self, loop_id: &str) -> Result<(), SupervisorError> {
        let pid = self
            .pid(loop_id)
            .ok_or_else(|| SupervisorError::NotRunning(loop_id.to_string()))?;
        if let Some(entry) = self.processes.lock().get(loop_id) {
            entry.stopped.store(true, std::sync::atomic::Ordering::SeqCst);
        }
        let raw_pid = nix::unistd::Pid::from_raw(pid as i32);
        let _ = nix::sys::signal::kill(raw_pid, nix::sys::signal::Signal::SIGTERM);
        tokio::time::sleep(STOP_GRACE).await;
        if pid_is_alive(pid) {
            let _ = nix::sys::signal::kill(raw_pid, nix::sys::signal::Signal::SIGKILL);
        }
        Ok(())
    }

    /// Whether this loop's stop was operator-initiated, for exit-status
    /// interpretation per the supervisor's exit-detection rules.
    pub fn was_stopped(&self, loop_id: &str) -> bool {
        self.processes
            .lock()
            .get(loop_id)
            .map(|e| e.stopped.load(std::sync::atomic::Ordering::SeqCst))
            .unwrap_or(false)
    }

    /// Drop the process-table entry once the caller has consumed the
    /// terminal `Exit` event.
    pub fn reap(&self, loop_id: &str) {
        self.processes.lock().remove(loop_id);
    }
}

#[cfg(unix)]
fn pid_is_alive(pid: u32) -> bool {
    nix::sys::signal::kill(nix::unistd::Pid::from_raw(pid as i32), None).is_ok()
}

fn spawn_reader<R>(stream: R, adapter: Arc<dyn AgentAdapter>, tx: mpsc::Sender<SupervisorEvent>)
where
    R: tokio::io::AsyncRead + Unpin + Send + 'static,
{
    tokio::spawn(async move {
        let mut reader = BufReader::new(stream);
        let mut parser = OutputParser::new();
        let mut line = String::new();
        loop {
            line.clear();
            match reader.read_line(&mut line).await {
                Ok(0) => break,
                Ok(_) => {
                    for event in parser.feed(adapter.as_ref(), &line) {
                        if tx.send(SupervisorEvent::Parsed(event)).await.is_err() {
                            return;
                        }
                    }
                }
                Err(_) => break,
            }
        }
    });
}

fn spawn_reaper(mut child: Child, tx: mpsc::Sender<SupervisorEvent>) {
    tokio::spawn(async move {
        let status = child.wait().await;
        let code = status.ok().and_then(|s| s.code());
        let _ = tx.send(SupervisorEvent::Exit { code }).await;
    });
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
