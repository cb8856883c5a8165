// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, the exclusive lock file
//! that keeps a second daemon from starting against the same state
//! directory.

use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use fs2::FileExt;
use loopctl_adapters::{AgentRegistry, GenericAdapter, GhIssueTracker, ProcessSupervisor, StreamingJsonAdapter};
use loopctl_core::SystemClock;
use loopctl_engine::LoopEngine;
use loopctl_storage::{Journal, StateStore};
use thiserror::Error;
use tokio::net::UnixListener;
use tracing::{info, warn};

/// The concrete engine type this daemon drives — one issue tracker
/// (`gh`-backed) and the real wall clock, aliased to one concrete adapter
/// stack rather than carrying generics through `main`.
pub type Engine = LoopEngine<GhIssueTracker, SystemClock>;

/// Daemon configuration: every path the daemon touches, all rooted under
/// one state directory.
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub socket_path: PathBuf,
    pub lock_path: PathBuf,
    pub version_path: PathBuf,
    pub log_path: PathBuf,
}

impl Config {
    /// Load configuration for the user-level daemon. One daemon serves
    /// every repo for a user; there is no per-project instance.
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = crate::env::state_dir()?;
        Ok(Self {
            socket_path: state_dir.join("daemon.sock"),
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            state_dir,
        })
    }
}

/// Daemon state during operation. The listener is returned separately so
/// it can be spawned as its own task.
pub struct DaemonState {
    pub config: Config,
    #[allow(dead_code)] // held only to keep the exclusive lock until drop
    lock_file: File,
    pub engine: Engine,
    pub start_time: Instant,
}

pub struct StartupResult {
    pub daemon: DaemonState,
    pub listener: UnixListener,
    /// Number of loops flipped to `paused(prevSession)` by the startup
    /// orphan sweep, for the startup log line.
    pub orphans_swept: usize,
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,
    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),
    #[error("failed to bind socket at {0}: {1}")]
    BindFailed(PathBuf, std::io::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("agent registry error: {0}")]
    Agent(#[from] loopctl_adapters::AgentError),
    #[error("engine error: {0}")]
    Engine(#[from] loopctl_engine::EngineError),
}

impl DaemonState {
    /// Shut the daemon down: remove the socket, PID, and version files. The
    /// lock is released automatically when `lock_file` drops.
    pub fn shutdown(&self) -> Result<(), LifecycleError> {
        info!("shutting down daemon");
        if self.config.socket_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.socket_path) {
                warn!(error = %e, "failed to remove socket file");
            }
        }
        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!(error = %e, "failed to remove pid file");
            }
        }
        if self.config.version_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.version_path) {
                warn!(error = %e, "failed to remove version file");
            }
        }
        info!("daemon shutdown complete");
        Ok(())
    }
}

/// Start the daemon: acquire the lock, build the engine, sweep orphans,
/// bind the socket. Cleans up any files it created if any step after the
/// lock fails.
pub async fn startup(config: &Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config).await {
        Ok(result) => Ok(result),
        Err(e) => {
            // A lock failure means another daemon owns these files — don't
            // clean up state that isn't ours.
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: &Config) -> Result<StartupResult, LifecycleError> {
    std::fs::create_dir_all(&config.state_dir)?;

    // Open without truncating, so a failed lock attempt never wipes the
    // running daemon's recorded pid.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file.try_lock_exclusive().map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    std::fs::write(&config.version_path, crate::protocol::PROTOCOL_VERSION)?;

    let registry = AgentRegistry::new()
        .register(Box::new(StreamingJsonAdapter::default()))?
        .register(Box::new(GenericAdapter::new(generic_agent_binary())))?;

    let state = StateStore::new(&config.state_dir);
    let journal = Journal::new(&config.state_dir);
    let supervisor = ProcessSupervisor::new();
    let issues = GhIssueTracker::new();
    let clock = SystemClock;
    let engine = Engine::new(state, journal, supervisor, registry, issues, clock);

    let orphans_swept = engine.mark_orphaned_paused_loops().await?;
    if orphans_swept > 0 {
        warn!(count = orphans_swept, "marked orphaned loops as paused at startup");
    }

    if config.socket_path.exists() {
        std::fs::remove_file(&config.socket_path)?;
    }
    let listener = UnixListener::bind(&config.socket_path)
        .map_err(|e| LifecycleError::BindFailed(config.socket_path.clone(), e))?;

    info!("daemon started");

    Ok(StartupResult {
        daemon: DaemonState {
            config: config.clone(),
            lock_file,
            engine,
            start_time: Instant::now(),
        },
        listener,
        orphans_swept,
    })
}

fn generic_agent_binary() -> String {
    std::env::var("LOOPCTL_GENERIC_AGENT_BIN").unwrap_or_else(|_| "agent".to_string())
}

fn cleanup_on_failure(config: &Config) {
    if config.socket_path.exists() {
        let _ = std::fs::remove_file(&config.socket_path);
    }
    if config.version_path.exists() {
        let _ = std::fs::remove_file(&config.version_path);
    }
    if config.lock_path.exists() {
        let _ = std::fs::remove_file(&config.lock_path);
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
