// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! loopctl — thin CLI client for the operator command surface exposed by
//! `loopctld`. Issues one request, prints the JSON response, exits. The
//! interactive terminal UI is a separate concern this binary does not try
//! to cover.

#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

mod client;
mod daemon_process;
mod env;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use client::{ClientError, DaemonClient};
use loopctl_daemon::Request;

#[derive(Parser)]
#[command(name = "loopctl", version, about = "Operator CLI for the coding-loop daemon")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a queued loop from an issue url.
    Create {
        agent: String,
        issue_url: String,
        repo_root: PathBuf,
        #[arg(long)]
        skip_permissions: bool,
    },
    /// Start a queued loop.
    Start { id: String },
    /// Pause a running loop.
    Pause { id: String },
    /// Resume a paused loop whose process is still attached.
    Resume { id: String },
    /// Resume a paused loop from a previous daemon session.
    ResumePaused { id: String },
    /// Stop a running or paused loop.
    Stop { id: String },
    /// Retry a loop that ended in error or was stopped.
    Retry { id: String },
    /// Send an operator message to a running loop's agent.
    Intervene { id: String, message: String },
    /// Discard a paused loop from a previous session.
    DiscardPaused { id: String },
    /// Sweep orphaned paused loops (no live pid).
    MarkOrphaned,
    /// Check whether a resume would signal a live process.
    CanResume { id: String },
    /// Close the loop's issue.
    CloseIssue {
        id: String,
        #[arg(long)]
        comment: Option<String>,
    },
    /// Toggle completion on one acceptance criterion.
    ToggleCriterion {
        id: String,
        n: usize,
        #[arg(long)]
        completed: bool,
    },
    /// Fetch one loop's current record.
    Get { id: String },
    /// List every loop.
    List,
    /// Fetch a loop's log.
    Log { id: String },
    /// Check whether the daemon is reachable.
    Ping,
    /// Manage the daemon process itself, independent of any loop.
    #[command(subcommand)]
    Daemon(DaemonAction),
}

#[derive(Subcommand)]
enum DaemonAction {
    /// Start the daemon if it is not already running.
    Start,
    /// Stop the running daemon, if any.
    Stop,
    /// Report whether the daemon is running.
    Status,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    enum Kind {
        Action,
        Query,
        Signal,
    }

    let (request, kind) = match cli.command {
        Command::Create {
            agent,
            issue_url,
            repo_root,
            skip_permissions,
        } => (
            Request::CreateLoop {
                agent,
                issue_url,
                repo_root,
                skip_permissions,
            },
            Kind::Action,
        ),
        Command::Start { id } => (Request::StartLoop { id }, Kind::Action),
        Command::Pause { id } => (Request::PauseLoop { id }, Kind::Action),
        Command::Resume { id } => (Request::ResumeLoop { id }, Kind::Action),
        Command::ResumePaused { id } => (Request::ResumePausedLoop { id }, Kind::Action),
        Command::Stop { id } => (Request::StopLoop { id }, Kind::Action),
        Command::Retry { id } => (Request::RetryLoop { id }, Kind::Action),
        Command::Intervene { id, message } => (Request::SendIntervention { id, message }, Kind::Signal),
        Command::DiscardPaused { id } => (Request::DiscardPausedLoop { id }, Kind::Action),
        Command::MarkOrphaned => (Request::MarkOrphanedPausedLoops, Kind::Action),
        Command::CanResume { id } => (Request::CanResumeInSession { id }, Kind::Query),
        Command::CloseIssue { id, comment } => (Request::CloseIssue { id, comment }, Kind::Action),
        Command::ToggleCriterion { id, n, completed } => (Request::ToggleCriterion { id, n, completed }, Kind::Action),
        Command::Get { id } => (Request::GetLoop { id }, Kind::Query),
        Command::List => (Request::ListLoops, Kind::Query),
        Command::Log { id } => (Request::GetLog { id }, Kind::Query),
        Command::Ping => (Request::Ping, Kind::Query),
        Command::Daemon(action) => return run_daemon_action(action).await,
    };

    let client = match kind {
        Kind::Action => DaemonClient::for_action(),
        Kind::Query => DaemonClient::for_query(),
        Kind::Signal => DaemonClient::for_signal(),
    };
    let client = match client {
        Ok(c) => c,
        Err(ClientError::DaemonNotRunning) => {
            anyhow::bail!("daemon not running (run a mutating command first, or start `loopctld` manually)")
        }
        Err(e) => return Err(e.into()),
    };

    let response = client.send(&request).await?;
    println!("{}", serde_json::to_string_pretty(&response)?);
    Ok(())
}

/// Handle `loopctl daemon ...`, which manages the daemon process itself
/// rather than issuing an operator request, so it needs its own connect
/// semantics instead of the `Kind`-based routing above.
async fn run_daemon_action(action: DaemonAction) -> anyhow::Result<()> {
    match action {
        DaemonAction::Start => {
            if DaemonClient::connect().is_ok() {
                println!("Daemon already running");
                return Ok(());
            }
            match DaemonClient::for_action() {
                Ok(_client) => {
                    println!("Daemon started");
                    Ok(())
                }
                Err(e) => Err(e.into()),
            }
        }
        DaemonAction::Stop => {
            if DaemonClient::connect().is_err() {
                println!("Daemon not running");
                return Ok(());
            }
            daemon_process::stop_daemon_sync();
            println!("Daemon stopped");
            Ok(())
        }
        DaemonAction::Status => match DaemonClient::connect() {
            Ok(client) => {
                let response = client.send(&Request::Ping).await?;
                println!("{}", serde_json::to_string_pretty(&response)?);
                Ok(())
            }
            Err(ClientError::DaemonNotRunning) => {
                println!("Daemon not running");
                Ok(())
            }
            Err(e) => Err(e.into()),
        },
    }
}
