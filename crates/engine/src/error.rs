// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error type for the loop engine.

use loopctl_adapters::{AgentError, SupervisorError};
use loopctl_core::IssueError;
use loopctl_storage::{JournalError, StorageError};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("no loop with id {0}")]
    NotFound(String),
    #[error("cannot {event} a loop in status {status}")]
    InvalidTransition { status: String, event: String },
    #[error("invalid request: {0}")]
    UserInput(String),
    #[error(transparent)]
    Storage(#[from] StorageError),
    #[error(transparent)]
    Journal(#[from] JournalError),
    #[error(transparent)]
    Agent(#[from] AgentError),
    #[error(transparent)]
    Supervisor(#[from] SupervisorError),
    #[error(transparent)]
    Issue(#[from] IssueError),
}

pub type Result<T> = std::result::Result<T, EngineError>;
