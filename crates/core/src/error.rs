// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error taxonomy shared across the supervisor.

use thiserror::Error;

/// Top-level error kind for the loop-lifecycle engine and the components it
/// composes. Each variant corresponds to one of the error kinds named by
/// the engine's error-handling design: user input, external tool failure,
/// transient failure, process failure, state corruption, and malformed log
/// data.
#[derive(Debug, Error)]
pub enum LoopError {
    /// Malformed URL, missing repo root, directory does not exist. Surfaced
    /// to the caller; no state change.
    #[error("invalid input: {0}")]
    UserInput(String),

    /// The adapter binary or issue-tracker client is missing or failed.
    #[error("external tool failed: {0}")]
    ExternalTool(String),

    /// Timeout during a fetch/close call to the issue interface. Recoverable;
    /// the operator may retry.
    #[error("transient failure: {0}")]
    Transient(String),

    /// The agent process exited without signaling completion.
    #[error("process failure: {0}")]
    ProcessFailure(String),

    /// The state document could not be parsed; engine resets to an empty
    /// document rather than crash.
    #[error("state corrupted, reset to empty: {0}")]
    StateCorruption(String),

    /// A single log line failed to parse. Callers skip it; this variant
    /// exists so internal parsing code has something to propagate to a
    /// logging call site.
    #[error("log entry malformed: {0}")]
    LogMalformed(String),

    /// The requested transition is not legal from the loop's current status.
    #[error("invalid transition: {0}")]
    InvalidTransition(String),

    /// No loop exists with the given id.
    #[error("loop not found: {0}")]
    NotFound(String),
}

pub type Result<T> = std::result::Result<T, LoopError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod tests;
