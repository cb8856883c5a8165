// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The per-loop log record, shared by the storage journal and the engine.

use serde::{Deserialize, Serialize};

/// Origin of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LogEntryType {
    Agent,
    Operator,
    System,
    Error,
}

impl std::fmt::Display for LogEntryType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LogEntryType::Agent => write!(f, "agent"),
            LogEntryType::Operator => write!(f, "operator"),
            LogEntryType::System => write!(f, "system"),
            LogEntryType::Error => write!(f, "error"),
        }
    }
}

/// One line of a loop's append-only journal.
///
/// `timestamp` is ISO-8601 UTC, stamped by the journal at append time —
/// callers never set it themselves.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub loop_id: String,
    #[serde(rename = "type")]
    pub entry_type: LogEntryType,
    pub content: String,
}

#[cfg(test)]
#[path = "log_entry_tests.rs"]
mod tests;
