// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Acceptance criteria: the checkable items an agent must satisfy before a
//! loop is considered complete.

use serde::{Deserialize, Serialize};

/// Who marked a criterion complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletedBy {
    Agent,
    Operator,
}

/// One checkable item from the tracked issue's acceptance criteria.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AcceptanceCriterion {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_by: Option<CompletedBy>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at_ms: Option<u64>,
}

impl AcceptanceCriterion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            completed: false,
            completed_by: None,
            completed_at_ms: None,
        }
    }

    /// Mark complete, recording who did it and when. A no-op — it does not
    /// touch `completed_at_ms` — if the criterion was already complete, so
    /// that repeating a completion event from the agent never rewrites the
    /// original timestamp.
    pub fn mark_complete(&mut self, by: CompletedBy, epoch_ms: u64) {
        if self.completed {
            return;
        }
        self.completed = true;
        self.completed_by = Some(by);
        self.completed_at_ms = Some(epoch_ms);
    }

    /// Unmark. Used by `criterion-incomplete` events from the agent.
    pub fn mark_incomplete(&mut self) {
        self.completed = false;
        self.completed_by = None;
        self.completed_at_ms = None;
    }
}

#[cfg(test)]
#[path = "criterion_tests.rs"]
mod tests;
