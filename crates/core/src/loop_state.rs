// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The `Loop` record: a managed, long-running attempt by an agent to
//! satisfy one issue's acceptance criteria.

use crate::clock::Clock;
use crate::criterion::AcceptanceCriterion;
use crate::issue::IssueSnapshot;
use serde::{Deserialize, Serialize};

crate::define_id! {
    /// Unique identifier for a loop instance, stable across supervisor
    /// restarts.
    #[derive(Default)]
    pub struct LoopId;
}

/// Current lifecycle status of a loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LoopStatus {
    Queued,
    Running,
    Paused,
    Completed,
    Stopped,
    Error,
}

impl std::fmt::Display for LoopStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LoopStatus::Queued => write!(f, "queued"),
            LoopStatus::Running => write!(f, "running"),
            LoopStatus::Paused => write!(f, "paused"),
            LoopStatus::Completed => write!(f, "completed"),
            LoopStatus::Stopped => write!(f, "stopped"),
            LoopStatus::Error => write!(f, "error"),
        }
    }
}

impl LoopStatus {
    /// Statuses in which no live child process should be attached.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            LoopStatus::Completed | LoopStatus::Stopped | LoopStatus::Error
        )
    }
}

/// Configuration for creating a new loop.
#[derive(Debug, Clone)]
pub struct LoopConfig {
    pub id: String,
    pub agent: String,
    pub issue: IssueSnapshot,
    pub repo_root: std::path::PathBuf,
    pub skip_permissions: bool,
}

/// A managed loop: one agent's attempt at one issue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Loop {
    pub id: String,
    /// Tag selecting an adapter from the agent registry.
    pub agent: String,
    pub status: LoopStatus,
    pub issue: IssueSnapshot,
    /// Acceptance criteria as captured at creation time, immutable —
    /// distinct from `issue.criteria`, which tracks live completion state.
    pub original_acceptance_criteria: Vec<AcceptanceCriterion>,
    pub repo_root: std::path::PathBuf,
    pub skip_permissions: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub started_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ended_at_ms: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub paused_at_ms: Option<u64>,
    #[serde(default)]
    pub paused_from_previous_session: bool,
    #[serde(default)]
    pub issue_closed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Last-known child pid. Not authoritative across restarts — the
    /// orphan sweep is what reconciles this against reality.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pid: Option<u32>,
}

impl Loop {
    /// Create a new loop in `queued` status.
    pub fn new(config: LoopConfig) -> Self {
        let criteria = config.issue.criteria.clone();
        Self {
            id: config.id,
            agent: config.agent,
            status: LoopStatus::Queued,
            issue: config.issue,
            original_acceptance_criteria: criteria,
            repo_root: config.repo_root,
            skip_permissions: config.skip_permissions,
            session_id: None,
            started_at_ms: None,
            ended_at_ms: None,
            paused_at_ms: None,
            paused_from_previous_session: false,
            issue_closed: false,
            error: None,
            pid: None,
        }
    }

    /// True once every criterion in `issue.criteria` is complete.
    pub fn all_criteria_complete(&self) -> bool {
        !self.issue.criteria.is_empty() && self.issue.criteria.iter().all(|c| c.completed)
    }

    /// Criteria still incomplete, in stored order — used to seed a resume
    /// prompt with exactly what remains.
    pub fn remaining_criteria(&self) -> Vec<&AcceptanceCriterion> {
        self.issue.criteria.iter().filter(|c| !c.completed).collect()
    }

    pub fn mark_started(&mut self, clock: &impl Clock) {
        self.started_at_ms = Some(clock.epoch_ms());
        self.status = LoopStatus::Running;
    }
}

#[cfg(test)]
#[path = "loop_state_tests.rs"]
mod tests;
