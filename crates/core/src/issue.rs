// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The issue-tracker interface consumed (never implemented) by the engine.
//!
//! The engine treats the issue tracker as a pure external collaborator: it
//! parses urls, fetches snapshots, renders acceptance criteria back into a
//! body, and closes issues. A concrete client lives outside this crate;
//! here we only define the contract and, under `test-support`, a fake that
//! records calls for assertions.

use crate::criterion::AcceptanceCriterion;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from issue-tracker operations.
#[derive(Debug, Error)]
pub enum IssueError {
    #[error("could not parse issue url: {0}")]
    InvalidUrl(String),
    #[error("fetch failed: {0}")]
    FetchFailed(String),
    #[error("update failed: {0}")]
    UpdateFailed(String),
    #[error("close failed: {0}")]
    CloseFailed(String),
    #[error("timed out after {0}s")]
    Timeout(u64),
}

/// Result of a close request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloseOutcome {
    Closed,
    AlreadyClosed,
}

/// A reference to the repository an issue belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub owner: String,
    pub name: String,
}

/// A point-in-time snapshot of an issue, as fetched from the tracker.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IssueSnapshot {
    pub url: String,
    pub number: u64,
    pub title: String,
    pub body: String,
    pub repo: RepoRef,
    pub criteria: Vec<AcceptanceCriterion>,
}

/// Pure interface to an issue tracker. Implementations perform whatever
/// network I/O is needed; the engine only ever calls through this trait.
#[async_trait]
pub trait IssueTracker: Send + Sync + 'static {
    /// Parse a url into a form this tracker recognizes; rejects urls it
    /// cannot own.
    fn parse_url(&self, url: &str) -> Result<String, IssueError>;

    /// Fetch the current snapshot of an issue.
    async fn fetch(&self, url: &str) -> Result<IssueSnapshot, IssueError>;

    /// Render `criteria` into `body`, replacing any existing acceptance
    /// criteria section. Pure — no I/O.
    fn apply_criteria_to_body(&self, body: &str, criteria: &[AcceptanceCriterion]) -> String;

    /// Persist a new body to the tracker.
    async fn update_body(&self, url: &str, body: &str) -> Result<(), IssueError>;

    /// Close the issue, optionally leaving a comment.
    async fn close(&self, url: &str, comment: Option<&str>) -> Result<CloseOutcome, IssueError>;
}

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{FakeIssueTracker, IssueCall};

#[cfg(test)]
#[path = "issue_tests.rs"]
mod tests;
