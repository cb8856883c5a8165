// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake issue tracker for testing.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{CloseOutcome, IssueError, IssueSnapshot, IssueTracker};
use crate::criterion::AcceptanceCriterion;
use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::Arc;

/// One recorded call, for assertions in engine tests.
#[derive(Debug, Clone)]
pub enum IssueCall {
    Fetch { url: String },
    UpdateBody { url: String, body: String },
    Close { url: String, comment: Option<String> },
}

struct FakeIssueState {
    issues: HashMap<String, IssueSnapshot>,
    closed: HashMap<String, bool>,
    calls: Vec<IssueCall>,
    fail_update: bool,
    fail_close: bool,
}

/// Fake issue tracker. Holds a small in-memory map of urls to snapshots,
/// records every call, and lets tests inject update/close failures to
/// exercise the engine's "log but proceed" behavior.
#[derive(Clone)]
pub struct FakeIssueTracker {
    inner: Arc<Mutex<FakeIssueState>>,
}

impl Default for FakeIssueTracker {
    fn default() -> Self {
        Self {
            inner: Arc::new(Mutex::new(FakeIssueState {
                issues: HashMap::new(),
                closed: HashMap::new(),
                calls: Vec::new(),
                fail_update: false,
                fail_close: false,
            })),
        }
    }
}

impl FakeIssueTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn seed(&self, snapshot: IssueSnapshot) {
        let mut inner = self.inner.lock();
        inner.closed.insert(snapshot.url.clone(), false);
        inner.issues.insert(snapshot.url.clone(), snapshot);
    }

    pub fn calls(&self) -> Vec<IssueCall> {
        self.inner.lock().calls.clone()
    }

    pub fn is_closed(&self, url: &str) -> bool {
        *self.inner.lock().closed.get(url).unwrap_or(&false)
    }

    pub fn set_fail_update(&self, fail: bool) {
        self.inner.lock().fail_update = fail;
    }

    pub fn set_fail_close(&self, fail: bool) {
        self.inner.lock().fail_close = fail;
    }
}

const CRITERIA_START: &str = "<!-- acceptance-criteria:start -->";
const CRITERIA_END: &str = "<!-- acceptance-criteria:end -->";

#[async_trait]
impl IssueTracker for FakeIssueTracker {
    fn parse_url(&self, url: &str) -> Result<String, IssueError> {
        if url.starts_with("https://") || url.starts_with("http://") {
            Ok(url.to_string())
        } else {
            Err(IssueError::InvalidUrl(url.to_string()))
        }
    }

    async fn fetch(&self, url: &str) -> Result<IssueSnapshot, IssueError> {
        let mut inner = self.inner.lock();
        inner.calls.push(IssueCall::Fetch {
            url: url.to_string(),
        });
        inner
            .issues
            .get(url)
            .cloned()
            .ok_or_else(|| IssueError::FetchFailed(url.to_string()))
    }

    fn apply_criteria_to_body(&self, body: &str, criteria: &[AcceptanceCriterion]) -> String {
        let mut rendered = String::from(CRITERIA_START);
        rendered.push('\n');
        for c in criteria {
            let mark = if c.completed { "x" } else { " " };
            rendered.push_str(&format!("- [{}] {}\n", mark, c.text));
        }
        rendered.push_str(CRITERIA_END);

        match (body.find(CRITERIA_START), body.find(CRITERIA_END)) {
            (Some(start), Some(end)) if end > start => {
                let end = end + CRITERIA_END.len();
                format!("{}{}{}", &body[..start], rendered, &body[end..])
            }
            _ => {
                if body.is_empty() {
                    rendered
                } else {
                    format!("{}\n\n{}", body.trim_end(), rendered)
                }
            }
        }
    }

    async fn update_body(&self, url: &str, body: &str) -> Result<(), IssueError> {
        let mut inner = self.inner.lock();
        inner.calls.push(IssueCall::UpdateBody {
            url: url.to_string(),
            body: body.to_string(),
        });
        if inner.fail_update {
            return Err(IssueError::UpdateFailed(url.to_string()));
        }
        if let Some(issue) = inner.issues.get_mut(url) {
            issue.body = body.to_string();
        }
        Ok(())
    }

    async fn close(&self, url: &str, comment: Option<&str>) -> Result<CloseOutcome, IssueError> {
        let mut inner = self.inner.lock();
        inner.calls.push(IssueCall::Close {
            url: url.to_string(),
            comment: comment.map(str::to_string),
        });
        if inner.fail_close {
            return Err(IssueError::CloseFailed(url.to_string()));
        }
        let already = *inner.closed.get(url).unwrap_or(&false);
        inner.closed.insert(url.to_string(), true);
        Ok(if already {
            CloseOutcome::AlreadyClosed
        } else {
            CloseOutcome::Closed
        })
    }
}
