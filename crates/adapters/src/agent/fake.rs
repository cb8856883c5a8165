// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fake agent adapter for engine tests.
#![cfg_attr(coverage_nightly, coverage(off))]

use super::{AgentAdapter, LaunchSpec};
use parking_lot::Mutex;
use std::sync::Arc;

/// Recorded call, for assertions in engine tests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AgentCall {
    Spawn {
        prompt: String,
        skip_permissions: bool,
    },
    Continue {
        session_id: String,
        prompt: String,
        skip_permissions: bool,
    },
}

struct FakeAdapterState {
    calls: Vec<AgentCall>,
    next_session_id: Option<String>,
    available: bool,
}

/// Fake adapter: deterministic argv, a preset `--session-id` to hand back
/// from `extract_session_id`, and a recording of every call made.
#[derive(Clone)]
pub struct FakeAdapter {
    tag: String,
    inner: Arc<Mutex<FakeAdapterState>>,
}

impl FakeAdapter {
    pub fn new(tag: impl Into<String>) -> Self {
        Self {
            tag: tag.into(),
            inner: Arc::new(Mutex::new(FakeAdapterState {
                calls: Vec::new(),
                next_session_id: None,
                available: true,
            })),
        }
    }

    pub fn calls(&self) -> Vec<AgentCall> {
        self.inner.lock().calls.clone()
    }

    /// Arrange for the next `extract_session_id` call to recognize this id.
    pub fn set_next_session_id(&self, id: impl Into<String>) {
        self.inner.lock().next_session_id = Some(id.into());
    }

    pub fn set_available(&self, available: bool) {
        self.inner.lock().available = available;
    }
}

impl AgentAdapter for FakeAdapter {
    fn tag(&self) -> &str {
        &self.tag
    }

    fn build_spawn_args(&self, prompt: &str, skip_permissions: bool) -> LaunchSpec {
        self.inner.lock().calls.push(AgentCall::Spawn {
            prompt: prompt.to_string(),
            skip_permissions,
        });
        LaunchSpec {
            cmd: "fake-agent".to_string(),
            args: vec!["--spawn".to_string(), prompt.to_string()],
        }
    }

    fn build_continue_args(
        &self,
        session_id: &str,
        prompt: &str,
        skip_permissions: bool,
    ) -> LaunchSpec {
        self.inner.lock().calls.push(AgentCall::Continue {
            session_id: session_id.to_string(),
            prompt: prompt.to_string(),
            skip_permissions,
        });
        LaunchSpec {
            cmd: "fake-agent".to_string(),
            args: vec!["--continue".to_string(), session_id.to_string(), prompt.to_string()],
        }
    }

    fn extract_session_id(&self, _output_chunk: &str) -> Option<String> {
        self.inner.lock().next_session_id.take()
    }

    fn build_resume_prompt(&self, work_summary: &str, remaining_criteria: &[String]) -> String {
        format!("RESUMING FROM PAUSE: {work_summary} ({} remaining)", remaining_criteria.len())
    }

    fn is_available(&self) -> bool {
        self.inner.lock().available
    }
}

#[cfg(test)]
#[path = "fake_tests.rs"]
mod tests;
