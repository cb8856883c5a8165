// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Agent adapters: pure strategies for launching and recognizing an
//! external coding agent.
//!
//! An adapter never touches the filesystem or persisted state directly —
//! the engine composes it with the process supervisor and the state store.

mod generic;
mod streaming_json;

pub use generic::GenericAdapter;
pub use streaming_json::StreamingJsonAdapter;

#[cfg(any(test, feature = "test-support"))]
mod fake;
#[cfg(any(test, feature = "test-support"))]
pub use fake::{AgentCall, FakeAdapter};

use loopctl_core::AcceptanceCriterion;
use std::collections::HashMap;
use std::sync::Arc;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AgentError {
    #[error("agent binary not found on PATH: {0}")]
    NotAvailable(String),
    #[error("unknown agent tag: {0}")]
    UnknownAgent(String),
    #[error("adapter already registered for tag: {0}")]
    DuplicateRegistration(String),
}

/// A launch descriptor: an argv to exec directly, never through a shell.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchSpec {
    pub cmd: String,
    pub args: Vec<String>,
}

/// Pure, per-agent strategy for building launch arguments, recognizing a
/// session identifier in the agent's own output, and composing a resume
/// prompt. See [`crate::parser::OutputParser`] for the adapter-independent
/// token grammar every agent's output is expected to emit.
pub trait AgentAdapter: Send + Sync + 'static {
    /// Tag this adapter registers under (e.g. `"streaming-json"`).
    fn tag(&self) -> &str;

    /// Build the argv for a fresh run.
    fn build_spawn_args(&self, prompt: &str, skip_permissions: bool) -> LaunchSpec;

    /// Build the argv to continue a prior session, given a previously
    /// recognized session id.
    fn build_continue_args(
        &self,
        session_id: &str,
        prompt: &str,
        skip_permissions: bool,
    ) -> LaunchSpec;

    /// Scan one chunk of streamed output for this adapter's session-id
    /// marker. Called repeatedly; only the first hit matters to the
    /// engine (first occurrence wins).
    fn extract_session_id(&self, output_chunk: &str) -> Option<String>;

    /// Compose the resume prompt seeded with a work summary and the
    /// criteria still outstanding, in their stored order.
    fn build_resume_prompt(&self, work_summary: &str, remaining_criteria: &[String]) -> String;

    /// Probe whether this adapter's binary is reachable on `$PATH`.
    fn is_available(&self) -> bool;
}

/// Render a numbered criteria list the way both the initial prompt and the
/// resume prompt present acceptance criteria — 1-indexed, in stored order.
pub fn render_criteria_list(criteria: &[AcceptanceCriterion]) -> String {
    criteria
        .iter()
        .enumerate()
        .map(|(i, c)| format!("{}. {}", i + 1, c.text))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Explicit registry of adapters, built once at daemon startup rather than
/// via module-import side effects, so registration order never depends on
/// link order or global constructors.
#[derive(Default)]
pub struct AgentRegistry {
    adapters: HashMap<String, Arc<dyn AgentAdapter>>,
}

impl AgentRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an adapter under its own tag. Panics only via a returned
    /// error, never silently overwrites — a duplicate tag is a programming
    /// error in the startup wiring, not a runtime condition.
    pub fn register(mut self, adapter: Box<dyn AgentAdapter>) -> Result<Self, AgentError> {
        let tag = adapter.tag().to_string();
        if self.adapters.contains_key(&tag) {
            return Err(AgentError::DuplicateRegistration(tag));
        }
        self.adapters.insert(tag, Arc::from(adapter));
        Ok(self)
    }

    /// Resolve a tag to a cheaply-clonable adapter handle, so callers that
    /// spawn background tasks needing the adapter beyond this borrow (the
    /// supervisor's stdio readers) can hold their own reference.
    pub fn get(&self, tag: &str) -> Result<Arc<dyn AgentAdapter>, AgentError> {
        self.adapters
            .get(tag)
            .cloned()
            .ok_or_else(|| AgentError::UnknownAgent(tag.to_string()))
    }

    pub fn tags(&self) -> Vec<&str> {
        self.adapters.keys().map(String::as_str).collect()
    }
}

#[cfg(test)]
#[path = "mod_tests.rs"]
mod tests;
