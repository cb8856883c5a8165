// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session coordinator: decides, on a resume request, whether to signal
//! a still-live child or build a fresh launch from scratch.

use loopctl_adapters::{AgentAdapter, LaunchSpec};
use loopctl_core::AcceptanceCriterion;

/// Whether a resume can continue talking to a live process or must spawn
/// a new one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResumeKind {
    /// A process for this loop is still attached to the supervisor.
    SameSession,
    /// No process is attached; a fresh one must be launched.
    CrossSession,
}

/// Build the launch spec for a cross-session resume: continue a known
/// session if the adapter recognized one, otherwise a fresh spawn — both
/// seeded with the resume prompt.
pub fn build_resume_spec(
    adapter: &dyn AgentAdapter,
    session_id: Option<&str>,
    summary: &str,
    remaining_criteria: &[AcceptanceCriterion],
    skip_permissions: bool,
) -> LaunchSpec {
    let remaining: Vec<String> = remaining_criteria.iter().map(|c| c.text.clone()).collect();
    let prompt = adapter.build_resume_prompt(summary, &remaining);
    match session_id {
        Some(id) => adapter.build_continue_args(id, &prompt, skip_permissions),
        None => adapter.build_spawn_args(&prompt, skip_permissions),
    }
}

#[cfg(test)]
#[path = "resume_tests.rs"]
mod tests;
