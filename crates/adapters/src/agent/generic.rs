// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Conservative fallback adapter for agents with no durable session
//! concept: every resume is a fresh spawn seeded with a prompt, never a
//! `--resume`-style continuation.

use super::streaming_json::which;
use super::{AgentAdapter, LaunchSpec};

pub struct GenericAdapter {
    binary: String,
}

impl GenericAdapter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl AgentAdapter for GenericAdapter {
    fn tag(&self) -> &str {
        "generic"
    }

    fn build_spawn_args(&self, prompt: &str, skip_permissions: bool) -> LaunchSpec {
        let mut args = Vec::new();
        if skip_permissions {
            args.push("--yolo".to_string());
        }
        args.push(prompt.to_string());
        LaunchSpec {
            cmd: self.binary.clone(),
            args,
        }
    }

    /// No durable session id is ever known for this adapter, so continuing
    /// falls back to `build_spawn_args` seeded with the resume prompt —
    /// the agent has no way to resume a specific prior run.
    fn build_continue_args(
        &self,
        _session_id: &str,
        prompt: &str,
        skip_permissions: bool,
    ) -> LaunchSpec {
        self.build_spawn_args(prompt, skip_permissions)
    }

    /// This adapter's agent never emits a recognizable session marker.
    fn extract_session_id(&self, _output_chunk: &str) -> Option<String> {
        None
    }

    fn build_resume_prompt(&self, work_summary: &str, remaining_criteria: &[String]) -> String {
        let criteria = remaining_criteria
            .iter()
            .enumerate()
            .map(|(i, text)| format!("{}. {}", i + 1, text))
            .collect::<Vec<_>>()
            .join("\n");
        format!(
            "RESUMING FROM PAUSE\n\n{work_summary}\n\nRemaining acceptance criteria:\n{criteria}"
        )
    }

    fn is_available(&self) -> bool {
        which(&self.binary)
    }
}

#[cfg(test)]
#[path = "generic_tests.rs"]
mod tests;
