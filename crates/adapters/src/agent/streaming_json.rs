// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Adapter for agents that speak a streaming-JSON output protocol and
//! support an explicit durable session id (passed back via `--resume`).

use super::{render_criteria_list, AgentAdapter, LaunchSpec};
use loopctl_core::AcceptanceCriterion;

/// Adapter for a streaming-JSON coding agent: each line of its stdout is a
/// JSON object, and the first line of a fresh session carries a
/// `session_id` field that can be replayed via `--resume` later.
pub struct StreamingJsonAdapter {
    /// Binary name or path to exec.
    binary: String,
}

impl StreamingJsonAdapter {
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }
}

impl Default for StreamingJsonAdapter {
    fn default() -> Self {
        Self::new("claude")
    }
}

impl AgentAdapter for StreamingJsonAdapter {
    fn tag(&self) -> &str {
        "streaming-json"
    }

    fn build_spawn_args(&self, prompt: &str, skip_permissions: bool) -> LaunchSpec {
        let mut args = vec![
            "--print".to_string(),
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--session-id".to_string(),
            uuid::Uuid::new_v4().to_string(),
        ];
        if skip_permissions {
            args.push("--dangerously-skip-permissions".to_string());
        }
        args.push(prompt.to_string());
        LaunchSpec {
            cmd: self.binary.clone(),
            args,
        }
    }

    fn build_continue_args(
        &self,
        session_id: &str,
        prompt: &str,
        skip_permissions: bool,
    ) -> LaunchSpec {
        let mut args = vec![
            "--print".to_string(),
            "--output-format".to_string(),
            "stream-json".to_string(),
            "--resume".to_string(),
            session_id.to_string(),
        ];
        if skip_permissions {
            args.push("--dangerously-skip-permissions".to_string());
        }
        args.push(prompt.to_string());
        LaunchSpec {
            cmd: self.binary.clone(),
            args,
        }
    }

    fn extract_session_id(&self, output_chunk: &str) -> Option<String> {
        for line in output_chunk.lines() {
            let trimmed = line.trim();
            if trimmed.is_empty() {
                continue;
            }
            let Ok(value) = serde_json::from_str::<serde_json::Value>(trimmed) else {
                continue;
            };
            if let Some(id) = value.get("session_id").and_then(|v| v.as_str()) {
                return Some(id.to_string());
            }
        }
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

/// Probe `$PATH` for a binary by name, the way a shell would resolve it.
/// Absolute/relative paths that exist are also accepted.
pub(crate) fn which(binary: &str) -> bool {
    let path = std::path::Path::new(binary);
    if path.is_absolute() || binary.contains('/') {
        return path.is_file();
    }
    std::env::var_os("PATH")
        .map(|paths| {
            std::env::split_paths(&paths).any(|dir| dir.join(binary).is_file())
        })
        .unwrap_or(false)
}

/// Render the numbered criteria list used when building a fresh-session
/// prompt from an [`loopctl_core::IssueSnapshot`].
pub fn initial_prompt(issue_body: &str, criteria: &[AcceptanceCriterion]) -> String {
    format!("{}\n\nAcceptance criteria:\n{}", issue_body, render_criteria_list(criteria))
}

#[cfg(test)]
#[path = "streaming_json_tests.rs"]
mod tests;
