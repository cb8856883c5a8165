// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! GitHub-backed [`IssueTracker`], implemented by shelling out to the `gh`
//! CLI — the same "exec a binary, parse its stdout" shape the agent
//! adapters use, just pointed at a different external tool.

use async_trait::async_trait;
use loopctl_core::{AcceptanceCriterion, CloseOutcome, IssueError, IssueSnapshot, IssueTracker, RepoRef};
use serde::Deserialize;
use tokio::process::Command;

const CRITERIA_START: &str = "<!-- acceptance-criteria:start -->";
const CRITERIA_END: &str = "<!-- acceptance-criteria:end -->";

/// Issue tracker backed by the `gh` CLI. Requires `gh` on `$PATH` and an
/// authenticated session; every operation is one subprocess invocation.
pub struct GhIssueTracker {
    binary: String,
}

impl GhIssueTracker {
    pub fn new() -> Self {
        Self {
            binary: "gh".to_string(),
        }
    }
}

impl Default for GhIssueTracker {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Deserialize)]
struct GhIssueView {
    url: String,
    number: u64,
    title: String,
    body: String,
}

/// A `github.com/<owner>/<repo>/issues/<number>` url, the only shape `gh`
/// can resolve without an explicit `--repo` flag derived from it.
struct ParsedUrl {
    owner: String,
    repo: String,
    number: u64,
}

fn parse_github_url(url: &str) -> Result<ParsedUrl, IssueError> {
    let rest = url
        .strip_prefix("https://github.com/")
        .or_else(|| url.strip_prefix("http://github.com/"))
        .ok_or_else(|| IssueError::InvalidUrl(url.to_string()))?;
    let mut parts = rest.splitn(4, '/');
    let owner = parts.next().ok_or_else(|| IssueError::InvalidUrl(url.to_string()))?;
    let repo = parts.next().ok_or_else(|| IssueError::InvalidUrl(url.to_string()))?;
    let kind = parts.next().ok_or_else(|| IssueError::InvalidUrl(url.to_string()))?;
    let number = parts.next().ok_or_else(|| IssueError::InvalidUrl(url.to_string()))?;
    if kind != "issues" {
        return Err(IssueError::InvalidUrl(url.to_string()));
    }
    let number = number
        .parse::<u64>()
        .map_err(|_| IssueError::InvalidUrl(url.to_string()))?;
    Ok(ParsedUrl {
        owner: owner.to_string(),
        repo: repo.to_string(),
        number,
    })
}

/// Extract the checklist between the acceptance-criteria markers, in the
/// same `- [ ] text` / `- [x] text` shape `apply_criteria_to_body` writes.
fn parse_criteria(body: &str) -> Vec<AcceptanceCriterion> {
    let (Some(start), Some(end)) = (body.find(CRITERIA_START), body.find(CRITERIA_END)) else {
        return Vec::new();
    };
    if end <= start {
        return Vec::new();
    }
    let section = &body[start + CRITERIA_START.len()..end];
    section
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let rest = line.strip_prefix("- [ ]").or_else(|| line.strip_prefix("- [x]"))?;
            let mut c = AcceptanceCriterion::new(rest.trim());
            if line.starts_with("- [x]") {
                c.completed = true;
            }
            Some(c)
        })
        .collect()
}

#[async_trait]
impl IssueTracker for GhIssueTracker {
    fn parse_url(&self, url: &str) -> Result<String, IssueError> {
        parse_github_url(url)?;
        Ok(url.to_string())
    }

    async fn fetch(&self, url: &str) -> Result<IssueSnapshot, IssueError> {
        let parsed = parse_github_url(url)?;
        let repo_flag = format!("{}/{}", parsed.owner, parsed.repo);
        let output = Command::new(&self.binary)
            .args([
                "issue",
                "view",
                &parsed.number.to_string(),
                "--repo",
                &repo_flag,
                "--json",
                "url,number,title,body",
            ])
            .output()
            .await
            .map_err(|e| IssueError::FetchFailed(e.to_string()))?;

        if !output.status.success() {
            return Err(IssueError::FetchFailed(String::from_utf8_lossy(&output.stderr).into_owned()));
        }
        let view: GhIssueView =
            serde_json::from_slice(&output.stdout).map_err(|e| IssueError::FetchFailed(e.to_string()))?;
        let criteria = parse_criteria(&view.body);

        Ok(IssueSnapshot {
            url: view.url,
            number: view.number,
            title: view.title,
            body: view.body,
            repo: RepoRef {
                owner: parsed.owner,
                name: parsed.repo,
            },
            criteria,
        })
    }

    fn apply_criteria_to_body(&self, body: &str, criteria: &[AcceptanceCriterion]) -> String {
        let mut rendered = String::from(CRITERIA_START);
        rendered.push('\n');
        for c in criteria {
            let mark = if c.completed { "x" } else { " " };
            rendered.push_str(&format!("- [{mark}] {}\n", c.text));
        }
        rendered.push_str(CRITERIA_END);

        match (body.find(CRITERIA_START), body.find(CRITERIA_END)) {
            (Some(start), Some(end)) if end > start => {
                let end = end + CRITERIA_END.len();
                format!("{}{}{}", &body[..start], rendered, &body[end..])
            }
            _ if body.is_empty() => rendered,
            _ => format!("{}\n\n{}", body.trim_end(), rendered),
        }
    }

    async fn update_body(&self, url: &str, body: &str) -> Result<(), IssueError> {
        let parsed = parse_github_url(url)?;
        let repo_flag = format!("{}/{}", parsed.owner, parsed.repo);
        let status = Command::new(&self.binary)
            .args([
                "issue",
                "edit",
                &parsed.number.to_string(),
                "--repo",
                &repo_flag,
                "--body",
                body,
            ])
            .status()
            .await
            .map_err(|e| IssueError::UpdateFailed(e.to_string()))?;
        if !status.success() {
            return Err(IssueError::UpdateFailed(format!("gh issue edit exited with {status}")));
        }
        Ok(())
    }

    async fn close(&self, url: &str, comment: Option<&str>) -> Result<CloseOutcome, IssueError> {
        let parsed = parse_github_url(url)?;
        let repo_flag = format!("{}/{}", parsed.owner, parsed.repo);
        let mut args = vec![
            "issue".to_string(),
            "close".to_string(),
            parsed.number.to_string(),
            "--repo".to_string(),
            repo_flag,
        ];
        if let Some(comment) = comment {
            args.push("--comment".to_string());
            args.push(comment.to_string());
        }
        let output = Command::new(&self.binary)
            .args(&args)
            .output()
            .await
            .map_err(|e| IssueError::CloseFailed(e.to_string()))?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("already closed") {
                return Ok(CloseOutcome::AlreadyClosed);
            }
            return Err(IssueError::CloseFailed(stderr.into_owned()));
        }
        Ok(CloseOutcome::Closed)
    }
}

#[cfg(test)]
#[path = "issue_tracker_tests.rs"]
mod tests;
