// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The loop engine: the authoritative state machine described in the
//! transition table. Owns the state document (one mutex, held only for
//! the local read-modify-write; spawn/signal/issue calls happen outside
//! the critical section) and drives each loop's supervised process
//! through a dedicated pump task.

use std::sync::Arc;

use loopctl_adapters::{
    render_criteria_list, AgentRegistry, ParserEvent, ProcessSupervisor, SupervisorEvent,
};
use loopctl_core::{
    AcceptanceCriterion, Clock, CloseOutcome, CompletedBy, IdGen, IssueTracker, LogEntryType, Loop,
    LoopConfig, LoopStatus, UuidIdGen,
};
use loopctl_storage::{Journal, StateDocument, StateStore};
use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{error, warn};

use crate::error::{EngineError, Result};
use crate::events::EventBus;
use crate::resume::{build_resume_spec, ResumeKind};
use crate::summary::{summarize, DEFAULT_MAX_CHARS};

struct Inner<Issues, Clk> {
    // Serializes every load-mutate-save round trip against state.json —
    // StateStore itself only makes one write crash-safe, not concurrent
    // writers safe, so every read-modify-write call site must go through
    // this lock rather than calling StateStore directly.
    state: Mutex<StateStore>,
    journal: Journal,
    supervisor: ProcessSupervisor,
    registry: AgentRegistry,
    issues: Issues,
    clock: Clk,
    events: EventBus,
}

/// The engine. Cheap to clone — every clone shares the same state store,
/// supervisor, and event bus.
pub struct LoopEngine<Issues, Clk> {
    inner: Arc<Inner<Issues, Clk>>,
}

impl<Issues, Clk> Clone for LoopEngine<Issues, Clk> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<Issues, Clk> LoopEngine<Issues, Clk>
where
    Issues: IssueTracker,
    Clk: Clock,
{
    pub fn new(
        state: StateStore,
        journal: Journal,
        supervisor: ProcessSupervisor,
        registry: AgentRegistry,
        issues: Issues,
        clock: Clk,
    ) -> Self {
        Self {
            inner: Arc::new(Inner {
                state: Mutex::new(state),
                journal,
                supervisor,
                registry,
                issues,
                clock,
                events: EventBus::new(),
            }),
        }
    }

    pub fn events(&self) -> EventBus {
        self.inner.events.clone()
    }

    pub fn journal(&self) -> &Journal {
        &self.inner.journal
    }

    pub fn list_loops(&self) -> Result<Vec<Loop>> {
        Ok(self.inner.state.lock().load()?.loops)
    }

    pub fn get_loop(&self, id: &str) -> Result<Loop> {
        self.require_loop(id)
    }

    /// Resolve an issue url to its current snapshot, for callers (the
    /// daemon's `createLoop` handler) that only have the url on hand.
    pub async fn fetch_issue(&self, url: &str) -> Result<loopctl_core::IssueSnapshot> {
        Ok(self.inner.issues.fetch(url).await?)
    }

    /// `create(issue, agent, opts)` → `queued`.
    pub async fn create_loop(&self, agent: String, issue: loopctl_core::IssueSnapshot, repo_root: std::path::PathBuf, skip_permissions: bool) -> Result<Loop> {
        let id = UuidIdGen.next();
        let loop_ = Loop::new(LoopConfig {
            id,
            agent,
            issue,
            repo_root,
            skip_permissions,
        });
        let doc = self.inner.state.lock().insert_loop(loop_.clone())?;
        self.inner.events.publish();
        self.find_in(&doc, &loop_.id)
    }

    /// `queued` → `running`: spawn the initial run.
    pub async fn start_loop(&self, id: &str) -> Result<Loop> {
        let loop_ = self.require_loop(id)?;
        if loop_.status != LoopStatus::Queued {
            return Err(self.invalid_transition(loop_.status, "start"));
        }

        let adapter = self.inner.registry.get(&loop_.agent)?;
        let prompt = initial_prompt(&loop_);
        let spec = adapter.build_spawn_args(&prompt, loop_.skip_permissions);
        let rx = self
            .inner
            .supervisor
            .spawn(id, spec, &loop_.repo_root, adapter.clone())?;
        let pid = self.inner.supervisor.pid(id);
        let epoch = self.inner.clock.epoch_ms();

        let doc = self.inner.state.lock().update_loop(id, |l| {
            l.status = LoopStatus::Running;
            l.started_at_ms = Some(epoch);
            l.pid = pid;
        })?;

        self.spawn_pump(id.to_string(), rx);
        self.inner.events.publish();
        self.find_in(&doc, id)
    }

    /// `error|stopped` → `running`: spawn a fresh attempt, log retained.
    pub async fn retry_loop(&self, id: &str) -> Result<Loop> {
        let loop_ = self.require_loop(id)?;
        if !matches!(loop_.status, LoopStatus::Error | LoopStatus::Stopped) {
            return Err(self.invalid_transition(loop_.status, "retry"));
        }

        let adapter = self.inner.registry.get(&loop_.agent)?;
        let prompt = initial_prompt(&loop_);
        let spec = adapter.build_spawn_args(&prompt, loop_.skip_permissions);
        let rx = self
            .inner
            .supervisor
            .spawn(id, spec, &loop_.repo_root, adapter.clone())?;
        let pid = self.inner.supervisor.pid(id);

        let doc = self.inner.state.lock().update_loop(id, |l| {
            l.status = LoopStatus::Running;
            l.error = None;
            l.ended_at_ms = None;
            l.pid = pid;
        })?;

        self.spawn_pump(id.to_string(), rx);
        self.inner.events.publish();
        self.find_in(&doc, id)
    }

    /// `running` → `paused`: OS-stop the child if one is attached.
    pub async fn pause_loop(&self, id: &str) -> Result<Loop> {
        let loop_ = self.require_loop(id)?;
        if loop_.status != LoopStatus::Running {
            return Err(self.invalid_transition(loop_.status, "pause"));
        }

        if self.inner.supervisor.has_live_process(id) {
            self.inner.supervisor.pause(id)?;
        }
        let epoch = self.inner.clock.epoch_ms();
        let doc = self.inner.state.lock().update_loop(id, |l| {
            l.status = LoopStatus::Paused;
            l.paused_at_ms = Some(epoch);
        })?;
        self.inner.events.publish();
        self.find_in(&doc, id)
    }

    /// Same-session if the supervisor still has a live process for `id`,
    /// cross-session otherwise.
    fn resume_kind(&self, id: &str) -> ResumeKind {
        if self.inner.supervisor.has_live_process(id) {
            ResumeKind::SameSession
        } else {
            ResumeKind::CrossSession
        }
    }

    /// `paused` (same-session) → `running`: OS-continue.
    pub async fn resume_loop(&self, id: &str) -> Result<Loop> {
        let loop_ = self.require_loop(id)?;
        if loop_.status != LoopStatus::Paused {
            return Err(self.invalid_transition(loop_.status, "resume"));
        }
        if self.resume_kind(id) != ResumeKind::SameSession {
            return Err(EngineError::InvalidTransition {
                status: "paused (no live process — use resumePausedLoop)".to_string(),
                event: "resume".to_string(),
            });
        }

        self.inner.supervisor.resume(id)?;
        let doc = self.inner.state.lock().update_loop(id, |l| {
            l.status = LoopStatus::Running;
            l.paused_at_ms = None;
        })?;
        self.inner.events.publish();
        self.find_in(&doc, id)
    }

    /// `paused` (prev-session) → `running`: spawn fresh, seeded from the
    /// log-derived summary and the criteria still outstanding at pause.
    pub async fn resume_paused_loop(&self, id: &str) -> Result<Loop> {
        let loop_ = self.require_loop(id)?;
        if loop_.status != LoopStatus::Paused {
            return Err(self.invalid_transition(loop_.status, "resumePaused"));
        }
        if self.resume_kind(id) != ResumeKind::CrossSession {
            return Err(EngineError::InvalidTransition {
                status: "paused (live process present — use resumeLoop)".to_string(),
                event: "resumePaused".to_string(),
            });
        }

        let entries = self.inner.journal.read_all(id)?;
        let summary = summarize(&entries, DEFAULT_MAX_CHARS);
        let remaining: Vec<AcceptanceCriterion> =
            loop_.remaining_criteria().into_iter().cloned().collect();

        let adapter = self.inner.registry.get(&loop_.agent)?;
        let spec = build_resume_spec(
            adapter.as_ref(),
            loop_.session_id.as_deref(),
            &summary,
            &remaining,
            loop_.skip_permissions,
        );
        let rx = self
            .inner
            .supervisor
            .spawn(id, spec, &loop_.repo_root, adapter.clone())?;
        let pid = self.inner.supervisor.pid(id);

        let doc = self.inner.state.lock().update_loop(id, |l| {
            l.status = LoopStatus::Running;
            l.paused_at_ms = None;
            l.paused_from_previous_session = false;
            l.pid = pid;
        })?;

        self.spawn_pump(id.to_string(), rx);
        self.inner.events.publish();
        self.find_in(&doc, id)
    }

    /// `running|paused` → `stopped`: terminate, then kill after a grace
    /// period if still alive.
    pub async fn stop_loop(&self, id: &str) -> Result<Loop> {
        let loop_ = self.require_loop(id)?;
        if !matches!(loop_.status, LoopStatus::Running | LoopStatus::Paused) {
            return Err(self.invalid_transition(loop_.status, "stop"));
        }

        if self.inner.supervisor.has_live_process(id) {
            self.inner.supervisor.stop(id).await?;
        }
        let epoch = self.inner.clock.epoch_ms();
        let doc = self.inner.state.lock().update_loop(id, |l| {
            l.status = LoopStatus::Stopped;
            l.ended_at_ms = Some(epoch);
        })?;
        self.inner.events.publish();
        self.find_in(&doc, id)
    }

    /// Any status, requires `running`: write an operator entry and forward
    /// the message to the child's stdin.
    pub async fn send_intervention(&self, id: &str, message: &str) -> Result<()> {
        let loop_ = self.require_loop(id)?;
        if loop_.status != LoopStatus::Running {
            return Err(self.invalid_transition(loop_.status, "intervene"));
        }
        self.inner.supervisor.intervene(id, message).await?;
        self.inner
            .journal
            .append(id, LogEntryType::Operator, message, &self.inner.clock)?;
        self.inner.events.publish();
        Ok(())
    }

    /// `paused` (prev-session) → removed: delete the log, drop the record.
    pub async fn discard_paused_loop(&self, id: &str) -> Result<()> {
        let loop_ = self.require_loop(id)?;
        if loop_.status != LoopStatus::Paused {
            return Err(self.invalid_transition(loop_.status, "discard"));
        }
        if self.resume_kind(id) != ResumeKind::CrossSession {
            return Err(EngineError::InvalidTransition {
                status: "paused (live process present — stop it before discarding)".to_string(),
                event: "discard".to_string(),
            });
        }
        self.inner.state.lock().remove_loop(id)?;
        self.inner.journal.delete(id)?;
        self.inner.events.publish();
        Ok(())
    }

    /// Flip every `running`/`paused` loop with no live pid to
    /// `paused(prevSession)`. Run once at startup, after a crash.
    pub async fn mark_orphaned_paused_loops(&self) -> Result<usize> {
        let swept = self.inner.state.lock().sweep_orphans(&self.inner.clock)?;
        if swept > 0 {
            self.inner.events.publish();
        }
        Ok(swept)
    }

    /// Whether a resume on this loop could signal a live process rather
    /// than spawn a fresh one.
    pub fn can_resume_in_session(&self, id: &str) -> Result<bool> {
        let _ = self.require_loop(id)?;
        Ok(self.resume_kind(id) == ResumeKind::SameSession)
    }

    /// Ask the issue tracker to close the issue. Local state is marked
    /// regardless of tracker-side failure being surfaced to the caller.
    pub async fn close_issue(&self, id: &str, comment: Option<&str>) -> Result<CloseOutcome> {
        let loop_ = self.require_loop(id)?;
        let outcome = self.inner.issues.close(&loop_.issue.url, comment).await?;
        self.inner.state.lock().update_loop(id, |l| {
            l.issue_closed = true;
        })?;
        self.inner.events.publish();
        Ok(outcome)
    }

    /// Operator toggle: set completion on one criterion out of band. Never
    /// auto-completes the loop — only the agent's promise or a supervised
    /// exit does that.
    pub async fn toggle_criterion(&self, id: &str, n: usize, completed: bool) -> Result<Loop> {
        let epoch = self.inner.clock.epoch_ms();
        let doc = self.inner.state.lock().update_loop(id, |l| {
            if let Some(c) = l.issue.criteria.get_mut(n.saturating_sub(1)) {
                if completed {
                    c.mark_complete(CompletedBy::Operator, epoch);
                } else {
                    c.mark_incomplete();
                }
            }
        })?;
        self.inner.journal.append(
            id,
            LogEntryType::System,
            &format!(
                "Criterion {n} {} by operator",
                if completed { "complete" } else { "incomplete" }
            ),
            &self.inner.clock,
        )?;

        if let Ok(loop_) = self.find_in(&doc, id) {
            let new_body = self
                .inner
                .issues
                .apply_criteria_to_body(&loop_.issue.body, &loop_.issue.criteria);
            if new_body != loop_.issue.body {
                if let Err(e) = self.inner.issues.update_body(&loop_.issue.url, &new_body).await {
                    error!(loop_id = id, error = %e, "failed to re-render issue body");
                }
            }
        }

        self.inner.events.publish();
        self.find_in(&doc, id)
    }

    fn spawn_pump(&self, loop_id: String, rx: mpsc::Receiver<SupervisorEvent>) {
        let inner = self.inner.clone();
        tokio::spawn(async move {
            run_pump(inner, loop_id, rx).await;
        });
    }

    fn require_loop(&self, id: &str) -> Result<Loop> {
        let doc = self.inner.state.lock().load()?;
        doc.loops
            .into_iter()
            .find(|l| l.id == id)
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    fn find_in(&self, doc: &StateDocument, id: &str) -> Result<Loop> {
        doc.loops
            .iter()
            .find(|l| l.id == id)
            .cloned()
            .ok_or_else(|| EngineError::NotFound(id.to_string()))
    }

    fn invalid_transition(&self, status: LoopStatus, event: &str) -> EngineError {
        EngineError::InvalidTransition {
            status: status.to_string(),
            event: event.to_string(),
        }
    }
}

fn initial_prompt(loop_: &Loop) -> String {
    format!(
        "{}\n\nAcceptance criteria:\n{}",
        loop_.issue.body,
        render_criteria_list(&loop_.issue.criteria)
    )
}

async fn run_pump<Issues, Clk>(
    inner: Arc<Inner<Issues, Clk>>,
    loop_id: String,
    mut rx: mpsc::Receiver<SupervisorEvent>,
) where
    Issues: IssueTracker,
    Clk: Clock,
{
    while let Some(event) = rx.recv().await {
        match event {
            SupervisorEvent::Parsed(ParserEvent::Text(text)) => {
                if !text.trim().is_empty() {
                    if let Err(e) = inner.journal.append(&loop_id, LogEntryType::Agent, &text, &inner.clock) {
                        warn!(loop_id = %loop_id, error = %e, "failed to append agent log entry");
                    }
                }
            }
            SupervisorEvent::Parsed(ParserEvent::SessionId(id)) => {
                let _ = inner.state.lock().update_loop(&loop_id, |l| {
                    if l.session_id.is_none() {
                        l.session_id = Some(id.clone());
                    }
                });
                inner.events.publish();
            }
            SupervisorEvent::Parsed(ParserEvent::CriterionComplete(n)) => {
                handle_criterion_event(&inner, &loop_id, n, true).await;
            }
            SupervisorEvent::Parsed(ParserEvent::CriterionIncomplete(n)) => {
                handle_criterion_event(&inner, &loop_id, n, false).await;
            }
            SupervisorEvent::Parsed(ParserEvent::TaskComplete) => {
                let epoch = inner.clock.epoch_ms();
                let _ = inner.state.lock().update_loop(&loop_id, |l| {
                    if !l.status.is_terminal() {
                        l.status = LoopStatus::Completed;
                        l.ended_at_ms = Some(epoch);
                    }
                });
                inner.events.publish();
            }
            SupervisorEvent::Exit { .. } => {
                finalize_exit(&inner, &loop_id);
                inner.supervisor.reap(&loop_id);
                inner.events.publish();
                break;
            }
        }
    }
}

async fn handle_criterion_event<Issues, Clk>(
    inner: &Arc<Inner<Issues, Clk>>,
    loop_id: &str,
    n: usize,
    completed: bool,
) where
    Issues: IssueTracker,
    Clk: Clock,
{
    let epoch = inner.clock.epoch_ms();
    let result = inner.state.lock().update_loop(loop_id, |l| {
        if let Some(c) = l.issue.criteria.get_mut(n.saturating_sub(1)) {
            if completed {
                c.mark_complete(CompletedBy::Agent, epoch);
            } else {
                c.mark_incomplete();
            }
        }
        if completed && l.all_criteria_complete() && !l.status.is_terminal() {
            l.status = LoopStatus::Completed;
            l.ended_at_ms = Some(epoch);
        }
    });
    if let Err(e) = result {
        warn!(loop_id = %loop_id, error = %e, "failed to persist criterion event");
    }
    let verb = if completed { "complete" } else { "incomplete" };
    let _ = inner.journal.append(
        loop_id,
        LogEntryType::System,
        &format!("Criterion {n} {verb}"),
        &inner.clock,
    );
    inner.events.publish();
}

/// Reconcile a natural process exit against the rules in the process
/// supervisor's exit-detection section: already-terminal statuses are
/// left alone, everything else that wasn't operator-stopped becomes
/// `error`.
fn finalize_exit<Issues, Clk>(inner: &Arc<Inner<Issues, Clk>>, loop_id: &str)
where
    Issues: IssueTracker,
    Clk: Clock,
{
    let epoch = inner.clock.epoch_ms();
    let _ = inner.state.lock().update_loop(loop_id, |l| {
        if l.status.is_terminal() {
            return;
        }
        l.status = LoopStatus::Error;
        l.ended_at_ms = Some(epoch);
        l.error = Some("agent exited".to_string());
    });
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
