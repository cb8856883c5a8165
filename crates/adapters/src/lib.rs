// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! External-process concerns: agent adapters, the streamed output
//! parser, and the process supervisor that ties them to a live child.

#![cfg_attr(test, allow(clippy::panic, clippy::unwrap_used, clippy::expect_used))]

pub mod agent;
pub mod issue_tracker;
pub mod parser;
pub mod supervisor;

pub use agent::{
    render_criteria_list, AgentAdapter, AgentError, AgentRegistry, GenericAdapter, LaunchSpec,
    StreamingJsonAdapter,
};
pub use issue_tracker::GhIssueTracker;
pub use parser::{OutputParser, ParserEvent};
pub use supervisor::{ProcessSupervisor, SupervisorError, SupervisorEvent, STOP_GRACE};

#[cfg(any(test, feature = "test-support"))]
pub use agent::{AgentCall, FakeAdapter};
