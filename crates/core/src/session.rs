// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Session identifier type for cross-restart resume.
//!
//! `SessionId` identifies the agent's own durable session (e.g. a
//! streaming-JSON agent's `--session-id`), as distinguished by the
//! adapter that produced it. It is distinct from [`crate::loop_state::LoopId`],
//! which identifies the supervisor's tracking record and outlives any
//! particular child process.

crate::define_id! {
    /// Unique identifier for an agent's own session, as recognized in its
    /// output stream.
    pub struct SessionId;
}

#[cfg(test)]
#[path = "session_tests.rs"]
mod tests;
