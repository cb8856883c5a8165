// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use loopctl_adapters::{AgentCall, FakeAdapter};
use loopctl_core::AcceptanceCriterion;

#[test]
fn known_session_id_builds_a_continue_spec() {
    let adapter = FakeAdapter::new("fake");
    let remaining = vec![AcceptanceCriterion::new("B")];
    let spec = build_resume_spec(&adapter, Some("sess-1"), "summary text", &remaining, false);

    assert_eq!(spec.cmd, "fake-agent");
    match adapter.calls().as_slice() {
        [AgentCall::Continue { session_id, prompt, .. }] => {
            assert_eq!(session_id, "sess-1");
            assert!(prompt.contains("summary text"));
        }
        other => panic!("expected a single Continue call, got {other:?}"),
    }
}

#[test]
fn no_session_id_builds_a_fresh_spawn_spec() {
    let adapter = FakeAdapter::new("fake");
    let remaining = vec![AcceptanceCriterion::new("A"), AcceptanceCriterion::new("B")];
    let _ = build_resume_spec(&adapter, None, "summary text", &remaining, true);

    match adapter.calls().as_slice() {
        [AgentCall::Spawn { skip_permissions, .. }] => assert!(skip_permissions),
        other => panic!("expected a single Spawn call, got {other:?}"),
    }
}

#[test]
fn remaining_criteria_text_is_forwarded_to_the_prompt_builder() {
    let adapter = FakeAdapter::new("fake");
    let remaining = vec![
        AcceptanceCriterion::new("first"),
        AcceptanceCriterion::new("second"),
    ];
    let _ = build_resume_spec(&adapter, None, "summary", &remaining, false);
    match adapter.calls().as_slice() {
        [AgentCall::Spawn { prompt, .. }] => assert!(prompt.contains("2 remaining")),
        other => panic!("unexpected calls: {other:?}"),
    }
}
