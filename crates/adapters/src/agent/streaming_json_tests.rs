// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn build_spawn_args_includes_a_fresh_session_id_and_the_prompt() {
    let adapter = StreamingJsonAdapter::new("claude");
    let spec = adapter.build_spawn_args("do the thing", false);
    assert_eq!(spec.cmd, "claude");
    assert!(spec.args.contains(&"--session-id".to_string()));
    assert_eq!(spec.args.last(), Some(&"do the thing".to_string()));
    assert!(!spec.args.iter().any(|a| a == "--dangerously-skip-permissions"));
}

#[test]
fn build_spawn_args_forwards_skip_permissions() {
    let adapter = StreamingJsonAdapter::new("claude");
    let spec = adapter.build_spawn_args("do the thing", true);
    assert!(spec.args.iter().any(|a| a == "--dangerously-skip-permissions"));
}

#[test]
fn build_continue_args_uses_resume_with_the_given_session_id() {
    let adapter = StreamingJsonAdapter::new("claude");
    let spec = adapter.build_continue_args("sess-123", "keep going", false);
    assert!(spec.args.contains(&"--resume".to_string()));
    assert!(spec.args.contains(&"sess-123".to_string()));
}

#[test]
fn extract_session_id_reads_first_jsonl_line() {
    let adapter = StreamingJsonAdapter::new("claude");
    let chunk = "{\"session_id\":\"abc-1\",\"type\":\"system\"}\n{\"type\":\"text\"}\n";
    assert_eq!(adapter.extract_session_id(chunk), Some("abc-1".to_string()));
}

#[test]
fn extract_session_id_returns_none_without_a_session_id_field() {
    let adapter = StreamingJsonAdapter::new("claude");
    assert_eq!(adapter.extract_session_id("{\"type\":\"text\"}\n"), None);
}

#[test]
fn extract_session_id_ignores_non_json_lines() {
    let adapter = StreamingJsonAdapter::new("claude");
    let chunk = "not json\n{\"session_id\":\"abc-2\"}\n";
    assert_eq!(adapter.extract_session_id(chunk), Some("abc-2".to_string()));
}

#[test]
fn build_resume_prompt_contains_marker_summary_and_criteria() {
    let adapter = StreamingJsonAdapter::new("claude");
    let prompt = adapter.build_resume_prompt("did some work", &["A".to_string(), "B".to_string()]);
    assert!(prompt.contains("RESUMING FROM PAUSE"));
    assert!(prompt.contains("did some work"));
    assert!(prompt.contains("1. A"));
    assert!(prompt.contains("2. B"));
}

#[test]
fn is_available_is_true_for_a_binary_that_exists_on_path() {
    let adapter = StreamingJsonAdapter::new("sh");
    assert!(adapter.is_available());
}

#[test]
fn is_available_is_false_for_an_unknown_binary() {
    let adapter = StreamingJsonAdapter::new("definitely-not-a-real-binary-xyz");
    assert!(!adapter.is_available());
}
