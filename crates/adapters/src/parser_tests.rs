// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use crate::agent::FakeAdapter;

#[test]
fn recognizes_criterion_complete() {
    let mut parser = OutputParser::new();
    let adapter = FakeAdapter::new("fake");
    let events = parser.feed(&adapter, "before <criterion-complete>1</criterion-complete> after");
    assert_eq!(
        events,
        vec![
            ParserEvent::Text("before ".to_string()),
            ParserEvent::CriterionComplete(1),
            ParserEvent::Text(" after".to_string()),
        ]
    );
}

#[test]
fn recognizes_criterion_incomplete() {
    let mut parser = OutputParser::new();
    let adapter = FakeAdapter::new("fake");
    let events = parser.feed(&adapter, "<criterion-incomplete>2</criterion-incomplete>");
    assert_eq!(events, vec![ParserEvent::CriterionIncomplete(2)]);
}

#[test]
fn recognizes_task_complete_promise() {
    let mut parser = OutputParser::new();
    let adapter = FakeAdapter::new("fake");
    let events = parser.feed(&adapter, "done <promise>TASK COMPLETE</promise>");
    assert_eq!(
        events,
        vec![
            ParserEvent::Text("done ".to_string()),
            ParserEvent::TaskComplete,
        ]
    );
}

#[test]
fn buffers_a_token_split_across_two_chunks() {
    let mut parser = OutputParser::new();
    let adapter = FakeAdapter::new("fake");

    let first = parser.feed(&adapter, "working... <criterion-com");
    assert_eq!(first, vec![ParserEvent::Text("working... ".to_string())]);

    let second = parser.feed(&adapter, "plete>3</criterion-complete>");
    assert_eq!(second, vec![ParserEvent::CriterionComplete(3)]);
}

#[test]
fn buffers_a_promise_split_across_many_small_chunks() {
    let mut parser = OutputParser::new();
    let adapter = FakeAdapter::new("fake");

    let mut all_events = Vec::new();
    for piece in ["<prom", "ise>TASK ", "COMPLETE</prom", "ise>"] {
        all_events.extend(parser.feed(&adapter, piece));
    }
    assert_eq!(all_events, vec![ParserEvent::TaskComplete]);
}

#[test]
fn plain_text_with_no_tokens_passes_through_unchanged() {
    let mut parser = OutputParser::new();
    let adapter = FakeAdapter::new("fake");
    let events = parser.feed(&adapter, "just some ordinary output");
    assert_eq!(
        events,
        vec![ParserEvent::Text("just some ordinary output".to_string())]
    );
}

#[test]
fn session_id_is_emitted_when_the_adapter_recognizes_it() {
    let mut parser = OutputParser::new();
    let adapter = FakeAdapter::new("fake");
    adapter.set_next_session_id("sess-9");
    let events = parser.feed(&adapter, "hello");
    assert_eq!(
        events,
        vec![
            ParserEvent::SessionId("sess-9".to_string()),
            ParserEvent::Text("hello".to_string()),
        ]
    );
}

#[test]
fn multiple_criteria_in_one_chunk_are_emitted_in_order() {
    let mut parser = OutputParser::new();
    let adapter = FakeAdapter::new("fake");
    let events = parser.feed(
        &adapter,
        "<criterion-complete>1</criterion-complete><criterion-complete>2</criterion-complete>",
    );
    assert_eq!(
        events,
        vec![
            ParserEvent::CriterionComplete(1),
            ParserEvent::CriterionComplete(2),
        ]
    );
}
