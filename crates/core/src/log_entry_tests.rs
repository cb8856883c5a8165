// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{LogEntry, LogEntryType};

#[test]
fn log_entry_serializes_type_as_snake_case_tag() {
    let entry = LogEntry {
        timestamp: "2026-01-01T00:00:00Z".to_string(),
        loop_id: "loop-1".to_string(),
        entry_type: LogEntryType::Operator,
        content: "switch to plan B".to_string(),
    };
    let json = serde_json::to_string(&entry).unwrap();
    assert!(json.contains("\"type\":\"operator\""));
}

#[test]
fn log_entry_round_trips_through_json() {
    let entry = LogEntry {
        timestamp: "2026-01-01T00:00:00Z".to_string(),
        loop_id: "loop-1".to_string(),
        entry_type: LogEntryType::Error,
        content: "agent exited".to_string(),
    };
    let json = serde_json::to_string(&entry).unwrap();
    let back: LogEntry = serde_json::from_str(&json).unwrap();
    assert_eq!(entry, back);
}

#[test]
fn log_entry_type_display_matches_wire_tag() {
    assert_eq!(LogEntryType::Agent.to_string(), "agent");
    assert_eq!(LogEntryType::System.to_string(), "system");
}
