// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use loopctl_core::{FakeClock, LogEntryType};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tempfile::tempdir;

#[test]
fn append_then_read_all_sees_the_entry() {
    let dir = tempdir().unwrap();
    let journal = Journal::new(dir.path());
    let clock = FakeClock::new();

    journal
        .append("loop-1", LogEntryType::Agent, "hello", &clock)
        .unwrap();

    let entries = journal.read_all("loop-1").unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].content, "hello");
    assert_eq!(entries[0].loop_id, "loop-1");
}

#[test]
fn read_all_on_missing_file_is_empty_not_an_error() {
    let dir = tempdir().unwrap();
    let journal = Journal::new(dir.path());
    assert!(journal.read_all("no-such-loop").unwrap().is_empty());
}

#[test]
fn read_all_skips_malformed_lines() {
    let dir = tempdir().unwrap();
    let journal = Journal::new(dir.path());
    let clock = FakeClock::new();
    journal
        .append("loop-1", LogEntryType::Agent, "first", &clock)
        .unwrap();

    let path = dir.path().join("loops/loop-1/log.jsonl");
    let mut contents = std::fs::read_to_string(&path).unwrap();
    contents.push_str("not json\n");
    std::fs::write(&path, contents).unwrap();

    journal
        .append("loop-1", LogEntryType::Agent, "third", &clock)
        .unwrap();

    let entries = journal.read_all("loop-1").unwrap();
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].content, "third");
}

#[test]
fn read_recent_returns_at_most_n_entries_in_order() {
    let dir = tempdir().unwrap();
    let journal = Journal::new(dir.path());
    let clock = FakeClock::new();
    for i in 0..10 {
        journal
            .append("loop-1", LogEntryType::Agent, &format!("entry-{i}"), &clock)
            .unwrap();
    }

    let recent = journal.read_recent("loop-1", 3).unwrap();
    assert_eq!(recent.len(), 3);
    assert_eq!(recent[0].content, "entry-7");
    assert_eq!(recent[2].content, "entry-9");
}

#[test]
fn read_recent_on_missing_file_is_empty() {
    let dir = tempdir().unwrap();
    let journal = Journal::new(dir.path());
    assert!(journal.read_recent("no-such-loop", 5).unwrap().is_empty());
}

#[test]
fn tail_delivers_exactly_the_complete_lines_appended_after_it_begins() {
    let dir = tempdir().unwrap();
    let journal = Journal::new(dir.path());
    let clock = FakeClock::new();

    // Pre-existing entry before the tailer starts should not be delivered.
    journal
        .append("loop-1", LogEntryType::Agent, "before", &clock)
        .unwrap();

    let received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = received.clone();
    let handle = journal.tail(
        "loop-1",
        move |entry| received_clone.lock().unwrap().push(entry.content),
        None::<fn(std::io::Error)>,
        10,
    );

    std::thread::sleep(Duration::from_millis(50));
    journal
        .append("loop-1", LogEntryType::Agent, "after-1", &clock)
        .unwrap();
    journal
        .append("loop-1", LogEntryType::Agent, "after-2", &clock)
        .unwrap();
    std::thread::sleep(Duration::from_millis(100));
    handle.cancel();
    std::thread::sleep(Duration::from_millis(20));

    let got = received.lock().unwrap().clone();
    assert_eq!(got, vec!["after-1".to_string(), "after-2".to_string()]);
}

#[test]
fn tail_on_missing_file_does_not_error_and_picks_up_once_created() {
    let dir = tempdir().unwrap();
    let journal = Journal::new(dir.path());
    let clock = FakeClock::new();

    let received = Arc::new(Mutex::new(Vec::new()));
    let received_clone = received.clone();
    let handle = journal.tail(
        "late-loop",
        move |entry| received_clone.lock().unwrap().push(entry.content),
        None::<fn(std::io::Error)>,
        10,
    );

    std::thread::sleep(Duration::from_millis(30));
    journal
        .append("late-loop", LogEntryType::System, "now exists", &clock)
        .unwrap();
    std::thread::sleep(Duration::from_millis(60));
    handle.cancel();

    assert_eq!(received.lock().unwrap().clone(), vec!["now exists".to_string()]);
}
