// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;

#[test]
fn parse_url_accepts_a_github_issue_link() {
    let tracker = GhIssueTracker::new();
    let parsed = tracker.parse_url("https://github.com/acme/widgets/issues/42");
    assert_eq!(parsed.unwrap(), "https://github.com/acme/widgets/issues/42");
}

#[test]
fn parse_url_rejects_non_github_links() {
    let tracker = GhIssueTracker::new();
    assert!(tracker.parse_url("https://gitlab.com/acme/widgets/issues/1").is_err());
}

#[test]
fn parse_criteria_extracts_checked_and_unchecked_items() {
    let body = format!(
        "Intro text\n\n{CRITERIA_START}\n- [x] first thing\n- [ ] second thing\n{CRITERIA_END}\n\nTrailer"
    );
    let criteria = parse_criteria(&body);
    assert_eq!(criteria.len(), 2);
    assert!(criteria[0].completed);
    assert_eq!(criteria[0].text, "first thing");
    assert!(!criteria[1].completed);
    assert_eq!(criteria[1].text, "second thing");
}

#[test]
fn apply_criteria_to_body_inserts_a_section_when_none_exists() {
    let tracker = GhIssueTracker::new();
    let rendered = tracker.apply_criteria_to_body("Some body", &[AcceptanceCriterion::new("do the thing")]);
    assert!(rendered.contains(CRITERIA_START));
    assert!(rendered.contains("- [ ] do the thing"));
}

#[test]
fn apply_criteria_to_body_replaces_an_existing_section() {
    let tracker = GhIssueTracker::new();
    let body = format!("Head\n\n{CRITERIA_START}\n- [ ] stale\n{CRITERIA_END}\n\nTail");
    let mut criterion = AcceptanceCriterion::new("fresh");
    criterion.completed = true;
    let rendered = tracker.apply_criteria_to_body(&body, &[criterion]);
    assert!(!rendered.contains("stale"));
    assert!(rendered.contains("- [x] fresh"));
    assert!(rendered.starts_with("Head"));
    assert!(rendered.ends_with("Tail"));
}
