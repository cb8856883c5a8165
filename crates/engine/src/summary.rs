// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure resume summarizer: turns a loop's log into a bounded string that
//! seeds the resume prompt when a cross-session resume has to start a
//! fresh process with no memory of its own.

use loopctl_core::{LogEntry, LogEntryType};

/// Default cap on the summary's length, kept configurable per the
/// ambiguity note about losing context at a fixed 2000-character limit.
pub const DEFAULT_MAX_CHARS: usize = 2000;

const VERBS: &[&str] = &["created", "modified", "edited", "wrote", "updated", "deleted"];
const MAX_FILES: usize = 10;
const RECENT_AGENT_ENTRIES: usize = 5;
const RECENT_ENTRY_CAP: usize = 200;
const RECENT_TOTAL_CAP: usize = 800;

/// Build the bounded resume summary described by the summarizer's
/// construction steps, truncating the final result to `max_chars`.
pub fn summarize(entries: &[LogEntry], max_chars: usize) -> String {
    let mut sections = Vec::new();

    if let Some(n) = max_iteration(entries) {
        sections.push(format!("Iterations completed: {n}"));
    }

    let files = files_touched(entries);
    if !files.is_empty() {
        sections.push(format!("Files touched: {}", files.join(", ")));
    }

    let criteria_updates = criteria_progress(entries);
    if criteria_updates > 0 {
        sections.push(format!("Criteria progress: {criteria_updates} updates"));
    }

    if let Some(analysis) = last_analysis(entries) {
        sections.push(format!("Last analysis: {analysis}"));
    }

    if let Some(recent) = recent_activity(entries) {
        sections.push(format!("Recent activity: {recent}"));
    }

    truncate(&sections.join("\n\n"), max_chars)
}

fn max_iteration(entries: &[LogEntry]) -> Option<u64> {
    let mut max = None;
    for entry in entries {
        for line in entry.content.lines() {
            if let Some(idx) = line.find("--- Iteration") {
                let rest = line[idx + "--- Iteration".len()..].trim_start();
                let digits: String = rest.chars().take_while(|c| c.is_ascii_digit()).collect();
                if let Ok(n) = digits.parse::<u64>() {
                    max = Some(max.map_or(n, |m: u64| m.max(n)));
                }
            }
        }
    }
    max
}

fn files_touched(entries: &[LogEntry]) -> Vec<String> {
    let mut files = Vec::new();
    for entry in entries {
        for line in entry.content.lines() {
            let words: Vec<&str> = line.split_whitespace().collect();
            for (i, word) in words.iter().enumerate() {
                let bare = word.trim_matches(|c: char| !c.is_alphanumeric());
                if !VERBS.contains(&bare.to_ascii_lowercase().as_str()) {
                    continue;
                }
                let Some(candidate) = words.get(i + 1) else {
                    continue;
                };
                let candidate = candidate.trim_matches(|c: char| {
                    matches!(c, '.' | ',' | ';' | ':' | '"' | '\'' | '`' | '(' | ')')
                });
                if is_path_like(candidate) && !files.iter().any(|f| f == candidate) {
                    files.push(candidate.to_string());
                    if files.len() >= MAX_FILES {
                        return files;
                    }
                }
            }
        }
    }
    files
}

fn is_path_like(s: &str) -> bool {
    match s.rfind('.') {
        Some(dot) if dot > 0 && dot + 1 < s.len() => {
            let ext = &s[dot + 1..];
            (1..=5).contains(&ext.len()) && ext.chars().all(|c| c.is_ascii_lowercase())
        }
        _ => false,
    }
}

fn criteria_progress(entries: &[LogEntry]) -> usize {
    entries
        .iter()
        .filter(|e| e.entry_type == LogEntryType::System)
        .flat_map(|e| e.content.lines())
        .filter(|line| line.contains("Criterion") && line.split_whitespace().any(|w| w == "complete"))
        .count()
}

fn last_analysis(entries: &[LogEntry]) -> Option<String> {
    entries
        .iter()
        .flat_map(|e| e.content.lines())
        .filter(|line| line.trim_start().starts_with("Analysis:"))
        .next_back()
        .map(|line| line.trim_start().trim_start_matches("Analysis:").trim().to_string())
}

fn recent_activity(entries: &[LogEntry]) -> Option<String> {
    let recent: Vec<&LogEntry> = entries
        .iter()
        .filter(|e| e.entry_type == LogEntryType::Agent)
        .rev()
        .take(RECENT_AGENT_ENTRIES)
        .collect();
    if recent.is_empty() {
        return None;
    }
    let joined = recent
        .into_iter()
        .rev()
        .map(|e| truncate(&e.content, RECENT_ENTRY_CAP))
        .collect::<Vec<_>>()
        .join(" / ");
    Some(truncate(&joined, RECENT_TOTAL_CAP))
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        return s.to_string();
    }
    if max_chars <= 3 {
        return s.chars().take(max_chars).collect();
    }
    let keep = max_chars - 3;
    let mut out: String = s.chars().take(keep).collect();
    out.push_str("...");
    out
}

#[cfg(test)]
#[path = "summary_tests.rs"]
mod tests;
