// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The agent output parser: turns a raw, chunked byte stream into an
//! ordered sequence of semantic events.
//!
//! Parsing is pure — bytes in, events out. Writing events to the log
//! journal is a concern of whatever drives this parser (the process
//! supervisor), not of the parser itself.

use crate::agent::AgentAdapter;

/// One semantic event recognized in an agent's output stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParserEvent {
    /// `<criterion-complete>N</criterion-complete>`. `N` is 1-indexed.
    CriterionComplete(usize),
    /// `<criterion-incomplete>N</criterion-incomplete>`.
    CriterionIncomplete(usize),
    /// `<promise>TASK COMPLETE</promise>`.
    TaskComplete,
    /// An adapter-recognized session identifier. Only the first
    /// occurrence is meaningful to callers — later ones are still
    /// emitted, since filtering belongs to the caller ("store once").
    SessionId(String),
    /// Any other text, with recognized tokens stripped. Never empty.
    Text(String),
}

const COMPLETE_OPEN: &str = "<criterion-complete>";
const COMPLETE_CLOSE: &str = "</criterion-complete>";
const INCOMPLETE_OPEN: &str = "<criterion-incomplete>";
const INCOMPLETE_CLOSE: &str = "</criterion-incomplete>";
const PROMISE_TOKEN: &str = "<promise>TASK COMPLETE</promise>";

/// Streaming scanner. Buffers across chunk boundaries so a token split
/// mid-stream (e.g. `<criterion-com` at the end of one read, `plete>3...`
/// at the start of the next) is still recognized.
#[derive(Default)]
pub struct OutputParser {
    buffer: String,
}

impl OutputParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed one chunk of raw output, yielding every event it completes.
    /// Incomplete trailing tokens are held in the internal buffer until a
    /// later call supplies the rest.
    pub fn feed(&mut self, adapter: &dyn AgentAdapter, chunk: &str) -> Vec<ParserEvent> {
        let mut events = Vec::new();
        if let Some(id) = adapter.extract_session_id(chunk) {
            events.push(ParserEvent::SessionId(id));
        }

        self.buffer.push_str(chunk);

        loop {
            let next = find_next_marker(&self.buffer);
            match next {
                Some(Marker::Complete { start, end }) => {
                    emit_text_before(&mut events, &self.buffer[..start]);
                    if let Some(n) = parse_index(&self.buffer[start + COMPLETE_OPEN.len()..end]) {
                        events.push(ParserEvent::CriterionComplete(n));
                    }
                    self.buffer.drain(..end + COMPLETE_CLOSE.len());
                }
                Some(Marker::Incomplete { start, end }) => {
                    emit_text_before(&mut events, &self.buffer[..start]);
                    if let Some(n) = parse_index(&self.buffer[start + INCOMPLETE_OPEN.len()..end])
                    {
                        events.push(ParserEvent::CriterionIncomplete(n));
                    }
                    self.buffer.drain(..end + INCOMPLETE_CLOSE.len());
                }
                Some(Marker::Promise { start }) => {
                    emit_text_before(&mut events, &self.buffer[..start]);
                    events.push(ParserEvent::TaskComplete);
                    self.buffer.drain(..start + PROMISE_TOKEN.len());
                }
                Some(Marker::Pending { start }) => {
                    emit_text_before(&mut events, &self.buffer[..start]);
                    self.buffer.drain(..start);
                    break;
                }
                None => {
                    let keep = longest_prefix_suffix(&self.buffer);
                    let flush_to = self.buffer.len() - keep;
                    emit_text_before(&mut events, &self.buffer[..flush_to]);
                    self.buffer.drain(..flush_to);
                    break;
                }
            }
        }

        events
    }
}

enum Marker {
    Complete { start: usize, end: usize },
    Incomplete { start: usize, end: usize },
    Promise { start: usize },
    /// A start marker was found but its closing tag has not arrived yet.
    Pending { start: usize },
}

fn find_next_marker(buffer: &str) -> Option<Marker> {
    let complete_start = buffer.find(COMPLETE_OPEN);
    let incomplete_start = buffer.find(INCOMPLETE_OPEN);
    let promise_start = buffer.find(PROMISE_TOKEN);

    // `<criterion-incomplete>` contains `<criterion-` but not the literal
    // `<criterion-complete>` prefix, so the two opens never collide with
    // each other; find whichever starts earliest.
    let mut candidates: Vec<(usize, &str)> = Vec::new();
    if let Some(s) = complete_start {
        candidates.push((s, "complete"));
    }
    if let Some(s) = incomplete_start {
        candidates.push((s, "incomplete"));
    }
    if let Some(s) = promise_start {
        candidates.push((s, "promise"));
    }
    candidates.sort_by_key(|(s, _)| *s);

    let (start, kind) = candidates.first().copied()?;

    match kind {
        "complete" => match buffer[start..].find(COMPLETE_CLOSE) {
            Some(rel_end) => Some(Marker::Complete {
                start,
                end: start + rel_end,
            }),
            None => Some(Marker::Pending { start }),
        },
        "incomplete" => match buffer[start..].find(INCOMPLETE_CLOSE) {
            Some(rel_end) => Some(Marker::Incomplete {
                start,
                end: start + rel_end,
            }),
            None => Some(Marker::Pending { start }),
        },
        "promise" => Some(Marker::Promise { start }),
        _ => unreachable!(),
    }
}

fn parse_index(raw: &str) -> Option<usize> {
    raw.trim().parse::<usize>().ok()
}

fn emit_text_before(events: &mut Vec<ParserEvent>, text: &str) {
    if !text.is_empty() {
        events.push(ParserEvent::Text(text.to_string()));
    }
}

/// All the marker prefixes a chunk boundary could plausibly split.
const MARKER_HEADS: &[&str] = &[COMPLETE_OPEN, INCOMPLETE_OPEN, PROMISE_TOKEN];

/// Longest suffix of `buffer` that is itself a prefix of some marker —
/// held back so the next `feed` call can complete the token.
fn longest_prefix_suffix(buffer: &str) -> usize {
    let max_len = MARKER_HEADS.iter().map(|m| m.len()).max().unwrap_or(0);
    let upper = buffer.len().min(max_len.saturating_sub(1));
    for len in (1..=upper).rev() {
        let split = buffer.len() - len;
        if !buffer.is_char_boundary(split) {
            continue;
        }
        let suffix = &buffer[split..];
        if MARKER_HEADS.iter().any(|m| m.starts_with(suffix)) {
            return len;
        }
    }
    0
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
