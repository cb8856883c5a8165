// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The log journal: one append-only, newline-delimited file per loop.
//!
//! Writes are a single `write_all` per record — no fsync contract, per the
//! supervisor's allowance that a crash may lose the last unflushed record.
//! Reads tolerate malformed lines by skipping them, since a line can be
//! torn by a crash mid-write.

use loopctl_core::{Clock, LogEntry, LogEntryType};
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::JournalError;

/// Default poll interval for [`Journal::tail`], per the documented default.
pub const DEFAULT_POLL_MS: u64 = 250;

/// Per-loop append-only log.
pub struct Journal {
    data_root: PathBuf,
}

/// Cancels a running tailer. Dropping it without calling [`cancel`](TailHandle::cancel)
/// still stops the tailer — the flag is shared, not owned exclusively — but
/// calling it explicitly makes the intent visible at the call site.
pub struct TailHandle {
    cancelled: Arc<AtomicBool>,
}

impl TailHandle {
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }
}

impl Journal {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            data_root: data_root.into(),
        }
    }

    fn log_path(&self, loop_id: &str) -> PathBuf {
        self.data_root.join("loops").join(loop_id).join("log.jsonl")
    }

    /// Stamp and append one record.
    pub fn append(
        &self,
        loop_id: &str,
        entry_type: LogEntryType,
        content: &str,
        clock: &impl Clock,
    ) -> Result<(), JournalError> {
        let path = self.log_path(loop_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        let entry = LogEntry {
            timestamp: format_timestamp(clock.epoch_ms()),
            loop_id: loop_id.to_string(),
            entry_type,
            content: content.to_string(),
        };

        let mut file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut line = serde_json::to_string(&entry)?;
        line.push('\n');
        file.write_all(line.as_bytes())?;
        Ok(())
    }

    /// Stream-parse the whole file, silently skipping malformed lines.
    pub fn read_all(&self, loop_id: &str) -> Result<Vec<LogEntry>, JournalError> {
        let path = self.log_path(loop_id);
        let Ok(file) = File::open(&path) else {
            return Ok(Vec::new());
        };
        let reader = BufReader::new(file);
        let mut entries = Vec::new();
        for line in reader.lines() {
            let Ok(line) = line else { continue };
            if line.trim().is_empty() {
                continue;
            }
            if let Ok(entry) = serde_json::from_str::<LogEntry>(&line) {
                entries.push(entry);
            }
        }
        Ok(entries)
    }

    /// Read up to the last `n` entries without scanning the whole file:
    /// seek to `min(file_size, 500*n)` bytes from the end, discard the
    /// leading partial line, then parse from there.
    pub fn read_recent(&self, loop_id: &str, n: usize) -> Result<Vec<LogEntry>, JournalError> {
        let path = self.log_path(loop_id);
        let Ok(mut file) = File::open(&path) else {
            return Ok(Vec::new());
        };

        let file_size = file.metadata()?.len();
        let window = (500u64.saturating_mul(n as u64)).min(file_size);
        let start = file_size - window;
        file.seek(SeekFrom::Start(start))?;

        let mut buf = Vec::with_capacity(window as usize);
        file.read_to_end(&mut buf)?;
        let text = String::from_utf8_lossy(&buf);

        let mut lines: Vec<&str> = text.split('\n').collect();
        // If we didn't start at byte 0 the first "line" is a partial
        // fragment of whatever preceded our seek point; drop it.
        if start > 0 && !lines.is_empty() {
            lines.remove(0);
        }

        let mut entries: Vec<LogEntry> = lines
            .into_iter()
            .filter(|l| !l.trim().is_empty())
            .filter_map(|l| serde_json::from_str::<LogEntry>(l).ok())
            .collect();

        if entries.len() > n {
            let drop = entries.len() - n;
            entries.drain(0..drop);
        }
        Ok(entries)
    }

    /// Delete a loop's entire log directory. Used by `discardPausedLoop`;
    /// a missing directory is not an error.
    pub fn delete(&self, loop_id: &str) -> Result<(), JournalError> {
        let dir = self.data_root.join("loops").join(loop_id);
        match fs::remove_dir_all(&dir) {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(e.into()),
        }
    }

    /// Start a polling tailer. `on_entry` is called for every newly
    /// appended, well-formed record in order; `on_error` (if given) is
    /// called for any I/O failure encountered while polling, and the
    /// tailer keeps going — a transient read failure must not take down
    /// other loops' tailers.
    pub fn tail<F, E>(
        &self,
        loop_id: &str,
        mut on_entry: F,
        mut on_error: Option<E>,
        poll_ms: u64,
    ) -> TailHandle
    where
        F: FnMut(LogEntry) + Send + 'static,
        E: FnMut(std::io::Error) + Send + 'static,
    {
        let path = self.log_path(loop_id);
        let cancelled = Arc::new(AtomicBool::new(false));
        let handle_flag = cancelled.clone();

        std::thread::spawn(move || {
            // Start from the current end of file, like `tail -f`: only
            // records appended after the tailer begins are delivered.
            let mut offset: u64 = std::fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
            let mut partial = Vec::new();

            while !handle_flag.load(Ordering::SeqCst) {
                match poll_once(&path, offset, &mut partial) {
                    Ok(PollOutcome::NoFile) => {}
                    Ok(PollOutcome::Truncated) => {
                        offset = 0;
                        partial.clear();
                    }
                    Ok(PollOutcome::Read { new_offset, lines }) => {
                        offset = new_offset;
                        for line in lines {
                            if let Ok(entry) = serde_json::from_str::<LogEntry>(&line) {
                                on_entry(entry);
                            }
                        }
                    }
                    Err(e) => {
                        if let Some(cb) = on_error.as_mut() {
                            cb(e);
                        }
                    }
                }
                std::thread::sleep(Duration::from_millis(poll_ms));
            }
        });

        TailHandle { cancelled }
    }
}

enum PollOutcome {
    NoFile,
    Truncated,
    Read { new_offset: u64, lines: Vec<String> },
}

fn poll_once(path: &Path, offset: u64, partial: &mut Vec<u8>) -> std::io::Result<PollOutcome> {
    let Ok(mut file) = File::open(path) else {
        return Ok(PollOutcome::NoFile);
    };
    let size = file.metadata()?.len();

    if size < offset {
        return Ok(PollOutcome::Truncated);
    }
    if size == offset {
        return Ok(PollOutcome::Read {
            new_offset: offset,
            lines: Vec::new(),
        });
    }

    file.seek(SeekFrom::Start(offset))?;
    let mut delta = Vec::new();
    file.read_to_end(&mut delta)?;
    partial.extend_from_slice(&delta);

    let mut lines = Vec::new();
    let mut consumed = 0;
    for chunk in partial.split_inclusive(|b| *b == b'\n') {
        if chunk.last() == Some(&b'\n') {
            consumed += chunk.len();
            let line = String::from_utf8_lossy(&chunk[..chunk.len() - 1]).into_owned();
            if !line.trim().is_empty() {
                lines.push(line);
            }
        }
    }
    partial.drain(0..consumed);

    Ok(PollOutcome::Read {
        new_offset: offset + delta.len() as u64,
        lines,
    })
}

fn format_timestamp(epoch_ms: u64) -> String {
    let dt = chrono::DateTime::<chrono::Utc>::from_timestamp_millis(epoch_ms as i64)
        .unwrap_or_else(chrono::Utc::now);
    dt.to_rfc3339_opts(chrono::SecondsFormat::Millis, true)
}

#[cfg(test)]
#[path = "journal_tests.rs"]
mod tests;
