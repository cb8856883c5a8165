// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The persistent store: a single JSON document holding every loop.
//!
//! There is exactly one writer — the engine, serialized through its own
//! mutex — so this module only has to make each individual write crash-safe,
//! not guard against concurrent writers.

use loopctl_core::{Clock, Loop, LoopStatus};
use serde::{Deserialize, Serialize};
use std::fs::{self, File};
use std::io::{BufReader, BufWriter};
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::error::StorageError;

/// The full persisted state: every loop the supervisor knows about, in
/// creation order (order is preserved so the UI can keep stable row
/// identity across reloads).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StateDocument {
    pub loops: Vec<Loop>,
}

/// Reads and atomically writes the state document at a fixed path.
pub struct StateStore {
    path: PathBuf,
}

impl StateStore {
    pub fn new(data_root: impl Into<PathBuf>) -> Self {
        Self {
            path: data_root.into().join("state.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the document. A missing file yields an empty document. A file
    /// that fails to parse is treated as [`StorageError`]-free state
    /// corruption: it is backed up and an empty document is returned, per
    /// the engine's "never crash on state corruption" contract.
    pub fn load(&self) -> Result<StateDocument, StorageError> {
        if !self.path.exists() {
            return Ok(StateDocument::default());
        }

        let file = File::open(&self.path)?;
        let reader = BufReader::new(file);
        match serde_json::from_reader(reader) {
            Ok(doc) => Ok(doc),
            Err(e) => {
                warn!(error = %e, path = %self.path.display(), "state document corrupt, resetting to empty");
                let bak = self.path.with_extension("json.bak");
                let _ = fs::rename(&self.path, &bak);
                Ok(StateDocument::default())
            }
        }
    }

    /// Save the document atomically: write to a temp file, sync, then
    /// rename over the real path.
    pub fn save(&self, doc: &StateDocument) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }

        let tmp_path = self.path.with_extension("tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, doc)?;
            let file = writer.into_inner().map_err(|e| e.into_error())?;
            file.sync_all()?;
        }
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }

    /// Shallow-merge `patch` into the loop matching `id` and persist.
    /// Unknown ids are a no-op — the caller is expected to check the
    /// returned document for the loop's presence.
    pub fn update_loop(
        &self,
        id: &str,
        patch: impl FnOnce(&mut Loop),
    ) -> Result<StateDocument, StorageError> {
        let mut doc = self.load()?;
        if let Some(l) = doc.loops.iter_mut().find(|l| l.id == id) {
            patch(l);
        }
        self.save(&doc)?;
        Ok(doc)
    }

    /// Append a new loop and persist.
    pub fn insert_loop(&self, loop_: Loop) -> Result<StateDocument, StorageError> {
        let mut doc = self.load()?;
        doc.loops.push(loop_);
        self.save(&doc)?;
        Ok(doc)
    }

    /// Remove a loop entirely (used by `discardPausedLoop`) and persist.
    pub fn remove_loop(&self, id: &str) -> Result<StateDocument, StorageError> {
        let mut doc = self.load()?;
        doc.loops.retain(|l| l.id != id);
        self.save(&doc)?;
        Ok(doc)
    }

    /// Best-effort orphan sweep: for every `running`/`paused` loop whose
    /// last-known pid is no longer alive, flip it to `paused` with
    /// `paused_from_previous_session = true`. Returns the number of loops
    /// touched, for UI notification.
    pub fn sweep_orphans(&self, clock: &impl Clock) -> Result<usize, StorageError> {
        let mut doc = self.load()?;
        let mut swept = 0;
        for l in doc.loops.iter_mut() {
            let alive = l.pid.is_some_and(pid_is_alive);
            if !alive && matches!(l.status, LoopStatus::Running | LoopStatus::Paused) {
                l.status = LoopStatus::Paused;
                l.paused_from_previous_session = true;
                l.paused_at_ms = Some(clock.epoch_ms());
                l.pid = None;
                swept += 1;
            }
        }
        if swept > 0 {
            self.save(&doc)?;
        }
        Ok(swept)
    }
}

/// Probe whether a pid belongs to a live process, by sending signal 0.
/// `ESRCH` means the process is gone; `EPERM` means it exists but we lack
/// permission to signal it, which still counts as alive.
#[cfg(unix)]
fn pid_is_alive(pid: u32) -> bool {
    use nix::errno::Errno;
    use nix::sys::signal::kill;
    use nix::unistd::Pid;

    match kill(Pid::from_raw(pid as i32), None) {
        Ok(()) => true,
        Err(Errno::EPERM) => true,
        Err(_) => false,
    }
}

#[cfg(not(unix))]
fn pid_is_alive(_pid: u32) -> bool {
    false
}

#[cfg(test)]
#[path = "state_store_tests.rs"]
mod tests;
