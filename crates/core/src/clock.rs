// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Time abstraction so engine and storage code can be driven deterministically in tests.

use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

/// Source of time for anything that needs to stamp events or measure durations.
///
/// Implementations must be cheap to clone and safe to share across threads —
/// the engine holds one per [`crate::loop_state::Loop`] lifecycle and reads
/// it from both the supervisor loop and the operator command surface.
pub trait Clock: Clone + Send + Sync + 'static {
    /// Milliseconds since the Unix epoch. Used for anything that gets
    /// persisted (state documents, log records).
    fn epoch_ms(&self) -> u64;

    /// A monotonic instant. Used for in-process interval measurement
    /// (idle timers, grace periods) that must never be affected by
    /// wall-clock adjustments.
    fn now(&self) -> Instant;
}

/// Real wall-clock time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn epoch_ms(&self) -> u64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as u64
    }

    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Deterministic clock for tests. Starts at a fixed epoch and only moves
/// when explicitly advanced, so assertions on elapsed time and timestamps
/// don't flake under load.
#[derive(Clone)]
pub struct FakeClock {
    epoch_ms: Arc<AtomicU64>,
    anchor: Instant,
    offset_ms: Arc<Mutex<u64>>,
}

impl FakeClock {
    /// Starts at a fixed, recognizable epoch (2023-11-14T22:13:20Z) so test
    /// assertions never depend on wall-clock state.
    pub fn new() -> Self {
        Self {
            epoch_ms: Arc::new(AtomicU64::new(1_700_000_000_000)),
            anchor: Instant::now(),
            offset_ms: Arc::new(Mutex::new(0)),
        }
    }

    /// Pin the epoch to an exact value.
    pub fn set_epoch_ms(&self, epoch_ms: u64) {
        self.epoch_ms.store(epoch_ms, Ordering::SeqCst);
    }

    /// Advance both the epoch and the monotonic clock by `duration`.
    pub fn advance(&self, duration: std::time::Duration) {
        self.epoch_ms
            .fetch_add(duration.as_millis() as u64, Ordering::SeqCst);
        *self.offset_ms.lock() += duration.as_millis() as u64;
    }
}

impl Default for FakeClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for FakeClock {
    fn epoch_ms(&self) -> u64 {
        self.epoch_ms.load(Ordering::SeqCst)
    }

    fn now(&self) -> Instant {
        self.anchor + std::time::Duration::from_millis(*self.offset_ms.lock())
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
