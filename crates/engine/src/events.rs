// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! A single process-wide publisher: an opaque, coalescible signal that
//! fires whenever any loop mutates. Subscribers re-read the document
//! rather than trust the payload, so the signal only needs to be a
//! monotonic counter, not a durable event log.

use tokio::sync::watch;

#[derive(Clone)]
pub struct EventBus {
    tx: watch::Sender<u64>,
}

impl Default for EventBus {
    fn default() -> Self {
        let (tx, _rx) = watch::channel(0);
        Self { tx }
    }
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bump the generation counter. Best-effort: no subscribers is fine.
    pub fn publish(&self) {
        self.tx.send_modify(|gen| *gen = gen.wrapping_add(1));
    }

    pub fn subscribe(&self) -> watch::Receiver<u64> {
        self.tx.subscribe()
    }

    pub fn generation(&self) -> u64 {
        *self.tx.borrow()
    }
}

#[cfg(test)]
#[path = "events_tests.rs"]
mod tests;
