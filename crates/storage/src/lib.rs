// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! loopctl-storage: the persistent state document and the per-loop log
//! journal.

mod error;
mod journal;
mod state_store;

pub use error::{JournalError, StorageError};
pub use journal::{Journal, TailHandle, DEFAULT_POLL_MS};
pub use state_store::{StateDocument, StateStore};
