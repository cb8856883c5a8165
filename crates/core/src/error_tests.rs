// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::LoopError;

#[test]
fn error_messages_are_human_readable() {
    let err = LoopError::InvalidTransition("cannot pause a queued loop".to_string());
    assert_eq!(
        err.to_string(),
        "invalid transition: cannot pause a queued loop"
    );
}

#[test]
fn not_found_formats_the_id() {
    let err = LoopError::NotFound("loop-1".to_string());
    assert_eq!(err.to_string(), "loop not found: loop-1");
}
