// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::SessionId;

#[test]
fn session_id_displays_as_its_string() {
    let id = SessionId::new("sess-abc");
    assert_eq!(id.to_string(), "sess-abc");
    assert_eq!(id.as_str(), "sess-abc");
}

#[test]
fn session_id_equality_is_by_value() {
    assert_eq!(SessionId::new("a"), SessionId::new("a"));
    assert_ne!(SessionId::new("a"), SessionId::new("b"));
}
