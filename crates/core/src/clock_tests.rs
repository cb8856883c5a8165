// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::{Clock, FakeClock, SystemClock};
use std::time::Duration;

#[test]
fn fake_clock_starts_at_fixed_epoch() {
    let clock = FakeClock::new();
    assert_eq!(clock.epoch_ms(), 1_700_000_000_000);
}

#[test]
fn fake_clock_advance_moves_both_epoch_and_monotonic() {
    let clock = FakeClock::new();
    let before = clock.now();
    clock.advance(Duration::from_secs(5));
    assert_eq!(clock.epoch_ms(), 1_700_000_005_000);
    assert!(clock.now() >= before + Duration::from_secs(5));
}

#[test]
fn fake_clock_set_epoch_ms_is_exact() {
    let clock = FakeClock::new();
    clock.set_epoch_ms(42);
    assert_eq!(clock.epoch_ms(), 42);
}

#[test]
fn fake_clock_clones_share_state() {
    let clock = FakeClock::new();
    let clone = clock.clone();
    clock.advance(Duration::from_secs(1));
    assert_eq!(clone.epoch_ms(), clock.epoch_ms());
}

#[test]
fn system_clock_epoch_is_plausible() {
    let clock = SystemClock;
    // Any time after 2020-01-01.
    assert!(clock.epoch_ms() > 1_577_836_800_000);
}
