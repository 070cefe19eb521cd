// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used)]

use super::*;
use std::sync::atomic::{AtomicI64, Ordering};

/// Mock clock for testing with controllable time.
struct MockClock {
    time_ms: AtomicI64,
}

impl MockClock {
    fn new(initial_ms: i64) -> Self {
        MockClock { time_ms: AtomicI64::new(initial_ms) }
    }

    fn set(&self, ms: i64) {
        self.time_ms.store(ms, Ordering::SeqCst);
    }
}

impl ClockSource for MockClock {
    fn now_ms(&self) -> i64 {
        self.time_ms.load(Ordering::SeqCst)
    }
}

#[test]
fn tick_follows_physical_time() {
    let mock = MockClock::new(1_000);
    let clock = LocalClock::with_clock(&mock);
    assert_eq!(clock.tick(), 1_000);
    mock.set(1_500);
    assert_eq!(clock.tick(), 1_500);
}

#[test]
fn tick_is_strictly_increasing_within_a_millisecond() {
    let mock = MockClock::new(1_000);
    let clock = LocalClock::with_clock(&mock);
    let a = clock.tick();
    let b = clock.tick();
    let c = clock.tick();
    assert!(a < b && b < c);
}

#[test]
fn tick_survives_clock_going_backwards() {
    let mock = MockClock::new(5_000);
    let clock = LocalClock::with_clock(&mock);
    let before = clock.tick();
    mock.set(1_000);
    assert!(clock.tick() > before);
}

#[test]
fn observe_moves_clock_past_seen_value() {
    let mock = MockClock::new(1_000);
    let clock = LocalClock::with_clock(&mock);
    clock.observe(9_000);
    assert_eq!(clock.tick(), 9_001);
    clock.observe(10);
    assert_eq!(clock.tick(), 9_002);
}

#[test]
fn system_clock_is_after_2020() {
    assert!(SystemClock.now_ms() > 1_577_836_800_000);
}

#[test]
fn arc_clock_source_delegates() {
    let mock = Arc::new(MockClock::new(42));
    assert_eq!(mock.now_ms(), 42);
}
