// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

//! Monotonic millisecond clock for local-touch timestamps.
//!
//! `local_updated` orders search results and the queue orders by
//! `created_at`, so two mutations in the same millisecond must still get
//! distinct, increasing stamps. [`LocalClock`] hands out
//! `max(physical, last + 1)`.

use std::sync::{Arc, Mutex};
use std::time::{SystemTime, UNIX_EPOCH};

/// Trait for getting the current wall clock time.
///
/// This allows injecting a mock clock for testing.
pub trait ClockSource: Send + Sync {
    /// Returns the current time in milliseconds since Unix epoch.
    fn now_ms(&self) -> i64;
}

/// System clock implementation using `std::time::SystemTime`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl ClockSource for SystemClock {
    fn now_ms(&self) -> i64 {
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map(|d| i64::try_from(d.as_millis()).unwrap_or(i64::MAX))
            .unwrap_or(0)
    }
}

impl<C: ClockSource> ClockSource for &C {
    fn now_ms(&self) -> i64 {
        (*self).now_ms()
    }
}

impl<C: ClockSource + ?Sized> ClockSource for Arc<C> {
    fn now_ms(&self) -> i64 {
        (**self).now_ms()
    }
}

/// A clock that never returns the same or an earlier value twice.
pub struct LocalClock<C: ClockSource = SystemClock> {
    clock: C,
    last_ms: Mutex<i64>,
}

impl LocalClock<SystemClock> {
    /// Creates a local clock backed by the system clock.
    pub fn new() -> Self {
        Self::with_clock(SystemClock)
    }
}

impl Default for LocalClock<SystemClock> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C: ClockSource> LocalClock<C> {
    /// Creates a local clock with a custom clock source.
    pub fn with_clock(clock: C) -> Self {
        LocalClock { clock, last_ms: Mutex::new(0) }
    }

    /// Returns the next timestamp, strictly greater than every previous one.
    pub fn tick(&self) -> i64 {
        let physical = self.clock.now_ms();
        let mut last = self.last_ms.lock().unwrap_or_else(|e| e.into_inner());
        let next = if physical > *last { physical } else { *last + 1 };
        *last = next;
        next
    }

    /// Advances past an externally observed timestamp, so the next tick
    /// sorts after it.
    pub fn observe(&self, seen_ms: i64) {
        let mut last = self.last_ms.lock().unwrap_or_else(|e| e.into_inner());
        if seen_ms > *last {
            *last = seen_ms;
        }
    }
}

impl<C: ClockSource> ClockSource for LocalClock<C> {
    fn now_ms(&self) -> i64 {
        self.tick()
    }
}

#[cfg(test)]
#[path = "clock_tests.rs"]
mod tests;
