//! Monotonic time sources
//!
//! Keys record the time they entered their current state. The tracker only
//! needs "now" as an unsigned millisecond counter, so the source is a trait:
//! firmware can back it with a hardware tick, the host with [`Instant`], and
//! tests with [`ManualClock`].

use std::cell::Cell;
use std::time::Instant;

/// Milliseconds on a monotonic clock. Wraps after ~49.7 days.
pub type Millis = u32;

/// A monotonic millisecond time source
pub trait Clock {
    /// Current time in milliseconds
    fn now_ms(&self) -> Millis;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> Millis {
        (**self).now_ms()
    }
}

/// Clock backed by [`Instant`], counting from its own construction
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now_ms(&self) -> Millis {
        // Truncate like a firmware millis() counter
        self.origin.elapsed().as_millis() as Millis
    }
}

/// Clock that only moves when told to
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Millis>,
}

impl ManualClock {
    pub fn new(start: Millis) -> Self {
        Self {
            now: Cell::new(start),
        }
    }

    /// Jump to an absolute time
    pub fn set(&self, now: Millis) {
        self.now.set(now);
    }

    /// Move forward by `delta_ms`, wrapping at `u32::MAX`
    pub fn advance(&self, delta_ms: Millis) {
        self.now.set(self.now.get().wrapping_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> Millis {
        self.now.get()
    }
}
