//! Monotonic countdown timer.
//!
//! Time is injected by the caller, so a `Timer` is plain data and tests can
//! step through time with `Instant` arithmetic.

use std::time::{Duration, Instant};

/// Start/stop/reset countdown against a fixed duration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timer {
    duration: Duration,
    reference: Option<Instant>,
    running: bool,
}

impl Timer {
    /// Create a stopped timer.
    pub const fn new(duration: Duration) -> Self {
        Self {
            duration,
            reference: None,
            running: false,
        }
    }

    /// Configured duration.
    #[inline]
    pub const fn duration(&self) -> Duration {
        self.duration
    }

    /// Whether the timer is counting.
    #[inline]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// Begin counting from `now`.
    #[inline]
    pub fn start(&mut self, now: Instant) {
        self.reference = Some(now);
        self.running = true;
    }

    /// Move the reference point to `now` without changing `running`.
    #[inline]
    pub fn reset(&mut self, now: Instant) {
        self.reference = Some(now);
    }

    /// Stop counting. The reference point is kept.
    #[inline]
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Time since the reference point (zero if never started).
    #[inline]
    pub fn elapsed(&self, now: Instant) -> Duration {
        self.reference
            .map_or(Duration::ZERO, |r| now.saturating_duration_since(r))
    }

    /// `true` iff running and at least `duration` has elapsed.
    #[inline]
    pub fn expired(&self, now: Instant) -> bool {
        self.running && self.elapsed(now) >= self.duration
    }
}
