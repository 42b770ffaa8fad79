#![forbid(unsafe_code)]

//! Time sources for deterministic scheduling.
//!
//! In production the scheduler reads `web_time::Instant::now()`. In lab
//! mode, time is controlled externally via [`LabClock`], enabling fully
//! reproducible timer tests: advance the clock, then ask the scheduler to
//! fire whatever became due.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use web_time::{Duration, Instant};

/// Where the scheduler gets "now" from.
#[derive(Debug, Clone)]
pub(crate) enum TimeSource {
    /// Real wall-clock time.
    Real,
    /// Deterministic lab clock for testing.
    Lab(LabClock),
}

impl TimeSource {
    pub(crate) fn now(&self) -> Instant {
        match self {
            Self::Real => Instant::now(),
            Self::Lab(clock) => clock.now(),
        }
    }
}

/// A manually-advanceable clock for deterministic tests.
///
/// All schedulers sharing the same `LabClock` see the same time. The clock
/// never runs on its own; it moves only when [`advance`](LabClock::advance)
/// is called.
#[derive(Debug, Clone)]
pub struct LabClock {
    epoch: Instant,
    offset_us: Arc<AtomicU64>,
}

impl LabClock {
    /// Create a new lab clock starting at `Instant::now()`.
    #[must_use]
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
            offset_us: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Advance the lab clock by `delta`.
    pub fn advance(&self, delta: Duration) {
        let us = delta.as_micros().min(u64::MAX as u128) as u64;
        self.offset_us.fetch_add(us, Ordering::Release);
    }

    /// Current lab time.
    #[must_use]
    pub fn now(&self) -> Instant {
        let offset = Duration::from_micros(self.offset_us.load(Ordering::Acquire));
        self.epoch + offset
    }
}

impl Default for LabClock {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lab_clock_starts_at_zero_offset() {
        let clock = LabClock::new();
        let t0 = clock.now();
        let t1 = clock.now();
        assert_eq!(t0, t1);
    }

    #[test]
    fn lab_clock_advance_accumulates() {
        let clock = LabClock::new();
        let t0 = clock.now();
        clock.advance(Duration::from_millis(100));
        clock.advance(Duration::from_millis(200));
        assert_eq!(clock.now().duration_since(t0), Duration::from_millis(300));
    }

    #[test]
    fn lab_clock_clones_share_time() {
        let clock = LabClock::new();
        let other = clock.clone();
        clock.advance(Duration::from_millis(50));
        assert_eq!(clock.now(), other.now());
    }

    #[test]
    fn real_source_moves_forward() {
        let source = TimeSource::Real;
        let t0 = source.now();
        let t1 = source.now();
        assert!(t1 >= t0);
    }
}
