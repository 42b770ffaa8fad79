#![forbid(unsafe_code)]

//! Single-threaded one-shot timer service.
//!
//! [`Scheduler`] owns a queue of pending deferred callbacks. Nothing fires
//! preemptively: the host event loop calls [`run_due`](Scheduler::run_due)
//! at its tick points, and every callback whose deadline has passed runs
//! there, on the caller's thread.
//!
//! # Invariants
//!
//! 1. A callback fires at most once.
//! 2. After [`cancel`](Scheduler::cancel) returns `true`, the callback is
//!    guaranteed never to run. `cancel` on an already-fired (or unknown)
//!    timer returns `false` and does nothing — cancellation is idempotent.
//! 3. `run_due` fires callbacks in (deadline, arm-order) order.
//! 4. Timers armed *during* `run_due` — including zero-delay ones — fire on
//!    the next call, never within the current one. A self-rescheduling
//!    callback cannot starve the tick.
//! 5. The queue borrow is never held while a callback runs, so callbacks
//!    may freely schedule, cancel, or query.
//! 6. After [`close`](Scheduler::close), pending callbacks are dropped
//!    un-fired and [`schedule`](Scheduler::schedule) fails with
//!    [`SchedulerError::Closed`].
//!
//! # Concurrency
//!
//! `Rc<RefCell<..>>` inside; clones share the same queue. The type is
//! deliberately not `Send` — all scheduling, firing, and cancellation
//! happen on one logical thread.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::{trace, warn};
use web_time::{Duration, Instant};

use crate::clock::{LabClock, TimeSource};
use crate::error::{Result, SchedulerError};

// ─── Types ───────────────────────────────────────────────────────────────────

/// Handle to a pending timer, returned by [`Scheduler::schedule`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TimerId(u64);

struct TimerEntry {
    id: u64,
    deadline: Instant,
    callback: Box<dyn FnOnce()>,
}

struct SchedulerInner {
    timers: Vec<TimerEntry>,
    /// Next timer id; also serves as the arm-order sequence.
    next_id: u64,
    time: TimeSource,
    closed: bool,
}

/// Single-threaded deferred-callback service.
///
/// Cheaply cloneable; clones share the same timer queue and clock.
pub struct Scheduler {
    inner: Rc<RefCell<SchedulerInner>>,
}

impl Clone for Scheduler {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl std::fmt::Debug for Scheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Scheduler")
            .field("pending", &inner.timers.len())
            .field("closed", &inner.closed)
            .finish()
    }
}

// ─── Construction ────────────────────────────────────────────────────────────

impl Scheduler {
    /// Create a scheduler reading real wall-clock time.
    #[must_use]
    pub fn new() -> Self {
        Self::with_source(TimeSource::Real)
    }

    /// Create a scheduler driven by a [`LabClock`] for deterministic tests.
    #[must_use]
    pub fn lab(clock: &LabClock) -> Self {
        Self::with_source(TimeSource::Lab(clock.clone()))
    }

    fn with_source(time: TimeSource) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SchedulerInner {
                timers: Vec::new(),
                next_id: 0,
                time,
                closed: false,
            })),
        }
    }
}

impl Default for Scheduler {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Scheduling ──────────────────────────────────────────────────────────────

impl Scheduler {
    /// Current time according to this scheduler's time source.
    #[must_use]
    pub fn now(&self) -> Instant {
        self.inner.borrow().time.now()
    }

    /// Arm a one-shot timer that fires `callback` once `delay` has elapsed
    /// and [`run_due`](Scheduler::run_due) is next called.
    ///
    /// A zero `delay` means "the next `run_due` call".
    pub fn schedule(&self, delay: Duration, callback: impl FnOnce() + 'static) -> Result<TimerId> {
        let mut inner = self.inner.borrow_mut();
        if inner.closed {
            return Err(SchedulerError::Closed);
        }
        let id = inner.next_id;
        inner.next_id += 1;
        let deadline = inner.time.now() + delay;
        inner.timers.push(TimerEntry {
            id,
            deadline,
            callback: Box::new(callback),
        });
        trace!(timer_id = id, delay_us = delay.as_micros() as u64, "timer armed");
        Ok(TimerId(id))
    }

    /// Cancel a pending timer.
    ///
    /// Returns `true` if the timer was pending and is now removed — its
    /// callback will never run. Returns `false` if it already fired, was
    /// already cancelled, or never existed.
    pub fn cancel(&self, id: TimerId) -> bool {
        let mut inner = self.inner.borrow_mut();
        let before = inner.timers.len();
        inner.timers.retain(|t| t.id != id.0);
        let removed = inner.timers.len() < before;
        if removed {
            trace!(timer_id = id.0, "timer cancelled");
        }
        removed
    }

    /// Fire every callback whose deadline has passed. Returns the number of
    /// callbacks fired.
    ///
    /// Only timers armed before this call is entered are eligible; anything
    /// a callback schedules (even with zero delay) waits for the next call.
    pub fn run_due(&self) -> usize {
        let (now, armed_before) = {
            let inner = self.inner.borrow();
            (inner.time.now(), inner.next_id)
        };

        let mut fired = 0;
        loop {
            // Pop the earliest due entry without holding the borrow across
            // the callback invocation.
            let entry = {
                let mut inner = self.inner.borrow_mut();
                let due = inner
                    .timers
                    .iter()
                    .enumerate()
                    .filter(|(_, t)| t.deadline <= now && t.id < armed_before)
                    .min_by_key(|(_, t)| (t.deadline, t.id))
                    .map(|(index, _)| index);
                due.map(|index| inner.timers.swap_remove(index))
            };
            let Some(entry) = entry else { break };
            trace!(timer_id = entry.id, "timer fired");
            (entry.callback)();
            fired += 1;
        }
        fired
    }

    /// Number of pending timers.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.inner.borrow().timers.len()
    }

    /// Deadline of the earliest pending timer, if any.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Instant> {
        self.inner.borrow().timers.iter().map(|t| t.deadline).min()
    }

    /// Drop all pending timers un-fired and reject further scheduling.
    ///
    /// Idempotent.
    pub fn close(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.closed {
            return;
        }
        inner.closed = true;
        let dropped = inner.timers.len();
        inner.timers.clear();
        if dropped > 0 {
            warn!(dropped, "scheduler closed with pending timers");
        }
    }

    /// Whether [`close`](Scheduler::close) has been called.
    #[must_use]
    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
