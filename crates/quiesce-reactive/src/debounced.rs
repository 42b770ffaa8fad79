#![forbid(unsafe_code)]

//! Debounced value holder: coalesce a burst of rapid updates into a single
//! delayed update reflecting only the final value in the burst.
//!
//! # Design
//!
//! [`Debounced<T>`] owns a settled value and at most one pending timer.
//! Every [`observe`](Debounced::observe) cancels the pending timer (its emit
//! must never fire) and arms a fresh one for the quiet period, capturing the
//! observed value by move at call time. When a timer fires un-cancelled, the
//! captured value is promoted to the settled value and settle subscribers
//! are notified. Cancel-and-replace, never queue: intermediate values in a
//! burst are silently dropped, bounding downstream work to at most one
//! settle per quiet period of inactivity.
//!
//! # Invariants
//!
//! 1. At most one timer is pending at any time.
//! 2. A cancelled timer's emit never applies, even if cancellation races
//!    the fire tick (the scheduler's cancel is synchronous and idempotent).
//! 3. The emitted value is the one captured when `observe` was called, not
//!    re-read later — a delayed callback can never observe a newer write.
//! 4. [`current`](Debounced::current) never blocks and never arms a timer.
//! 5. Dropping the last handle cancels the pending timer; a fire that races
//!    teardown is a no-op (the callback holds only a weak reference).
//!
//! # Edge cases
//!
//! - Observing a value equal to the settled one still re-arms the timer;
//!   no deduplication is performed. The settle itself then goes through
//!   [`Signal::set`], so subscribers are not notified for an equal value.
//! - A zero quiet period emits at the next `run_due` call, never
//!   synchronously inside `observe`.
//! - A negative quiet period is rejected with
//!   [`DebounceError::InvalidConfiguration`] before any holder exists.

use std::cell::RefCell;
use std::rc::Rc;

use quiesce_core::{Scheduler, TimerId};
use tracing::{debug, trace};
use web_time::Duration;

use crate::error::{DebounceError, Result};
use crate::signal::{Signal, Subscription};

// ─── QuietPeriod ─────────────────────────────────────────────────────────────

/// Minimum duration a value must remain unchanged before it settles.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct QuietPeriod(Duration);

impl QuietPeriod {
    /// Default quiet period in milliseconds.
    pub const DEFAULT_MILLIS: i64 = 500;

    /// Build a quiet period from signed milliseconds.
    ///
    /// Rejects negative input with
    /// [`DebounceError::InvalidConfiguration`]; zero is accepted and means
    /// "emit at the next scheduling opportunity".
    pub fn from_millis(millis: i64) -> Result<Self> {
        if millis < 0 {
            return Err(DebounceError::InvalidConfiguration { millis });
        }
        Ok(Self(Duration::from_millis(millis as u64)))
    }

    /// The quiet period as a [`Duration`].
    #[must_use]
    pub fn duration(&self) -> Duration {
        self.0
    }

    /// Whether this quiet period is zero.
    #[must_use]
    pub fn is_zero(&self) -> bool {
        self.0.is_zero()
    }
}

impl Default for QuietPeriod {
    /// 500 ms.
    fn default() -> Self {
        Self(Duration::from_millis(Self::DEFAULT_MILLIS as u64))
    }
}

impl From<Duration> for QuietPeriod {
    fn from(duration: Duration) -> Self {
        Self(duration)
    }
}

// ─── Debounced ───────────────────────────────────────────────────────────────

struct DebouncedInner<T: Clone + PartialEq + 'static> {
    /// The settled value and its settle-notification fan-out.
    settled: Signal<T>,
    quiet: Duration,
    pending: Option<TimerId>,
    scheduler: Scheduler,
}

impl<T: Clone + PartialEq + 'static> Drop for DebouncedInner<T> {
    fn drop(&mut self) {
        if let Some(id) = self.pending.take() {
            self.scheduler.cancel(id);
            trace!("pending emit cancelled at teardown");
        }
    }
}

/// A holder that exposes the last "settled" value of a rapidly-changing
/// input: the most recent observed value that survived the quiet period
/// uninterrupted.
///
/// Cloning a `Debounced` creates a new handle to the **same** holder;
/// the pending timer is cancelled when the last handle drops.
pub struct Debounced<T: Clone + PartialEq + 'static> {
    inner: Rc<RefCell<DebouncedInner<T>>>,
}

impl<T: Clone + PartialEq + 'static> Clone for Debounced<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: Clone + PartialEq + std::fmt::Debug + 'static> std::fmt::Debug for Debounced<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Debounced")
            .field("settled", &inner.settled.get())
            .field("quiet_ms", &inner.quiet.as_millis())
            .field("pending", &inner.pending.is_some())
            .finish()
    }
}

impl<T: Clone + PartialEq + 'static> Debounced<T> {
    /// Create a holder with `initial` as the settled value and no timer
    /// pending.
    #[must_use]
    pub fn new(scheduler: &Scheduler, initial: T, quiet: QuietPeriod) -> Self {
        Self {
            inner: Rc::new(RefCell::new(DebouncedInner {
                settled: Signal::new(initial),
                quiet: quiet.duration(),
                pending: None,
                scheduler: scheduler.clone(),
            })),
        }
    }

    /// Create a holder with the default 500 ms quiet period.
    #[must_use]
    pub fn with_default_quiet(scheduler: &Scheduler, initial: T) -> Self {
        Self::new(scheduler, initial, QuietPeriod::default())
    }

    /// Create a holder from signed milliseconds, rejecting a negative quiet
    /// period at construction.
    pub fn with_quiet_millis(scheduler: &Scheduler, initial: T, millis: i64) -> Result<Self> {
        Ok(Self::new(
            scheduler,
            initial,
            QuietPeriod::from_millis(millis)?,
        ))
    }

    /// Ingest a new input value.
    ///
    /// Cancels the pending timer (if any) and arms a new one for the quiet
    /// period; when that timer fires un-cancelled, `value` becomes the
    /// settled value. Constant time, never blocks.
    ///
    /// # Errors
    ///
    /// Propagates timer-service failures. On error nothing is armed and the
    /// settled value is unchanged (last known good value preserved).
    pub fn observe(&self, value: T) -> Result<()> {
        let (scheduler, quiet, previous) = {
            let mut inner = self.inner.borrow_mut();
            (inner.scheduler.clone(), inner.quiet, inner.pending.take())
        };
        if let Some(id) = previous {
            scheduler.cancel(id);
            trace!("pending emit replaced by newer input");
        }

        // `value` is moved into the callback here: the emit applies the
        // input as it was at observe time, whatever happens afterwards.
        let weak = Rc::downgrade(&self.inner);
        let id = scheduler.schedule(quiet, move || {
            let Some(inner) = weak.upgrade() else {
                // Holder torn down between fire and emit.
                return;
            };
            let settled = {
                let mut inner = inner.borrow_mut();
                inner.pending = None;
                inner.settled.clone()
            };
            debug!("input settled");
            settled.set(value);
        })?;

        self.inner.borrow_mut().pending = Some(id);
        Ok(())
    }

    /// The settled value right now. Non-blocking; does not touch the timer.
    #[must_use]
    pub fn current(&self) -> T {
        let settled = self.inner.borrow().settled.clone();
        settled.get()
    }

    /// Access the settled value by reference without cloning.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        let settled = self.inner.borrow().settled.clone();
        settled.with(f)
    }

    /// Register a callback invoked with each newly settled value.
    ///
    /// A settle whose value equals the previous settled value does not
    /// notify (see module docs).
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let settled = self.inner.borrow().settled.clone();
        settled.subscribe(f)
    }

    /// Whether an emit is currently pending.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.inner.borrow().pending.is_some()
    }

    /// The configured quiet period.
    #[must_use]
    pub fn quiet_period(&self) -> Duration {
        self.inner.borrow().quiet
    }

    /// Number of value-changing settles so far.
    #[must_use]
    pub fn settle_count(&self) -> u64 {
        let settled = self.inner.borrow().settled.clone();
        settled.version()
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
