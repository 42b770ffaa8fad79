#![forbid(unsafe_code)]

//! Shared, version-tracked value cells with change notification.
//!
//! # Invariants
//!
//! 1. Version increments exactly once per mutation that changes the value.
//! 2. Subscribers are notified in registration order.
//! 3. Setting a value equal to the current value is a no-op (no version
//!    bump, no notifications).
//! 4. Dropping a [`Subscription`] removes the callback before the next
//!    notification cycle.
//!
//! # Re-entrancy
//!
//! The cell borrow is released before subscriber callbacks run, so a
//! callback may read the signal, set it again, or subscribe/unsubscribe.
//! A callback that sets the signal it is observing recurses through
//! `set()`; equal-value writes terminate the recursion.

use std::any::Any;
use std::cell::RefCell;
use std::rc::{Rc, Weak};

use tracing::trace;

// ─── Types ───────────────────────────────────────────────────────────────────

type SubscriberFn<T> = Box<dyn Fn(&T)>;

struct SignalInner<T> {
    value: T,
    /// Bumped once per value-changing mutation.
    version: u64,
    /// Weak handles; the strong side lives in the `Subscription` guard.
    subscribers: Vec<Weak<SubscriberFn<T>>>,
}

/// A shared, observable value cell.
///
/// Cloning a `Signal` creates a new handle to the **same** cell.
pub struct Signal<T> {
    inner: Rc<RefCell<SignalInner<T>>>,
}

impl<T> Clone for Signal<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Signal<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Signal")
            .field("value", &inner.value)
            .field("version", &inner.version)
            .finish()
    }
}

/// RAII guard for a subscriber callback.
///
/// The callback stays registered for as long as the guard is alive;
/// dropping the guard unsubscribes before the next notification cycle.
#[must_use = "dropping the subscription immediately unsubscribes"]
pub struct Subscription {
    _callback: Rc<dyn Any>,
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription").finish_non_exhaustive()
    }
}

// ─── Signal ──────────────────────────────────────────────────────────────────

impl<T: Clone + PartialEq + 'static> Signal<T> {
    /// Create a signal holding `value`.
    #[must_use]
    pub fn new(value: T) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalInner {
                value,
                version: 0,
                subscribers: Vec::new(),
            })),
        }
    }

    /// Current value (cloned).
    #[must_use]
    pub fn get(&self) -> T {
        self.inner.borrow().value.clone()
    }

    /// Access the current value by reference without cloning.
    ///
    /// # Panics
    ///
    /// Panics if the closure mutates this signal (re-entrant borrow).
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        f(&self.inner.borrow().value)
    }

    /// Replace the value, notifying subscribers if it changed.
    ///
    /// Setting a value equal to the current one is a no-op.
    pub fn set(&self, value: T) {
        let (version, to_notify) = {
            let mut inner = self.inner.borrow_mut();
            if inner.value == value {
                return;
            }
            inner.value = value.clone();
            inner.version += 1;
            // Lazy cleanup: drop dead weak handles, keep registration order.
            inner.subscribers.retain(|weak| weak.strong_count() > 0);
            let live: Vec<_> = inner.subscribers.iter().filter_map(Weak::upgrade).collect();
            (inner.version, live)
        };
        trace!(version, subscribers = to_notify.len(), "signal changed");
        for callback in to_notify {
            callback(&value);
        }
    }

    /// Compute the next value from the current one, then [`set`](Self::set) it.
    pub fn update(&self, f: impl FnOnce(&T) -> T) {
        let next = self.with(f);
        self.set(next);
    }

    /// Register a callback invoked after every value-changing mutation.
    ///
    /// The callback receives the new value. It stays registered until the
    /// returned [`Subscription`] is dropped.
    pub fn subscribe(&self, f: impl Fn(&T) + 'static) -> Subscription {
        let callback: Rc<SubscriberFn<T>> = Rc::new(Box::new(f));
        self.inner
            .borrow_mut()
            .subscribers
            .push(Rc::downgrade(&callback));
        Subscription {
            _callback: callback,
        }
    }

    /// Number of live subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.inner
            .borrow()
            .subscribers
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Mutation counter. Increments by exactly 1 per value-changing `set`.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────
