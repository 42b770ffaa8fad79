#![forbid(unsafe_code)]

//! Lazily-memoized values derived from [`Signal`] dependencies.
//!
//! # Design
//!
//! [`Derived<T>`] caches the result of a compute function. A dependency
//! change marks the cache stale via a subscription; recomputation is
//! deferred until the next [`get()`](Derived::get) or
//! [`with()`](Derived::with).
//!
//! # Invariants
//!
//! 1. `get()` never returns a value inconsistent with the current state of
//!    its dependencies (no stale reads after a dependency mutation).
//! 2. The compute function runs at most once per dependency change cycle.
//! 3. If no dependency changed, `get()` returns the cached value in O(1).
//! 4. Version increments by exactly 1 per recomputation.
//!
//! # Failure Modes
//!
//! - **Dependency dropped**: the subscription becomes inert; the derived
//!   value keeps its last cached result and never goes stale again from
//!   that source.

use std::cell::{Cell, RefCell};
use std::rc::Rc;

use crate::signal::{Signal, Subscription};

// ─── Types ───────────────────────────────────────────────────────────────────

struct DerivedInner<T> {
    compute: Box<dyn Fn() -> T>,
    /// `None` only before the first computation.
    cached: Option<T>,
    stale: Cell<bool>,
    /// Bumped once per recomputation.
    version: u64,
    /// Keep dependency callbacks alive for the lifetime of this value.
    _subscriptions: Vec<Subscription>,
}

/// A lazily-evaluated, memoized value derived from one or two [`Signal`]s.
///
/// Cloning a `Derived` creates a new handle to the **same** cached state.
pub struct Derived<T> {
    inner: Rc<RefCell<DerivedInner<T>>>,
}

impl<T> Clone for Derived<T> {
    fn clone(&self) -> Self {
        Self {
            inner: Rc::clone(&self.inner),
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for Derived<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let inner = self.inner.borrow();
        f.debug_struct("Derived")
            .field("cached", &inner.cached)
            .field("stale", &inner.stale.get())
            .field("version", &inner.version)
            .finish()
    }
}

// ─── Construction ────────────────────────────────────────────────────────────

impl<T: Clone + 'static> Derived<T> {
    /// Derive a value from a single signal.
    pub fn map<S: Clone + PartialEq + 'static>(
        source: &Signal<S>,
        f: impl Fn(&S) -> T + 'static,
    ) -> Self {
        let source_handle = source.clone();
        let derived = Self::from_compute(move || source_handle.with(|v| f(v)));
        let sub = derived.mark_stale_on_change(source);
        derived.inner.borrow_mut()._subscriptions.push(sub);
        derived
    }

    /// Derive a value from two signals.
    pub fn zip<A, B>(a: &Signal<A>, b: &Signal<B>, f: impl Fn(&A, &B) -> T + 'static) -> Self
    where
        A: Clone + PartialEq + 'static,
        B: Clone + PartialEq + 'static,
    {
        let a_handle = a.clone();
        let b_handle = b.clone();
        let derived =
            Self::from_compute(move || a_handle.with(|va| b_handle.with(|vb| f(va, vb))));
        let sub_a = derived.mark_stale_on_change(a);
        let sub_b = derived.mark_stale_on_change(b);
        {
            let mut inner = derived.inner.borrow_mut();
            inner._subscriptions.push(sub_a);
            inner._subscriptions.push(sub_b);
        }
        derived
    }

    fn from_compute(compute: impl Fn() -> T + 'static) -> Self {
        Self {
            inner: Rc::new(RefCell::new(DerivedInner {
                compute: Box::new(compute),
                cached: None,
                // Stale initially; the first get() computes.
                stale: Cell::new(true),
                version: 0,
                _subscriptions: Vec::new(),
            })),
        }
    }

    fn mark_stale_on_change<S: Clone + PartialEq + 'static>(
        &self,
        source: &Signal<S>,
    ) -> Subscription {
        let weak = Rc::downgrade(&self.inner);
        source.subscribe(move |_| {
            if let Some(strong) = weak.upgrade() {
                strong.borrow().stale.set(true);
            }
        })
    }
}

// ─── Access ──────────────────────────────────────────────────────────────────

impl<T: Clone + 'static> Derived<T> {
    /// Current value, recomputing first if any dependency changed.
    #[must_use]
    pub fn get(&self) -> T {
        self.refresh();
        self.inner
            .borrow()
            .cached
            .as_ref()
            .expect("cached is always Some after refresh")
            .clone()
    }

    /// Access the current value by reference without cloning, recomputing
    /// first if any dependency changed.
    pub fn with<R>(&self, f: impl FnOnce(&T) -> R) -> R {
        self.refresh();
        let inner = self.inner.borrow();
        f(inner
            .cached
            .as_ref()
            .expect("cached is always Some after refresh"))
    }

    fn refresh(&self) {
        let mut inner = self.inner.borrow_mut();
        if inner.stale.get() || inner.cached.is_none() {
            let value = (inner.compute)();
            inner.cached = Some(value);
            inner.stale.set(false);
            inner.version += 1;
        }
    }

    /// Whether the cached value is out of date.
    #[must_use]
    pub fn is_stale(&self) -> bool {
        self.inner.borrow().stale.get()
    }

    /// Force the next access to recompute.
    pub fn invalidate(&self) {
        self.inner.borrow().stale.set(true);
    }

    /// Recomputation counter. Increments by 1 per recomputation.
    #[must_use]
    pub fn version(&self) -> u64 {
        self.inner.borrow().version
    }
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn map_tracks_source() {
        let source = Signal::new(10);
        let doubled = Derived::map(&source, |v| v * 2);

        assert_eq!(doubled.get(), 20);
        source.set(5);
        assert!(doubled.is_stale());
        assert_eq!(doubled.get(), 10);
    }

    #[test]
    fn zip_tracks_both_sources() {
        let text = Signal::new("meow".to_string());
        let monochrome = Signal::new(false);
        let request = Derived::zip(&text, &monochrome, |t, m| {
            format!("text={t}&monochrome={m}")
        });

        assert_eq!(request.get(), "text=meow&monochrome=false");

        text.set("purr".to_string());
        assert_eq!(request.get(), "text=purr&monochrome=false");

        monochrome.set(true);
        assert_eq!(request.get(), "text=purr&monochrome=true");
    }

    #[test]
    fn compute_runs_at_most_once_per_change() {
        let runs = Rc::new(Cell::new(0u32));
        let runs_cb = Rc::clone(&runs);
        let source = Signal::new(1);
        let derived = Derived::map(&source, move |v| {
            runs_cb.set(runs_cb.get() + 1);
            *v
        });

        // Lazy: nothing computed yet.
        assert_eq!(runs.get(), 0);

        assert_eq!(derived.get(), 1);
        assert_eq!(derived.get(), 1);
        assert_eq!(runs.get(), 1);

        source.set(2);
        assert_eq!(derived.get(), 2);
        assert_eq!(derived.get(), 2);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn equal_source_write_does_not_dirty() {
        let source = Signal::new(3);
        let derived = Derived::map(&source, |v| *v);
        let _ = derived.get();

        source.set(3);
        assert!(!derived.is_stale());
        assert_eq!(derived.version(), 1);
    }

    #[test]
    fn version_counts_recomputations() {
        let source = Signal::new(0);
        let derived = Derived::map(&source, |v| *v);
        assert_eq!(derived.version(), 0);

        let _ = derived.get();
        assert_eq!(derived.version(), 1);

        for value in 1..=10 {
            source.set(value);
            let _ = derived.get();
        }
        assert_eq!(derived.version(), 11);
    }

    #[test]
    fn invalidate_forces_recompute() {
        let runs = Rc::new(Cell::new(0u32));
        let runs_cb = Rc::clone(&runs);
        let source = Signal::new(5);
        let derived = Derived::map(&source, move |v| {
            runs_cb.set(runs_cb.get() + 1);
            *v
        });

        assert_eq!(derived.get(), 5);
        derived.invalidate();
        assert!(derived.is_stale());
        assert_eq!(derived.get(), 5);
        assert_eq!(runs.get(), 2);
    }

    #[test]
    fn with_reads_by_reference() {
        let source = Signal::new(vec![1, 2, 3]);
        let sum = Derived::map(&source, |v| v.iter().sum::<i32>());
        assert_eq!(sum.with(|s| *s), 6);
    }

    #[test]
    fn clone_shares_cache() {
        let source = Signal::new(1);
        let derived = Derived::map(&source, |v| v + 1);
        let other = derived.clone();

        assert_eq!(derived.get(), 2);
        assert_eq!(other.version(), 1);

        source.set(9);
        assert_eq!(other.get(), 10);
        assert_eq!(derived.version(), 2);
    }

    #[test]
    fn survives_source_drop() {
        let derived;
        {
            let source = Signal::new(42);
            derived = Derived::map(&source, |v| *v);
            let _ = derived.get();
        }
        assert_eq!(derived.get(), 42);
        assert!(!derived.is_stale());
    }

    #[test]
    fn debug_format() {
        let source = Signal::new(42);
        let derived = Derived::map(&source, |v| *v);
        let _ = derived.get();
        let dbg = format!("{derived:?}");
        assert!(dbg.contains("Derived"));
        assert!(dbg.contains("42"));
    }
}
