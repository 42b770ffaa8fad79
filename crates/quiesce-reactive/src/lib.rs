#![forbid(unsafe_code)]

//! Reactive value primitives for single-threaded hosts.
//!
//! Three primitives, one substrate:
//!
//! - [`Signal`]: a shared, version-tracked value cell with change
//!   notification via subscriber callbacks.
//! - [`Derived`]: a lazily-evaluated, memoized value computed from one or
//!   two signals.
//! - [`Debounced`]: a holder that ingests a rapidly-changing input and
//!   exposes a delayed, coalesced "settled" value, re-arming (never
//!   queuing) a single pending timer per input arrival.
//!
//! Timers come from `quiesce-core`'s [`Scheduler`](quiesce_core::Scheduler);
//! the host event loop decides when due emits fire by calling `run_due()`.
//!
//! # Architecture
//!
//! All handles use `Rc<RefCell<..>>` for single-threaded shared ownership.
//! Subscribers are stored as `Weak` function pointers and cleaned up lazily
//! during notification; dropping a [`Subscription`] unsubscribes.

pub mod debounced;
pub mod derived;
pub mod error;
pub mod signal;

pub use debounced::{Debounced, QuietPeriod};
pub use derived::Derived;
pub use error::{DebounceError, Result};
pub use signal::{Signal, Subscription};
