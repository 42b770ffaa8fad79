#![forbid(unsafe_code)]

//! Quiesce public facade crate.
//!
//! This crate provides the stable, ergonomic surface area for users.

pub mod prelude {
    pub use quiesce_core as core;
    pub use quiesce_reactive as reactive;

    pub use quiesce_core::{LabClock, Scheduler, SchedulerError, TimerId};
    pub use quiesce_reactive::{
        Debounced, DebounceError, Derived, QuietPeriod, Signal, Subscription,
    };
}
