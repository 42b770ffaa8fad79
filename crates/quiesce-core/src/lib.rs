#![forbid(unsafe_code)]

//! Core substrate for quiesce: time sources and the timer service.
//!
//! This crate owns the pieces the reactive layer schedules against:
//!
//! - [`LabClock`]: a manually-advanceable clock for deterministic tests.
//! - [`Scheduler`]: a single-threaded, one-shot deferred-callback service
//!   with idempotent cancellation and an explicit [`Scheduler::run_due`]
//!   tick point.
//!
//! Nothing here spawns threads or blocks. The host event loop decides when
//! due callbacks fire by calling `run_due()` at its tick points.

pub mod clock;
pub mod error;
pub mod scheduler;

pub use clock::LabClock;
pub use error::{Result, SchedulerError};
pub use scheduler::{Scheduler, TimerId};
