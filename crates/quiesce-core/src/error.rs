#![forbid(unsafe_code)]

//! Error types for the timer service.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, SchedulerError>;

/// Failures reported by the [`Scheduler`](crate::Scheduler).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerError {
    /// The scheduler has been closed; no new timers can be armed.
    #[error("scheduler is closed")]
    Closed,
}
