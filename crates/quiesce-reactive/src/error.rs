#![forbid(unsafe_code)]

//! Error types for the reactive layer.

use quiesce_core::SchedulerError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, DebounceError>;

/// Failures reported by [`Debounced`](crate::Debounced) construction and
/// [`observe`](crate::Debounced::observe).
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum DebounceError {
    /// The configured quiet period is negative.
    #[error("invalid quiet period: {millis}ms is negative")]
    InvalidConfiguration { millis: i64 },

    /// The timer service rejected the arm request. The settled value is
    /// unchanged and no timer is pending.
    #[error("timer service rejected the arm request: {0}")]
    Scheduler(#[from] SchedulerError),
}
