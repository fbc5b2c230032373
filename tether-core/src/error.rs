//! Error types for Tether.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`TetherError`] - Top-level error type for engine operations
//! - [`PlatformError`] - Failures of the outbound platform operations
//! - [`HandlerError`] - Faults raised while running a reaction handler
//! - [`PaginatorError`] - Invalid paginator construction
//! - [`SchedulerError`] - Timeout scheduler failures
//!
//! Expiry is deliberately absent: an elapsed deadline is an outcome, not an
//! error.

use crate::event::MessageId;
use std::time::Duration;
use thiserror::Error;

/// A boxed error type for dynamic error handling.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Top-level error type for all Tether operations.
#[derive(Error, Debug)]
pub enum TetherError {
    /// An outbound platform call failed.
    #[error("platform error: {0}")]
    Platform(#[from] PlatformError),

    /// A paginator could not be built.
    #[error("paginator error: {0}")]
    Paginator(#[from] PaginatorError),

    /// The timeout scheduler rejected a request.
    #[error("scheduler error: {0}")]
    Scheduler(#[from] SchedulerError),

    /// A custom error occurred.
    #[error(transparent)]
    Custom(BoxError),
}

/// Errors returned by a [`Platform`](crate::Platform) implementation.
#[derive(Error, Debug)]
pub enum PlatformError {
    /// The request to the platform failed.
    #[error("platform request failed")]
    Request(#[source] BoxError),

    /// The target message does not exist (deleted, or never sent).
    #[error("unknown message: {0}")]
    UnknownMessage(MessageId),

    /// The platform rejected the call because of rate limiting.
    #[error("rate limited, retry after {retry_after:?}")]
    RateLimited {
        /// How long the platform asked us to wait.
        retry_after: Duration,
    },
}

impl PlatformError {
    /// Wrap any error as a failed request.
    pub fn request(err: impl Into<BoxError>) -> Self {
        PlatformError::Request(err.into())
    }
}

/// Faults raised while running a reaction handler.
///
/// Any of these detaches the callback set that owns the handler.
#[derive(Error, Debug)]
pub enum HandlerError {
    /// The handler returned an error.
    #[error("handler failed: {0}")]
    Failed(#[source] BoxError),

    /// The handler panicked.
    #[error("handler panicked: {0}")]
    Panicked(String),

    /// The handler did not finish within the callback set's time limit.
    #[error("handler timed out after {0:?}")]
    TimedOut(Duration),
}

/// Errors raised when building a paginator.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PaginatorError {
    /// A paginator needs at least one page.
    #[error("a paginator needs at least one page")]
    NoPages,

    /// No navigation action was enabled, so the message could never move.
    #[error("no navigation reactions enabled")]
    NoNavigation,
}

/// Errors raised by the timeout scheduler.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchedulerError {
    /// The scheduler task has stopped.
    #[error("timeout scheduler has been shut down")]
    Shutdown,
}

// Convenience conversions
impl From<BoxError> for TetherError {
    fn from(err: BoxError) -> Self {
        TetherError::Custom(err)
    }
}

impl From<BoxError> for HandlerError {
    fn from(err: BoxError) -> Self {
        HandlerError::Failed(err)
    }
}

impl From<BoxError> for PlatformError {
    fn from(err: BoxError) -> Self {
        PlatformError::Request(err)
    }
}
