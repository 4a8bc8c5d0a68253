//! Error types for pool operations.

use std::time::Duration;

use thiserror::Error;

/// Boxed error produced by a resource factory or a resource close.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors produced by the resource pool.
///
/// Bookkeeping corruption is not represented here: it panics.
#[derive(Debug, Error)]
pub enum PoolError {
    /// No permit became available before the deadline.
    #[error("timed out after {waited:?} waiting for a free resource (capacity: {capacity}, active: {active})")]
    Timeout {
        /// Configured pool capacity.
        capacity: usize,
        /// Active resources at the moment the wait gave up.
        active: usize,
        /// How long the caller waited.
        waited: Duration,
    },
    /// The pool has been disposed and hands out nothing.
    #[error("resource pool has been disposed")]
    Disposed,
    /// The factory failed to produce or activate a resource.
    #[error("failed to create resource: {0}")]
    Creation(#[source] BoxError),
    /// An idle resource failed to close while the pool was disposed.
    #[error("failed to close resource: {0}")]
    Close(#[source] BoxError),
    /// Configuration validation failed.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    /// Internal failure (blocking task panicked or was cancelled).
    #[error("internal error: {0}")]
    Internal(String),
}

impl PoolError {
    /// Whether retrying the same operation against this pool can succeed.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(self, Self::Timeout { .. } | Self::Creation(_))
    }
}

/// Result alias for pool operations.
pub type PoolResult<T> = Result<T, PoolError>;

/// Application-facing result using anyhow for higher-level contexts.
pub type AppResult<T> = Result<T, anyhow::Error>;
