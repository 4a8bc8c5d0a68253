//! # Prometheus Resource Pool
//!
//! A bounded, fair pool for expensive, externally-provisioned resources such
//! as database connections, shared safely across threads.
//!
//! The pool owns a [`ResourceFactory`](core::ResourceFactory), a hard
//! capacity and a default wait timeout. Callers [`acquire`](core::ResourcePool::acquire)
//! a resource, use it, and hand it back; healthy resources are recycled, failed
//! ones are closed and their slot freed.
//!
//! ## Key Features
//!
//! - **Hard cap**: at most `capacity` resources are ever outstanding
//! - **Fair waiting**: blocked callers are served in arrival order, with a
//!   per-call timeout
//! - **Exactly-once return**: dropping a [`PooledConnection`](core::PooledConnection)
//!   recycles it; [`report_error`](core::PooledConnection::report_error)
//!   discards it
//! - **Safe handoff**: a resource failing while being handed to a caller is
//!   discarded without corrupting the counts
//! - **Clean disposal**: idle resources are closed at once, checked-out ones
//!   as they come back
//! - **Self-checking**: bookkeeping is verified after every mutation and a
//!   violation panics
//!
//! ## Example
//!
//! ```rust
//! use prometheus_resource_pool::config::PoolConfig;
//! use prometheus_resource_pool::core::{PoolError, ResourceFactory, ResourcePool};
//! use std::time::Duration;
//!
//! struct Dialer;
//!
//! impl ResourceFactory for Dialer {
//!     type Resource = String;
//!     type Error = std::io::Error;
//!
//!     fn create(&self) -> Result<String, std::io::Error> {
//!         Ok("connection".to_string())
//!     }
//! }
//!
//! let pool = ResourcePool::new(Dialer, &PoolConfig::new(1)).unwrap();
//!
//! let conn = pool.acquire().unwrap();
//! assert_eq!(conn.as_str(), "connection");
//!
//! // The only slot is taken.
//! let err = pool.acquire_timeout(Duration::from_millis(10)).unwrap_err();
//! assert!(matches!(err, PoolError::Timeout { capacity: 1, active: 1, .. }));
//!
//! drop(conn);
//! pool.dispose().unwrap();
//! assert!(matches!(pool.acquire(), Err(PoolError::Disposed)));
//! ```

#![deny(missing_docs)]
#![deny(unsafe_code)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Pool core: capacity gating, bookkeeping and lifecycle signals.
pub mod core;
/// Configuration models for pools and timeouts.
pub mod config;
/// Builders to construct pools from configuration.
pub mod builders;
/// Shared utilities.
pub mod util;
