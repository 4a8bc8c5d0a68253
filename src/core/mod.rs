//! Pool core: capacity gating, resource bookkeeping and lifecycle signals.

pub mod connection;
pub mod error;
pub mod resource;
pub mod resource_pool;
pub mod semaphore;

pub use connection::PooledConnection;
pub use error::{AppResult, BoxError, PoolError, PoolResult};
pub use resource::{PoolId, PooledResource, ResourceFactory, ResourceId, ResourceState};
pub use resource_pool::{PoolStats, ResourcePool};
pub use semaphore::{Acquire, FairSemaphore, Permit};
