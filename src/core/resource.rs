//! Resource factory abstraction and the pooled resource wrapper.

use std::fmt;
use std::ops::{Deref, DerefMut};

/// Identifier assigned to each resource the pool creates.
pub type ResourceId = u64;

/// Identifier of the pool that issued a resource, unique per process.
pub type PoolId = u64;

/// Capability to produce, hand off and close underlying resources.
///
/// Implement this for a database driver (or anything expensive to open) and
/// pass it to [`ResourcePool::new`](crate::core::ResourcePool::new).
pub trait ResourceFactory: Send + Sync + 'static {
    /// The underlying resource, e.g. a physical database connection.
    type Resource: Send + 'static;
    /// Error reported by the underlying driver.
    type Error: std::error::Error + Send + Sync + 'static;

    /// Open one new resource.
    ///
    /// # Errors
    ///
    /// Any driver failure; the pool returns the caller's permit and reports
    /// it as [`PoolError::Creation`](crate::core::PoolError::Creation).
    fn create(&self) -> Result<Self::Resource, Self::Error>;

    /// Prepare a fresh or recycled resource for a new caller.
    ///
    /// Runs while the resource is in transition. A failure here discards the
    /// resource without touching the active count.
    ///
    /// # Errors
    ///
    /// Any driver failure during handoff.
    fn activate(&self, _resource: &mut Self::Resource) -> Result<(), Self::Error> {
        Ok(())
    }

    /// Physically close a resource the pool is discarding.
    ///
    /// # Errors
    ///
    /// Any driver failure while closing. The pool logs it and moves on,
    /// except during [`dispose`](crate::core::ResourcePool::dispose) where the
    /// first one is reported.
    fn close(&self, resource: Self::Resource) -> Result<(), Self::Error> {
        drop(resource);
        Ok(())
    }
}

/// Lifecycle state of a pooled resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub enum ResourceState {
    /// Held by the pool, waiting for a caller.
    Idle,
    /// Being taken from idle (or created) and handed to a caller.
    InTransition,
    /// Checked out by a caller.
    Active,
    /// Closed and removed from all bookkeeping.
    Disposed,
}

/// One underlying resource plus the pool's bookkeeping for it.
///
/// Only the pool creates these. A caller holding one (after
/// [`PooledConnection::detach`](crate::core::PooledConnection::detach)) owns
/// it exclusively and must hand it back through
/// [`ResourcePool::notify_closed`](crate::core::ResourcePool::notify_closed)
/// or [`ResourcePool::notify_error`](crate::core::ResourcePool::notify_error).
pub struct PooledResource<R> {
    pool: PoolId,
    id: ResourceId,
    state: ResourceState,
    inner: R,
}

impl<R> PooledResource<R> {
    pub(crate) const fn new(pool: PoolId, id: ResourceId, inner: R) -> Self {
        Self {
            pool,
            id,
            state: ResourceState::InTransition,
            inner,
        }
    }

    /// Pool-assigned identifier.
    #[must_use]
    pub const fn id(&self) -> ResourceId {
        self.id
    }

    /// Pool that issued this resource and expects it back.
    #[must_use]
    pub const fn pool_id(&self) -> PoolId {
        self.pool
    }

    /// Current lifecycle state.
    #[must_use]
    pub const fn state(&self) -> ResourceState {
        self.state
    }

    pub(crate) fn set_state(&mut self, state: ResourceState) {
        self.state = state;
    }

    pub(crate) const fn inner_mut(&mut self) -> &mut R {
        &mut self.inner
    }

    pub(crate) fn into_inner(self) -> R {
        self.inner
    }
}

impl<R> Deref for PooledResource<R> {
    type Target = R;

    fn deref(&self) -> &R {
        &self.inner
    }
}

impl<R> DerefMut for PooledResource<R> {
    fn deref_mut(&mut self) -> &mut R {
        &mut self.inner
    }
}

impl<R: fmt::Debug> fmt::Debug for PooledResource<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledResource")
            .field("pool", &self.pool)
            .field("id", &self.id)
            .field("state", &self.state)
            .field("inner", &self.inner)
            .finish()
    }
}
