//! Checked-out resource handle.

use std::fmt;
use std::ops::{Deref, DerefMut};
use std::sync::Arc;

use crate::core::resource::{PooledResource, ResourceFactory, ResourceId};
use crate::core::resource_pool::Shared;

/// A resource checked out of a [`ResourcePool`](crate::core::ResourcePool).
///
/// Dropping the handle is the completion signal: the resource goes back to
/// the pool. Use [`report_error`](Self::report_error) instead when the
/// resource is broken, so it is closed rather than recycled.
#[must_use = "dropping the connection immediately returns it to the pool"]
pub struct PooledConnection<F: ResourceFactory> {
    id: ResourceId,
    /// `Some` for as long as the handle exists. Only `Drop` and the methods
    /// taking `self` by value empty it, and nothing can observe the handle
    /// afterwards, so the accessors below never see `None`.
    resource: Option<PooledResource<F::Resource>>,
    pool: Arc<Shared<F>>,
}

const RETURNED: &str = "pooled connection used after it was returned";

impl<F: ResourceFactory> PooledConnection<F> {
    pub(crate) fn new(resource: PooledResource<F::Resource>, pool: Arc<Shared<F>>) -> Self {
        Self {
            id: resource.id(),
            resource: Some(resource),
            pool,
        }
    }

    /// Pool-assigned identifier of the underlying resource.
    #[must_use]
    pub const fn id(&self) -> ResourceId {
        self.id
    }

    /// Return the resource to the pool. Same as dropping the handle.
    pub fn close(self) {
        drop(self);
    }

    /// Signal that the resource failed; the pool closes it and frees the slot.
    pub fn report_error(mut self) {
        if let Some(resource) = self.resource.take() {
            self.pool.fail(resource);
        }
    }

    /// Return the resource but have the pool close it instead of recycling.
    pub fn purge(mut self) {
        if let Some(resource) = self.resource.take() {
            self.pool.purge(resource);
        }
    }

    /// Take the raw pooled resource out of the handle.
    ///
    /// The pool still counts it as active. The caller must eventually pass it
    /// to [`ResourcePool::notify_closed`](crate::core::ResourcePool::notify_closed)
    /// or [`ResourcePool::notify_error`](crate::core::ResourcePool::notify_error),
    /// otherwise its slot is lost for the life of the pool.
    #[must_use]
    pub fn detach(mut self) -> PooledResource<F::Resource> {
        self.resource.take().expect(RETURNED)
    }
}

impl<F: ResourceFactory> Deref for PooledConnection<F> {
    type Target = F::Resource;

    fn deref(&self) -> &F::Resource {
        self.resource.as_ref().expect(RETURNED)
    }
}

impl<F: ResourceFactory> DerefMut for PooledConnection<F> {
    fn deref_mut(&mut self) -> &mut F::Resource {
        self.resource.as_mut().expect(RETURNED)
    }
}

impl<F: ResourceFactory> Drop for PooledConnection<F> {
    fn drop(&mut self) {
        if let Some(resource) = self.resource.take() {
            self.pool.recycle(resource);
        }
    }
}

impl<F> fmt::Debug for PooledConnection<F>
where
    F: ResourceFactory,
    F::Resource: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PooledConnection")
            .field("id", &self.id)
            .field("resource", &self.resource)
            .finish_non_exhaustive()
    }
}
