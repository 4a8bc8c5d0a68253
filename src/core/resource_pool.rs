//! Bounded resource pool: capacity gating, recycling and disposal.
//!
//! Capacity is enforced by a [`FairSemaphore`] acquired *outside* the state
//! lock, so a caller blocked waiting for a permit never stalls close or error
//! signals from other threads. Everything else (idle queue, active count,
//! disposed flag, in-transition marker) lives behind one `parking_lot::Mutex`.
//!
//! Bookkeeping is checked after every mutation. A violation means a resource
//! was released twice or a permit leaked; the pool panics rather than keep
//! running on corrupt counts.

use std::collections::VecDeque;
use std::ops::{Deref, DerefMut};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Mutex, MutexGuard};
use tracing::{debug, error, info, warn};

use crate::config::PoolConfig;
use crate::core::connection::PooledConnection;
use crate::core::error::{PoolError, PoolResult};
use crate::core::resource::{PoolId, PooledResource, ResourceFactory, ResourceId, ResourceState};
use crate::core::semaphore::{Acquire, FairSemaphore, Permit};

static NEXT_POOL_ID: AtomicU64 = AtomicU64::new(0);

/// Point-in-time view of the pool's bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct PoolStats {
    /// Maximum number of outstanding resources.
    pub capacity: usize,
    /// Resources checked out to callers.
    pub active: usize,
    /// Resources waiting in the pool.
    pub idle: usize,
    /// Permits nobody holds.
    pub available_permits: usize,
    /// Whether the pool has been disposed.
    pub disposed: bool,
}

/// State guarded by the pool mutex.
struct PoolState<R> {
    /// Idle resources, oldest first.
    idle: VecDeque<PooledResource<R>>,
    active: usize,
    disposed: bool,
    /// The resource currently being returned must be closed, not recycled.
    purge_next: bool,
    /// Resource between idle/factory and the caller.
    in_transition: Option<ResourceId>,
}

/// State lock held across a handoff with the in-transition marker set.
///
/// The marker is cleared when the handoff finishes, fails, or unwinds out of
/// the factory.
struct Handoff<'a, R> {
    state: MutexGuard<'a, PoolState<R>>,
}

impl<'a, R> Handoff<'a, R> {
    fn begin(mut state: MutexGuard<'a, PoolState<R>>, id: ResourceId) -> Self {
        state.in_transition = Some(id);
        Self { state }
    }
}

impl<R> Deref for Handoff<'_, R> {
    type Target = PoolState<R>;

    fn deref(&self) -> &PoolState<R> {
        &self.state
    }
}

impl<R> DerefMut for Handoff<'_, R> {
    fn deref_mut(&mut self) -> &mut PoolState<R> {
        &mut self.state
    }
}

impl<R> Drop for Handoff<'_, R> {
    fn drop(&mut self) {
        self.state.in_transition = None;
    }
}

/// Shared core referenced by the pool handle and every checked-out connection.
pub(crate) struct Shared<F: ResourceFactory> {
    id: PoolId,
    factory: F,
    capacity: usize,
    wait_timeout: Duration,
    report_usage: bool,
    semaphore: FairSemaphore,
    state: Mutex<PoolState<F::Resource>>,
    next_id: AtomicU64,
}

/// Bounded pool of resources produced by a [`ResourceFactory`].
///
/// Cloning is cheap and every clone refers to the same pool.
///
/// ```
/// use prometheus_resource_pool::config::PoolConfig;
/// use prometheus_resource_pool::core::{ResourceFactory, ResourcePool};
///
/// struct Numbers;
///
/// impl ResourceFactory for Numbers {
///     type Resource = u32;
///     type Error = std::io::Error;
///
///     fn create(&self) -> Result<u32, std::io::Error> {
///         Ok(7)
///     }
/// }
///
/// let pool = ResourcePool::new(Numbers, &PoolConfig::new(2)).unwrap();
/// {
///     let conn = pool.acquire().unwrap();
///     assert_eq!(*conn, 7);
///     assert_eq!(pool.active_count(), 1);
/// }
/// assert_eq!(pool.idle_count(), 1);
/// ```
pub struct ResourcePool<F: ResourceFactory> {
    shared: Arc<Shared<F>>,
}

impl<F: ResourceFactory> Clone for ResourcePool<F> {
    fn clone(&self) -> Self {
        Self {
            shared: Arc::clone(&self.shared),
        }
    }
}

impl<F: ResourceFactory> ResourcePool<F> {
    /// Create a pool from a factory and validated configuration.
    ///
    /// No resource is opened until the first [`acquire`](Self::acquire).
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::InvalidConfig`] if `config` fails validation.
    pub fn new(factory: F, config: &PoolConfig) -> PoolResult<Self> {
        config.validate().map_err(PoolError::InvalidConfig)?;
        debug!(
            "creating resource pool (capacity: {}, wait timeout: {:?})",
            config.capacity,
            config.wait_timeout()
        );
        Ok(Self {
            shared: Arc::new(Shared {
                id: NEXT_POOL_ID.fetch_add(1, Ordering::Relaxed),
                factory,
                capacity: config.capacity,
                wait_timeout: config.wait_timeout(),
                report_usage: config.report_usage,
                semaphore: FairSemaphore::new(config.capacity),
                state: Mutex::new(PoolState {
                    idle: VecDeque::new(),
                    active: 0,
                    disposed: false,
                    purge_next: false,
                    in_transition: None,
                }),
                next_id: AtomicU64::new(0),
            }),
        })
    }

    /// Acquire a resource, waiting up to the configured wait timeout.
    ///
    /// # Errors
    ///
    /// See [`acquire_timeout`](Self::acquire_timeout).
    pub fn acquire(&self) -> PoolResult<PooledConnection<F>> {
        self.acquire_timeout(self.shared.wait_timeout)
    }

    /// Acquire a resource, waiting at most `timeout` for a free slot.
    ///
    /// Blocked callers are served first come, first served. A recycled idle
    /// resource is preferred; otherwise the factory opens a new one.
    ///
    /// # Errors
    ///
    /// - [`PoolError::Disposed`] if the pool is, or becomes, disposed.
    /// - [`PoolError::Timeout`] if no slot frees up in time.
    /// - [`PoolError::Creation`] if the factory fails to create or activate
    ///   the resource. The slot is given back.
    pub fn acquire_timeout(&self, timeout: Duration) -> PoolResult<PooledConnection<F>> {
        if self.shared.state.lock().disposed {
            return Err(PoolError::Disposed);
        }

        let started = Instant::now();
        match self.shared.semaphore.try_acquire_for(timeout) {
            Acquire::Acquired => {}
            Acquire::Closed => return Err(PoolError::Disposed),
            Acquire::TimedOut => {
                let active = self.shared.state.lock().active;
                debug!(
                    "acquire timed out after {:?} (capacity: {}, active: {})",
                    timeout, self.shared.capacity, active
                );
                return Err(PoolError::Timeout {
                    capacity: self.shared.capacity,
                    active,
                    waited: started.elapsed(),
                });
            }
        }

        // Released on any error or unwind out of the handoff.
        let permit = Permit::held(&self.shared.semaphore);
        let resource = self.shared.checkout()?;
        // The slot is now counted as active and freed by the return path.
        permit.forget();
        Ok(PooledConnection::new(resource, Arc::clone(&self.shared)))
    }

    /// Completion signal: the caller finished with `resource`.
    ///
    /// The resource goes back to the idle queue, or is closed if the pool is
    /// disposed.
    ///
    /// # Panics
    ///
    /// If `resource` was issued by another pool, if this pool has no active
    /// resource, or if a resource with the same id is already idle. The last
    /// two mean the resource was released twice.
    pub fn notify_closed(&self, resource: PooledResource<F::Resource>) {
        self.shared.check_owner(&resource);
        self.shared.recycle(resource);
    }

    /// Error signal: `resource` failed while in use.
    ///
    /// The resource is closed and its slot freed. A close failure is logged.
    ///
    /// # Panics
    ///
    /// On bookkeeping corruption, as for [`notify_closed`](Self::notify_closed).
    pub fn notify_error(&self, resource: PooledResource<F::Resource>) {
        self.shared.check_owner(&resource);
        self.shared.fail(resource);
    }

    /// Error signal for a resource that is sitting idle in the pool.
    ///
    /// Returns `false` if no idle resource has this id. The active count is
    /// never changed.
    pub fn notify_idle_error(&self, id: ResourceId) -> bool {
        let mut state = self.shared.state.lock();
        let Some(pos) = state.idle.iter().position(|r| r.id() == id) else {
            return false;
        };
        if let Some(resource) = state.idle.remove(pos) {
            warn!("idle resource {} reported an error, discarding", id);
            self.shared.close_quietly(resource);
        }
        self.shared.assert_state(&state);
        true
    }

    /// Dispose the pool.
    ///
    /// Closes every idle resource and wakes blocked acquirers, which then fail
    /// with [`PoolError::Disposed`]. Checked-out resources stay with their
    /// callers and are closed as they come back. Calling this twice is a
    /// no-op.
    ///
    /// # Errors
    ///
    /// Returns [`PoolError::Close`] carrying the first close failure; any
    /// further failures are logged.
    pub fn dispose(&self) -> PoolResult<()> {
        let mut state = self.shared.state.lock();
        if state.disposed {
            return Ok(());
        }
        state.disposed = true;

        let mut first_error = None;
        while let Some(mut resource) = state.idle.pop_front() {
            let id = resource.id();
            resource.set_state(ResourceState::Disposed);
            if let Err(err) = self.shared.factory.close(resource.into_inner()) {
                warn!("error while closing resource {} during dispose: {}", id, err);
                if first_error.is_none() {
                    first_error = Some(err);
                }
            }
        }
        self.shared.semaphore.close();
        self.shared.assert_state(&state);
        info!(
            "resource pool disposed ({} resources still checked out)",
            state.active
        );
        drop(state);

        first_error.map_or(Ok(()), |err| Err(PoolError::Close(Box::new(err))))
    }

    /// Number of resources checked out to callers.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.shared.state.lock().active
    }

    /// Number of resources waiting in the pool.
    #[must_use]
    pub fn idle_count(&self) -> usize {
        self.shared.state.lock().idle.len()
    }

    /// Configured capacity.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.shared.capacity
    }

    /// Configured default wait timeout.
    #[must_use]
    pub fn wait_timeout(&self) -> Duration {
        self.shared.wait_timeout
    }

    /// Whether [`dispose`](Self::dispose) has been called.
    #[must_use]
    pub fn is_disposed(&self) -> bool {
        self.shared.state.lock().disposed
    }

    /// Number of callers blocked waiting for a slot.
    #[must_use]
    pub fn waiting(&self) -> usize {
        self.shared.semaphore.waiting()
    }

    /// Snapshot of the pool's counts, taken under the state lock.
    #[must_use]
    pub fn stats(&self) -> PoolStats {
        let state = self.shared.state.lock();
        PoolStats {
            capacity: self.shared.capacity,
            active: state.active,
            idle: state.idle.len(),
            available_permits: self.shared.semaphore.available_permits(),
            disposed: state.disposed,
        }
    }

    /// The factory this pool draws from.
    #[must_use]
    pub fn factory(&self) -> &F {
        &self.shared.factory
    }
}

#[cfg(feature = "tokio-runtime")]
impl<F: ResourceFactory> ResourcePool<F> {
    /// Acquire from async code without blocking the runtime.
    ///
    /// The wait runs on tokio's blocking thread pool. `None` uses the
    /// configured wait timeout.
    ///
    /// # Errors
    ///
    /// As [`acquire_timeout`](Self::acquire_timeout), plus
    /// [`PoolError::Internal`] if the blocking task could not complete.
    pub async fn acquire_async(&self, timeout: Option<Duration>) -> PoolResult<PooledConnection<F>> {
        let pool = self.clone();
        let timeout = timeout.unwrap_or(self.shared.wait_timeout);
        tokio::task::spawn_blocking(move || pool.acquire_timeout(timeout))
            .await
            .map_err(|e| PoolError::Internal(format!("acquire task failed: {e}")))?
    }
}

impl<F: ResourceFactory> std::fmt::Debug for ResourcePool<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResourcePool")
            .field("stats", &self.stats())
            .field("wait_timeout", &self.shared.wait_timeout)
            .finish()
    }
}

impl<F: ResourceFactory> Shared<F> {
    /// Take an idle resource or create one, and hand it off.
    ///
    /// The caller holds a permit and gives it back if this fails or unwinds.
    fn checkout(&self) -> PoolResult<PooledResource<F::Resource>> {
        let mut state = self.state.lock();
        // Disposal may have raced the permit wait.
        if state.disposed {
            return Err(PoolError::Disposed);
        }

        let mut resource = match state.idle.pop_front() {
            Some(resource) => resource,
            None => {
                let raw = self
                    .factory
                    .create()
                    .map_err(|e| PoolError::Creation(Box::new(e)))?;
                let id = self.next_id.fetch_add(1, Ordering::Relaxed);
                debug!("created resource {}", id);
                PooledResource::new(self.id, id, raw)
            }
        };

        resource.set_state(ResourceState::InTransition);
        let mut state = Handoff::begin(state, resource.id());
        if let Err(err) = self.factory.activate(resource.inner_mut()) {
            warn!("resource {} failed during handoff: {}", resource.id(), err);
            self.discard(&mut state, resource);
            return Err(PoolError::Creation(Box::new(err)));
        }

        resource.set_state(ResourceState::Active);
        state.active += 1;
        self.assert_state(&state);
        debug!("resource {} checked out", resource.id());
        self.report(&state, "acquire");
        Ok(resource)
    }

    /// Completion path: recycle, or discard if disposing or purging.
    pub(crate) fn recycle(&self, resource: PooledResource<F::Resource>) {
        let mut state = self.state.lock();
        self.recycle_locked(&mut state, resource);
    }

    /// Error path for a caller-held resource.
    pub(crate) fn fail(&self, resource: PooledResource<F::Resource>) {
        let mut state = self.state.lock();
        self.discard(&mut state, resource);
    }

    /// Completion path with the purge flag raised for this one resource.
    pub(crate) fn purge(&self, resource: PooledResource<F::Resource>) {
        let mut state = self.state.lock();
        state.purge_next = true;
        self.recycle_locked(&mut state, resource);
        state.purge_next = false;
    }

    fn recycle_locked(
        &self,
        state: &mut PoolState<F::Resource>,
        mut resource: PooledResource<F::Resource>,
    ) {
        if state.disposed || state.purge_next {
            self.discard(state, resource);
            return;
        }
        if state.active == 0 {
            self.invariant_violation(state, "close signal with no active resources");
        }
        if state.idle.iter().any(|r| r.id() == resource.id()) {
            self.invariant_violation(state, "close signal for a resource that is already idle");
        }

        state.active -= 1;
        resource.set_state(ResourceState::Idle);
        debug!("resource {} returned to idle", resource.id());
        // Same critical section as the enqueue: the next acquirer sees both.
        self.semaphore.release();
        state.idle.push_back(resource);
        self.assert_state(state);
        self.report(state, "recycle");
    }

    /// Error/purge path: free the slot (unless in transition) and close.
    fn discard(
        &self,
        state: &mut PoolState<F::Resource>,
        resource: PooledResource<F::Resource>,
    ) {
        let id = resource.id();
        if state.idle.iter().any(|r| r.id() == id) {
            self.invariant_violation(state, "discard signal for a resource that is already idle");
        }
        // In transition: the slot was never counted as active.
        if state.in_transition != Some(id) {
            if state.active == 0 {
                self.invariant_violation(state, "discard signal with no active resources");
            }
            state.active -= 1;
            self.semaphore.release();
        }
        debug!("discarding resource {}", id);
        self.close_quietly(resource);
        self.assert_state(state);
    }

    /// Reject a resource handed back to a pool that did not issue it.
    fn check_owner(&self, resource: &PooledResource<F::Resource>) {
        if resource.pool_id() != self.id {
            error!(
                "resource {} from pool {} returned to pool {}",
                resource.id(),
                resource.pool_id(),
                self.id
            );
            panic!(
                "resource {} was issued by pool {}, not pool {}",
                resource.id(),
                resource.pool_id(),
                self.id
            );
        }
    }

    fn close_quietly(&self, mut resource: PooledResource<F::Resource>) {
        let id = resource.id();
        resource.set_state(ResourceState::Disposed);
        if let Err(err) = self.factory.close(resource.into_inner()) {
            warn!("error while closing resource {}: {}", id, err);
        }
    }

    fn assert_state(&self, state: &PoolState<F::Resource>) {
        // Another acquirer may hold a permit it has not yet counted as active,
        // so only the upper bound holds mid-flight.
        let permits = self.semaphore.available_permits();
        if state.active + state.idle.len() > self.capacity {
            self.invariant_violation(state, "active + idle exceeds capacity");
        }
        if state.active + permits > self.capacity {
            self.invariant_violation(state, "active + available permits exceeds capacity");
        }
    }

    fn invariant_violation(&self, state: &PoolState<F::Resource>, what: &str) -> ! {
        let permits = self.semaphore.available_permits();
        error!(
            "resource pool invariant violated: {} (capacity: {}, active: {}, idle: {}, permits: {})",
            what,
            self.capacity,
            state.active,
            state.idle.len(),
            permits
        );
        panic!(
            "resource pool invariant violated: {what} (capacity: {}, active: {}, idle: {}, permits: {permits})",
            self.capacity,
            state.active,
            state.idle.len()
        );
    }

    fn report(&self, state: &PoolState<F::Resource>, op: &str) {
        if self.report_usage {
            info!(
                "report after {}: active={} idle={} capacity={}",
                op,
                state.active,
                state.idle.len(),
                self.capacity
            );
        }
    }
}

impl<F: ResourceFactory> Drop for Shared<F> {
    fn drop(&mut self) {
        let idle = std::mem::take(&mut self.state.get_mut().idle);
        for resource in idle {
            self.close_quietly(resource);
        }
    }
}
