//! Shared test factory that records every resource it opens and closes.

#![allow(dead_code)]

use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::Duration;

use parking_lot::Mutex;
use prometheus_resource_pool::config::PoolConfig;
use prometheus_resource_pool::core::{ResourceFactory, ResourcePool};

/// Error returned by [`MockFactory`] when told to fail.
#[derive(Debug)]
pub struct MockError(pub &'static str);

impl std::fmt::Display for MockError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for MockError {}

/// Stand-in for a physical database connection.
#[derive(Debug)]
pub struct MockConn {
    pub serial: usize,
}

#[derive(Default)]
pub struct MockFactory {
    created: AtomicUsize,
    closed: Mutex<Vec<usize>>,
    pub fail_create: AtomicBool,
    pub fail_close: AtomicBool,
    /// Panic once in the next `create`.
    pub panic_create: AtomicBool,
}

impl MockFactory {
    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn closed(&self) -> Vec<usize> {
        self.closed.lock().clone()
    }
}

impl ResourceFactory for MockFactory {
    type Resource = MockConn;
    type Error = MockError;

    fn create(&self) -> Result<MockConn, MockError> {
        if self.panic_create.swap(false, Ordering::SeqCst) {
            panic!("driver crashed while connecting");
        }
        if self.fail_create.load(Ordering::SeqCst) {
            return Err(MockError("database unreachable"));
        }
        let serial = self.created.fetch_add(1, Ordering::SeqCst);
        Ok(MockConn { serial })
    }

    fn close(&self, conn: MockConn) -> Result<(), MockError> {
        self.closed.lock().push(conn.serial);
        if self.fail_close.load(Ordering::SeqCst) {
            return Err(MockError("close failed"));
        }
        Ok(())
    }
}

pub fn pool(capacity: usize, timeout: Duration) -> ResourcePool<MockFactory> {
    let config = PoolConfig::new(capacity).with_wait_timeout(timeout);
    ResourcePool::new(MockFactory::default(), &config).unwrap()
}

/// Spin until `n` callers are blocked on the pool.
pub fn wait_for_waiters(pool: &ResourcePool<MockFactory>, n: usize) {
    let deadline = std::time::Instant::now() + Duration::from_secs(5);
    while pool.waiting() < n {
        assert!(std::time::Instant::now() < deadline, "waiters never queued");
        std::thread::sleep(Duration::from_millis(1));
    }
}

/// Assert the bookkeeping relations that hold whenever no acquire is in flight.
pub fn assert_quiescent(pool: &ResourcePool<MockFactory>) {
    let stats = pool.stats();
    assert!(stats.active + stats.idle <= stats.capacity, "{stats:?}");
    assert_eq!(stats.active + stats.available_permits, stats.capacity, "{stats:?}");
}
