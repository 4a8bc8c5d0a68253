//! Configuration models for pools and timeouts.

pub mod pool;

pub use pool::{PoolConfig, PoolsConfig, ENV_CAPACITY, ENV_REPORT_USAGE, ENV_WAIT_TIMEOUT_MS};
