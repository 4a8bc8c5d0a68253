//! Tests for error types

use std::time::Duration;

use prometheus_resource_pool::core::PoolError;

#[test]
fn test_timeout_error() {
    let err = PoolError::Timeout {
        capacity: 10,
        active: 10,
        waited: Duration::from_secs(1),
    };
    assert_eq!(
        format!("{}", err),
        "timed out after 1s waiting for a free resource (capacity: 10, active: 10)"
    );
}

#[test]
fn test_disposed_error() {
    let err = PoolError::Disposed;
    assert_eq!(format!("{}", err), "resource pool has been disposed");
}

#[test]
fn test_invalid_config_error() {
    let err = PoolError::InvalidConfig("capacity must be greater than 0".to_string());
    assert_eq!(
        format!("{}", err),
        "invalid configuration: capacity must be greater than 0"
    );
}

#[test]
fn test_internal_error() {
    let err = PoolError::Internal("acquire task failed".to_string());
    assert_eq!(format!("{}", err), "internal error: acquire task failed");
}

#[test]
fn test_close_error_converts_to_anyhow() {
    let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "socket closed");
    let err: anyhow::Error = PoolError::Close(Box::new(io)).into();
    assert_eq!(err.to_string(), "failed to close resource: socket closed");
    assert_eq!(err.chain().count(), 2);
}
