//! Tests for utility functions

use prometheus_resource_pool::util::init_tracing;

#[test]
fn test_init_tracing_is_idempotent() {
    init_tracing();
    init_tracing();
    tracing::debug!("tracing initialized twice without panicking");
}
