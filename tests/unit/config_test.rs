//! Tests for configuration validation

use std::time::Duration;

use prometheus_resource_pool::config::{PoolConfig, PoolsConfig};

#[test]
fn test_pool_config_validation() {
    let valid = PoolConfig {
        capacity: 10,
        wait_timeout_ms: 5_000,
        report_usage: false,
    };
    assert!(valid.validate().is_ok());
}

#[test]
fn test_pool_config_invalid_capacity() {
    let invalid = PoolConfig {
        capacity: 0,
        wait_timeout_ms: 5_000,
        report_usage: false,
    };
    assert!(invalid.validate().is_err());
}

#[test]
fn test_pool_config_zero_timeout_is_valid() {
    let no_wait = PoolConfig {
        capacity: 10,
        wait_timeout_ms: 0,
        report_usage: false,
    };
    assert!(no_wait.validate().is_ok());
    assert_eq!(no_wait.wait_timeout(), Duration::ZERO);
    assert_eq!(PoolConfig::new(1).with_wait_timeout(Duration::ZERO).wait_timeout_ms, 0);
}

#[test]
fn test_pool_config_builder() {
    let config = PoolConfig::new(4)
        .with_wait_timeout(Duration::from_millis(1500))
        .with_report_usage(true);
    assert_eq!(config.capacity, 4);
    assert_eq!(config.wait_timeout_ms, 1500);
    assert!(config.report_usage);
}

#[test]
fn test_pool_config_from_json_defaults() {
    let config = PoolConfig::from_json_str(r#"{ "capacity": 8 }"#).unwrap();
    assert_eq!(config.capacity, 8);
    assert_eq!(config.wait_timeout(), Duration::from_secs(60));
    assert!(!config.report_usage);
}

#[test]
fn test_pool_config_from_json_rejects_invalid() {
    assert!(PoolConfig::from_json_str(r#"{ "capacity": 0 }"#).is_err());
    assert!(PoolConfig::from_json_str("not json").is_err());
}

#[test]
fn test_pools_config_validation() {
    let mut pools = std::collections::HashMap::new();
    pools.insert("primary".to_string(), PoolConfig::new(10));

    let config = PoolsConfig { pools };
    assert!(config.validate().is_ok());
}

#[test]
fn test_pools_config_empty_pools() {
    let config = PoolsConfig {
        pools: std::collections::HashMap::new(),
    };
    assert!(config.validate().is_err());
}

#[test]
fn test_pools_config_names_bad_pool() {
    let json = r#"{
        "pools": {
            "primary": { "capacity": 10, "wait_timeout_ms": 1000 },
            "reporting": { "capacity": 0 }
        }
    }"#;

    let err = PoolsConfig::from_json_str(json).unwrap_err();
    assert!(err.contains("reporting"), "{err}");
}

#[test]
fn test_pools_config_from_json() {
    let json = r#"{
        "pools": {
            "primary": {
                "capacity": 10,
                "wait_timeout_ms": 1000,
                "report_usage": true
            }
        }
    }"#;

    let config = PoolsConfig::from_json_str(json).unwrap();
    assert!(config.pools["primary"].report_usage);
}
