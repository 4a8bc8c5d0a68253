//! Tests for builder modules

use std::collections::HashMap;

use prometheus_resource_pool::builders::{build_pool, build_pools};
use prometheus_resource_pool::config::{PoolConfig, PoolsConfig};
use prometheus_resource_pool::core::{PoolError, ResourceFactory};

/// Factory tagging every resource with its pool's name.
struct NamedFactory {
    name: String,
}

impl ResourceFactory for NamedFactory {
    type Resource = String;
    type Error = std::io::Error;

    fn create(&self) -> Result<String, std::io::Error> {
        Ok(format!("{}-conn", self.name))
    }
}

#[test]
fn test_build_pool() {
    let pool = build_pool(
        &PoolConfig::new(3),
        NamedFactory {
            name: "primary".into(),
        },
    )
    .unwrap();
    assert_eq!(pool.capacity(), 3);
    assert_eq!(pool.acquire().unwrap().as_str(), "primary-conn");
}

#[test]
fn test_build_pool_rejects_invalid_config() {
    let err = build_pool(
        &PoolConfig::new(0),
        NamedFactory {
            name: "primary".into(),
        },
    )
    .unwrap_err();
    assert!(matches!(err, PoolError::InvalidConfig(_)));
}

#[test]
fn test_build_pools() {
    let mut pools = HashMap::new();
    pools.insert("primary".to_string(), PoolConfig::new(4));
    pools.insert("reporting".to_string(), PoolConfig::new(1));
    let cfg = PoolsConfig { pools };

    let built = build_pools(&cfg, |name, _| {
        Ok(NamedFactory {
            name: name.to_string(),
        })
    })
    .unwrap();

    assert_eq!(built.len(), 2);
    assert_eq!(built["primary"].capacity(), 4);
    assert_eq!(built["reporting"].acquire().unwrap().as_str(), "reporting-conn");
}

#[test]
fn test_build_pools_propagates_factory_error() {
    let mut pools = HashMap::new();
    pools.insert("primary".to_string(), PoolConfig::new(4));
    let cfg = PoolsConfig { pools };

    let result = build_pools::<NamedFactory, _>(&cfg, |_, _| {
        Err(PoolError::InvalidConfig("no driver".into()))
    });
    assert!(matches!(result, Err(PoolError::InvalidConfig(_))));
}
