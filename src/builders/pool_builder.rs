//! Builders to construct resource pools from configuration.

use std::collections::HashMap;

use crate::config::{PoolConfig, PoolsConfig};
use crate::core::{PoolError, PoolResult, ResourceFactory, ResourcePool};

/// Build a single pool after validating its configuration.
///
/// # Errors
///
/// Returns [`PoolError::InvalidConfig`] if `cfg` is invalid.
pub fn build_pool<F>(cfg: &PoolConfig, factory: F) -> PoolResult<ResourcePool<F>>
where
    F: ResourceFactory,
{
    ResourcePool::new(factory, cfg)
}

/// Build named resource pools from configuration using a factory constructor.
///
/// # Errors
///
/// Fails on invalid configuration or on the first factory constructor error.
pub fn build_pools<F, FF>(
    cfg: &PoolsConfig,
    mut factory_for: FF,
) -> PoolResult<HashMap<String, ResourcePool<F>>>
where
    F: ResourceFactory,
    FF: FnMut(&str, &PoolConfig) -> PoolResult<F>,
{
    cfg.validate()
        .map_err(|e| PoolError::InvalidConfig(format!("config invalid: {e}")))?;

    let mut pools = HashMap::new();
    for (name, pool_cfg) in &cfg.pools {
        let factory = factory_for(name, pool_cfg)?;
        let pool = ResourcePool::new(factory, pool_cfg)?;
        tracing::debug!("built pool `{}` (capacity: {})", name, pool_cfg.capacity);
        pools.insert(name.clone(), pool);
    }

    Ok(pools)
}
