//! # Bridge Factory
//!
//! One bridge per ordered `(source, dest)` pair, built on first use and kept
//! for the factory's lifetime. Concurrent first uses of the same pair may
//! each construct a bridge; the first one stored wins and the others are
//! dropped.

use super::registry::BridgeRegistry;
use crate::domain::NetworkSelector;
use crate::error::{LiquidityManagerError, LiquidityManagerResult, ResultExt};
use crate::ports::Bridge;
use dashmap::DashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Caching bridge factory.
pub struct BridgeFactory {
    registry: BridgeRegistry,
    cache: DashMap<String, Arc<dyn Bridge>>,
}

fn cache_key(source: NetworkSelector, dest: NetworkSelector) -> String {
    format!("{source}-{dest}")
}

impl BridgeFactory {
    /// Create a factory over a registry.
    pub fn new(registry: BridgeRegistry) -> Self {
        Self {
            registry,
            cache: DashMap::new(),
        }
    }

    /// Cached bridge for the pair, constructing it on a cache miss.
    pub async fn new_bridge(
        &self,
        source: NetworkSelector,
        dest: NetworkSelector,
    ) -> LiquidityManagerResult<Arc<dyn Bridge>> {
        match self.get_bridge(source, dest) {
            Ok(bridge) => return Ok(bridge),
            Err(e) if e.is_bridge_not_found() => {}
            Err(e) => return Err(e),
        }

        let (route, source_deps, dest_deps) = self.registry.resolve(source, dest)?;
        debug!(
            %source,
            %dest,
            source_family = %source_deps.family,
            dest_family = %dest_deps.family,
            "[qc-18] Constructing bridge"
        );
        let bridge = route
            .constructor
            .construct(source_deps, dest_deps)
            .await
            .with_context(|| format!("construct bridge {source}-{dest}"))?;

        let entry = self.cache.entry(cache_key(source, dest)).or_insert(bridge);
        info!(%source, %dest, "[qc-18] Bridge ready");
        Ok(Arc::clone(entry.value()))
    }

    /// Cache-only lookup.
    pub fn get_bridge(
        &self,
        source: NetworkSelector,
        dest: NetworkSelector,
    ) -> LiquidityManagerResult<Arc<dyn Bridge>> {
        self.cache
            .get(&cache_key(source, dest))
            .map(|entry| Arc::clone(entry.value()))
            .ok_or(LiquidityManagerError::BridgeNotFound {
                from: source,
                to: dest,
            })
    }

    /// Every cached bridge, in unspecified order.
    pub fn cached_bridges(&self) -> Vec<Arc<dyn Bridge>> {
        self.cache
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect()
    }

    /// Number of cached bridges.
    pub fn len(&self) -> usize {
        self.cache.len()
    }

    /// Whether no bridge has been built yet.
    pub fn is_empty(&self) -> bool {
        self.cache.is_empty()
    }
}
