//! Static Discoverer Adapter
//!
//! Implements the `Discoverer` port over a fixed topology. Balances are
//! read live from each network's liquidity manager.

use crate::domain::LiquidityGraph;
use crate::error::{LiquidityManagerError, LiquidityManagerResult, ResultExt};
use crate::ports::{Discoverer, LiquidityManagerFactory};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::debug;

/// Discoverer with a topology known up front.
pub struct StaticDiscoverer {
    topology: LiquidityGraph,
    lm_factory: Arc<dyn LiquidityManagerFactory>,
}

impl StaticDiscoverer {
    /// Create a discoverer. Liquidity values in `topology` are ignored and
    /// replaced by on-chain balances.
    pub fn new(topology: LiquidityGraph, lm_factory: Arc<dyn LiquidityManagerFactory>) -> Self {
        Self {
            topology,
            lm_factory,
        }
    }
}

#[async_trait]
impl Discoverer for StaticDiscoverer {
    async fn discover(&self) -> LiquidityManagerResult<LiquidityGraph> {
        if self.topology.is_empty() {
            return Err(LiquidityManagerError::Discoverer(
                "no networks configured".to_string(),
            ));
        }
        let mut graph = self.topology.clone();
        self.discover_balances(&mut graph).await?;
        Ok(graph)
    }

    async fn discover_balances(&self, graph: &mut LiquidityGraph) -> LiquidityManagerResult<()> {
        for network in graph.networks() {
            let address = graph.liquidity_manager_address(network)?;
            let lm = self
                .lm_factory
                .new_liquidity_manager(network, address)
                .with_context(|| format!("liquidity manager of network {network}"))?;
            let balance = lm
                .get_balance()
                .await
                .with_context(|| format!("balance of network {network}"))?;
            debug!(%network, %balance, "[qc-18] Discovered balance");
            graph.set_liquidity(network, balance);
        }
        Ok(())
    }
}
