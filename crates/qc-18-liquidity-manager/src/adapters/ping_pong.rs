//! Ping-Pong Rebalancer Adapter
//!
//! Implements the `RebalancingAlgo` port with the simplest strategy that
//! still exercises every phase: while nothing is in transit, the
//! lowest-selector network holding liquidity sends all of it to its
//! lowest-selector neighbour. Liquidity therefore bounces back and forth
//! between networks, one transfer at a time.

use crate::domain::{LiquidityGraph, ProposedTransfer, UnexecutedTransfer};
use crate::error::LiquidityManagerResult;
use crate::ports::RebalancingAlgo;
use tracing::debug;

/// Ping-pong rebalancing strategy.
#[derive(Clone, Copy, Debug, Default)]
pub struct PingPongRebalancer;

impl PingPongRebalancer {
    /// Create the rebalancer.
    pub fn new() -> Self {
        Self
    }
}

impl RebalancingAlgo for PingPongRebalancer {
    fn compute_transfers_to_balance(
        &self,
        graph: &LiquidityGraph,
        unexecuted: &[UnexecutedTransfer],
    ) -> LiquidityManagerResult<Vec<ProposedTransfer>> {
        if !unexecuted.is_empty() {
            debug!(
                unexecuted = unexecuted.len(),
                "[qc-18] Transfers still in transit, not proposing"
            );
            return Ok(Vec::new());
        }

        for network in graph.networks() {
            let liquidity = graph.liquidity(network)?;
            if liquidity.is_zero() {
                continue;
            }
            if let Some(dest) = graph.neighbors(network).into_iter().next() {
                return Ok(vec![ProposedTransfer::new(network, dest, liquidity)]);
            }
        }
        Ok(Vec::new())
    }
}
