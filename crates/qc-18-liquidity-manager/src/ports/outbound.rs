//! Driven ports (Outbound dependencies)
//!
//! Chain-specific state lives behind these traits, never inside the plugin.

use crate::bridge::ChainDependencies;
use crate::domain::{
    Address, LiquidityGraph, LiquidityInstructions, NetworkSelector, PendingTransfer,
    ProposedTransfer, Report, Transfer, UnexecutedTransfer,
};
use crate::error::LiquidityManagerResult;
use async_trait::async_trait;
use primitive_types::U256;
use std::sync::Arc;

/// Liquidity graph discovery.
#[async_trait]
pub trait Discoverer: Send + Sync {
    /// Discover networks, edges, contract metadata and balances from scratch.
    async fn discover(&self) -> LiquidityManagerResult<LiquidityGraph>;

    /// Refresh balances of an already discovered graph in place.
    async fn discover_balances(&self, graph: &mut LiquidityGraph) -> LiquidityManagerResult<()>;
}

/// Pluggable rebalancing strategy.
pub trait RebalancingAlgo: Send + Sync {
    /// Propose transfers that move the graph towards balance, given
    /// everything still unsettled.
    fn compute_transfers_to_balance(
        &self,
        graph: &LiquidityGraph,
        unexecuted: &[UnexecutedTransfer],
    ) -> LiquidityManagerResult<Vec<ProposedTransfer>>;
}

/// On-chain liquidity manager contract client, one per network.
#[async_trait]
pub trait LiquidityManager: Send + Sync {
    /// Sequence number of the last report executed on chain.
    async fn get_latest_sequence_number(&self) -> LiquidityManagerResult<u64>;

    /// Token balance held by the contract.
    async fn get_balance(&self) -> LiquidityManagerResult<U256>;

    /// Release the client.
    async fn close(&self) -> LiquidityManagerResult<()>;
}

/// Creates and caches liquidity manager clients.
pub trait LiquidityManagerFactory: Send + Sync {
    /// Client for a network's contract, created on first use.
    fn new_liquidity_manager(
        &self,
        network: NetworkSelector,
        address: Address,
    ) -> LiquidityManagerResult<Arc<dyn LiquidityManager>>;

    /// Previously created client.
    fn get_liquidity_manager(
        &self,
        network: NetworkSelector,
        address: Address,
    ) -> LiquidityManagerResult<Arc<dyn LiquidityManager>>;
}

/// On-chain report encoding.
pub trait ReportCodec: Send + Sync {
    /// Encode a report for the contract.
    fn encode(&self, report: &Report) -> LiquidityManagerResult<Vec<u8>>;

    /// Decode report bytes destined for `address` on `network`.
    fn decode(
        &self,
        network: NetworkSelector,
        address: Address,
        bytes: &[u8],
    ) -> LiquidityManagerResult<(Report, LiquidityInstructions)>;
}

/// Chain-pair specific bridge.
#[async_trait]
pub trait Bridge: Send + Sync {
    /// Transfers visible on the bridge for a token pair.
    async fn get_transfers(
        &self,
        local_token: Address,
        remote_token: Address,
    ) -> LiquidityManagerResult<Vec<PendingTransfer>>;

    /// Execution payload and native fee for a proposed transfer.
    async fn get_bridge_payload_and_fee(
        &self,
        transfer: &Transfer,
    ) -> LiquidityManagerResult<(Vec<u8>, U256)>;

    /// Combine payloads computed independently by several nodes into one.
    fn quorumized_bridge_payload(
        &self,
        payloads: &[Vec<u8>],
        f: usize,
    ) -> LiquidityManagerResult<Vec<u8>>;

    /// Release the bridge.
    async fn close(&self) -> LiquidityManagerResult<()>;
}

/// Builds a bridge for one ordered chain pair.
#[async_trait]
pub trait BridgeConstructor: Send + Sync {
    /// Construct the bridge. Must be free of side effects so that racing
    /// constructions of the same pair are harmless.
    async fn construct(
        &self,
        source: &ChainDependencies,
        dest: &ChainDependencies,
    ) -> LiquidityManagerResult<Arc<dyn Bridge>>;
}

/// Time source for transfer dates
pub trait TimeSource: Send + Sync {
    /// Get current unix timestamp in seconds
    fn now(&self) -> u64;
}

/// Default time source using system time
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs()
    }
}

/// Fixed time source, for tests and replay.
pub struct FixedTimeSource(pub u64);

impl TimeSource for FixedTimeSource {
    fn now(&self) -> u64 {
        self.0
    }
}
