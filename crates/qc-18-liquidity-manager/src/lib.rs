//! # QC-18 Liquidity Manager
//!
//! Decision core of a cross-chain liquidity rebalancing oracle.
//!
//! **Subsystem ID:** 18  
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)  
//!
//! ## Purpose
//!
//! A set of independent nodes observe token balances and bridge transfers on
//! several networks, agree on one global view tolerating `f` faulty nodes,
//! and decide which transfers to execute next so every network keeps enough
//! liquidity:
//! - Reporting plugin run once per round by the consensus transport
//! - BFT aggregation (2f+1 observations, f+1 matching votes)
//! - In-flight tracking so a transfer is never proposed twice
//! - Chain-family bridge routing with a per-pair bridge cache
//!
//! ## Round
//!
//! ```text
//! query ─► observation ─► validate_observation ─► outcome ─► reports
//!              ▲                                                │
//!              │ previous outcome                               ▼
//!              └──────────── should_transmit ◄── should_accept_attested
//! ```
//!
//! | Threshold | Value | Used by |
//! |-----------|-------|---------|
//! | quorum | 2f+1 | every aggregator, outcome |
//! | bft | f+1 | agreed values, resolved transfers, bridge payloads |
//!
//! ## Module Structure
//!
//! ```text
//! qc-18-liquidity-manager/
//! ├── domain/          # Transfers, messages, graph, in-flight tracker
//! ├── algorithms/      # Quorum aggregation, sorted middle
//! ├── ports/           # ReportingPlugin, Bridge, Discoverer, ...
//! ├── bridge/          # Chain-family registry, bridge factory
//! ├── adapters/        # Mock bridge, in-memory clients, ping-pong
//! └── service/         # Plugin state machine
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod adapters;
pub mod algorithms;
pub mod bridge;
pub mod config;
pub mod domain;
pub mod error;
pub mod factory;
pub mod metrics;
pub mod ports;
pub mod service;

// Re-exports
pub use adapters::{
    BincodeReportCodec, InMemoryLiquidityManager, InMemoryLiquidityManagerFactory, MockBridge,
    MockBridgeConstructor, MockBridgeLedger, PingPongRebalancer, StaticDiscoverer,
};
pub use algorithms::{bft, big_int_sorted_middle, quorum};
pub use bridge::{
    BridgeFactory, BridgeRegistry, BridgeRequirements, BridgeRoute, ChainDependencies,
    ChainFamily, ContractRole,
};
pub use config::{PluginConfig, PluginLimits};
pub use domain::{
    Address, ConfigDigest, ConfigDigestWithMeta, Edge, InflightContainer, LiquidityGraph,
    LiquidityInstructions, NetworkData, NetworkLiquidity, NetworkSelector, Observation, Outcome,
    PendingTransfer, ProposedTransfer, Report, ReportWithInfo, Transfer, TransferStatus,
    UnexecutedTransfer,
};
pub use error::{LiquidityManagerError, LiquidityManagerResult};
pub use factory::{PluginFactory, PLUGIN_NAME};
pub use ports::{
    AttributedObservation, Bridge, BridgeConstructor, Discoverer, FixedTimeSource,
    LiquidityManager, LiquidityManagerFactory, ObservationQuorum, OutcomeContext,
    RebalancingAlgo, ReportCodec, ReportingPlugin, ReportingPluginInfo, SystemTimeSource,
    TimeSource,
};
pub use service::{LiquidityManagerPlugin, PluginDependencies};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

#[cfg(test)]
mod tests {
    #[test]
    #[allow(clippy::const_is_empty)]
    fn test_version() {
        assert!(!super::VERSION.is_empty());
    }
}
