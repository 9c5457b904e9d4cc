//! # Algorithms Module
//!
//! BFT aggregation of per-node observations.

pub mod quorum;

pub use quorum::{
    bft, big_int_sorted_middle, config_digests_consensus, ensure_quorum, graph_edges_consensus,
    inflight_transfers_consensus, median_liquidity_per_chain, pending_transfers_consensus, quorum,
    resolved_transfers_quorum, sorted_middle, ResolvedTransferGroup,
};
