//! # Round Messages
//!
//! Observation, Outcome and Report are produced fresh every round and never
//! mutated after encoding. Encoding is bincode over a fixed field order, so
//! equal values always produce equal bytes; nodes rely on that to compare
//! outcomes.

use super::entities::{PendingTransfer, ProposedTransfer, Transfer};
use super::value_objects::{
    Address, ConfigDigest, ConfigDigestWithMeta, Edge, NetworkLiquidity, NetworkSelector,
};
use crate::error::{LiquidityManagerError, LiquidityManagerResult};
use primitive_types::U256;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

fn encode<T: Serialize>(value: &T) -> LiquidityManagerResult<Vec<u8>> {
    Ok(bincode::serialize(value)?)
}

fn decode<T: DeserializeOwned>(what: &str, bytes: &[u8]) -> LiquidityManagerResult<T> {
    if bytes.is_empty() {
        return Err(LiquidityManagerError::Codec(format!("empty {what}")));
    }
    bincode::deserialize(bytes)
        .map_err(|e| LiquidityManagerError::Codec(format!("decode {what}: {e}")))
}

/// One node's view of the world for one round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Observation {
    /// Liquidity per network.
    pub liquidity_per_chain: Vec<NetworkLiquidity>,
    /// Previous round's proposals, resolved with payload and fee.
    pub resolved_transfers: Vec<Transfer>,
    /// Transfers visible on bridges.
    pub pending_transfers: Vec<PendingTransfer>,
    /// Transfers this node accepted into reports and has not seen settle.
    pub inflight_transfers: Vec<Transfer>,
    /// Liquidity graph adjacency.
    pub edges: Vec<Edge>,
    /// Config digest per network.
    pub config_digests: Vec<ConfigDigestWithMeta>,
}

impl Observation {
    /// Create a new observation.
    pub fn new(
        liquidity_per_chain: Vec<NetworkLiquidity>,
        resolved_transfers: Vec<Transfer>,
        pending_transfers: Vec<PendingTransfer>,
        inflight_transfers: Vec<Transfer>,
        edges: Vec<Edge>,
        config_digests: Vec<ConfigDigestWithMeta>,
    ) -> Self {
        Self {
            liquidity_per_chain,
            resolved_transfers,
            pending_transfers,
            inflight_transfers,
            edges,
            config_digests,
        }
    }

    /// Serialize for the wire.
    pub fn encode(&self) -> LiquidityManagerResult<Vec<u8>> {
        encode(self)
    }

    /// Deserialize from the wire.
    pub fn decode(bytes: &[u8]) -> LiquidityManagerResult<Self> {
        decode("observation", bytes)
    }
}

/// The agreed cross-node result of one round.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Outcome {
    /// New proposals from the rebalancer.
    pub proposed_transfers: Vec<ProposedTransfer>,
    /// Quorum of resolved proposals, ready to report.
    pub resolved_transfers: Vec<Transfer>,
    /// Agreed pending transfers.
    pub pending_transfers: Vec<PendingTransfer>,
    /// Agreed config digests.
    pub config_digests: Vec<ConfigDigestWithMeta>,
}

impl Outcome {
    /// Create a new outcome.
    pub fn new(
        proposed_transfers: Vec<ProposedTransfer>,
        resolved_transfers: Vec<Transfer>,
        pending_transfers: Vec<PendingTransfer>,
        config_digests: Vec<ConfigDigestWithMeta>,
    ) -> Self {
        Self {
            proposed_transfers,
            resolved_transfers,
            pending_transfers,
            config_digests,
        }
    }

    /// Serialize for the wire.
    pub fn encode(&self) -> LiquidityManagerResult<Vec<u8>> {
        encode(self)
    }

    /// Deserialize from the wire.
    pub fn decode(bytes: &[u8]) -> LiquidityManagerResult<Self> {
        decode("outcome", bytes)
    }

    /// Config digest agreed for a network.
    pub fn config_digest(&self, network: NetworkSelector) -> Option<ConfigDigest> {
        self.config_digests
            .iter()
            .find(|d| d.network_sel == network)
            .map(|d| d.digest)
    }
}

/// The unit submitted on-chain, one per affected network.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    /// Outgoing and incoming transfers of `network_id`.
    pub transfers: Vec<Transfer>,
    /// Target liquidity manager contract.
    pub liquidity_manager_address: Address,
    /// Network the report is submitted to.
    pub network_id: NetworkSelector,
    /// Config digest of the target contract.
    pub config_digest: ConfigDigest,
}

impl Report {
    /// Create a new report.
    pub fn new(
        transfers: Vec<Transfer>,
        liquidity_manager_address: Address,
        network_id: NetworkSelector,
        config_digest: ConfigDigest,
    ) -> Self {
        Self {
            transfers,
            liquidity_manager_address,
            network_id,
            config_digest,
        }
    }

    /// Whether the report moves nothing.
    pub fn is_empty(&self) -> bool {
        self.transfers.is_empty()
    }

    /// Transfers leaving the report's network.
    pub fn outgoing(&self) -> impl Iterator<Item = &Transfer> {
        self.transfers.iter().filter(move |t| t.from == self.network_id)
    }

    /// Serialize the metadata form carried next to the on-chain bytes.
    pub fn encode(&self) -> LiquidityManagerResult<Vec<u8>> {
        encode(self)
    }

    /// Deserialize the metadata form.
    pub fn decode(bytes: &[u8]) -> LiquidityManagerResult<Self> {
        decode("report", bytes)
    }
}

/// On-chain report bytes plus the metadata they were built from.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportWithInfo {
    /// Codec-encoded on-chain report.
    pub report: Vec<u8>,
    /// Report metadata.
    pub info: Report,
}

/// Outgoing leg of an on-chain report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SendLiquidityParams {
    /// Amount to send.
    pub amount: U256,
    /// Native fee attached to the bridge call.
    pub native_bridge_fee: U256,
    /// Receiving network.
    pub remote_network: NetworkSelector,
    /// Bridge-specific payload.
    pub bridge_data: Vec<u8>,
}

/// Incoming leg of an on-chain report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiveLiquidityParams {
    /// Amount to receive.
    pub amount: U256,
    /// Sending network.
    pub remote_network: NetworkSelector,
    /// Bridge-specific payload (proof or finalization data).
    pub bridge_data: Vec<u8>,
}

/// What a liquidity manager contract executes for one report.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LiquidityInstructions {
    /// Transfers leaving the report's network.
    pub send: Vec<SendLiquidityParams>,
    /// Transfers arriving on the report's network.
    pub receive: Vec<ReceiveLiquidityParams>,
}

impl LiquidityInstructions {
    /// Split a report's transfers into send and receive legs.
    pub fn from_report(report: &Report) -> Self {
        let mut instructions = Self::default();
        for t in &report.transfers {
            if t.from == report.network_id {
                instructions.send.push(SendLiquidityParams {
                    amount: t.amount,
                    native_bridge_fee: t.native_bridge_fee,
                    remote_network: t.to,
                    bridge_data: t.bridge_data.clone(),
                });
            } else if t.to == report.network_id {
                instructions.receive.push(ReceiveLiquidityParams {
                    amount: t.amount,
                    remote_network: t.from,
                    bridge_data: t.bridge_data.clone(),
                });
            }
        }
        instructions
    }
}
