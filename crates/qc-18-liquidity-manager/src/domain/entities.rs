//! # Domain Entities
//!
//! Transfers in their different life stages: proposed by the rebalancer,
//! resolved with a bridge payload, pending on a bridge, in flight.

use super::value_objects::{Address, NetworkSelector, TransferStatus};
use crate::error::{LiquidityManagerError, LiquidityManagerResult};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A liquidity movement between two networks.
///
/// `stage` tracks bridge-specific progress: 0 is the initial send, higher
/// values are further along a multi-step finalization (prove, finalize).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transfer {
    /// Sending network.
    pub from: NetworkSelector,
    /// Receiving network.
    pub to: NetworkSelector,
    /// Token amount.
    pub amount: U256,
    /// Liquidity manager sending the tokens.
    pub sender: Address,
    /// Liquidity manager receiving the tokens.
    pub receiver: Address,
    /// Token on the sending network.
    pub local_token_address: Address,
    /// Token on the receiving network.
    pub remote_token_address: Address,
    /// Bridge-specific execution payload.
    pub bridge_data: Vec<u8>,
    /// Native fee paid to the bridge.
    pub native_bridge_fee: U256,
    /// Unix timestamp (seconds).
    pub date: u64,
    /// Bridge pipeline stage.
    pub stage: u32,
}

impl Transfer {
    /// Check the transfer is internally consistent.
    pub fn validate(&self) -> LiquidityManagerResult<()> {
        if self.from == self.to {
            return Err(LiquidityManagerError::InvalidEntry {
                kind: "transfer",
                reason: format!("source and destination are both {}", self.from),
            });
        }
        Ok(())
    }

    /// Fields every node must agree on for a resolved transfer. Fee, date,
    /// stage and payload are excluded: nodes compute those independently.
    pub fn resolved_key(&self) -> ResolvedTransferKey {
        ResolvedTransferKey {
            from: self.from,
            to: self.to,
            amount: self.amount,
            sender: self.sender,
            receiver: self.receiver,
            local_token_address: self.local_token_address,
            remote_token_address: self.remote_token_address,
        }
    }
}

/// Grouping key of resolved transfers across observations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ResolvedTransferKey {
    /// Sending network.
    pub from: NetworkSelector,
    /// Receiving network.
    pub to: NetworkSelector,
    /// Token amount.
    pub amount: U256,
    /// Sending liquidity manager.
    pub sender: Address,
    /// Receiving liquidity manager.
    pub receiver: Address,
    /// Token on the sending network.
    pub local_token_address: Address,
    /// Token on the receiving network.
    pub remote_token_address: Address,
}

/// A transfer currently visible on a bridge.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingTransfer {
    /// The underlying transfer.
    pub transfer: Transfer,
    /// Bridge progress.
    pub status: TransferStatus,
    /// Bridge-assigned identifier.
    pub id: String,
}

impl PendingTransfer {
    /// Create a new pending transfer.
    pub fn new(transfer: Transfer, status: TransferStatus, id: impl Into<String>) -> Self {
        Self {
            transfer,
            status,
            id: id.into(),
        }
    }

    /// SHA-256 over the canonical encoding, used as a consensus key.
    pub fn hash(&self) -> LiquidityManagerResult<[u8; 32]> {
        let encoded = bincode::serialize(self)?;
        Ok(Sha256::digest(&encoded).into())
    }

    /// Check the pending transfer is internally consistent.
    pub fn validate(&self) -> LiquidityManagerResult<()> {
        if self.id.is_empty() {
            return Err(LiquidityManagerError::InvalidEntry {
                kind: "pending transfer",
                reason: "empty id".to_string(),
            });
        }
        self.transfer.validate()
    }
}

/// Rebalancer output before bridge fee and payload resolution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ProposedTransfer {
    /// Sending network.
    pub from: NetworkSelector,
    /// Receiving network.
    pub to: NetworkSelector,
    /// Token amount.
    pub amount: U256,
}

impl ProposedTransfer {
    /// Create a new proposal.
    pub fn new(from: NetworkSelector, to: NetworkSelector, amount: U256) -> Self {
        Self { from, to, amount }
    }
}

/// An amount not yet settled between two networks, as seen by the rebalancer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum UnexecutedTransfer {
    /// Proposed in an earlier round, not yet resolved.
    Proposed(ProposedTransfer),
    /// Resolved with payload and fee, about to be reported.
    Resolved(Transfer),
    /// Accepted into a report, not yet seen on a bridge.
    Inflight(Transfer),
    /// Visible on a bridge.
    Pending(PendingTransfer),
}

impl UnexecutedTransfer {
    /// Sending network.
    pub fn from(&self) -> NetworkSelector {
        match self {
            Self::Proposed(p) => p.from,
            Self::Resolved(t) | Self::Inflight(t) => t.from,
            Self::Pending(p) => p.transfer.from,
        }
    }

    /// Receiving network.
    pub fn to(&self) -> NetworkSelector {
        match self {
            Self::Proposed(p) => p.to,
            Self::Resolved(t) | Self::Inflight(t) => t.to,
            Self::Pending(p) => p.transfer.to,
        }
    }

    /// Amount in transit.
    pub fn amount(&self) -> U256 {
        match self {
            Self::Proposed(p) => p.amount,
            Self::Resolved(t) | Self::Inflight(t) => t.amount,
            Self::Pending(p) => p.transfer.amount,
        }
    }

    /// Bridge status, only known for pending transfers.
    pub fn status(&self) -> Option<TransferStatus> {
        match self {
            Self::Pending(p) => Some(p.status),
            _ => None,
        }
    }
}
