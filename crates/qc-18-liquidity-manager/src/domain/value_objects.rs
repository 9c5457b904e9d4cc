//! # Domain Value Objects
//!
//! Immutable value types shared by observations, outcomes and reports.

use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Opaque identifier of a blockchain network.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct NetworkSelector(pub u64);

impl fmt::Display for NetworkSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for NetworkSelector {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

/// On-chain address (20 bytes).
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The all-zero address.
    pub const ZERO: Address = Address([0u8; 20]);

    /// Whether this is the zero address.
    pub fn is_zero(&self) -> bool {
        *self == Self::ZERO
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

/// OCR configuration digest of a network's liquidity manager contract.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct ConfigDigest(pub [u8; 32]);

impl ConfigDigest {
    /// Hex encoding without prefix, used as a consensus key.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Display for ConfigDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", self.to_hex())
    }
}

/// Progress of a transfer on its bridge.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum TransferStatus {
    /// Visible on the bridge, cannot be acted on yet.
    #[default]
    NotReady,
    /// Ready to be received/proven on the destination.
    Ready,
    /// Finalized on the bridge, ready to be claimed.
    Finalized,
}

impl TransferStatus {
    /// Whether the destination network should get an incoming report entry.
    pub fn is_actionable(&self) -> bool {
        matches!(self, Self::Ready | Self::Finalized)
    }
}

/// Liquidity held by one network's liquidity manager.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkLiquidity {
    /// Network holding the liquidity.
    pub network: NetworkSelector,
    /// Token balance.
    pub liquidity: U256,
}

impl NetworkLiquidity {
    /// Create a new liquidity entry.
    pub fn new(network: NetworkSelector, liquidity: U256) -> Self {
        Self { network, liquidity }
    }
}

/// Directed adjacency in the liquidity graph: a bridge from `source` to `dest`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Edge {
    /// Sending network.
    pub source: NetworkSelector,
    /// Receiving network.
    pub dest: NetworkSelector,
}

impl Edge {
    /// Create a new edge.
    pub fn new(source: NetworkSelector, dest: NetworkSelector) -> Self {
        Self { source, dest }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.source, self.dest)
    }
}

/// Config digest tagged with the network it belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConfigDigestWithMeta {
    /// The digest.
    pub digest: ConfigDigest,
    /// Network whose liquidity manager uses this digest.
    pub network_sel: NetworkSelector,
}

impl ConfigDigestWithMeta {
    /// Create a new tagged digest.
    pub fn new(digest: ConfigDigest, network_sel: NetworkSelector) -> Self {
        Self {
            digest,
            network_sel,
        }
    }
}
