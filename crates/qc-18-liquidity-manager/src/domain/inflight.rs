//! # In-Flight Transfer Tracker
//!
//! Remembers transfers this node put into an accepted report until a bridge
//! shows them past the stage they were committed at.
//!
//! Identity is `(from, to, amount)`. Two genuine transfers with the same
//! endpoints and amount alias each other; the later `add` overwrites the
//! earlier entry. Stage is deliberately not part of the key.

use super::entities::{PendingTransfer, Transfer};
use super::value_objects::NetworkSelector;
use parking_lot::RwLock;
use primitive_types::U256;
use std::collections::BTreeMap;

/// Identity key of an in-flight transfer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct InflightKey {
    from: NetworkSelector,
    to: NetworkSelector,
    amount: U256,
}

impl From<&Transfer> for InflightKey {
    fn from(t: &Transfer) -> Self {
        Self {
            from: t.from,
            to: t.to,
            amount: t.amount,
        }
    }
}

/// Concurrency-safe set of in-flight transfers.
#[derive(Debug, Default)]
pub struct InflightContainer {
    transfers: RwLock<BTreeMap<InflightKey, Transfer>>,
}

impl InflightContainer {
    /// Create an empty container.
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or overwrite by key.
    pub fn add(&self, transfer: Transfer) {
        self.transfers
            .write()
            .insert(InflightKey::from(&transfer), transfer);
    }

    /// Drop every in-flight entry whose matching pending transfer has moved
    /// to a strictly later stage. Returns the number removed.
    ///
    /// Equal stage keeps the entry: multi-stage bridges record the next
    /// stage's in-flight entry while the previous stage is still visible as
    /// pending.
    pub fn expire(&self, pending: &[PendingTransfer]) -> usize {
        let mut transfers = self.transfers.write();
        let mut expired = 0;
        for p in pending {
            let key = InflightKey::from(&p.transfer);
            let advanced = transfers
                .get(&key)
                .is_some_and(|inflight| p.transfer.stage > inflight.stage);
            if advanced {
                transfers.remove(&key);
                expired += 1;
            }
        }
        expired
    }

    /// Snapshot of all entries, ascending by source network.
    pub fn get_all(&self) -> Vec<Transfer> {
        self.transfers.read().values().cloned().collect()
    }

    /// Whether a transfer with the same key is in flight.
    pub fn is_inflight(&self, transfer: &Transfer) -> bool {
        self.transfers
            .read()
            .contains_key(&InflightKey::from(transfer))
    }

    /// Number of tracked transfers.
    pub fn len(&self) -> usize {
        self.transfers.read().len()
    }

    /// Whether nothing is tracked.
    pub fn is_empty(&self) -> bool {
        self.transfers.read().is_empty()
    }
}
