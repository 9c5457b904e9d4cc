//! Mock Bridge Adapter
//!
//! Implements the `Bridge` port for same-family test networks. Every bridge
//! built by one constructor shares a [`MockBridgeLedger`], which stands in
//! for the on-chain bridge contracts: tests submit transfers to it and move
//! them through the bridge stages by hand.

use crate::bridge::ChainDependencies;
use crate::domain::{Address, NetworkSelector, PendingTransfer, Transfer, TransferStatus};
use crate::error::{LiquidityManagerError, LiquidityManagerResult};
use crate::ports::{Bridge, BridgeConstructor};
use async_trait::async_trait;
use parking_lot::RwLock;
use primitive_types::U256;
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use tracing::debug;

/// In-memory record of transfers sent over mock bridges.
#[derive(Debug, Default)]
pub struct MockBridgeLedger {
    transfers: RwLock<Vec<PendingTransfer>>,
    fee: RwLock<U256>,
    next_id: AtomicU64,
}

impl MockBridgeLedger {
    /// Empty ledger with a zero fee.
    pub fn new() -> Self {
        Self::default()
    }

    /// Native fee quoted for every transfer.
    pub fn set_fee(&self, fee: U256) {
        *self.fee.write() = fee;
    }

    /// Currently quoted fee.
    pub fn fee(&self) -> U256 {
        *self.fee.read()
    }

    /// Record a sent transfer as `NotReady` and return its bridge id.
    pub fn submit(&self, transfer: Transfer) -> String {
        let id = format!("mock-{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.transfers
            .write()
            .push(PendingTransfer::new(transfer, TransferStatus::NotReady, id.clone()));
        id
    }

    /// Change the status of a transfer. Returns false for unknown ids.
    pub fn set_status(&self, id: &str, status: TransferStatus) -> bool {
        self.update(id, |p| p.status = status)
    }

    /// Move a transfer to its next bridge stage.
    pub fn advance_stage(&self, id: &str) -> bool {
        self.update(id, |p| p.transfer.stage += 1)
    }

    /// Drop a settled transfer from the bridge.
    pub fn settle(&self, id: &str) -> Option<PendingTransfer> {
        let mut transfers = self.transfers.write();
        let index = transfers.iter().position(|p| p.id == id)?;
        Some(transfers.remove(index))
    }

    /// Every transfer still on the bridge.
    pub fn all(&self) -> Vec<PendingTransfer> {
        self.transfers.read().clone()
    }

    fn update(&self, id: &str, f: impl FnOnce(&mut PendingTransfer)) -> bool {
        match self.transfers.write().iter_mut().find(|p| p.id == id) {
            Some(p) => {
                f(p);
                true
            }
            None => false,
        }
    }
}

/// Bridge between two test networks.
pub struct MockBridge {
    source: NetworkSelector,
    dest: NetworkSelector,
    ledger: Arc<MockBridgeLedger>,
    closed: AtomicBool,
}

impl MockBridge {
    /// Create a bridge from `source` to `dest` over a shared ledger.
    pub fn new(
        source: NetworkSelector,
        dest: NetworkSelector,
        ledger: Arc<MockBridgeLedger>,
    ) -> Self {
        Self {
            source,
            dest,
            ledger,
            closed: AtomicBool::new(false),
        }
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    fn ensure_open(&self) -> LiquidityManagerResult<()> {
        if self.is_closed() {
            return Err(LiquidityManagerError::Bridge(format!(
                "bridge {}-{} is closed",
                self.source, self.dest
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl Bridge for MockBridge {
    async fn get_transfers(
        &self,
        local_token: Address,
        remote_token: Address,
    ) -> LiquidityManagerResult<Vec<PendingTransfer>> {
        self.ensure_open()?;
        let transfers: Vec<PendingTransfer> = self
            .ledger
            .all()
            .into_iter()
            .filter(|p| {
                p.transfer.from == self.source
                    && p.transfer.to == self.dest
                    && p.transfer.local_token_address == local_token
                    && p.transfer.remote_token_address == remote_token
            })
            .collect();
        debug!(
            source = %self.source,
            dest = %self.dest,
            count = transfers.len(),
            "[qc-18] Mock bridge transfers"
        );
        Ok(transfers)
    }

    async fn get_bridge_payload_and_fee(
        &self,
        transfer: &Transfer,
    ) -> LiquidityManagerResult<(Vec<u8>, U256)> {
        self.ensure_open()?;
        if transfer.from != self.source || transfer.to != self.dest {
            return Err(LiquidityManagerError::Bridge(format!(
                "transfer {}->{} does not use bridge {}-{}",
                transfer.from, transfer.to, self.source, self.dest
            )));
        }
        let payload = bincode::serialize(&(transfer.from, transfer.to, transfer.amount))?;
        Ok((payload, self.ledger.fee()))
    }

    fn quorumized_bridge_payload(
        &self,
        payloads: &[Vec<u8>],
        f: usize,
    ) -> LiquidityManagerResult<Vec<u8>> {
        let mut counts: BTreeMap<&[u8], usize> = BTreeMap::new();
        for payload in payloads {
            *counts.entry(payload.as_slice()).or_default() += 1;
        }

        let mut best: Option<(&[u8], usize)> = None;
        for (payload, count) in counts {
            if count < f + 1 {
                continue;
            }
            if best.map_or(true, |(_, best_count)| count > best_count) {
                best = Some((payload, count));
            }
        }
        best.map(|(payload, _)| payload.to_vec()).ok_or_else(|| {
            LiquidityManagerError::Bridge(format!(
                "no payload reached {} of {} votes",
                f + 1,
                payloads.len()
            ))
        })
    }

    async fn close(&self) -> LiquidityManagerResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Constructor for the `Testnet -> Testnet` route.
#[derive(Debug)]
pub struct MockBridgeConstructor {
    ledger: Arc<MockBridgeLedger>,
    /// Number of bridges built so far.
    pub constructed: AtomicUsize,
}

impl MockBridgeConstructor {
    /// Create a constructor sharing `ledger` across its bridges.
    pub fn new(ledger: Arc<MockBridgeLedger>) -> Self {
        Self {
            ledger,
            constructed: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl BridgeConstructor for MockBridgeConstructor {
    async fn construct(
        &self,
        source: &ChainDependencies,
        dest: &ChainDependencies,
    ) -> LiquidityManagerResult<Arc<dyn Bridge>> {
        self.constructed.fetch_add(1, Ordering::SeqCst);
        Ok(Arc::new(MockBridge::new(
            source.network,
            dest.network,
            Arc::clone(&self.ledger),
        )))
    }
}
