//! In-Memory Liquidity Manager Adapter
//!
//! Implements the `LiquidityManager` and `LiquidityManagerFactory` ports
//! with balances and sequence numbers held in memory. Tests and devnets
//! use it to play the role of the on-chain contracts.

use crate::domain::{Address, NetworkSelector};
use crate::error::{LiquidityManagerError, LiquidityManagerResult};
use crate::ports::{LiquidityManager, LiquidityManagerFactory};
use async_trait::async_trait;
use dashmap::DashMap;
use parking_lot::RwLock;
use primitive_types::U256;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;

/// One network's liquidity manager contract.
#[derive(Debug)]
pub struct InMemoryLiquidityManager {
    network: NetworkSelector,
    address: Address,
    balance: RwLock<U256>,
    sequence_number: AtomicU64,
    closed: AtomicBool,
}

impl InMemoryLiquidityManager {
    /// Create a contract holding `balance`, with no report executed yet.
    pub fn new(network: NetworkSelector, address: Address, balance: U256) -> Self {
        Self {
            network,
            address,
            balance: RwLock::new(balance),
            sequence_number: AtomicU64::new(0),
            closed: AtomicBool::new(false),
        }
    }

    /// Network of the contract.
    pub fn network(&self) -> NetworkSelector {
        self.network
    }

    /// Contract address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Overwrite the token balance.
    pub fn set_balance(&self, balance: U256) {
        *self.balance.write() = balance;
    }

    /// Record a report as executed on chain.
    pub fn set_sequence_number(&self, seq_nr: u64) {
        self.sequence_number.store(seq_nr, Ordering::SeqCst);
    }

    /// Whether `close` has been called.
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl LiquidityManager for InMemoryLiquidityManager {
    async fn get_latest_sequence_number(&self) -> LiquidityManagerResult<u64> {
        Ok(self.sequence_number.load(Ordering::SeqCst))
    }

    async fn get_balance(&self) -> LiquidityManagerResult<U256> {
        Ok(*self.balance.read())
    }

    async fn close(&self) -> LiquidityManagerResult<()> {
        self.closed.store(true, Ordering::SeqCst);
        Ok(())
    }
}

/// Caching factory of in-memory contracts.
#[derive(Debug, Default)]
pub struct InMemoryLiquidityManagerFactory {
    managers: DashMap<(NetworkSelector, Address), Arc<InMemoryLiquidityManager>>,
}

impl InMemoryLiquidityManagerFactory {
    /// Empty factory.
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a contract with an initial balance, replacing any previous one.
    pub fn register(
        &self,
        network: NetworkSelector,
        address: Address,
        balance: U256,
    ) -> Arc<InMemoryLiquidityManager> {
        let lm = Arc::new(InMemoryLiquidityManager::new(network, address, balance));
        self.managers.insert((network, address), Arc::clone(&lm));
        lm
    }

    /// Concrete contract, for tests that need to move balances.
    pub fn get(
        &self,
        network: NetworkSelector,
        address: Address,
    ) -> Option<Arc<InMemoryLiquidityManager>> {
        self.managers
            .get(&(network, address))
            .map(|entry| Arc::clone(entry.value()))
    }
}

impl LiquidityManagerFactory for InMemoryLiquidityManagerFactory {
    fn new_liquidity_manager(
        &self,
        network: NetworkSelector,
        address: Address,
    ) -> LiquidityManagerResult<Arc<dyn LiquidityManager>> {
        let entry = self
            .managers
            .entry((network, address))
            .or_insert_with(|| {
                Arc::new(InMemoryLiquidityManager::new(
                    network,
                    address,
                    U256::zero(),
                ))
            });
        Ok(Arc::clone(entry.value()) as Arc<dyn LiquidityManager>)
    }

    fn get_liquidity_manager(
        &self,
        network: NetworkSelector,
        address: Address,
    ) -> LiquidityManagerResult<Arc<dyn LiquidityManager>> {
        self.get(network, address)
            .map(|lm| lm as Arc<dyn LiquidityManager>)
            .ok_or_else(|| {
                LiquidityManagerError::LiquidityManagerClient(format!(
                    "no liquidity manager {address} on network {network}"
                ))
            })
    }
}
