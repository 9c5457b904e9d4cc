//! # Bridge Registry
//!
//! Maps an ordered pair of chain families to the constructor able to build a
//! bridge between them, plus the contracts that constructor needs on each
//! side. Resolved once per pair by the [`BridgeFactory`](super::BridgeFactory).
//!
//! ```text
//! (source family, dest family) ──► BridgeRoute { constructor, requirements }
//!                                        │
//!  ChainDependencies(source) ────────────┤ requirements checked
//!  ChainDependencies(dest)   ────────────┘ before construct()
//! ```

use crate::adapters::{MockBridgeConstructor, MockBridgeLedger};
use crate::domain::{Address, NetworkSelector};
use crate::error::{LiquidityManagerError, LiquidityManagerResult};
use crate::ports::BridgeConstructor;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;

/// Chain family a network belongs to.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChainFamily {
    /// Ethereum L1.
    Ethereum,
    /// Arbitrum rollup.
    Arbitrum,
    /// Optimism (OP stack) rollup.
    Optimism,
    /// Local test networks bridged by the mock bridge.
    Testnet,
}

impl fmt::Display for ChainFamily {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Ethereum => "ethereum",
            Self::Arbitrum => "arbitrum",
            Self::Optimism => "optimism",
            Self::Testnet => "testnet",
        };
        f.write_str(name)
    }
}

/// Contract a bridge may need on a network.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ContractRole {
    /// Liquidity manager contract.
    LiquidityManager,
    /// Managed token.
    Token,
    /// Rollup core contract (L1 side).
    Rollup,
    /// Token gateway router.
    GatewayRouter,
    /// Rollup outbox / message passer.
    Outbox,
    /// Optimism portal (L1 side).
    Portal,
}

/// Everything known about one network that bridge constructors may need.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainDependencies {
    /// Network these dependencies describe.
    pub network: NetworkSelector,
    /// Chain family of the network.
    pub family: ChainFamily,
    /// Contract addresses by role.
    pub contracts: BTreeMap<ContractRole, Address>,
    /// Bridge adapter contract per remote network.
    pub bridge_adapters: BTreeMap<NetworkSelector, Address>,
}

impl ChainDependencies {
    /// Dependencies with no contracts registered.
    pub fn new(network: NetworkSelector, family: ChainFamily) -> Self {
        Self {
            network,
            family,
            contracts: BTreeMap::new(),
            bridge_adapters: BTreeMap::new(),
        }
    }

    /// Builder: register a contract.
    pub fn with_contract(mut self, role: ContractRole, address: Address) -> Self {
        self.contracts.insert(role, address);
        self
    }

    /// Builder: register the bridge adapter used towards `remote`.
    pub fn with_bridge_adapter(mut self, remote: NetworkSelector, address: Address) -> Self {
        self.bridge_adapters.insert(remote, address);
        self
    }

    /// Address of a contract role.
    pub fn contract(&self, role: ContractRole) -> LiquidityManagerResult<Address> {
        self.contracts
            .get(&role)
            .copied()
            .ok_or_else(|| LiquidityManagerError::MissingBridgeDependency {
                network: self.network,
                what: format!("{role:?} contract"),
            })
    }

    /// Bridge adapter used towards `remote`.
    pub fn bridge_adapter(&self, remote: NetworkSelector) -> LiquidityManagerResult<Address> {
        self.bridge_adapters.get(&remote).copied().ok_or_else(|| {
            LiquidityManagerError::MissingBridgeDependency {
                network: self.network,
                what: format!("bridge adapter towards {remote}"),
            }
        })
    }
}

/// Contracts a route needs before its constructor may run.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct BridgeRequirements {
    /// Roles required on the source network.
    pub source_roles: Vec<ContractRole>,
    /// Roles required on the destination network.
    pub dest_roles: Vec<ContractRole>,
    /// Whether the source needs a bridge adapter towards the destination.
    pub source_adapter: bool,
    /// Whether the destination needs a bridge adapter towards the source.
    pub dest_adapter: bool,
}

impl BridgeRequirements {
    /// Check both sides, failing on the first missing dependency.
    pub fn check(
        &self,
        source: &ChainDependencies,
        dest: &ChainDependencies,
    ) -> LiquidityManagerResult<()> {
        for role in &self.source_roles {
            source.contract(*role)?;
        }
        for role in &self.dest_roles {
            dest.contract(*role)?;
        }
        if self.source_adapter {
            source.bridge_adapter(dest.network)?;
        }
        if self.dest_adapter {
            dest.bridge_adapter(source.network)?;
        }
        Ok(())
    }
}

/// Constructor plus requirements for one family pair.
#[derive(Clone)]
pub struct BridgeRoute {
    /// Bridge constructor.
    pub constructor: Arc<dyn BridgeConstructor>,
    /// Dependencies checked before construction.
    pub requirements: BridgeRequirements,
}

impl fmt::Debug for BridgeRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BridgeRoute")
            .field("requirements", &self.requirements)
            .finish_non_exhaustive()
    }
}

/// Chain dependencies per network and routes per chain-family pair.
#[derive(Debug, Default)]
pub struct BridgeRegistry {
    chains: HashMap<NetworkSelector, ChainDependencies>,
    routes: HashMap<(ChainFamily, ChainFamily), BridgeRoute>,
}

impl BridgeRegistry {
    /// Empty registry: no chains, no routes.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the `Testnet -> Testnet` mock route over `ledger`.
    pub fn with_test_route(ledger: Arc<MockBridgeLedger>) -> Self {
        let mut registry = Self::new();
        registry.register_route(
            ChainFamily::Testnet,
            ChainFamily::Testnet,
            BridgeRoute {
                constructor: Arc::new(MockBridgeConstructor::new(ledger)),
                requirements: BridgeRequirements {
                    source_roles: vec![ContractRole::Token],
                    dest_roles: vec![ContractRole::Token],
                    ..Default::default()
                },
            },
        );
        registry
    }

    /// Register or replace a network's dependencies.
    pub fn register_chain(&mut self, deps: ChainDependencies) {
        self.chains.insert(deps.network, deps);
    }

    /// Register or replace the route for a family pair.
    pub fn register_route(&mut self, source: ChainFamily, dest: ChainFamily, route: BridgeRoute) {
        self.routes.insert((source, dest), route);
    }

    /// Dependencies of a network.
    pub fn chain(&self, network: NetworkSelector) -> LiquidityManagerResult<&ChainDependencies> {
        self.chains
            .get(&network)
            .ok_or_else(|| LiquidityManagerError::MissingBridgeDependency {
                network,
                what: "chain dependencies".to_string(),
            })
    }

    /// Pick the route for an ordered network pair and check its requirements.
    pub fn resolve(
        &self,
        source: NetworkSelector,
        dest: NetworkSelector,
    ) -> LiquidityManagerResult<(&BridgeRoute, &ChainDependencies, &ChainDependencies)> {
        if source == dest {
            return Err(LiquidityManagerError::SameNetworkBridge(source));
        }
        let source_deps = self.chain(source)?;
        let dest_deps = self.chain(dest)?;

        let route = self
            .routes
            .get(&(source_deps.family, dest_deps.family))
            .ok_or_else(|| LiquidityManagerError::UnsupportedBridgePair {
                from: source,
                to: dest,
                from_family: source_deps.family.to_string(),
                to_family: dest_deps.family.to_string(),
            })?;
        route.requirements.check(source_deps, dest_deps)?;
        Ok((route, source_deps, dest_deps))
    }
}
