//! # Liquidity Graph
//!
//! Networks (nodes) joined by bridge-backed directed edges, with per-network
//! liquidity and contract metadata. Iteration order is by network selector
//! so every node walks the graph the same way.

use super::value_objects::{Address, ConfigDigest, Edge, NetworkLiquidity, NetworkSelector};
use crate::error::{LiquidityManagerError, LiquidityManagerResult};
use primitive_types::U256;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Per-network metadata held by the graph.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NetworkData {
    /// Network this entry describes.
    pub network_selector: NetworkSelector,
    /// Liquidity manager token balance.
    pub liquidity: U256,
    /// Token managed on this network.
    pub token_address: Address,
    /// Liquidity manager contract.
    pub liquidity_manager_address: Address,
    /// Current OCR config digest of the liquidity manager.
    pub config_digest: ConfigDigest,
}

/// Directed liquidity graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LiquidityGraph {
    nodes: BTreeMap<NetworkSelector, NetworkData>,
    adjacency: BTreeMap<NetworkSelector, BTreeSet<NetworkSelector>>,
}

impl LiquidityGraph {
    /// Create an empty graph.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a graph holding only networks and liquidity, e.g. from agreed
    /// observations. Edges touching a network without liquidity are dropped
    /// and returned to the caller.
    pub fn from_edges_and_liquidity(
        edges: &[Edge],
        liquidities: &[NetworkLiquidity],
    ) -> (Self, Vec<Edge>) {
        let mut graph = Self::new();
        for l in liquidities {
            graph.add_network(NetworkData {
                network_selector: l.network,
                liquidity: l.liquidity,
                ..Default::default()
            });
        }

        let mut dropped = Vec::new();
        for edge in edges {
            if graph.add_connection(edge.source, edge.dest).is_err() {
                dropped.push(*edge);
            }
        }
        (graph, dropped)
    }

    /// Insert or replace a network. Returns true if it was new.
    pub fn add_network(&mut self, data: NetworkData) -> bool {
        let network = data.network_selector;
        self.adjacency.entry(network).or_default();
        self.nodes.insert(network, data).is_none()
    }

    /// Add a directed edge between two known networks.
    pub fn add_connection(
        &mut self,
        source: NetworkSelector,
        dest: NetworkSelector,
    ) -> LiquidityManagerResult<()> {
        if !self.nodes.contains_key(&source) {
            return Err(LiquidityManagerError::NetworkNotFound(source));
        }
        if !self.nodes.contains_key(&dest) {
            return Err(LiquidityManagerError::NetworkNotFound(dest));
        }
        self.adjacency.entry(source).or_default().insert(dest);
        Ok(())
    }

    /// Update a network's liquidity. Returns false if the network is unknown.
    pub fn set_liquidity(&mut self, network: NetworkSelector, liquidity: U256) -> bool {
        match self.nodes.get_mut(&network) {
            Some(data) => {
                data.liquidity = liquidity;
                true
            }
            None => false,
        }
    }

    /// All networks in ascending selector order.
    pub fn networks(&self) -> Vec<NetworkSelector> {
        self.nodes.keys().copied().collect()
    }

    /// All edges, sorted by source then dest.
    pub fn edges(&self) -> Vec<Edge> {
        self.adjacency
            .iter()
            .flat_map(|(source, dests)| dests.iter().map(move |dest| Edge::new(*source, *dest)))
            .collect()
    }

    /// Networks reachable in one hop from `network`.
    pub fn neighbors(&self, network: NetworkSelector) -> Vec<NetworkSelector> {
        self.adjacency
            .get(&network)
            .map(|dests| dests.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Whether the graph has any network.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Metadata of one network.
    pub fn data(&self, network: NetworkSelector) -> LiquidityManagerResult<&NetworkData> {
        self.nodes
            .get(&network)
            .ok_or(LiquidityManagerError::NetworkNotFound(network))
    }

    /// Liquidity of one network.
    pub fn liquidity(&self, network: NetworkSelector) -> LiquidityManagerResult<U256> {
        self.data(network).map(|d| d.liquidity)
    }

    /// Token address on one network.
    pub fn token_address(&self, network: NetworkSelector) -> LiquidityManagerResult<Address> {
        self.data(network).map(|d| d.token_address)
    }

    /// Liquidity manager contract on one network.
    pub fn liquidity_manager_address(
        &self,
        network: NetworkSelector,
    ) -> LiquidityManagerResult<Address> {
        self.data(network).map(|d| d.liquidity_manager_address)
    }

    /// Liquidity of every network, ascending by selector.
    pub fn liquidity_per_chain(&self) -> Vec<NetworkLiquidity> {
        self.nodes
            .values()
            .map(|d| NetworkLiquidity::new(d.network_selector, d.liquidity))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn net(n: u64) -> NetworkSelector {
        NetworkSelector(n)
    }

    fn data(n: u64, liquidity: u64) -> NetworkData {
        NetworkData {
            network_selector: net(n),
            liquidity: U256::from(liquidity),
            token_address: Address([n as u8; 20]),
            liquidity_manager_address: Address([0x10 + n as u8; 20]),
            config_digest: ConfigDigest([n as u8; 32]),
        }
    }

    #[test]
    fn test_new_graph_is_empty() {
        assert!(LiquidityGraph::new().is_empty());
    }

    #[test]
    fn test_add_connection_requires_both_networks() {
        let mut g = LiquidityGraph::new();
        g.add_network(data(1, 100));
        assert!(g.add_connection(net(1), net(2)).is_err());
        g.add_network(data(2, 200));
        assert!(g.add_connection(net(1), net(2)).is_ok());
        assert_eq!(g.edges(), vec![Edge::new(net(1), net(2))]);
    }

    #[test]
    fn test_edges_sorted_by_source_then_dest() {
        let mut g = LiquidityGraph::new();
        for n in [3, 1, 2] {
            g.add_network(data(n, 0));
        }
        g.add_connection(net(3), net(1)).unwrap();
        g.add_connection(net(1), net(3)).unwrap();
        g.add_connection(net(1), net(2)).unwrap();

        assert_eq!(
            g.edges(),
            vec![
                Edge::new(net(1), net(2)),
                Edge::new(net(1), net(3)),
                Edge::new(net(3), net(1)),
            ]
        );
        assert_eq!(g.neighbors(net(1)), vec![net(2), net(3)]);
        assert!(g.neighbors(net(2)).is_empty());
    }

    #[test]
    fn test_lookups() {
        let mut g = LiquidityGraph::new();
        g.add_network(data(5, 42));
        assert_eq!(g.liquidity(net(5)).unwrap(), U256::from(42));
        assert_eq!(g.token_address(net(5)).unwrap(), Address([5; 20]));
        assert_eq!(
            g.liquidity_manager_address(net(5)).unwrap(),
            Address([0x15; 20])
        );
        assert!(g.data(net(6)).is_err());
    }

    #[test]
    fn test_set_liquidity() {
        let mut g = LiquidityGraph::new();
        g.add_network(data(1, 1));
        assert!(g.set_liquidity(net(1), U256::from(99)));
        assert!(!g.set_liquidity(net(2), U256::from(99)));
        assert_eq!(g.liquidity(net(1)).unwrap(), U256::from(99));
    }

    #[test]
    fn test_from_edges_and_liquidity_drops_unknown_endpoints() {
        let edges = vec![Edge::new(net(1), net(2)), Edge::new(net(1), net(3))];
        let liq = vec![
            NetworkLiquidity::new(net(1), U256::from(10)),
            NetworkLiquidity::new(net(2), U256::from(20)),
        ];
        let (g, dropped) = LiquidityGraph::from_edges_and_liquidity(&edges, &liq);

        assert_eq!(g.networks(), vec![net(1), net(2)]);
        assert_eq!(g.edges(), vec![Edge::new(net(1), net(2))]);
        assert_eq!(dropped, vec![Edge::new(net(1), net(3))]);
    }
}
