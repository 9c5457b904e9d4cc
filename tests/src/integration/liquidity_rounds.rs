//! # Liquidity Rounds
//!
//! Five nodes (f = 2) rebalance two networks end to end:
//!
//! 1. **Propose**: balances agree, ping-pong proposes A -> B.
//! 2. **Resolve**: every node resolves the proposal with a bridge payload,
//!    the outcome carries it, a report for A is accepted and transmitted.
//! 3. **Execute**: the transfer appears on the bridge; nothing new is
//!    proposed while it is in flight.
//! 4. **Finalize**: the bridge advances a stage, in-flight entries expire
//!    and a report for B carries the incoming transfer.

#[cfg(test)]
mod tests {
    use primitive_types::U256;
    use std::sync::Arc;

    use qc_18_liquidity_manager::{
        Address, AttributedObservation, BincodeReportCodec, BridgeFactory, BridgeRegistry,
        ChainDependencies, ChainFamily, ConfigDigest, ContractRole, FixedTimeSource,
        InMemoryLiquidityManagerFactory, LiquidityGraph, LiquidityManagerPlugin, MockBridgeLedger,
        NetworkData, NetworkLiquidity, NetworkSelector, Observation, Outcome, OutcomeContext,
        PingPongRebalancer, PluginConfig, PluginFactory, ProposedTransfer, ReportWithInfo,
        ReportingPlugin, StaticDiscoverer, TransferStatus,
    };

    // =============================================================================
    // TEST FIXTURES
    // =============================================================================

    const F: usize = 2;
    const NODES: usize = 5;
    const A: NetworkSelector = NetworkSelector(1);
    const B: NetworkSelector = NetworkSelector(2);
    const NOW: u64 = 1_700_000_000;

    fn lm_address(n: NetworkSelector) -> Address {
        Address([0x10 + n.0 as u8; 20])
    }

    fn token(n: NetworkSelector) -> Address {
        Address([0xA0 + n.0 as u8; 20])
    }

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    }

    /// On-chain state every node reads from.
    struct World {
        lms: Arc<InMemoryLiquidityManagerFactory>,
        ledger: Arc<MockBridgeLedger>,
        topology: LiquidityGraph,
    }

    impl World {
        fn new(balances: &[(NetworkSelector, u64)]) -> Self {
            let lms = Arc::new(InMemoryLiquidityManagerFactory::new());
            let mut topology = LiquidityGraph::new();
            for &(network, balance) in balances {
                lms.register(network, lm_address(network), U256::from(balance));
                topology.add_network(NetworkData {
                    network_selector: network,
                    liquidity: U256::zero(),
                    token_address: token(network),
                    liquidity_manager_address: lm_address(network),
                    config_digest: ConfigDigest([network.0 as u8; 32]),
                });
            }
            for &(source, _) in balances {
                for &(dest, _) in balances {
                    if source != dest {
                        topology
                            .add_connection(source, dest)
                            .expect("both networks registered");
                    }
                }
            }
            Self {
                lms,
                ledger: Arc::new(MockBridgeLedger::new()),
                topology,
            }
        }

        /// Each node gets its own bridge cache and discoverer over the
        /// shared contracts.
        fn node(&self) -> LiquidityManagerPlugin {
            let mut registry = BridgeRegistry::with_test_route(self.ledger.clone());
            for network in self.topology.networks() {
                registry.register_chain(
                    ChainDependencies::new(network, ChainFamily::Testnet)
                        .with_contract(ContractRole::Token, token(network))
                        .with_contract(ContractRole::LiquidityManager, lm_address(network)),
                );
            }

            let factory = PluginFactory::new(
                Arc::new(StaticDiscoverer::new(self.topology.clone(), self.lms.clone())),
                Arc::new(PingPongRebalancer::new()),
                self.lms.clone(),
                Arc::new(BincodeReportCodec::new()),
                Arc::new(BridgeFactory::new(registry)),
            );
            let config = PluginConfig {
                f: F,
                root_network: A,
                root_address: lm_address(A),
                ..Default::default()
            };
            let (plugin, _info) = factory
                .new_reporting_plugin(config)
                .expect("valid config");
            plugin.with_time_source(Box::new(FixedTimeSource(NOW)))
        }

        fn nodes(&self) -> Vec<LiquidityManagerPlugin> {
            (0..NODES).map(|_| self.node()).collect()
        }
    }

    struct RoundResult {
        outcome: Vec<u8>,
        reports: Vec<ReportWithInfo>,
    }

    /// One full round as the transport runs it: every node observes, the
    /// leader validates, every node computes the same outcome and reports.
    async fn run_round(
        nodes: &[LiquidityManagerPlugin],
        seq_nr: u64,
        previous_outcome: &[u8],
    ) -> RoundResult {
        let ctx = OutcomeContext::new(seq_nr, previous_outcome.to_vec());

        let mut observations = Vec::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            let query = node.query(&ctx).await.expect("query");
            let observation = node.observation(&ctx, &query).await.expect("observation");
            observations.push(AttributedObservation {
                observation,
                observer: i as u8,
            });
        }
        for ao in &observations {
            nodes[0]
                .validate_observation(&ctx, &[], ao)
                .await
                .expect("honest observation is valid");
        }

        let mut outcomes = Vec::with_capacity(nodes.len());
        for node in nodes {
            outcomes.push(node.outcome(&ctx, &[], &observations).await.expect("outcome"));
        }
        assert!(
            outcomes.windows(2).all(|w| w[0] == w[1]),
            "every node must compute the same outcome"
        );
        let outcome = outcomes.remove(0);

        let mut all_reports = Vec::with_capacity(nodes.len());
        for node in nodes {
            all_reports.push(node.reports(seq_nr, &outcome).await.expect("reports"));
        }
        assert!(all_reports.windows(2).all(|w| w[0] == w[1]));

        RoundResult {
            outcome,
            reports: all_reports.remove(0),
        }
    }

    // =============================================================================
    // TEST: full rebalance lifecycle
    // =============================================================================

    #[tokio::test]
    async fn test_rebalance_lifecycle_across_five_nodes() {
        init_tracing();
        let world = World::new(&[(A, 1000), (B, 2000)]);
        let nodes = world.nodes();

        // Round 1: propose.
        let round1 = run_round(&nodes, 1, &[]).await;
        let outcome1 = Outcome::decode(&round1.outcome).unwrap();
        assert_eq!(
            outcome1.proposed_transfers,
            vec![ProposedTransfer::new(A, B, U256::from(1000))]
        );
        assert!(round1.reports.is_empty());

        // Round 2: resolve and report on A.
        let round2 = run_round(&nodes, 2, &round1.outcome).await;
        let outcome2 = Outcome::decode(&round2.outcome).unwrap();
        assert!(outcome2.proposed_transfers.is_empty());
        assert_eq!(outcome2.resolved_transfers.len(), 1);
        assert_eq!(round2.reports.len(), 1);

        let report = &round2.reports[0];
        assert_eq!(report.info.network_id, A);
        assert_eq!(report.info.liquidity_manager_address, lm_address(A));
        let transfer = report.info.transfers[0].clone();
        assert_eq!((transfer.from, transfer.to), (A, B));
        assert_eq!(transfer.amount, U256::from(1000));
        assert!(!transfer.bridge_data.is_empty());

        for node in &nodes {
            assert!(node.should_accept_attested_report(2, report).await.unwrap());
            assert!(node.should_transmit_accepted_report(2, report).await.unwrap());
            assert_eq!(node.inflight().len(), 1);
        }

        // Execute on chain: funds leave A, the bridge sees the transfer.
        let lm_a = world.lms.get(A, lm_address(A)).unwrap();
        lm_a.set_sequence_number(2);
        lm_a.set_balance(U256::zero());
        let id = world.ledger.submit(transfer.clone());

        // A second transmission of the executed report is stale.
        assert!(!nodes[0].should_transmit_accepted_report(2, report).await.unwrap());

        // Round 3: in flight and pending on the bridge, nothing new proposed.
        let round3 = run_round(&nodes, 3, &round2.outcome).await;
        let outcome3 = Outcome::decode(&round3.outcome).unwrap();
        assert!(outcome3.proposed_transfers.is_empty());
        assert!(outcome3.resolved_transfers.is_empty());
        assert_eq!(outcome3.pending_transfers.len(), 1);
        assert_eq!(outcome3.pending_transfers[0].status, TransferStatus::NotReady);
        assert!(round3.reports.is_empty());
        for node in &nodes {
            assert_eq!(node.inflight().len(), 1);
        }

        // Round 4: bridge reaches the finalization stage.
        world.ledger.advance_stage(&id);
        world.ledger.set_status(&id, TransferStatus::Ready);

        let round4 = run_round(&nodes, 4, &round3.outcome).await;
        for node in &nodes {
            assert!(node.inflight().is_empty(), "advanced stage expires in-flight");
        }
        assert_eq!(round4.reports.len(), 1);
        let incoming = &round4.reports[0];
        assert_eq!(incoming.info.network_id, B);
        assert_eq!(incoming.info.transfers.len(), 1);
        assert_eq!(incoming.info.transfers[0].stage, 1);

        for node in &nodes {
            assert!(node.should_accept_attested_report(4, incoming).await.unwrap());
            assert!(node.inflight().is_inflight(&incoming.info.transfers[0]));
        }

        for node in &nodes {
            node.close().await.unwrap();
        }
    }

    // =============================================================================
    // TEST: faulty observers
    // =============================================================================

    #[tokio::test]
    async fn test_f_lying_nodes_do_not_move_the_median() {
        init_tracing();
        let world = World::new(&[(A, 1000), (B, 2000)]);
        let nodes = world.nodes();
        let ctx = OutcomeContext::new(1, vec![]);

        let mut observations = Vec::new();
        for (i, node) in nodes.iter().enumerate() {
            let bytes = node.observation(&ctx, &[]).await.unwrap();
            let observation = if i < F {
                // Claim A is empty and invent an unreachable network.
                let mut lying = Observation::decode(&bytes).unwrap();
                lying.liquidity_per_chain[0].liquidity = U256::zero();
                lying
                    .liquidity_per_chain
                    .push(NetworkLiquidity::new(NetworkSelector(9), U256::from(1)));
                lying.encode().unwrap()
            } else {
                bytes
            };
            observations.push(AttributedObservation {
                observation,
                observer: i as u8,
            });
        }

        let outcome = Outcome::decode(&nodes[0].outcome(&ctx, &[], &observations).await.unwrap())
            .unwrap();
        assert_eq!(
            outcome.proposed_transfers,
            vec![ProposedTransfer::new(A, B, U256::from(1000))]
        );
    }

    #[tokio::test]
    async fn test_malformed_observation_rejected_and_quorum_enforced() {
        init_tracing();
        let world = World::new(&[(A, 1000), (B, 2000)]);
        let nodes = world.nodes();
        let ctx = OutcomeContext::new(1, vec![]);

        let garbage = AttributedObservation {
            observation: vec![0xde, 0xad],
            observer: 4,
        };
        assert!(nodes[0].validate_observation(&ctx, &[], &garbage).await.is_err());

        let mut observations = Vec::new();
        for (i, node) in nodes.iter().take(2 * F).enumerate() {
            observations.push(AttributedObservation {
                observation: node.observation(&ctx, &[]).await.unwrap(),
                observer: i as u8,
            });
        }
        assert!(nodes[0].outcome(&ctx, &[], &observations).await.is_err());
    }
}
