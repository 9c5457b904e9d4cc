//! Liquidity Manager Service - Reporting plugin state machine
//!
//! # Round Phases
//!
//! | Phase | Module | Reads | Writes |
//! |-------|--------|-------|--------|
//! | observation | `observation` | discoverer, bridges, in-flight | graph, in-flight (expire) |
//! | validate_observation | `observation` | - | - |
//! | outcome | `outcome` | observations, bridges, rebalancer | - |
//! | reports | `reports` | graph, report codec | - |
//! | should_accept | `reports` | liquidity managers, in-flight | in-flight (add) |
//! | should_transmit | `reports` | liquidity managers | - |
//!
//! Soft rejections return `Ok(false)` or skip the item. Collaborator
//! failures abort the phase for this node only.

mod observation;
mod outcome;
mod reports;


use crate::bridge::BridgeFactory;
use crate::config::PluginConfig;
use crate::domain::{InflightContainer, LiquidityGraph, ReportWithInfo};
use crate::error::{LiquidityManagerError, LiquidityManagerResult, ResultExt};
use crate::ports::{
    AttributedObservation, Discoverer, LiquidityManagerFactory, ObservationQuorum, OutcomeContext,
    Query, RebalancingAlgo, ReportCodec, ReportingPlugin, SystemTimeSource, TimeSource,
};
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{error, info, warn};

/// Liquidity manager reporting plugin, one per node.
pub struct LiquidityManagerPlugin {
    config: PluginConfig,
    graph: RwLock<LiquidityGraph>,
    inflight: InflightContainer,
    bridge_factory: Arc<BridgeFactory>,
    discoverer: Arc<dyn Discoverer>,
    rebalancer: Arc<dyn RebalancingAlgo>,
    lm_factory: Arc<dyn LiquidityManagerFactory>,
    report_codec: Arc<dyn ReportCodec>,
    time_source: Box<dyn TimeSource>,
}

/// Dependencies for LiquidityManagerPlugin
pub struct PluginDependencies {
    /// Graph and balance discovery.
    pub discoverer: Arc<dyn Discoverer>,
    /// Proposes new transfers from the agreed graph.
    pub rebalancer: Arc<dyn RebalancingAlgo>,
    /// On-chain liquidity manager clients.
    pub lm_factory: Arc<dyn LiquidityManagerFactory>,
    /// On-chain report format.
    pub report_codec: Arc<dyn ReportCodec>,
    /// Shared per-pair bridge cache.
    pub bridge_factory: Arc<BridgeFactory>,
    /// Plugin configuration.
    pub config: PluginConfig,
}

impl LiquidityManagerPlugin {
    /// Create a new plugin with an empty graph and no in-flight transfers.
    pub fn new(deps: PluginDependencies) -> Self {
        Self {
            config: deps.config,
            graph: RwLock::new(LiquidityGraph::new()),
            inflight: InflightContainer::new(),
            bridge_factory: deps.bridge_factory,
            discoverer: deps.discoverer,
            rebalancer: deps.rebalancer,
            lm_factory: deps.lm_factory,
            report_codec: deps.report_codec,
            time_source: Box::new(SystemTimeSource),
        }
    }

    /// Set custom time source (for testing)
    pub fn with_time_source(mut self, time_source: Box<dyn TimeSource>) -> Self {
        self.time_source = time_source;
        self
    }

    /// Plugin configuration.
    pub fn config(&self) -> &PluginConfig {
        &self.config
    }

    /// In-flight transfers of this node.
    pub fn inflight(&self) -> &InflightContainer {
        &self.inflight
    }

    /// Snapshot of the local liquidity graph.
    pub async fn graph(&self) -> LiquidityGraph {
        self.graph.read().await.clone()
    }

    async fn close_all(&self) -> Vec<LiquidityManagerError> {
        let mut errors = Vec::new();

        let managers = {
            let graph = self.graph.read().await;
            graph
                .networks()
                .into_iter()
                .map(|network| (network, graph.liquidity_manager_address(network)))
                .collect::<Vec<_>>()
        };
        for (network, address) in managers {
            let closed = match address {
                Ok(address) => match self.lm_factory.get_liquidity_manager(network, address) {
                    Ok(lm) => lm.close().await,
                    Err(e) => Err(e),
                },
                Err(e) => Err(e),
            };
            if let Err(e) =
                closed.with_context(|| format!("close liquidity manager of network {network}"))
            {
                errors.push(e);
            }
        }

        for bridge in self.bridge_factory.cached_bridges() {
            if let Err(e) = bridge.close().await.context("close bridge") {
                errors.push(e);
            }
        }
        errors
    }
}

#[async_trait]
impl ReportingPlugin for LiquidityManagerPlugin {
    async fn query(&self, _outctx: &OutcomeContext) -> LiquidityManagerResult<Query> {
        Ok(Query::new())
    }

    async fn observation(
        &self,
        outctx: &OutcomeContext,
        _query: &[u8],
    ) -> LiquidityManagerResult<Vec<u8>> {
        self.build_observation(outctx).await.inspect_err(|e| {
            error!(seq_nr = outctx.seq_nr, error = %e, "[qc-18] Observation failed");
        })
    }

    async fn validate_observation(
        &self,
        _outctx: &OutcomeContext,
        _query: &[u8],
        observation: &AttributedObservation,
    ) -> LiquidityManagerResult<()> {
        self.check_observation(observation)
    }

    fn observation_quorum(&self, _outctx: &OutcomeContext, _query: &[u8]) -> ObservationQuorum {
        ObservationQuorum::TwoFPlusOne
    }

    async fn outcome(
        &self,
        outctx: &OutcomeContext,
        _query: &[u8],
        observations: &[AttributedObservation],
    ) -> LiquidityManagerResult<Vec<u8>> {
        self.build_outcome(outctx, observations).await.inspect_err(|e| {
            error!(seq_nr = outctx.seq_nr, error = %e, "[qc-18] Outcome failed");
        })
    }

    async fn reports(
        &self,
        seq_nr: u64,
        outcome: &[u8],
    ) -> LiquidityManagerResult<Vec<ReportWithInfo>> {
        self.build_reports(seq_nr, outcome)
            .await
            .inspect_err(|e| error!(seq_nr, error = %e, "[qc-18] Reports failed"))
    }

    async fn should_accept_attested_report(
        &self,
        seq_nr: u64,
        report: &ReportWithInfo,
    ) -> LiquidityManagerResult<bool> {
        self.accept_report(seq_nr, report).await
    }

    async fn should_transmit_accepted_report(
        &self,
        seq_nr: u64,
        report: &ReportWithInfo,
    ) -> LiquidityManagerResult<bool> {
        self.transmit_report(seq_nr, report).await
    }

    async fn close(&self) -> LiquidityManagerResult<()> {
        let timeout = self.config.close_timeout();
        let errors = tokio::time::timeout(timeout, self.close_all())
            .await
            .map_err(|_| {
                LiquidityManagerError::Timeout(format!("close after {}s", timeout.as_secs()))
            })?;

        if errors.is_empty() {
            info!("[qc-18] Plugin closed");
            return Ok(());
        }
        warn!(errors = errors.len(), "[qc-18] Plugin closed with errors");
        Err(LiquidityManagerError::Multiple(errors))
    }
}
