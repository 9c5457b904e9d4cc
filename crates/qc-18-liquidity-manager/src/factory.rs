//! # Plugin Factory
//!
//! Validates configuration and hands out plugin instances that share the
//! node's collaborators (discoverer, clients, bridge cache).

use crate::bridge::BridgeFactory;
use crate::config::PluginConfig;
use crate::error::LiquidityManagerResult;
use crate::ports::{
    Discoverer, LiquidityManagerFactory, RebalancingAlgo, ReportCodec, ReportingPluginInfo,
};
use crate::service::{LiquidityManagerPlugin, PluginDependencies};
use std::sync::Arc;
use tracing::info;

/// Name advertised to the transport.
pub const PLUGIN_NAME: &str = "LiquidityManagerReportingPlugin";

/// Builds reporting plugins.
#[derive(Clone)]
pub struct PluginFactory {
    discoverer: Arc<dyn Discoverer>,
    rebalancer: Arc<dyn RebalancingAlgo>,
    lm_factory: Arc<dyn LiquidityManagerFactory>,
    report_codec: Arc<dyn ReportCodec>,
    bridge_factory: Arc<BridgeFactory>,
}

impl PluginFactory {
    /// Create a factory over the node's collaborators.
    pub fn new(
        discoverer: Arc<dyn Discoverer>,
        rebalancer: Arc<dyn RebalancingAlgo>,
        lm_factory: Arc<dyn LiquidityManagerFactory>,
        report_codec: Arc<dyn ReportCodec>,
        bridge_factory: Arc<BridgeFactory>,
    ) -> Self {
        Self {
            discoverer,
            rebalancer,
            lm_factory,
            report_codec,
            bridge_factory,
        }
    }

    /// Validate `config` and build a plugin with its advertised info.
    pub fn new_reporting_plugin(
        &self,
        config: PluginConfig,
    ) -> LiquidityManagerResult<(LiquidityManagerPlugin, ReportingPluginInfo)> {
        config.validate()?;
        let info = ReportingPluginInfo {
            name: PLUGIN_NAME.to_string(),
            limits: config.limits.clone(),
        };
        info!(
            f = config.f,
            root_network = %config.root_network,
            root_address = %config.root_address,
            "[qc-18] Creating reporting plugin"
        );
        let plugin = LiquidityManagerPlugin::new(PluginDependencies {
            discoverer: Arc::clone(&self.discoverer),
            rebalancer: Arc::clone(&self.rebalancer),
            lm_factory: Arc::clone(&self.lm_factory),
            report_codec: Arc::clone(&self.report_codec),
            bridge_factory: Arc::clone(&self.bridge_factory),
            config,
        });
        Ok((plugin, info))
    }
}
