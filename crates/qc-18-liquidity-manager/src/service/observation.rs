//! Observation phase: gather this node's local view.

use super::LiquidityManagerPlugin;
use crate::config::PluginLimits;
use crate::domain::{
    validate_observation, ConfigDigestWithMeta, LiquidityGraph, Observation, Outcome,
    PendingTransfer, ProposedTransfer, Transfer,
};
use crate::error::{LiquidityManagerError, LiquidityManagerResult, ResultExt};
use crate::metrics;
use crate::ports::{AttributedObservation, OutcomeContext};
use primitive_types::U256;
use tracing::{debug, info, instrument, warn};

impl LiquidityManagerPlugin {
    #[instrument(skip_all, fields(seq_nr = outctx.seq_nr))]
    pub(super) async fn build_observation(
        &self,
        outctx: &OutcomeContext,
    ) -> LiquidityManagerResult<Vec<u8>> {
        let graph = self.sync_graph().await.context("sync liquidity graph")?;
        let pending = self
            .load_pending_transfers(&graph)
            .await
            .context("load pending transfers")?;
        let resolved = self
            .resolve_proposed_transfers(&graph, &outctx.previous_outcome)
            .await?;
        let config_digests = config_digests(&graph)?;
        let inflight = self.inflight.get_all();

        info!(
            networks = graph.networks().len(),
            pending = pending.len(),
            resolved = resolved.len(),
            inflight = inflight.len(),
            "[qc-18] Observation built"
        );
        let observation = Observation::new(
            graph.liquidity_per_chain(),
            resolved,
            pending,
            inflight,
            graph.edges(),
            config_digests,
        );
        let encoded = observation.encode()?;
        PluginLimits::check(
            "observation",
            encoded.len(),
            self.config.limits.max_observation_length,
        )?;
        metrics::record_observation();
        Ok(encoded)
    }

    pub(super) fn check_observation(
        &self,
        observation: &AttributedObservation,
    ) -> LiquidityManagerResult<()> {
        let result = PluginLimits::check(
            "observation",
            observation.observation.len(),
            self.config.limits.max_observation_length,
        )
        .and_then(|_| Observation::decode(&observation.observation))
        .and_then(|obs| validate_observation(&obs));

        if let Err(e) = &result {
            warn!(observer = observation.observer, error = %e, "[qc-18] Observation rejected");
            metrics::record_observation_rejected(rejection_reason(e));
        }
        result
    }

    /// Full discovery on an empty graph, balance refresh otherwise.
    async fn sync_graph(&self) -> LiquidityManagerResult<LiquidityGraph> {
        let mut graph = self.graph.write().await;
        if graph.is_empty() {
            debug!("[qc-18] Discovering liquidity graph");
            *graph = self.discoverer.discover().await?;
        } else {
            self.discoverer.discover_balances(&mut *graph).await?;
        }
        Ok(graph.clone())
    }

    async fn load_pending_transfers(
        &self,
        graph: &LiquidityGraph,
    ) -> LiquidityManagerResult<Vec<PendingTransfer>> {
        let mut pending = Vec::new();
        for edge in graph.edges() {
            let bridge = self.bridge_factory.new_bridge(edge.source, edge.dest).await?;
            let transfers = bridge
                .get_transfers(
                    graph.token_address(edge.source)?,
                    graph.token_address(edge.dest)?,
                )
                .await
                .with_context(|| format!("bridge transfers on {edge}"))?;
            debug!(%edge, count = transfers.len(), "[qc-18] Pending transfers");
            pending.extend(transfers);
        }

        let expired = self.inflight.expire(&pending);
        if expired > 0 {
            info!(expired, "[qc-18] Expired in-flight transfers");
            metrics::record_inflight_expired(expired);
        }
        metrics::set_inflight_transfers(self.inflight.len());
        Ok(pending)
    }

    /// Turn the previous round's proposals into transfers with payload and
    /// fee. A proposal that cannot be resolved is skipped.
    async fn resolve_proposed_transfers(
        &self,
        graph: &LiquidityGraph,
        previous_outcome: &[u8],
    ) -> LiquidityManagerResult<Vec<Transfer>> {
        if previous_outcome.is_empty() {
            return Ok(Vec::new());
        }
        let outcome = Outcome::decode(previous_outcome).context("decode previous outcome")?;

        let mut resolved = Vec::with_capacity(outcome.proposed_transfers.len());
        for proposed in &outcome.proposed_transfers {
            match self.resolve_proposed_transfer(graph, proposed).await {
                Ok(transfer) => resolved.push(transfer),
                Err(e) => warn!(
                    from = %proposed.from,
                    to = %proposed.to,
                    amount = %proposed.amount,
                    error = %e,
                    "[qc-18] Skipping unresolvable proposed transfer"
                ),
            }
        }
        Ok(resolved)
    }

    async fn resolve_proposed_transfer(
        &self,
        graph: &LiquidityGraph,
        proposed: &ProposedTransfer,
    ) -> LiquidityManagerResult<Transfer> {
        let mut transfer = Transfer {
            from: proposed.from,
            to: proposed.to,
            amount: proposed.amount,
            sender: graph.liquidity_manager_address(proposed.from)?,
            receiver: graph.liquidity_manager_address(proposed.to)?,
            local_token_address: graph.token_address(proposed.from)?,
            remote_token_address: graph.token_address(proposed.to)?,
            bridge_data: Vec::new(),
            native_bridge_fee: U256::zero(),
            date: self.time_source.now(),
            stage: 0,
        };

        let bridge = self
            .bridge_factory
            .new_bridge(proposed.from, proposed.to)
            .await?;
        let (payload, fee) = bridge.get_bridge_payload_and_fee(&transfer).await?;
        transfer.bridge_data = payload;
        transfer.native_bridge_fee = fee;
        Ok(transfer)
    }
}

fn config_digests(graph: &LiquidityGraph) -> LiquidityManagerResult<Vec<ConfigDigestWithMeta>> {
    graph
        .networks()
        .into_iter()
        .map(|network| {
            graph
                .data(network)
                .map(|data| ConfigDigestWithMeta::new(data.config_digest, network))
        })
        .collect()
}

fn rejection_reason(err: &LiquidityManagerError) -> &'static str {
    match err.root_cause() {
        LiquidityManagerError::LimitExceeded { .. } => "too_large",
        LiquidityManagerError::Codec(_) => "decode",
        LiquidityManagerError::DuplicateEntry { .. } => "duplicate_entry",
        LiquidityManagerError::InvalidEntry { .. } => "invalid_entry",
        _ => "other",
    }
}
