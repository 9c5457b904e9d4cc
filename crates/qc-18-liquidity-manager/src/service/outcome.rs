//! Outcome phase: aggregate observations and ask the rebalancer for new
//! proposals.

use super::LiquidityManagerPlugin;
use crate::algorithms::{
    config_digests_consensus, graph_edges_consensus, inflight_transfers_consensus,
    median_liquidity_per_chain, pending_transfers_consensus, resolved_transfers_quorum,
};
use crate::config::PluginLimits;
use crate::domain::{LiquidityGraph, Observation, Outcome, Transfer, UnexecutedTransfer};
use crate::error::{LiquidityManagerResult, ResultExt};
use crate::metrics;
use crate::ports::{AttributedObservation, OutcomeContext};
use tracing::{debug, info, instrument, warn};

impl LiquidityManagerPlugin {
    #[instrument(skip_all, fields(seq_nr = outctx.seq_nr, observations = attributed.len()))]
    pub(super) async fn build_outcome(
        &self,
        outctx: &OutcomeContext,
        attributed: &[AttributedObservation],
    ) -> LiquidityManagerResult<Vec<u8>> {
        let observations = attributed
            .iter()
            .map(|ao| Observation::decode(&ao.observation))
            .collect::<LiquidityManagerResult<Vec<_>>>()
            .context("decode observations")?;
        let f = self.config.f;

        let liquidity =
            median_liquidity_per_chain(&observations, f).context("median liquidity per chain")?;
        let edges = graph_edges_consensus(&observations, f).context("graph edges consensus")?;
        let pending =
            pending_transfers_consensus(&observations, f).context("pending transfers consensus")?;
        let config_digests =
            config_digests_consensus(&observations, f).context("config digests consensus")?;
        let inflight = inflight_transfers_consensus(&observations, f)
            .context("inflight transfers consensus")?;

        let (graph, dropped) = LiquidityGraph::from_edges_and_liquidity(&edges, &liquidity);
        for edge in &dropped {
            debug!(%edge, "[qc-18] Dropping edge without agreed liquidity");
        }

        let resolved = self.resolved_transfers(&observations).await?;

        let mut unexecuted = Vec::with_capacity(pending.len() + resolved.len() + inflight.len());
        unexecuted.extend(pending.iter().cloned().map(UnexecutedTransfer::Pending));
        unexecuted.extend(resolved.iter().cloned().map(UnexecutedTransfer::Resolved));
        unexecuted.extend(inflight.into_iter().map(UnexecutedTransfer::Inflight));

        let proposed = self
            .rebalancer
            .compute_transfers_to_balance(&graph, &unexecuted)
            .context("compute transfers to balance")?;

        info!(
            networks = graph.networks().len(),
            pending = pending.len(),
            resolved = resolved.len(),
            unexecuted = unexecuted.len(),
            proposed = proposed.len(),
            "[qc-18] Outcome computed"
        );
        metrics::record_outcome(proposed.len());

        let outcome = Outcome::new(proposed, resolved, pending, config_digests);
        let encoded = outcome.encode()?;
        PluginLimits::check("outcome", encoded.len(), self.config.limits.max_outcome_length)?;
        Ok(encoded)
    }

    /// Resolved transfers agreed by f+1 nodes, with the per-node payloads
    /// combined by the pair's bridge. A transfer whose payloads do not
    /// combine is left out of this round.
    async fn resolved_transfers(
        &self,
        observations: &[Observation],
    ) -> LiquidityManagerResult<Vec<Transfer>> {
        let f = self.config.f;
        let groups =
            resolved_transfers_quorum(observations, f).context("resolved transfers quorum")?;

        let mut resolved = Vec::with_capacity(groups.len());
        for group in groups {
            let mut transfer = group.transfer;
            let bridge = self
                .bridge_factory
                .new_bridge(transfer.from, transfer.to)
                .await?;
            match bridge.quorumized_bridge_payload(&group.payloads, f) {
                Ok(payload) => {
                    transfer.bridge_data = payload;
                    resolved.push(transfer);
                }
                Err(e) => warn!(
                    from = %transfer.from,
                    to = %transfer.to,
                    amount = %transfer.amount,
                    error = %e,
                    "[qc-18] No payload quorum, dropping resolved transfer"
                ),
            }
        }
        Ok(resolved)
    }
}
