//! Report phase: split the outcome per network and gate transmission.

use super::LiquidityManagerPlugin;
use crate::config::PluginLimits;
use crate::domain::{NetworkSelector, Outcome, Report, ReportWithInfo, Transfer};
use crate::error::{LiquidityManagerError, LiquidityManagerResult, ResultExt};
use crate::metrics;
use std::collections::BTreeMap;
use tracing::{debug, info, instrument, warn};

impl LiquidityManagerPlugin {
    #[instrument(skip_all, fields(seq_nr = seq_nr))]
    pub(super) async fn build_reports(
        &self,
        seq_nr: u64,
        outcome: &[u8],
    ) -> LiquidityManagerResult<Vec<ReportWithInfo>> {
        let outcome = Outcome::decode(outcome)?;

        let mut by_network: BTreeMap<NetworkSelector, Vec<Transfer>> = BTreeMap::new();
        for t in &outcome.resolved_transfers {
            by_network.entry(t.from).or_default().push(t.clone());
        }
        for p in &outcome.pending_transfers {
            if p.status.is_actionable() {
                by_network.entry(p.transfer.to).or_default().push(p.transfer.clone());
            }
        }
        PluginLimits::check(
            "report count",
            by_network.len(),
            self.config.limits.max_report_count,
        )?;

        let graph = self.graph.read().await;
        let mut reports = Vec::with_capacity(by_network.len());
        for (network, transfers) in by_network {
            let address = graph
                .liquidity_manager_address(network)
                .with_context(|| format!("report for network {network}"))?;
            let digest = outcome
                .config_digest(network)
                .ok_or(LiquidityManagerError::ConfigDigestNotFound(network))?;

            let report = Report::new(transfers, address, network, digest);
            let encoded = self.report_codec.encode(&report)?;
            PluginLimits::check("report", encoded.len(), self.config.limits.max_report_length)?;
            debug!(%network, transfers = report.transfers.len(), "[qc-18] Report built");
            reports.push(ReportWithInfo {
                report: encoded,
                info: report,
            });
        }

        info!(reports = reports.len(), "[qc-18] Reports generated");
        metrics::record_reports_generated(reports.len());
        Ok(reports)
    }

    #[instrument(skip_all, fields(seq_nr = seq_nr, network = %report.info.network_id))]
    pub(super) async fn accept_report(
        &self,
        seq_nr: u64,
        report: &ReportWithInfo,
    ) -> LiquidityManagerResult<bool> {
        let decoded = match self.checked_report(seq_nr, report).await? {
            Some(decoded) => decoded,
            None => return Ok(false),
        };

        if let Some(t) = decoded.transfers.iter().find(|t| self.inflight.is_inflight(t)) {
            warn!(
                from = %t.from,
                to = %t.to,
                amount = %t.amount,
                "[qc-18] Transfer already in flight, rejecting report"
            );
            metrics::record_report_rejected("inflight");
            return Ok(false);
        }

        for t in &report.info.transfers {
            self.inflight.add(t.clone());
        }
        metrics::set_inflight_transfers(self.inflight.len());
        metrics::record_report_accepted();
        info!(
            transfers = report.info.transfers.len(),
            "[qc-18] Report accepted"
        );
        Ok(true)
    }

    #[instrument(skip_all, fields(seq_nr = seq_nr, network = %report.info.network_id))]
    pub(super) async fn transmit_report(
        &self,
        seq_nr: u64,
        report: &ReportWithInfo,
    ) -> LiquidityManagerResult<bool> {
        Ok(self.checked_report(seq_nr, report).await?.is_some())
    }

    /// Decode the report and apply the emptiness and staleness gates.
    /// `None` is a soft rejection.
    async fn checked_report(
        &self,
        seq_nr: u64,
        report: &ReportWithInfo,
    ) -> LiquidityManagerResult<Option<Report>> {
        let (decoded, _) = self
            .report_codec
            .decode(
                report.info.network_id,
                report.info.liquidity_manager_address,
                &report.report,
            )
            .context("decode report")?;

        if decoded.is_empty() {
            debug!("[qc-18] Empty report");
            metrics::record_report_rejected("empty");
            return Ok(None);
        }
        if !self.is_fresh(seq_nr, &decoded).await? {
            metrics::record_report_rejected("stale");
            return Ok(None);
        }
        Ok(Some(decoded))
    }

    /// A report is stale if the contract already executed this sequence
    /// number or cannot cover the report's outgoing transfers in order.
    async fn is_fresh(&self, seq_nr: u64, report: &Report) -> LiquidityManagerResult<bool> {
        let lm = self
            .lm_factory
            .new_liquidity_manager(report.network_id, report.liquidity_manager_address)
            .with_context(|| format!("liquidity manager of network {}", report.network_id))?;

        let onchain_seq_nr = lm
            .get_latest_sequence_number()
            .await
            .context("latest sequence number")?;
        if onchain_seq_nr >= seq_nr {
            warn!(onchain_seq_nr, "[qc-18] Report is stale");
            return Ok(false);
        }

        let mut balance = lm.get_balance().await.context("liquidity manager balance")?;
        for t in report.outgoing() {
            match balance.checked_sub(t.amount) {
                Some(remaining) => balance = remaining,
                None => {
                    warn!(
                        %balance,
                        amount = %t.amount,
                        to = %t.to,
                        "[qc-18] Insufficient balance for outgoing transfer"
                    );
                    return Ok(false);
                }
            }
        }
        Ok(true)
    }
}
