//! Bincode Report Codec Adapter
//!
//! Implements the `ReportCodec` port. The on-chain form leads with the
//! config digest and target so the contract can reject misrouted reports
//! before reading the transfers.

use crate::domain::{
    Address, ConfigDigest, LiquidityInstructions, NetworkSelector, Report, Transfer,
};
use crate::error::{LiquidityManagerError, LiquidityManagerResult};
use crate::ports::ReportCodec;
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
struct OnchainReport {
    config_digest: ConfigDigest,
    network_id: NetworkSelector,
    liquidity_manager_address: Address,
    transfers: Vec<Transfer>,
}

/// Report codec over bincode.
#[derive(Clone, Copy, Debug, Default)]
pub struct BincodeReportCodec;

impl BincodeReportCodec {
    /// Create a codec.
    pub fn new() -> Self {
        Self
    }
}

impl ReportCodec for BincodeReportCodec {
    fn encode(&self, report: &Report) -> LiquidityManagerResult<Vec<u8>> {
        let onchain = OnchainReport {
            config_digest: report.config_digest,
            network_id: report.network_id,
            liquidity_manager_address: report.liquidity_manager_address,
            transfers: report.transfers.clone(),
        };
        Ok(bincode::serialize(&onchain)?)
    }

    fn decode(
        &self,
        network: NetworkSelector,
        address: Address,
        bytes: &[u8],
    ) -> LiquidityManagerResult<(Report, LiquidityInstructions)> {
        if bytes.is_empty() {
            return Err(LiquidityManagerError::Codec("empty report".to_string()));
        }
        let onchain: OnchainReport = bincode::deserialize(bytes)?;
        if onchain.network_id != network {
            return Err(LiquidityManagerError::Codec(format!(
                "report targets network {}, expected {network}",
                onchain.network_id
            )));
        }
        if onchain.liquidity_manager_address != address {
            return Err(LiquidityManagerError::Codec(format!(
                "report targets {}, expected {address}",
                onchain.liquidity_manager_address
            )));
        }

        let report = Report::new(
            onchain.transfers,
            onchain.liquidity_manager_address,
            onchain.network_id,
            onchain.config_digest,
        );
        let instructions = LiquidityInstructions::from_report(&report);
        Ok((report, instructions))
    }
}
