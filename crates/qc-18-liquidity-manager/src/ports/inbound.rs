//! Driving ports (Inbound API)
//!
//! The consensus transport calls these once per round, in order:
//! query, observation, validate_observation, outcome, reports,
//! should_accept_attested_report, should_transmit_accepted_report.

use crate::config::PluginLimits;
use crate::domain::ReportWithInfo;
use crate::error::LiquidityManagerResult;
use async_trait::async_trait;

/// Encoded query. Always empty for this plugin.
pub type Query = Vec<u8>;

/// Round context handed to query, observation and outcome.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OutcomeContext {
    /// Round sequence number.
    pub seq_nr: u64,
    /// Encoded outcome of the previous round, empty on the first round.
    pub previous_outcome: Vec<u8>,
}

impl OutcomeContext {
    /// Create a new round context.
    pub fn new(seq_nr: u64, previous_outcome: Vec<u8>) -> Self {
        Self {
            seq_nr,
            previous_outcome,
        }
    }
}

/// An encoded observation tagged with the node that produced it.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AttributedObservation {
    /// Encoded observation.
    pub observation: Vec<u8>,
    /// Index of the observing node.
    pub observer: u8,
}

/// How many observations the transport must gather before outcome.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ObservationQuorum {
    /// 2f+1 observations.
    TwoFPlusOne,
}

impl ObservationQuorum {
    /// Number of observations required for a given `f`.
    pub fn required(&self, f: usize) -> usize {
        match self {
            Self::TwoFPlusOne => crate::algorithms::quorum(f),
        }
    }
}

/// Name and limits advertised to the transport.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReportingPluginInfo {
    /// Plugin name.
    pub name: String,
    /// Message size limits.
    pub limits: PluginLimits,
}

/// Per-round reporting plugin.
#[async_trait]
pub trait ReportingPlugin: Send + Sync {
    /// Leader query. No work is delegated to the leader.
    async fn query(&self, outctx: &OutcomeContext) -> LiquidityManagerResult<Query>;

    /// Build this node's encoded observation.
    async fn observation(
        &self,
        outctx: &OutcomeContext,
        query: &[u8],
    ) -> LiquidityManagerResult<Vec<u8>>;

    /// Reject a malformed observation from another node.
    async fn validate_observation(
        &self,
        outctx: &OutcomeContext,
        query: &[u8],
        observation: &AttributedObservation,
    ) -> LiquidityManagerResult<()>;

    /// Observation count policy.
    fn observation_quorum(&self, outctx: &OutcomeContext, query: &[u8]) -> ObservationQuorum;

    /// Aggregate validated observations into the encoded round outcome.
    async fn outcome(
        &self,
        outctx: &OutcomeContext,
        query: &[u8],
        observations: &[AttributedObservation],
    ) -> LiquidityManagerResult<Vec<u8>>;

    /// Split an outcome into one report per affected network.
    async fn reports(
        &self,
        seq_nr: u64,
        outcome: &[u8],
    ) -> LiquidityManagerResult<Vec<ReportWithInfo>>;

    /// Decide whether an attested report is accepted. Accepting records its
    /// transfers as in flight.
    async fn should_accept_attested_report(
        &self,
        seq_nr: u64,
        report: &ReportWithInfo,
    ) -> LiquidityManagerResult<bool>;

    /// Decide whether an accepted report is still worth transmitting.
    async fn should_transmit_accepted_report(
        &self,
        seq_nr: u64,
        report: &ReportWithInfo,
    ) -> LiquidityManagerResult<bool>;

    /// Release clients and bridges.
    async fn close(&self) -> LiquidityManagerResult<()>;
}
