//! # Liquidity Manager Metrics
//!
//! Prometheus metrics for the reporting plugin.
//!
//! ## Usage
//!
//! Enable with the `metrics` feature:
//! ```toml
//! qc-18-liquidity-manager = { path = "...", features = ["metrics"] }
//! ```
//!
//! ## Metrics Exported
//!
//! - `liquidity_observations_total` - Counter of observations produced
//! - `liquidity_observations_rejected_total` - Counter of rejected observations (by reason)
//! - `liquidity_outcomes_total` - Counter of outcomes computed
//! - `liquidity_proposed_transfers_total` - Counter of transfers proposed by the rebalancer
//! - `liquidity_reports_generated_total` - Counter of reports generated
//! - `liquidity_reports_accepted_total` - Counter of reports accepted for transmission
//! - `liquidity_reports_rejected_total` - Counter of reports rejected (by reason)
//! - `liquidity_inflight_transfers` - Gauge of transfers currently in flight
//! - `liquidity_inflight_expired_total` - Counter of in-flight transfers expired

#[cfg(feature = "metrics")]
use lazy_static::lazy_static;

#[cfg(feature = "metrics")]
use prometheus::{
    register_int_counter, register_int_counter_vec, register_int_gauge, IntCounter,
    IntCounterVec, IntGauge,
};

#[cfg(feature = "metrics")]
lazy_static! {
    /// Total observations produced
    pub static ref OBSERVATIONS: IntCounter = register_int_counter!(
        "liquidity_observations_total",
        "Total number of observations produced"
    )
    .expect("Failed to create OBSERVATIONS metric");

    /// Total observations rejected, labeled by reason
    pub static ref OBSERVATIONS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "liquidity_observations_rejected_total",
        "Total number of observations rejected",
        &["reason"]
    )
    .expect("Failed to create OBSERVATIONS_REJECTED metric");

    /// Total outcomes computed
    pub static ref OUTCOMES: IntCounter = register_int_counter!(
        "liquidity_outcomes_total",
        "Total number of outcomes computed"
    )
    .expect("Failed to create OUTCOMES metric");

    /// Total transfers proposed by the rebalancer
    pub static ref PROPOSED_TRANSFERS: IntCounter = register_int_counter!(
        "liquidity_proposed_transfers_total",
        "Total number of transfers proposed"
    )
    .expect("Failed to create PROPOSED_TRANSFERS metric");

    /// Total reports generated
    pub static ref REPORTS_GENERATED: IntCounter = register_int_counter!(
        "liquidity_reports_generated_total",
        "Total number of reports generated"
    )
    .expect("Failed to create REPORTS_GENERATED metric");

    /// Total reports accepted
    pub static ref REPORTS_ACCEPTED: IntCounter = register_int_counter!(
        "liquidity_reports_accepted_total",
        "Total number of attested reports accepted"
    )
    .expect("Failed to create REPORTS_ACCEPTED metric");

    /// Total reports rejected, labeled by reason
    pub static ref REPORTS_REJECTED: IntCounterVec = register_int_counter_vec!(
        "liquidity_reports_rejected_total",
        "Total number of reports rejected",
        &["reason"]
    )
    .expect("Failed to create REPORTS_REJECTED metric");

    /// Transfers currently in flight
    pub static ref INFLIGHT_TRANSFERS: IntGauge = register_int_gauge!(
        "liquidity_inflight_transfers",
        "Number of transfers currently in flight"
    )
    .expect("Failed to create INFLIGHT_TRANSFERS metric");

    /// Total in-flight transfers expired
    pub static ref INFLIGHT_EXPIRED: IntCounter = register_int_counter!(
        "liquidity_inflight_expired_total",
        "Total number of in-flight transfers expired"
    )
    .expect("Failed to create INFLIGHT_EXPIRED metric");
}

// =============================================================================
// METRIC RECORDING FUNCTIONS
// =============================================================================

/// Record an observation produced
#[cfg(feature = "metrics")]
pub fn record_observation() {
    OBSERVATIONS.inc();
}

/// Record an observation rejected with reason
#[cfg(feature = "metrics")]
pub fn record_observation_rejected(reason: &str) {
    OBSERVATIONS_REJECTED.with_label_values(&[reason]).inc();
}

/// Record an outcome and the number of new proposals it carries
#[cfg(feature = "metrics")]
pub fn record_outcome(proposed: usize) {
    OUTCOMES.inc();
    PROPOSED_TRANSFERS.inc_by(proposed as u64);
}

/// Record reports generated
#[cfg(feature = "metrics")]
pub fn record_reports_generated(count: usize) {
    REPORTS_GENERATED.inc_by(count as u64);
}

/// Record a report accepted
#[cfg(feature = "metrics")]
pub fn record_report_accepted() {
    REPORTS_ACCEPTED.inc();
}

/// Record a report rejected with reason
#[cfg(feature = "metrics")]
pub fn record_report_rejected(reason: &str) {
    REPORTS_REJECTED.with_label_values(&[reason]).inc();
}

/// Update the in-flight gauge
#[cfg(feature = "metrics")]
pub fn set_inflight_transfers(count: usize) {
    INFLIGHT_TRANSFERS.set(count as i64);
}

/// Record in-flight transfers expired
#[cfg(feature = "metrics")]
pub fn record_inflight_expired(count: usize) {
    INFLIGHT_EXPIRED.inc_by(count as u64);
}

// =============================================================================
// NO-OP IMPLEMENTATIONS (when metrics feature disabled)
// =============================================================================

#[cfg(not(feature = "metrics"))]
pub fn record_observation() {}

#[cfg(not(feature = "metrics"))]
pub fn record_observation_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn record_outcome(_proposed: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_reports_generated(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_report_accepted() {}

#[cfg(not(feature = "metrics"))]
pub fn record_report_rejected(_reason: &str) {}

#[cfg(not(feature = "metrics"))]
pub fn set_inflight_transfers(_count: usize) {}

#[cfg(not(feature = "metrics"))]
pub fn record_inflight_expired(_count: usize) {}
