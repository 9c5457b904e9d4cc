//! # Observation Invariants
//!
//! Every collection in an observation is unique by a type-specific key and
//! every entry is individually valid. An observation breaking either rule is
//! excluded from the round; the round itself carries on.

use super::entities::{ResolvedTransferKey, Transfer};
use super::inflight::InflightKey;
use super::messages::Observation;
use super::value_objects::{Edge, NetworkSelector};
use crate::error::{LiquidityManagerError, LiquidityManagerResult};
use std::collections::HashSet;
use std::fmt::Debug;
use std::hash::Hash;

fn ensure_unique<T, K, F>(kind: &'static str, items: &[T], key: F) -> LiquidityManagerResult<()>
where
    K: Eq + Hash + Debug,
    F: Fn(&T) -> K,
{
    let mut seen = HashSet::with_capacity(items.len());
    for item in items {
        let k = key(item);
        if seen.contains(&k) {
            return Err(LiquidityManagerError::DuplicateEntry {
                kind,
                key: format!("{k:?}"),
            });
        }
        seen.insert(k);
    }
    Ok(())
}

/// Invariant: liquidity reported at most once per network.
pub fn invariant_unique_liquidity(obs: &Observation) -> LiquidityManagerResult<()> {
    ensure_unique("network liquidity", &obs.liquidity_per_chain, |l| l.network)
}

/// Invariant: each resolved transfer appears once and is valid.
pub fn invariant_valid_resolved_transfers(obs: &Observation) -> LiquidityManagerResult<()> {
    ensure_unique::<Transfer, ResolvedTransferKey, _>(
        "resolved transfer",
        &obs.resolved_transfers,
        Transfer::resolved_key,
    )?;
    obs.resolved_transfers.iter().try_for_each(Transfer::validate)
}

/// Invariant: pending transfers are unique by bridge id and valid.
pub fn invariant_valid_pending_transfers(obs: &Observation) -> LiquidityManagerResult<()> {
    ensure_unique("pending transfer", &obs.pending_transfers, |p| p.id.clone())?;
    obs.pending_transfers.iter().try_for_each(|p| p.validate())
}

/// Invariant: in-flight transfers are unique by their tracker key and valid.
pub fn invariant_valid_inflight_transfers(obs: &Observation) -> LiquidityManagerResult<()> {
    ensure_unique::<Transfer, InflightKey, _>(
        "inflight transfer",
        &obs.inflight_transfers,
        |t| InflightKey::from(t),
    )?;
    obs.inflight_transfers.iter().try_for_each(Transfer::validate)
}

/// Invariant: edges are unique and never loop back to their source.
pub fn invariant_valid_edges(obs: &Observation) -> LiquidityManagerResult<()> {
    ensure_unique::<Edge, Edge, _>("edge", &obs.edges, |e| *e)?;
    match obs.edges.iter().find(|e| e.source == e.dest) {
        Some(e) => Err(LiquidityManagerError::InvalidEntry {
            kind: "edge",
            reason: format!("self loop on {}", e.source),
        }),
        None => Ok(()),
    }
}

/// Invariant: one config digest per network.
pub fn invariant_unique_config_digests(obs: &Observation) -> LiquidityManagerResult<()> {
    ensure_unique::<_, NetworkSelector, _>("config digest", &obs.config_digests, |d| {
        d.network_sel
    })
}

/// Run every observation invariant, failing on the first violation.
pub fn validate_observation(obs: &Observation) -> LiquidityManagerResult<()> {
    invariant_unique_liquidity(obs)?;
    invariant_valid_resolved_transfers(obs)?;
    invariant_valid_pending_transfers(obs)?;
    invariant_valid_inflight_transfers(obs)?;
    invariant_valid_edges(obs)?;
    invariant_unique_config_digests(obs)
}
