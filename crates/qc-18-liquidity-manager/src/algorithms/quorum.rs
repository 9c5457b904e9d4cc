//! # Quorum Aggregation
//!
//! Pure reductions of N node observations into one agreed value per field,
//! tolerating up to `f` faulty nodes.
//!
//! | Threshold | Value | Meaning |
//! |-----------|-------|---------|
//! | quorum | 2f+1 | observations needed before aggregating |
//! | bft | f+1 | matching votes needed to accept a value |
//!
//! Each observation votes at most once per key, results are deduplicated and
//! sorted, and inputs are never mutated.

use crate::domain::{
    ConfigDigestWithMeta, Edge, InflightKey, NetworkLiquidity, NetworkSelector, Observation,
    PendingTransfer, ResolvedTransferKey, Transfer,
};
use crate::error::{LiquidityManagerError, LiquidityManagerResult};
use primitive_types::U256;
use std::collections::{BTreeMap, HashSet};
use std::hash::Hash;
use tracing::warn;

/// Minimum number of observations: 2f+1.
pub fn quorum(f: usize) -> usize {
    2 * f + 1
}

/// Minimum number of matching votes: f+1.
pub fn bft(f: usize) -> usize {
    f + 1
}

/// Fail unless at least 2f+1 observations were supplied.
pub fn ensure_quorum(observations: &[Observation], f: usize) -> LiquidityManagerResult<()> {
    let need = quorum(f);
    if observations.len() < need {
        return Err(LiquidityManagerError::InsufficientObservations {
            have: observations.len(),
            need,
        });
    }
    Ok(())
}

/// Ascending-sort a copy and return the element at `len / 2` (the upper
/// median on even counts). With 2f+1 inputs the pick always falls inside the
/// range reported by honest nodes.
pub fn sorted_middle<T: Ord + Clone>(values: &[T]) -> Option<T> {
    if values.is_empty() {
        return None;
    }
    let mut sorted = values.to_vec();
    sorted.sort();
    Some(sorted[sorted.len() / 2].clone())
}

/// Sorted middle over big integers.
pub fn big_int_sorted_middle(values: &[U256]) -> Option<U256> {
    sorted_middle(values)
}

/// Count votes per key, one vote per observation, keeping the first item
/// seen for each key.
fn tally<K, T, I>(per_observation: I) -> BTreeMap<K, (usize, T)>
where
    K: Ord + Hash + Clone,
    I: IntoIterator<Item = Vec<(K, T)>>,
{
    let mut votes: BTreeMap<K, (usize, T)> = BTreeMap::new();
    for entries in per_observation {
        let mut voted = HashSet::new();
        for (key, item) in entries {
            if !voted.insert(key.clone()) {
                continue;
            }
            votes
                .entry(key)
                .and_modify(|(count, _)| *count += 1)
                .or_insert((1, item));
        }
    }
    votes
}

fn agreed<K, T>(votes: BTreeMap<K, (usize, T)>, f: usize) -> impl Iterator<Item = (K, T)> {
    let threshold = bft(f);
    votes
        .into_iter()
        .filter(move |(_, (count, _))| *count >= threshold)
        .map(|(key, (_, item))| (key, item))
}

/// Median liquidity per network. Networks reported by fewer than f+1 nodes
/// are dropped. Result is sorted by network.
pub fn median_liquidity_per_chain(
    observations: &[Observation],
    f: usize,
) -> LiquidityManagerResult<Vec<NetworkLiquidity>> {
    ensure_quorum(observations, f)?;

    let mut by_network: BTreeMap<NetworkSelector, Vec<U256>> = BTreeMap::new();
    for obs in observations {
        let mut seen = HashSet::new();
        for l in &obs.liquidity_per_chain {
            if seen.insert(l.network) {
                by_network.entry(l.network).or_default().push(l.liquidity);
            }
        }
    }

    Ok(by_network
        .into_iter()
        .filter(|(_, values)| values.len() >= bft(f))
        .filter_map(|(network, values)| {
            big_int_sorted_middle(&values).map(|m| NetworkLiquidity::new(network, m))
        })
        .collect())
}

/// Pending transfers observed by at least f+1 nodes, keyed by content hash,
/// sorted by bridge id.
pub fn pending_transfers_consensus(
    observations: &[Observation],
    f: usize,
) -> LiquidityManagerResult<Vec<PendingTransfer>> {
    ensure_quorum(observations, f)?;

    let mut hashed = Vec::with_capacity(observations.len());
    for obs in observations {
        let mut entries = Vec::with_capacity(obs.pending_transfers.len());
        for p in &obs.pending_transfers {
            entries.push((p.hash()?, p.clone()));
        }
        hashed.push(entries);
    }

    let votes = tally(hashed);
    let mut result: Vec<([u8; 32], PendingTransfer)> = agreed(votes, f).collect();
    result.sort_by(|(ha, a), (hb, b)| a.id.cmp(&b.id).then(ha.cmp(hb)));
    Ok(result.into_iter().map(|(_, p)| p).collect())
}

/// In-flight transfers reported by at least f+1 nodes, keyed by
/// `(from, to, amount)`, sorted by source network.
pub fn inflight_transfers_consensus(
    observations: &[Observation],
    f: usize,
) -> LiquidityManagerResult<Vec<Transfer>> {
    ensure_quorum(observations, f)?;

    let votes = tally(observations.iter().map(|obs| {
        obs.inflight_transfers
            .iter()
            .map(|t| (InflightKey::from(t), t.clone()))
            .collect::<Vec<_>>()
    }));
    Ok(agreed(votes, f).map(|(_, t)| t).collect())
}

/// Graph edges reported by at least f+1 nodes, sorted by source then dest.
pub fn graph_edges_consensus(
    observations: &[Observation],
    f: usize,
) -> LiquidityManagerResult<Vec<Edge>> {
    ensure_quorum(observations, f)?;

    let votes = tally(
        observations
            .iter()
            .map(|obs| obs.edges.iter().map(|e| (*e, *e)).collect::<Vec<_>>()),
    );
    Ok(agreed(votes, f).map(|(e, _)| e).collect())
}

/// Config digests reported by at least f+1 nodes, one per network, sorted
/// by network. When several digests for one network reach f+1 (a config
/// rollover seen by more than 2f+1 nodes), the most voted wins and ties go
/// to the lowest digest bytes.
pub fn config_digests_consensus(
    observations: &[Observation],
    f: usize,
) -> LiquidityManagerResult<Vec<ConfigDigestWithMeta>> {
    ensure_quorum(observations, f)?;

    let votes = tally(observations.iter().map(|obs| {
        obs.config_digests
            .iter()
            .map(|d| ((d.network_sel, d.digest.to_hex()), *d))
            .collect::<Vec<_>>()
    }));

    let threshold = bft(f);
    let mut per_network: BTreeMap<NetworkSelector, (usize, ConfigDigestWithMeta)> =
        BTreeMap::new();
    for ((network, _), (count, digest)) in votes {
        if count < threshold {
            continue;
        }
        match per_network.get_mut(&network) {
            Some((best_count, best)) => {
                warn!(
                    %network,
                    kept = %best.digest.to_hex(),
                    other = %digest.digest.to_hex(),
                    "[qc-18] Conflicting agreed config digests"
                );
                // Keys iterate in ascending digest order: only a strictly
                // higher count replaces the current pick.
                if count > *best_count {
                    *best_count = count;
                    *best = digest;
                }
            }
            None => {
                per_network.insert(network, (count, digest));
            }
        }
    }
    Ok(per_network.into_values().map(|(_, d)| d).collect())
}

/// A resolved transfer agreed by at least f+1 nodes, before the bridge
/// combines the per-node payloads.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolvedTransferGroup {
    /// Agreed transfer with medianized fee, date and stage. `bridge_data`
    /// is still the first voter's payload.
    pub transfer: Transfer,
    /// One payload per voting node.
    pub payloads: Vec<Vec<u8>>,
}

/// Group resolved transfers by everything but fee, date, stage and payload.
/// Groups with at least f+1 votes are kept; fee, date and stage are replaced
/// by their sorted middle. Result is sorted by the grouping key.
pub fn resolved_transfers_quorum(
    observations: &[Observation],
    f: usize,
) -> LiquidityManagerResult<Vec<ResolvedTransferGroup>> {
    ensure_quorum(observations, f)?;

    let mut groups: BTreeMap<ResolvedTransferKey, Vec<&Transfer>> = BTreeMap::new();
    for obs in observations {
        let mut voted = HashSet::new();
        for t in &obs.resolved_transfers {
            let key = t.resolved_key();
            if voted.insert(key) {
                groups.entry(key).or_default().push(t);
            }
        }
    }

    let mut result = Vec::new();
    for (_, votes) in groups {
        if votes.len() < bft(f) {
            continue;
        }
        let fees: Vec<U256> = votes.iter().map(|t| t.native_bridge_fee).collect();
        let dates: Vec<u64> = votes.iter().map(|t| t.date).collect();
        let stages: Vec<u32> = votes.iter().map(|t| t.stage).collect();

        let mut transfer = votes[0].clone();
        transfer.native_bridge_fee = big_int_sorted_middle(&fees).unwrap_or_default();
        transfer.date = sorted_middle(&dates).unwrap_or_default();
        transfer.stage = sorted_middle(&stages).unwrap_or_default();
        result.push(ResolvedTransferGroup {
            transfer,
            payloads: votes.iter().map(|t| t.bridge_data.clone()).collect(),
        });
    }
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::test_support::{pending, staged, transfer};
    use crate::domain::ConfigDigest;

    fn net(n: u64) -> NetworkSelector {
        NetworkSelector(n)
    }

    fn liq(pairs: &[(u64, u64)]) -> Observation {
        Observation {
            liquidity_per_chain: pairs
                .iter()
                .map(|(n, l)| NetworkLiquidity::new(net(*n), U256::from(*l)))
                .collect(),
            ..Default::default()
        }
    }

    fn with_edges(edges: &[(u64, u64)]) -> Observation {
        Observation {
            edges: edges.iter().map(|(a, b)| Edge::new(net(*a), net(*b))).collect(),
            ..Default::default()
        }
    }

    #[test]
    fn test_thresholds() {
        assert_eq!(quorum(0), 1);
        assert_eq!(quorum(1), 3);
        assert_eq!(quorum(2), 5);
        assert_eq!(bft(1), 2);
        assert_eq!(bft(2), 3);
    }

    #[test]
    fn test_sorted_middle() {
        let v = |xs: &[u64]| xs.iter().map(|x| U256::from(*x)).collect::<Vec<_>>();
        assert_eq!(big_int_sorted_middle(&v(&[1, 2, 3])), Some(U256::from(2)));
        assert_eq!(big_int_sorted_middle(&v(&[1, 2, 3, 4])), Some(U256::from(3)));
        assert_eq!(big_int_sorted_middle(&v(&[3, 1, 2])), Some(U256::from(2)));
        assert_eq!(big_int_sorted_middle(&[]), None);
    }

    #[test]
    fn test_sorted_middle_does_not_mutate_input() {
        let input = vec![U256::from(3), U256::from(1), U256::from(2)];
        let _ = big_int_sorted_middle(&input);
        assert_eq!(input, vec![U256::from(3), U256::from(1), U256::from(2)]);
    }

    #[test]
    fn test_every_aggregator_requires_quorum() {
        let obs = vec![Observation::default(); 2];
        assert!(median_liquidity_per_chain(&obs, 1).is_err());
        assert!(pending_transfers_consensus(&obs, 1).is_err());
        assert!(inflight_transfers_consensus(&obs, 1).is_err());
        assert!(graph_edges_consensus(&obs, 1).is_err());
        assert!(config_digests_consensus(&obs, 1).is_err());

        let err = graph_edges_consensus(&obs, 1).unwrap_err();
        assert!(matches!(
            err,
            LiquidityManagerError::InsufficientObservations { have: 2, need: 3 }
        ));
    }

    #[test]
    fn test_median_liquidity_unanimous() {
        let obs = vec![liq(&[(1, 100), (2, 200)]); 3];
        let result = median_liquidity_per_chain(&obs, 1).unwrap();
        assert_eq!(
            result,
            vec![
                NetworkLiquidity::new(net(1), U256::from(100)),
                NetworkLiquidity::new(net(2), U256::from(200)),
            ]
        );
    }

    #[test]
    fn test_median_liquidity_resists_one_outlier() {
        let obs = vec![
            liq(&[(1, 100)]),
            liq(&[(1, 101)]),
            liq(&[(1, u64::MAX)]),
        ];
        let result = median_liquidity_per_chain(&obs, 1).unwrap();
        assert_eq!(result, vec![NetworkLiquidity::new(net(1), U256::from(101))]);
    }

    #[test]
    fn test_median_liquidity_drops_underreported_network() {
        let obs = vec![liq(&[(1, 10), (9, 5)]), liq(&[(1, 10)]), liq(&[(1, 10)])];
        let result = median_liquidity_per_chain(&obs, 1).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].network, net(1));
    }

    #[test]
    fn test_median_liquidity_sorted_by_network() {
        let obs = vec![liq(&[(3, 1), (1, 1), (2, 1)]); 3];
        let nets: Vec<u64> = median_liquidity_per_chain(&obs, 1)
            .unwrap()
            .iter()
            .map(|l| l.network.0)
            .collect();
        assert_eq!(nets, vec![1, 2, 3]);
    }

    #[test]
    fn test_edges_consensus_drops_minority() {
        let obs = vec![
            with_edges(&[(1, 2), (2, 1)]),
            with_edges(&[(1, 2), (2, 1)]),
            with_edges(&[(1, 2), (1, 3)]),
        ];
        let edges = graph_edges_consensus(&obs, 1).unwrap();
        assert_eq!(edges, vec![Edge::new(net(1), net(2)), Edge::new(net(2), net(1))]);
    }

    #[test]
    fn test_duplicate_votes_within_one_observation_count_once() {
        let obs = vec![
            with_edges(&[(1, 3), (1, 3)]),
            Observation::default(),
            Observation::default(),
        ];
        assert!(graph_edges_consensus(&obs, 1).unwrap().is_empty());
    }

    #[test]
    fn test_pending_consensus_sorted_by_id() {
        let a = pending("b-id", 1, 2, 10, 0);
        let b = pending("a-id", 2, 1, 20, 0);
        let obs = vec![
            Observation {
                pending_transfers: vec![a.clone(), b.clone()],
                ..Default::default()
            };
            3
        ];
        let result = pending_transfers_consensus(&obs, 1).unwrap();
        assert_eq!(result, vec![b, a]);
    }

    #[test]
    fn test_pending_consensus_requires_identical_content() {
        let mut changed = pending("x", 1, 2, 10, 0);
        changed.transfer.stage = 1;
        let obs = vec![
            Observation {
                pending_transfers: vec![pending("x", 1, 2, 10, 0)],
                ..Default::default()
            },
            Observation {
                pending_transfers: vec![changed],
                ..Default::default()
            },
            Observation::default(),
        ];
        assert!(pending_transfers_consensus(&obs, 1).unwrap().is_empty());
    }

    #[test]
    fn test_inflight_consensus_keys_on_from_to_amount() {
        let obs = vec![
            Observation {
                inflight_transfers: vec![staged(2, 1, 5, 0), transfer(1, 2, 7)],
                ..Default::default()
            },
            Observation {
                inflight_transfers: vec![staged(2, 1, 5, 1)],
                ..Default::default()
            },
            Observation {
                inflight_transfers: vec![transfer(1, 3, 7)],
                ..Default::default()
            },
        ];
        let result = inflight_transfers_consensus(&obs, 1).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].from, net(2));
        assert_eq!(result[0].stage, 0);
    }

    #[test]
    fn test_config_digests_consensus() {
        let d = |n: u64, b: u8| ConfigDigestWithMeta::new(ConfigDigest([b; 32]), net(n));
        let obs = vec![
            Observation {
                config_digests: vec![d(2, 2), d(1, 1)],
                ..Default::default()
            },
            Observation {
                config_digests: vec![d(1, 1), d(2, 2)],
                ..Default::default()
            },
            Observation {
                config_digests: vec![d(1, 9)],
                ..Default::default()
            },
        ];
        let result = config_digests_consensus(&obs, 1).unwrap();
        assert_eq!(result, vec![d(1, 1), d(2, 2)]);
    }

    #[test]
    fn test_config_digests_split_rollover_picks_one() {
        let d = |b: u8| ConfigDigestWithMeta::new(ConfigDigest([b; 32]), net(1));
        let obs = |b: u8| Observation {
            config_digests: vec![d(b)],
            ..Default::default()
        };

        // 2/2 split with f = 1 and four observers: lowest digest wins.
        let split = vec![obs(2), obs(1), obs(2), obs(1)];
        assert_eq!(config_digests_consensus(&split, 1).unwrap(), vec![d(1)]);

        // Higher vote count beats lower bytes.
        let majority = vec![obs(1), obs(1), obs(2), obs(2), obs(2)];
        assert_eq!(config_digests_consensus(&majority, 1).unwrap(), vec![d(2)]);
    }

    #[test]
    fn test_config_digests_two_per_observation_with_f_zero() {
        let d = |b: u8| ConfigDigestWithMeta::new(ConfigDigest([b; 32]), net(1));
        let obs = vec![Observation {
            config_digests: vec![d(2), d(1)],
            ..Default::default()
        }];
        assert_eq!(config_digests_consensus(&obs, 0).unwrap(), vec![d(1)]);
    }

    #[test]
    fn test_single_vote_dropped_with_f_one() {
        let obs = vec![
            liq(&[(1, 10)]),
            Observation::default(),
            Observation::default(),
        ];
        assert!(median_liquidity_per_chain(&obs, 1).unwrap().is_empty());
    }

    #[test]
    fn test_resolved_quorum_medianizes_fee_date_stage() {
        let node = |fee: u64, date: u64, payload: u8| {
            let mut t = transfer(1, 2, 1000);
            t.native_bridge_fee = U256::from(fee);
            t.date = date;
            t.bridge_data = vec![payload];
            Observation {
                resolved_transfers: vec![t],
                ..Default::default()
            }
        };
        let obs = vec![node(10, 300, 1), node(30, 100, 1), node(20, 200, 2)];
        let groups = resolved_transfers_quorum(&obs, 1).unwrap();

        assert_eq!(groups.len(), 1);
        assert_eq!(groups[0].transfer.native_bridge_fee, U256::from(20));
        assert_eq!(groups[0].transfer.date, 200);
        assert_eq!(groups[0].payloads, vec![vec![1], vec![1], vec![2]]);
    }

    #[test]
    fn test_resolved_quorum_drops_minority_and_sorts() {
        let obs = vec![
            Observation {
                resolved_transfers: vec![transfer(2, 1, 5), transfer(1, 2, 5), transfer(1, 3, 5)],
                ..Default::default()
            },
            Observation {
                resolved_transfers: vec![transfer(1, 2, 5), transfer(2, 1, 5)],
                ..Default::default()
            },
            Observation::default(),
        ];
        let groups = resolved_transfers_quorum(&obs, 1).unwrap();
        let pairs: Vec<(u64, u64)> = groups
            .iter()
            .map(|g| (g.transfer.from.0, g.transfer.to.0))
            .collect();
        assert_eq!(pairs, vec![(1, 2), (2, 1)]);
    }
}
