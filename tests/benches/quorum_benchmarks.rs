//! # Liquidity Manager Benchmarks
//!
//! | Area | Operation | Scale |
//! |------|-----------|-------|
//! | Aggregation | median liquidity per chain | 3f+1 nodes, 32 networks |
//! | Aggregation | pending transfer consensus (hashing) | 3f+1 nodes, 64 transfers |
//! | In-flight | add / expire / lookup | 1k transfers |

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use primitive_types::U256;
use std::time::Duration;

use qc_18_liquidity_manager::algorithms::{
    median_liquidity_per_chain, pending_transfers_consensus,
};
use qc_18_liquidity_manager::{
    Address, InflightContainer, NetworkLiquidity, NetworkSelector, Observation, PendingTransfer,
    Transfer, TransferStatus,
};

fn transfer(from: u64, to: u64, amount: u64, stage: u32) -> Transfer {
    Transfer {
        from: NetworkSelector(from),
        to: NetworkSelector(to),
        amount: U256::from(amount),
        sender: Address([from as u8; 20]),
        receiver: Address([to as u8; 20]),
        local_token_address: Address([0xA0; 20]),
        remote_token_address: Address([0xA1; 20]),
        bridge_data: vec![0u8; 64],
        native_bridge_fee: U256::from(1_000),
        date: 1_700_000_000,
        stage,
    }
}

fn observations(nodes: usize, networks: u64, transfers: u64) -> Vec<Observation> {
    (0..nodes)
        .map(|node| Observation {
            liquidity_per_chain: (0..networks)
                .map(|n| {
                    NetworkLiquidity::new(NetworkSelector(n), U256::from(n * 1_000 + node as u64))
                })
                .collect(),
            pending_transfers: (0..transfers)
                .map(|i| {
                    PendingTransfer::new(
                        transfer(i % networks, (i + 1) % networks, i, 0),
                        TransferStatus::Ready,
                        format!("tx-{i}"),
                    )
                })
                .collect(),
            ..Default::default()
        })
        .collect()
}

// ============================================================================
// Aggregation
// ============================================================================

fn bench_aggregation(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-aggregation");
    group.measurement_time(Duration::from_secs(5));

    for f in [1usize, 3, 7] {
        let nodes = 3 * f + 1;
        let obs = observations(nodes, 32, 64);
        group.throughput(Throughput::Elements(nodes as u64));

        group.bench_with_input(BenchmarkId::new("median_liquidity", nodes), &obs, |b, obs| {
            b.iter(|| black_box(median_liquidity_per_chain(obs, f).is_ok()))
        });
        group.bench_with_input(BenchmarkId::new("pending_consensus", nodes), &obs, |b, obs| {
            b.iter(|| black_box(pending_transfers_consensus(obs, f).is_ok()))
        });
    }
    group.finish();
}

// ============================================================================
// In-flight tracking
// ============================================================================

fn bench_inflight(c: &mut Criterion) {
    let mut group = c.benchmark_group("qc-18-inflight");

    let transfers: Vec<Transfer> = (0..1_000).map(|i| transfer(1, 2, i, 0)).collect();
    let advanced: Vec<PendingTransfer> = (0..1_000)
        .map(|i| {
            PendingTransfer::new(transfer(1, 2, i, 1), TransferStatus::Ready, format!("tx-{i}"))
        })
        .collect();

    group.throughput(Throughput::Elements(transfers.len() as u64));
    group.bench_function("add_then_expire_1k", |b| {
        b.iter(|| {
            let container = InflightContainer::new();
            for t in &transfers {
                container.add(t.clone());
            }
            black_box(container.expire(&advanced))
        })
    });

    let container = InflightContainer::new();
    for t in &transfers {
        container.add(t.clone());
    }
    group.bench_function("is_inflight_lookup", |b| {
        b.iter(|| black_box(container.is_inflight(&transfers[500])))
    });
    group.finish();
}

criterion_group!(benches, bench_aggregation, bench_inflight);
criterion_main!(benches);
