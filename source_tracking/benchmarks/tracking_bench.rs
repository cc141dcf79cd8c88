use criterion::{criterion_group, criterion_main, BatchSize, BenchmarkId, Criterion};
use source_tracking::{CellId, FlowNetwork, SourceTracker};

/// Every cell drains into the next one; the last cell is the outlet.
fn long_channel(cells: usize) -> (FlowNetwork, Vec<i64>) {
    let receivers: Vec<CellId> = (0..cells).map(|cell| (cell + 1).min(cells - 1)).collect();
    let labels = (0..cells).map(|cell| (cell % 3) as i64).collect();
    (FlowNetwork::from(receivers), labels)
}

/// Heap-shaped binary tree draining to cell 0.
fn binary_tree(cells: usize) -> (FlowNetwork, Vec<i64>) {
    let receivers: Vec<CellId> = (0..cells)
        .map(|cell| if cell == 0 { 0 } else { (cell - 1) / 2 })
        .collect();
    let labels = (0..cells).map(|cell| (cell % 5) as i64).collect();
    (FlowNetwork::from(receivers), labels)
}

fn bench_tracking(c: &mut Criterion) {
    let mut group = c.benchmark_group("source_tracking");
    let tracker = SourceTracker::default();

    for size in [1_000usize, 10_000, 100_000] {
        group.bench_with_input(BenchmarkId::new("channel_trace", size), &size, |b, &size| {
            b.iter_batched(
                || long_channel(size),
                |(network, labels)| tracker.trace(&network, &labels),
                BatchSize::SmallInput,
            );
        });

        group.bench_with_input(BenchmarkId::new("tree_trace", size), &size, |b, &size| {
            b.iter_batched(
                || binary_tree(size),
                |(network, labels)| tracker.trace(&network, &labels),
                BatchSize::SmallInput,
            );
        });

        group.bench_with_input(
            BenchmarkId::new("tree_unique_fractions", size),
            &size,
            |b, &size| {
                let (network, labels) = binary_tree(size);
                let trace = tracker
                    .trace(&network, &labels)
                    .expect("binary tree is a valid forest");
                b.iter(|| trace.unique_fractions());
            },
        );
    }

    group.finish();
}

criterion_group!(tracking_benches, bench_tracking);
criterion_main!(tracking_benches);
