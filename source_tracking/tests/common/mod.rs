#![allow(dead_code)]

use rand::{seq::SliceRandom, Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use source_tracking::{CellId, FlowNetwork, Routing};

/// 5x5 raster whose two outlets (cells 10 and 14) sit on the left and right
/// edges. Every other perimeter cell is a closed boundary sink.
pub fn five_by_five_network() -> FlowNetwork {
    let mut receivers: Vec<CellId> = (0..25).collect();
    for (cell, receiver) in [
        (6, 10),
        (7, 8),
        (8, 14),
        (11, 10),
        (12, 8),
        (13, 14),
        (16, 10),
        (17, 18),
        (18, 14),
    ] {
        receivers[cell] = receiver;
    }
    let core = (0..25)
        .map(|cell| matches!(cell, 6..=8 | 10..=14 | 16..=18))
        .collect();
    FlowNetwork::new(Routing::Single(receivers)).with_core_mask(core)
}

pub fn five_by_five_labels() -> Vec<i64> {
    (0..25)
        .map(|cell| if matches!(cell, 2..=4 | 7..=9) { 0 } else { 1 })
        .collect()
}

/// Random single-receiver forest with shuffled cell ids.
pub fn random_forest(seed: u64, cells: usize, label_count: i64) -> (FlowNetwork, Vec<i64>) {
    let mut rng = ChaCha8Rng::seed_from_u64(seed);
    let mut ids: Vec<CellId> = (0..cells).collect();
    ids.shuffle(&mut rng);

    // ids[i] drains to some ids[j] with j < i, or is a sink.
    let mut receivers = vec![0; cells];
    for position in 0..cells {
        let cell = ids[position];
        receivers[cell] = if position == 0 || rng.gen_bool(0.05) {
            cell
        } else {
            ids[rng.gen_range(0..position)]
        };
    }
    let labels = (0..cells).map(|_| rng.gen_range(0..label_count)).collect();
    (FlowNetwork::new(Routing::Single(receivers)), labels)
}
