//! Donor-before-receiver ordering over the routing forest.

use std::{cmp::Reverse, collections::BinaryHeap};

use crate::{
    error::TrackingError,
    routing::{CellId, FlowNetwork},
};

/// Orders every cell after all of its donors.
///
/// Kahn traversal over the reversed routing graph. Among cells that are ready
/// at the same time the smallest cell id is taken first, so the order is fully
/// determined by the receiver table. A sink's self-loop is not a dependency.
pub fn topological_order(network: &FlowNetwork) -> Result<Vec<CellId>, TrackingError> {
    let receivers = network.receivers()?;
    order_receivers(receivers)
}

pub(crate) fn order_receivers(receivers: &[CellId]) -> Result<Vec<CellId>, TrackingError> {
    let cells = receivers.len();
    let mut pending = vec![0u32; cells];
    for (cell, &receiver) in receivers.iter().enumerate() {
        if receiver != cell {
            pending[receiver] += 1;
        }
    }

    let mut ready: BinaryHeap<Reverse<CellId>> = pending
        .iter()
        .enumerate()
        .filter(|&(_, &count)| count == 0)
        .map(|(cell, _)| Reverse(cell))
        .collect();
    let heads = ready.len();

    let mut order = Vec::with_capacity(cells);
    while let Some(Reverse(cell)) = ready.pop() {
        order.push(cell);
        let receiver = receivers[cell];
        if receiver == cell {
            continue;
        }
        pending[receiver] -= 1;
        if pending[receiver] == 0 {
            ready.push(Reverse(receiver));
        }
    }

    if order.len() != cells {
        tracing::warn!(
            target: "source_tracking::ordering",
            ordered = order.len(),
            cells,
            "ordering.failed=cycle"
        );
        return Err(TrackingError::MalformedRoutingGraph {
            ordered: order.len(),
            cells,
        });
    }

    tracing::debug!(
        target: "source_tracking::ordering",
        cells,
        heads,
        "ordering.complete"
    );
    Ok(order)
}

/// Donor lists for every cell in compressed form, each list ascending.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DonorTable {
    offsets: Vec<usize>,
    donors: Vec<CellId>,
}

impl DonorTable {
    /// Builds the table, skipping self-loops and any edge rejected by `keep`.
    pub fn from_receivers<F>(receivers: &[CellId], mut keep: F) -> Self
    where
        F: FnMut(CellId, CellId) -> bool,
    {
        let cells = receivers.len();
        let mut offsets = vec![0usize; cells + 1];
        for (cell, &receiver) in receivers.iter().enumerate() {
            if receiver != cell && keep(cell, receiver) {
                offsets[receiver + 1] += 1;
            }
        }
        for idx in 0..cells {
            offsets[idx + 1] += offsets[idx];
        }

        let mut cursor = offsets.clone();
        let mut donors = vec![0; offsets[cells]];
        for (cell, &receiver) in receivers.iter().enumerate() {
            if receiver != cell && keep(cell, receiver) {
                donors[cursor[receiver]] = cell;
                cursor[receiver] += 1;
            }
        }

        Self { offsets, donors }
    }

    #[inline]
    pub fn donors(&self, cell: CellId) -> &[CellId] {
        &self.donors[self.offsets[cell]..self.offsets[cell + 1]]
    }

    pub fn cell_count(&self) -> usize {
        self.offsets.len() - 1
    }

    pub fn edge_count(&self) -> usize {
        self.donors.len()
    }
}
