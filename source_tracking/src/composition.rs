//! Upstream compositions stored by reference instead of by copy.
//!
//! Every core cell is one immutable node: its own label plus the ids of its
//! core donors. A cell's composition is never copied into its receiver; it is
//! reached through the donor table and flattened only when asked for. Flow
//! accumulation is tracked as a running scalar so counts never force a
//! flatten.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::{
    ordering::DonorTable,
    routing::{CellId, Label},
};

/// Placement of a cell's own label relative to its donors' compositions.
///
/// The two orders produce exact reversals of each other.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompositionOrder {
    /// Donor compositions in descending donor id, then the cell's own label.
    #[default]
    UpstreamFirst,
    /// The cell's own label, then donor compositions in ascending donor id.
    SelfFirst,
}

#[derive(Debug, Clone)]
pub struct CompositionStore {
    labels: Vec<Label>,
    core: Vec<bool>,
    donors: DonorTable,
    accum: Vec<u32>,
    order: CompositionOrder,
}

impl CompositionStore {
    /// Builds the store walking `order`, which must place donors first.
    ///
    /// Work is linear in cells plus edges.
    pub fn build(
        labels: Vec<Label>,
        core: Vec<bool>,
        donors: DonorTable,
        order: &[CellId],
        composition_order: CompositionOrder,
    ) -> Self {
        debug_assert_eq!(labels.len(), core.len());
        debug_assert_eq!(labels.len(), donors.cell_count());

        let mut accum = vec![0u32; labels.len()];
        for &cell in order {
            if !core[cell] {
                continue;
            }
            let upstream: u32 = donors.donors(cell).iter().map(|&d| accum[d]).sum();
            accum[cell] = upstream + 1;
        }

        Self {
            labels,
            core,
            donors,
            accum,
            order: composition_order,
        }
    }

    pub fn cell_count(&self) -> usize {
        self.labels.len()
    }

    pub fn composition_order(&self) -> CompositionOrder {
        self.order
    }

    #[inline]
    pub fn contains(&self, cell: CellId) -> bool {
        self.core.get(cell).copied().unwrap_or(false)
    }

    #[inline]
    pub fn label(&self, cell: CellId) -> Label {
        self.labels[cell]
    }

    #[inline]
    pub fn donors(&self, cell: CellId) -> &[CellId] {
        self.donors.donors(cell)
    }

    pub fn flow_accum(&self, cell: CellId) -> Option<u32> {
        self.contains(cell).then(|| self.accum[cell])
    }

    /// Flattened composition of `cell`, or `None` for non-core cells.
    pub fn flatten(&self, cell: CellId) -> Option<Vec<Label>> {
        if !self.contains(cell) {
            return None;
        }
        let mut sequence = Vec::with_capacity(self.accum[cell] as usize);
        self.for_each_self_first(cell, |label| sequence.push(label));
        if self.order == CompositionOrder::UpstreamFirst {
            sequence.reverse();
        }
        Some(sequence)
    }

    /// Per-label counts for `cell` without materializing its sequence.
    pub fn label_counts(&self, cell: CellId) -> Option<BTreeMap<Label, u32>> {
        if !self.contains(cell) {
            return None;
        }
        let mut counts = BTreeMap::new();
        self.for_each_self_first(cell, |label| *counts.entry(label).or_insert(0) += 1);
        Some(counts)
    }

    // Iterative preorder, smallest donor first; reversing it gives the
    // upstream-first order.
    fn for_each_self_first<F>(&self, cell: CellId, mut visit: F)
    where
        F: FnMut(Label),
    {
        let mut stack = vec![cell];
        while let Some(current) = stack.pop() {
            visit(self.labels[current]);
            stack.extend(self.donors.donors(current).iter().rev());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // 0 -> 2, 1 -> 2, 2 -> 3, 3 sink
    fn store(order: CompositionOrder) -> CompositionStore {
        let receivers = vec![2, 2, 3, 3];
        let donors = DonorTable::from_receivers(&receivers, |_, _| true);
        CompositionStore::build(
            vec![10, 11, 12, 13],
            vec![true; 4],
            donors,
            &[0, 1, 2, 3],
            order,
        )
    }

    #[test]
    fn upstream_first_puts_larger_donors_first_and_self_last() {
        let store = store(CompositionOrder::UpstreamFirst);
        assert_eq!(store.flatten(2), Some(vec![11, 10, 12]));
        assert_eq!(store.flatten(3), Some(vec![11, 10, 12, 13]));
        assert_eq!(store.flatten(0), Some(vec![10]));
    }

    #[test]
    fn self_first_is_the_reverse() {
        let store = store(CompositionOrder::SelfFirst);
        assert_eq!(store.flatten(3), Some(vec![13, 12, 10, 11]));
    }

    #[test]
    fn accumulation_matches_sequence_length() {
        let store = store(CompositionOrder::UpstreamFirst);
        for cell in 0..store.cell_count() {
            let len = store.flatten(cell).unwrap().len() as u32;
            assert_eq!(store.flow_accum(cell), Some(len));
        }
    }

    #[test]
    fn counts_without_flattening() {
        let receivers = vec![2, 2, 2];
        let donors = DonorTable::from_receivers(&receivers, |_, _| true);
        let store = CompositionStore::build(
            vec![4, 7, 4],
            vec![true; 3],
            donors,
            &[0, 1, 2],
            CompositionOrder::UpstreamFirst,
        );
        let counts = store.label_counts(2).unwrap();
        assert_eq!(counts.get(&4), Some(&2));
        assert_eq!(counts.get(&7), Some(&1));
    }

    #[test]
    fn non_core_cells_have_no_composition() {
        let receivers = vec![1, 1];
        let core = vec![true, false];
        let donors = DonorTable::from_receivers(&receivers, |d, r| core[d] && core[r]);
        let store = CompositionStore::build(
            vec![1, 2],
            core.clone(),
            donors,
            &[0, 1],
            CompositionOrder::UpstreamFirst,
        );
        assert_eq!(store.flatten(0), Some(vec![1]));
        assert_eq!(store.flatten(1), None);
        assert_eq!(store.flow_accum(1), None);
        assert_eq!(store.label_counts(1), None);
    }
}
