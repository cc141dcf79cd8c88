//! Upstream composition tracking over a validated routing forest.

use std::collections::BTreeMap;

use rayon::prelude::*;

use crate::{
    composition::CompositionStore,
    config::{ParallelConfig, SourceTrackingConfig},
    error::TrackingError,
    fractions::FractionMap,
    ordering::{order_receivers, DonorTable},
    routing::{validate_labels, CellId, FlowNetwork, Label},
};

#[derive(Debug, Clone, Default)]
pub struct SourceTracker {
    config: SourceTrackingConfig,
}

impl SourceTracker {
    pub fn new(config: SourceTrackingConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &SourceTrackingConfig {
        &self.config
    }

    /// Validates the inputs, orders the cells and builds every core cell's
    /// composition node.
    ///
    /// Checks run routing kind first, then lengths and bounds, then labels,
    /// then acyclicity; nothing is built if any of them fails.
    pub fn trace(
        &self,
        network: &FlowNetwork,
        labels: &[i64],
    ) -> Result<SourceTrace, TrackingError> {
        let receivers = network.receivers()?;
        let cells = receivers.len();
        let labels = validate_labels(labels, cells)?;
        let order = order_receivers(receivers)?;

        let core: Vec<bool> = (0..cells).map(|cell| network.is_core(cell)).collect();
        let terminals = (0..cells)
            .filter(|&cell| core[cell] && (receivers[cell] == cell || !core[receivers[cell]]))
            .count();
        let donors = DonorTable::from_receivers(receivers, |donor, receiver| {
            core[donor] && core[receiver]
        });
        let edges = donors.edge_count();
        let store =
            CompositionStore::build(labels, core, donors, &order, self.config.composition.order);

        let trace = SourceTrace {
            store,
            order,
            parallel: self.config.parallel.clone(),
            tolerance: self.config.fractions.tolerance,
        };
        tracing::info!(
            target: "source_tracking::tracker",
            cells,
            core_cells = trace.cells().count(),
            edges,
            terminals,
            max_accum = trace.max_flow_accum(),
            order = ?trace.store.composition_order(),
            "source_tracking.traced"
        );
        Ok(trace)
    }
}

/// Result of one tracking pass. Compositions stay shared until asked for.
#[derive(Debug, Clone)]
pub struct SourceTrace {
    store: CompositionStore,
    order: Vec<CellId>,
    parallel: ParallelConfig,
    tolerance: f64,
}

impl SourceTrace {
    pub fn cell_count(&self) -> usize {
        self.store.cell_count()
    }

    /// Processing order used to build the compositions.
    pub fn order(&self) -> &[CellId] {
        &self.order
    }

    /// Core cells in ascending id; these are the cells with results.
    pub fn cells(&self) -> impl Iterator<Item = CellId> + '_ {
        (0..self.store.cell_count()).filter(|&cell| self.store.contains(cell))
    }

    pub fn composition(&self, cell: CellId) -> Option<Vec<Label>> {
        self.store.flatten(cell)
    }

    pub fn flow_accum(&self, cell: CellId) -> Option<u32> {
        self.store.flow_accum(cell)
    }

    pub fn label_counts(&self, cell: CellId) -> Option<BTreeMap<Label, u32>> {
        self.store.label_counts(cell)
    }

    /// Core donors of `cell`, ascending.
    pub fn donors(&self, cell: CellId) -> &[CellId] {
        self.store.donors(cell)
    }

    pub fn max_flow_accum(&self) -> u32 {
        self.cells()
            .filter_map(|cell| self.store.flow_accum(cell))
            .max()
            .unwrap_or(0)
    }

    /// Flattens every core cell's composition (`hsd_upstr`).
    pub fn upstream_compositions(&self) -> BTreeMap<CellId, Vec<Label>> {
        let cells: Vec<CellId> = self.cells().collect();
        if self.parallel.should_parallelize(cells.len()) {
            cells
                .into_par_iter()
                .filter_map(|cell| self.store.flatten(cell).map(|seq| (cell, seq)))
                .collect::<Vec<_>>()
                .into_iter()
                .collect()
        } else {
            cells
                .into_iter()
                .filter_map(|cell| self.store.flatten(cell).map(|seq| (cell, seq)))
                .collect()
        }
    }

    pub fn flow_accumulation(&self) -> BTreeMap<CellId, u32> {
        self.cells()
            .filter_map(|cell| self.store.flow_accum(cell).map(|accum| (cell, accum)))
            .collect()
    }

    /// Fraction maps for every core cell, merged from donor counts along the
    /// processing order so no composition is ever flattened.
    pub fn unique_fractions(&self) -> BTreeMap<CellId, FractionMap> {
        let mut counts: Vec<Option<BTreeMap<Label, u32>>> = vec![None; self.cell_count()];
        for &cell in &self.order {
            if !self.store.contains(cell) {
                continue;
            }
            let mut merged = BTreeMap::new();
            *merged.entry(self.store.label(cell)).or_insert(0u32) += 1;
            for &donor in self.store.donors(cell) {
                if let Some(upstream) = &counts[donor] {
                    for (&label, &count) in upstream {
                        *merged.entry(label).or_insert(0) += count;
                    }
                }
            }
            counts[cell] = Some(merged);
        }

        let summary: BTreeMap<CellId, FractionMap> = counts
            .iter()
            .enumerate()
            .filter_map(|(cell, counts)| {
                counts
                    .as_ref()
                    .map(|counts| (cell, FractionMap::from_counts(counts)))
            })
            .collect();
        let unnormalized = summary
            .values()
            .filter(|map| !map.is_normalized(self.tolerance))
            .count();
        if unnormalized > 0 {
            tracing::warn!(
                target: "source_tracking::fractions",
                unnormalized,
                tolerance = self.tolerance,
                "fractions.sum_out_of_tolerance"
            );
        }
        tracing::debug!(
            target: "source_tracking::fractions",
            cells = summary.len(),
            "fractions.merged_incrementally"
        );
        summary
    }
}

/// Runs a tracking pass with the default configuration and returns
/// `(hsd_upstr, flow_accum)` keyed by core cell.
pub fn track_source(
    network: &FlowNetwork,
    labels: &[i64],
) -> Result<(BTreeMap<CellId, Vec<Label>>, BTreeMap<CellId, u32>), TrackingError> {
    let trace = SourceTracker::default().trace(network, labels)?;
    Ok((trace.upstream_compositions(), trace.flow_accumulation()))
}
