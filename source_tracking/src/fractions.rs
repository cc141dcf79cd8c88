//! Reduction of upstream compositions to unique labels and their shares of
//! accumulated flow.

use std::collections::BTreeMap;

use rayon::prelude::*;
use serde::Serialize;

use crate::{
    config::ParallelConfig,
    routing::{CellId, Label},
};

/// Distinct upstream labels of one cell mapped to `count / flow_accum`.
///
/// Compare two maps as sets of `(label, fraction)` pairs; iteration happens
/// to run in ascending label order but carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FractionMap {
    total: u32,
    fractions: BTreeMap<Label, f64>,
}

impl FractionMap {
    pub fn from_counts(counts: &BTreeMap<Label, u32>) -> Self {
        let total: u32 = counts.values().sum();
        if total == 0 {
            return Self::default();
        }
        let fractions = counts
            .iter()
            .map(|(&label, &count)| (label, f64::from(count) / f64::from(total)))
            .collect();
        Self { total, fractions }
    }

    pub fn from_labels(labels: &[Label]) -> Self {
        let mut counts = BTreeMap::new();
        for &label in labels {
            *counts.entry(label).or_insert(0u32) += 1;
        }
        Self::from_counts(&counts)
    }

    /// Number of upstream cells the fractions were taken over.
    pub fn total(&self) -> u32 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.fractions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fractions.is_empty()
    }

    pub fn unique_ids(&self) -> Vec<Label> {
        self.fractions.keys().copied().collect()
    }

    pub fn fractions(&self) -> Vec<f64> {
        self.fractions.values().copied().collect()
    }

    pub fn get(&self, label: Label) -> Option<f64> {
        self.fractions.get(&label).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (Label, f64)> + '_ {
        self.fractions.iter().map(|(&label, &fraction)| (label, fraction))
    }

    pub fn sum(&self) -> f64 {
        self.fractions.values().sum()
    }

    pub fn is_normalized(&self, tolerance: f64) -> bool {
        (self.sum() - 1.0).abs() <= tolerance
    }

    /// Fractions in ascending numeric order.
    pub fn sorted_fractions(&self) -> Vec<f64> {
        let mut values = self.fractions();
        values.sort_by(f64::total_cmp);
        values
    }

    pub fn as_map(&self) -> &BTreeMap<Label, f64> {
        &self.fractions
    }
}

pub fn find_unique_upstream_ids_and_fractions(
    hsd_upstr: &BTreeMap<CellId, Vec<Label>>,
) -> BTreeMap<CellId, FractionMap> {
    summarize(hsd_upstr, &ParallelConfig::default())
}

/// Same as [`find_unique_upstream_ids_and_fractions`] with explicit control
/// over the rayon fan-out.
pub fn summarize(
    hsd_upstr: &BTreeMap<CellId, Vec<Label>>,
    parallel: &ParallelConfig,
) -> BTreeMap<CellId, FractionMap> {
    let summary: BTreeMap<CellId, FractionMap> = if parallel.should_parallelize(hsd_upstr.len()) {
        hsd_upstr
            .par_iter()
            .map(|(&cell, labels)| (cell, FractionMap::from_labels(labels)))
            .collect::<Vec<_>>()
            .into_iter()
            .collect()
    } else {
        hsd_upstr
            .iter()
            .map(|(&cell, labels)| (cell, FractionMap::from_labels(labels)))
            .collect()
    };

    tracing::debug!(
        target: "source_tracking::fractions",
        cells = summary.len(),
        parallel = parallel.should_parallelize(hsd_upstr.len()),
        "fractions.summarized"
    );
    summary
}
