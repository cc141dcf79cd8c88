use thiserror::Error;

use crate::routing::CellId;

/// Error returned by every source-tracking entry point.
///
/// All variants are raised synchronously before or during the single pass and
/// none of them leaves partial output behind.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TrackingError {
    #[error("multi-receiver routing over {cells} cells is not supported")]
    UnsupportedRoutingKind { cells: usize },
    #[error("routing graph contains a cycle: only {ordered} of {cells} cells could be ordered")]
    MalformedRoutingGraph { ordered: usize, cells: usize },
    #[error(transparent)]
    Validation(#[from] ValidationError),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("{field} has {found} entries but the network has {expected} cells")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("cell {cell} has negative source label {label}")]
    NegativeLabel { cell: CellId, label: i64 },
    #[error("cell {cell} drains to {receiver}, outside a network of {cells} cells")]
    ReceiverOutOfRange {
        cell: CellId,
        receiver: CellId,
        cells: usize,
    },
    #[error("cell {cell} carries invalid D8 direction code {code}")]
    InvalidDirectionCode { cell: CellId, code: i32 },
}
