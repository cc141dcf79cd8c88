//! Routing data as handed over by the flow-direction solver, and the entry
//! checks that run before any traversal.
//!
//! Only single-flow-direction routing is accepted. Multi-flow-direction output
//! arrives as [`Routing::Multiple`] and is always rejected, even when every
//! cell happens to carry a single receiver with proportion 1.

use crate::error::{TrackingError, ValidationError};

/// Index of a cell in `[0, N)`.
pub type CellId = usize;

/// Source-domain label of a cell.
pub type Label = u64;

#[derive(Debug, Clone, PartialEq)]
pub enum Routing {
    /// One receiver per cell; a sink is its own receiver.
    Single(Vec<CellId>),
    /// Per-cell receiver lists with matching flow proportions.
    Multiple {
        receivers: Vec<Vec<CellId>>,
        proportions: Vec<Vec<f64>>,
    },
}

impl Routing {
    pub fn cell_count(&self) -> usize {
        match self {
            Routing::Single(receivers) => receivers.len(),
            Routing::Multiple { receivers, .. } => receivers.len(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Routing::Single(_) => "single",
            Routing::Multiple { .. } => "multiple",
        }
    }
}

/// Rejects any routing that is not [`Routing::Single`].
pub fn validate_routing(routing: &Routing) -> Result<(), TrackingError> {
    single_receivers(routing).map(|_| ())
}

fn single_receivers(routing: &Routing) -> Result<&[CellId], TrackingError> {
    match routing {
        Routing::Single(receivers) => Ok(receivers),
        Routing::Multiple { receivers, .. } => {
            tracing::warn!(
                target: "source_tracking::routing",
                cells = receivers.len(),
                kind = routing.kind(),
                "routing.rejected=unsupported_kind"
            );
            Err(TrackingError::UnsupportedRoutingKind {
                cells: receivers.len(),
            })
        }
    }
}

/// Routing graph plus the per-cell core flag.
///
/// Non-core (boundary) cells may appear as receivers but never contribute a
/// label, never receive a composition, and do not pass flow further down.
#[derive(Debug, Clone, PartialEq)]
pub struct FlowNetwork {
    routing: Routing,
    core: Option<Vec<bool>>,
}

impl FlowNetwork {
    pub fn new(routing: Routing) -> Self {
        Self {
            routing,
            core: None,
        }
    }

    pub fn with_core_mask(mut self, mask: Vec<bool>) -> Self {
        self.core = Some(mask);
        self
    }

    pub fn routing(&self) -> &Routing {
        &self.routing
    }

    pub fn cell_count(&self) -> usize {
        self.routing.cell_count()
    }

    #[inline]
    pub fn is_core(&self, cell: CellId) -> bool {
        self.core
            .as_ref()
            .map_or(true, |mask| mask.get(cell).copied().unwrap_or(false))
    }

    /// Validated receiver table: routing kind first, then the core mask length,
    /// then receiver bounds.
    pub fn receivers(&self) -> Result<&[CellId], TrackingError> {
        let receivers = single_receivers(&self.routing)?;
        let cells = receivers.len();
        if let Some(mask) = &self.core {
            if mask.len() != cells {
                return Err(ValidationError::LengthMismatch {
                    field: "core mask",
                    expected: cells,
                    found: mask.len(),
                }
                .into());
            }
        }
        let out_of_range = receivers
            .iter()
            .enumerate()
            .find(|&(_, &receiver)| receiver >= cells);
        if let Some((cell, &receiver)) = out_of_range {
            tracing::warn!(
                target: "source_tracking::routing",
                cell,
                receiver,
                cells,
                "routing.rejected=receiver_out_of_range"
            );
            return Err(ValidationError::ReceiverOutOfRange {
                cell,
                receiver,
                cells,
            }
            .into());
        }
        Ok(receivers)
    }
}

impl From<Routing> for FlowNetwork {
    fn from(routing: Routing) -> Self {
        Self::new(routing)
    }
}

impl From<Vec<CellId>> for FlowNetwork {
    fn from(receivers: Vec<CellId>) -> Self {
        Self::new(Routing::Single(receivers))
    }
}

/// Checks one non-negative label per cell and converts them to [`Label`]s.
pub fn validate_labels(labels: &[i64], cells: usize) -> Result<Vec<Label>, TrackingError> {
    if labels.len() != cells {
        return Err(ValidationError::LengthMismatch {
            field: "source labels",
            expected: cells,
            found: labels.len(),
        }
        .into());
    }
    labels
        .iter()
        .enumerate()
        .map(|(cell, &label)| {
            Label::try_from(label).map_err(|_| {
                TrackingError::from(ValidationError::NegativeLabel { cell, label })
            })
        })
        .collect()
}
