//! Upstream source tracking over single-flow-direction drainage networks.
//!
//! For every cell of a routing forest the crate records which source-domain
//! labels drain into it, how many cells that is (flow accumulation), and what
//! fraction of the accumulated flow each distinct label accounts for.
//!
//! The pass runs validation → ordering → composition → summarization:
//! [`validate_routing`], [`topological_order`], [`track_source`] and
//! [`find_unique_upstream_ids_and_fractions`]. [`SourceTracker`] exposes the
//! same pass with configuration and keeps compositions shared until they are
//! requested.

pub mod composition;
pub mod config;
pub mod d8;
mod error;
pub mod fractions;
pub mod hashing;
pub mod ordering;
pub mod routing;
mod tracker;

pub use composition::{CompositionOrder, CompositionStore};
pub use config::{
    load_config_from_env, CompositionConfig, ConfigError, ConfigSource, FractionConfig,
    ParallelConfig, SourceTrackingConfig,
};
pub use error::{TrackingError, ValidationError};
pub use fractions::{find_unique_upstream_ids_and_fractions, summarize, FractionMap};
pub use hashing::{composition_digest, FnvHasher};
pub use ordering::{topological_order, DonorTable};
pub use routing::{validate_labels, validate_routing, CellId, FlowNetwork, Label, Routing};
pub use tracker::{track_source, SourceTrace, SourceTracker};
