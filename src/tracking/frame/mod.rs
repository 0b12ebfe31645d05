//! Frame-level data: the shared frame record, feature containers, the
//! per-frame spatial grid and the collaborator traits used to fill them.

pub mod features;
pub mod grid;
pub mod provider;
pub mod record;

pub use features::{FeatureError, FeatureSet, FeatureTriple};
pub use grid::FeatureGrid;
pub use provider::{ExtractionMode, FeatureExtractor, FeatureProvider};
pub use record::FrameRecord;
