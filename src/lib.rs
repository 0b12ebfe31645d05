pub mod atlas;
pub mod config;
pub mod feature_cache;
pub mod geometry;
pub mod io;
pub mod tracking;

pub use atlas::{KeyFrame, KeyFrameId, KeyFrameIdAllocator, Map};
pub use config::FrontendConfig;
pub use feature_cache::{CachedFeatureProvider, FeatureCache};
pub use tracking::Frame;
pub use tracking::frame::{ExtractionMode, FeatureError, FeatureSet, FeatureTriple};
