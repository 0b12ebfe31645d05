//! Collaborator interfaces used to attach feature data to a frame.
//!
//! Detection/description algorithms and cache internals live outside the
//! frame lifecycle; frames only talk to them through these traits.

use image::GrayImage;

use super::features::FeatureTriple;

/// How `Frame::extract_features` obtains its feature data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExtractionMode {
    /// Load previously computed features (masked) from the cache.
    #[default]
    Cache,
    /// Run the extractor on the raw image.
    Extract,
}

/// Computes features directly from an image.
pub trait FeatureExtractor {
    /// Returns `None` when nothing could be extracted. Must not touch shared
    /// state.
    fn extract(&self, image_name: &str, image: Option<&GrayImage>) -> Option<FeatureTriple>;
}

impl<F> FeatureExtractor for F
where
    F: Fn(&str, Option<&GrayImage>) -> Option<FeatureTriple>,
{
    fn extract(&self, image_name: &str, image: Option<&GrayImage>) -> Option<FeatureTriple> {
        self(image_name, image)
    }
}

/// Source of feature data for both attachment modes.
pub trait FeatureProvider {
    /// Fresh extraction on the raw image.
    fn extract(&self, image_name: &str, image: Option<&GrayImage>) -> Option<FeatureTriple>;

    /// Previously computed features for `image_name`; with `masked` set only
    /// features in valid image regions are returned. `None` on a cache miss.
    fn load_cached(&self, image_name: &str, masked: bool) -> Option<FeatureTriple>;
}
