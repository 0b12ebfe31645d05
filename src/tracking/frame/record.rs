//! The frame record shared by transient frames and keyframes.
//!
//! `FrameRecord` holds everything a tracked image carries: identity, poses,
//! the grayscale raster and its pyramid, and the feature triple. `Frame` and
//! `KeyFrame` both embed one; promotion moves buffers from one record to the
//! other.

use std::sync::Arc;

use image::imageops::{self, FilterType};
use image::{GrayImage, Rgb};
use nalgebra::{DMatrix, Point2};
use tracing::debug;

use crate::atlas::map::KeyFrameId;
use crate::geometry::{SE3, SharedPose};

use super::features::{FeatureError, FeatureSet, FeatureTriple};
use super::grid::FeatureGrid;

/// Common per-image state of a frame or keyframe.
#[derive(Debug)]
pub struct FrameRecord {
    /// Unique key of the source image.
    pub image_name: String,
    /// Sequential id assigned at creation.
    pub image_id: u64,
    /// Parent keyframe for a transient frame, own id for a keyframe.
    pub(crate) keyframe_id: Option<KeyFrameId>,
    /// Frame-to-world pose, shared with the keyframe promoted from this frame.
    pub world_pose: SharedPose,
    /// Pose relative to the parent keyframe (identity for keyframes).
    pub relative_pose_to_keyframe: SE3,

    image: Option<Arc<GrayImage>>,
    /// Level 0 is `image` itself (same allocation).
    image_pyramid: Vec<Arc<GrayImage>>,

    features: Option<FeatureSet>,

    undistorted_points: Option<Vec<Point2<f64>>>,
    keypoints_by_cell: Option<FeatureGrid>,
}

impl FrameRecord {
    /// Fresh record: identity poses, no parent keyframe, no features.
    pub fn new(image_name: impl Into<String>, image_id: u64, image: Option<GrayImage>) -> Self {
        let image = image.map(Arc::new);
        let image_pyramid = image.iter().cloned().collect();
        Self {
            image_name: image_name.into(),
            image_id,
            keyframe_id: None,
            world_pose: SharedPose::identity(),
            relative_pose_to_keyframe: SE3::identity(),
            image,
            image_pyramid,
            features: None,
            undistorted_points: None,
            keypoints_by_cell: None,
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Identity
    // ─────────────────────────────────────────────────────────────────────────

    /// Keyframe id in raw form, `-1` when unset.
    pub fn keyframe_id(&self) -> i64 {
        KeyFrameId::to_raw(self.keyframe_id)
    }

    pub fn keyframe(&self) -> Option<KeyFrameId> {
        self.keyframe_id
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Image
    // ─────────────────────────────────────────────────────────────────────────

    pub fn image(&self) -> Option<&GrayImage> {
        self.image.as_deref()
    }

    pub fn has_image(&self) -> bool {
        self.image.is_some()
    }

    pub fn image_pyramid(&self) -> &[Arc<GrayImage>] {
        &self.image_pyramid
    }

    /// (width, height) of the raster, if still resident.
    pub fn image_size(&self) -> Option<(u32, u32)> {
        self.image.as_ref().map(|img| img.dimensions())
    }

    /// Rebuild the pyramid with `levels` levels, each `scale_factor` times
    /// smaller than the previous one. Stops early once a level would be
    /// empty or would not shrink. Returns the number of levels built.
    pub fn build_pyramid(&mut self, levels: usize, scale_factor: f64) -> usize {
        let Some(base) = self.image.clone() else {
            return 0;
        };
        let mut pyramid = vec![base];
        while pyramid.len() < levels.max(1) {
            let Some(prev) = pyramid.last() else { break };
            let w = (prev.width() as f64 / scale_factor).floor() as u32;
            let h = (prev.height() as f64 / scale_factor).floor() as u32;
            if w == 0 || h == 0 || (w >= prev.width() && h >= prev.height()) {
                break;
            }
            let next = imageops::resize(&**prev, w, h, FilterType::Triangle);
            pyramid.push(Arc::new(next));
        }

        self.image_pyramid = pyramid;
        self.image_pyramid.len()
    }

    pub(crate) fn take_image(&mut self) -> (Option<Arc<GrayImage>>, Vec<Arc<GrayImage>>) {
        (self.image.take(), std::mem::take(&mut self.image_pyramid))
    }

    pub(crate) fn put_image(&mut self, image: Option<Arc<GrayImage>>, pyramid: Vec<Arc<GrayImage>>) {
        self.image = image;
        self.image_pyramid = pyramid;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Features
    // ─────────────────────────────────────────────────────────────────────────

    /// True iff points, descriptors and colors are all present (and, by
    /// construction of [`FeatureSet`], equally long).
    pub fn has_features(&self) -> bool {
        self.features.is_some()
    }

    pub fn features(&self) -> Option<&FeatureSet> {
        self.features.as_ref()
    }

    pub fn num_features(&self) -> usize {
        self.features.as_ref().map_or(0, FeatureSet::len)
    }

    /// The (points, descriptors, colors) triple, or `None` without features.
    pub fn load_points_desc_colors(&self) -> Option<(&[Point2<f64>], &DMatrix<f32>, &[Rgb<u8>])> {
        self.features.as_ref().map(FeatureSet::as_triple)
    }

    /// Replace the feature data with `triple`.
    ///
    /// `None` clears the features. A triple with mismatched lengths is
    /// rejected; the record is then left without features.
    pub fn attach_features(&mut self, triple: Option<FeatureTriple>) -> Result<bool, FeatureError> {
        self.features = None;
        if let Some(triple) = triple {
            self.features = Some(FeatureSet::try_from(triple)?);
        }
        Ok(self.has_features())
    }

    pub(crate) fn set_feature_set(&mut self, features: Option<FeatureSet>) {
        self.features = features;
    }

    pub(crate) fn take_features(&mut self) -> Option<FeatureSet> {
        self.features.take()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Derived spatial data (owned by matching consumers)
    // ─────────────────────────────────────────────────────────────────────────

    pub fn undistorted_points(&self) -> Option<&[Point2<f64>]> {
        self.undistorted_points.as_deref()
    }

    /// Store undistorted coordinates, one per feature.
    pub fn set_undistorted_points(&mut self, points: Vec<Point2<f64>>) -> Result<(), FeatureError> {
        let expected = self.num_features();
        if points.len() != expected {
            return Err(FeatureError::UndistortedLengthMismatch {
                expected,
                got: points.len(),
            });
        }
        self.undistorted_points = Some(points);
        Ok(())
    }

    pub fn keypoints_by_cell(&self) -> Option<&FeatureGrid> {
        self.keypoints_by_cell.as_ref()
    }

    pub fn set_keypoints_by_cell(&mut self, grid: FeatureGrid) {
        self.keypoints_by_cell = Some(grid);
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Storage
    // ─────────────────────────────────────────────────────────────────────────

    /// Release the raster, its pyramid and the feature triple.
    ///
    /// Called by the storage component before the record is retained long
    /// term. Idempotent.
    pub fn prepare_for_storage(&mut self) {
        if self.holds_heavy_buffers() {
            debug!(
                "Releasing buffers of {} (id {}, {} features)",
                self.image_name,
                self.image_id,
                self.num_features()
            );
        }
        self.features = None;
        self.image = None;
        self.image_pyramid.clear();
    }

    /// Whether any buffer released by `prepare_for_storage` is still resident.
    pub fn holds_heavy_buffers(&self) -> bool {
        self.image.is_some() || !self.image_pyramid.is_empty() || self.features.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn triple(n: usize) -> FeatureTriple {
        FeatureTriple {
            points: (0..n).map(|i| Point2::new(i as f64, i as f64)).collect(),
            descriptors: DMatrix::from_element(n, 8, 0.5),
            colors: vec![Rgb([10, 20, 30]); n],
        }
    }

    #[test]
    fn test_new_record_defaults() {
        let record = FrameRecord::new("img_000.png", 0, Some(GrayImage::new(8, 6)));

        assert_eq!(record.keyframe_id(), -1);
        assert!(record.relative_pose_to_keyframe.is_identity(1e-12));
        assert!(record.world_pose.get().is_identity(1e-12));
        assert!(!record.has_features());
        assert_eq!(record.image_pyramid().len(), 1);
        assert!(Arc::ptr_eq(
            &record.image_pyramid()[0],
            record.image.as_ref().unwrap()
        ));
    }

    #[test]
    fn test_missing_image_gives_empty_pyramid() {
        let record = FrameRecord::new("missing.png", 3, None);
        assert!(!record.has_image());
        assert!(record.image_pyramid().is_empty());
    }

    #[test]
    fn test_attach_none_clears_features() {
        let mut record = FrameRecord::new("a", 0, None);
        assert!(record.attach_features(Some(triple(2))).unwrap());
        assert!(!record.attach_features(None).unwrap());
        assert!(record.load_points_desc_colors().is_none());
    }

    #[test]
    fn test_attach_mismatch_leaves_no_features() {
        let mut record = FrameRecord::new("a", 0, None);
        record.attach_features(Some(triple(2))).unwrap();

        let mut bad = triple(3);
        bad.colors.pop();
        assert!(record.attach_features(Some(bad)).is_err());
        assert!(!record.has_features());
    }

    #[test]
    fn test_prepare_for_storage_idempotent() {
        let mut record = FrameRecord::new("a", 0, Some(GrayImage::new(4, 4)));
        record.attach_features(Some(triple(4))).unwrap();
        assert!(record.holds_heavy_buffers());

        record.prepare_for_storage();
        assert!(!record.holds_heavy_buffers());
        assert!(!record.has_features());
        assert!(record.image().is_none());

        record.prepare_for_storage();
        assert!(!record.holds_heavy_buffers());
        assert_eq!(record.image_name, "a");
    }

    #[test]
    fn test_build_pyramid_levels() {
        let mut record = FrameRecord::new("a", 0, Some(GrayImage::new(64, 32)));
        let levels = record.build_pyramid(4, 2.0);

        assert_eq!(levels, 4);
        let sizes: Vec<_> = record.image_pyramid().iter().map(|l| l.dimensions()).collect();
        assert_eq!(sizes, vec![(64, 32), (32, 16), (16, 8), (8, 4)]);
    }

    #[test]
    fn test_build_pyramid_stops_at_empty_level() {
        let mut record = FrameRecord::new("a", 0, Some(GrayImage::new(2, 2)));
        assert_eq!(record.build_pyramid(8, 2.0), 2);
    }

    #[test]
    fn test_build_pyramid_without_downscale_keeps_base_only() {
        let mut record = FrameRecord::new("a", 0, Some(GrayImage::new(64, 64)));

        assert_eq!(record.build_pyramid(4, 1.0), 1);
        assert_eq!(record.build_pyramid(4, 0.5), 1);
        assert_eq!(record.image_pyramid()[0].dimensions(), (64, 64));
    }

    #[test]
    fn test_undistorted_points_length_checked() {
        let mut record = FrameRecord::new("a", 0, None);
        record.attach_features(Some(triple(2))).unwrap();

        assert!(record.set_undistorted_points(vec![Point2::origin()]).is_err());
        record
            .set_undistorted_points(vec![Point2::origin(), Point2::new(1.0, 1.0)])
            .unwrap();
        assert_eq!(record.undistorted_points().unwrap().len(), 2);
    }
}
