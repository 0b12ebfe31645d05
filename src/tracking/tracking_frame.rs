//! Tracking `Frame` representation.
//!
//! A `Frame` is created for every incoming image and is the unit of work for
//! tracking. It owns the raster, the feature triple and the pose estimates
//! until it is either promoted to a [`KeyFrame`](crate::atlas::KeyFrame)
//! (which takes the buffers) or handed to storage (which releases them).

use image::{GrayImage, Rgb};
use nalgebra::{DMatrix, Point2};
use tracing::{debug, warn};

use crate::atlas::map::KeyFrameId;
use crate::config::{FeatureCacheParams, GridParams, PyramidParams};
use crate::geometry::{SE3, SharedPose};
use crate::io::ImageSource;
use crate::tracking::frame::{
    ExtractionMode, FeatureError, FeatureGrid, FeatureProvider, FrameRecord,
};

/// A frame being tracked (not a KeyFrame).
#[derive(Debug)]
pub struct Frame {
    record: FrameRecord,
}

impl Frame {
    /// Create the working record for image `name`.
    ///
    /// The grayscale raster is loaded through `images`. A failed load is not
    /// fatal: the frame simply has no raster.
    pub fn new(name: impl Into<String>, id: u64, images: &dyn ImageSource) -> Self {
        let name = name.into();
        let image = match images.load_gray(&name) {
            Ok(image) => Some(image),
            Err(e) => {
                warn!("Could not load image {}: {:#}", name, e);
                None
            }
        };
        Self::from_image(name, id, image)
    }

    /// Create a frame from an already decoded raster.
    pub fn from_image(name: impl Into<String>, id: u64, image: Option<GrayImage>) -> Self {
        Self {
            record: FrameRecord::new(name, id, image),
        }
    }

    /// Attach points, descriptors and colors.
    ///
    /// In [`ExtractionMode::Cache`] the features are loaded (masked) from the
    /// provider's cache; in [`ExtractionMode::Extract`] they are computed on
    /// the raw image. An empty result is not an error: check the returned
    /// flag (or `has_features`). Inconsistent lengths are rejected and leave
    /// the frame without features.
    pub fn extract_features(
        &mut self,
        provider: &dyn FeatureProvider,
        mode: ExtractionMode,
    ) -> Result<bool, FeatureError> {
        self.extract_features_with(provider, mode, &FeatureCacheParams::default())
    }

    /// Like [`Frame::extract_features`], with cache loads masked according
    /// to `params.masked_loads`.
    pub fn extract_features_with(
        &mut self,
        provider: &dyn FeatureProvider,
        mode: ExtractionMode,
        params: &FeatureCacheParams,
    ) -> Result<bool, FeatureError> {
        let name = self.record.image_name.as_str();
        let triple = match mode {
            ExtractionMode::Extract => provider.extract(name, self.record.image()),
            ExtractionMode::Cache => provider.load_cached(name, params.masked_loads),
        };

        let has_features = self.record.attach_features(triple).inspect_err(|e| {
            warn!("Rejected features for {}: {}", self.record.image_name, e);
        })?;

        debug!(
            "Frame {} ({:?}): {} features",
            self.record.image_id,
            mode,
            self.record.num_features()
        );
        Ok(has_features)
    }

    /// The (points, descriptors, colors) triple, or `None` without features.
    pub fn load_points_desc_colors(&self) -> Option<(&[Point2<f64>], &DMatrix<f32>, &[Rgb<u8>])> {
        self.record.load_points_desc_colors()
    }

    /// Release the image and feature buffers. Idempotent.
    pub fn prepare_for_storage(&mut self) {
        self.record.prepare_for_storage();
    }

    /// Chain this frame to its parent keyframe.
    pub fn set_parent_keyframe(&mut self, parent: KeyFrameId, relative_pose: SE3) {
        self.record.keyframe_id = Some(parent);
        self.record.relative_pose_to_keyframe = relative_pose;
    }

    /// Rebuild the image pyramid from the configured levels and scale.
    pub fn build_pyramid(&mut self, params: &PyramidParams) -> usize {
        self.record.build_pyramid(params.levels, params.scale_factor)
    }

    /// Bucket the current feature points into a spatial grid and store it as
    /// `keypoints_by_cell`. Returns false when there is no raster or no
    /// features to index.
    pub fn assign_grid(&mut self, params: &GridParams) -> bool {
        let (Some((w, h)), Some(features)) = (self.record.image_size(), self.record.features())
        else {
            return false;
        };
        let grid = FeatureGrid::new(features.points(), w as f64, h as f64, params.cols, params.rows);
        self.record.set_keypoints_by_cell(grid);
        true
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Accessors
    // ─────────────────────────────────────────────────────────────────────────

    pub fn record(&self) -> &FrameRecord {
        &self.record
    }

    pub fn record_mut(&mut self) -> &mut FrameRecord {
        &mut self.record
    }

    pub fn image_name(&self) -> &str {
        &self.record.image_name
    }

    pub fn image_id(&self) -> u64 {
        self.record.image_id
    }

    /// Parent keyframe id, `-1` when none is resolved.
    pub fn keyframe_id(&self) -> i64 {
        self.record.keyframe_id()
    }

    pub fn world_pose(&self) -> &SharedPose {
        &self.record.world_pose
    }

    pub fn relative_pose_to_keyframe(&self) -> &SE3 {
        &self.record.relative_pose_to_keyframe
    }

    pub fn has_features(&self) -> bool {
        self.record.has_features()
    }

    pub fn num_features(&self) -> usize {
        self.record.num_features()
    }
}
