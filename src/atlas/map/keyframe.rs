//! KeyFrame - a frame promoted to persist in the map.
//!
//! A KeyFrame embeds the same [`FrameRecord`] as a transient [`Frame`]. It is
//! created exactly once, by [`KeyFrame::promote`], which:
//! - copies the image name and id,
//! - shares the world pose handle with the source frame,
//! - resets the relative pose to identity (keyframe poses are expressed
//!   directly in world coordinates),
//! - takes the raster and feature buffers out of the source frame.
//!
//! Buffers are transferred, never aliased: after promotion the source frame
//! has no image and no features, so exactly one record owns them.

use image::{GrayImage, Rgb};
use nalgebra::{DMatrix, Point2};
use tracing::{info, warn};

use crate::geometry::{SE3, SharedPose};
use crate::tracking::Frame;
use crate::tracking::frame::FrameRecord;

use super::types::{KeyFrameId, KeyFrameIdAllocator};

/// A KeyFrame in the SLAM map.
#[derive(Debug)]
pub struct KeyFrame {
    /// Unique identifier assigned at promotion.
    id: KeyFrameId,
    record: FrameRecord,
}

impl KeyFrame {
    /// Promote `frame` into a keyframe with identity `id`.
    ///
    /// The frame's feature data should be final. Promoting a frame without
    /// features is allowed but yields a keyframe without features.
    pub fn promote(frame: &mut Frame, id: KeyFrameId) -> Self {
        info!("Creating keyframe {} from {}", id, frame.image_name());
        if !frame.has_features() {
            warn!(
                "Keyframe {} promoted from {} without features",
                id,
                frame.image_name()
            );
        }

        let source = frame.record_mut();
        let mut record = FrameRecord::new(source.image_name.clone(), source.image_id, None);
        record.keyframe_id = Some(id);
        record.world_pose = source.world_pose.clone();
        record.relative_pose_to_keyframe = SE3::identity();

        let (image, pyramid) = source.take_image();
        record.put_image(image, pyramid);
        record.set_feature_set(source.take_features());

        debug_assert!(!source.holds_heavy_buffers());
        debug_assert!(record.world_pose.ptr_eq(&source.world_pose));

        Self { id, record }
    }

    /// Promote `frame` with the next id from `ids`.
    pub fn promote_with(frame: &mut Frame, ids: &KeyFrameIdAllocator) -> Self {
        Self::promote(frame, ids.next_id())
    }

    /// The (points, descriptors, colors) triple, or `None` without features.
    pub fn load_points_desc_colors(&self) -> Option<(&[Point2<f64>], &DMatrix<f32>, &[Rgb<u8>])> {
        self.record.load_points_desc_colors()
    }

    /// Release the image and feature buffers. Idempotent.
    pub fn prepare_for_storage(&mut self) {
        self.record.prepare_for_storage();
    }

    pub fn id(&self) -> KeyFrameId {
        self.id
    }

    pub fn record(&self) -> &FrameRecord {
        &self.record
    }

    /// Mutable access to the record. The keyframe identity is not part of
    /// it and cannot be changed.
    pub fn record_mut(&mut self) -> &mut FrameRecord {
        &mut self.record
    }

    pub fn image_name(&self) -> &str {
        &self.record.image_name
    }

    pub fn image_id(&self) -> u64 {
        self.record.image_id
    }

    /// Raw keyframe id, always equal to [`KeyFrame::id`].
    pub fn keyframe_id(&self) -> i64 {
        KeyFrameId::to_raw(Some(self.id))
    }

    pub fn world_pose(&self) -> &SharedPose {
        &self.record.world_pose
    }

    pub fn relative_pose_to_keyframe(&self) -> &SE3 {
        &self.record.relative_pose_to_keyframe
    }

    pub fn image(&self) -> Option<&GrayImage> {
        self.record.image()
    }

    pub fn has_features(&self) -> bool {
        self.record.has_features()
    }

    pub fn num_features(&self) -> usize {
        self.record.num_features()
    }

    /// Camera position in world frame.
    pub fn camera_center(&self) -> nalgebra::Vector3<f64> {
        self.record.world_pose.get().translation
    }
}
