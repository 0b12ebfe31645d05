//! Map - long-term storage for keyframes and retired frames.
//!
//! Records enter the map only after `prepare_for_storage`, so everything the
//! map retains is lightweight: identity, pose handles and any derived data
//! external consumers attached. The heavy image and feature buffers are gone.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::tracking::Frame;

use super::keyframe::KeyFrame;
use super::types::KeyFrameId;

/// Storage for keyframes and retired (non-key) frames.
#[derive(Debug, Default)]
pub struct Map {
    /// KeyFrames ordered by id.
    keyframes: BTreeMap<KeyFrameId, KeyFrame>,

    /// Retired frames keyed by image id.
    frames: HashMap<u64, Frame>,

    /// Most recently inserted KeyFrame.
    last_keyframe_id: Option<KeyFrameId>,
}

impl Map {
    /// Create a new empty Map.
    pub fn new() -> Self {
        Self::default()
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Storage
    // ─────────────────────────────────────────────────────────────────────────

    /// Release the keyframe's heavy buffers and retain it.
    ///
    /// Returns the keyframe previously stored under the same id, if any.
    pub fn insert_keyframe(&mut self, mut keyframe: KeyFrame) -> Option<KeyFrame> {
        keyframe.prepare_for_storage();
        let id = keyframe.id();
        debug!("Storing keyframe {} ({})", id, keyframe.image_name());
        self.last_keyframe_id = Some(id);
        self.keyframes.insert(id, keyframe)
    }

    /// Release the frame's heavy buffers and retain it as a lightweight
    /// record.
    pub fn retire_frame(&mut self, mut frame: Frame) -> Option<Frame> {
        frame.prepare_for_storage();
        debug!("Retiring frame {} ({})", frame.image_id(), frame.image_name());
        self.frames.insert(frame.image_id(), frame)
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Queries
    // ─────────────────────────────────────────────────────────────────────────

    pub fn get_keyframe(&self, id: KeyFrameId) -> Option<&KeyFrame> {
        self.keyframes.get(&id)
    }

    pub fn get_keyframe_mut(&mut self, id: KeyFrameId) -> Option<&mut KeyFrame> {
        self.keyframes.get_mut(&id)
    }

    pub fn get_frame(&self, image_id: u64) -> Option<&Frame> {
        self.frames.get(&image_id)
    }

    pub fn last_keyframe_id(&self) -> Option<KeyFrameId> {
        self.last_keyframe_id
    }

    pub fn num_keyframes(&self) -> usize {
        self.keyframes.len()
    }

    pub fn num_frames(&self) -> usize {
        self.frames.len()
    }

    /// KeyFrames in id order.
    pub fn keyframes(&self) -> impl Iterator<Item = &KeyFrame> {
        self.keyframes.values()
    }

    pub fn frames(&self) -> impl Iterator<Item = &Frame> {
        self.frames.values()
    }

    /// Remove a keyframe from the map.
    pub fn remove_keyframe(&mut self, id: KeyFrameId) -> Option<KeyFrame> {
        let removed = self.keyframes.remove(&id);
        if self.last_keyframe_id == Some(id) {
            self.last_keyframe_id = self.keyframes.keys().next_back().copied();
        }
        removed
    }
}
