//! Shared, mutable pose handle.
//!
//! A frame and the keyframe promoted from it observe the same world pose:
//! when mapping refines the keyframe pose, the originating frame sees the
//! update. The handle is a cheap `Arc` clone; the pose itself lives behind a
//! `RwLock` so tracking (readers) and optimization (writers) can run on
//! different threads.

use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;

use super::SE3;

/// Reference-counted world pose shared between frame records.
#[derive(Clone, Default)]
pub struct SharedPose(Arc<RwLock<SE3>>);

impl SharedPose {
    pub fn new(pose: SE3) -> Self {
        Self(Arc::new(RwLock::new(pose)))
    }

    pub fn identity() -> Self {
        Self::new(SE3::identity())
    }

    /// Snapshot of the current pose.
    pub fn get(&self) -> SE3 {
        *self.0.read()
    }

    /// Overwrite the pose; visible to every holder of this handle.
    pub fn set(&self, pose: SE3) {
        *self.0.write() = pose;
    }

    /// Update the pose in place under the write lock.
    pub fn update<F: FnOnce(&mut SE3)>(&self, f: F) {
        let mut guard = self.0.write();
        f(&mut *guard);
    }

    /// True if both handles point to the same pose object.
    pub fn ptr_eq(&self, other: &SharedPose) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    /// A new, independent handle holding a copy of the current pose.
    pub fn detached(&self) -> Self {
        Self::new(self.get())
    }

    /// Number of records currently holding this pose.
    pub fn holders(&self) -> usize {
        Arc::strong_count(&self.0)
    }
}

impl fmt::Debug for SharedPose {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SharedPose").field(&self.get()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Vector3;

    #[test]
    fn test_clone_shares_pose() {
        let a = SharedPose::identity();
        let b = a.clone();

        b.set(SE3::from_translation(Vector3::new(1.0, 0.0, 0.0)));

        assert!(a.ptr_eq(&b));
        assert_eq!(a.get().translation, Vector3::new(1.0, 0.0, 0.0));
        assert_eq!(a.holders(), 2);
    }

    #[test]
    fn test_detached_is_independent() {
        let a = SharedPose::identity();
        let b = a.detached();

        b.update(|p| p.translation.z = 5.0);

        assert!(!a.ptr_eq(&b));
        assert_eq!(a.get().translation.z, 0.0);
        assert_eq!(b.get().translation.z, 5.0);
    }
}
