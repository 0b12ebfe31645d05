//! Core ID types for keyframes.

use std::sync::atomic::{AtomicU64, Ordering};

/// Raw sentinel reported for "not a keyframe / no parent keyframe resolved".
pub const NO_KEYFRAME: i64 = -1;

/// Unique identifier for a KeyFrame.
///
/// KeyFrameIds are handed out by a [`KeyFrameIdAllocator`] when a frame is
/// promoted. They serve as lightweight handles for cross-referencing without
/// needing Arc/Rc between frame records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct KeyFrameId(pub u64);

impl KeyFrameId {
    /// Create a new KeyFrameId with the given value.
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    /// Raw integer form of an optional id, `-1` when absent.
    pub fn to_raw(id: Option<KeyFrameId>) -> i64 {
        id.map_or(NO_KEYFRAME, |kf| kf.0 as i64)
    }
}

impl std::fmt::Display for KeyFrameId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "KF{}", self.0)
    }
}

/// Process-wide authority for keyframe identities.
///
/// Ids are drawn from an atomic counter, so a single allocator can be shared
/// (e.g. behind an `Arc`) by concurrent promoters and still never hands out
/// the same id twice.
#[derive(Debug, Default)]
pub struct KeyFrameIdAllocator {
    next: AtomicU64,
}

impl KeyFrameIdAllocator {
    pub fn new() -> Self {
        Self::starting_at(0)
    }

    /// Allocator whose first id is `first`.
    pub fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// Generate a new unique KeyFrame ID.
    pub fn next_id(&self) -> KeyFrameId {
        KeyFrameId::new(self.next.fetch_add(1, Ordering::SeqCst))
    }

    /// Number of ids handed out so far (relative to the starting value).
    pub fn peek(&self) -> u64 {
        self.next.load(Ordering::SeqCst)
    }
}
