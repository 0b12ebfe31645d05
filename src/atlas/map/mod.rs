//! Map module - persistent frame records.
//!
//! This module contains:
//! - [`KeyFrame`] - a frame promoted to persist in the map
//! - [`Map`] - storage that releases heavy buffers before retaining records
//! - [`KeyFrameId`] / [`KeyFrameIdAllocator`] - keyframe identities
//!
//! # Example
//!
//! ```ignore
//! use vslam_frontend::atlas::{KeyFrame, KeyFrameIdAllocator, Map};
//!
//! let ids = KeyFrameIdAllocator::new();
//! let mut map = Map::new();
//!
//! let kf = KeyFrame::promote_with(&mut frame, &ids);
//! // ... mapping consumes the keyframe's features ...
//! map.insert_keyframe(kf);
//! ```

pub mod keyframe;
pub mod map;
pub mod types;

pub use keyframe::KeyFrame;
pub use map::Map;
pub use types::{KeyFrameId, KeyFrameIdAllocator, NO_KEYFRAME};
