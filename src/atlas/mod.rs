//! Atlas module - persistent side of the frame lifecycle.
//!
//! Frames that the tracker promotes become [`map::KeyFrame`]s; keyframes and
//! retired frames end up in a [`map::Map`], which releases their heavy
//! buffers on insertion.

pub mod map;

// Re-export commonly used types
pub use map::{KeyFrame, KeyFrameId, KeyFrameIdAllocator, Map};
