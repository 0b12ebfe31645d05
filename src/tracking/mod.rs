//! Tracking side of the frame lifecycle.
//!
//! - [`frame`] - the shared frame record, feature containers and the
//!   collaborator traits used to attach features
//! - [`tracking_frame`] - the transient [`Frame`] created for every image

pub mod frame;
pub mod tracking_frame;

pub use tracking_frame::Frame;
