//! Geometry utilities: SE3 transforms and the shared world pose handle.

pub mod se3;
pub mod shared_pose;

pub use se3::SE3;
pub use shared_pose::SharedPose;
