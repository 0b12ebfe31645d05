//! Input collaborators: image access.

pub mod image_source;

pub use image_source::{DirectoryImageSource, ImageSource, InMemoryImageSource};
