//! Image access: resolve an image name to a grayscale raster.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use image::GrayImage;

/// Loads grayscale rasters by image name.
pub trait ImageSource {
    fn load_gray(&self, image_name: &str) -> Result<GrayImage>;
}

/// Images stored as files below a root directory.
#[derive(Debug, Clone)]
pub struct DirectoryImageSource {
    root: PathBuf,
}

impl DirectoryImageSource {
    pub fn new<P: AsRef<Path>>(root: P) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Path of `image_name` below the root.
    pub fn image_path(&self, image_name: &str) -> PathBuf {
        self.root.join(image_name)
    }
}

impl ImageSource for DirectoryImageSource {
    fn load_gray(&self, image_name: &str) -> Result<GrayImage> {
        let path = self.image_path(image_name);
        let img = image::open(&path)
            .with_context(|| format!("Failed to read image {:?}", path))?;
        Ok(img.to_luma8())
    }
}

/// Images held in memory, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct InMemoryImageSource {
    images: HashMap<String, GrayImage>,
}

impl InMemoryImageSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, image_name: impl Into<String>, image: GrayImage) {
        self.images.insert(image_name.into(), image);
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }
}

impl ImageSource for InMemoryImageSource {
    fn load_gray(&self, image_name: &str) -> Result<GrayImage> {
        self.images
            .get(image_name)
            .cloned()
            .with_context(|| format!("No image named {}", image_name))
    }
}
