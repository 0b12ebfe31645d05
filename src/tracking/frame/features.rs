//! Feature data attached to a frame: points, descriptors and colors.
//!
//! The three containers are index-aligned: row `i` of the descriptor matrix
//! and `colors[i]` belong to `points[i]`. [`FeatureSet`] can only be built
//! through a length-checked constructor, so holding one is proof that the
//! triple is consistent.

use image::Rgb;
use nalgebra::{DMatrix, Point2};
use thiserror::Error;

/// Errors raised when attaching or reshaping feature data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeatureError {
    #[error(
        "feature length mismatch: {points} points, {descriptors} descriptors, {colors} colors"
    )]
    FeatureLengthMismatch {
        points: usize,
        descriptors: usize,
        colors: usize,
    },
    #[error("mask covers {mask} features but the set holds {features}")]
    MaskLengthMismatch { mask: usize, features: usize },
    #[error("{got} undistorted points given for {expected} features")]
    UndistortedLengthMismatch { expected: usize, got: usize },
}

/// Unvalidated feature triple as returned by extractors and caches.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTriple {
    /// N x 2 image coordinates (pixels).
    pub points: Vec<Point2<f64>>,
    /// N x D descriptors, one row per point.
    pub descriptors: DMatrix<f32>,
    /// N x 3 color samples.
    pub colors: Vec<Rgb<u8>>,
}

/// Length-checked feature triple.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureSet {
    points: Vec<Point2<f64>>,
    descriptors: DMatrix<f32>,
    colors: Vec<Rgb<u8>>,
}

impl FeatureSet {
    pub fn new(
        points: Vec<Point2<f64>>,
        descriptors: DMatrix<f32>,
        colors: Vec<Rgb<u8>>,
    ) -> Result<Self, FeatureError> {
        if points.len() != descriptors.nrows() || points.len() != colors.len() {
            return Err(FeatureError::FeatureLengthMismatch {
                points: points.len(),
                descriptors: descriptors.nrows(),
                colors: colors.len(),
            });
        }
        Ok(Self {
            points,
            descriptors,
            colors,
        })
    }

    /// Number of features.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Descriptor dimension D.
    pub fn descriptor_dim(&self) -> usize {
        self.descriptors.ncols()
    }

    pub fn points(&self) -> &[Point2<f64>] {
        &self.points
    }

    pub fn descriptors(&self) -> &DMatrix<f32> {
        &self.descriptors
    }

    pub fn colors(&self) -> &[Rgb<u8>] {
        &self.colors
    }

    /// Borrow the aligned triple.
    pub fn as_triple(&self) -> (&[Point2<f64>], &DMatrix<f32>, &[Rgb<u8>]) {
        (&self.points, &self.descriptors, &self.colors)
    }

    /// Keep only the features whose mask entry is `true`.
    pub fn select(&self, keep: &[bool]) -> Result<FeatureSet, FeatureError> {
        if keep.len() != self.len() {
            return Err(FeatureError::MaskLengthMismatch {
                mask: keep.len(),
                features: self.len(),
            });
        }

        let indices: Vec<usize> = keep
            .iter()
            .enumerate()
            .filter_map(|(i, &k)| k.then_some(i))
            .collect();

        Ok(FeatureSet {
            points: indices.iter().map(|&i| self.points[i]).collect(),
            descriptors: self.descriptors.select_rows(indices.iter()),
            colors: indices.iter().map(|&i| self.colors[i]).collect(),
        })
    }

    pub fn into_triple(self) -> FeatureTriple {
        FeatureTriple {
            points: self.points,
            descriptors: self.descriptors,
            colors: self.colors,
        }
    }
}

impl TryFrom<FeatureTriple> for FeatureSet {
    type Error = FeatureError;

    fn try_from(triple: FeatureTriple) -> Result<Self, Self::Error> {
        FeatureSet::new(triple.points, triple.descriptors, triple.colors)
    }
}
