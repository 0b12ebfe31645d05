//! Spatial grid over a frame's feature points (`keypoints_by_cell`).
//!
//! Built on demand by matching consumers. The frame lifecycle only stores it:
//! attachment, promotion and storage cleanup leave it untouched, so a stored
//! record keeps its grid after the feature data is released.

use nalgebra::Point2;

/// Grid of feature indices bucketed by image cell.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureGrid {
    /// Row-major cells: cell[row * cols + col] holds feature indices.
    cells: Vec<Vec<usize>>,
    grid_element_width_inv: f64,
    grid_element_height_inv: f64,
    cols: usize,
    rows: usize,
}

impl FeatureGrid {
    pub const DEFAULT_COLS: usize = 64;
    pub const DEFAULT_ROWS: usize = 48;

    /// Bucket `points` into a `cols` x `rows` grid covering the image.
    pub fn new(points: &[Point2<f64>], img_width: f64, img_height: f64, cols: usize, rows: usize) -> Self {
        let cols = cols.max(1);
        let rows = rows.max(1);
        let grid_element_width_inv = cols as f64 / img_width.max(1.0);
        let grid_element_height_inv = rows as f64 / img_height.max(1.0);

        let mut cells: Vec<Vec<usize>> = vec![Vec::new(); cols * rows];
        for (idx, p) in points.iter().enumerate() {
            let cell_x = ((p.x * grid_element_width_inv).max(0.0) as usize).min(cols - 1);
            let cell_y = ((p.y * grid_element_height_inv).max(0.0) as usize).min(rows - 1);
            cells[cell_y * cols + cell_x].push(idx);
        }

        Self {
            cells,
            grid_element_width_inv,
            grid_element_height_inv,
            cols,
            rows,
        }
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Feature indices stored in cell (`col`, `row`).
    pub fn cell(&self, col: usize, row: usize) -> &[usize] {
        if col >= self.cols || row >= self.rows {
            return &[];
        }
        &self.cells[row * self.cols + col]
    }

    /// Candidate feature indices in the cells overlapping a square of
    /// half-size `r` around (`x`, `y`). Exact radius filtering is left to the
    /// caller.
    pub fn features_in_area(&self, x: f64, y: f64, r: f64) -> Vec<usize> {
        let min_cell_x = ((x - r) * self.grid_element_width_inv).floor().max(0.0) as usize;
        let min_cell_y = ((y - r) * self.grid_element_height_inv).floor().max(0.0) as usize;
        let max_cell_x = ((x + r) * self.grid_element_width_inv).ceil().max(0.0) as usize;
        let max_cell_y = ((y + r) * self.grid_element_height_inv).ceil().max(0.0) as usize;

        if min_cell_x >= self.cols || min_cell_y >= self.rows {
            return Vec::new();
        }
        let max_cell_x = max_cell_x.min(self.cols - 1);
        let max_cell_y = max_cell_y.min(self.rows - 1);

        let mut candidates = Vec::new();
        for cell_y in min_cell_y..=max_cell_y {
            for cell_x in min_cell_x..=max_cell_x {
                candidates.extend(&self.cells[cell_y * self.cols + cell_x]);
            }
        }
        candidates
    }
}
