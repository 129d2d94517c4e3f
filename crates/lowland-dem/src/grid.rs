//! In-memory elevation grids and threshold masks.

use crate::{DemError, Result};

/// Elevation samples read from a raster window.
///
/// Samples are stored in row-major order (north to south, west to east) and
/// are the raw values from the file: no-data sentinels are kept as-is.
#[derive(Debug, Clone, PartialEq)]
pub struct ElevationGrid {
    data: Vec<f32>,
    rows: usize,
    cols: usize,
}

impl ElevationGrid {
    /// Create a grid from row-major samples.
    pub fn new(rows: usize, cols: usize, data: Vec<f32>) -> Result<Self> {
        if rows * cols != data.len() {
            return Err(DemError::ShapeMismatch {
                rows,
                cols,
                len: data.len(),
            });
        }
        Ok(Self { data, rows, cols })
    }

    /// Grid with no samples.
    pub fn empty() -> Self {
        Self {
            data: Vec::new(),
            rows: 0,
            cols: 0,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// Total number of samples.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// All samples in row-major order.
    pub fn values(&self) -> &[f32] {
        &self.data
    }

    /// Sample at `(row, col)`, or `None` outside the grid.
    pub fn get(&self, row: usize, col: usize) -> Option<f32> {
        if row < self.rows && col < self.cols {
            Some(self.data[row * self.cols + col])
        } else {
            None
        }
    }

    /// Smallest sample, ignoring NaN. `None` if there are no finite samples.
    pub fn nanmin(&self) -> Option<f32> {
        self.data
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f32::min)
    }

    /// Largest sample, ignoring NaN. `None` if there are no finite samples.
    pub fn nanmax(&self) -> Option<f32> {
        self.data
            .iter()
            .copied()
            .filter(|v| !v.is_nan())
            .reduce(f32::max)
    }

    /// Mask of samples strictly below `threshold`.
    pub fn mask_below(&self, threshold: f32) -> ThresholdMask {
        ThresholdMask {
            cells: self.data.iter().map(|&v| v < threshold).collect(),
            rows: self.rows,
            cols: self.cols,
        }
    }

    /// Count of samples strictly below `threshold`.
    pub fn threshold_stats(&self, threshold: f32) -> ThresholdStats {
        ThresholdStats {
            threshold,
            below: self.data.iter().filter(|&&v| v < threshold).count(),
            total: self.data.len(),
        }
    }
}

/// Boolean grid marking samples below a threshold.
///
/// Same shape as the grid it was computed from. NaN samples are never below.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThresholdMask {
    cells: Vec<bool>,
    rows: usize,
    cols: usize,
}

impl ThresholdMask {
    /// `(rows, cols)`.
    pub fn shape(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    pub fn cells(&self) -> &[bool] {
        &self.cells
    }

    pub fn get(&self, row: usize, col: usize) -> Option<bool> {
        if row < self.rows && col < self.cols {
            Some(self.cells[row * self.cols + col])
        } else {
            None
        }
    }

    /// Number of `true` cells.
    pub fn count(&self) -> usize {
        self.cells.iter().filter(|&&c| c).count()
    }

    /// Whether no cell is set.
    pub fn is_clear(&self) -> bool {
        !self.cells.iter().any(|&c| c)
    }
}

/// Share of a grid below an elevation threshold.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ThresholdStats {
    /// Threshold in meters.
    pub threshold: f32,
    /// Samples strictly below the threshold.
    pub below: usize,
    /// Samples in the grid.
    pub total: usize,
}

impl ThresholdStats {
    /// Percentage of samples below the threshold; `0.0` for an empty grid.
    pub fn percent_below(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        self.below as f64 / self.total as f64 * 100.0
    }
}
