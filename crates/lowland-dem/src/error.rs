//! Error types for the DEM crate.

use thiserror::Error;

/// Errors that can occur when reading elevation rasters.
#[derive(Debug, Error)]
pub enum DemError {
    /// I/O error opening or reading a file.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// TIFF decoding error.
    #[error("TIFF decode error: {0}")]
    TiffDecode(#[from] tiff::TiffError),

    /// Invalid GeoTIFF - missing or unusable georeferencing tags.
    #[error("Invalid GeoTIFF: {0}")]
    InvalidGeoTiff(String),

    /// Requested band does not exist in the raster.
    #[error("Band {band} is out of range (raster has {count} band(s))")]
    BandOutOfRange {
        /// Requested 1-based band index.
        band: u16,
        /// Number of bands in the raster.
        count: u16,
    },

    /// Unsupported sample type in the TIFF file.
    #[error("Unsupported TIFF data type: {0}")]
    UnsupportedDataType(String),

    /// Unsupported TIFF organization (e.g. planar band layout).
    #[error("Unsupported TIFF layout: {0}")]
    UnsupportedLayout(String),

    /// Sample buffer does not match the declared grid shape.
    #[error("Grid shape {rows}x{cols} does not match {len} samples")]
    ShapeMismatch {
        /// Declared row count.
        rows: usize,
        /// Declared column count.
        cols: usize,
        /// Number of samples supplied.
        len: usize,
    },
}
