//! Geographic and pixel-space windows.

use crate::transform::Affine;

/// Tolerance (in pixels) used when snapping fractional window edges.
///
/// Bounds that fall within this distance of a pixel edge are treated as
/// lying on it, so floating-point noise does not add a sliver row or column.
const SNAP_EPSILON: f64 = 1e-6;

/// Rectangle in geographic coordinates (degrees).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GeoWindow {
    /// Western edge (minimum longitude).
    pub west: f64,
    /// Southern edge (minimum latitude).
    pub south: f64,
    /// Eastern edge (maximum longitude).
    pub east: f64,
    /// Northern edge (maximum latitude).
    pub north: f64,
}

impl GeoWindow {
    /// Create a window from `(west, south, east, north)`.
    pub const fn new(west: f64, south: f64, east: f64, north: f64) -> Self {
        Self {
            west,
            south,
            east,
            north,
        }
    }

    /// Create a window from `(min, max)` longitude and latitude pairs.
    pub fn from_ranges(lon: (f64, f64), lat: (f64, f64)) -> Self {
        Self::new(lon.0, lat.0, lon.1, lat.1)
    }

    /// Whether the window has no area (empty or inverted ranges).
    pub fn is_empty(&self) -> bool {
        !(self.east > self.west && self.north > self.south)
    }

    /// Check if a coordinate is within the window.
    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        lat >= self.south && lat <= self.north && lon >= self.west && lon <= self.east
    }
}

/// Rectangle in pixel space, always within the raster it was derived from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct PixelWindow {
    /// First column.
    pub col_off: u32,
    /// First row.
    pub row_off: u32,
    /// Number of columns.
    pub width: u32,
    /// Number of rows.
    pub height: u32,
}

impl PixelWindow {
    pub const fn new(col_off: u32, row_off: u32, width: u32, height: u32) -> Self {
        Self {
            col_off,
            row_off,
            width,
            height,
        }
    }

    /// Window covering a whole raster.
    pub const fn full(width: u32, height: u32) -> Self {
        Self::new(0, 0, width, height)
    }

    /// Derive the pixel window covering `bounds`.
    ///
    /// `inverse` maps geographic coordinates to pixel coordinates. The
    /// fractional window spanned by the four corners is widened outward to
    /// whole pixels and then clipped to `extent` (`(width, height)`).
    /// Bounds partly outside the raster give a smaller window; bounds fully
    /// outside, or empty/inverted bounds, give an empty one.
    pub fn from_bounds(bounds: &GeoWindow, inverse: &Affine, extent: (u32, u32)) -> Self {
        if bounds.is_empty() {
            return Self::default();
        }

        let corners = [
            inverse.apply(bounds.west, bounds.north),
            inverse.apply(bounds.east, bounds.north),
            inverse.apply(bounds.east, bounds.south),
            inverse.apply(bounds.west, bounds.south),
        ];

        let (mut col_min, mut col_max) = (f64::INFINITY, f64::NEG_INFINITY);
        let (mut row_min, mut row_max) = (f64::INFINITY, f64::NEG_INFINITY);
        for (col, row) in corners {
            col_min = col_min.min(col);
            col_max = col_max.max(col);
            row_min = row_min.min(row);
            row_max = row_max.max(row);
        }

        if !(col_min.is_finite() && col_max.is_finite() && row_min.is_finite() && row_max.is_finite()) {
            return Self::default();
        }

        let (col_off, width) = snap_span(col_min, col_max, extent.0);
        let (row_off, height) = snap_span(row_min, row_max, extent.1);

        if width == 0 || height == 0 {
            return Self::default();
        }

        Self::new(col_off, row_off, width, height)
    }

    /// One past the last column.
    pub fn col_end(&self) -> u32 {
        self.col_off.saturating_add(self.width)
    }

    /// One past the last row.
    pub fn row_end(&self) -> u32 {
        self.row_off.saturating_add(self.height)
    }

    /// Number of pixels in the window.
    pub fn len(&self) -> usize {
        self.width as usize * self.height as usize
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Geographic rectangle covered by this window under `transform`.
    pub fn bounds(&self, transform: &Affine) -> GeoWindow {
        let corners = [
            transform.apply(self.col_off as f64, self.row_off as f64),
            transform.apply(self.col_end() as f64, self.row_off as f64),
            transform.apply(self.col_end() as f64, self.row_end() as f64),
            transform.apply(self.col_off as f64, self.row_end() as f64),
        ];

        let mut window = GeoWindow::new(
            f64::INFINITY,
            f64::INFINITY,
            f64::NEG_INFINITY,
            f64::NEG_INFINITY,
        );
        for (x, y) in corners {
            window.west = window.west.min(x);
            window.east = window.east.max(x);
            window.south = window.south.min(y);
            window.north = window.north.max(y);
        }
        window
    }
}

/// Widen `[start, end)` to whole pixels and clip it to `[0, limit)`.
fn snap_span(start: f64, end: f64, limit: u32) -> (u32, u32) {
    let first = (start + SNAP_EPSILON).floor().max(0.0);
    let last = (end - SNAP_EPSILON).ceil().min(limit as f64);

    if last <= first {
        return (first.min(limit as f64) as u32, 0);
    }

    (first as u32, (last - first) as u32)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn transform() -> Affine {
        // 0.01 degree pixels, 200 x 100 raster anchored at (-120, 35)
        Affine::north_up(-120.0, 35.0, 0.01, 0.01)
    }

    #[test]
    fn test_aligned_bounds() {
        let inv = transform().inverse().unwrap();
        let bounds = GeoWindow::new(-119.5, 34.5, -119.0, 34.8);
        let window = PixelWindow::from_bounds(&bounds, &inv, (200, 100));

        assert_eq!(window, PixelWindow::new(50, 20, 50, 30));
    }

    #[test]
    fn test_unaligned_bounds_widen_outward() {
        let inv = transform().inverse().unwrap();
        let bounds = GeoWindow::new(-119.505, 34.495, -118.995, 34.805);
        let window = PixelWindow::from_bounds(&bounds, &inv, (200, 100));

        assert_eq!(window.col_off, 49);
        assert_eq!(window.row_off, 19);
        assert_eq!(window.col_end(), 101);
        assert_eq!(window.row_end(), 51);

        let covered = window.bounds(&transform());
        assert!(covered.west <= bounds.west);
        assert!(covered.east >= bounds.east);
        assert!(covered.south <= bounds.south);
        assert!(covered.north >= bounds.north);
    }

    #[test]
    fn test_partially_outside_is_clipped() {
        let inv = transform().inverse().unwrap();
        let bounds = GeoWindow::new(-121.0, 34.5, -119.9, 36.0);
        let window = PixelWindow::from_bounds(&bounds, &inv, (200, 100));

        assert_eq!(window, PixelWindow::new(0, 0, 10, 50));
    }

    #[test]
    fn test_fully_outside_is_empty() {
        let inv = transform().inverse().unwrap();
        let bounds = GeoWindow::new(-100.0, 10.0, -99.0, 11.0);
        let window = PixelWindow::from_bounds(&bounds, &inv, (200, 100));

        assert!(window.is_empty());
        assert_eq!(window.len(), 0);
    }

    #[test]
    fn test_inverted_bounds_are_empty() {
        let inv = transform().inverse().unwrap();
        let bounds = GeoWindow::new(-119.0, 34.5, -119.5, 34.8);
        assert!(bounds.is_empty());
        assert!(PixelWindow::from_bounds(&bounds, &inv, (200, 100)).is_empty());
    }

    #[test]
    fn test_window_end_saturates() {
        let window = PixelWindow::new(u32::MAX - 1, u32::MAX, 5, 5);
        assert_eq!(window.col_end(), u32::MAX);
        assert_eq!(window.row_end(), u32::MAX);
    }

    #[test]
    fn test_geo_window_contains() {
        let bounds = GeoWindow::from_ranges((-123.0, -122.0), (47.0, 48.0));

        assert!(bounds.contains(47.5, -122.5));
        assert!(bounds.contains(47.0, -123.0)); // Corner
        assert!(bounds.contains(48.0, -122.0)); // Corner
        assert!(!bounds.contains(46.5, -122.5)); // Too far south
        assert!(!bounds.contains(48.5, -122.5)); // Too far north
        assert!(!bounds.contains(47.5, -121.5)); // Too far east
        assert!(!bounds.contains(47.5, -123.5)); // Too far west
    }
}
