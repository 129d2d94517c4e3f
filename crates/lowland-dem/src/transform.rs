//! Affine pixel-to-geographic transforms.

/// Affine mapping between pixel space and geographic space.
///
/// Follows the GDAL ordering:
///
/// ```text
/// x = a * col + b * row + c
/// y = d * col + e * row + f
/// ```
///
/// `(col, row)` are measured from the top-left corner of the top-left pixel,
/// so pixel `(i, j)` covers `[i, i + 1) x [j, j + 1)`. For a north-up raster
/// `b` and `d` are zero and `e` is negative.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    pub a: f64,
    pub b: f64,
    pub c: f64,
    pub d: f64,
    pub e: f64,
    pub f: f64,
}

impl Affine {
    /// Create a transform from its six coefficients.
    pub const fn new(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Self {
        Self { a, b, c, d, e, f }
    }

    /// North-up transform with the given origin (top-left corner) and pixel size.
    ///
    /// `pixel_height` is the positive height of a pixel in geographic units.
    pub fn north_up(origin_x: f64, origin_y: f64, pixel_width: f64, pixel_height: f64) -> Self {
        Self::new(pixel_width, 0.0, origin_x, 0.0, -pixel_height, origin_y)
    }

    /// Map a pixel-space coordinate to geographic space.
    pub fn apply(&self, col: f64, row: f64) -> (f64, f64) {
        (
            self.a * col + self.b * row + self.c,
            self.d * col + self.e * row + self.f,
        )
    }

    fn determinant(&self) -> f64 {
        self.a * self.e - self.b * self.d
    }

    /// Inverse transform (geographic to pixel), or `None` if singular.
    pub fn inverse(&self) -> Option<Affine> {
        let det = self.determinant();
        if det == 0.0 || !det.is_finite() {
            return None;
        }

        let ia = self.e / det;
        let ib = -self.b / det;
        let id = -self.d / det;
        let ie = self.a / det;

        Some(Affine {
            a: ia,
            b: ib,
            c: -(ia * self.c + ib * self.f),
            d: id,
            e: ie,
            f: -(id * self.c + ie * self.f),
        })
    }

    /// Transform whose origin is moved to pixel `(col, row)` of this one.
    pub fn translate_pixels(&self, col: f64, row: f64) -> Affine {
        let (c, f) = self.apply(col, row);
        Affine { c, f, ..*self }
    }

    /// Whether the transform has no rotation or shear terms.
    pub fn is_rectilinear(&self) -> bool {
        self.b == 0.0 && self.d == 0.0
    }

    /// Pixel size as `(width, height)` in geographic units (absolute values).
    pub fn pixel_size(&self) -> (f64, f64) {
        (
            (self.a * self.a + self.d * self.d).sqrt(),
            (self.b * self.b + self.e * self.e).sqrt(),
        )
    }
}
