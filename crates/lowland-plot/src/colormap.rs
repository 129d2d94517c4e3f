//! Grayscale ramp and intensity normalization.

/// Anchor levels of the reversed ColorBrewer "Greys" ramp (black to white),
/// evenly spaced over `[0, 1]`.
const GREYS_R: [u8; 9] = [0, 37, 82, 115, 150, 189, 217, 240, 255];

/// Gray level for a normalized intensity `t` in `[0, 1]` (clamped).
pub fn greys_r(t: f32) -> u8 {
    let t = if t.is_nan() { 0.0 } else { t.clamp(0.0, 1.0) };
    let scaled = t * (GREYS_R.len() - 1) as f32;
    let lower = (scaled.floor() as usize).min(GREYS_R.len() - 2);
    let frac = scaled - lower as f32;

    let low = GREYS_R[lower] as f32;
    let high = GREYS_R[lower + 1] as f32;
    (low + (high - low) * frac).round() as u8
}

/// Linear mapping of `[vmin, vmax]` onto `[0, 1]`.
///
/// Values outside the range clamp to its ends. A zero-width or inverted
/// range is degenerate: every value maps to `0.0`, the dark end of the ramp.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Normalize {
    pub vmin: f32,
    pub vmax: f32,
}

impl Normalize {
    pub fn new(vmin: f32, vmax: f32) -> Self {
        Self { vmin, vmax }
    }

    /// Whether the range has no width (or is inverted).
    pub fn is_degenerate(&self) -> bool {
        !(self.vmax > self.vmin)
    }

    /// Normalized intensity of `value`, or `None` for NaN.
    pub fn apply(&self, value: f32) -> Option<f32> {
        if value.is_nan() {
            return None;
        }
        if self.is_degenerate() {
            return Some(0.0);
        }
        Some(((value - self.vmin) / (self.vmax - self.vmin)).clamp(0.0, 1.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_ramp_endpoints() {
        assert_eq!(greys_r(0.0), 0);
        assert_eq!(greys_r(1.0), 255);
        assert_eq!(greys_r(0.5), 150);
        assert_eq!(greys_r(-3.0), 0);
        assert_eq!(greys_r(7.0), 255);
        assert_eq!(greys_r(f32::NAN), 0);
    }

    #[test]
    fn test_ramp_is_monotonic() {
        let mut previous = 0u8;
        for i in 0..=100 {
            let level = greys_r(i as f32 / 100.0);
            assert!(level >= previous);
            previous = level;
        }
    }

    #[test]
    fn test_normalize_clamps() {
        let norm = Normalize::new(1.0, 11.0);
        assert_relative_eq!(norm.apply(6.0).unwrap(), 0.5);
        assert_eq!(norm.apply(-5.0), Some(0.0));
        assert_eq!(norm.apply(50.0), Some(1.0));
        assert_eq!(norm.apply(f32::NAN), None);
    }

    #[test]
    fn test_degenerate_range_maps_to_low_end() {
        let flat = Normalize::new(1.0, 1.0);
        assert!(flat.is_degenerate());
        assert_eq!(flat.apply(1.0), Some(0.0));

        let inverted = Normalize::new(1.0, -4.0);
        assert!(inverted.is_degenerate());
        assert_eq!(inverted.apply(-2.0), Some(0.0));
    }
}
