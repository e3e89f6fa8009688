//! Box types and the coordinate transforms between unit systems.
//!
//! All layout geometry is stored as [`NormalizedBox`] (fractions of the page
//! in `[0, 1]`, origin top-left). Pixel and percentage boxes are views
//! produced on demand for collaborators and the UI; they are never the
//! source of truth.
//!
//! Every transform that produces a normalized box clamps the result into the
//! unit square, so consumers always receive renderable geometry even when
//! floating-point drift pushes a coordinate slightly out of range.

use serde::{Deserialize, Serialize};

/// Relative tolerance guaranteed by a transform followed by its inverse.
pub const ROUND_TRIP_TOLERANCE: f64 = 1e-6;

/// A box in normalized page coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedBox {
    /// Left edge (fraction of page width)
    pub left: f64,
    /// Top edge (fraction of page height)
    pub top: f64,
    /// Right edge (fraction of page width)
    pub right: f64,
    /// Bottom edge (fraction of page height)
    pub bottom: f64,
}

impl NormalizedBox {
    /// Create a box from its edges, without clamping.
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a box from origin and size, without clamping.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// The whole page.
    pub fn full_page() -> Self {
        Self::new(0.0, 0.0, 1.0, 1.0)
    }

    /// Width as a fraction of page width.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Height as a fraction of page height.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }

    /// Smallest box containing both boxes.
    pub fn union(&self, other: &NormalizedBox) -> NormalizedBox {
        NormalizedBox {
            left: self.left.min(other.left),
            top: self.top.min(other.top),
            right: self.right.max(other.right),
            bottom: self.bottom.max(other.bottom),
        }
    }

    /// Union of a sequence of boxes, or `None` when empty.
    pub fn union_all<'a, I>(boxes: I) -> Option<NormalizedBox>
    where
        I: IntoIterator<Item = &'a NormalizedBox>,
    {
        boxes
            .into_iter()
            .fold(None, |acc: Option<NormalizedBox>, b| match acc {
                Some(a) => Some(a.union(b)),
                None => Some(*b),
            })
    }

    /// Whether the box satisfies the stored-geometry invariants.
    pub fn is_valid(&self) -> bool {
        let coords = [self.left, self.top, self.right, self.bottom];
        coords.iter().all(|c| c.is_finite() && (0.0..=1.0).contains(c))
            && self.right >= self.left
            && self.bottom >= self.top
    }

    /// Clamp into the unit square and collapse inverted edges.
    ///
    /// Non-finite coordinates become 0.
    pub fn clamped(&self) -> NormalizedBox {
        let left = clamp_unit(self.left);
        let top = clamp_unit(self.top);
        let right = clamp_unit(self.right).max(left);
        let bottom = clamp_unit(self.bottom).max(top);
        NormalizedBox {
            left,
            top,
            right,
            bottom,
        }
    }
}

/// A box in rendered-image pixel coordinates (origin top-left).
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PixelBox {
    /// Left edge in pixels
    pub left: f64,
    /// Top edge in pixels
    pub top: f64,
    /// Right edge in pixels
    pub right: f64,
    /// Bottom edge in pixels
    pub bottom: f64,
}

impl PixelBox {
    /// Create a pixel box from its edges.
    pub fn new(left: f64, top: f64, right: f64, bottom: f64) -> Self {
        Self {
            left,
            top,
            right,
            bottom,
        }
    }

    /// Create a pixel box from origin and size.
    pub fn from_xywh(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self::new(x, y, x + width, y + height)
    }

    /// Width in pixels.
    pub fn width(&self) -> f64 {
        self.right - self.left
    }

    /// Height in pixels.
    pub fn height(&self) -> f64 {
        self.bottom - self.top
    }
}

/// A box in percentage units, as consumed by highlight overlays.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct PercentBox {
    /// Left edge in percent of page width
    pub x: f64,
    /// Top edge in percent of page height
    pub y: f64,
    /// Width in percent of page width
    pub w: f64,
    /// Height in percent of page height
    pub h: f64,
}

impl PercentBox {
    /// Create a percentage box.
    pub fn new(x: f64, y: f64, w: f64, h: f64) -> Self {
        Self { x, y, w, h }
    }
}

/// Project a normalized box into pixel space.
pub fn to_pixel(b: &NormalizedBox, page_width: f64, page_height: f64) -> PixelBox {
    let b = b.clamped();
    PixelBox {
        left: b.left * page_width,
        top: b.top * page_height,
        right: b.right * page_width,
        bottom: b.bottom * page_height,
    }
}

/// Project a pixel box back into normalized space, clamping drift.
///
/// A page with a non-positive dimension yields an empty box at the origin.
pub fn to_normalized(b: &PixelBox, page_width: f64, page_height: f64) -> NormalizedBox {
    if !(page_width > 0.0 && page_height > 0.0) {
        return NormalizedBox::default();
    }
    NormalizedBox {
        left: b.left / page_width,
        top: b.top / page_height,
        right: b.right / page_width,
        bottom: b.bottom / page_height,
    }
    .clamped()
}

/// Express a normalized box as percentages.
pub fn to_percent(b: &NormalizedBox) -> PercentBox {
    let b = b.clamped();
    PercentBox {
        x: b.left * 100.0,
        y: b.top * 100.0,
        w: b.width() * 100.0,
        h: b.height() * 100.0,
    }
}

/// Inverse of [`to_percent`].
pub fn from_percent(p: &PercentBox) -> NormalizedBox {
    NormalizedBox::from_xywh(p.x / 100.0, p.y / 100.0, p.w / 100.0, p.h / 100.0).clamped()
}

/// Pixel box to percentages, through normalized space.
pub fn pixel_to_percent(b: &PixelBox, page_width: f64, page_height: f64) -> PercentBox {
    to_percent(&to_normalized(b, page_width, page_height))
}

/// Percentages to a pixel box, through normalized space.
pub fn percent_to_pixel(p: &PercentBox, page_width: f64, page_height: f64) -> PixelBox {
    to_pixel(&from_percent(p), page_width, page_height)
}

/// Differences below this are equal regardless of magnitude, so values that
/// should be zero compare equal to float noise.
const ABSOLUTE_FLOOR: f64 = 1e-12;

/// Whether `a` and `b` agree within [`ROUND_TRIP_TOLERANCE`] relative error.
///
/// The tolerance scales with the larger magnitude, so small coordinates are
/// held to the same relative precision as large pixel values.
pub fn approx_eq(a: f64, b: f64) -> bool {
    let diff = (a - b).abs();
    diff <= ABSOLUTE_FLOOR || diff <= ROUND_TRIP_TOLERANCE * a.abs().max(b.abs())
}

fn clamp_unit(v: f64) -> f64 {
    if v.is_finite() {
        v.clamp(0.0, 1.0)
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pixel_round_trip() {
        let b = NormalizedBox::new(0.1, 0.25, 0.6, 0.3);
        let px = to_pixel(&b, 1700.0, 2200.0);
        assert!(approx_eq(px.left, 170.0));
        assert!(approx_eq(px.bottom, 660.0));

        let back = to_normalized(&px, 1700.0, 2200.0);
        assert!(approx_eq(back.left, b.left));
        assert!(approx_eq(back.top, b.top));
        assert!(approx_eq(back.right, b.right));
        assert!(approx_eq(back.bottom, b.bottom));
    }

    #[test]
    fn test_percent_round_trip() {
        let b = NormalizedBox::from_xywh(0.1, 0.1, 0.42, 0.05);
        let p = to_percent(&b);
        assert!(approx_eq(p.x, 10.0));
        assert!(approx_eq(p.w, 42.0));

        let back = from_percent(&p);
        assert!(approx_eq(back.right, 0.52));
        assert!(approx_eq(back.bottom, 0.15));
    }

    #[test]
    fn test_approx_eq_is_relative() {
        assert!(!approx_eq(1e-3, 1.0005e-3));
        assert!(!approx_eq(0.012, 0.0121));
        assert!(approx_eq(1700.0, 1700.0 + 1e-4));
        assert!(approx_eq(0.0, 1e-15));
        assert!(!approx_eq(0.0, 1e-9));
    }

    #[test]
    fn test_drift_is_clamped() {
        let px = PixelBox::new(-0.5, 10.0, 1000.4, 20.0);
        let b = to_normalized(&px, 1000.0, 100.0);
        assert!(b.is_valid());
        assert_eq!(b.left, 0.0);
        assert_eq!(b.right, 1.0);
    }

    #[test]
    fn test_inverted_box_collapses() {
        let b = NormalizedBox::new(0.5, 0.5, 0.4, 0.2).clamped();
        assert!(b.is_valid());
        assert_eq!(b.width(), 0.0);
        assert_eq!(b.height(), 0.0);
    }

    #[test]
    fn test_zero_page_dimensions() {
        let b = to_normalized(&PixelBox::new(1.0, 1.0, 2.0, 2.0), 0.0, 100.0);
        assert_eq!(b, NormalizedBox::default());
    }

    #[test]
    fn test_union_all() {
        let boxes = [
            NormalizedBox::new(0.1, 0.1, 0.2, 0.2),
            NormalizedBox::new(0.3, 0.05, 0.4, 0.15),
        ];
        let u = NormalizedBox::union_all(boxes.iter()).unwrap();
        assert_eq!(u, NormalizedBox::new(0.1, 0.05, 0.4, 0.2));
        assert!(NormalizedBox::union_all(std::iter::empty()).is_none());
    }

    #[test]
    fn test_non_finite_is_invalid() {
        assert!(!NormalizedBox::new(f64::NAN, 0.0, 0.1, 0.1).is_valid());
        assert!(NormalizedBox::new(f64::NAN, 0.0, 0.1, 0.1)
            .clamped()
            .is_valid());
    }
}
