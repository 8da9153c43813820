//! Normalized geometry and unit conversion.
//!
//! Layers store their position and size as percentages (0-100) of the slide's
//! bounding box, origin top-left. Absolute units are derived on demand for a
//! concrete target: pixels for the live surface and raster output, points for
//! the fixed-page document, and percentages (a 100x100 box) for the native
//! slide deck.

use serde::{Deserialize, Serialize};

/// Approximate conversion factor from CSS pixels to typographic points.
pub const PX_TO_PT: f32 = 0.75;

/// A 2D point in absolute target units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    /// X coordinate.
    pub x: f32,
    /// Y coordinate.
    pub y: f32,
}

impl Point {
    /// Create a point.
    #[must_use]
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

/// The rendered size of a slide in some absolute unit.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    /// Width in target units.
    pub width: f32,
    /// Height in target units.
    pub height: f32,
}

impl BoundingBox {
    /// A box whose units are percentages of the slide.
    pub const PERCENT: Self = Self {
        width: 100.0,
        height: 100.0,
    };

    /// Create a bounding box.
    #[must_use]
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Whether this box can be used for conversion.
    ///
    /// A resize observer may report a transient zero size before layout
    /// settles; conversion is skipped until both dimensions are positive.
    #[must_use]
    pub fn is_measurable(&self) -> bool {
        self.width.is_finite() && self.height.is_finite() && self.width > 0.0 && self.height > 0.0
    }
}

/// A rectangle in normalized (percentage) coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct NormalizedRect {
    /// Left edge, percent of slide width.
    pub x: f32,
    /// Top edge, percent of slide height.
    pub y: f32,
    /// Width, percent of slide width.
    pub width: f32,
    /// Height, percent of slide height.
    pub height: f32,
}

impl NormalizedRect {
    /// Create a normalized rectangle.
    #[must_use]
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }
}

/// A rectangle in absolute target units.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct AbsoluteRect {
    /// Left edge.
    pub left: f32,
    /// Top edge.
    pub top: f32,
    /// Width.
    pub width: f32,
    /// Height.
    pub height: f32,
}

impl AbsoluteRect {
    /// Create an absolute rectangle.
    #[must_use]
    pub const fn new(left: f32, top: f32, width: f32, height: f32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    /// Right edge.
    #[must_use]
    pub fn right(&self) -> f32 {
        self.left + self.width
    }

    /// Bottom edge.
    #[must_use]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Centre point.
    #[must_use]
    pub fn center(&self) -> Point {
        Point::new(
            self.left + self.width / 2.0,
            self.top + self.height / 2.0,
        )
    }

    /// Check if a point lies within this rectangle (edges inclusive).
    #[must_use]
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left
            && point.x <= self.right()
            && point.y >= self.top
            && point.y <= self.bottom()
    }
}

/// Convert normalized geometry into absolute units of `bounds`.
///
/// Returns `None` while the bounding box is not measurable.
#[must_use]
pub fn denormalize(rect: NormalizedRect, bounds: BoundingBox) -> Option<AbsoluteRect> {
    if !bounds.is_measurable() {
        return None;
    }
    Some(AbsoluteRect {
        left: rect.x / 100.0 * bounds.width,
        top: rect.y / 100.0 * bounds.height,
        width: rect.width / 100.0 * bounds.width,
        height: rect.height / 100.0 * bounds.height,
    })
}

/// Convert absolute geometry back into percentages of `bounds`.
///
/// Returns `None` while the bounding box is not measurable.
#[must_use]
pub fn normalize(rect: AbsoluteRect, bounds: BoundingBox) -> Option<NormalizedRect> {
    if !bounds.is_measurable() {
        return None;
    }
    Some(NormalizedRect {
        x: rect.left / bounds.width * 100.0,
        y: rect.top / bounds.height * 100.0,
        width: rect.width / bounds.width * 100.0,
        height: rect.height / bounds.height * 100.0,
    })
}

/// Normalize an angle in degrees into `[0, 360)`.
///
/// Non-finite input maps to `0.0`.
#[must_use]
pub fn normalize_rotation(degrees: f32) -> f32 {
    if !degrees.is_finite() {
        return 0.0;
    }
    let wrapped = degrees.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

/// Convert a pixel-equivalent font size into points.
#[must_use]
pub fn px_to_pt(px: f32) -> f32 {
    px * PX_TO_PT
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const TOLERANCE: f32 = 1e-3;

    fn approx(a: f32, b: f32) -> bool {
        (a - b).abs() < TOLERANCE
    }

    #[test]
    fn test_denormalize_scales_proportionally() {
        let rect = NormalizedRect::new(10.0, 20.0, 50.0, 25.0);
        let abs = denormalize(rect, BoundingBox::new(1000.0, 400.0)).expect("measurable");
        assert!(approx(abs.left, 100.0));
        assert!(approx(abs.top, 80.0));
        assert!(approx(abs.width, 500.0));
        assert!(approx(abs.height, 100.0));
    }

    #[test]
    fn test_percent_box_is_identity() {
        let rect = NormalizedRect::new(12.5, 33.0, 40.0, 10.0);
        let abs = denormalize(rect, BoundingBox::PERCENT).expect("measurable");
        assert!(approx(abs.left, 12.5));
        assert!(approx(abs.top, 33.0));
        assert!(approx(abs.width, 40.0));
        assert!(approx(abs.height, 10.0));
    }

    #[test]
    fn test_zero_sized_box_skips_conversion() {
        let rect = NormalizedRect::new(10.0, 10.0, 10.0, 10.0);
        assert!(denormalize(rect, BoundingBox::new(0.0, 600.0)).is_none());
        assert!(denormalize(rect, BoundingBox::new(800.0, 0.0)).is_none());
        assert!(normalize(AbsoluteRect::default(), BoundingBox::default()).is_none());
    }

    #[test]
    fn test_rotation_normalization_examples() {
        assert!(approx(normalize_rotation(-10.0), 350.0));
        assert!(approx(normalize_rotation(730.0), 10.0));
        assert!(approx(normalize_rotation(360.0), 0.0));
        assert!(approx(normalize_rotation(0.0), 0.0));
        assert!(approx(normalize_rotation(f32::NAN), 0.0));
    }

    #[test]
    fn test_px_to_pt() {
        assert!(approx(px_to_pt(58.0), 43.5));
    }

    #[test]
    fn test_contains_and_center() {
        let rect = AbsoluteRect::new(10.0, 10.0, 20.0, 40.0);
        assert!(rect.contains(Point::new(15.0, 30.0)));
        assert!(!rect.contains(Point::new(5.0, 30.0)));
        assert_eq!(rect.center(), Point::new(20.0, 30.0));
    }

    proptest! {
        #[test]
        fn prop_round_trip(
            x in 0.0f32..=100.0,
            y in 0.0f32..=100.0,
            w in 0.0f32..=100.0,
            h in 0.0f32..=100.0,
            bw in 1.0f32..4000.0,
            bh in 1.0f32..4000.0,
        ) {
            let rect = NormalizedRect::new(x, y, w, h);
            let bounds = BoundingBox::new(bw, bh);
            let back = denormalize(rect, bounds)
                .and_then(|abs| normalize(abs, bounds))
                .expect("measurable");
            prop_assert!(approx(back.x, x));
            prop_assert!(approx(back.y, y));
            prop_assert!(approx(back.width, w));
            prop_assert!(approx(back.height, h));
        }

        #[test]
        fn prop_rotation_in_range(deg in -100_000.0f32..100_000.0) {
            let r = normalize_rotation(deg);
            prop_assert!((0.0..360.0).contains(&r));
        }
    }
}
