use serde::{Deserialize, Serialize};

/// An axis-aligned face bounding box in original frame pixel space.
///
/// `(x1, y1)` is the top-left corner, `(x2, y2)` the bottom-right.
/// Localizers map model-space coordinates back to frame space before
/// returning, so every box in the pipeline shares one convention.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BoundingBox {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl BoundingBox {
    pub fn new(x1: f64, y1: f64, x2: f64, y2: f64) -> Self {
        Self { x1, y1, x2, y2 }
    }

    pub fn width(&self) -> f64 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f64 {
        self.y2 - self.y1
    }

    /// A box with no positive area. Degenerate boxes are dropped
    /// before classification and never counted in the verdict.
    pub fn is_degenerate(&self) -> bool {
        self.x2 <= self.x1 || self.y2 <= self.y1
    }

    /// Clamps the box to `[0, width] × [0, height]`.
    ///
    /// Clamping can collapse a box that lies entirely outside the
    /// frame into a degenerate one; callers re-check afterwards.
    pub fn clamped(&self, frame_width: u32, frame_height: u32) -> Self {
        let w = frame_width as f64;
        let h = frame_height as f64;
        Self {
            x1: self.x1.clamp(0.0, w),
            y1: self.y1.clamp(0.0, h),
            x2: self.x2.clamp(0.0, w),
            y2: self.y2.clamp(0.0, h),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use rstest::rstest;

    #[test]
    fn test_dimensions() {
        let b = BoundingBox::new(10.0, 20.0, 40.0, 80.0);
        assert_relative_eq!(b.width(), 30.0);
        assert_relative_eq!(b.height(), 60.0);
    }

    #[rstest]
    #[case::valid(BoundingBox::new(0.0, 0.0, 10.0, 10.0), false)]
    #[case::zero_width(BoundingBox::new(10.0, 0.0, 10.0, 10.0), true)]
    #[case::zero_height(BoundingBox::new(0.0, 10.0, 10.0, 10.0), true)]
    #[case::inverted_x(BoundingBox::new(20.0, 0.0, 10.0, 10.0), true)]
    #[case::inverted_y(BoundingBox::new(0.0, 20.0, 10.0, 10.0), true)]
    fn test_is_degenerate(#[case] b: BoundingBox, #[case] expected: bool) {
        assert_eq!(b.is_degenerate(), expected);
    }

    #[test]
    fn test_clamped_inside_is_unchanged() {
        let b = BoundingBox::new(10.0, 10.0, 50.0, 50.0);
        assert_eq!(b.clamped(100, 100), b);
    }

    #[test]
    fn test_clamped_trims_overhang() {
        let b = BoundingBox::new(-5.0, -5.0, 120.0, 90.0);
        let c = b.clamped(100, 80);
        assert_relative_eq!(c.x1, 0.0);
        assert_relative_eq!(c.y1, 0.0);
        assert_relative_eq!(c.x2, 100.0);
        assert_relative_eq!(c.y2, 80.0);
    }

    #[test]
    fn test_clamped_fully_outside_becomes_degenerate() {
        let b = BoundingBox::new(200.0, 200.0, 300.0, 300.0);
        let c = b.clamped(100, 100);
        assert!(c.is_degenerate());
    }

    #[test]
    fn test_serde_round_trip() {
        let b = BoundingBox::new(1.5, 2.5, 3.5, 4.5);
        let json = serde_json::to_string(&b).unwrap();
        let back: BoundingBox = serde_json::from_str(&json).unwrap();
        assert_eq!(b, back);
    }
}
