pub mod angle;
pub mod hull;
pub mod interpolate;
pub mod polygon_2d;
pub mod profile;
pub mod segment_2d;

/// 2D point type.
pub type Point2 = nalgebra::Point2<f64>;

/// 3D point type.
pub type Point3 = nalgebra::Point3<f64>;

/// Tolerance for line-to-segment distance and barycentric inclusion tests.
///
/// Geometric parity with reference outputs depends on this exact value.
pub const EPSILON: f64 = 1e-7;

/// A straight segment between two 3D points.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment3 {
    pub p0: Point3,
    pub p1: Point3,
}

impl Segment3 {
    #[must_use]
    pub fn new(p0: Point3, p1: Point3) -> Self {
        Self { p0, p1 }
    }

    /// Zero-length segment at (-1, -1, -1), used where no segment exists.
    #[must_use]
    pub fn sentinel() -> Self {
        let p = Point3::new(-1.0, -1.0, -1.0);
        Self { p0: p, p1: p }
    }

    /// 3D length of the segment.
    #[must_use]
    pub fn length(&self) -> f64 {
        nalgebra::distance(&self.p0, &self.p1)
    }

    /// Projection of the segment onto the XY plane.
    #[must_use]
    pub fn xy(&self) -> (Point2, Point2) {
        (self.p0.xy(), self.p1.xy())
    }
}

/// Returns `z`, or `0.0` when it is NaN.
#[must_use]
pub(crate) fn z_or_zero(z: f64) -> f64 {
    if z.is_nan() {
        0.0
    } else {
        z
    }
}
