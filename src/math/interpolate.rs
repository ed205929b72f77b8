//! Topography height lookup on mesh triangles and segments.
//!
//! NaN heights are read as `0.0`. The substitution is local to each call;
//! the vertex store is never written to.

use super::{z_or_zero, Point2, Point3};

/// Height at `point.(x, y)` on the plane through `p1`, `p2`, `p3`.
///
/// Solves `ax + by + cz + d = 0` for `z`. Returns `0.0` when the plane is
/// vertical (its normal has no z component).
#[must_use]
pub fn plane_z(p1: &Point3, p2: &Point3, p3: &Point3, point: &Point2) -> f64 {
    let (z1, z2, z3) = (z_or_zero(p1.z), z_or_zero(p2.z), z_or_zero(p3.z));

    let a = (p2.y - p1.y) * (z3 - z1) - (z2 - z1) * (p3.y - p1.y);
    let b = (z2 - z1) * (p3.x - p1.x) - (p2.x - p1.x) * (z3 - z1);
    let c = (p2.x - p1.x) * (p3.y - p1.y) - (p2.y - p1.y) * (p3.x - p1.x);
    let d = -(a * p1.x + b * p1.y + c * z1);

    if c == 0.0 {
        return 0.0;
    }
    -(a * point.x + b * point.y + d) / c
}

/// Height at `at`, a point known to lie on segment `p1`–`p2`, by linear
/// interpolation.
///
/// Interpolates along the y span when it is non-zero, otherwise along the
/// x span. Returns `0.0` when the segment is a single point in XY.
#[must_use]
pub fn segment_z(p1: &Point3, p2: &Point3, at: &Point2) -> f64 {
    let (z1, z2) = (z_or_zero(p1.z), z_or_zero(p2.z));

    let dy = p2.y - p1.y;
    if dy != 0.0 {
        return (z2 - z1) * (at.y - p1.y) / dy + z1;
    }
    let dx = p2.x - p1.x;
    if dx != 0.0 {
        return (z2 - z1) * (at.x - p1.x) / dx + z1;
    }
    0.0
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn flat_plane_returns_its_height() {
        let a = Point3::new(0.0, 0.0, 4.5);
        let b = Point3::new(10.0, 0.0, 4.5);
        let c = Point3::new(0.0, 10.0, 4.5);
        for q in [Point2::new(1.0, 1.0), Point2::new(-30.0, 7.0), Point2::new(3.3, 99.0)] {
            assert_relative_eq!(plane_z(&a, &b, &c, &q), 4.5, epsilon = 1e-12);
        }
    }

    #[test]
    fn sloped_plane() {
        // z = x + 2y
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 1.0);
        let c = Point3::new(0.0, 1.0, 2.0);
        assert_relative_eq!(plane_z(&a, &b, &c, &Point2::new(3.0, 4.0)), 11.0, epsilon = 1e-12);
    }

    #[test]
    fn nan_vertex_height_reads_as_zero() {
        let a = Point3::new(0.0, 0.0, f64::NAN);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(0.0, 1.0, 0.0);
        assert_relative_eq!(plane_z(&a, &b, &c, &Point2::new(0.2, 0.2)), 0.0);
        assert!(a.z.is_nan());
    }

    #[test]
    fn vertical_plane_returns_zero() {
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 0.0, 0.0);
        let c = Point3::new(2.0, 0.0, 5.0);
        assert_relative_eq!(plane_z(&a, &b, &c, &Point2::new(0.5, 0.0)), 0.0);
    }

    #[test]
    fn segment_interpolates_along_y() {
        let p1 = Point3::new(0.0, 0.0, 0.0);
        let p2 = Point3::new(0.0, 10.0, 5.0);
        assert_relative_eq!(segment_z(&p1, &p2, &Point2::new(0.0, 4.0)), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn segment_falls_back_to_x_span() {
        let p1 = Point3::new(0.0, 3.0, 1.0);
        let p2 = Point3::new(8.0, 3.0, 5.0);
        assert_relative_eq!(segment_z(&p1, &p2, &Point2::new(2.0, 3.0)), 2.0, epsilon = 1e-12);
    }

    #[test]
    fn degenerate_segment_returns_zero() {
        let p1 = Point3::new(1.0, 1.0, 7.0);
        assert_relative_eq!(segment_z(&p1, &p1, &Point2::new(1.0, 1.0)), 0.0);
    }
}
