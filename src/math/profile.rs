//! Projection of 3D points onto the vertical plane of a propagation line.

use super::angle::direction_angle;
use super::{z_or_zero, Point2, Point3};

/// Projects `points` onto the vertical plane through the first and last point.
///
/// Each result is `(distance along the first→last azimuth, height)`, with the
/// first point at distance zero. The mapping is only length-preserving for
/// points lying in that plane. NaN heights read as `0.0`.
#[must_use]
pub fn project_to_profile(points: &[Point3]) -> Vec<Point2> {
    let (Some(first), Some(last)) = (points.first(), points.last()) else {
        return Vec::new();
    };
    let azimuth = direction_angle(&first.xy(), &last.xy());
    let (sin, cos) = azimuth.sin_cos();

    points
        .iter()
        .map(|p| {
            let along = (p.x - first.x) * cos + (p.y - first.y) * sin;
            Point2::new(along, z_or_zero(p.z))
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn diagonal_line_profile() {
        let pts = [
            Point3::new(1.0, 1.0, 2.0),
            Point3::new(4.0, 5.0, 7.0),
            Point3::new(7.0, 9.0, f64::NAN),
        ];
        let profile = project_to_profile(&pts);
        assert_eq!(profile.len(), 3);
        assert_relative_eq!(profile[0].x, 0.0);
        assert_relative_eq!(profile[1].x, 5.0, epsilon = 1e-12);
        assert_relative_eq!(profile[1].y, 7.0);
        assert_relative_eq!(profile[2].x, 10.0, epsilon = 1e-12);
        assert_relative_eq!(profile[2].y, 0.0);
    }

    #[test]
    fn in_plane_distances_are_preserved() {
        let pts = [
            Point3::new(-2.0, 3.0, 1.0),
            Point3::new(1.0, -1.0, 6.0),
            Point3::new(4.0, -5.0, 2.0),
        ];
        let profile = project_to_profile(&pts);
        for (i, j) in [(0, 1), (1, 2), (0, 2)] {
            assert_relative_eq!(
                nalgebra::distance(&profile[i], &profile[j]),
                nalgebra::distance(&pts[i], &pts[j]),
                epsilon = 1e-9
            );
        }
    }

    #[test]
    fn empty_input() {
        assert!(project_to_profile(&[]).is_empty());
    }
}
