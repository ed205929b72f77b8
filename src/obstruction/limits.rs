use std::collections::HashSet;

use tracing::trace;

use super::ObstructionTest;
use crate::math::segment_2d::point_to_segment_dist;
use crate::math::{Point3, Segment3};
use crate::mesh::TriangleLocator;

impl ObstructionTest {
    /// Mesh boundary and building walls within `max_dist` of `origin` (in XY),
    /// using a fresh [`TriangleLocator`].
    #[must_use]
    pub fn limits_in_range(&self, max_dist: f64, origin: &Point3) -> Vec<Segment3> {
        self.limits_in_range_with(&mut TriangleLocator::new(), max_dist, origin)
    }

    /// Same as [`limits_in_range`](Self::limits_in_range), locating the
    /// origin through `locator`.
    ///
    /// Explores the mesh depth-first from the origin's triangle, only through
    /// sides within range. A side is a wall when no triangle lies behind it
    /// or the triangle behind it belongs to a building. Returns nothing when
    /// the origin is off the mesh.
    #[must_use]
    pub fn limits_in_range_with(
        &self,
        locator: &mut TriangleLocator,
        max_dist: f64,
        origin: &Point3,
    ) -> Vec<Segment3> {
        let mut walls = Vec::new();
        let o = origin.xy();
        let Some(start) = locator.locate(&self.mesh, &o) else {
            return walls;
        };

        let mut visited = HashSet::new();
        // Triangles to come back to, with the side to resume from.
        let mut stack: Vec<(usize, usize)> = Vec::new();
        let mut current = Some((start, 0));

        while let Some((triangle, first_side)) = current.take() {
            visited.insert(triangle);
            for side in first_side..3 {
                let neighbor = self.mesh.neighbor(triangle, side);
                if neighbor.is_some_and(|n| visited.contains(&n)) {
                    continue;
                }
                let (a, b) = self.mesh.side_points(triangle, side);
                if point_to_segment_dist(&o, &a.xy(), &b.xy()) > max_dist {
                    continue;
                }
                match neighbor {
                    Some(next) if !self.mesh.triangle(next).kind.is_building() => {
                        stack.push((triangle, side));
                        current = Some((next, 0));
                        break;
                    }
                    _ => walls.push(Segment3::new(a, b)),
                }
            }
            if current.is_none() {
                current = stack.pop();
            }
        }

        trace!(walls = walls.len(), visited = visited.len(), "limits collected");
        walls
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use approx::assert_relative_eq;

    use super::super::tests::single_building;
    use super::*;
    use crate::mesh::tests::unit_square;
    use crate::mesh::{Building, BuildingId, TriangleKind};

    fn square(kind: TriangleKind) -> ObstructionTest {
        let roof = Building::new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            5.0,
        );
        ObstructionTest::new(unit_square(kind, vec![roof]))
    }

    #[test]
    fn open_square_is_bounded_by_its_outline() {
        let test = square(TriangleKind::Ground);
        let walls = test.limits_in_range(10.0, &Point3::new(0.5, 0.5, 0.0));
        assert_eq!(walls.len(), 4);
        let perimeter: f64 = walls.iter().map(Segment3::length).sum();
        assert_relative_eq!(perimeter, 4.0, epsilon = 1e-12);
    }

    #[test]
    fn building_side_is_a_wall() {
        let test = square(TriangleKind::Building(BuildingId(0)));
        let walls = test.limits_in_range(10.0, &Point3::new(0.8, 0.2, 0.0));
        assert_eq!(walls.len(), 3);
        assert!(walls
            .iter()
            .any(|w| (w.length() - std::f64::consts::SQRT_2).abs() < 1e-12));
    }

    #[test]
    fn walls_out_of_range_are_skipped() {
        let test = square(TriangleKind::Ground);
        let walls = test.limits_in_range(0.1, &Point3::new(0.9, 0.5, 0.0));
        assert_eq!(walls.len(), 1);
        assert_relative_eq!(walls[0].p0.x, 1.0);
        assert_relative_eq!(walls[0].p1.x, 1.0);
    }

    #[test]
    fn origin_off_mesh_has_no_limits() {
        let test = square(TriangleKind::Ground);
        assert!(test.limits_in_range(10.0, &Point3::new(5.0, 5.0, 0.0)).is_empty());
    }

    #[test]
    fn nearby_building_face_only() {
        let test = single_building(10.0);
        let walls = test.limits_in_range(6.0, &Point3::new(0.0, 0.0, 1.6));
        assert_eq!(walls.len(), 1);
        assert_relative_eq!(walls[0].p0.x, 5.0);
        assert_relative_eq!(walls[0].p1.x, 5.0);
    }

    #[test]
    fn whole_mesh_in_range() {
        let test = single_building(10.0);
        let walls = test.limits_in_range(1000.0, &Point3::new(0.0, 0.0, 1.6));
        // Four building faces and the four sides of the domain.
        assert_eq!(walls.len(), 8);
    }
}
