//! Open angle around each mesh vertex, used to pick diffraction corners.

use std::f64::consts::TAU;

use super::{ObstructionTest, WIDE_ANGLE_TRANSLATION_EPSILON};
use crate::math::angle::{angle_between, direction_angle, sector_bisector};
use crate::math::Point3;
use crate::mesh::TerrainMesh;

/// Per-vertex open angle and the point to test diffraction from.
///
/// The open angle of a vertex is the sum of the corner angles of the ground
/// triangles around it, capped at 2π. When the open region around a vertex
/// is one contiguous sector, its candidate point is moved by
/// [`WIDE_ANGLE_TRANSLATION_EPSILON`] along the sector bisector into open
/// space; otherwise the candidate is the vertex itself.
#[derive(Debug, Clone, Default)]
pub struct OpenAngles {
    angles: Vec<f64>,
    candidates: Vec<Point3>,
}

impl OpenAngles {
    #[must_use]
    pub fn compute(mesh: &TerrainMesh) -> Self {
        let vertices = mesh.vertices();
        let mut angles = vec![0.0; vertices.len()];
        let mut sectors: Vec<Vec<(f64, f64)>> = vec![Vec::new(); vertices.len()];

        for tri in mesh.triangles().iter().filter(|t| !t.kind.is_building()) {
            let [a, b, c] = tri.vertices;
            // Each corner with its two neighbors in counter-clockwise order.
            for (v, left, right) in [(a, b, c), (b, c, a), (c, a, b)] {
                let (at, l, r) = (vertices[v].xy(), vertices[left].xy(), vertices[right].xy());
                merge_sector(&mut sectors[v], direction_angle(&at, &l), direction_angle(&at, &r));
                angles[v] += angle_between(&l, &at, &r);
            }
        }

        let candidates = vertices
            .iter()
            .zip(&sectors)
            .map(|(vertex, sector)| match sector.as_slice() {
                &[(from, to)] => {
                    let (sin, cos) = sector_bisector(from, to).sin_cos();
                    Point3::new(
                        vertex.x + cos * WIDE_ANGLE_TRANSLATION_EPSILON,
                        vertex.y + sin * WIDE_ANGLE_TRANSLATION_EPSILON,
                        vertex.z,
                    )
                }
                _ => *vertex,
            })
            .collect();

        Self {
            angles: angles.into_iter().map(|a: f64| a.min(TAU)).collect(),
            candidates,
        }
    }

    /// Open angle of vertex `vertex`, in `[0, 2π]`.
    #[must_use]
    pub fn angle(&self, vertex: usize) -> Option<f64> {
        self.angles.get(vertex).copied()
    }

    /// Candidate point of vertex `vertex`.
    #[must_use]
    pub fn candidate(&self, vertex: usize) -> Option<Point3> {
        self.candidates.get(vertex).copied()
    }

    /// Candidate points of every vertex whose open angle lies in `[min, max]`,
    /// in vertex order.
    #[must_use]
    pub fn points_within(&self, min: f64, max: f64) -> Vec<Point3> {
        self.angles
            .iter()
            .zip(&self.candidates)
            .filter(|&(angle, _)| (min..=max).contains(angle))
            .map(|(_, &p)| p)
            .collect()
    }
}

/// Adds the counter-clockwise sector `from`→`to` to `sectors`, joining it
/// with sectors that share an exact endpoint.
///
/// A sector bridging two existing ones absorbs both.
#[allow(clippy::float_cmp)]
fn merge_sector(sectors: &mut Vec<(f64, f64)>, mut from: f64, mut to: f64) {
    loop {
        let Some(i) = sectors.iter().position(|&(start, end)| start == to || end == from) else {
            sectors.push((from, to));
            return;
        };
        let (start, end) = sectors[i];
        if sectors.len() > 1 {
            sectors.remove(i);
            if start == to {
                to = end;
            } else {
                from = start;
            }
        } else {
            if start == to {
                sectors[i].0 = from;
            } else {
                sectors[i].1 = to;
            }
            return;
        }
    }
}

impl ObstructionTest {
    /// Candidate diffraction corners: the open-angle candidate point of each
    /// vertex whose open angle lies in `[min_angle, max_angle]` (radians,
    /// within `[0, 2π]`).
    #[must_use]
    pub fn wide_angle_points(&self, min_angle: f64, max_angle: f64) -> Vec<Point3> {
        self.open_angles.points_within(min_angle, max_angle)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::f64::consts::{FRAC_PI_2, FRAC_PI_4, PI};

    use approx::assert_relative_eq;

    use super::super::tests::single_building;
    use super::*;
    use crate::math::polygon_2d::point_in_polygon;
    use crate::math::Point2;
    use crate::mesh::tests::unit_square;
    use crate::mesh::{Building, BuildingId, TriangleKind};

    #[test]
    fn sectors_join_on_shared_endpoints() {
        let mut sectors = Vec::new();
        merge_sector(&mut sectors, 0.0, 1.0);
        merge_sector(&mut sectors, 1.0, 2.0);
        assert_eq!(sectors, vec![(0.0, 2.0)]);
        merge_sector(&mut sectors, -1.0, 0.0);
        assert_eq!(sectors, vec![(-1.0, 2.0)]);
    }

    #[test]
    fn bridging_sector_absorbs_both_neighbors() {
        let mut sectors = Vec::new();
        merge_sector(&mut sectors, 0.0, 1.0);
        merge_sector(&mut sectors, 2.0, 3.0);
        assert_eq!(sectors.len(), 2);
        merge_sector(&mut sectors, 1.0, 2.0);
        assert_eq!(sectors, vec![(0.0, 3.0)]);
    }

    #[test]
    fn square_corners_open_a_right_angle() {
        let mesh = unit_square(TriangleKind::Ground, Vec::new());
        let open = OpenAngles::compute(&mesh);
        for v in 0..4 {
            assert_relative_eq!(open.angle(v).unwrap(), FRAC_PI_2, epsilon = 1e-12);
        }
        // Corner (0, 0) moves diagonally into the square.
        let c = open.candidate(0).unwrap();
        assert_relative_eq!(c.x, WIDE_ANGLE_TRANSLATION_EPSILON * FRAC_PI_4.cos(), epsilon = 1e-12);
        assert_relative_eq!(c.y, WIDE_ANGLE_TRANSLATION_EPSILON * FRAC_PI_4.sin(), epsilon = 1e-12);
        // Corner (1, 1), whose sector wraps past π.
        let c = open.candidate(2).unwrap();
        assert!(c.x < 1.0 && c.y < 1.0);
        assert_relative_eq!(nalgebra::distance(&c, &mesh.vertices()[2]), WIDE_ANGLE_TRANSLATION_EPSILON, epsilon = 1e-12);
    }

    #[test]
    fn building_triangles_close_the_angle() {
        let roof = Building::new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 0.0), Point3::new(0.0, 1.0, 0.0)],
            5.0,
        );
        let mesh = unit_square(TriangleKind::Building(BuildingId(0)), vec![roof]);
        let open = OpenAngles::compute(&mesh);
        assert_relative_eq!(open.angle(0).unwrap(), FRAC_PI_4, epsilon = 1e-12);
        assert_relative_eq!(open.angle(1).unwrap(), FRAC_PI_2, epsilon = 1e-12);
        assert_relative_eq!(open.angle(3).unwrap(), 0.0);
        // No ground triangle touches vertex 3: it stays in place.
        assert_eq!(open.candidate(3).unwrap(), mesh.vertices()[3]);
        assert!(open.angle(4).is_none());
    }

    #[test]
    fn full_range_returns_every_vertex() {
        let test = single_building(10.0);
        let all = test.wide_angle_points(0.0, TAU);
        assert_eq!(all.len(), test.mesh().vertices().len());
    }

    #[test]
    fn empty_range_returns_nothing() {
        let test = single_building(10.0);
        assert!(test.wide_angle_points(1.0, 1.0).is_empty());
        assert!(test.wide_angle_points(3.0, 2.0).is_empty());
    }

    #[test]
    fn building_corners_point_away_from_the_roof() {
        let test = single_building(10.0);
        let footprint: Vec<Point2> = test.mesh().buildings()[0].footprint().iter().map(|p| p.xy()).collect();

        let corners = test.wide_angle_points(PI + 0.1, TAU - 0.1);
        assert_eq!(corners.len(), 4);
        for c in &corners {
            assert!(!point_in_polygon(&c.xy(), &footprint));
            let nearest = footprint
                .iter()
                .map(|f| nalgebra::distance(f, &c.xy()))
                .fold(f64::MAX, f64::min);
            assert_relative_eq!(nearest, WIDE_ANGLE_TRANSLATION_EPSILON, epsilon = 1e-9);
        }
    }
}
