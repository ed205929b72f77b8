use std::sync::atomic::Ordering;

use tracing::trace;

use super::walker::TriangleWalker;
use super::ObstructionTest;
use crate::math::{Point3, Segment3};
use crate::mesh::TriangleLocator;

impl ObstructionTest {
    /// Whether the straight line from receiver `p1` to source `p2` is free of
    /// buildings and terrain.
    ///
    /// Uses a fresh [`TriangleLocator`]; see [`is_free_field_with`](Self::is_free_field_with)
    /// to reuse one across queries.
    #[must_use]
    pub fn is_free_field(&self, p1: &Point3, p2: &Point3) -> bool {
        self.is_free_field_with(&mut TriangleLocator::new(), p1, p2)
    }

    /// Same as [`is_free_field`](Self::is_free_field), locating endpoints
    /// through `locator`.
    ///
    /// The walk only crosses ground triangles and stops as soon as the
    /// terrain rises above the line, or a building lies ahead. Endpoints that
    /// fall off the mesh or inside a building are never visible.
    #[must_use]
    pub fn is_free_field_with(&self, locator: &mut TriangleLocator, p1: &Point3, p2: &Point3) -> bool {
        self.obstruction_tests.fetch_add(1, Ordering::Relaxed);

        let Some(ends) = self.endpoints(locator, p1, p2) else {
            trace!(?p1, ?p2, "endpoints rejected");
            return false;
        };

        let source = ends.source.xy();
        let mut walker = TriangleWalker::new(&self.mesh, Segment3::new(ends.receiver, ends.source));
        let mut current = Some(ends.receiver_triangle);
        while let Some(triangle) = current {
            walker.visit(triangle);
            if self.mesh.contains(triangle, &source) {
                trace!(triangle, "source reached");
                return true;
            }
            current = walker.next_silent(triangle);
        }
        trace!(?p1, ?p2, "line of sight blocked");
        false
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::super::tests::{init_tracing, rect, single_building};
    use super::*;
    use crate::mesh::{Building, MeshBuilder, MeshBuilderParams};

    fn hill() -> ObstructionTest {
        let mut builder = MeshBuilder::new(MeshBuilderParams { envelope_margin: 5.0 });
        for (x, y) in [(-10.0, -10.0), (30.0, -10.0), (30.0, 10.0), (-10.0, 10.0)] {
            builder.add_topography_point(Point3::new(x, y, 0.0));
        }
        builder.add_topography_point(Point3::new(10.0, 1.0, 20.0));
        builder.add_topography_point(Point3::new(10.0, -1.0, 20.0));
        ObstructionTest::new(builder.build().unwrap())
    }

    #[test]
    fn flat_ground_is_visible() {
        let test = single_building(0.0);
        assert!(test.is_free_field(&Point3::new(0.0, 0.0, 1.6), &Point3::new(20.0, 0.0, 1.6)));
        assert!(test.is_free_field(&Point3::new(-5.0, 10.0, 1.6), &Point3::new(25.0, -12.0, 1.6)));
    }

    #[test]
    fn building_blocks_line() {
        let test = single_building(10.0);
        assert!(!test.is_free_field(&Point3::new(0.0, 0.0, 1.6), &Point3::new(20.0, 0.0, 1.6)));
    }

    #[test]
    fn line_beside_building_is_visible() {
        let test = single_building(10.0);
        assert!(test.is_free_field(&Point3::new(0.0, 8.0, 1.6), &Point3::new(20.0, 8.0, 1.6)));
    }

    #[test]
    fn same_triangle_is_visible() {
        let test = single_building(10.0);
        let p = Point3::new(0.0, 0.0, 1.6);
        assert!(test.is_free_field(&p, &p));
    }

    #[test]
    fn terrain_blocks_line() {
        let test = hill();
        assert!(!test.is_free_field(&Point3::new(0.0, 0.0, 1.6), &Point3::new(20.0, 0.0, 1.6)));
        // High enough to clear the ridge.
        assert!(test.is_free_field(&Point3::new(0.0, 0.0, 40.0), &Point3::new(20.0, 0.0, 40.0)));
    }

    #[test]
    fn line_through_mesh_vertices_is_visible() {
        init_tracing();
        let mut builder = MeshBuilder::default();
        for (x, y) in [(0.0, 0.0), (5.0, 0.0), (10.0, 0.0), (15.0, 0.0), (20.0, 0.0), (10.0, 7.0), (10.0, -7.0)] {
            builder.add_topography_point(Point3::new(x, y, 0.0));
        }
        let test = ObstructionTest::new(builder.build().unwrap());

        // Both lines run along mesh edges and through shared vertices.
        assert!(test.is_free_field(&Point3::new(0.0, 0.0, 1.6), &Point3::new(20.0, 0.0, 1.6)));
        assert!(test.is_free_field(&Point3::new(-3.0, 0.0, 1.6), &Point3::new(23.0, 0.0, 1.6)));
        assert!(test.is_free_field(&Point3::new(20.0, 0.0, 1.6), &Point3::new(0.0, 0.0, 1.6)));
        assert!(test.is_free_field(&Point3::new(10.0, -9.0, 1.6), &Point3::new(10.0, 9.0, 1.6)));
    }

    #[test]
    fn building_of_unknown_height_blocks_line() {
        let mut builder = MeshBuilder::default();
        builder.add_building(Building::with_unknown_height(rect(5.0, -5.0, 15.0, 5.0, 0.0)));
        for (x, y) in [(-10.0, -15.0), (30.0, -15.0), (30.0, 15.0), (-10.0, 15.0)] {
            builder.add_topography_point(Point3::new(x, y, 0.0));
        }
        let test = ObstructionTest::new(builder.build().unwrap());
        assert!(test.has_building_with_height());
        assert!(!test.is_free_field(&Point3::new(0.0, 0.0, 1.6), &Point3::new(20.0, 0.0, 1.6)));
        assert!(test.is_free_field(&Point3::new(0.0, 8.0, 1.6), &Point3::new(20.0, 8.0, 1.6)));
    }

    #[test]
    fn endpoint_off_mesh_is_not_visible() {
        let test = single_building(10.0);
        assert!(!test.is_free_field(&Point3::new(0.0, 0.0, 1.6), &Point3::new(500.0, 0.0, 1.6)));
    }

    #[test]
    fn counter_counts_every_query() {
        let test = single_building(10.0);
        let mut locator = TriangleLocator::new();
        let p1 = Point3::new(0.0, 0.0, 1.6);
        let p2 = Point3::new(20.0, 0.0, 1.6);
        assert_eq!(test.obstruction_test_count(), 0);
        let _ = test.is_free_field_with(&mut locator, &p1, &p2);
        let _ = test.is_free_field_with(&mut locator, &p1, &Point3::new(500.0, 0.0, 1.6));
        assert_eq!(test.obstruction_test_count(), 2);
        assert!(locator.last_hit().is_some());
    }

    #[test]
    fn concurrent_queries_share_the_counter() {
        let test = single_building(10.0);
        std::thread::scope(|s| {
            for _ in 0..4 {
                s.spawn(|| {
                    let mut locator = TriangleLocator::new();
                    for _ in 0..25 {
                        assert!(!test.is_free_field_with(
                            &mut locator,
                            &Point3::new(0.0, 0.0, 1.6),
                            &Point3::new(20.0, 0.0, 1.6)
                        ));
                    }
                });
            }
        });
        assert_eq!(test.obstruction_test_count(), 100);
    }
}
