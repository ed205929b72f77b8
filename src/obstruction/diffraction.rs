//! Shortest path over building roofs between a receiver and a source.

use tracing::trace;

use super::walker::{Crossing, TriangleWalker};
use super::ObstructionTest;
use crate::math::hull::{polyline_length, upper_convex_hull};
use crate::math::profile::project_to_profile;
use crate::math::{Point3, Segment3};
use crate::mesh::TriangleLocator;

/// Geometry of a diffraction path over building roofs.
///
/// Scalars are `-1.0` and zones are [`Segment3::sentinel`] when no usable
/// diffraction path exists.
#[derive(Debug, Clone, PartialEq)]
pub struct DiffractionData {
    /// Path length minus the direct receiver–source distance.
    pub delta_distance: f64,
    /// Path length between the first and the last diffraction corner.
    pub e_length: f64,
    /// Total length of the path, measured in the vertical profile.
    pub path_length: f64,
    /// Ground stretch from the receiver to the first corner.
    pub receiver_zone: Segment3,
    /// Ground stretch from the last corner to the source.
    pub source_zone: Segment3,
    /// Diffraction corners in path order.
    pub corners: Vec<Point3>,
}

impl Default for DiffractionData {
    fn default() -> Self {
        Self {
            delta_distance: -1.0,
            e_length: -1.0,
            path_length: -1.0,
            receiver_zone: Segment3::sentinel(),
            source_zone: Segment3::sentinel(),
            corners: Vec::new(),
        }
    }
}

impl DiffractionData {
    /// Whether a diffraction path was found.
    #[must_use]
    pub fn has_path(&self) -> bool {
        self.path_length >= 0.0
    }
}

impl ObstructionTest {
    /// Diffraction path from receiver `p1` to source `p2` over building
    /// roofs, using a fresh [`TriangleLocator`].
    #[must_use]
    pub fn path(&self, p1: &Point3, p2: &Point3) -> DiffractionData {
        self.path_with(&mut TriangleLocator::new(), p1, p2)
    }

    /// Same as [`path`](Self::path), locating endpoints through `locator`.
    ///
    /// The crossings of the line with the mesh are projected onto the
    /// vertical plane of the line, and the upper convex hull of that profile
    /// gives the path. Every hull vertex before the source must sit on a
    /// roof: a hull vertex on bare ground means terrain blocks the line and
    /// no path is returned. A hull going straight from receiver to source
    /// means there is nothing to diffract over.
    #[must_use]
    pub fn path_with(&self, locator: &mut TriangleLocator, p1: &Point3, p2: &Point3) -> DiffractionData {
        if !self.has_building_with_height {
            return DiffractionData::default();
        }
        let Some(ends) = self.endpoints(locator, p1, p2) else {
            trace!(?p1, ?p2, "endpoints rejected");
            return DiffractionData::default();
        };

        let crossings = self.collect_crossings(ends.receiver, ends.source, ends.receiver_triangle);
        let points: Vec<Point3> = crossings.iter().map(|c| c.point).collect();
        let profile = project_to_profile(&points);
        let hull = upper_convex_hull(&profile);
        if hull.len() <= 2 {
            trace!(crossings = crossings.len(), "no diffraction over a flat hull");
            return DiffractionData::default();
        }

        let source_index = crossings.len() - 1;
        let mut edges: Vec<(usize, usize)> = Vec::with_capacity(hull.len() - 1);
        for (i, pair) in hull.windows(2).enumerate() {
            let (from, to) = (pair[0], pair[1]);
            if !crossings[from].on_building {
                trace!(at = ?crossings[from].point, "terrain blocks the diffraction path");
                return DiffractionData::default();
            }
            edges.push((from, to));
            if to == source_index {
                if i == 0 {
                    return DiffractionData::default();
                }
                break;
            }
        }

        let (Some(&first), Some(&last)) = (edges.first(), edges.last()) else {
            return DiffractionData::default();
        };
        let edge_length = |&(a, b): &(usize, usize)| nalgebra::distance(&profile[a], &profile[b]);
        let path_length = polyline_length(&profile, &hull[..=edges.len()]);
        if !path_length.is_finite() {
            return DiffractionData::default();
        }
        let direct = nalgebra::distance(&profile[first.0], &profile[last.1]);

        let data = DiffractionData {
            delta_distance: path_length - direct,
            e_length: path_length - edge_length(&first) - edge_length(&last),
            path_length,
            receiver_zone: Segment3::new(ends.receiver, crossings[first.1].point),
            source_zone: Segment3::new(crossings[last.0].point, ends.source),
            corners: edges[1..].iter().map(|&(from, _)| crossings[from].point).collect(),
        };
        trace!(
            path_length = data.path_length,
            delta = data.delta_distance,
            corners = data.corners.len(),
            "diffraction path found"
        );
        data
    }

    /// Walks from the receiver to the source and returns the usable
    /// crossings, framed by the receiver and the source themselves.
    fn collect_crossings(&self, receiver: Point3, source: Point3, receiver_triangle: usize) -> Vec<Crossing> {
        let endpoint = |point| Crossing {
            triangle: None,
            point,
            on_building: true,
        };
        let mut crossings = vec![endpoint(receiver)];

        let target = source.xy();
        let mut walker = TriangleWalker::new(&self.mesh, Segment3::new(receiver, source));
        let mut current = Some(receiver_triangle);
        while let Some(triangle) = current {
            walker.visit(triangle);
            if self.mesh.contains(triangle, &target) {
                break;
            }
            current = walker.next_recording(triangle).map(|step| {
                crossings.extend(step.crossing);
                step.triangle
            });
        }

        crossings.push(endpoint(source));
        crossings
    }
}
