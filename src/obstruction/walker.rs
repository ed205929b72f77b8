//! Walks triangle adjacency along a propagation line.

use std::collections::HashSet;

use crate::math::interpolate::segment_z;
use crate::math::segment_2d::{point_to_segment_dist, segment_intersection, segment_segment_dist};
use crate::math::{Point2, Point3, Segment3, EPSILON};
use crate::mesh::{TerrainMesh, TriangleKind};

/// Sides in the order they are tried when leaving a triangle: A–B, B–C, C–A.
const SIDE_ORDER: [usize; 3] = [2, 0, 1];

/// A point where the propagation line crosses a triangle side.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Crossing {
    /// Triangle entered at this crossing; `None` for the receiver and source.
    pub triangle: Option<usize>,
    /// Crossing position; z is a roof elevation when `on_building` is set,
    /// otherwise the interpolated ground height.
    pub point: Point3,
    /// Whether the crossing sits on a building roof edge.
    pub on_building: bool,
}

/// One step of a recording walk.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Step {
    /// Triangle reached.
    pub triangle: usize,
    /// Crossing worth keeping for diffraction, if any.
    pub crossing: Option<Crossing>,
}

/// State of one walk: the propagation line, the triangles already visited
/// and how far along the line the walk has come.
#[derive(Debug)]
pub(crate) struct TriangleWalker<'a> {
    mesh: &'a TerrainMesh,
    line: Segment3,
    visited: HashSet<usize>,
    /// XY distance from the receiver to the last crossing.
    progress: f64,
}

/// A side the line can leave a triangle through.
#[derive(Debug, Clone, Copy)]
struct Exit {
    side: usize,
    next: usize,
    at: Point2,
    dist: f64,
    along: f64,
}

impl<'a> TriangleWalker<'a> {
    pub fn new(mesh: &'a TerrainMesh, line: Segment3) -> Self {
        Self {
            mesh,
            line,
            visited: HashSet::new(),
            progress: 0.0,
        }
    }

    /// Marks `triangle` as visited so the walk never returns to it.
    pub fn visit(&mut self, triangle: usize) {
        self.visited.insert(triangle);
    }

    /// Next triangle along the line, staying on ground.
    ///
    /// Returns `None` when no ground neighbor is crossed by the line, or when
    /// the terrain at the crossing rises above the line.
    pub fn next_silent(&mut self, triangle: usize) -> Option<usize> {
        let exit = self.exit_side(triangle, true)?;
        let (a, b) = self.mesh.side_points(triangle, exit.side);

        let topo_z = segment_z(&a, &b, &exit.at);
        let line_z = segment_z(&self.line.p0, &self.line.p1, &exit.at);
        if line_z < topo_z {
            return None;
        }
        self.advance(&exit);
        Some(exit.next)
    }

    /// Next triangle along the line, crossing into buildings as well, with
    /// the crossing classified for diffraction.
    ///
    /// Crossings between two triangles of the same roof, and crossings that
    /// land on the receiver or source, are walked through but not reported.
    /// Between two touching roofs the crossing takes the higher elevation.
    pub fn next_recording(&mut self, triangle: usize) -> Option<Step> {
        let exit = self.exit_side(triangle, false)?;
        let (a, b) = self.mesh.side_points(triangle, exit.side);
        let at = exit.at;

        let current_kind = self.mesh.triangle(triangle).kind;
        let next_kind = self.mesh.triangle(exit.next).kind;
        let current_elevation = self.mesh.elevation(current_kind);
        let next_elevation = self.mesh.elevation(next_kind);

        let (z, on_building, interior) = match (current_kind, next_kind) {
            (TriangleKind::Building(roof), TriangleKind::Building(other))
                if roof == other && next_elevation > 0.0 =>
            {
                (current_elevation, true, true)
            }
            (TriangleKind::Building(_), TriangleKind::Building(_)) if next_elevation > 0.0 => {
                (current_elevation.max(next_elevation), true, false)
            }
            (TriangleKind::Building(_), _) => (current_elevation, true, false),
            (TriangleKind::Ground, _) if next_elevation > 0.0 => (next_elevation, true, false),
            (TriangleKind::Ground, _) => (segment_z(&a, &b, &at), false, false),
        };

        let at_endpoint = at == self.line.p0.xy() || at == self.line.p1.xy();
        let crossing = (!interior && !at_endpoint).then(|| Crossing {
            triangle: Some(exit.next),
            point: Point3::new(at.x, at.y, z),
            on_building,
        });
        self.advance(&exit);
        Some(Step {
            triangle: exit.next,
            crossing,
        })
    }

    fn advance(&mut self, exit: &Exit) {
        self.progress = self.progress.max(exit.along);
    }

    /// Side of `triangle` through which the line leaves it.
    ///
    /// A side qualifies when its neighbor is unvisited (and on ground if
    /// `ground_only`), it lies within [`EPSILON`] of the line, and the line
    /// meets it no earlier than the walk's progress. The side reached
    /// farthest along the line wins, then the closest one; full ties keep
    /// the first in [`SIDE_ORDER`].
    fn exit_side(&self, triangle: usize, ground_only: bool) -> Option<Exit> {
        let (l0, l1) = self.line.xy();
        let mut best: Option<Exit> = None;

        for side in SIDE_ORDER {
            let Some(next) = self.mesh.neighbor(triangle, side) else {
                continue;
            };
            if self.visited.contains(&next) {
                continue;
            }
            if ground_only && self.mesh.triangle(next).kind.is_building() {
                continue;
            }
            let (a, b) = self.mesh.side_points(triangle, side);
            let dist = segment_segment_dist(&l0, &l1, &a.xy(), &b.xy());
            if dist >= EPSILON {
                continue;
            }
            let at = self.crossing_xy(&a, &b);
            let along = self.along(&at);
            if along < self.progress - EPSILON {
                continue;
            }
            let better = match best {
                None => true,
                Some(prev) => {
                    along > prev.along + EPSILON || ((along - prev.along).abs() <= EPSILON && dist < prev.dist)
                }
            };
            if better {
                best = Some(Exit {
                    side,
                    next,
                    at,
                    dist,
                    along,
                });
            }
        }
        best
    }

    /// Where the line crosses side `a`–`b` in XY.
    ///
    /// A side lying along the line is left at its far end. Falls back to the
    /// side endpoint nearest the line when the two only graze each other
    /// within tolerance.
    fn crossing_xy(&self, a: &Point3, b: &Point3) -> Point2 {
        let (l0, l1) = self.line.xy();
        let (a, b) = (a.xy(), b.xy());
        let (da, db) = (point_to_segment_dist(&a, &l0, &l1), point_to_segment_dist(&b, &l0, &l1));
        if da < EPSILON && db < EPSILON {
            return if self.along(&a) >= self.along(&b) { a } else { b };
        }
        segment_intersection(&l0, &l1, &a, &b).unwrap_or(if da <= db { a } else { b })
    }

    /// XY distance from the receiver to the projection of `p` on the line.
    fn along(&self, p: &Point2) -> f64 {
        let (l0, l1) = self.line.xy();
        let dir = l1 - l0;
        let len = dir.norm();
        if len <= 0.0 {
            0.0
        } else {
            (p - l0).dot(&dir) / len
        }
    }
}
