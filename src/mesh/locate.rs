use crate::math::{Point2, EPSILON};

use super::TerrainMesh;

/// Barycentric point-in-triangle test in XY.
///
/// Points within [`EPSILON`] (in barycentric units) of an edge count as inside.
#[must_use]
pub fn point_in_triangle(p: &Point2, a: &Point2, b: &Point2, c: &Point2) -> bool {
    let v0 = c - a;
    let v1 = b - a;
    let v2 = p - a;

    let dot00 = v0.dot(&v0);
    let dot01 = v0.dot(&v1);
    let dot02 = v0.dot(&v2);
    let dot11 = v1.dot(&v1);
    let dot12 = v1.dot(&v2);

    let inv_denom = 1.0 / (dot00 * dot11 - dot01 * dot01);
    let u = (dot11 * dot02 - dot01 * dot12) * inv_denom;
    let v = (dot00 * dot12 - dot01 * dot02) * inv_denom;

    u > -EPSILON && v > -EPSILON && u + v < 1.0 + EPSILON
}

/// Point-to-triangle lookup that remembers its last hit.
///
/// Successive queries near each other usually fall in the same triangle, so
/// the previous result is tested before the spatial index. The cache belongs
/// to the caller: keep one locator per query sequence or per thread.
#[derive(Debug, Default, Clone)]
pub struct TriangleLocator {
    last_hit: Option<usize>,
}

impl TriangleLocator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Triangle returned by the most recent successful lookup.
    #[must_use]
    pub fn last_hit(&self) -> Option<usize> {
        self.last_hit
    }

    /// Id of the triangle whose XY footprint contains `p`.
    pub fn locate(&mut self, mesh: &TerrainMesh, p: &Point2) -> Option<usize> {
        if let Some(last) = self.last_hit {
            if mesh.contains(last, p) {
                return Some(last);
            }
        }
        let found = mesh
            .candidates(p)
            .into_iter()
            .find(|&id| mesh.contains(id, p))?;
        self.last_hit = Some(found);
        Some(found)
    }
}
