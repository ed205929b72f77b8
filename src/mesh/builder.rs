//! Constrained Delaunay triangulation of terrain and building footprints.

use std::collections::HashMap;

use spade::handles::FixedVertexHandle;
use spade::{ConstrainedDelaunayTriangulation, InsertionError, Point2 as SpadePoint2, Triangulation};
use tracing::debug;

use crate::error::{BuildError, Result};
use crate::math::polygon_2d::{open_ring, point_in_polygon};
use crate::math::{Point2, Point3};

use super::{Building, BuildingId, Envelope, TerrainMesh, Triangle, TriangleKind};

type Cdt = ConstrainedDelaunayTriangulation<SpadePoint2<f64>>;

/// Parameters controlling mesh construction.
#[derive(Debug, Clone, Copy)]
pub struct MeshBuilderParams {
    /// Distance added around the input extent to form the mesh domain.
    pub envelope_margin: f64,
}

impl Default for MeshBuilderParams {
    fn default() -> Self {
        Self { envelope_margin: 10.0 }
    }
}

/// Builds a [`TerrainMesh`] from building footprints and topography points.
///
/// Footprints become constraint loops in a constrained Delaunay
/// triangulation; triangles inside a footprint whose roof stands above zero
/// (or whose height is unknown) are flagged as that building. Zero-height
/// footprints still shape the triangulation but stay ground.
#[derive(Debug, Default)]
pub struct MeshBuilder {
    params: MeshBuilderParams,
    buildings: Vec<Building>,
    topography: Vec<Point3>,
    envelope: Option<Envelope>,
}

impl MeshBuilder {
    #[must_use]
    pub fn new(params: MeshBuilderParams) -> Self {
        Self {
            params,
            ..Self::default()
        }
    }

    /// Adds a building and returns its id in the finished mesh.
    pub fn add_building(&mut self, building: Building) -> BuildingId {
        for p in building.footprint() {
            self.include(p);
        }
        self.buildings.push(building);
        BuildingId(self.buildings.len() - 1)
    }

    /// Adds a terrain elevation sample.
    pub fn add_topography_point(&mut self, point: Point3) {
        self.include(&point);
        self.topography.push(point);
    }

    /// Makes sure the mesh domain covers `point` (e.g. a receiver or source).
    pub fn extend_envelope(&mut self, point: &Point3) {
        self.include(point);
    }

    fn include(&mut self, p: &Point3) {
        let xy = p.xy();
        match &mut self.envelope {
            Some(env) => env.expand_to_include(&xy),
            None => self.envelope = Some(Envelope::from_point(&xy)),
        }
    }

    /// Triangulates everything added so far.
    ///
    /// # Errors
    ///
    /// Returns a [`BuildError`] if nothing was added, a footprint has fewer
    /// than three distinct vertices, footprints cross each other, or a
    /// coordinate cannot be inserted (e.g. NaN x/y).
    pub fn build(self) -> Result<TerrainMesh> {
        let Some(envelope) = self.envelope else {
            return Err(BuildError::NoInput.into());
        };
        let domain = envelope.expanded_by(self.params.envelope_margin);

        let mut cdt = Cdt::new();
        let mut heights: HashMap<usize, f64> = HashMap::new();

        for corner in [
            Point3::new(domain.min.x, domain.min.y, f64::NAN),
            Point3::new(domain.max.x, domain.min.y, f64::NAN),
            Point3::new(domain.max.x, domain.max.y, f64::NAN),
            Point3::new(domain.min.x, domain.max.y, f64::NAN),
        ] {
            insert_point(&mut cdt, &mut heights, &corner)?;
        }
        for p in &self.topography {
            insert_point(&mut cdt, &mut heights, p)?;
        }
        for (id, building) in self.buildings.iter().enumerate() {
            insert_constraint_loop(&mut cdt, &mut heights, id, open_ring(building.footprint()))?;
        }

        let vertices = collect_vertices(&cdt, &heights);
        let footprints: Vec<Vec<Point2>> = self
            .buildings
            .iter()
            .map(|b| open_ring(b.footprint()).iter().map(Point3::xy).collect())
            .collect();

        let mut face_ids = HashMap::new();
        let mut triangles = Vec::with_capacity(cdt.num_inner_faces());
        for (id, face) in cdt.inner_faces().enumerate() {
            face_ids.insert(face.fix().index(), id);
            let [a, b, c] = face.vertices().map(|v| v.fix().index());
            let centroid = Point2::new(
                (vertices[a].x + vertices[b].x + vertices[c].x) / 3.0,
                (vertices[a].y + vertices[b].y + vertices[c].y) / 3.0,
            );
            let kind = classify(&centroid, &self.buildings, &footprints);
            triangles.push(Triangle::new(a, b, c, kind));
        }

        let mut neighbors = vec![[None; 3]; triangles.len()];
        for face in cdt.inner_faces() {
            let id = face_ids[&face.fix().index()];
            for edge in face.adjacent_edges() {
                let from = edge.from().fix().index();
                let to = edge.to().fix().index();
                let Some(side) = opposite_side(&triangles[id], from, to) else {
                    continue;
                };
                neighbors[id][side] = edge
                    .rev()
                    .face()
                    .as_inner()
                    .and_then(|n| face_ids.get(&n.fix().index()).copied());
            }
        }

        debug!(
            triangles = triangles.len(),
            vertices = vertices.len(),
            buildings = self.buildings.len(),
            "terrain triangulated"
        );

        TerrainMesh::new(self.buildings, triangles, neighbors, vertices)
    }
}

/// Inserts a vertex, keeping the first known height for coincident points.
fn insert_point(cdt: &mut Cdt, heights: &mut HashMap<usize, f64>, p: &Point3) -> Result<FixedVertexHandle> {
    let handle = cdt
        .insert(SpadePoint2::new(p.x, p.y))
        .map_err(|e: InsertionError| BuildError::Insertion(e.to_string()))?;
    let z = heights.entry(handle.index()).or_insert(p.z);
    if z.is_nan() {
        *z = p.z;
    }
    Ok(handle)
}

/// Inserts a closed footprint as constraint edges into the CDT.
fn insert_constraint_loop(
    cdt: &mut Cdt,
    heights: &mut HashMap<usize, f64>,
    building: usize,
    ring: &[Point3],
) -> Result<()> {
    let mut handles = Vec::with_capacity(ring.len());
    for p in ring {
        let h = insert_point(cdt, heights, p)?;
        if handles.last() != Some(&h) {
            handles.push(h);
        }
    }
    if handles.len() > 1 && handles.first() == handles.last() {
        handles.pop();
    }
    if handles.len() < 3 {
        return Err(BuildError::FootprintTooSmall {
            building,
            count: handles.len(),
        }
        .into());
    }

    for i in 0..handles.len() {
        let from = handles[i];
        let to = handles[(i + 1) % handles.len()];
        if !cdt.can_add_constraint(from, to) {
            return Err(BuildError::ConstraintConflict { building }.into());
        }
        cdt.add_constraint(from, to);
    }
    Ok(())
}

fn collect_vertices(cdt: &Cdt, heights: &HashMap<usize, f64>) -> Vec<Point3> {
    let mut vertices = vec![Point3::origin(); cdt.num_vertices()];
    for v in cdt.vertices() {
        let idx = v.fix().index();
        let pos = v.position();
        let z = heights.get(&idx).copied().unwrap_or(f64::NAN);
        vertices[idx] = Point3::new(pos.x, pos.y, z);
    }
    vertices
}

fn classify(centroid: &Point2, buildings: &[Building], footprints: &[Vec<Point2>]) -> TriangleKind {
    buildings
        .iter()
        .zip(footprints)
        .position(|(b, ring)| b.has_height() && point_in_polygon(centroid, ring))
        .map_or(TriangleKind::Ground, |id| TriangleKind::Building(BuildingId(id)))
}

/// Side of `tri` bounded by vertices `from` and `to`.
fn opposite_side(tri: &Triangle, from: usize, to: usize) -> Option<usize> {
    (0..3).find(|&side| {
        let (a, b) = tri.side(side);
        (a == from && b == to) || (a == to && b == from)
    })
}
