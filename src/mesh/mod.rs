pub mod builder;
pub mod locate;
pub mod spatial;

pub use builder::{MeshBuilder, MeshBuilderParams};
pub use locate::TriangleLocator;
pub use spatial::{Envelope, GridIndex, SpatialIndex};

use tracing::debug;

use crate::error::{MeshError, Result};
use crate::math::polygon_2d::open_ring;
use crate::math::{z_or_zero, Point2, Point3};

/// Elevation carried by buildings whose height is not known.
pub const UNKNOWN_HEIGHT: f64 = f64::MAX;

/// Index of a building in the mesh's building list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BuildingId(pub usize);

/// What a triangle's footprint belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TriangleKind {
    /// Open ground.
    Ground,
    /// Inside the footprint of a building.
    Building(BuildingId),
}

impl TriangleKind {
    /// Decodes the integer convention used by mesh producers: `0` is ground,
    /// `n > 0` is building `n - 1`.
    #[must_use]
    pub fn from_raw(raw: i64) -> Self {
        match raw.checked_sub(1).and_then(|id| usize::try_from(id).ok()) {
            Some(id) => Self::Building(BuildingId(id)),
            None => Self::Ground,
        }
    }

    /// Inverse of [`from_raw`](Self::from_raw).
    #[must_use]
    pub fn to_raw(self) -> i64 {
        match self {
            Self::Ground => 0,
            Self::Building(BuildingId(id)) => i64::try_from(id).map_or(i64::MAX, |id| id + 1),
        }
    }

    #[must_use]
    pub fn is_building(self) -> bool {
        matches!(self, Self::Building(_))
    }
}

/// A mesh triangle: three vertex ids in counter-clockwise order (A, B, C).
///
/// Side `0` is B–C, side `1` is C–A, side `2` is A–B; side `s` is opposite
/// vertex `s`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Triangle {
    pub vertices: [usize; 3],
    pub kind: TriangleKind,
}

impl Triangle {
    #[must_use]
    pub fn new(a: usize, b: usize, c: usize, kind: TriangleKind) -> Self {
        Self {
            vertices: [a, b, c],
            kind,
        }
    }

    /// Vertex ids bounding side `side`.
    #[must_use]
    pub fn side(&self, side: usize) -> (usize, usize) {
        let [a, b, c] = self.vertices;
        match side {
            0 => (b, c),
            1 => (c, a),
            _ => (a, b),
        }
    }
}

/// A building footprint with its height.
#[derive(Debug, Clone)]
pub struct Building {
    footprint: Vec<Point3>,
    height: Option<f64>,
    elevation: f64,
}

impl Building {
    /// Creates a building standing `height` above its footprint vertices.
    ///
    /// The roof elevation is the mean of `vertex.z + height` over the
    /// footprint ring. Rings with fewer than three distinct vertices get an
    /// elevation of `0.0`.
    #[must_use]
    pub fn new(footprint: Vec<Point3>, height: f64) -> Self {
        let elevation = average_elevation(&footprint, height);
        Self {
            footprint,
            height: Some(height),
            elevation,
        }
    }

    /// Creates a building whose height is not known. Its elevation is
    /// [`UNKNOWN_HEIGHT`].
    #[must_use]
    pub fn with_unknown_height(footprint: Vec<Point3>) -> Self {
        Self {
            footprint,
            height: None,
            elevation: UNKNOWN_HEIGHT,
        }
    }

    #[must_use]
    pub fn footprint(&self) -> &[Point3] {
        &self.footprint
    }

    /// Height above ground as given at construction.
    #[must_use]
    pub fn nominal_height(&self) -> Option<f64> {
        self.height
    }

    /// Normalized roof elevation.
    #[must_use]
    pub fn elevation(&self) -> f64 {
        self.elevation
    }

    /// Whether the roof stands above zero.
    #[must_use]
    pub fn has_height(&self) -> bool {
        self.elevation > 0.0
    }
}

#[allow(clippy::cast_precision_loss)]
fn average_elevation(footprint: &[Point3], height: f64) -> f64 {
    let ring = open_ring(footprint);
    if ring.len() < 3 {
        return 0.0;
    }
    let sum: f64 = ring.iter().map(|p| z_or_zero(p.z) + height).sum();
    sum / ring.len() as f64
}

/// Immutable triangulated terrain with embedded building footprints.
///
/// Triangles, vertices and adjacency are plain arrays indexed by integer id.
#[derive(Debug)]
pub struct TerrainMesh {
    vertices: Vec<Point3>,
    triangles: Vec<Triangle>,
    neighbors: Vec<[Option<usize>; 3]>,
    buildings: Vec<Building>,
    envelope: Envelope,
    index: Box<dyn SpatialIndex>,
}

impl TerrainMesh {
    /// Creates a mesh indexed by a [`GridIndex`] sized for its extent.
    ///
    /// `neighbors[t][s]` is the triangle across side `s` of triangle `t`, or
    /// `None` on the mesh boundary.
    ///
    /// # Errors
    ///
    /// Returns a [`MeshError`] if the arrays are inconsistent: mismatched
    /// lengths, or vertex, neighbor or building ids out of range.
    pub fn new(
        buildings: Vec<Building>,
        triangles: Vec<Triangle>,
        neighbors: Vec<[Option<usize>; 3]>,
        vertices: Vec<Point3>,
    ) -> Result<Self> {
        validate(&buildings, &triangles, &neighbors, &vertices)?;
        let envelope = mesh_envelope(&triangles, &vertices);
        let index = GridIndex::for_extent(&envelope, triangles.len());
        Ok(Self::assemble(buildings, triangles, neighbors, vertices, envelope, Box::new(index)))
    }

    /// Creates a mesh using a caller-provided spatial index. The index is
    /// filled with every triangle's envelope.
    ///
    /// # Errors
    ///
    /// Same as [`new`](Self::new).
    pub fn with_index(
        buildings: Vec<Building>,
        triangles: Vec<Triangle>,
        neighbors: Vec<[Option<usize>; 3]>,
        vertices: Vec<Point3>,
        index: Box<dyn SpatialIndex>,
    ) -> Result<Self> {
        validate(&buildings, &triangles, &neighbors, &vertices)?;
        let envelope = mesh_envelope(&triangles, &vertices);
        Ok(Self::assemble(buildings, triangles, neighbors, vertices, envelope, index))
    }

    fn assemble(
        buildings: Vec<Building>,
        triangles: Vec<Triangle>,
        neighbors: Vec<[Option<usize>; 3]>,
        vertices: Vec<Point3>,
        envelope: Envelope,
        mut index: Box<dyn SpatialIndex>,
    ) -> Self {
        for (id, tri) in triangles.iter().enumerate() {
            let corners = tri.vertices.iter().map(|&v| &vertices[v]);
            if let Some(env) = Envelope::from_points(corners) {
                index.insert(&env, id);
            }
        }
        debug!(
            triangles = triangles.len(),
            vertices = vertices.len(),
            buildings = buildings.len(),
            "terrain mesh indexed"
        );
        Self {
            vertices,
            triangles,
            neighbors,
            buildings,
            envelope,
            index,
        }
    }

    #[must_use]
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    #[must_use]
    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    #[must_use]
    pub fn neighbors(&self) -> &[[Option<usize>; 3]] {
        &self.neighbors
    }

    #[must_use]
    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    /// XY extent of all triangles.
    #[must_use]
    pub fn envelope(&self) -> &Envelope {
        &self.envelope
    }

    /// Triangle `id`. Panics if `id` is out of range.
    #[must_use]
    pub fn triangle(&self, id: usize) -> &Triangle {
        &self.triangles[id]
    }

    /// Triangle across side `side` of triangle `id`.
    #[must_use]
    pub fn neighbor(&self, id: usize, side: usize) -> Option<usize> {
        self.neighbors[id][side]
    }

    /// Coordinates of the three corners of triangle `id`.
    #[must_use]
    pub fn corners(&self, id: usize) -> [Point3; 3] {
        self.triangles[id].vertices.map(|v| self.vertices[v])
    }

    /// Coordinates of the endpoints of side `side` of triangle `id`.
    #[must_use]
    pub fn side_points(&self, id: usize, side: usize) -> (Point3, Point3) {
        let (a, b) = self.triangles[id].side(side);
        (self.vertices[a], self.vertices[b])
    }

    /// Roof elevation over a triangle: `0.0` for ground.
    #[must_use]
    pub fn elevation(&self, kind: TriangleKind) -> f64 {
        match kind {
            TriangleKind::Ground => 0.0,
            TriangleKind::Building(BuildingId(b)) => self.buildings[b].elevation(),
        }
    }

    /// Whether triangle `id` contains `p` in XY, boundary included.
    #[must_use]
    pub fn contains(&self, id: usize, p: &Point2) -> bool {
        let [a, b, c] = self.corners(id);
        locate::point_in_triangle(p, &a.xy(), &b.xy(), &c.xy())
    }

    /// Candidate triangles whose envelope may contain `p`.
    #[must_use]
    pub fn candidates(&self, p: &Point2) -> Vec<usize> {
        self.index.query(&Envelope::from_point(p))
    }
}

fn mesh_envelope(triangles: &[Triangle], vertices: &[Point3]) -> Envelope {
    let used = triangles.iter().flat_map(|t| t.vertices.iter().map(|&v| &vertices[v]));
    Envelope::from_points(used).unwrap_or_else(|| Envelope::from_point(&Point2::origin()))
}

fn validate(
    buildings: &[Building],
    triangles: &[Triangle],
    neighbors: &[[Option<usize>; 3]],
    vertices: &[Point3],
) -> Result<()> {
    if triangles.is_empty() {
        return Err(MeshError::Empty.into());
    }
    if neighbors.len() != triangles.len() {
        return Err(MeshError::NeighborCountMismatch {
            triangles: triangles.len(),
            neighbors: neighbors.len(),
        }
        .into());
    }
    for (id, tri) in triangles.iter().enumerate() {
        if let Some(&vertex) = tri.vertices.iter().find(|&&v| v >= vertices.len()) {
            return Err(MeshError::VertexOutOfRange {
                triangle: id,
                vertex,
                count: vertices.len(),
            }
            .into());
        }
        if let TriangleKind::Building(BuildingId(building)) = tri.kind {
            if building >= buildings.len() {
                return Err(MeshError::BuildingOutOfRange {
                    triangle: id,
                    building,
                    count: buildings.len(),
                }
                .into());
            }
        }
        if let Some(&neighbor) = neighbors[id].iter().flatten().find(|&&n| n >= triangles.len()) {
            return Err(MeshError::NeighborOutOfRange {
                triangle: id,
                neighbor,
                count: triangles.len(),
            }
            .into());
        }
    }
    Ok(())
}
