use thiserror::Error;

/// Top-level error type for the propamesh crate.
#[derive(Debug, Error)]
pub enum PropameshError {
    #[error(transparent)]
    Mesh(#[from] MeshError),

    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Structural errors in mesh data handed over by the mesh builder.
#[derive(Debug, Error)]
pub enum MeshError {
    #[error("neighbor table has {neighbors} entries but there are {triangles} triangles")]
    NeighborCountMismatch { triangles: usize, neighbors: usize },

    #[error("triangle {triangle} references vertex {vertex}, but only {count} vertices exist")]
    VertexOutOfRange {
        triangle: usize,
        vertex: usize,
        count: usize,
    },

    #[error("triangle {triangle} references neighbor {neighbor}, but only {count} triangles exist")]
    NeighborOutOfRange {
        triangle: usize,
        neighbor: usize,
        count: usize,
    },

    #[error("triangle {triangle} references building {building}, but only {count} buildings exist")]
    BuildingOutOfRange {
        triangle: usize,
        building: usize,
        count: usize,
    },

    #[error("mesh has no triangles")]
    Empty,
}

/// Errors raised while triangulating buildings and topography.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("building {building} footprint needs at least 3 distinct vertices, got {count}")]
    FootprintTooSmall { building: usize, count: usize },

    #[error("building {building} footprint crosses an existing constraint edge")]
    ConstraintConflict { building: usize },

    #[error("triangulation insert failed: {0}")]
    Insertion(String),

    #[error("nothing to triangulate")]
    NoInput,
}

/// Convenience type alias for results using [`PropameshError`].
pub type Result<T> = std::result::Result<T, PropameshError>;
