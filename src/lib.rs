pub mod error;
pub mod math;
pub mod mesh;
pub mod obstruction;

pub use error::{PropameshError, Result};
pub use mesh::{Building, BuildingId, MeshBuilder, TerrainMesh, Triangle, TriangleKind, TriangleLocator};
pub use obstruction::{DiffractionData, ObstructionTest};
