//! Visibility and diffraction queries over a [`TerrainMesh`].
//!
//! [`ObstructionTest`] is immutable once built and can be shared between
//! threads. Every query takes its own [`TriangleLocator`] (either passed in
//! by the caller through the `*_with` variants, or a fresh one).

mod diffraction;
mod limits;
mod open_angle;
mod visibility;
mod walker;

pub use diffraction::DiffractionData;
pub use open_angle::OpenAngles;
pub use walker::Crossing;

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

use crate::math::interpolate::plane_z;
use crate::math::Point3;
use crate::mesh::{TerrainMesh, TriangleLocator};

/// Distance by which single-sector corner candidates are pushed into open space.
pub const WIDE_ANGLE_TRANSLATION_EPSILON: f64 = 0.01;

/// Height above topography given to receivers that sit below the ground.
pub const RECEIVER_DEFAULT_HEIGHT: f64 = 1.6;

/// Line-of-sight and diffraction queries over an immutable terrain mesh.
#[derive(Debug)]
pub struct ObstructionTest {
    mesh: TerrainMesh,
    open_angles: OpenAngles,
    has_building_with_height: bool,
    obstruction_tests: AtomicU64,
}

/// Receiver and source after height correction, with their triangles.
#[derive(Debug, Clone, Copy)]
struct Endpoints {
    receiver: Point3,
    source: Point3,
    receiver_triangle: usize,
}

impl ObstructionTest {
    /// Wraps `mesh` and precomputes vertex open angles.
    #[must_use]
    pub fn new(mesh: TerrainMesh) -> Self {
        let has_building_with_height = mesh.buildings().iter().any(|b| b.has_height());
        let open_angles = OpenAngles::compute(&mesh);
        debug!(
            triangles = mesh.triangles().len(),
            has_building_with_height, "obstruction test ready"
        );
        Self {
            mesh,
            open_angles,
            has_building_with_height,
            obstruction_tests: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn mesh(&self) -> &TerrainMesh {
        &self.mesh
    }

    #[must_use]
    pub fn open_angles(&self) -> &OpenAngles {
        &self.open_angles
    }

    /// Whether at least one building has a roof above zero.
    #[must_use]
    pub fn has_building_with_height(&self) -> bool {
        self.has_building_with_height
    }

    /// A fresh locator for the `*_with` queries.
    ///
    /// Reusing it across nearby queries on one thread skips most spatial
    /// index lookups.
    #[must_use]
    pub fn locator(&self) -> TriangleLocator {
        TriangleLocator::new()
    }

    /// Number of visibility tests run so far, across all threads.
    #[must_use]
    pub fn obstruction_test_count(&self) -> u64 {
        self.obstruction_tests.load(Ordering::Relaxed)
    }

    /// Locates both endpoints and applies the height rules shared by the
    /// visibility and diffraction queries.
    ///
    /// Returns `None` when an endpoint is off the mesh or inside a building,
    /// or when the source lies below the topography. A receiver below the
    /// topography (or without height) is lifted to
    /// [`RECEIVER_DEFAULT_HEIGHT`] above it.
    fn endpoints(&self, locator: &mut TriangleLocator, p1: &Point3, p2: &Point3) -> Option<Endpoints> {
        let receiver_triangle = locator.locate(&self.mesh, &p1.xy())?;
        let source_triangle = locator.locate(&self.mesh, &p2.xy())?;
        if self.mesh.triangle(receiver_triangle).kind.is_building()
            || self.mesh.triangle(source_triangle).kind.is_building()
        {
            return None;
        }

        let topo_receiver = self.topography_z(receiver_triangle, p1);
        let topo_source = self.topography_z(source_triangle, p2);

        let mut receiver = *p1;
        if receiver.z < topo_receiver || receiver.z.is_nan() {
            receiver.z = topo_receiver + RECEIVER_DEFAULT_HEIGHT;
        }
        if p2.z < topo_source {
            return None;
        }

        Some(Endpoints {
            receiver,
            source: *p2,
            receiver_triangle,
        })
    }

    fn topography_z(&self, triangle: usize, p: &Point3) -> f64 {
        let [a, b, c] = self.mesh.corners(triangle);
        plane_z(&a, &b, &c, &p.xy())
    }
}
