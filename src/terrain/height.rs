//! Nearest-vertex surface height lookup.
//!
//! Heights are piecewise constant: a query returns the elevation of the
//! closest surface grid vertex, never an interpolated value. The error is
//! bounded by roughly half the local grid spacing.

use glam::Vec2;

use crate::error::{ensure_finite, TerrainError};
use crate::geometry::SurfaceIndex;

use super::mesh::{TerrainMesh, VertexId};

/// Returns the elevation of the surface vertex nearest to `(x, y)` using a
/// linear scan over all surface vertices.
///
/// Suitable for a handful of queries; use [`HeightQuery`] for anything
/// heavier.
pub fn surface_height(mesh: &TerrainMesh, x: f32, y: f32) -> Result<f32, TerrainError> {
    let id = nearest_surface_vertex(mesh, x, y)?;
    Ok(mesh.elevations()[id.index()])
}

/// Linear-scan nearest surface vertex. Ties resolve to the lowest id.
pub fn nearest_surface_vertex(mesh: &TerrainMesh, x: f32, y: f32) -> Result<VertexId, TerrainError> {
    let query = checked_query(x, y)?;

    let mut best: Option<(f32, usize)> = None;
    for (i, &p) in mesh.surface_positions().iter().enumerate() {
        let dist_sq = (p - query).length_squared();
        if best.map_or(true, |(d, _)| dist_sq < d) {
            best = Some((dist_sq, i));
        }
    }

    best.map(|(_, i)| VertexId(i as u32))
        .ok_or(TerrainError::EmptyMesh)
}

/// Read-only height lookup bound to a mesh and its surface index.
///
/// Cheap to copy and safe to share between threads once the mesh is no
/// longer mutated.
#[derive(Debug, Clone, Copy)]
pub struct HeightQuery<'a> {
    mesh: &'a TerrainMesh,
    index: &'a SurfaceIndex,
}

impl<'a> HeightQuery<'a> {
    /// Binds a query to `mesh`. The index must have been built from this
    /// mesh's surface vertices.
    pub fn new(mesh: &'a TerrainMesh, index: &'a SurfaceIndex) -> Result<Self, TerrainError> {
        if index.len() != mesh.surface_vertex_count() {
            return Err(TerrainError::invalid(
                "HeightQuery::new",
                "index",
                format!(
                    "index covers {} points but the mesh has {} surface vertices",
                    index.len(),
                    mesh.surface_vertex_count()
                ),
            ));
        }
        Ok(Self { mesh, index })
    }

    /// Binds an index the caller built from `mesh` itself.
    pub(crate) fn bound(mesh: &'a TerrainMesh, index: &'a SurfaceIndex) -> Self {
        debug_assert_eq!(index.len(), mesh.surface_vertex_count());
        Self { mesh, index }
    }

    pub fn mesh(&self) -> &'a TerrainMesh {
        self.mesh
    }

    /// Nearest surface vertex to `(x, y)`.
    pub fn nearest_vertex(&self, x: f32, y: f32) -> Result<VertexId, TerrainError> {
        let query = checked_query(x, y)?;
        self.index
            .nearest(query)
            .map(VertexId)
            .ok_or(TerrainError::EmptyMesh)
    }

    /// Elevation of the surface vertex nearest to `(x, y)`.
    pub fn surface_height(&self, x: f32, y: f32) -> Result<f32, TerrainError> {
        let id = self.nearest_vertex(x, y)?;
        Ok(self.mesh.elevations()[id.index()])
    }
}

fn checked_query(x: f32, y: f32) -> Result<Vec2, TerrainError> {
    ensure_finite("surface_height", "x", x)?;
    ensure_finite("surface_height", "y", y)?;
    Ok(Vec2::new(x, y))
}
