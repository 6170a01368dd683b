//! Heightfield mesh with fixed planar layout and mutable elevation.

use glam::{Vec2, Vec3};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_positive, TerrainError};
use crate::geometry::{Region, SurfaceIndex};

/// Largest supported subdivision count; keeps vertex ids within `u32`.
pub const MAX_SUBDIVISIONS: u32 = 16_384;

/// Stable identifier of a mesh vertex.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(pub u32);

impl VertexId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Read-only view of one vertex.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Vertex {
    pub id: VertexId,
    /// Planar position, fixed at creation.
    pub position: Vec2,
    /// Current elevation.
    pub elevation: f32,
}

impl Vertex {
    /// Position as a 3D point with elevation on the z axis.
    pub fn point(&self) -> Vec3 {
        self.position.extend(self.elevation)
    }
}

/// Creation-time perturbation of interior grid vertices.
///
/// Zero values (the default) produce a perfectly regular, flat grid.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeshOptions {
    /// Maximum planar offset of interior vertices, as a fraction of the grid
    /// spacing, in `[0, 0.5)`.
    pub planar_jitter: f32,
    /// Maximum absolute initial elevation offset of interior vertices.
    pub elevation_jitter: f32,
    /// Seed for the perturbation.
    pub seed: u64,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            planar_jitter: 0.0,
            elevation_jitter: 0.0,
            seed: 0,
        }
    }
}

impl MeshOptions {
    pub fn validate(&self) -> Result<(), TerrainError> {
        ensure_finite("MeshOptions", "planar_jitter", self.planar_jitter)?;
        ensure_finite("MeshOptions", "elevation_jitter", self.elevation_jitter)?;

        if !(0.0..0.5).contains(&self.planar_jitter) {
            return Err(TerrainError::invalid(
                "MeshOptions",
                "planar_jitter",
                format!("must be in [0, 0.5), got {}", self.planar_jitter),
            ));
        }
        if self.elevation_jitter < 0.0 {
            return Err(TerrainError::invalid(
                "MeshOptions",
                "elevation_jitter",
                format!("must be >= 0, got {}", self.elevation_jitter),
            ));
        }
        Ok(())
    }

    fn is_regular(&self) -> bool {
        self.planar_jitter == 0.0 && self.elevation_jitter == 0.0
    }
}

/// Separately generated geometry (e.g. a rock) awaiting merge into a mesh.
#[derive(Debug, Clone, PartialEq)]
pub struct SubGeometry {
    points: Vec<Vec3>,
    triangles: Vec<[u32; 3]>,
}

impl SubGeometry {
    /// Creates sub-geometry, checking that every triangle index is in range.
    pub fn new(points: Vec<Vec3>, triangles: Vec<[u32; 3]>) -> Result<Self, TerrainError> {
        check_triangles("SubGeometry", &triangles, points.len())?;
        if let Some(p) = points.iter().find(|p| !p.is_finite()) {
            return Err(TerrainError::invalid(
                "SubGeometry",
                "points",
                format!("non-finite point {:?}", p),
            ));
        }
        Ok(Self { points, triangles })
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    pub fn vertex_count(&self) -> usize {
        self.points.len()
    }
}

/// Grid-based terrain mesh.
///
/// Vertices `0..surface_vertex_count()` form the `resolution × resolution`
/// surface grid in row-major order. Geometry merged later is appended after
/// them. Planar positions and connectivity never change once a vertex
/// exists; only elevations are mutable.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainMesh {
    resolution: u32,
    positions: Vec<Vec2>,
    elevations: Vec<f32>,
    triangles: Vec<[u32; 3]>,
    merged_parts: usize,
}

impl TerrainMesh {
    /// Creates a flat `size × size` grid centered on the origin with
    /// `subdivisions × subdivisions` cells.
    pub fn create(size: f32, subdivisions: u32) -> Result<Self, TerrainError> {
        Self::create_with(size, subdivisions, &MeshOptions::default())
    }

    /// Creates a grid, optionally perturbing interior vertices.
    pub fn create_with(
        size: f32,
        subdivisions: u32,
        options: &MeshOptions,
    ) -> Result<Self, TerrainError> {
        ensure_positive("TerrainMesh::create", "size", size)?;
        if subdivisions < 1 || subdivisions > MAX_SUBDIVISIONS {
            return Err(TerrainError::invalid(
                "TerrainMesh::create",
                "subdivision_count",
                format!("must be in [1, {}], got {}", MAX_SUBDIVISIONS, subdivisions),
            ));
        }
        options.validate()?;

        let n = subdivisions;
        let resolution = n + 1;
        let half = size * 0.5;
        let step = size / n as f32;
        let count = (resolution as usize) * (resolution as usize);

        // Pin the last row/column to the outline so the grid stays square.
        let coord = |i: u32| if i == n { half } else { -half + i as f32 * step };

        let mut positions = Vec::with_capacity(count);
        for j in 0..resolution {
            for i in 0..resolution {
                positions.push(Vec2::new(coord(i), coord(j)));
            }
        }
        let mut elevations = vec![0.0f32; count];

        if !options.is_regular() {
            let mut rng = ChaCha8Rng::seed_from_u64(options.seed);
            let max_offset = options.planar_jitter * step;

            for j in 1..n {
                for i in 1..n {
                    let idx = (j * resolution + i) as usize;
                    let dx = rng.random::<f32>() * 2.0 - 1.0;
                    let dy = rng.random::<f32>() * 2.0 - 1.0;
                    let dz = rng.random::<f32>() * 2.0 - 1.0;
                    positions[idx] += Vec2::new(dx, dy) * max_offset;
                    elevations[idx] = dz * options.elevation_jitter;
                }
            }
        }

        let mut triangles = Vec::with_capacity((n as usize) * (n as usize) * 2);
        for j in 0..n {
            for i in 0..n {
                let i0 = j * resolution + i;
                let i1 = i0 + 1;
                let i2 = i0 + resolution;
                let i3 = i2 + 1;
                // Counter-clockwise seen from +z.
                triangles.push([i0, i1, i3]);
                triangles.push([i0, i3, i2]);
            }
        }

        Ok(Self {
            resolution,
            positions,
            elevations,
            triangles,
            merged_parts: 0,
        })
    }

    /// Rebuilds a mesh from exported data.
    ///
    /// The first `resolution²` vertices are treated as the surface grid.
    /// A `resolution` of zero yields a mesh without surface vertices.
    pub fn from_parts(
        resolution: u32,
        positions: Vec<Vec2>,
        elevations: Vec<f32>,
        triangles: Vec<[u32; 3]>,
    ) -> Result<Self, TerrainError> {
        if positions.len() != elevations.len() {
            return Err(TerrainError::invalid(
                "TerrainMesh::from_parts",
                "elevations",
                format!(
                    "{} elevations for {} positions",
                    elevations.len(),
                    positions.len()
                ),
            ));
        }
        let surface = (resolution as usize) * (resolution as usize);
        if surface > positions.len() {
            return Err(TerrainError::invalid(
                "TerrainMesh::from_parts",
                "resolution",
                format!(
                    "surface grid of {} vertices exceeds {} positions",
                    surface,
                    positions.len()
                ),
            ));
        }
        if positions.len() > u32::MAX as usize {
            return Err(TerrainError::invalid(
                "TerrainMesh::from_parts",
                "positions",
                "vertex count exceeds u32 range",
            ));
        }
        check_triangles("TerrainMesh::from_parts", &triangles, positions.len())?;

        Ok(Self {
            resolution,
            positions,
            elevations,
            triangles,
            merged_parts: 0,
        })
    }

    /// Restores the merged part count recorded alongside exported data.
    pub(crate) fn with_merged_parts(mut self, merged_parts: usize) -> Self {
        self.merged_parts = merged_parts;
        self
    }

    /// Vertices per side of the surface grid.
    pub fn resolution(&self) -> u32 {
        self.resolution
    }

    /// Total vertex count, including merged geometry.
    pub fn vertex_count(&self) -> usize {
        self.positions.len()
    }

    /// Number of vertices belonging to the surface grid.
    pub fn surface_vertex_count(&self) -> usize {
        (self.resolution as usize) * (self.resolution as usize)
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Number of sub-geometries merged into this mesh.
    pub fn merged_parts(&self) -> usize {
        self.merged_parts
    }

    pub fn positions(&self) -> &[Vec2] {
        &self.positions
    }

    pub fn elevations(&self) -> &[f32] {
        &self.elevations
    }

    pub fn triangles(&self) -> &[[u32; 3]] {
        &self.triangles
    }

    /// Planar positions of the surface grid vertices.
    pub fn surface_positions(&self) -> &[Vec2] {
        &self.positions[..self.surface_vertex_count()]
    }

    /// Elevations of the surface grid in row-major order.
    pub fn surface_elevations(&self) -> &[f32] {
        &self.elevations[..self.surface_vertex_count()]
    }

    pub fn vertex(&self, id: VertexId) -> Option<Vertex> {
        let i = id.index();
        let position = *self.positions.get(i)?;
        Some(Vertex {
            id,
            position,
            elevation: self.elevations[i],
        })
    }

    pub fn elevation(&self, id: VertexId) -> Option<f32> {
        self.elevations.get(id.index()).copied()
    }

    /// Iterates over all vertices in id order.
    pub fn vertices(&self) -> impl Iterator<Item = Vertex> + '_ {
        self.positions
            .iter()
            .zip(&self.elevations)
            .enumerate()
            .map(|(i, (&position, &elevation))| Vertex {
                id: VertexId(i as u32),
                position,
                elevation,
            })
    }

    /// Planar bounds of the surface grid, if it has positive extent.
    pub fn surface_bounds(&self) -> Option<Region> {
        let surface = self.surface_positions();
        let first = *surface.first()?;
        let (min, max) = surface
            .iter()
            .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        Region::new(min, max).ok()
    }

    /// Builds the nearest-vertex index over the surface grid.
    pub fn build_surface_index(&self) -> SurfaceIndex {
        SurfaceIndex::build(self.surface_positions())
    }

    /// Adds `delta` to one vertex's elevation. Deltas accumulate.
    pub fn apply_delta(&mut self, id: VertexId, delta: f32) -> Result<(), TerrainError> {
        ensure_finite("TerrainMesh::apply_delta", "delta", delta)?;
        let count = self.elevations.len();
        let elevation = self.elevations.get_mut(id.index()).ok_or_else(|| {
            TerrainError::invalid(
                "TerrainMesh::apply_delta",
                "vertex_id",
                format!("vertex {} out of range for {} vertices", id.0, count),
            )
        })?;
        *elevation += delta;
        Ok(())
    }

    /// Adds `field(position)` to every vertex elevation, in parallel.
    ///
    /// Each vertex is written by exactly one worker; zero deltas leave the
    /// elevation untouched.
    pub(crate) fn apply_field<F>(&mut self, field: F)
    where
        F: Fn(Vec2) -> f32 + Sync,
    {
        self.elevations
            .par_iter_mut()
            .zip(self.positions.par_iter())
            .for_each(|(elevation, &position)| {
                let delta = field(position);
                if delta != 0.0 {
                    *elevation += delta;
                }
            });
    }

    /// Adds a per-vertex delta buffer to the elevations in one pass.
    pub fn add_deltas(&mut self, deltas: &[f32]) -> Result<(), TerrainError> {
        if deltas.len() != self.elevations.len() {
            return Err(TerrainError::invalid(
                "TerrainMesh::add_deltas",
                "deltas",
                format!(
                    "{} deltas for {} vertices",
                    deltas.len(),
                    self.elevations.len()
                ),
            ));
        }
        self.elevations
            .par_iter_mut()
            .zip(deltas.par_iter())
            .for_each(|(elevation, &delta)| {
                if delta != 0.0 {
                    *elevation += delta;
                }
            });
        Ok(())
    }

    /// Clamps every elevation into `[min, max]` and returns how many changed.
    pub fn clamp_elevations(&mut self, min: f32, max: f32) -> Result<usize, TerrainError> {
        ensure_finite("TerrainMesh::clamp_elevations", "min", min)?;
        ensure_finite("TerrainMesh::clamp_elevations", "max", max)?;
        if min > max {
            return Err(TerrainError::invalid(
                "TerrainMesh::clamp_elevations",
                "range",
                format!("inverted clamp range [{}, {}]", min, max),
            ));
        }

        let clamped = self
            .elevations
            .par_iter_mut()
            .map(|elevation| {
                let c = elevation.clamp(min, max);
                let changed = c != *elevation;
                *elevation = c;
                changed as usize
            })
            .sum();
        Ok(clamped)
    }

    /// Merges sub-geometries into the mesh.
    ///
    /// The parts are consumed: their vertices and triangles become ordinary
    /// mesh members and cannot be removed individually afterwards.
    pub fn merge(&mut self, parts: Vec<SubGeometry>) -> Result<(), TerrainError> {
        let added: usize = parts.iter().map(SubGeometry::vertex_count).sum();
        if self.positions.len() + added > u32::MAX as usize {
            return Err(TerrainError::invalid(
                "TerrainMesh::merge",
                "parts",
                format!(
                    "merging {} vertices would exceed the u32 vertex id range",
                    added
                ),
            ));
        }

        self.positions.reserve(added);
        self.elevations.reserve(added);

        for part in parts {
            let base = self.positions.len() as u32;
            for p in &part.points {
                self.positions.push(p.truncate());
                self.elevations.push(p.z);
            }
            self.triangles.extend(
                part.triangles
                    .iter()
                    .map(|t| [t[0] + base, t[1] + base, t[2] + base]),
            );
            self.merged_parts += 1;
        }
        Ok(())
    }

    /// Returns (min, max) elevation over all vertices.
    pub fn elevation_range(&self) -> (f32, f32) {
        self.elevations
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &z| (lo.min(z), hi.max(z)))
    }

    /// Returns (min, max) elevation over the surface grid only.
    pub fn surface_elevation_range(&self) -> (f32, f32) {
        self.surface_elevations()
            .iter()
            .fold((f32::MAX, f32::MIN), |(lo, hi), &z| (lo.min(z), hi.max(z)))
    }
}

fn check_triangles(
    context: &'static str,
    triangles: &[[u32; 3]],
    vertex_count: usize,
) -> Result<(), TerrainError> {
    if let Some(t) = triangles
        .iter()
        .find(|t| t.iter().any(|&i| i as usize >= vertex_count))
    {
        return Err(TerrainError::invalid(
            context,
            "triangles",
            format!("triangle {:?} references a vertex beyond {}", t, vertex_count),
        ));
    }
    Ok(())
}
