//! Radial deformation operators.
//!
//! Deformations only ever add elevation deltas. Deltas from different
//! operators sum, so the final mesh does not depend on the order in which
//! operators are applied (up to floating-point rounding).

mod crater;
mod falloff;
mod undulation;

pub use crater::{Crater, FLOOR_DEPTH_RATIO, FLOOR_RADIUS_RATIO, RIM_HEIGHT_RATIO};
pub use falloff::Falloff;
pub use undulation::{DeformationSpec, RadialUndulation};

use glam::Vec2;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::terrain::TerrainMesh;

/// A height modifier that can be applied to a mesh in place.
///
/// Implementors describe their effect through [`delta_at`]; the default
/// [`apply`] evaluates it for every vertex in parallel. Each vertex is
/// written by exactly one worker. Vertex count and connectivity are never
/// touched.
///
/// [`delta_at`]: DeformationOperator::delta_at
/// [`apply`]: DeformationOperator::apply
pub trait DeformationOperator: Send + Sync {
    fn name(&self) -> &'static str;

    /// Elevation change this operator contributes at planar point `p`.
    fn delta_at(&self, p: Vec2) -> f32;

    fn apply(&self, mesh: &mut TerrainMesh) {
        mesh.apply_field(|p| self.delta_at(p));
    }
}

impl DeformationOperator for RadialUndulation {
    fn name(&self) -> &'static str {
        if self.height() >= 0.0 {
            "hill"
        } else {
            "depression"
        }
    }

    fn delta_at(&self, p: Vec2) -> f32 {
        RadialUndulation::delta_at(self, p)
    }
}

impl DeformationOperator for Crater {
    fn name(&self) -> &'static str {
        "crater"
    }

    fn delta_at(&self, p: Vec2) -> f32 {
        Crater::delta_at(self, p)
    }

    /// Rim first, then floor.
    fn apply(&self, mesh: &mut TerrainMesh) {
        for component in self.components() {
            component.apply(mesh);
        }
    }
}

/// Closed set of deformation variants.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Deformation {
    Undulation(RadialUndulation),
    Crater(Crater),
}

impl Deformation {
    pub fn center(&self) -> Vec2 {
        match self {
            Deformation::Undulation(u) => u.center(),
            Deformation::Crater(c) => c.center(),
        }
    }

    /// Outer radius of the affected disc.
    pub fn radius(&self) -> f32 {
        match self {
            Deformation::Undulation(u) => u.radius(),
            Deformation::Crater(c) => c.radius(),
        }
    }
}

impl DeformationOperator for Deformation {
    fn name(&self) -> &'static str {
        match self {
            Deformation::Undulation(u) => u.name(),
            Deformation::Crater(c) => c.name(),
        }
    }

    fn delta_at(&self, p: Vec2) -> f32 {
        match self {
            Deformation::Undulation(u) => u.delta_at(p),
            Deformation::Crater(c) => c.delta_at(p),
        }
    }

    fn apply(&self, mesh: &mut TerrainMesh) {
        match self {
            Deformation::Undulation(u) => u.apply(mesh),
            Deformation::Crater(c) => c.apply(mesh),
        }
    }
}

impl From<RadialUndulation> for Deformation {
    fn from(u: RadialUndulation) -> Self {
        Deformation::Undulation(u)
    }
}

impl From<Crater> for Deformation {
    fn from(c: Crater) -> Self {
        Deformation::Crater(c)
    }
}

/// Validates `spec` and applies it as a radial undulation.
///
/// The mesh is untouched when validation fails.
pub fn apply(mesh: &mut TerrainMesh, spec: &DeformationSpec) -> Result<(), TerrainError> {
    RadialUndulation::from_spec(*spec)?.apply(mesh);
    Ok(())
}

/// Deformations collected for one buffered application.
///
/// Workers evaluate every queued deformation into a private per-vertex
/// delta buffer while the mesh is only read; the summed buffer is then
/// flushed into the mesh in a single pass.
#[derive(Debug, Clone, Default)]
pub struct DeformationBatch {
    items: Vec<Deformation>,
}

impl DeformationBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
        }
    }

    pub fn push(&mut self, deformation: impl Into<Deformation>) {
        self.items.push(deformation.into());
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[Deformation] {
        &self.items
    }

    /// Summed per-vertex deltas of every queued deformation.
    pub fn deltas(&self, mesh: &TerrainMesh) -> Vec<f32> {
        let items = &self.items;
        mesh.positions()
            .par_iter()
            .map(|&p| {
                items
                    .iter()
                    .filter(|d| d.center().distance_squared(p) < d.radius() * d.radius())
                    .map(|d| d.delta_at(p))
                    .sum()
            })
            .collect()
    }

    /// Flushes the queued deformations into `mesh` and empties the batch.
    pub fn apply(&mut self, mesh: &mut TerrainMesh) -> Result<(), TerrainError> {
        if self.items.is_empty() {
            return Ok(());
        }
        let deltas = self.deltas(mesh);
        mesh.add_deltas(&deltas)?;
        self.items.clear();
        Ok(())
    }
}

impl Extend<Deformation> for DeformationBatch {
    fn extend<I: IntoIterator<Item = Deformation>>(&mut self, iter: I) {
        self.items.extend(iter);
    }
}

impl FromIterator<Deformation> for DeformationBatch {
    fn from_iter<I: IntoIterator<Item = Deformation>>(iter: I) -> Self {
        Self {
            items: iter.into_iter().collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::SubGeometry;
    use glam::Vec3;

    fn grid() -> TerrainMesh {
        TerrainMesh::create(20.0, 40).unwrap()
    }

    fn deltas_after(mesh: &TerrainMesh, before: &[f32]) -> Vec<f32> {
        mesh.elevations()
            .iter()
            .zip(before)
            .map(|(a, b)| a - b)
            .collect()
    }

    #[test]
    fn test_undulation_untouched_outside_radius() {
        let mut mesh = grid();
        let hill = RadialUndulation::new(Vec2::new(1.0, -2.0), 3.0, 1.5).unwrap();
        hill.apply(&mut mesh);

        for v in mesh.vertices() {
            if v.position.distance(hill.center()) >= 3.0 {
                assert_eq!(v.elevation, 0.0, "vertex {:?} changed", v.id);
            }
        }
    }

    #[test]
    fn test_undulation_full_height_at_center() {
        let mut mesh = grid();
        // (1.0, -2.0) lies exactly on the 0.5 spacing grid.
        let hill = RadialUndulation::new(Vec2::new(1.0, -2.0), 3.0, 1.5).unwrap();
        hill.apply(&mut mesh);
        assert_eq!(crate::terrain::surface_height(&mesh, 1.0, -2.0).unwrap(), 1.5);
    }

    #[test]
    fn test_undulation_monotonic_in_distance() {
        let mut mesh = grid();
        let center = Vec2::new(0.0, 0.0);
        RadialUndulation::new(center, 6.0, 2.0).unwrap().apply(&mut mesh);

        let mut samples: Vec<(f32, f32)> = mesh
            .vertices()
            .map(|v| (v.position.distance(center), v.elevation))
            .collect();
        samples.sort_by(|a, b| a.0.total_cmp(&b.0));
        for pair in samples.windows(2) {
            assert!(pair[1].1 <= pair[0].1 + 1e-6, "{:?} -> {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_applying_twice_doubles() {
        let mut once = grid();
        let mut twice = grid();
        let hill = RadialUndulation::new(Vec2::new(-3.0, 2.0), 4.0, 0.8).unwrap();
        hill.apply(&mut once);
        hill.apply(&mut twice);
        hill.apply(&mut twice);

        for (a, b) in once.elevations().iter().zip(twice.elevations()) {
            assert!((2.0 * a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_negation_restores() {
        let mut mesh = grid();
        let original = mesh.clone();
        let dip = RadialUndulation::new(Vec2::new(2.0, 2.0), 5.0, -1.3).unwrap();
        dip.apply(&mut mesh);
        dip.negated().apply(&mut mesh);

        for (a, b) in mesh.elevations().iter().zip(original.elevations()) {
            assert!((a - b).abs() < 1e-6);
        }
    }

    #[test]
    fn test_order_independence() {
        let hill = RadialUndulation::new(Vec2::new(0.0, 0.0), 5.0, 2.0).unwrap();
        let crater = Crater::new(Vec2::new(2.0, 1.0), 4.0).unwrap();

        let mut ab = grid();
        hill.apply(&mut ab);
        crater.apply(&mut ab);

        let mut ba = grid();
        crater.apply(&mut ba);
        hill.apply(&mut ba);

        for (a, b) in ab.elevations().iter().zip(ba.elevations()) {
            assert!((a - b).abs() < 1e-5);
        }
    }

    #[test]
    fn test_crater_apply_equals_components() {
        let crater = Crater::new(Vec2::new(-1.0, 0.5), 7.0).unwrap();

        let mut composite = grid();
        crater.apply(&mut composite);

        let mut manual = grid();
        crater.rim().apply(&mut manual);
        crater.floor().apply(&mut manual);

        assert_eq!(composite.elevations(), manual.elevations());
    }

    #[test]
    fn test_apply_spec_validates_first() {
        let mut mesh = grid();
        let before = mesh.clone();
        let bad = DeformationSpec::new(Vec2::ZERO, 0.0, 1.0);
        assert!(apply(&mut mesh, &bad).is_err());
        assert_eq!(mesh, before);

        let good = DeformationSpec::new(Vec2::ZERO, 2.0, 1.0);
        apply(&mut mesh, &good).unwrap();
        assert_eq!(surface_center(&mesh), 1.0);
    }

    fn surface_center(mesh: &TerrainMesh) -> f32 {
        crate::terrain::surface_height(mesh, 0.0, 0.0).unwrap()
    }

    #[test]
    fn test_deformation_never_changes_topology() {
        let mut mesh = grid();
        let (vertices, triangles) = (mesh.vertex_count(), mesh.triangles().to_vec());
        let positions = mesh.positions().to_vec();
        Deformation::from(Crater::new(Vec2::ZERO, 8.0).unwrap()).apply(&mut mesh);
        assert_eq!(mesh.vertex_count(), vertices);
        assert_eq!(mesh.triangles(), &triangles[..]);
        assert_eq!(mesh.positions(), &positions[..]);
    }

    #[test]
    fn test_batch_matches_sequential() {
        let items: Vec<Deformation> = vec![
            RadialUndulation::new(Vec2::new(1.0, 1.0), 6.0, 1.2).unwrap().into(),
            RadialUndulation::new(Vec2::new(-4.0, 3.0), 5.0, -0.6)
                .unwrap()
                .with_falloff(Falloff::Smoothstep)
                .into(),
            Crater::new(Vec2::new(0.0, -2.0), 3.5).unwrap().into(),
            Crater::new(Vec2::new(0.5, -2.5), 0.8).unwrap().into(),
        ];

        let mut sequential = grid();
        for d in &items {
            d.apply(&mut sequential);
        }

        let mut buffered = grid();
        let mut batch: DeformationBatch = items.into_iter().collect();
        assert_eq!(batch.len(), 4);
        batch.apply(&mut buffered).unwrap();
        assert!(batch.is_empty());

        for (a, b) in sequential.elevations().iter().zip(buffered.elevations()) {
            assert!((a - b).abs() < 1e-5, "{} vs {}", a, b);
        }
    }

    #[test]
    fn test_merged_geometry_moves_with_terrain() {
        let mut mesh = grid();
        let pebble = SubGeometry::new(
            vec![
                Vec3::new(0.0, 0.0, 0.1),
                Vec3::new(0.1, 0.0, 0.0),
                Vec3::new(0.0, 0.1, 0.0),
            ],
            vec![[0, 1, 2]],
        )
        .unwrap();
        mesh.merge(vec![pebble]).unwrap();
        let first_rock_vertex = mesh.surface_vertex_count();

        RadialUndulation::new(Vec2::ZERO, 4.0, 2.0).unwrap().apply(&mut mesh);
        let lifted = mesh.elevations()[first_rock_vertex];
        assert!((lifted - 2.1).abs() < 1e-6);
    }

    #[test]
    fn test_name_by_sign() {
        let hill = RadialUndulation::new(Vec2::ZERO, 1.0, 0.5).unwrap();
        assert_eq!(hill.name(), "hill");
        assert_eq!(hill.negated().name(), "depression");
        assert_eq!(Crater::new(Vec2::ZERO, 1.0).unwrap().name(), "crater");
    }

    #[test]
    fn test_deformation_serde_tag() {
        let d: Deformation = Crater::new(Vec2::new(1.0, 0.0), 2.0).unwrap().into();
        let json = serde_json::to_string(&d).unwrap();
        assert!(json.contains(r#""kind":"crater""#));
        let back: Deformation = serde_json::from_str(&json).unwrap();
        assert_eq!(back, d);
    }
}
