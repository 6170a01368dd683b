//! Decorative rock geometry.
//!
//! Rocks are noise-displaced UV spheres scattered over the surface. They are
//! cosmetic: once merged they ride along with deformations but never feed
//! into surface height queries.

use std::f32::consts::PI;

use glam::Vec3;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_positive, TerrainError};
use crate::noise::{sample_fractal_noise_batch, FractalNoiseConfig};
use crate::scatter::Placement;

use super::mesh::SubGeometry;

/// Shape parameters shared by all rocks of a run.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RockStyle {
    /// Longitudinal divisions (min 3).
    pub segments: u32,
    /// Latitudinal divisions (min 2).
    pub rings: u32,
    /// Per-axis scale factors are drawn uniformly from `[min, max]`.
    pub axis_scale: [f32; 2],
    /// Radial noise displacement as a fraction of the radius, in `[0, 0.5]`.
    pub displacement: f32,
    /// Noise used for displacement; the seed is re-drawn per rock.
    pub noise: FractalNoiseConfig,
}

impl Default for RockStyle {
    fn default() -> Self {
        Self {
            segments: 16,
            rings: 16,
            axis_scale: [0.5, 1.0],
            displacement: 0.5,
            noise: FractalNoiseConfig::rock_surface(0),
        }
    }
}

impl RockStyle {
    pub fn validate(&self) -> Result<(), TerrainError> {
        if self.segments < 3 || self.segments > 256 {
            return Err(TerrainError::invalid(
                "RockStyle",
                "segments",
                format!("must be in [3, 256], got {}", self.segments),
            ));
        }
        if self.rings < 2 || self.rings > 256 {
            return Err(TerrainError::invalid(
                "RockStyle",
                "rings",
                format!("must be in [2, 256], got {}", self.rings),
            ));
        }

        let [lo, hi] = self.axis_scale;
        ensure_positive("RockStyle", "axis_scale", lo)?;
        ensure_positive("RockStyle", "axis_scale", hi)?;
        if lo > hi {
            return Err(TerrainError::invalid(
                "RockStyle",
                "axis_scale",
                format!("inverted scale range [{}, {}]", lo, hi),
            ));
        }

        ensure_finite("RockStyle", "displacement", self.displacement)?;
        if !(0.0..=0.5).contains(&self.displacement) {
            return Err(TerrainError::invalid(
                "RockStyle",
                "displacement",
                format!("must be in [0, 0.5], got {}", self.displacement),
            ));
        }
        ensure_positive("RockStyle", "noise.frequency", self.noise.frequency)?;
        Ok(())
    }

    /// Vertices produced per rock.
    pub fn vertices_per_rock(&self) -> usize {
        ((self.rings + 1) * self.segments) as usize
    }

    /// Triangles produced per rock.
    pub fn triangles_per_rock(&self) -> usize {
        (self.rings * self.segments * 2) as usize
    }
}

/// Generates one rock centered on `(placement.x, placement.y, 0)`.
///
/// Draws three axis scales and a noise seed from `rng`, so rocks generated
/// from the same stream are reproducible.
pub fn generate_rock<R: Rng + ?Sized>(
    placement: &Placement,
    style: &RockStyle,
    rng: &mut R,
) -> Result<SubGeometry, TerrainError> {
    style.validate()?;
    ensure_positive("generate_rock", "radius", placement.radius)?;

    let [lo, hi] = style.axis_scale;
    let scale = Vec3::new(
        rng.random_range(lo..=hi),
        rng.random_range(lo..=hi),
        rng.random_range(lo..=hi),
    ) * placement.radius;
    let noise = style.noise.with_seed(rng.random::<i32>());

    let segments = style.segments;
    let rings = style.rings;

    let mut directions = Vec::with_capacity(style.vertices_per_rock());
    for ring in 0..=rings {
        let phi = (ring as f32 / rings as f32) * PI;
        let z = phi.cos();
        let ring_radius = phi.sin();

        for seg in 0..segments {
            let theta = (seg as f32 / segments as f32) * 2.0 * PI;
            directions.push(Vec3::new(ring_radius * theta.cos(), ring_radius * theta.sin(), z));
        }
    }

    let displacement = sample_fractal_noise_batch(&directions, &noise);
    let center = Vec3::new(placement.x, placement.y, 0.0);
    let points = directions
        .iter()
        .zip(&displacement)
        .map(|(&dir, &n)| center + dir * scale * (1.0 + style.displacement * n))
        .collect();

    let mut triangles = Vec::with_capacity(style.triangles_per_rock());
    for ring in 0..rings {
        for seg in 0..segments {
            let next_seg = (seg + 1) % segments;

            let i0 = ring * segments + seg;
            let i1 = ring * segments + next_seg;
            let i2 = (ring + 1) * segments + seg;
            let i3 = (ring + 1) * segments + next_seg;

            // Outward facing with z up.
            triangles.push([i0, i2, i3]);
            triangles.push([i0, i3, i1]);
        }
    }

    SubGeometry::new(points, triangles)
}
