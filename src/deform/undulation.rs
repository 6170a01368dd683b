//! Single radial height modifier.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_positive, TerrainError};

use super::falloff::Falloff;

/// Raw description of one radial deformation.
///
/// Plain data: build a [`RadialUndulation`] from it to validate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeformationSpec {
    pub center: Vec2,
    pub radius: f32,
    /// Signed elevation change at the center.
    pub height: f32,
    #[serde(default)]
    pub falloff: Falloff,
}

impl DeformationSpec {
    pub fn new(center: Vec2, radius: f32, height: f32) -> Self {
        Self {
            center,
            radius,
            height,
            falloff: Falloff::Linear,
        }
    }

    pub fn validate(&self) -> Result<(), TerrainError> {
        ensure_finite("RadialUndulation", "center.x", self.center.x)?;
        ensure_finite("RadialUndulation", "center.y", self.center.y)?;
        ensure_positive("RadialUndulation", "radius", self.radius)?;
        ensure_finite("RadialUndulation", "height", self.height)?;
        Ok(())
    }
}

/// Hill or depression: raises (or lowers) every vertex within `radius` of
/// `center` by `height` scaled by the falloff weight.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DeformationSpec", into = "DeformationSpec")]
pub struct RadialUndulation {
    spec: DeformationSpec,
}

impl RadialUndulation {
    /// Linear undulation. Fails when `radius <= 0` or any value is not
    /// finite.
    pub fn new(center: Vec2, radius: f32, height: f32) -> Result<Self, TerrainError> {
        Self::from_spec(DeformationSpec::new(center, radius, height))
    }

    pub fn from_spec(spec: DeformationSpec) -> Result<Self, TerrainError> {
        spec.validate()?;
        Ok(Self { spec })
    }

    /// Built from already validated parts.
    pub(super) fn validated(center: Vec2, radius: f32, height: f32) -> Self {
        Self {
            spec: DeformationSpec::new(center, radius, height),
        }
    }

    pub fn with_falloff(mut self, falloff: Falloff) -> Self {
        self.spec.falloff = falloff;
        self
    }

    pub fn spec(&self) -> &DeformationSpec {
        &self.spec
    }

    pub fn center(&self) -> Vec2 {
        self.spec.center
    }

    pub fn radius(&self) -> f32 {
        self.spec.radius
    }

    pub fn height(&self) -> f32 {
        self.spec.height
    }

    pub fn falloff(&self) -> Falloff {
        self.spec.falloff
    }

    /// Same shape with the opposite sign.
    pub fn negated(&self) -> Self {
        let mut spec = self.spec;
        spec.height = -spec.height;
        Self { spec }
    }

    /// Elevation change at planar point `p`.
    #[inline]
    pub fn delta_at(&self, p: Vec2) -> f32 {
        let d = p.distance(self.spec.center);
        if d < self.spec.radius {
            self.spec.height * self.spec.falloff.weight(d, self.spec.radius)
        } else {
            0.0
        }
    }
}

impl TryFrom<DeformationSpec> for RadialUndulation {
    type Error = TerrainError;

    fn try_from(spec: DeformationSpec) -> Result<Self, Self::Error> {
        Self::from_spec(spec)
    }
}

impl From<RadialUndulation> for DeformationSpec {
    fn from(undulation: RadialUndulation) -> Self {
        undulation.spec
    }
}
