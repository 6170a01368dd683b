//! Crater: a raised rim around a lowered floor.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_positive, TerrainError};

use super::undulation::RadialUndulation;

/// Rim height as a fraction of the crater radius.
pub const RIM_HEIGHT_RATIO: f32 = 1.0 / 3.0;
/// Floor radius as a fraction of the crater radius.
pub const FLOOR_RADIUS_RATIO: f32 = 0.7;
/// Floor depth as a fraction of the crater radius.
pub const FLOOR_DEPTH_RATIO: f32 = 0.5;

/// Two linear undulations sharing a center: the rim
/// (`radius`, `+radius/3`) and the floor (`0.7·radius`, `-radius/2`).
///
/// The net profile is `-radius/6` at the center, negative inside the
/// floor radius and a positive ring between the floor radius and the rim.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "CraterSpec", into = "CraterSpec")]
pub struct Crater {
    center: Vec2,
    radius: f32,
}

#[derive(Serialize, Deserialize)]
struct CraterSpec {
    center: Vec2,
    radius: f32,
}

impl Crater {
    pub fn new(center: Vec2, radius: f32) -> Result<Self, TerrainError> {
        ensure_finite("Crater", "center.x", center.x)?;
        ensure_finite("Crater", "center.y", center.y)?;
        ensure_positive("Crater", "radius", radius)?;
        Ok(Self { center, radius })
    }

    pub fn center(&self) -> Vec2 {
        self.center
    }

    pub fn radius(&self) -> f32 {
        self.radius
    }

    pub fn rim(&self) -> RadialUndulation {
        RadialUndulation::validated(self.center, self.radius, self.radius * RIM_HEIGHT_RATIO)
    }

    pub fn floor(&self) -> RadialUndulation {
        RadialUndulation::validated(
            self.center,
            self.radius * FLOOR_RADIUS_RATIO,
            -self.radius * FLOOR_DEPTH_RATIO,
        )
    }

    /// Rim then floor, in application order.
    pub fn components(&self) -> [RadialUndulation; 2] {
        [self.rim(), self.floor()]
    }

    /// Combined elevation change at `p`.
    #[inline]
    pub fn delta_at(&self, p: Vec2) -> f32 {
        self.rim().delta_at(p) + self.floor().delta_at(p)
    }
}

impl TryFrom<CraterSpec> for Crater {
    type Error = TerrainError;

    fn try_from(spec: CraterSpec) -> Result<Self, Self::Error> {
        Self::new(spec.center, spec.radius)
    }
}

impl From<Crater> for CraterSpec {
    fn from(crater: Crater) -> Self {
        Self {
            center: crater.center,
            radius: crater.radius,
        }
    }
}
