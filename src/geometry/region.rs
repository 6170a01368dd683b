//! Axis-aligned regions and radius ranges.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, TerrainError};

/// Axis-aligned rectangle in the terrain plane, bounds inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Region {
    /// Lower-left corner.
    pub min: Vec2,
    /// Upper-right corner.
    pub max: Vec2,
}

impl Region {
    /// Creates a region, rejecting zero or negative extent on either axis.
    pub fn new(min: Vec2, max: Vec2) -> Result<Self, TerrainError> {
        let region = Self { min, max };
        region.validate()?;
        Ok(region)
    }

    /// Square region `[-size/2, size/2]²` centered on the origin.
    pub fn centered_square(size: f32) -> Result<Self, TerrainError> {
        let half = size * 0.5;
        Self::new(Vec2::splat(-half), Vec2::splat(half))
    }

    /// Checks that both corners are finite and the extent is positive and
    /// representable.
    pub fn validate(&self) -> Result<(), TerrainError> {
        ensure_finite("Region", "min.x", self.min.x)?;
        ensure_finite("Region", "min.y", self.min.y)?;
        ensure_finite("Region", "max.x", self.max.x)?;
        ensure_finite("Region", "max.y", self.max.y)?;

        if self.max.x <= self.min.x || self.max.y <= self.min.y {
            return Err(TerrainError::invalid(
                "Region",
                "extent",
                format!(
                    "region must have positive extent, got min {:?} max {:?}",
                    self.min, self.max
                ),
            ));
        }

        let extent = self.max - self.min;
        if !extent.is_finite() {
            return Err(TerrainError::invalid(
                "Region",
                "extent",
                format!("extent {:?} overflows f32", extent),
            ));
        }
        Ok(())
    }

    /// Width and height of the region.
    pub fn extent(&self) -> Vec2 {
        self.max - self.min
    }

    pub fn center(&self) -> Vec2 {
        (self.min + self.max) * 0.5
    }

    /// Returns true if `point` lies inside the region or on its boundary.
    pub fn contains(&self, point: Vec2) -> bool {
        point.x >= self.min.x
            && point.x <= self.max.x
            && point.y >= self.min.y
            && point.y <= self.max.y
    }
}

/// Inclusive range `[min, max]` of radii.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RadiusRange {
    pub min: f32,
    pub max: f32,
}

impl RadiusRange {
    /// Creates a range; `min` must be positive and not greater than `max`.
    pub fn new(min: f32, max: f32) -> Result<Self, TerrainError> {
        let range = Self { min, max };
        range.validate()?;
        Ok(range)
    }

    pub fn validate(&self) -> Result<(), TerrainError> {
        ensure_finite("RadiusRange", "min", self.min)?;
        ensure_finite("RadiusRange", "max", self.max)?;

        if self.min <= 0.0 {
            return Err(TerrainError::invalid(
                "RadiusRange",
                "min",
                format!("radius must be > 0, got {}", self.min),
            ));
        }
        if self.min > self.max {
            return Err(TerrainError::invalid(
                "RadiusRange",
                "range",
                format!("inverted radius range [{}, {}]", self.min, self.max),
            ));
        }
        Ok(())
    }

    /// Returns true if `radius` lies within the range, bounds included.
    pub fn contains(&self, radius: f32) -> bool {
        radius >= self.min && radius <= self.max
    }
}
