//! Camera placement over a finished terrain.
//!
//! Cameras sit a fixed altitude above the nearest surface vertex and look
//! out horizontally in a sweep of compass directions. Rendering itself is
//! left to an external renderer.

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, ensure_positive, TerrainError};
use crate::terrain::HeightQuery;

/// One camera pose.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CameraPlacement {
    pub x: f32,
    pub y: f32,
    /// Surface height at `(x, y)` plus the plan altitude.
    pub z: f32,
    /// Heading in degrees around the z axis.
    pub direction_deg: f32,
    /// Field of view in degrees.
    pub fov_deg: f32,
}

impl CameraPlacement {
    /// Stable file stem, e.g. `location_10.-10_camera_direction_045`.
    pub fn label(&self) -> String {
        format!(
            "location_{:02}.{:02}_camera_direction_{:03}",
            self.x.round() as i32,
            self.y.round() as i32,
            self.direction_deg.round() as i32
        )
    }
}

/// Locations and headings to place cameras at.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraPlan {
    pub locations: Vec<[f32; 2]>,
    pub directions_deg: Vec<f32>,
    /// Height of the camera above the surface.
    pub altitude: f32,
    pub fov_deg: f32,
}

impl Default for CameraPlan {
    fn default() -> Self {
        Self {
            locations: vec![
                [0.0, 0.0],
                [10.0, 10.0],
                [10.0, -10.0],
                [-10.0, -10.0],
                [-10.0, 10.0],
            ],
            directions_deg: (0..8).map(|i| i as f32 * 45.0).collect(),
            altitude: 1.5,
            fov_deg: 90.0,
        }
    }
}

impl CameraPlan {
    pub fn validate(&self) -> Result<(), TerrainError> {
        ensure_finite("CameraPlan", "altitude", self.altitude)?;
        ensure_positive("CameraPlan", "fov_deg", self.fov_deg)?;
        if self.fov_deg >= 180.0 {
            return Err(TerrainError::invalid(
                "CameraPlan",
                "fov_deg",
                format!("must be below 180, got {}", self.fov_deg),
            ));
        }
        for &direction in &self.directions_deg {
            ensure_finite("CameraPlan", "directions_deg", direction)?;
        }
        Ok(())
    }

    /// Places one camera per location and direction, locations outermost.
    ///
    /// The surface is sampled once per location.
    pub fn place(&self, query: &HeightQuery<'_>) -> Result<Vec<CameraPlacement>, TerrainError> {
        self.validate()?;

        let mut cameras = Vec::with_capacity(self.locations.len() * self.directions_deg.len());
        for &[x, y] in &self.locations {
            let z = query.surface_height(x, y)? + self.altitude;
            cameras.extend(self.directions_deg.iter().map(|&direction_deg| CameraPlacement {
                x,
                y,
                z,
                direction_deg,
                fov_deg: self.fov_deg,
            }));
        }
        Ok(cameras)
    }
}

/// Places the default sweep: five locations by eight headings.
pub fn plan_cameras(query: &HeightQuery<'_>) -> Result<Vec<CameraPlacement>, TerrainError> {
    CameraPlan::default().place(query)
}
