//! Terrain generation configuration.
//!
//! Every field has a default, so a TOML file only needs to name what it
//! changes.

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::deform::Falloff;
use crate::error::{ensure_finite, ensure_positive, TerrainError};
use crate::geometry::{RadiusRange, Region};
use crate::terrain::{MeshOptions, RockStyle, MAX_SUBDIVISIONS};

/// Errors raised while loading, saving or validating a configuration.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to access config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Invalid config: {0}")]
    Invalid(#[from] TerrainError),
}

/// Creation-time roughness of the surface grid.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceConfig {
    /// Planar jitter of interior vertices as a fraction of grid spacing.
    pub planar_jitter: f32,
    /// Bound on the initial elevation offset of interior vertices.
    pub elevation_jitter: f32,
}

/// Decorative rocks.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RockConfig {
    pub count: u32,
    pub radius: RadiusRange,
    pub style: RockStyle,
}

impl Default for RockConfig {
    fn default() -> Self {
        Self {
            count: 1000,
            radius: RadiusRange { min: 0.01, max: 0.2 },
            style: RockStyle::default(),
        }
    }
}

/// Hills or depressions.
///
/// `amplitude` is the range of the height-to-radius ratio; the sign comes
/// from the category.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct UndulationConfig {
    pub count: u32,
    pub radius: RadiusRange,
    pub amplitude: [f32; 2],
    #[serde(default)]
    pub falloff: Falloff,
}

impl UndulationConfig {
    pub fn hills() -> Self {
        Self {
            count: 10,
            radius: RadiusRange { min: 5.0, max: 10.0 },
            amplitude: [0.1, 0.5],
            falloff: Falloff::Linear,
        }
    }

    pub fn depressions() -> Self {
        Self {
            count: 10,
            radius: RadiusRange { min: 5.0, max: 10.0 },
            amplitude: [0.1, 0.3],
            falloff: Falloff::Linear,
        }
    }

    fn validate(&self, context: &'static str) -> Result<(), TerrainError> {
        self.radius.validate()?;
        let [lo, hi] = self.amplitude;
        ensure_finite(context, "amplitude", lo)?;
        ensure_finite(context, "amplitude", hi)?;
        if lo < 0.0 || lo > hi {
            return Err(TerrainError::invalid(
                context,
                "amplitude",
                format!("expected 0 <= min <= max, got [{}, {}]", lo, hi),
            ));
        }
        Ok(())
    }
}

/// Craters of one size class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CraterConfig {
    pub count: u32,
    pub radius: RadiusRange,
}

impl CraterConfig {
    pub fn large() -> Self {
        Self {
            count: 50,
            radius: RadiusRange { min: 1.0, max: 15.0 },
        }
    }

    pub fn small() -> Self {
        Self {
            count: 100,
            radius: RadiusRange { min: 0.1, max: 1.0 },
        }
    }
}

/// Complete description of one generation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TerrainConfig {
    /// Master seed; every stage derives its own stream from it.
    pub seed: u64,
    /// Side length of the square terrain.
    pub size: f32,
    /// Grid cells per side.
    pub subdivisions: u32,
    /// Deformations buffered per parallel flush.
    pub batch_size: usize,
    /// Optional `[min, max]` clamp applied once after all deformation.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub elevation_clamp: Option<[f32; 2]>,
    pub surface: SurfaceConfig,
    pub rocks: RockConfig,
    pub hills: UndulationConfig,
    pub depressions: UndulationConfig,
    pub craters: CraterConfig,
    pub small_craters: CraterConfig,
}

impl Default for TerrainConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            size: 100.0,
            subdivisions: 100,
            batch_size: 32,
            elevation_clamp: None,
            surface: SurfaceConfig::default(),
            rocks: RockConfig::default(),
            hills: UndulationConfig::hills(),
            depressions: UndulationConfig::depressions(),
            craters: CraterConfig::large(),
            small_craters: CraterConfig::small(),
        }
    }
}

impl TerrainConfig {
    /// Default lunar surface with the given seed.
    pub fn with_seed(seed: u64) -> Self {
        Self {
            seed,
            ..Default::default()
        }
    }

    /// Flat basaltic plain: few gentle undulations, a dense field of small
    /// craters and only a handful of large ones.
    pub fn mare(seed: u64) -> Self {
        Self {
            seed,
            rocks: RockConfig {
                count: 300,
                ..Default::default()
            },
            hills: UndulationConfig {
                count: 4,
                amplitude: [0.05, 0.15],
                ..UndulationConfig::hills()
            },
            depressions: UndulationConfig {
                count: 4,
                amplitude: [0.05, 0.1],
                ..UndulationConfig::depressions()
            },
            craters: CraterConfig {
                count: 10,
                ..CraterConfig::large()
            },
            small_craters: CraterConfig {
                count: 400,
                ..CraterConfig::small()
            },
            ..Default::default()
        }
    }

    /// Rough, saturated highlands: many hills and overlapping craters.
    pub fn highlands(seed: u64) -> Self {
        Self {
            seed,
            rocks: RockConfig {
                count: 2000,
                ..Default::default()
            },
            hills: UndulationConfig {
                count: 30,
                radius: RadiusRange { min: 5.0, max: 20.0 },
                ..UndulationConfig::hills()
            },
            depressions: UndulationConfig {
                count: 15,
                ..UndulationConfig::depressions()
            },
            craters: CraterConfig {
                count: 150,
                ..CraterConfig::large()
            },
            small_craters: CraterConfig {
                count: 300,
                ..CraterConfig::small()
            },
            surface: SurfaceConfig {
                planar_jitter: 0.2,
                elevation_jitter: 0.05,
            },
            ..Default::default()
        }
    }

    /// Placement region `[-size/2, size/2]²`.
    pub fn region(&self) -> Result<Region, TerrainError> {
        Region::centered_square(self.size)
    }

    /// Creation options for the surface grid.
    pub fn mesh_options(&self) -> MeshOptions {
        MeshOptions {
            planar_jitter: self.surface.planar_jitter,
            elevation_jitter: self.surface.elevation_jitter,
            seed: self.seed,
        }
    }

    /// Checks every parameter before anything is generated.
    pub fn validate(&self) -> Result<(), ConfigError> {
        ensure_positive("TerrainConfig", "size", self.size)?;
        if self.subdivisions < 1 || self.subdivisions > MAX_SUBDIVISIONS {
            return Err(TerrainError::invalid(
                "TerrainConfig",
                "subdivisions",
                format!("must be in [1, {}], got {}", MAX_SUBDIVISIONS, self.subdivisions),
            )
            .into());
        }
        self.mesh_options().validate()?;

        self.rocks.radius.validate()?;
        self.rocks.style.validate()?;
        self.hills.validate("hills")?;
        self.depressions.validate("depressions")?;
        self.craters.radius.validate()?;
        self.small_craters.radius.validate()?;

        if let Some([min, max]) = self.elevation_clamp {
            ensure_finite("TerrainConfig", "elevation_clamp", min)?;
            ensure_finite("TerrainConfig", "elevation_clamp", max)?;
            if min > max {
                return Err(TerrainError::invalid(
                    "TerrainConfig",
                    "elevation_clamp",
                    format!("inverted clamp range [{}, {}]", min, max),
                )
                .into());
            }
        }
        if self.batch_size == 0 {
            return Err(TerrainError::invalid("TerrainConfig", "batch_size", "must be at least 1").into());
        }
        Ok(())
    }

    /// Reads and validates a TOML configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Writes the configuration as pretty TOML.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let content = toml::to_string_pretty(self)?;
        if let Some(dir) = path.as_ref().parent() {
            if !dir.as_os_str().is_empty() {
                std::fs::create_dir_all(dir)?;
            }
        }
        std::fs::write(path, content)?;
        Ok(())
    }
}
