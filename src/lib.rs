//! Procedural lunar terrain synthesis.
//!
//! A flat heightfield grid is scattered with decorative rocks and then
//! shaped by additive radial deformations (hills, depressions and
//! craters). The finished mesh comes with a nearest-vertex height query
//! used to place cameras on the surface.

pub mod camera;
pub mod config;
pub mod deform;
pub mod error;
pub mod export;
pub mod geometry;
pub mod noise;
pub mod pipeline;
pub mod scatter;
pub mod terrain;

pub use camera::{plan_cameras, CameraPlacement, CameraPlan};
pub use config::{ConfigError, TerrainConfig};
pub use deform::{Crater, Deformation, DeformationBatch, DeformationOperator, DeformationSpec, Falloff, RadialUndulation};
pub use error::TerrainError;
pub use geometry::{RadiusRange, Region, SurfaceIndex};
pub use pipeline::{CancelToken, PipelineError, Terrain, TerrainBuilder};
pub use scatter::{Placement, ScatterPlacer};
pub use terrain::{surface_height, HeightQuery, TerrainMesh, VertexId};
