//! Planar geometry primitives.
//!
//! Provides axis-aligned regions, inclusive radius ranges and the uniform
//! bucket grid used for nearest-vertex lookups on the terrain surface.

mod region;
mod spatial;

pub use region::{Region, RadiusRange};
pub use spatial::SurfaceIndex;
