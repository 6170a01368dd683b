//! Reproducible stochastic placement within a planar region.

mod placer;

pub use placer::{place, Placement, Scatter, ScatterPlacer};
