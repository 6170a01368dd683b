//! Pipeline module for orchestrating terrain generation stages.
//!
//! A run creates one mesh, scatters rocks onto it, layers hills,
//! depressions and two crater classes on top and finally binds the result
//! to a height index.

mod builder;
mod cancel;
mod governor;
mod stage;

pub use builder::{GenerationSummary, Terrain, TerrainBuilder};
pub use cancel::CancelToken;
pub use governor::{Governor, NoopGovernor, SleepGovernor};
pub use stage::{
    CraterStage, GenerationStage, PipelineError, RockStage, StageContext, StageId,
    UndulationStage,
};
