//! Generation stage trait and the scatter/deformation stages.

use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::{CraterConfig, RockConfig, UndulationConfig};
use crate::deform::{Crater, DeformationBatch, RadialUndulation};
use crate::error::TerrainError;
use crate::geometry::Region;
use crate::scatter::ScatterPlacer;
use crate::terrain::{generate_rock, TerrainMesh};

use super::cancel::CancelToken;
use super::governor::Governor;

/// Stream used for centers and radii.
const PLACEMENT_STREAM: u64 = 0;
/// Stream used for per-feature amplitudes and rock shapes.
const DETAIL_STREAM: u64 = 1;

/// Unique identifier for generation stages, in execution order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Grid creation.
    Surface,
    /// Decorative rocks, merged into the mesh.
    Rocks,
    Hills,
    Depressions,
    /// Large craters.
    Craters,
    /// Fine crater texture layered on top.
    SmallCraters,
    /// Optional clamp and index construction.
    Finalize,
}

impl StageId {
    pub const ALL: [StageId; 7] = [
        StageId::Surface,
        StageId::Rocks,
        StageId::Hills,
        StageId::Depressions,
        StageId::Craters,
        StageId::SmallCraters,
        StageId::Finalize,
    ];

    /// Returns the name of the stage.
    pub fn name(&self) -> &'static str {
        match self {
            StageId::Surface => "surface",
            StageId::Rocks => "rocks",
            StageId::Hills => "hills",
            StageId::Depressions => "depressions",
            StageId::Craters => "craters",
            StageId::SmallCraters => "small craters",
            StageId::Finalize => "finalize",
        }
    }

    /// Offset mixed into the master seed so every stage draws from its own
    /// stream. Changing one stage's count never reshuffles another stage.
    pub fn salt(&self) -> u64 {
        match self {
            StageId::Surface => 0x5u64 << 56,
            StageId::Rocks => 0x1u64 << 56,
            StageId::Hills => 0x2u64 << 56,
            StageId::Depressions => 0x3u64 << 56,
            StageId::Craters => 0x4u64 << 56,
            StageId::SmallCraters => 0x6u64 << 56,
            StageId::Finalize => 0x7u64 << 56,
        }
    }

    /// Relative cost of one item, used by throttling governors.
    pub fn pause_weight(&self) -> f32 {
        match self {
            StageId::Rocks => 0.01,
            StageId::Hills | StageId::Depressions => 0.1,
            StageId::Craters | StageId::SmallCraters => 0.05,
            StageId::Surface | StageId::Finalize => 0.0,
        }
    }
}

impl std::fmt::Display for StageId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Errors that can occur during pipeline execution.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("Stage '{stage}' failed: {source}")]
    StageFailed {
        stage: StageId,
        #[source]
        source: TerrainError,
    },
    #[error("Generation cancelled during stage '{stage}'")]
    Cancelled { stage: StageId },
    #[error(transparent)]
    Config(#[from] crate::config::ConfigError),
}

impl PipelineError {
    pub(crate) fn failed(stage: StageId) -> impl FnOnce(TerrainError) -> PipelineError {
        move |source| PipelineError::StageFailed { stage, source }
    }
}

/// Run-wide state shared by the stages.
pub struct StageContext<'a> {
    pub seed: u64,
    pub region: Region,
    pub batch_size: usize,
    pub cancel: &'a CancelToken,
    pub governor: &'a dyn Governor,
}

impl StageContext<'_> {
    /// Deterministic RNG for one stream of one stage.
    pub fn rng(&self, stage: StageId, stream: u64) -> ChaCha8Rng {
        let mut rng = ChaCha8Rng::seed_from_u64(self.seed.wrapping_add(stage.salt()));
        rng.set_stream(stream);
        rng
    }

    pub fn check_cancelled(&self, stage: StageId) -> Result<(), PipelineError> {
        if self.cancel.is_cancelled() {
            warn!(stage = stage.name(), "generation cancelled");
            return Err(PipelineError::Cancelled { stage });
        }
        Ok(())
    }

    /// Applies the queued deformations and lets the governor pause.
    fn flush(
        &self,
        stage: StageId,
        batch: &mut DeformationBatch,
        mesh: &mut TerrainMesh,
    ) -> Result<(), PipelineError> {
        let items = batch.len();
        if items == 0 {
            return Ok(());
        }
        batch.apply(mesh).map_err(PipelineError::failed(stage))?;
        debug!(stage = stage.name(), items, "flushed deformation batch");
        self.governor.pause(stage, items);
        Ok(())
    }
}

/// Trait for implementing generation stages.
///
/// Each stage mutates the mesh in place and returns how many features it
/// produced. Stages run strictly one after another.
pub trait GenerationStage: Send + Sync {
    fn id(&self) -> StageId;

    fn name(&self) -> &str {
        self.id().name()
    }

    fn execute(&self, mesh: &mut TerrainMesh, ctx: &StageContext<'_>) -> Result<usize, PipelineError>;
}

/// Scatters rocks and merges them into the mesh.
pub struct RockStage {
    pub config: RockConfig,
}

impl GenerationStage for RockStage {
    fn id(&self) -> StageId {
        StageId::Rocks
    }

    fn execute(&self, mesh: &mut TerrainMesh, ctx: &StageContext<'_>) -> Result<usize, PipelineError> {
        let stage = self.id();
        let placer =
            ScatterPlacer::new(ctx.region, self.config.radius).map_err(PipelineError::failed(stage))?;
        let mut placement_rng = ctx.rng(stage, PLACEMENT_STREAM);
        let mut shape_rng = ctx.rng(stage, DETAIL_STREAM);

        let count = self.config.count as usize;
        let mut rocks = Vec::with_capacity(count);
        let mut pending = 0;

        for placement in placer.place(count, &mut placement_rng) {
            ctx.check_cancelled(stage)?;
            let rock = generate_rock(&placement, &self.config.style, &mut shape_rng)
                .map_err(PipelineError::failed(stage))?;
            rocks.push(rock);

            pending += 1;
            if pending == ctx.batch_size {
                ctx.governor.pause(stage, pending);
                pending = 0;
            }
        }
        if pending > 0 {
            ctx.governor.pause(stage, pending);
        }

        let produced = rocks.len();
        mesh.merge(rocks).map_err(PipelineError::failed(stage))?;
        debug!(rocks = produced, vertices = mesh.vertex_count(), "merged rocks");
        Ok(produced)
    }
}

/// Hills (`sign = 1`) or depressions (`sign = -1`).
///
/// Each feature gets a radius from the placement and a height of
/// `sign × radius × U(amplitude)`.
pub struct UndulationStage {
    pub id: StageId,
    pub config: UndulationConfig,
    pub sign: f32,
}

impl UndulationStage {
    pub fn hills(config: UndulationConfig) -> Self {
        Self {
            id: StageId::Hills,
            config,
            sign: 1.0,
        }
    }

    pub fn depressions(config: UndulationConfig) -> Self {
        Self {
            id: StageId::Depressions,
            config,
            sign: -1.0,
        }
    }
}

impl GenerationStage for UndulationStage {
    fn id(&self) -> StageId {
        self.id
    }

    fn execute(&self, mesh: &mut TerrainMesh, ctx: &StageContext<'_>) -> Result<usize, PipelineError> {
        let stage = self.id;
        let placer =
            ScatterPlacer::new(ctx.region, self.config.radius).map_err(PipelineError::failed(stage))?;
        let [lo, hi] = self.config.amplitude;
        if !(lo.is_finite() && hi.is_finite() && 0.0 <= lo && lo <= hi) {
            return Err(PipelineError::StageFailed {
                stage,
                source: TerrainError::invalid(
                    "UndulationStage",
                    "amplitude",
                    format!("expected 0 <= min <= max, got [{}, {}]", lo, hi),
                ),
            });
        }

        let mut placement_rng = ctx.rng(stage, PLACEMENT_STREAM);
        let mut amplitude_rng = ctx.rng(stage, DETAIL_STREAM);
        let mut batch = DeformationBatch::with_capacity(ctx.batch_size);
        let mut produced = 0;

        for placement in placer.place(self.config.count as usize, &mut placement_rng) {
            ctx.check_cancelled(stage)?;
            let ratio: f32 = amplitude_rng.random_range(lo..=hi);
            let height = self.sign * placement.radius * ratio;
            let undulation = RadialUndulation::new(placement.center(), placement.radius, height)
                .map_err(PipelineError::failed(stage))?
                .with_falloff(self.config.falloff);
            batch.push(undulation);
            produced += 1;

            if batch.len() == ctx.batch_size {
                ctx.flush(stage, &mut batch, mesh)?;
            }
        }
        ctx.flush(stage, &mut batch, mesh)?;
        Ok(produced)
    }
}

/// Craters of one size class.
pub struct CraterStage {
    pub id: StageId,
    pub config: CraterConfig,
}

impl CraterStage {
    pub fn large(config: CraterConfig) -> Self {
        Self {
            id: StageId::Craters,
            config,
        }
    }

    pub fn small(config: CraterConfig) -> Self {
        Self {
            id: StageId::SmallCraters,
            config,
        }
    }
}

impl GenerationStage for CraterStage {
    fn id(&self) -> StageId {
        self.id
    }

    fn execute(&self, mesh: &mut TerrainMesh, ctx: &StageContext<'_>) -> Result<usize, PipelineError> {
        let stage = self.id;
        let placer =
            ScatterPlacer::new(ctx.region, self.config.radius).map_err(PipelineError::failed(stage))?;
        let mut placement_rng = ctx.rng(stage, PLACEMENT_STREAM);
        let mut batch = DeformationBatch::with_capacity(ctx.batch_size);
        let mut produced = 0;

        for placement in placer.place(self.config.count as usize, &mut placement_rng) {
            ctx.check_cancelled(stage)?;
            let crater = Crater::new(placement.center(), placement.radius)
                .map_err(PipelineError::failed(stage))?;
            batch.push(crater);
            produced += 1;

            if batch.len() == ctx.batch_size {
                ctx.flush(stage, &mut batch, mesh)?;
            }
        }
        ctx.flush(stage, &mut batch, mesh)?;
        Ok(produced)
    }
}
