//! End-to-end terrain construction.

use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info, warn};

use crate::config::TerrainConfig;
use crate::geometry::SurfaceIndex;
use crate::terrain::{HeightQuery, TerrainMesh};

use super::cancel::CancelToken;
use super::governor::{Governor, NoopGovernor};
use super::stage::{
    CraterStage, GenerationStage, PipelineError, RockStage, StageContext, StageId, UndulationStage,
};

/// Feature counts and post-processing results of one run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct GenerationSummary {
    pub rocks: usize,
    pub hills: usize,
    pub depressions: usize,
    pub craters: usize,
    pub small_craters: usize,
    /// Vertices changed by the elevation clamp.
    pub clamped: usize,
    /// Surface elevation range after finalization.
    pub elevation_range: (f32, f32),
}

impl GenerationSummary {
    fn record(&mut self, stage: StageId, produced: usize) {
        match stage {
            StageId::Rocks => self.rocks = produced,
            StageId::Hills => self.hills = produced,
            StageId::Depressions => self.depressions = produced,
            StageId::Craters => self.craters = produced,
            StageId::SmallCraters => self.small_craters = produced,
            StageId::Surface | StageId::Finalize => {}
        }
    }
}

/// A finalized terrain: the mesh plus its surface height index.
///
/// The mesh is read-only from here on, so height queries can be shared
/// freely between threads.
#[derive(Debug, Clone)]
pub struct Terrain {
    mesh: TerrainMesh,
    index: SurfaceIndex,
    seed: u64,
    summary: GenerationSummary,
}

impl Terrain {
    pub fn mesh(&self) -> &TerrainMesh {
        &self.mesh
    }

    pub fn index(&self) -> &SurfaceIndex {
        &self.index
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }

    pub fn summary(&self) -> &GenerationSummary {
        &self.summary
    }

    pub fn height_query(&self) -> HeightQuery<'_> {
        HeightQuery::bound(&self.mesh, &self.index)
    }

    pub fn into_mesh(self) -> TerrainMesh {
        self.mesh
    }
}

/// Builds terrains from a [`TerrainConfig`].
///
/// Output depends only on the configuration: the same config and seed
/// always produce the same mesh.
pub struct TerrainBuilder {
    config: TerrainConfig,
    governor: Arc<dyn Governor>,
    cancel: CancelToken,
}

impl TerrainBuilder {
    pub fn new(config: TerrainConfig) -> Self {
        Self {
            config,
            governor: Arc::new(NoopGovernor),
            cancel: CancelToken::new(),
        }
    }

    pub fn with_governor(mut self, governor: impl Governor + 'static) -> Self {
        self.governor = Arc::new(governor);
        self
    }

    pub fn with_cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }

    pub fn config(&self) -> &TerrainConfig {
        &self.config
    }

    /// Token that stops a running build when cancelled.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Scatter and deformation stages in execution order.
    pub fn stages(&self) -> Vec<Box<dyn GenerationStage>> {
        vec![
            Box::new(RockStage {
                config: self.config.rocks,
            }),
            Box::new(UndulationStage::hills(self.config.hills)),
            Box::new(UndulationStage::depressions(self.config.depressions)),
            Box::new(CraterStage::large(self.config.craters)),
            Box::new(CraterStage::small(self.config.small_craters)),
        ]
    }

    pub fn build(&self) -> Result<Terrain, PipelineError> {
        self.build_with_callbacks(|_, _, _| {}, |_, _, _| {})
    }

    /// Builds with progress callbacks.
    ///
    /// # Arguments
    /// * `on_stage_start` - Called with the stage name, its position and
    ///   the stage total when each stage begins
    /// * `on_stage_complete` - Called the same way when each stage finishes
    pub fn build_with_callbacks<F1, F2>(
        &self,
        mut on_stage_start: F1,
        mut on_stage_complete: F2,
    ) -> Result<Terrain, PipelineError>
    where
        F1: FnMut(&str, usize, usize),
        F2: FnMut(&str, usize, usize),
    {
        self.config.validate()?;
        let region = self
            .config
            .region()
            .map_err(PipelineError::failed(StageId::Surface))?;
        let ctx = StageContext {
            seed: self.config.seed,
            region,
            batch_size: self.config.batch_size,
            cancel: &self.cancel,
            governor: self.governor.as_ref(),
        };

        let stages = self.stages();
        let total = stages.len() + 2;
        let mut summary = GenerationSummary::default();

        ctx.check_cancelled(StageId::Surface)?;
        on_stage_start(StageId::Surface.name(), 0, total);
        let mut options = self.config.mesh_options();
        options.seed = self.config.seed.wrapping_add(StageId::Surface.salt());
        let mut mesh = TerrainMesh::create_with(self.config.size, self.config.subdivisions, &options)
            .map_err(PipelineError::failed(StageId::Surface))?;
        debug!(
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            "created surface grid"
        );
        on_stage_complete(StageId::Surface.name(), 0, total);

        for (i, stage) in stages.iter().enumerate() {
            ctx.check_cancelled(stage.id())?;
            on_stage_start(stage.name(), i + 1, total);

            let produced = stage.execute(&mut mesh, &ctx)?;
            summary.record(stage.id(), produced);
            debug!(stage = stage.name(), produced, "stage complete");

            on_stage_complete(stage.name(), i + 1, total);
        }

        ctx.check_cancelled(StageId::Finalize)?;
        on_stage_start(StageId::Finalize.name(), total - 1, total);
        if let Some([min, max]) = self.config.elevation_clamp {
            summary.clamped = mesh
                .clamp_elevations(min, max)
                .map_err(PipelineError::failed(StageId::Finalize))?;
            if summary.clamped > 0 {
                warn!(
                    clamped = summary.clamped,
                    min, max, "elevations clamped after deformation"
                );
            }
        }
        let index = mesh.build_surface_index();
        summary.elevation_range = mesh.surface_elevation_range();
        on_stage_complete(StageId::Finalize.name(), total - 1, total);

        info!(
            seed = self.config.seed,
            vertices = mesh.vertex_count(),
            rocks = summary.rocks,
            hills = summary.hills,
            depressions = summary.depressions,
            craters = summary.craters,
            small_craters = summary.small_craters,
            "terrain generated"
        );

        Ok(Terrain {
            mesh,
            index,
            seed: self.config.seed,
            summary,
        })
    }
}
