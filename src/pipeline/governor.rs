//! Throttling hook invoked between pipeline batches.

use std::time::Duration;

use super::stage::StageId;

/// Called after every flushed batch so long runs can yield resources.
///
/// Governors never influence what is generated, only when.
pub trait Governor: Send + Sync {
    /// `items` is the number of placements processed in the batch.
    fn pause(&self, stage: StageId, items: usize);
}

/// Does nothing. The default.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopGovernor;

impl Governor for NoopGovernor {
    fn pause(&self, _stage: StageId, _items: usize) {}
}

/// Sleeps `factor × stage weight` seconds per processed item.
#[derive(Debug, Clone, Copy)]
pub struct SleepGovernor {
    factor: f32,
}

impl SleepGovernor {
    /// Non-finite or negative factors are treated as zero.
    pub fn new(factor: f32) -> Self {
        let factor = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
        Self { factor }
    }

    pub fn factor(&self) -> f32 {
        self.factor
    }

    /// Pause length for a batch of `items` in `stage`.
    pub fn duration(&self, stage: StageId, items: usize) -> Duration {
        Duration::try_from_secs_f32(self.factor * stage.pause_weight() * items as f32)
            .unwrap_or(Duration::MAX)
    }
}

impl Governor for SleepGovernor {
    fn pause(&self, stage: StageId, items: usize) {
        let duration = self.duration(stage, items);
        if !duration.is_zero() {
            std::thread::sleep(duration);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sleep_durations_follow_stage_weights() {
        let governor = SleepGovernor::new(2.0);
        let rocks = governor.duration(StageId::Rocks, 10);
        let hills = governor.duration(StageId::Hills, 10);
        assert!((rocks.as_secs_f32() - 0.2).abs() < 1e-4);
        assert!((hills.as_secs_f32() - 2.0).abs() < 1e-4);
        assert!(governor.duration(StageId::Surface, 10).is_zero());
    }

    #[test]
    fn test_invalid_factor_is_zero() {
        assert_eq!(SleepGovernor::new(-1.0).factor(), 0.0);
        assert_eq!(SleepGovernor::new(f32::NAN).factor(), 0.0);
        assert!(SleepGovernor::new(0.0).duration(StageId::Craters, 1000).is_zero());
    }
}
