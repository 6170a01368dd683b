//! Multi-octave fractal Brownian motion (fBm) noise sampling.

use glam::Vec3;
use serde::{Deserialize, Serialize};
use simdnoise::NoiseBuilder;

/// Configuration for multi-octave fractal noise.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FractalNoiseConfig {
    /// Number of noise octaves.
    pub octaves: u8,
    /// Base frequency; the inverse of the feature size.
    pub frequency: f32,
    /// Frequency multiplier per octave.
    pub lacunarity: f32,
    /// Amplitude decay per octave.
    pub persistence: f32,
    /// Random seed for reproducible generation.
    pub seed: i32,
}

impl Default for FractalNoiseConfig {
    fn default() -> Self {
        Self::rock_surface(42)
    }
}

impl FractalNoiseConfig {
    /// Billowy, cloud-like detail at a 0.25 feature scale, used for rocks.
    pub fn rock_surface(seed: i32) -> Self {
        Self {
            octaves: 3,
            frequency: 4.0,
            lacunarity: 2.0,
            persistence: 0.5,
            seed,
        }
    }

    /// Returns a copy of this configuration with a different seed.
    pub fn with_seed(self, seed: i32) -> Self {
        Self { seed, ..self }
    }

    /// Sum of octave amplitudes, used to normalize samples to about [-1, 1].
    fn amplitude_sum(&self) -> f32 {
        let mut sum = 0.0;
        let mut amplitude = 1.0;
        for _ in 0..self.octaves.max(1) {
            sum += amplitude;
            amplitude *= self.persistence;
        }
        sum
    }
}

/// Samples fractal noise at a 3D position.
///
/// The returned value is normalized by the octave amplitude sum and clamped
/// to [-1, 1].
pub fn sample_fractal_noise(pos: Vec3, config: &FractalNoiseConfig) -> f32 {
    let p = pos * config.frequency;

    let raw = NoiseBuilder::fbm_3d_offset(p.x, 1, p.y, 1, p.z, 1)
        .with_seed(config.seed)
        .with_freq(1.0)
        .with_octaves(config.octaves.max(1))
        .with_gain(config.persistence)
        .with_lacunarity(config.lacunarity)
        .generate()
        .0[0];

    (raw / config.amplitude_sum()).clamp(-1.0, 1.0)
}

/// Samples fractal noise for a batch of positions.
pub fn sample_fractal_noise_batch(positions: &[Vec3], config: &FractalNoiseConfig) -> Vec<f32> {
    positions
        .iter()
        .map(|&pos| sample_fractal_noise(pos, config))
        .collect()
}
