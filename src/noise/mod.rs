//! Noise generation for surface detail.
//!
//! Uses simdnoise fractal Brownian motion to roughen scattered rock geometry.

mod fractal;

pub use fractal::{FractalNoiseConfig, sample_fractal_noise, sample_fractal_noise_batch};
