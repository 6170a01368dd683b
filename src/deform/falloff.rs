//! Radial falloff profiles.

use serde::{Deserialize, Serialize};

/// Maps a distance from the deformation center to an effect weight.
///
/// Every profile is 1 at the center, 0 at and beyond the radius, and
/// monotonically non-increasing in between.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Falloff {
    /// `1 - d/r`
    #[default]
    Linear,
    /// Hermite smoothstep of `1 - d/r`; flat at the center and the edge.
    Smoothstep,
    /// `1 - (d/r)²`; a bowl with a steep edge.
    Quadratic,
}

impl Falloff {
    pub const ALL: [Falloff; 3] = [Falloff::Linear, Falloff::Smoothstep, Falloff::Quadratic];

    /// Weight at `distance` for a deformation of `radius`.
    ///
    /// `radius` must be positive; callers validate it at construction.
    #[inline]
    pub fn weight(self, distance: f32, radius: f32) -> f32 {
        if distance >= radius {
            return 0.0;
        }
        let t = (distance / radius).max(0.0);
        match self {
            Falloff::Linear => 1.0 - t,
            Falloff::Smoothstep => {
                let s = 1.0 - t;
                s * s * (3.0 - 2.0 * s)
            }
            Falloff::Quadratic => 1.0 - t * t,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Falloff::Linear => "linear",
            Falloff::Smoothstep => "smoothstep",
            Falloff::Quadratic => "quadratic",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_full_weight_at_center() {
        for falloff in Falloff::ALL {
            assert_eq!(falloff.weight(0.0, 4.0), 1.0, "{}", falloff.name());
        }
    }

    #[test]
    fn test_zero_at_and_beyond_radius() {
        for falloff in Falloff::ALL {
            assert_eq!(falloff.weight(4.0, 4.0), 0.0);
            assert_eq!(falloff.weight(4.5, 4.0), 0.0);
            assert_eq!(falloff.weight(1e6, 4.0), 0.0);
        }
    }

    #[test]
    fn test_monotonic_non_increasing() {
        for falloff in Falloff::ALL {
            let mut previous = f32::INFINITY;
            for step in 0..=200 {
                let d = step as f32 * 0.025;
                let w = falloff.weight(d, 5.0);
                assert!(w <= previous, "{} rises at d={}", falloff.name(), d);
                assert!((0.0..=1.0).contains(&w));
                previous = w;
            }
        }
    }

    #[test]
    fn test_linear_profile() {
        assert!((Falloff::Linear.weight(2.5, 10.0) - 0.75).abs() < 1e-6);
        assert!((Falloff::Quadratic.weight(5.0, 10.0) - 0.75).abs() < 1e-6);
        assert!((Falloff::Smoothstep.weight(5.0, 10.0) - 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_default_is_linear() {
        assert_eq!(Falloff::default(), Falloff::Linear);
    }
}
