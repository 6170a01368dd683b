//! Uniform scatter placement.
//!
//! Placements are independent draws: there is no overlap avoidance or
//! minimum spacing, and two placements may coincide.

use std::iter::FusedIterator;

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::geometry::{RadiusRange, Region};

/// One scattered center and radius.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Placement {
    pub x: f32,
    pub y: f32,
    pub radius: f32,
}

impl Placement {
    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }
}

/// Validated region and radius range to draw placements from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScatterPlacer {
    region: Region,
    radius: RadiusRange,
}

impl ScatterPlacer {
    pub fn new(region: Region, radius: RadiusRange) -> Result<Self, TerrainError> {
        region.validate()?;
        radius.validate()?;
        Ok(Self { region, radius })
    }

    pub fn region(&self) -> Region {
        self.region
    }

    pub fn radius_range(&self) -> RadiusRange {
        self.radius
    }

    /// Lazily draws `count` placements from `rng`.
    ///
    /// Each placement consumes x, then y, then radius from the stream. The
    /// sequence can be replayed by calling again with an RNG in the same
    /// state.
    pub fn place<'r, R: Rng + ?Sized>(&self, count: usize, rng: &'r mut R) -> Scatter<'r, R> {
        Scatter {
            rng,
            region: self.region,
            radius: self.radius,
            remaining: count,
        }
    }
}

/// Validates the inputs and returns a lazy sequence of `count` placements.
pub fn place<'r, R: Rng + ?Sized>(
    count: usize,
    region: Region,
    radius: RadiusRange,
    rng: &'r mut R,
) -> Result<Scatter<'r, R>, TerrainError> {
    Ok(ScatterPlacer::new(region, radius)?.place(count, rng))
}

/// Finite iterator over scattered placements.
pub struct Scatter<'r, R: ?Sized> {
    rng: &'r mut R,
    region: Region,
    radius: RadiusRange,
    remaining: usize,
}

impl<R: Rng + ?Sized> Iterator for Scatter<'_, R> {
    type Item = Placement;

    fn next(&mut self) -> Option<Placement> {
        if self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;

        let x = self.rng.random_range(self.region.min.x..=self.region.max.x);
        let y = self.rng.random_range(self.region.min.y..=self.region.max.y);
        let radius = self.rng.random_range(self.radius.min..=self.radius.max);
        Some(Placement { x, y, radius })
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<R: Rng + ?Sized> ExactSizeIterator for Scatter<'_, R> {}

impl<R: Rng + ?Sized> FusedIterator for Scatter<'_, R> {}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn lunar_region() -> Region {
        Region::centered_square(100.0).unwrap()
    }

    fn rock_radii() -> RadiusRange {
        RadiusRange { min: 0.01, max: 0.2 }
    }

    #[test]
    fn test_exact_count_and_bounds() {
        let mut rng = ChaCha8Rng::seed_from_u64(1);
        let region = lunar_region();
        let radii = rock_radii();
        let placements: Vec<_> = place(250, region, radii, &mut rng).unwrap().collect();

        assert_eq!(placements.len(), 250);
        for p in &placements {
            assert!(region.contains(p.center()), "{:?} outside region", p);
            assert!(radii.contains(p.radius), "{:?} radius out of range", p);
        }
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let first: Vec<_> = place(5, lunar_region(), rock_radii(), &mut ChaCha8Rng::seed_from_u64(42))
            .unwrap()
            .collect();
        let second: Vec<_> = place(5, lunar_region(), rock_radii(), &mut ChaCha8Rng::seed_from_u64(42))
            .unwrap()
            .collect();
        assert_eq!(first, second);
    }

    #[test]
    fn test_different_seeds_differ() {
        let a: Vec<_> = place(5, lunar_region(), rock_radii(), &mut ChaCha8Rng::seed_from_u64(1))
            .unwrap()
            .collect();
        let b: Vec<_> = place(5, lunar_region(), rock_radii(), &mut ChaCha8Rng::seed_from_u64(2))
            .unwrap()
            .collect();
        assert_ne!(a, b);
    }

    #[test]
    fn test_zero_count_is_empty() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut scatter = place(0, lunar_region(), rock_radii(), &mut rng).unwrap();
        assert_eq!(scatter.len(), 0);
        assert_eq!(scatter.next(), None);
    }

    #[test]
    fn test_is_lazy_and_exact_size() {
        let mut rng = ChaCha8Rng::seed_from_u64(3);
        let mut scatter = place(3, lunar_region(), rock_radii(), &mut rng).unwrap();
        assert_eq!(scatter.len(), 3);
        scatter.next();
        assert_eq!(scatter.len(), 2);
        scatter.next();
        scatter.next();
        assert_eq!(scatter.next(), None);
        assert_eq!(scatter.next(), None);
    }

    #[test]
    fn test_replay_from_cloned_state() {
        let mut rng = ChaCha8Rng::seed_from_u64(8);
        let mut replay = rng.clone();
        let placer = ScatterPlacer::new(lunar_region(), rock_radii()).unwrap();

        let first: Vec<_> = placer.place(10, &mut rng).collect();
        let again: Vec<_> = placer.place(10, &mut replay).collect();
        assert_eq!(first, again);
    }

    #[test]
    fn test_degenerate_radius_range_is_allowed() {
        let mut rng = ChaCha8Rng::seed_from_u64(4);
        let fixed = RadiusRange { min: 2.0, max: 2.0 };
        assert!(place(4, lunar_region(), fixed, &mut rng)
            .unwrap()
            .all(|p| p.radius == 2.0));
    }

    #[test]
    fn test_invalid_inputs_rejected() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let inverted = RadiusRange { min: 1.0, max: 0.5 };
        assert!(place(3, lunar_region(), inverted, &mut rng).is_err());

        let flat = Region {
            min: Vec2::new(0.0, 0.0),
            max: Vec2::new(10.0, 0.0),
        };
        assert!(place(3, flat, rock_radii(), &mut rng).is_err());
    }

    #[test]
    fn test_unsampleable_region_is_an_error() {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let huge = Region {
            min: Vec2::splat(-3e38),
            max: Vec2::splat(3e38),
        };
        assert!(matches!(
            place(3, huge, rock_radii(), &mut rng),
            Err(TerrainError::InvalidParameter { .. })
        ));

        let wide = Region::centered_square(2e38).unwrap();
        let placements: Vec<_> = place(3, wide, rock_radii(), &mut rng).unwrap().collect();
        assert_eq!(placements.len(), 3);
        assert!(placements.iter().all(|p| wide.contains(p.center())));
    }
}
