//! Uniform bucket grid for nearest-point queries on the terrain plane.
//!
//! Surface vertices never move in the plane after mesh creation, so the
//! index is built once per mesh and reused for every height query.

use glam::Vec2;

/// Upper bound on buckets per indexed point.
const MAX_CELLS_PER_POINT: usize = 4;

/// Nearest-point index over a fixed set of planar points.
///
/// Points are bucketed into square cells of roughly the average point
/// spacing. A query scans rings of cells around the query cell until no
/// unscanned cell can hold a closer point. Ties on distance resolve to the
/// lowest point index, which matches a linear scan.
#[derive(Debug, Clone)]
pub struct SurfaceIndex {
    points: Vec<Vec2>,
    origin: Vec2,
    cell_size: f32,
    cols: usize,
    rows: usize,
    buckets: Vec<Vec<u32>>,
}

impl SurfaceIndex {
    /// Builds an index with a cell size close to the average point spacing.
    pub fn build(points: &[Vec2]) -> Self {
        let (min, max) = bounds(points);
        let extent = max - min;
        let area = extent.x.max(0.0) * extent.y.max(0.0);

        let cell_size = if points.len() > 1 && area > 0.0 {
            (area / points.len() as f32).sqrt()
        } else {
            extent.max_element().max(1.0)
        };

        Self::with_cell_size(points, cell_size)
    }

    /// Builds an index with an explicit cell size.
    ///
    /// Non-finite or non-positive sizes fall back to a single cell spanning
    /// all points. The size is doubled until the grid holds at most
    /// `MAX_CELLS_PER_POINT` cells per point.
    pub fn with_cell_size(points: &[Vec2], cell_size: f32) -> Self {
        let (min, max) = bounds(points);
        let extent = (max - min).max(Vec2::ZERO);

        let mut cell_size = if cell_size.is_finite() && cell_size > 0.0 {
            cell_size
        } else {
            extent.max_element().max(1.0)
        };

        let (cols, rows) = if points.is_empty() {
            (0, 0)
        } else {
            let max_cells = points.len().saturating_mul(MAX_CELLS_PER_POINT);
            loop {
                let (cols, rows) = grid_dimensions(extent, cell_size);
                match cols.checked_mul(rows) {
                    Some(cells) if cells <= max_cells => break (cols, rows),
                    _ => cell_size *= 2.0,
                }
            }
        };

        let mut index = Self {
            points: points.to_vec(),
            origin: min,
            cell_size,
            cols,
            rows,
            buckets: vec![Vec::new(); cols * rows],
        };

        for (i, &p) in points.iter().enumerate() {
            let (cx, cy) = index.cell_of(p);
            let bucket = cy * index.cols + cx;
            index.buckets[bucket].push(i as u32);
        }

        index
    }

    /// Number of indexed points.
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Grid dimensions in cells as `(cols, rows)`.
    pub fn dimensions(&self) -> (usize, usize) {
        (self.cols, self.rows)
    }

    /// Returns the index of the point closest to `query`, or `None` when the
    /// index is empty.
    pub fn nearest(&self, query: Vec2) -> Option<u32> {
        if self.points.is_empty() {
            return None;
        }

        let (cx, cy) = self.cell_of(query);
        let max_ring = self.cols.max(self.rows);
        let mut best: Option<(f32, u32)> = None;

        for ring in 0..=max_ring {
            self.scan_ring(query, cx, cy, ring, &mut best);

            if let Some((best_dist_sq, _)) = best {
                let clearance = self.clearance(query, cx, cy, ring);
                // Strict comparison keeps scanning on exact ties so the
                // lowest index wins.
                if best_dist_sq < clearance * clearance {
                    break;
                }
            }
        }

        best.map(|(_, idx)| idx)
    }

    /// Cell containing `p`, clamped into the grid.
    fn cell_of(&self, p: Vec2) -> (usize, usize) {
        let local = (p - self.origin) / self.cell_size;
        let cx = (local.x.floor().max(0.0) as usize).min(self.cols.saturating_sub(1));
        let cy = (local.y.floor().max(0.0) as usize).min(self.rows.saturating_sub(1));
        (cx, cy)
    }

    fn scan_ring(
        &self,
        query: Vec2,
        cx: usize,
        cy: usize,
        ring: usize,
        best: &mut Option<(f32, u32)>,
    ) {
        let (cx, cy, r) = (cx as i64, cy as i64, ring as i64);

        for y in (cy - r)..=(cy + r) {
            if y < 0 || y >= self.rows as i64 {
                continue;
            }
            let on_edge_row = y == cy - r || y == cy + r;

            for x in (cx - r)..=(cx + r) {
                if x < 0 || x >= self.cols as i64 {
                    continue;
                }
                // Interior cells were scanned by earlier rings.
                if !on_edge_row && x != cx - r && x != cx + r {
                    continue;
                }

                let bucket = &self.buckets[y as usize * self.cols + x as usize];
                for &idx in bucket {
                    let dist_sq = (self.points[idx as usize] - query).length_squared();
                    let better = match *best {
                        None => true,
                        Some((d, i)) => dist_sq < d || (dist_sq == d && idx < i),
                    };
                    if better {
                        *best = Some((dist_sq, idx));
                    }
                }
            }
        }
    }

    /// Lower bound on the distance from `query` to any point in a cell outside
    /// the square of rings `0..=ring`. Sides that coincide with the grid
    /// boundary have nothing beyond them and are ignored.
    fn clearance(&self, query: Vec2, cx: usize, cy: usize, ring: usize) -> f32 {
        let mut clearance = f32::INFINITY;

        if cx > ring {
            let x0 = self.origin.x + (cx - ring) as f32 * self.cell_size;
            clearance = clearance.min(query.x - x0);
        }
        if cx + ring + 1 < self.cols {
            let x1 = self.origin.x + (cx + ring + 1) as f32 * self.cell_size;
            clearance = clearance.min(x1 - query.x);
        }
        if cy > ring {
            let y0 = self.origin.y + (cy - ring) as f32 * self.cell_size;
            clearance = clearance.min(query.y - y0);
        }
        if cy + ring + 1 < self.rows {
            let y1 = self.origin.y + (cy + ring + 1) as f32 * self.cell_size;
            clearance = clearance.min(y1 - query.y);
        }

        clearance.max(0.0)
    }
}

/// Cell counts along each axis. Non-finite ratios collapse to one cell.
fn grid_dimensions(extent: Vec2, cell_size: f32) -> (usize, usize) {
    let cells = |span: f32| {
        let ratio = (span / cell_size).floor();
        if ratio.is_finite() {
            (ratio as usize).saturating_add(1)
        } else {
            1
        }
    };
    (cells(extent.x), cells(extent.y))
}

fn bounds(points: &[Vec2]) -> (Vec2, Vec2) {
    if points.is_empty() {
        return (Vec2::ZERO, Vec2::ZERO);
    }
    points.iter().fold(
        (Vec2::splat(f32::MAX), Vec2::splat(f32::MIN)),
        |(lo, hi), &p| (lo.min(p), hi.max(p)),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{Rng, SeedableRng};
    use rand_chacha::ChaCha8Rng;

    fn linear_nearest(points: &[Vec2], query: Vec2) -> Option<u32> {
        let mut best: Option<(f32, u32)> = None;
        for (i, &p) in points.iter().enumerate() {
            let d = (p - query).length_squared();
            if best.map_or(true, |(bd, _)| d < bd) {
                best = Some((d, i as u32));
            }
        }
        best.map(|(_, i)| i)
    }

    fn grid_points(n: usize, spacing: f32) -> Vec<Vec2> {
        let mut points = Vec::new();
        for y in 0..n {
            for x in 0..n {
                points.push(Vec2::new(x as f32 * spacing, y as f32 * spacing));
            }
        }
        points
    }

    #[test]
    fn test_empty_index() {
        let index = SurfaceIndex::build(&[]);
        assert!(index.is_empty());
        assert_eq!(index.nearest(Vec2::ZERO), None);
    }

    #[test]
    fn test_single_point() {
        let index = SurfaceIndex::build(&[Vec2::new(3.0, 4.0)]);
        assert_eq!(index.nearest(Vec2::new(-100.0, 100.0)), Some(0));
    }

    #[test]
    fn test_exact_hit_on_grid() {
        let points = grid_points(11, 1.0);
        let index = SurfaceIndex::build(&points);
        assert_eq!(index.nearest(Vec2::new(3.0, 7.0)), Some(7 * 11 + 3));
        assert_eq!(index.nearest(Vec2::new(3.2, 6.9)), Some(7 * 11 + 3));
    }

    #[test]
    fn test_ties_resolve_to_lowest_index() {
        let points = grid_points(5, 1.0);
        let index = SurfaceIndex::build(&points);
        // Equidistant from (1,1), (2,1), (1,2), (2,2).
        let query = Vec2::new(1.5, 1.5);
        assert_eq!(index.nearest(query), linear_nearest(&points, query));
        assert_eq!(index.nearest(query), Some(5 + 1));
    }

    #[test]
    fn test_queries_outside_bounds() {
        let points = grid_points(8, 2.0);
        let index = SurfaceIndex::build(&points);
        for query in [
            Vec2::new(-50.0, 3.0),
            Vec2::new(100.0, 100.0),
            Vec2::new(7.0, -1000.0),
            Vec2::new(-3.0, -3.0),
        ] {
            assert_eq!(index.nearest(query), linear_nearest(&points, query), "query {:?}", query);
        }
    }

    #[test]
    fn test_matches_linear_scan_on_scattered_points() {
        let mut rng = ChaCha8Rng::seed_from_u64(7);
        let points: Vec<Vec2> = (0..500)
            .map(|_| Vec2::new(rng.random_range(-20.0..20.0), rng.random_range(-5.0..35.0)))
            .collect();
        let index = SurfaceIndex::build(&points);

        for _ in 0..300 {
            let query = Vec2::new(rng.random_range(-30.0..30.0), rng.random_range(-15.0..45.0));
            let got = index.nearest(query).unwrap();
            let want = linear_nearest(&points, query).unwrap();
            let d_got = (points[got as usize] - query).length_squared();
            let d_want = (points[want as usize] - query).length_squared();
            assert_eq!(d_got, d_want, "query {:?}", query);
        }
    }

    #[test]
    fn test_tiny_cells_still_find_nearest() {
        let points = vec![Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0)];
        let index = SurfaceIndex::with_cell_size(&points, 0.1);
        assert_eq!(index.nearest(Vec2::new(9.0, 9.5)), Some(1));
        assert_eq!(index.nearest(Vec2::new(4.0, 4.0)), Some(0));
    }

    #[test]
    fn test_skinny_point_set_keeps_bucket_table_small() {
        let points = vec![
            Vec2::new(0.0, 0.0),
            Vec2::new(1e12, 0.0),
            Vec2::new(0.0, 1e-6),
            Vec2::new(1e12, 1e-6),
        ];
        let index = SurfaceIndex::build(&points);
        let (cols, rows) = index.dimensions();
        assert!(cols * rows <= MAX_CELLS_PER_POINT * points.len(), "{} x {}", cols, rows);

        for query in [Vec2::new(1.0, 0.0), Vec2::new(9e11, 1e-6), Vec2::new(5e11, -3.0)] {
            assert_eq!(index.nearest(query), linear_nearest(&points, query), "query {:?}", query);
        }
    }

    #[test]
    fn test_explicit_cell_size_is_grown_when_too_fine() {
        let points = grid_points(4, 100.0);
        let index = SurfaceIndex::with_cell_size(&points, 1e-3);
        let (cols, rows) = index.dimensions();
        assert!(cols * rows <= MAX_CELLS_PER_POINT * points.len());
        assert!(index.cell_size() > 1e-3);
        assert_eq!(index.nearest(Vec2::new(210.0, 95.0)), Some(4 + 2));
    }

    #[test]
    fn test_cell_size_tracks_spacing() {
        let points = grid_points(101, 1.0);
        let index = SurfaceIndex::build(&points);
        assert!((index.cell_size() - 1.0).abs() < 0.05);
    }
}
