//! PNG export functionality for heightmaps.

use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::{ImageBuffer, ImageEncoder, Luma};

use crate::terrain::TerrainMesh;

use super::{normalization_range, north_up_rows, quantize, ExportError};

/// Options for PNG export.
#[derive(Debug, Clone)]
pub struct PngExportOptions {
    /// Elevation mapped to black.
    pub min_height: f32,
    /// Elevation mapped to white.
    pub max_height: f32,
    /// PNG compression type.
    pub compression: CompressionType,
    /// PNG filter type.
    pub filter: FilterType,
}

impl Default for PngExportOptions {
    fn default() -> Self {
        Self {
            min_height: -1.0,
            max_height: 1.0,
            compression: CompressionType::Default,
            filter: FilterType::Adaptive,
        }
    }
}

impl PngExportOptions {
    /// Creates options spanning the mesh's surface elevation range.
    pub fn auto_range(mesh: &TerrainMesh) -> Self {
        let (min, max) = normalization_range(mesh);
        Self {
            min_height: min,
            max_height: max,
            ..Default::default()
        }
    }
}

/// Exports the surface grid as a 16-bit grayscale PNG, north up.
///
/// Each pixel is one surface vertex; merged rocks are not part of the
/// image.
pub fn export_heightmap_png(
    mesh: &TerrainMesh,
    path: &Path,
    options: &PngExportOptions,
) -> Result<(), ExportError> {
    let min = options.min_height;
    let max = options.max_height;

    if min.is_nan() || max.is_nan() || min >= max {
        return Err(ExportError::InvalidHeightRange(min, max));
    }

    let (resolution, heights) = north_up_rows(mesh)?;
    let range = max - min;

    let pixels: Vec<u16> = heights.iter().map(|&h| quantize(h, min, range)).collect();
    let img: ImageBuffer<Luma<u16>, Vec<u16>> = ImageBuffer::from_raw(resolution, resolution, pixels)
        .ok_or(ExportError::TooLarge(resolution))?;

    // Write with specified compression settings
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let encoder = PngEncoder::new_with_quality(writer, options.compression, options.filter);

    // Convert u16 slice to bytes for the encoder
    let byte_slice: &[u8] = bytemuck::cast_slice(img.as_raw());

    encoder.write_image(byte_slice, resolution, resolution, image::ExtendedColorType::L16)?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deform::{Crater, DeformationOperator};
    use glam::Vec2;
    use tempfile::tempdir;

    fn cratered() -> TerrainMesh {
        let mut mesh = TerrainMesh::create(32.0, 63).unwrap();
        Crater::new(Vec2::new(3.0, -2.0), 10.0).unwrap().apply(&mut mesh);
        mesh
    }

    #[test]
    fn test_export_heightmap_png() {
        let mesh = cratered();
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.png");

        export_heightmap_png(&mesh, &path, &PngExportOptions::auto_range(&mesh)).unwrap();

        let img = image::open(&path).unwrap().into_luma16();
        assert_eq!(img.dimensions(), (64, 64));
        let darkest = img.pixels().map(|p| p.0[0]).min().unwrap();
        let brightest = img.pixels().map(|p| p.0[0]).max().unwrap();
        assert_eq!(darkest, 0);
        assert_eq!(brightest, 65535);
    }

    #[test]
    fn test_png_is_north_up() {
        let mut mesh = TerrainMesh::create(2.0, 1).unwrap();
        // South row low, north row high.
        mesh.add_deltas(&[0.0, 0.0, 1.0, 1.0]).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("north.png");

        let options = PngExportOptions {
            min_height: 0.0,
            max_height: 1.0,
            ..Default::default()
        };
        export_heightmap_png(&mesh, &path, &options).unwrap();

        let img = image::open(&path).unwrap().into_luma16();
        assert_eq!(img.get_pixel(0, 0).0[0], 65535);
        assert_eq!(img.get_pixel(1, 1).0[0], 0);
    }

    #[test]
    fn test_invalid_height_range() {
        let mesh = cratered();
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.png");

        let options = PngExportOptions {
            min_height: 1.0,
            max_height: -1.0, // Invalid: min > max
            ..Default::default()
        };

        let result = export_heightmap_png(&mesh, &path, &options);
        assert!(matches!(result, Err(ExportError::InvalidHeightRange(..))));
        assert!(!path.exists());
    }

    #[test]
    fn test_auto_range() {
        let mut mesh = TerrainMesh::create(4.0, 2).unwrap();
        mesh.add_deltas(&[-0.5, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.75])
            .unwrap();

        let options = PngExportOptions::auto_range(&mesh);
        assert_eq!(options.min_height, -0.5);
        assert_eq!(options.max_height, 0.75);
    }
}
