//! RAW format export for game engine compatibility.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::terrain::TerrainMesh;

use super::{normalization_range, north_up_rows, quantize, ExportError};

/// RAW export format options.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum RawFormat {
    /// 16-bit unsigned integer, little-endian (Unity default).
    #[default]
    R16LittleEndian,
    /// 16-bit unsigned integer, big-endian.
    R16BigEndian,
    /// 32-bit float, little-endian, unnormalized.
    R32Float,
}

/// Options for RAW export.
#[derive(Debug, Clone)]
pub struct RawExportOptions {
    /// RAW format to use.
    pub format: RawFormat,
    /// Minimum height for normalization (used for R16 formats).
    pub min_height: f32,
    /// Maximum height for normalization (used for R16 formats).
    pub max_height: f32,
}

impl Default for RawExportOptions {
    fn default() -> Self {
        Self {
            format: RawFormat::R16LittleEndian,
            min_height: -1.0,
            max_height: 1.0,
        }
    }
}

impl RawExportOptions {
    /// Creates options spanning the mesh's surface elevation range.
    pub fn auto_range(mesh: &TerrainMesh, format: RawFormat) -> Self {
        let (min, max) = normalization_range(mesh);
        Self {
            format,
            min_height: min,
            max_height: max,
        }
    }
}

/// Exports the surface grid as a headerless RAW heightmap, north up.
pub fn export_heightmap_raw(
    mesh: &TerrainMesh,
    path: &Path,
    options: &RawExportOptions,
) -> Result<(), ExportError> {
    let (min_height, max_height) = (options.min_height, options.max_height);
    if options.format != RawFormat::R32Float
        && (min_height.is_nan() || max_height.is_nan() || min_height >= max_height)
    {
        return Err(ExportError::InvalidHeightRange(min_height, max_height));
    }

    let (_, heights) = north_up_rows(mesh)?;

    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    let range = max_height - min_height;

    match options.format {
        RawFormat::R16LittleEndian => {
            for &height in &heights {
                writer.write_all(&quantize(height, min_height, range).to_le_bytes())?;
            }
        }
        RawFormat::R16BigEndian => {
            for &height in &heights {
                writer.write_all(&quantize(height, min_height, range).to_be_bytes())?;
            }
        }
        RawFormat::R32Float => {
            for &height in &heights {
                writer.write_all(&height.to_le_bytes())?;
            }
        }
    }

    writer.flush()?;
    Ok(())
}

/// Returns the expected file size for a RAW export of a grid with
/// `resolution` vertices per side.
pub fn expected_file_size(resolution: u32, format: RawFormat) -> u64 {
    let pixels = (resolution as u64) * (resolution as u64);
    match format {
        RawFormat::R16LittleEndian | RawFormat::R16BigEndian => pixels * 2,
        RawFormat::R32Float => pixels * 4,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn gradient(subdivisions: u32) -> TerrainMesh {
        let mut mesh = TerrainMesh::create(10.0, subdivisions).unwrap();
        let n = mesh.vertex_count();
        let deltas: Vec<f32> = (0..n).map(|i| (i as f32 / n as f32) * 2.0 - 1.0).collect();
        mesh.add_deltas(&deltas).unwrap();
        mesh
    }

    #[test]
    fn test_export_raw_r16() {
        let mesh = gradient(63);
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.raw");

        let options = RawExportOptions::default();
        export_heightmap_raw(&mesh, &path, &options).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert_eq!(metadata.len(), expected_file_size(64, RawFormat::R16LittleEndian));
    }

    #[test]
    fn test_export_raw_r32() {
        let mesh = gradient(31);
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.raw");

        let options = RawExportOptions {
            format: RawFormat::R32Float,
            ..Default::default()
        };
        export_heightmap_raw(&mesh, &path, &options).unwrap();

        let metadata = std::fs::metadata(&path).unwrap();
        assert_eq!(metadata.len(), expected_file_size(32, RawFormat::R32Float));
    }

    #[test]
    fn test_expected_file_size() {
        assert_eq!(expected_file_size(256, RawFormat::R16LittleEndian), 256 * 256 * 2);
        assert_eq!(expected_file_size(256, RawFormat::R32Float), 256 * 256 * 4);
    }

    #[test]
    fn test_raw_content_correctness() {
        let mut mesh = TerrainMesh::create(2.0, 1).unwrap();
        // South row then north row, as stored in the mesh.
        mesh.add_deltas(&[0.5, 1.0, -1.0, 0.0]).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("test.raw");

        export_heightmap_raw(&mesh, &path, &RawExportOptions::default()).unwrap();

        // Read back and verify
        let data = std::fs::read(&path).unwrap();
        assert_eq!(data.len(), 8); // 4 pixels × 2 bytes

        // First pixel is the north-west corner: -1.0 → 0
        let val0 = u16::from_le_bytes([data[0], data[1]]);
        assert_eq!(val0, 0);

        // Second pixel: 0.0 → 32767
        let val1 = u16::from_le_bytes([data[2], data[3]]);
        assert!((val1 as i32 - 32767).abs() < 2);

        // Fourth pixel: 1.0 → 65535
        let val3 = u16::from_le_bytes([data[6], data[7]]);
        assert_eq!(val3, 65535);
    }

    #[test]
    fn test_big_endian_byte_order() {
        let mut mesh = TerrainMesh::create(2.0, 1).unwrap();
        mesh.add_deltas(&[1.0, 1.0, 1.0, 1.0]).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("be.raw");

        let options = RawExportOptions {
            format: RawFormat::R16BigEndian,
            min_height: 0.0,
            max_height: 4.0,
        };
        export_heightmap_raw(&mesh, &path, &options).unwrap();

        let data = std::fs::read(&path).unwrap();
        assert_eq!(u16::from_be_bytes([data[0], data[1]]), 16383);
    }

    #[test]
    fn test_r16_rejects_inverted_range() {
        let mesh = gradient(4);
        let dir = tempdir().unwrap();
        let options = RawExportOptions {
            min_height: 2.0,
            max_height: 2.0,
            ..Default::default()
        };
        assert!(export_heightmap_raw(&mesh, &dir.path().join("x.raw"), &options).is_err());
    }
}
