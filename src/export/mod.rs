//! Export module for saving terrain data to various file formats.
//!
//! Heightmap formats (PNG, RAW) cover the surface grid only. OBJ and the
//! JSON snapshot carry the complete mesh, merged rocks included.

mod obj;
mod png;
mod raw;
mod snapshot;

use std::fs::File;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;

use crate::error::TerrainError;
use crate::terrain::TerrainMesh;

pub use obj::export_obj;
pub use png::{export_heightmap_png, PngExportOptions};
pub use raw::{expected_file_size, export_heightmap_raw, RawExportOptions, RawFormat};
pub use snapshot::{read_snapshot, write_snapshot, MeshSnapshot};

/// Errors that can occur during export.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Image encoding error: {0}")]
    Image(#[from] image::ImageError),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Invalid height range: min ({0}) >= max ({1})")]
    InvalidHeightRange(f32, f32),
    #[error("Mesh has no surface grid to export")]
    EmptySurface,
    #[error("Surface grid of {0}x{0} vertices is too large for this format")]
    TooLarge(u32),
    #[error("Invalid mesh data: {0}")]
    Mesh(#[from] TerrainError),
}

/// Output formats understood by [`export_terrain`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExportFormat {
    Png,
    Raw(RawFormat),
    Obj,
    Json,
}

impl ExportFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Raw(_) => "raw",
            ExportFormat::Obj => "obj",
            ExportFormat::Json => "json",
        }
    }
}

/// Writes `mesh` to `{output_dir}/{base_name}.{ext}` and returns the path.
///
/// Heightmap formats normalize with the surface elevation range.
pub fn export_terrain(
    mesh: &TerrainMesh,
    output_dir: &Path,
    base_name: &str,
    format: ExportFormat,
) -> Result<PathBuf, ExportError> {
    std::fs::create_dir_all(output_dir)?;
    let path = output_dir.join(format!("{}.{}", base_name, format.extension()));

    match format {
        ExportFormat::Png => {
            export_heightmap_png(mesh, &path, &PngExportOptions::auto_range(mesh))?
        }
        ExportFormat::Raw(raw_format) => {
            export_heightmap_raw(mesh, &path, &RawExportOptions::auto_range(mesh, raw_format))?
        }
        ExportFormat::Obj => export_obj(mesh, &path)?,
        ExportFormat::Json => write_snapshot(mesh, &path)?,
    }

    Ok(path)
}

/// Writes any serializable value as pretty JSON.
pub fn write_json<T: Serialize + ?Sized>(value: &T, path: &Path) -> Result<(), ExportError> {
    let writer = BufWriter::new(File::create(path)?);
    serde_json::to_writer_pretty(writer, value)?;
    Ok(())
}

/// Surface elevations with row 0 at the north (max y) edge, as images are
/// laid out.
pub(crate) fn north_up_rows(mesh: &TerrainMesh) -> Result<(u32, Vec<f32>), ExportError> {
    let resolution = mesh.resolution();
    if resolution == 0 {
        return Err(ExportError::EmptySurface);
    }
    let surface = mesh.surface_elevations();
    let rows: Vec<f32> = surface
        .chunks_exact(resolution as usize)
        .rev()
        .flatten()
        .copied()
        .collect();
    Ok((resolution, rows))
}

/// Surface elevation range widened when the surface is flat, so it can be
/// used for normalization.
pub(crate) fn normalization_range(mesh: &TerrainMesh) -> (f32, f32) {
    let (min, max) = mesh.surface_elevation_range();
    if !(min.is_finite() && max.is_finite()) {
        (-1.0, 1.0)
    } else if min >= max {
        (min - 0.5, max + 0.5)
    } else {
        (min, max)
    }
}

/// Maps `value` into `[0, 65535]`.
#[inline]
pub(crate) fn quantize(value: f32, min: f32, range: f32) -> u16 {
    let normalized = ((value - min) / range).clamp(0.0, 1.0);
    (normalized * 65535.0) as u16
}
