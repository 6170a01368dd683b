//! JSON snapshot of the complete mesh.

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::error::TerrainError;
use crate::terrain::TerrainMesh;

use super::{write_json, ExportError};

/// Everything needed to rebuild a [`TerrainMesh`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeshSnapshot {
    /// Vertices per side of the surface grid.
    pub resolution: u32,
    pub positions: Vec<Vec2>,
    pub elevations: Vec<f32>,
    pub triangles: Vec<[u32; 3]>,
    /// Sub-geometries merged after the surface grid.
    #[serde(default)]
    pub merged_parts: usize,
}

impl MeshSnapshot {
    pub fn from_mesh(mesh: &TerrainMesh) -> Self {
        Self {
            resolution: mesh.resolution(),
            positions: mesh.positions().to_vec(),
            elevations: mesh.elevations().to_vec(),
            triangles: mesh.triangles().to_vec(),
            merged_parts: mesh.merged_parts(),
        }
    }

    /// Validates the data and rebuilds the mesh.
    pub fn into_mesh(self) -> Result<TerrainMesh, TerrainError> {
        let mesh =
            TerrainMesh::from_parts(self.resolution, self.positions, self.elevations, self.triangles)?;
        Ok(mesh.with_merged_parts(self.merged_parts))
    }
}

pub fn write_snapshot(mesh: &TerrainMesh, path: &Path) -> Result<(), ExportError> {
    write_json(&MeshSnapshot::from_mesh(mesh), path)
}

pub fn read_snapshot(path: &Path) -> Result<TerrainMesh, ExportError> {
    let reader = BufReader::new(File::open(path)?);
    let snapshot: MeshSnapshot = serde_json::from_reader(reader)?;
    Ok(snapshot.into_mesh()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deform::{Crater, DeformationOperator};
    use crate::terrain::SubGeometry;
    use glam::Vec3;
    use tempfile::tempdir;

    #[test]
    fn test_snapshot_rebuilds_mesh() {
        let mut mesh = TerrainMesh::create(20.0, 16).unwrap();
        Crater::new(Vec2::new(1.0, 2.0), 6.0).unwrap().apply(&mut mesh);

        let dir = tempdir().unwrap();
        let path = dir.path().join("mesh.json");
        write_snapshot(&mesh, &path).unwrap();

        let restored = read_snapshot(&path).unwrap();
        assert_eq!(restored.resolution(), mesh.resolution());
        assert_eq!(restored.positions(), mesh.positions());
        assert_eq!(restored.elevations(), mesh.elevations());
        assert_eq!(restored.triangles(), mesh.triangles());
    }

    #[test]
    fn test_snapshot_keeps_merged_rocks() {
        let mut mesh = TerrainMesh::create(10.0, 4).unwrap();
        let rock = SubGeometry::new(
            vec![
                Vec3::new(0.0, 0.0, 0.5),
                Vec3::new(0.3, 0.0, 0.5),
                Vec3::new(0.0, 0.3, 0.5),
            ],
            vec![[0, 1, 2]],
        )
        .unwrap();
        mesh.merge(vec![rock.clone(), rock]).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("rocks.json");
        write_snapshot(&mesh, &path).unwrap();

        let restored = read_snapshot(&path).unwrap();
        assert_eq!(restored.merged_parts(), 2);
        assert_eq!(restored, mesh);
    }

    #[test]
    fn test_snapshot_without_part_count_still_loads() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("legacy.json");
        std::fs::write(
            &path,
            "{\"resolution\": 1, \"positions\": [[0.0, 0.0]], \"elevations\": [2.5], \"triangles\": []}",
        )
        .unwrap();

        let restored = read_snapshot(&path).unwrap();
        assert_eq!(restored.merged_parts(), 0);
        assert_eq!(restored.elevations(), &[2.5]);
    }

    #[test]
    fn test_corrupt_snapshot_rejected() {
        let mut snapshot = MeshSnapshot::from_mesh(&TerrainMesh::create(2.0, 1).unwrap());
        snapshot.triangles.push([0, 1, 99]);
        assert!(snapshot.into_mesh().is_err());

        let dir = tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{\"resolution\": 2}").unwrap();
        assert!(matches!(read_snapshot(&path), Err(ExportError::Json(_))));
    }
}
