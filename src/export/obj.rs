//! Wavefront OBJ export of the complete mesh.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::terrain::TerrainMesh;

use super::ExportError;

/// Writes every vertex (z up) and triangle, merged rocks included.
pub fn export_obj(mesh: &TerrainMesh, path: &Path) -> Result<(), ExportError> {
    let file = File::create(path)?;
    let mut writer = BufWriter::new(file);

    writeln!(
        writer,
        "# moongen terrain: {} vertices, {} triangles, {} merged parts",
        mesh.vertex_count(),
        mesh.triangle_count(),
        mesh.merged_parts()
    )?;
    writeln!(writer, "o terrain")?;

    for v in mesh.vertices() {
        writeln!(writer, "v {} {} {}", v.position.x, v.position.y, v.elevation)?;
    }
    // OBJ indices are 1-based.
    for [a, b, c] in mesh.triangles() {
        writeln!(writer, "f {} {} {}", a + 1, b + 1, c + 1)?;
    }

    writer.flush()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::terrain::SubGeometry;
    use glam::Vec3;
    use tempfile::tempdir;

    #[test]
    fn test_obj_contents() {
        let mut mesh = TerrainMesh::create(2.0, 1).unwrap();
        mesh.add_deltas(&[0.0, 0.5, 0.0, 0.0]).unwrap();
        let dir = tempdir().unwrap();
        let path = dir.path().join("plane.obj");
        export_obj(&mesh, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        let vertices: Vec<&str> = text.lines().filter(|l| l.starts_with("v ")).collect();
        let faces: Vec<&str> = text.lines().filter(|l| l.starts_with("f ")).collect();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[1], "v 1 -1 0.5");
        assert_eq!(faces, vec!["f 1 2 4", "f 1 4 3"]);
    }

    #[test]
    fn test_obj_includes_merged_parts() {
        let mut mesh = TerrainMesh::create(2.0, 1).unwrap();
        let rock = SubGeometry::new(
            vec![Vec3::ZERO, Vec3::X * 0.1, Vec3::Y * 0.1],
            vec![[0, 1, 2]],
        )
        .unwrap();
        mesh.merge(vec![rock]).unwrap();

        let dir = tempdir().unwrap();
        let path = dir.path().join("rocks.obj");
        export_obj(&mesh, &path).unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert_eq!(text.lines().filter(|l| l.starts_with("v ")).count(), 7);
        assert!(text.lines().any(|l| l == "f 5 6 7"));
    }
}
