use super::Mesh;
use anyhow::{Context, Result};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Write a mesh to a binary STL file.
///
/// Normals are recomputed per facet from the triangle winding.
pub fn write_stl(path: &Path, mesh: &Mesh) -> Result<()> {
    let file = File::create(path)
        .with_context(|| format!("Failed to create STL file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    let facets = mesh.facets().map(|tri| stl_io::Triangle {
        normal: stl_io::Normal::new(tri.normal),
        vertices: tri.vertices.map(stl_io::Vertex::new),
    });
    stl_io::write_stl(&mut writer, facets)
        .with_context(|| format!("Failed to write STL file: {}", path.display()))?;

    writer.flush()?;

    Ok(())
}

/// Get the file size of an STL with the given number of triangles
pub fn estimate_stl_size(triangle_count: usize) -> usize {
    // 80 (header) + 4 (count) + triangles * (12 normal + 36 vertices + 2 attribute)
    80 + 4 + triangle_count * 50
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn unit_quad() -> Mesh {
        let mut mesh = Mesh::new();
        let a = mesh.add_vertex([0.0, 0.0, 0.0]);
        let b = mesh.add_vertex([1.0, 0.0, 0.0]);
        let c = mesh.add_vertex([1.0, 1.0, 0.0]);
        let d = mesh.add_vertex([0.0, 1.0, 0.0]);
        mesh.add_quad(a, b, c, d);
        mesh
    }

    #[test]
    fn test_write_stl() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("test.stl");

        write_stl(&path, &unit_quad()).unwrap();

        let metadata = fs::metadata(&path).unwrap();
        assert_eq!(metadata.len(), estimate_stl_size(2) as u64);
    }

    #[test]
    fn test_written_stl_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("quad.stl");
        write_stl(&path, &unit_quad()).unwrap();

        let mut file = File::open(&path).unwrap();
        let indexed = stl_io::read_stl(&mut file).unwrap();
        assert_eq!(indexed.faces.len(), 2);
        assert_eq!(indexed.vertices.len(), 4);
    }

    #[test]
    fn test_write_into_missing_directory_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("missing").join("out.stl");
        assert!(write_stl(&path, &unit_quad()).is_err());
    }

    #[test]
    fn test_estimate_size() {
        // Empty STL: 80 + 4 = 84 bytes
        assert_eq!(estimate_stl_size(0), 84);
        // 1 triangle: 84 + 50 = 134 bytes
        assert_eq!(estimate_stl_size(1), 134);
    }
}
