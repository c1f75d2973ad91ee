use super::{Mesh, MeshError};
use crate::domain::ElevationGrid;

/// Triangulate an elevation grid in raster index space.
///
/// Vertex `r * cols + c` sits at `(c, r, height * z_scale)`. Every 2x2 cell
/// becomes two triangles split along the same diagonal, wound
/// counter-clockwise when seen from +Z. The result has `rows * cols` vertices
/// and `2 * (rows - 1) * (cols - 1)` triangles.
pub fn grid_to_mesh(grid: &ElevationGrid, z_scale: f64) -> Result<Mesh, MeshError> {
    let rows = grid.rows();
    let cols = grid.cols();
    if rows < 2 || cols < 2 {
        return Err(MeshError::GridTooSmall { rows, cols });
    }

    let mut mesh = Mesh::with_capacity(rows * cols, 2 * (rows - 1) * (cols - 1));

    for row in 0..rows {
        for col in 0..cols {
            let z = grid.get(row, col) * z_scale;
            mesh.add_vertex([col as f32, row as f32, z as f32]);
        }
    }

    let cols_u32 = cols as u32;
    for row in 0..(rows - 1) as u32 {
        for col in 0..(cols - 1) as u32 {
            let a = row * cols_u32 + col;
            let b = a + 1;
            let c = a + cols_u32;
            let d = c + 1;
            mesh.add_triangle(a, b, c);
            mesh.add_triangle(b, d, c);
        }
    }

    Ok(mesh)
}
