//! Mesh sanity checks run before a mesh is written to disk
//!
//! Detects:
//! - Degenerate triangles (zero area, reported only)
//! - NaN/Inf vertex coordinates
//! - Triangle indices that point past the vertex list

use super::Mesh;

/// Minimum area threshold for non-degenerate triangles
const MIN_TRIANGLE_AREA: f32 = 1e-10;

/// Result of mesh validation
#[derive(Debug, Default)]
pub struct ValidationResult {
    /// Total number of triangles validated
    pub total: usize,
    /// Number of degenerate triangles (zero or near-zero area)
    pub degenerate: usize,
    /// Number of triangles touching a NaN/Inf vertex
    pub invalid_coords: usize,
    /// Number of triangles referencing a missing vertex
    pub bad_indices: usize,
}

impl ValidationResult {
    /// Degenerate triangles are tolerated; broken coordinates or indices are not
    pub fn is_valid(&self) -> bool {
        self.invalid_coords == 0 && self.bad_indices == 0
    }

    pub fn has_issues(&self) -> bool {
        self.degenerate > 0 || !self.is_valid()
    }

    pub fn summary(&self) -> String {
        if !self.has_issues() {
            format!("Mesh valid: {} triangles, no issues", self.total)
        } else {
            format!(
                "Mesh issues: {} total, {} degenerate, {} invalid coords, {} bad indices",
                self.total, self.degenerate, self.invalid_coords, self.bad_indices
            )
        }
    }
}

/// Validate a mesh and return a report
pub fn validate_mesh(mesh: &Mesh) -> ValidationResult {
    let mut result = ValidationResult {
        total: mesh.triangles.len(),
        ..Default::default()
    };

    for tri in &mesh.triangles {
        let Some(vertices) = resolve(mesh, tri) else {
            result.bad_indices += 1;
            continue;
        };

        if vertices.iter().flatten().any(|c| !c.is_finite()) {
            result.invalid_coords += 1;
            continue;
        }

        if triangle_area(&vertices) < MIN_TRIANGLE_AREA {
            result.degenerate += 1;
        }
    }

    result
}

fn resolve(mesh: &Mesh, tri: &[u32; 3]) -> Option<[[f32; 3]; 3]> {
    Some([
        *mesh.vertices.get(tri[0] as usize)?,
        *mesh.vertices.get(tri[1] as usize)?,
        *mesh.vertices.get(tri[2] as usize)?,
    ])
}

/// Calculate the area of a triangle from its vertices
fn triangle_area(vertices: &[[f32; 3]; 3]) -> f32 {
    let v0 = vertices[0];
    let v1 = vertices[1];
    let v2 = vertices[2];

    let edge_a = [v1[0] - v0[0], v1[1] - v0[1], v1[2] - v0[2]];
    let edge_b = [v2[0] - v0[0], v2[1] - v0[1], v2[2] - v0[2]];

    let cx = edge_a[1] * edge_b[2] - edge_a[2] * edge_b[1];
    let cy = edge_a[2] * edge_b[0] - edge_a[0] * edge_b[2];
    let cz = edge_a[0] * edge_b[1] - edge_a[1] * edge_b[0];

    0.5 * (cx * cx + cy * cy + cz * cz).sqrt()
}
