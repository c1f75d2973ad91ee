use super::Mesh;
use super::triangulation::triangulate_polygon_f64;
use crate::domain::Footprint;
use geo::orient::{Direction, Orient};
use geo::{LineString, Polygon};

/// Extrude every part of a footprint to `height` and merge the prisms.
///
/// Parts that cannot be extruded are skipped; returns `None` when no part
/// produced any geometry.
pub fn extrude_footprint(footprint: &Footprint, height: f64) -> Option<Mesh> {
    let mut merged = Mesh::new();
    for part in footprint.parts() {
        if let Some(prism) = extrude_polygon(part, height) {
            merged.append(prism);
        }
    }

    if merged.is_empty() { None } else { Some(merged) }
}

/// Extrude a simple polygon (with optional holes) into a closed prism.
///
/// The bottom cap sits at z = 0 and the top cap at z = `height`. Outer walls
/// face outward, hole walls face into the hole. Returns `None` for empty,
/// degenerate or non-finite polygons and for non-positive heights.
pub fn extrude_polygon(polygon: &Polygon<f64>, height: f64) -> Option<Mesh> {
    if !(height.is_finite() && height > 0.0) {
        return None;
    }

    // Exterior counter-clockwise, interiors clockwise
    let polygon = polygon.orient(Direction::Default);

    let outer = clean_ring(polygon.exterior())?;
    let holes: Vec<Vec<(f64, f64)>> = polygon
        .interiors()
        .iter()
        .filter_map(clean_ring)
        .collect();

    let indices = triangulate_polygon_f64(&outer, &holes);
    if indices.is_empty() {
        return None;
    }

    let points: Vec<(f64, f64)> = outer
        .iter()
        .chain(holes.iter().flatten())
        .copied()
        .collect();
    let n = points.len() as u32;

    let mut mesh = Mesh::with_capacity(points.len() * 2, indices.len() / 3 * 2 + points.len() * 2);
    for &(x, y) in &points {
        mesh.add_vertex([x as f32, y as f32, 0.0]);
    }
    for &(x, y) in &points {
        mesh.add_vertex([x as f32, y as f32, height as f32]);
    }

    for tri in indices.chunks_exact(3) {
        let (mut i, j, mut k) = (tri[0], tri[1], tri[2]);
        if cross(points[i], points[j], points[k]) < 0.0 {
            std::mem::swap(&mut i, &mut k);
        }
        let (i, j, k) = (i as u32, j as u32, k as u32);
        // Top faces up, bottom faces down
        mesh.add_triangle(i + n, j + n, k + n);
        mesh.add_triangle(i, k, j);
    }

    let mut start = 0u32;
    for ring_len in std::iter::once(outer.len()).chain(holes.iter().map(Vec::len)) {
        let len = ring_len as u32;
        for i in 0..len {
            let p = start + i;
            let q = start + (i + 1) % len;
            mesh.add_quad(p, q, q + n, p + n);
        }
        start += len;
    }

    Some(mesh)
}

/// Drop the closing point and consecutive duplicates.
///
/// Returns `None` for rings with non-finite coordinates, fewer than three
/// distinct points, or zero area.
fn clean_ring(ring: &LineString<f64>) -> Option<Vec<(f64, f64)>> {
    let mut points: Vec<(f64, f64)> = Vec::with_capacity(ring.0.len());
    for c in ring.coords() {
        if !(c.x.is_finite() && c.y.is_finite()) {
            return None;
        }
        if points.last() != Some(&(c.x, c.y)) {
            points.push((c.x, c.y));
        }
    }
    if points.len() > 1 && points.first() == points.last() {
        points.pop();
    }

    if points.len() < 3 || ring_area(&points).abs() <= f64::EPSILON {
        return None;
    }
    Some(points)
}

/// Signed shoelace area, positive for counter-clockwise rings
fn ring_area(points: &[(f64, f64)]) -> f64 {
    let n = points.len();
    (0..n)
        .map(|i| {
            let (x1, y1) = points[i];
            let (x2, y2) = points[(i + 1) % n];
            x1 * y2 - x2 * y1
        })
        .sum::<f64>()
        / 2.0
}

fn cross(a: (f64, f64), b: (f64, f64), c: (f64, f64)) -> f64 {
    (b.0 - a.0) * (c.1 - a.1) - (b.1 - a.1) * (c.0 - a.0)
}
