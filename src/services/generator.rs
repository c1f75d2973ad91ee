use crate::domain::{ElevationGrid, Footprint};
use crate::geometry::Projector;
use crate::mesh::stl::estimate_stl_size;
use crate::mesh::{Mesh, MeshError, extrude_footprint, grid_to_mesh, validate_mesh, write_stl};
use crate::osm::read_footprints;
use crate::raster::{gaussian_smooth, read_elevation};
use anyhow::{Context, Result, bail};
use geo::{BoundingRect, Coord, Rect};
use std::path::{Path, PathBuf};

pub const OSM_MODEL_FILE_NAME: &str = "osm_model.stl";
pub const TERRAIN_MODEL_FILE_NAME: &str = "terrain_model.stl";

/// Terrain generation parameters
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TerrainParams {
    /// Multiplier applied to raw elevation values
    pub z_scale: f64,
    /// Keep every `skip`-th row and column
    pub skip: usize,
    /// Gaussian standard deviation in samples; 0 disables smoothing
    pub smooth_sigma: f64,
}

impl Default for TerrainParams {
    fn default() -> Self {
        Self {
            z_scale: 0.0001,
            skip: 1,
            smooth_sigma: 10.0,
        }
    }
}

/// Turns downloaded vector and raster data into STL models
#[derive(Debug, Clone)]
pub struct ModelGenerator {
    output_dir: PathBuf,
}

impl ModelGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Result<Self> {
        let output_dir = output_dir.into();
        std::fs::create_dir_all(&output_dir).with_context(|| {
            format!("Failed to create output directory: {}", output_dir.display())
        })?;
        Ok(Self { output_dir })
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Extrude every footprint in a GeoJSON file to `height` meters
    pub fn generate_3d_model_from_osm(&self, geojson_path: &Path, height: f64) -> Option<PathBuf> {
        match self.try_generate_from_osm(geojson_path, height) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!(
                    path = %geojson_path.display(),
                    error = format!("{e:#}"),
                    "Error generating OSM model"
                );
                None
            }
        }
    }

    /// Triangulate an elevation raster into a terrain surface
    pub fn generate_3d_model_from_elevation(
        &self,
        tiff_path: &Path,
        params: TerrainParams,
    ) -> Option<PathBuf> {
        match self.try_generate_from_elevation(tiff_path, params) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!(
                    path = %tiff_path.display(),
                    error = format!("{e:#}"),
                    "Error generating terrain model"
                );
                None
            }
        }
    }

    fn try_generate_from_osm(&self, geojson_path: &Path, height: f64) -> Result<PathBuf> {
        let set = read_footprints(geojson_path)?;
        if set.skipped > 0 {
            tracing::warn!(skipped = set.skipped, "Skipped features without areal geometry");
        }

        let mesh = footprints_to_mesh(&set.footprints, height)?;
        self.write_model(&mesh, OSM_MODEL_FILE_NAME)
    }

    fn try_generate_from_elevation(&self, tiff_path: &Path, params: TerrainParams) -> Result<PathBuf> {
        let grid = read_elevation(tiff_path)?;
        tracing::debug!(rows = grid.rows(), cols = grid.cols(), "Read elevation raster");

        let mesh = terrain_to_mesh(grid, params)?;
        self.write_model(&mesh, TERRAIN_MODEL_FILE_NAME)
    }

    fn write_model(&self, mesh: &Mesh, file_name: &str) -> Result<PathBuf> {
        let validation = validate_mesh(mesh);
        if !validation.is_valid() {
            bail!("Refusing to write broken mesh: {}", validation.summary());
        }
        if validation.has_issues() {
            tracing::warn!(summary = %validation.summary(), "Mesh validation issues");
        }

        let path = self.output_dir.join(file_name);
        write_stl(&path, mesh)?;
        tracing::info!(
            path = %path.display(),
            vertices = mesh.vertex_count(),
            triangles = mesh.triangle_count(),
            bytes = estimate_stl_size(mesh.triangle_count()),
            "Saved STL model"
        );
        Ok(path)
    }
}

/// Project lon/lat footprints to local meters and extrude them into one mesh.
///
/// Footprints that fail to extrude are skipped; the call fails only when
/// none succeed.
pub fn footprints_to_mesh(footprints: &[Footprint], height: f64) -> Result<Mesh, MeshError> {
    let Some(center) = footprints_center(footprints) else {
        return Err(MeshError::NothingExtruded);
    };
    let projector = Projector::new(center);

    let mut mesh = Mesh::new();
    let mut skipped = 0;
    for footprint in footprints {
        let projected = footprint.map_coords(|c| projector.project_coord(c));
        match extrude_footprint(&projected, height) {
            Some(part) => mesh.append(part),
            None => skipped += 1,
        }
    }

    if skipped > 0 {
        tracing::warn!(skipped, total = footprints.len(), "Skipped invalid footprints");
    }
    if mesh.is_empty() {
        return Err(MeshError::NothingExtruded);
    }
    Ok(mesh)
}

/// Clean, decimate and smooth an elevation grid, then triangulate it
pub fn terrain_to_mesh(mut grid: ElevationGrid, params: TerrainParams) -> Result<Mesh, MeshError> {
    grid.zero_non_finite();
    let grid = grid.downsample(params.skip.max(1));
    let grid = gaussian_smooth(&grid, params.smooth_sigma);
    grid_to_mesh(&grid, params.z_scale)
}

/// Bounding-box center of all footprints as (lat, lon)
fn footprints_center(footprints: &[Footprint]) -> Option<(f64, f64)> {
    let rect = footprints
        .iter()
        .flat_map(|f| f.parts())
        .filter_map(|p| p.bounding_rect())
        .reduce(|a, b| {
            Rect::new(
                Coord {
                    x: a.min().x.min(b.min().x),
                    y: a.min().y.min(b.min().y),
                },
                Coord {
                    x: a.max().x.max(b.max().x),
                    y: a.max().y.max(b.max().y),
                },
            )
        })?;
    let c = rect.center();
    Some((c.y, c.x))
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use std::collections::HashMap;
    use tempfile::tempdir;
    use tiff::encoder::{TiffEncoder, colortype};

    use crate::domain::Building;
    use crate::osm::write_buildings;

    fn square(lon: f64, lat: f64, size: f64) -> Footprint {
        Footprint::Simple(polygon![
            (x: lon, y: lat),
            (x: lon + size, y: lat),
            (x: lon + size, y: lat + size),
            (x: lon, y: lat + size),
        ])
    }

    fn write_tiff(path: &Path, width: u32, height: u32, data: &[f32]) {
        let file = std::fs::File::create(path).unwrap();
        let mut encoder = TiffEncoder::new(file).unwrap();
        encoder
            .write_image::<colortype::Gray32Float>(width, height, data)
            .unwrap();
    }

    #[test]
    fn test_footprints_projected_to_meters() {
        let mesh = footprints_to_mesh(&[square(7.42, 43.73, 0.0001)], 20.0).unwrap();
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);

        // ~0.0001 degrees is several meters, centred on the origin
        for v in &mesh.vertices {
            assert!(v[0].abs() < 10.0 && v[0].abs() > 1.0);
            assert!(v[1].abs() < 10.0 && v[1].abs() > 1.0);
            assert!(v[2] == 0.0 || v[2] == 20.0);
        }
    }

    #[test]
    fn test_invalid_footprints_skipped() {
        let degenerate = Footprint::Simple(polygon![
            (x: 7.42, y: 43.73),
            (x: 7.43, y: 43.73),
            (x: 7.44, y: 43.73),
        ]);
        let mesh = footprints_to_mesh(&[degenerate.clone(), square(7.42, 43.73, 0.0001)], 5.0).unwrap();
        assert_eq!(mesh.triangle_count(), 12);

        assert_eq!(footprints_to_mesh(&[degenerate], 5.0), Err(MeshError::NothingExtruded));
        assert_eq!(footprints_to_mesh(&[], 5.0), Err(MeshError::NothingExtruded));
    }

    #[test]
    fn test_terrain_pipeline() {
        let mut values = vec![100.0; 16];
        values[5] = f64::NAN;
        let grid = ElevationGrid::new(4, 4, values).unwrap();
        let params = TerrainParams {
            z_scale: 0.5,
            skip: 1,
            smooth_sigma: 0.0,
        };

        let mesh = terrain_to_mesh(grid, params).unwrap();
        assert_eq!(mesh.vertex_count(), 16);
        assert_eq!(mesh.triangle_count(), 18);
        assert_eq!(mesh.vertices[5][2], 0.0);
        assert_eq!(mesh.vertices[0][2], 50.0);
    }

    #[test]
    fn test_terrain_skip_can_make_grid_too_small() {
        let grid = ElevationGrid::filled(3, 3, 1.0);
        let params = TerrainParams {
            skip: 3,
            ..Default::default()
        };
        assert_eq!(
            terrain_to_mesh(grid, params),
            Err(MeshError::GridTooSmall { rows: 1, cols: 1 })
        );
    }

    #[test]
    fn test_generate_from_elevation_writes_stl() {
        let dir = tempdir().unwrap();
        let tiff = dir.path().join("elevation.tif");
        write_tiff(&tiff, 5, 4, &[250.0; 20]);

        let generator = ModelGenerator::new(dir.path().join("out")).unwrap();
        let path = generator
            .generate_3d_model_from_elevation(&tiff, TerrainParams::default())
            .unwrap();
        assert_eq!(path, dir.path().join("out").join(TERRAIN_MODEL_FILE_NAME));

        let mut file = std::fs::File::open(&path).unwrap();
        let stl = stl_io::read_stl(&mut file).unwrap();
        assert_eq!(stl.faces.len(), 2 * 3 * 4);
    }

    #[test]
    fn test_generate_from_osm_writes_stl() {
        let dir = tempdir().unwrap();
        let geojson = dir.path().join("osm_bbox.geojson");
        let buildings = vec![
            Building {
                osm_type: "way".to_string(),
                id: 1,
                tags: HashMap::new(),
                footprint: square(7.42, 43.73, 0.0001),
            },
            Building {
                osm_type: "way".to_string(),
                id: 2,
                tags: HashMap::new(),
                footprint: square(7.4205, 43.73, 0.0001),
            },
        ];
        write_buildings(&geojson, &buildings).unwrap();

        let generator = ModelGenerator::new(dir.path()).unwrap();
        let path = generator.generate_3d_model_from_osm(&geojson, 20.0).unwrap();

        let mut file = std::fs::File::open(&path).unwrap();
        let stl = stl_io::read_stl(&mut file).unwrap();
        assert_eq!(stl.faces.len(), 24);
    }

    #[test]
    fn test_generation_failures_become_none() {
        let dir = tempdir().unwrap();
        let generator = ModelGenerator::new(dir.path()).unwrap();

        let garbage = dir.path().join("garbage.tif");
        std::fs::write(&garbage, b"not a tiff").unwrap();
        assert!(generator
            .generate_3d_model_from_elevation(&garbage, TerrainParams::default())
            .is_none());

        let single_row = dir.path().join("row.tif");
        write_tiff(&single_row, 4, 1, &[1.0; 4]);
        assert!(generator
            .generate_3d_model_from_elevation(&single_row, TerrainParams::default())
            .is_none());

        let empty = dir.path().join("empty.geojson");
        write_buildings(&empty, &[]).unwrap();
        assert!(generator.generate_3d_model_from_osm(&empty, 20.0).is_none());
        assert!(!dir.path().join(OSM_MODEL_FILE_NAME).exists());
    }
}
