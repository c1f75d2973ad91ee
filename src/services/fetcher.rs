use crate::api::{download_elevation, fetch_buildings, geocode_place};
use crate::config::{FileConfig, NominatimConfig, OpenTopographyConfig, OverpassConfig};
use crate::domain::BoundingBox;
use crate::osm::{parse_buildings, write_buildings};
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// Fixed output names; concurrent requests overwrite each other's files
pub const OSM_FILE_NAME: &str = "osm_bbox.geojson";
pub const ELEVATION_FILE_NAME: &str = "elevation.tif";

/// Downloads building footprints and elevation rasters into one directory.
///
/// Public operations never return an error: failures are logged and
/// reported as `None`.
#[derive(Debug, Clone)]
pub struct MapFetcher {
    download_dir: PathBuf,
    overpass: OverpassConfig,
    nominatim: NominatimConfig,
    opentopography: OpenTopographyConfig,
}

impl MapFetcher {
    /// Create the fetcher, creating `download_dir` if needed
    pub fn new(download_dir: impl Into<PathBuf>, config: &FileConfig) -> Result<Self> {
        let download_dir = download_dir.into();
        std::fs::create_dir_all(&download_dir).with_context(|| {
            format!("Failed to create download directory: {}", download_dir.display())
        })?;

        Ok(Self {
            download_dir,
            overpass: config.overpass.clone(),
            nominatim: config.nominatim.clone(),
            opentopography: config.opentopography.clone(),
        })
    }

    pub fn download_dir(&self) -> &Path {
        &self.download_dir
    }

    /// Download building footprints in `bbox` and save them as GeoJSON
    pub fn fetch_osm_data(&self, bbox: &BoundingBox) -> Option<PathBuf> {
        tracing::info!(%bbox, "Fetching OSM buildings");
        match self.try_fetch_osm_data(bbox) {
            Ok(path) => Some(path),
            Err(e) => {
                tracing::error!(%bbox, error = format!("{e:#}"), "Error fetching Overpass data");
                None
            }
        }
    }

    /// Geocode `place` and download its building footprints
    pub fn fetch_osm_place(&self, place: &str) -> Option<PathBuf> {
        let bbox = self.resolve_place(place)?;
        self.fetch_osm_data(&bbox)
    }

    /// Look up the bounding box of a place name
    pub fn resolve_place(&self, place: &str) -> Option<BoundingBox> {
        match geocode_place(place, &self.nominatim) {
            Ok(bbox) => Some(bbox),
            Err(e) => {
                tracing::error!(place, error = format!("{e:#}"), "Error geocoding place");
                None
            }
        }
    }

    /// Download an SRTM elevation raster covering `bbox`
    pub fn fetch_srtm_elevation(&self, bbox: &BoundingBox) -> Option<PathBuf> {
        tracing::info!(%bbox, "Fetching elevation raster");
        let path = self.download_dir.join(ELEVATION_FILE_NAME);
        match download_elevation(bbox, &self.opentopography, &path) {
            Ok(bytes) => {
                tracing::info!(path = %path.display(), bytes, "Saved elevation raster");
                Some(path)
            }
            Err(e) => {
                tracing::error!(%bbox, error = format!("{e:#}"), "Error fetching elevation");
                None
            }
        }
    }

    fn try_fetch_osm_data(&self, bbox: &BoundingBox) -> Result<PathBuf> {
        let response = fetch_buildings(bbox, &self.overpass)?;
        let buildings = parse_buildings(&response);
        if buildings.is_empty() {
            tracing::warn!(%bbox, "No buildings found in bounding box");
        }

        let path = self.download_dir.join(OSM_FILE_NAME);
        write_buildings(&path, &buildings)?;
        tracing::info!(
            path = %path.display(),
            elements = response.elements.len(),
            buildings = buildings.len(),
            "Saved OSM buildings"
        );
        Ok(path)
    }
}
