use crate::config::OpenTopographyConfig;
use crate::domain::BoundingBox;
use anyhow::{Context, Result, bail};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use std::time::Duration;

use super::USER_AGENT;

/// Query parameters for the global DEM endpoint
fn dem_params(bbox: &BoundingBox, dem_type: &str, api_key: &str) -> Vec<(&'static str, String)> {
    vec![
        ("demtype", dem_type.to_string()),
        ("south", bbox.south.to_string()),
        ("north", bbox.north.to_string()),
        ("west", bbox.west.to_string()),
        ("east", bbox.east.to_string()),
        ("outputFormat", "GTiff".to_string()),
        ("API_Key", api_key.to_string()),
    ]
}

/// Download a GeoTIFF elevation raster for `bbox` and stream it to `dest`.
///
/// Returns the number of bytes written.
pub fn download_elevation(
    bbox: &BoundingBox,
    config: &OpenTopographyConfig,
    dest: &Path,
) -> Result<u64> {
    let Some(api_key) = config.api_key.as_deref().filter(|k| !k.is_empty()) else {
        bail!("No OpenTopography API key configured (set OPENTOPO_API_KEY)");
    };

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to create HTTP client")?;

    tracing::debug!(%bbox, dem_type = %config.dem_type, "Requesting elevation raster");
    let mut response = client
        .get(&config.url)
        .query(&dem_params(bbox, &config.dem_type, api_key))
        .send()
        .context("Failed to send request to OpenTopography API")?;

    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        bail!("OpenTopography API error: {} - {}", status, body.trim());
    }

    save_body(&mut response, dest)
}

/// Stream `body` into `dest`, removing the partial file if the copy fails
fn save_body(body: &mut impl Read, dest: &Path) -> Result<u64> {
    let file = File::create(dest)
        .with_context(|| format!("Failed to create raster file: {}", dest.display()))?;
    let mut writer = BufWriter::new(file);

    let result = io::copy(body, &mut writer)
        .and_then(|written| writer.flush().map(|_| written))
        .context("Failed to stream elevation raster");
    if result.is_err() {
        drop(writer);
        if let Err(e) = std::fs::remove_file(dest) {
            tracing::warn!(path = %dest.display(), error = %e, "Failed to remove partial raster");
        }
    }
    result
}
