use super::{ApiError, AppState};
use crate::domain::BoundingBox;
use crate::services::TerrainParams;
use axum::Json;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::response::Html;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

const DEFAULT_HEIGHT: f64 = 20.0;

const INDEX_HTML: &str = r#"<!doctype html>
<html>
<head><title>terramesh</title></head>
<body>
<h1>terramesh</h1>
<ul>
<li><code>GET /fetch/osm?bbox=minlon,minlat,maxlon,maxlat</code> or <code>?place=name</code></li>
<li><code>GET /fetch/terrain?bbox=minlon,minlat,maxlon,maxlat</code></li>
<li><code>POST /generate/osm-model {"geojson_path", "height"}</code></li>
<li><code>POST /generate/terrain-model {"tiff_path", "z_scale", "skip", "smooth_sigma"}</code></li>
</ul>
</body>
</html>
"#;

/// Body of every successful fetch/generate response
#[derive(Debug, Serialize, Deserialize, PartialEq)]
pub struct FileResponse {
    /// Path of the produced file, or a failure marker
    pub file: String,
}

impl FileResponse {
    fn from_result(path: Option<PathBuf>, failure: &str) -> Self {
        let file = match path {
            Some(p) => p.display().to_string(),
            None => failure.to_string(),
        };
        Self { file }
    }
}

#[derive(Debug, Deserialize)]
pub struct FetchOsmQuery {
    pub bbox: Option<String>,
    pub place: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct FetchTerrainQuery {
    pub bbox: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateOsmRequest {
    pub geojson_path: Option<String>,
    pub height: Option<f64>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateTerrainRequest {
    pub tiff_path: Option<String>,
    pub z_scale: Option<f64>,
    pub skip: Option<usize>,
    pub smooth_sigma: Option<f64>,
}

pub async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

/// `GET /fetch/osm?bbox=...` or `?place=...`
pub async fn fetch_osm(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FetchOsmQuery>, QueryRejection>,
) -> Result<Json<FileResponse>, ApiError> {
    let Query(query) = query?;

    let fetcher = state.fetcher.clone();
    let file = match (non_empty(query.bbox), non_empty(query.place)) {
        (Some(bbox), _) => {
            let bbox: BoundingBox = bbox.parse()?;
            run_blocking(move || fetcher.fetch_osm_data(&bbox)).await?
        }
        (None, Some(place)) => run_blocking(move || fetcher.fetch_osm_place(&place)).await?,
        (None, None) => {
            return Err(ApiError::BadRequest(
                "Missing 'bbox' or 'place' parameter".to_string(),
            ));
        }
    };

    Ok(Json(FileResponse::from_result(file, "Failed to fetch")))
}

/// `GET /fetch/terrain?bbox=...`
pub async fn fetch_terrain(
    State(state): State<Arc<AppState>>,
    query: Result<Query<FetchTerrainQuery>, QueryRejection>,
) -> Result<Json<FileResponse>, ApiError> {
    let Query(query) = query?;
    let bbox: BoundingBox = non_empty(query.bbox)
        .ok_or_else(|| ApiError::BadRequest("Missing 'bbox' parameter".to_string()))?
        .parse()?;

    let fetcher = state.fetcher.clone();
    let file = run_blocking(move || fetcher.fetch_srtm_elevation(&bbox)).await?;
    Ok(Json(FileResponse::from_result(file, "Failed to fetch")))
}

/// `POST /generate/osm-model`
pub async fn generate_osm_model(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GenerateOsmRequest>, JsonRejection>,
) -> Result<Json<FileResponse>, ApiError> {
    let Json(request) = body?;
    let path = existing_file(request.geojson_path, "geojson_path")?;

    let height = request.height.unwrap_or(DEFAULT_HEIGHT);
    if !height.is_finite() || height <= 0.0 {
        return Err(ApiError::BadRequest(
            "'height' must be a positive number".to_string(),
        ));
    }

    let generator = state.generator.clone();
    let file = run_blocking(move || generator.generate_3d_model_from_osm(&path, height)).await?;
    Ok(Json(FileResponse::from_result(file, "Failed to generate")))
}

/// `POST /generate/terrain-model`
pub async fn generate_terrain_model(
    State(state): State<Arc<AppState>>,
    body: Result<Json<GenerateTerrainRequest>, JsonRejection>,
) -> Result<Json<FileResponse>, ApiError> {
    let Json(request) = body?;
    let params = terrain_params(&request)?;
    let path = existing_file(request.tiff_path, "tiff_path")?;

    let generator = state.generator.clone();
    let file =
        run_blocking(move || generator.generate_3d_model_from_elevation(&path, params)).await?;
    Ok(Json(FileResponse::from_result(file, "Failed to generate")))
}

fn terrain_params(request: &GenerateTerrainRequest) -> Result<TerrainParams, ApiError> {
    let defaults = TerrainParams::default();
    let params = TerrainParams {
        z_scale: request.z_scale.unwrap_or(defaults.z_scale),
        skip: request.skip.unwrap_or(defaults.skip),
        smooth_sigma: request.smooth_sigma.unwrap_or(defaults.smooth_sigma),
    };

    if !params.z_scale.is_finite() {
        return Err(ApiError::BadRequest("'z_scale' must be finite".to_string()));
    }
    if params.skip < 1 {
        return Err(ApiError::BadRequest("'skip' must be at least 1".to_string()));
    }
    if !params.smooth_sigma.is_finite() || params.smooth_sigma < 0.0 {
        return Err(ApiError::BadRequest(
            "'smooth_sigma' must be a non-negative number".to_string(),
        ));
    }
    Ok(params)
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// Require a path parameter naming a file that exists
fn existing_file(value: Option<String>, name: &str) -> Result<PathBuf, ApiError> {
    let value = non_empty(value)
        .ok_or_else(|| ApiError::BadRequest(format!("Missing '{name}' parameter")))?;
    let path = PathBuf::from(value);
    if !path.is_file() {
        return Err(ApiError::BadRequest(format!(
            "File not found: {}",
            path.display()
        )));
    }
    Ok(path)
}

/// Run blocking service work off the async runtime
async fn run_blocking<F>(work: F) -> Result<Option<PathBuf>, ApiError>
where
    F: FnOnce() -> Option<PathBuf> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|e| ApiError::Internal(format!("Worker task failed: {e}")))
}
