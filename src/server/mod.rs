//! HTTP surface: thin axum handlers over the fetch and generate services

pub mod error;
pub mod routes;

pub use error::ApiError;

use crate::services::{MapFetcher, ModelGenerator};
use axum::Router;
use axum::routing::{get, post};
use std::sync::Arc;

/// Services shared by every handler
#[derive(Debug, Clone)]
pub struct AppState {
    pub fetcher: MapFetcher,
    pub generator: ModelGenerator,
}

/// Build the application router
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(routes::index))
        .route("/fetch/osm", get(routes::fetch_osm))
        .route("/fetch/terrain", get(routes::fetch_terrain))
        .route("/generate/osm-model", post(routes::generate_osm_model))
        .route("/generate/terrain-model", post(routes::generate_terrain_model))
        .with_state(state)
}
