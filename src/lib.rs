//! terramesh - Generate STL models of buildings and terrain from OpenStreetMap and SRTM data

pub mod api;
pub mod config;
pub mod domain;
pub mod geometry;
pub mod mesh;
pub mod osm;
pub mod raster;
pub mod server;
pub mod services;
