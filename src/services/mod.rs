pub mod fetcher;
pub mod generator;

pub use fetcher::MapFetcher;
pub use generator::{ModelGenerator, TerrainParams};
