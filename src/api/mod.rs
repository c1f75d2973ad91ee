pub mod nominatim;
pub mod opentopography;
pub mod overpass;

pub use nominatim::geocode_place;
pub use opentopography::download_elevation;
pub use overpass::{OverpassResponse, fetch_buildings};

const USER_AGENT: &str = concat!("terramesh/", env!("CARGO_PKG_VERSION"));
