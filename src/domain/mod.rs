pub mod bbox;
pub mod elevation;
pub mod footprint;

pub use bbox::{BboxError, BoundingBox};
pub use elevation::ElevationGrid;
pub use footprint::{Building, Footprint};
