pub mod features;
pub mod parser;

pub use features::{FootprintSet, read_footprints, write_buildings};
pub use parser::parse_buildings;
