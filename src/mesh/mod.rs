pub mod builder;
pub mod error;
pub mod extrusion;
pub mod grid;
pub mod stl;
pub mod triangulation;
pub mod validation;

pub use builder::{Mesh, Triangle};
pub use error::MeshError;
pub use extrusion::{extrude_footprint, extrude_polygon};
pub use grid::grid_to_mesh;
pub use stl::write_stl;
pub use validation::validate_mesh;
