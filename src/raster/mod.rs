pub mod geotiff;
pub mod smoothing;

pub use geotiff::read_elevation;
pub use smoothing::gaussian_smooth;
