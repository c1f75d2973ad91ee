pub mod projection;

pub use projection::Projector;
