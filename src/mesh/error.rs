use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MeshError {
    #[error("elevation grid is {rows}x{cols}; at least 2x2 samples are needed")]
    GridTooSmall { rows: usize, cols: usize },
    #[error("no valid geometries to extrude")]
    NothingExtruded,
}
