use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Errors produced while parsing or validating a bounding box
#[derive(Debug, Error, PartialEq)]
pub enum BboxError {
    #[error("bbox must have 4 comma-separated values (minlon,minlat,maxlon,maxlat), got {0}")]
    WrongArity(usize),
    #[error("bbox value {0:?} is not a number")]
    NotANumber(String),
    #[error("bbox values must be finite")]
    NonFinite,
    #[error("longitude {0} is outside [-180, 180]")]
    LongitudeOutOfRange(f64),
    #[error("latitude {0} is outside [-90, 90]")]
    LatitudeOutOfRange(f64),
    #[error("bbox is degenerate: west must be < east and south must be < north")]
    Degenerate,
}

/// Rectangular region in WGS84 degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub west: f64,
    pub south: f64,
    pub east: f64,
    pub north: f64,
}

impl BoundingBox {
    /// Create a validated bounding box
    pub fn new(west: f64, south: f64, east: f64, north: f64) -> Result<Self, BboxError> {
        if ![west, south, east, north].iter().all(|v| v.is_finite()) {
            return Err(BboxError::NonFinite);
        }
        for lon in [west, east] {
            if !(-180.0..=180.0).contains(&lon) {
                return Err(BboxError::LongitudeOutOfRange(lon));
            }
        }
        for lat in [south, north] {
            if !(-90.0..=90.0).contains(&lat) {
                return Err(BboxError::LatitudeOutOfRange(lat));
            }
        }
        if west >= east || south >= north {
            return Err(BboxError::Degenerate);
        }

        Ok(Self {
            west,
            south,
            east,
            north,
        })
    }

    /// Bounds in the `south,west,north,east` order Overpass QL expects
    pub fn overpass_filter(&self) -> String {
        format!("{},{},{},{}", self.south, self.west, self.north, self.east)
    }
}

impl FromStr for BoundingBox {
    type Err = BboxError;

    /// Parse `"minlon,minlat,maxlon,maxlat"`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.split(',').map(str::trim).collect();
        if parts.len() != 4 {
            return Err(BboxError::WrongArity(parts.len()));
        }

        let mut values = [0.0f64; 4];
        for (slot, part) in values.iter_mut().zip(&parts) {
            *slot = part
                .parse()
                .map_err(|_| BboxError::NotANumber(part.to_string()))?;
        }

        let [west, south, east, north] = values;
        Self::new(west, south, east, north)
    }
}

impl fmt::Display for BoundingBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{},{},{}", self.west, self.south, self.east, self.north)
    }
}
