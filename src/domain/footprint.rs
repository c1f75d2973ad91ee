use geo::{Coord, Geometry, MapCoords, MultiPolygon, Polygon};
use std::collections::HashMap;

/// A building outline, simple or multi-part, in (x = lon, y = lat) order
#[derive(Debug, Clone, PartialEq)]
pub enum Footprint {
    Simple(Polygon<f64>),
    Multi(MultiPolygon<f64>),
}

impl Footprint {
    /// Accept only areal geometries; everything else is not a footprint
    pub fn from_geometry(geometry: Geometry<f64>) -> Option<Self> {
        match geometry {
            Geometry::Polygon(p) => Some(Footprint::Simple(p)),
            Geometry::MultiPolygon(mp) => Some(Footprint::Multi(mp)),
            _ => None,
        }
    }

    /// The simple polygons making up this footprint
    pub fn parts(&self) -> Vec<&Polygon<f64>> {
        match self {
            Footprint::Simple(p) => vec![p],
            Footprint::Multi(mp) => mp.0.iter().collect(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.parts().iter().all(|p| p.exterior().0.is_empty())
    }

    /// Apply a coordinate transform to every vertex
    pub fn map_coords(&self, f: impl Fn(Coord<f64>) -> Coord<f64> + Copy) -> Self {
        match self {
            Footprint::Simple(p) => Footprint::Simple(p.map_coords(f)),
            Footprint::Multi(mp) => Footprint::Multi(mp.map_coords(f)),
        }
    }

    pub fn to_geometry(&self) -> Geometry<f64> {
        match self {
            Footprint::Simple(p) => Geometry::Polygon(p.clone()),
            Footprint::Multi(mp) => Geometry::MultiPolygon(mp.clone()),
        }
    }
}

/// An OSM building: its footprint plus the element it came from
#[derive(Debug, Clone)]
pub struct Building {
    /// "way" or "relation"
    pub osm_type: String,
    pub id: u64,
    pub tags: HashMap<String, String>,
    pub footprint: Footprint,
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::{LineString, polygon};

    #[test]
    fn test_from_geometry_filters_non_areal() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0), (x: 0.0, y: 1.0)];
        assert!(Footprint::from_geometry(Geometry::Polygon(square)).is_some());

        let line: LineString<f64> = vec![(0.0, 0.0), (1.0, 1.0)].into();
        assert!(Footprint::from_geometry(Geometry::LineString(line)).is_none());
    }

    #[test]
    fn test_parts_of_multi() {
        let a = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let b = polygon![(x: 5.0, y: 5.0), (x: 6.0, y: 5.0), (x: 6.0, y: 6.0)];
        let footprint = Footprint::Multi(MultiPolygon(vec![a, b]));
        assert_eq!(footprint.parts().len(), 2);
        assert!(!footprint.is_empty());
    }

    #[test]
    fn test_empty_footprint() {
        let footprint = Footprint::Multi(MultiPolygon(vec![]));
        assert!(footprint.is_empty());
    }

    #[test]
    fn test_map_coords() {
        let square = polygon![(x: 0.0, y: 0.0), (x: 1.0, y: 0.0), (x: 1.0, y: 1.0)];
        let moved = Footprint::Simple(square).map_coords(|c| Coord {
            x: c.x + 10.0,
            y: c.y,
        });
        let Footprint::Simple(p) = moved else {
            panic!("expected simple footprint");
        };
        assert_eq!(p.exterior().0[0].x, 10.0);
    }
}
