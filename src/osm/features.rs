//! GeoJSON reading and writing for building footprints

use crate::domain::{Building, Footprint};
use anyhow::{Context, Result};
use geojson::{Feature, FeatureCollection, GeoJson, Geometry, JsonObject, JsonValue};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Convert buildings into a FeatureCollection.
///
/// Each feature carries `type` ("way"/"relation"), `id` and `tags` properties.
pub fn buildings_to_feature_collection(buildings: &[Building]) -> FeatureCollection {
    let features = buildings
        .iter()
        .map(|b| {
            let mut properties = JsonObject::new();
            properties.insert("type".to_string(), JsonValue::from(b.osm_type.clone()));
            properties.insert("id".to_string(), JsonValue::from(b.id));
            properties.insert(
                "tags".to_string(),
                JsonValue::Object(
                    b.tags
                        .iter()
                        .map(|(k, v)| (k.clone(), JsonValue::from(v.clone())))
                        .collect(),
                ),
            );

            Feature {
                bbox: None,
                geometry: Some(Geometry::new(geojson::Value::from(&b.footprint.to_geometry()))),
                id: None,
                properties: Some(properties),
                foreign_members: None,
            }
        })
        .collect();

    FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    }
}

/// Write buildings to `path` as a GeoJSON FeatureCollection
pub fn write_buildings(path: &Path, buildings: &[Building]) -> Result<()> {
    let collection = buildings_to_feature_collection(buildings);
    let file = File::create(path)
        .with_context(|| format!("Failed to create GeoJSON file: {}", path.display()))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer(&mut writer, &collection)
        .with_context(|| format!("Failed to write GeoJSON file: {}", path.display()))?;
    writer.flush()?;
    Ok(())
}

/// Footprints read from a GeoJSON file
#[derive(Debug, Default)]
pub struct FootprintSet {
    pub footprints: Vec<Footprint>,
    /// Features whose geometry was missing, unreadable or not areal
    pub skipped: usize,
}

/// Read every Polygon/MultiPolygon from a GeoJSON file.
///
/// Accepts a FeatureCollection, a single Feature or a bare Geometry.
/// Non-areal or unconvertible geometries are counted and skipped.
pub fn read_footprints(path: &Path) -> Result<FootprintSet> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read GeoJSON file: {}", path.display()))?;
    let geojson: GeoJson = contents
        .parse()
        .with_context(|| format!("Failed to parse GeoJSON file: {}", path.display()))?;

    let geometries: Vec<Option<Geometry>> = match geojson {
        GeoJson::FeatureCollection(fc) => fc.features.into_iter().map(|f| f.geometry).collect(),
        GeoJson::Feature(f) => vec![f.geometry],
        GeoJson::Geometry(g) => vec![Some(g)],
    };

    let mut set = FootprintSet::default();
    for geometry in geometries {
        let footprint = geometry
            .and_then(|g| geo::Geometry::<f64>::try_from(g).ok())
            .and_then(Footprint::from_geometry);
        match footprint {
            Some(f) if !f.is_empty() => set.footprints.push(f),
            _ => set.skipped += 1,
        }
    }

    Ok(set)
}

#[cfg(test)]
mod tests {
    use super::*;
    use geo::polygon;
    use std::collections::HashMap;
    use tempfile::tempdir;

    fn sample_building() -> Building {
        Building {
            osm_type: "way".to_string(),
            id: 42,
            tags: HashMap::from([("building".to_string(), "house".to_string())]),
            footprint: Footprint::Simple(polygon![
                (x: 7.42, y: 43.73),
                (x: 7.4201, y: 43.73),
                (x: 7.4201, y: 43.7301),
                (x: 7.42, y: 43.7301),
            ]),
        }
    }

    #[test]
    fn test_feature_properties() {
        let fc = buildings_to_feature_collection(&[sample_building()]);
        assert_eq!(fc.features.len(), 1);

        let props = fc.features[0].properties.as_ref().unwrap();
        assert_eq!(props["type"], "way");
        assert_eq!(props["id"], 42);
        assert_eq!(props["tags"]["building"], "house");
        assert!(matches!(
            fc.features[0].geometry.as_ref().unwrap().value,
            geojson::Value::Polygon(_)
        ));
    }

    #[test]
    fn test_written_file_reads_back() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("osm_bbox.geojson");
        write_buildings(&path, &[sample_building(), sample_building()]).unwrap();

        let set = read_footprints(&path).unwrap();
        assert_eq!(set.footprints.len(), 2);
        assert_eq!(set.skipped, 0);
    }

    #[test]
    fn test_read_skips_non_areal_and_null_geometries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("mixed.geojson");
        std::fs::write(
            &path,
            r#"{"type": "FeatureCollection", "features": [
                {"type": "Feature", "properties": {}, "geometry": null},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "LineString", "coordinates": [[0, 0], [1, 1]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}},
                {"type": "Feature", "properties": {},
                 "geometry": {"type": "MultiPolygon", "coordinates": [
                    [[[0, 0], [1, 0], [1, 1], [0, 0]]],
                    [[[5, 5], [6, 5], [6, 6], [5, 5]]]
                 ]}}
            ]}"#,
        )
        .unwrap();

        let set = read_footprints(&path).unwrap();
        assert_eq!(set.footprints.len(), 2);
        assert_eq!(set.skipped, 2);
        assert!(matches!(set.footprints[1], Footprint::Multi(_)));
    }

    #[test]
    fn test_read_bare_geometry() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("geometry.geojson");
        std::fs::write(
            &path,
            r#"{"type": "Polygon", "coordinates": [[[0, 0], [1, 0], [1, 1], [0, 0]]]}"#,
        )
        .unwrap();

        let set = read_footprints(&path).unwrap();
        assert_eq!(set.footprints.len(), 1);
    }

    #[test]
    fn test_read_invalid_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.geojson");
        std::fs::write(&path, "{not json").unwrap();
        assert!(read_footprints(&path).is_err());
    }
}
