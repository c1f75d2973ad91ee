use crate::api::OverpassResponse;
use crate::api::overpass::Element;
use crate::domain::{Building, Footprint};
use geo::{Contains, Coord, LineString, MultiPolygon, Point, Polygon};
use std::collections::HashMap;

/// Parse an Overpass response into building footprints
///
/// # Algorithm
/// 1. Build node_id → (lon, lat) lookup map from all node elements
/// 2. Every closed way tagged `building` becomes a Polygon
/// 3. Every relation tagged `building` has its outer and inner member ways
///    stitched into closed rings; each inner ring is attached to the outer
///    ring that contains it, giving a MultiPolygon
///
/// Elements that cannot be resolved (missing nodes, open rings) are skipped.
pub fn parse_buildings(response: &OverpassResponse) -> Vec<Building> {
    let nodes = build_node_lookup(response);
    let ways: HashMap<u64, &[u64]> = response
        .elements
        .iter()
        .filter(|e| e.type_ == "way")
        .filter_map(|e| Some((e.id, e.nodes.as_deref()?)))
        .collect();

    let mut buildings = Vec::new();

    for element in &response.elements {
        let Some(tags) = &element.tags else {
            continue;
        };
        if !tags.contains_key("building") {
            continue;
        }

        let footprint = match element.type_.as_str() {
            "way" => parse_way(element, &nodes),
            "relation" => parse_relation(element, &ways, &nodes),
            _ => None,
        };

        match footprint {
            Some(footprint) => buildings.push(Building {
                osm_type: element.type_.clone(),
                id: element.id,
                tags: tags.clone(),
                footprint,
            }),
            None => {
                tracing::debug!(osm_type = %element.type_, id = element.id, "Skipping unresolvable building");
            }
        }
    }

    buildings
}

fn build_node_lookup(response: &OverpassResponse) -> HashMap<u64, Coord<f64>> {
    response
        .elements
        .iter()
        .filter(|e| e.type_ == "node")
        .filter_map(|e| {
            let lat = e.lat?;
            let lon = e.lon?;
            Some((e.id, Coord { x: lon, y: lat }))
        })
        .collect()
}

fn parse_way(element: &Element, nodes: &HashMap<u64, Coord<f64>>) -> Option<Footprint> {
    let refs = element.nodes.as_deref()?;
    if !is_closed(refs) {
        return None;
    }
    let ring = resolve_ring(refs, nodes)?;
    Some(Footprint::Simple(Polygon::new(ring, vec![])))
}

fn parse_relation(
    element: &Element,
    ways: &HashMap<u64, &[u64]>,
    nodes: &HashMap<u64, Coord<f64>>,
) -> Option<Footprint> {
    let members = element.members.as_ref()?;

    let mut outer_ways = Vec::new();
    let mut inner_ways = Vec::new();
    for member in members.iter().filter(|m| m.type_ == "way") {
        let Some(refs) = ways.get(&member.ref_) else {
            continue;
        };
        match member.role.as_str() {
            "inner" => inner_ways.push(refs.to_vec()),
            // Untagged roles are treated as outer
            _ => outer_ways.push(refs.to_vec()),
        }
    }

    let outers: Vec<LineString<f64>> = assemble_rings(outer_ways)
        .iter()
        .filter_map(|r| resolve_ring(r, nodes))
        .collect();
    if outers.is_empty() {
        return None;
    }
    let inners: Vec<LineString<f64>> = assemble_rings(inner_ways)
        .iter()
        .filter_map(|r| resolve_ring(r, nodes))
        .collect();

    let mut holes: Vec<Vec<LineString<f64>>> = vec![Vec::new(); outers.len()];
    for inner in inners {
        let Some(probe) = inner.0.first().copied() else {
            continue;
        };
        let owner = outers
            .iter()
            .position(|outer| Polygon::new(outer.clone(), vec![]).contains(&Point::from(probe)));
        if let Some(i) = owner {
            holes[i].push(inner);
        }
    }

    let polygons = outers
        .into_iter()
        .zip(holes)
        .map(|(outer, holes)| Polygon::new(outer, holes))
        .collect();
    Some(Footprint::Multi(MultiPolygon(polygons)))
}

fn is_closed(refs: &[u64]) -> bool {
    refs.len() >= 4 && refs.first() == refs.last()
}

fn resolve_ring(refs: &[u64], nodes: &HashMap<u64, Coord<f64>>) -> Option<LineString<f64>> {
    let coords: Option<Vec<Coord<f64>>> = refs.iter().map(|id| nodes.get(id).copied()).collect();
    Some(LineString::new(coords?))
}

/// Join way node lists end-to-end into closed rings.
///
/// Ways may be reversed to match. Chains that never close are dropped.
pub fn assemble_rings(mut ways: Vec<Vec<u64>>) -> Vec<Vec<u64>> {
    ways.retain(|w| w.len() >= 2);
    let mut rings = Vec::new();

    while let Some(mut ring) = ways.pop() {
        while !is_closed(&ring) {
            let Some(&end) = ring.last() else {
                break;
            };
            let Some(pos) = ways
                .iter()
                .position(|w| w.first() == Some(&end) || w.last() == Some(&end))
            else {
                break;
            };

            let mut next = ways.swap_remove(pos);
            if next.first() != Some(&end) {
                next.reverse();
            }
            ring.extend_from_slice(&next[1..]);
        }

        if is_closed(&ring) {
            rings.push(ring);
        }
    }

    rings
}
