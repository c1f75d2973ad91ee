use crate::config::OverpassConfig;
use crate::domain::BoundingBox;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

use super::USER_AGENT;

/// Raw Overpass API response
#[derive(Debug, Deserialize)]
pub struct OverpassResponse {
    pub elements: Vec<Element>,
}

/// A single element from Overpass (node, way or relation)
#[derive(Debug, Deserialize)]
pub struct Element {
    #[serde(rename = "type")]
    pub type_: String,
    pub id: u64,
    #[serde(default)]
    pub nodes: Option<Vec<u64>>,
    #[serde(default)]
    pub members: Option<Vec<Member>>,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default)]
    pub lat: Option<f64>,
    #[serde(default)]
    pub lon: Option<f64>,
}

/// A relation member reference
#[derive(Debug, Deserialize)]
pub struct Member {
    #[serde(rename = "type")]
    pub type_: String,
    #[serde(rename = "ref")]
    pub ref_: u64,
    #[serde(default)]
    pub role: String,
}

/// Overpass QL for every building way and relation inside `bbox`,
/// recursed down to member ways and nodes
pub fn building_query(bbox: &BoundingBox) -> String {
    let filter = bbox.overpass_filter();
    format!(
        r#"[out:json][timeout:25];
(
  way["building"]({filter});
  relation["building"]({filter});
);
out body;
>;
out skel qt;"#
    )
}

/// Fetch building footprints (ways, relations and their nodes) in `bbox`
pub fn fetch_buildings(bbox: &BoundingBox, config: &OverpassConfig) -> Result<OverpassResponse> {
    let query = building_query(bbox);
    tracing::debug!(%bbox, url = %config.url, "Querying Overpass for buildings");
    execute_overpass_query(&query, config)
}

fn execute_overpass_query(query: &str, config: &OverpassConfig) -> Result<OverpassResponse> {
    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(config.timeout_secs))
        .build()
        .context("Failed to create HTTP client")?;

    // Overpass expects form-encoded POST data: data=<query>
    let response = client
        .post(&config.url)
        .form(&[("data", query)])
        .send()
        .context("Failed to send request to Overpass API")?;

    let status = response.status();
    if !status.is_success() {
        bail!("Overpass API returned error status: {}", status);
    }

    response
        .json()
        .context("Failed to parse Overpass JSON response")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_building_query_uses_overpass_bbox_order() {
        let bbox = BoundingBox::new(7.41, 43.72, 7.43, 43.73).unwrap();
        let query = building_query(&bbox);

        assert!(query.starts_with("[out:json][timeout:25];"));
        assert!(query.contains(r#"way["building"](43.72,7.41,43.73,7.43);"#));
        assert!(query.contains(r#"relation["building"](43.72,7.41,43.73,7.43);"#));
        assert!(query.ends_with("out skel qt;"));
    }

    #[test]
    fn test_parse_overpass_response() {
        let json = r#"{
            "elements": [
                {"type": "node", "id": 1, "lat": 43.73, "lon": 7.42},
                {"type": "way", "id": 2, "nodes": [1, 3], "tags": {"building": "yes"}},
                {"type": "relation", "id": 9, "members": [
                    {"type": "way", "ref": 2, "role": "outer"}
                ], "tags": {"building": "yes", "type": "multipolygon"}}
            ]
        }"#;

        let response: OverpassResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.elements.len(), 3);
        assert_eq!(response.elements[0].type_, "node");
        assert_eq!(response.elements[1].type_, "way");
        let members = response.elements[2].members.as_ref().unwrap();
        assert_eq!(members[0].ref_, 2);
        assert_eq!(members[0].role, "outer");
    }

    #[test]
    fn test_unreachable_endpoint_is_an_error() {
        let config = OverpassConfig {
            url: "http://127.0.0.1:9/api/interpreter".to_string(),
            timeout_secs: 2,
        };
        let bbox = BoundingBox::new(7.41, 43.72, 7.43, 43.73).unwrap();
        assert!(fetch_buildings(&bbox, &config).is_err());
    }
}
