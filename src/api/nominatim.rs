use crate::config::NominatimConfig;
use crate::domain::BoundingBox;
use anyhow::{Context, Result, bail};
use serde::Deserialize;
use std::thread;
use std::time::Duration;

use super::USER_AGENT;

#[derive(Debug, Deserialize)]
struct NominatimResult {
    display_name: String,
    /// [south, north, west, east] as strings
    boundingbox: [String; 4],
}

/// Geocode a place name to its bounding box.
///
/// Uses the Nominatim search API with `limit=1`.
/// Includes a 1 second delay for rate limiting (Nominatim ToS).
pub fn geocode_place(place: &str, config: &NominatimConfig) -> Result<BoundingBox> {
    // Nominatim allows at most 1 request per second
    thread::sleep(Duration::from_secs(1));

    let client = reqwest::blocking::Client::builder()
        .user_agent(USER_AGENT)
        .timeout(Duration::from_secs(30))
        .build()
        .context("Failed to create HTTP client")?;

    let response = client
        .get(&config.url)
        .query(&[("q", place), ("format", "json"), ("limit", "1")])
        .send()
        .context("Failed to send request to Nominatim API")?;

    if !response.status().is_success() {
        bail!("Nominatim API returned error status: {}", response.status());
    }

    let results: Vec<NominatimResult> = response
        .json()
        .context("Failed to parse Nominatim JSON response")?;

    let result = results
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("Place not found: {}", place))?;

    tracing::info!(place, found = %result.display_name, "Geocoded place");
    to_bounding_box(&result)
}

fn to_bounding_box(result: &NominatimResult) -> Result<BoundingBox> {
    let parse = |i: usize| -> Result<f64> {
        result.boundingbox[i]
            .parse()
            .with_context(|| format!("Invalid bounding box value: {}", result.boundingbox[i]))
    };
    let (south, north, west, east) = (parse(0)?, parse(1)?, parse(2)?, parse(3)?);

    BoundingBox::new(west, south, east, north).context("Nominatim returned an unusable bounding box")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_nominatim_response() {
        let json = r#"[{"lat":"43.7384","lon":"7.4246","display_name":"Monaco",
            "boundingbox":["43.7247599","43.7519311","7.4090279","7.4398704"]}]"#;
        let results: Vec<NominatimResult> = serde_json::from_str(json).unwrap();

        assert_eq!(results.len(), 1);
        let bbox = to_bounding_box(&results[0]).unwrap();
        assert_eq!(bbox.south, 43.7247599);
        assert_eq!(bbox.north, 43.7519311);
        assert_eq!(bbox.west, 7.4090279);
        assert_eq!(bbox.east, 7.4398704);
    }

    #[test]
    fn test_point_result_is_rejected() {
        // A node result can collapse to a zero-size box
        let result = NominatimResult {
            display_name: "Somewhere".to_string(),
            boundingbox: [
                "10.0".to_string(),
                "10.0".to_string(),
                "20.0".to_string(),
                "20.0".to_string(),
            ],
        };
        assert!(to_bounding_box(&result).is_err());
    }
}
