use anyhow::{Context, Result};
use serde::Deserialize;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

/// Environment variable holding the OpenTopography API key
pub const OPENTOPO_API_KEY_ENV: &str = "OPENTOPO_API_KEY";

fn default_bind() -> SocketAddr {
    SocketAddr::from(([127, 0, 0, 1], 5000))
}
fn default_output_dir() -> PathBuf {
    PathBuf::from("static/models")
}
fn default_overpass_url() -> String {
    "https://overpass-api.de/api/interpreter".to_string()
}
fn default_nominatim_url() -> String {
    "https://nominatim.openstreetmap.org/search".to_string()
}
fn default_opentopo_url() -> String {
    "https://portal.opentopography.org/API/globaldem".to_string()
}
fn default_dem_type() -> String {
    "SRTMGL1".to_string()
}
fn default_timeout_secs() -> u64 {
    60
}

/// Settings read from a `terramesh.toml` file. Every field is optional.
#[derive(Debug, Deserialize, Default, Clone)]
pub struct FileConfig {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub overpass: OverpassConfig,
    #[serde(default)]
    pub nominatim: NominatimConfig,
    #[serde(default)]
    pub opentopography: OpenTopographyConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: SocketAddr,
    /// Where fetched data and generated models are written
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            output_dir: default_output_dir(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct OverpassConfig {
    #[serde(default = "default_overpass_url")]
    pub url: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OverpassConfig {
    fn default() -> Self {
        Self {
            url: default_overpass_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
pub struct NominatimConfig {
    #[serde(default = "default_nominatim_url")]
    pub url: String,
}

impl Default for NominatimConfig {
    fn default() -> Self {
        Self {
            url: default_nominatim_url(),
        }
    }
}

#[derive(Deserialize, Clone)]
pub struct OpenTopographyConfig {
    #[serde(default = "default_opentopo_url")]
    pub url: String,
    #[serde(default = "default_dem_type")]
    pub dem_type: String,
    #[serde(default)]
    pub api_key: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for OpenTopographyConfig {
    fn default() -> Self {
        Self {
            url: default_opentopo_url(),
            dem_type: default_dem_type(),
            api_key: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

// Keep the API key out of logs
impl std::fmt::Debug for OpenTopographyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OpenTopographyConfig")
            .field("url", &self.url)
            .field("dem_type", &self.dem_type)
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl FileConfig {
    /// Load from an explicit path; a missing or malformed file is an error
    pub fn from_path(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", path.display()))
    }

    /// Search the usual locations and return the first file that parses
    pub fn load() -> Option<Self> {
        for path in get_config_paths() {
            if path.exists()
                && let Ok(contents) = std::fs::read_to_string(&path)
            {
                match toml::from_str(&contents) {
                    Ok(config) => {
                        tracing::info!(path = %path.display(), "Loaded config file");
                        return Some(config);
                    }
                    Err(e) => {
                        tracing::warn!(path = %path.display(), error = %e, "Failed to parse config file");
                    }
                }
            }
        }
        None
    }

    /// `OPENTOPO_API_KEY` takes precedence over the file
    pub fn with_env_overrides(mut self) -> Self {
        self.apply_api_key_env(std::env::var(OPENTOPO_API_KEY_ENV).ok());
        self
    }

    fn apply_api_key_env(&mut self, key: Option<String>) {
        if let Some(key) = key.filter(|k| !k.trim().is_empty()) {
            self.opentopography.api_key = Some(key);
        }
    }
}

fn get_config_paths() -> Vec<PathBuf> {
    let mut paths = Vec::new();

    paths.push(PathBuf::from("terramesh.toml"));
    paths.push(PathBuf::from(".terramesh.toml"));

    if let Some(config_dir) = dirs::config_dir() {
        paths.push(config_dir.join("terramesh").join("config.toml"));
        paths.push(config_dir.join("terramesh.toml"));
    }

    if let Some(home) = dirs::home_dir() {
        paths.push(home.join(".terramesh.toml"));
        paths.push(home.join(".config").join("terramesh").join("config.toml"));
    }

    paths
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config: FileConfig = toml::from_str("").unwrap();
        assert_eq!(config.server.bind, default_bind());
        assert_eq!(config.server.output_dir, PathBuf::from("static/models"));
        assert_eq!(config.overpass.url, "https://overpass-api.de/api/interpreter");
        assert_eq!(config.opentopography.dem_type, "SRTMGL1");
        assert!(config.opentopography.api_key.is_none());
    }

    #[test]
    fn test_partial_sections() {
        let config: FileConfig = toml::from_str(
            r#"
            [server]
            bind = "0.0.0.0:8080"

            [opentopography]
            api_key = "abc123"
            dem_type = "COP30"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.bind.port(), 8080);
        assert_eq!(config.server.output_dir, default_output_dir());
        assert_eq!(config.opentopography.api_key.as_deref(), Some("abc123"));
        assert_eq!(config.opentopography.dem_type, "COP30");
        assert_eq!(config.opentopography.timeout_secs, 60);
    }

    #[test]
    fn test_from_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("terramesh.toml");
        std::fs::write(&path, "[overpass]\ntimeout_secs = 90\n").unwrap();

        let config = FileConfig::from_path(&path).unwrap();
        assert_eq!(config.overpass.timeout_secs, 90);

        std::fs::write(&path, "[overpass\n").unwrap();
        assert!(FileConfig::from_path(&path).is_err());
        assert!(FileConfig::from_path(&dir.path().join("missing.toml")).is_err());
    }

    #[test]
    fn test_api_key_env_override() {
        let mut config = FileConfig::default();
        config.apply_api_key_env(Some("from-env".to_string()));
        assert_eq!(config.opentopography.api_key.as_deref(), Some("from-env"));

        config.apply_api_key_env(Some("  ".to_string()));
        assert_eq!(config.opentopography.api_key.as_deref(), Some("from-env"));
    }

    #[test]
    fn test_debug_redacts_api_key() {
        let config = OpenTopographyConfig {
            api_key: Some("topsecret".to_string()),
            ..Default::default()
        };
        let printed = format!("{:?}", config);
        assert!(!printed.contains("topsecret"));
        assert!(printed.contains("<redacted>"));
    }
}
