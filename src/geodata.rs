//! Geodata acquisition
//!
//! Loads the bundled low-resolution world geometry from disk and fetches
//! detailed per-country geometry from the geodata CDN. Remote fetches run
//! on a worker thread so the UI can animate while the download is in
//! flight; every outcome carries the request token it was issued for.

use std::fs;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::Duration;

use crate::geometry::{GeometryError, PolygonLayer};

/// Region ids excluded from the world layer.
pub const WORLD_EXCLUDE: &[&str] = &["AQ"];

/// Configuration for the geodata service.
#[derive(Clone, Debug)]
pub struct GeodataConfig {
    /// Base URL serving `<map_asset>.json` documents
    pub base_url: String,
    /// Request timeout in seconds
    pub timeout_secs: u64,
}

impl Default for GeodataConfig {
    fn default() -> Self {
        Self {
            base_url: "https://cdn.amcharts.com/lib/5/geodata/json".to_string(),
            timeout_secs: 30,
        }
    }
}

#[derive(Debug)]
pub enum GeodataError {
    Io(String),
    Network(String),
    Api(String),
    Parse(String),
}

impl std::fmt::Display for GeodataError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GeodataError::Io(e) => write!(f, "IO error: {}", e),
            GeodataError::Network(e) => write!(f, "Network error: {}", e),
            GeodataError::Api(e) => write!(f, "API error: {}", e),
            GeodataError::Parse(e) => write!(f, "Parse error: {}", e),
        }
    }
}

impl std::error::Error for GeodataError {}

impl From<GeometryError> for GeodataError {
    fn from(e: GeometryError) -> Self {
        GeodataError::Parse(e.to_string())
    }
}

/// Load the bundled world boundaries file, excluding Antarctica.
pub fn load_world_layer(path: &str) -> Result<PolygonLayer, GeodataError> {
    let text = fs::read_to_string(path).map_err(|e| GeodataError::Io(format!("{}: {}", path, e)))?;
    Ok(PolygonLayer::parse(&text, WORLD_EXCLUDE)?)
}

/// Client for the remote geodata service.
#[derive(Clone)]
pub struct GeodataClient {
    config: GeodataConfig,
    client: reqwest::blocking::Client,
}

impl GeodataClient {
    pub fn new(config: GeodataConfig) -> Self {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .expect("Failed to create HTTP client");

        Self { config, client }
    }

    /// URL of a country map document.
    pub fn country_url(&self, map_asset: &str) -> String {
        format!("{}/{}.json", self.config.base_url.trim_end_matches('/'), map_asset)
    }

    /// Fetch and parse a country map. Country layers keep every region,
    /// so no exclusion list applies here.
    pub fn fetch_country(&self, map_asset: &str) -> Result<PolygonLayer, GeodataError> {
        let url = self.country_url(map_asset);

        let response = self
            .client
            .get(&url)
            .send()
            .map_err(|e| GeodataError::Network(e.to_string()))?;

        if !response.status().is_success() {
            return Err(GeodataError::Api(format!("status {} for {}", response.status(), url)));
        }

        let text = response.text().map_err(|e| GeodataError::Network(e.to_string()))?;
        Ok(PolygonLayer::parse(&text, &[])?)
    }
}

/// Outcome of a drill-down fetch, tagged with its request token.
#[derive(Debug)]
pub struct FetchOutcome {
    pub token: u64,
    pub result: Result<PolygonLayer, GeodataError>,
}

/// Fetch a country map on a worker thread, delivering the outcome on `tx`.
/// The receiver decides whether the token is still current; a dropped
/// receiver just discards the send.
pub fn spawn_country_fetch(
    client: GeodataClient,
    map_asset: String,
    token: u64,
    tx: Sender<FetchOutcome>,
) {
    thread::spawn(move || {
        let result = client.fetch_country(&map_asset);
        let _ = tx.send(FetchOutcome { token, result });
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_country_url_building() {
        let client = GeodataClient::new(GeodataConfig {
            base_url: "https://example.com/geodata/".to_string(),
            timeout_secs: 5,
        });
        assert_eq!(
            client.country_url("usaLow"),
            "https://example.com/geodata/usaLow.json"
        );
    }

    #[test]
    fn test_missing_world_file_is_io_error() {
        let err = load_world_layer("/nonexistent/worldLow.json").unwrap_err();
        assert!(matches!(err, GeodataError::Io(_)));
    }

    #[test]
    fn test_world_layer_excludes_antarctica() {
        let doc = r#"{"type":"FeatureCollection","features":[
            {"type":"Feature","id":"AQ","properties":{"name":"Antarctica"},
             "geometry":{"type":"Polygon","coordinates":[[[-60.0,-85.0],[-20.0,-85.0],[-20.0,-70.0],[-60.0,-70.0],[-60.0,-85.0]]]}},
            {"type":"Feature","id":"AU","properties":{"name":"Australia"},
             "geometry":{"type":"Polygon","coordinates":[[[113.0,-39.0],[154.0,-39.0],[154.0,-11.0],[113.0,-11.0],[113.0,-39.0]]]}}
        ]}"#;

        let path = std::env::temp_dir().join("world_atlas_test_world.json");
        let mut file = fs::File::create(&path).unwrap();
        file.write_all(doc.as_bytes()).unwrap();

        let layer = load_world_layer(path.to_str().unwrap()).unwrap();
        assert!(layer.get("AQ").is_none());
        assert!(layer.get("AU").is_some());

        let _ = fs::remove_file(&path);
    }

    #[test]
    fn test_geometry_error_converts_to_parse() {
        let err: GeodataError = GeometryError::NoFeatures.into();
        assert!(matches!(err, GeodataError::Parse(_)));
    }
}
