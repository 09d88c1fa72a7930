use anyhow::{Context, Result};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use memberatlas::geocode::client::{DEFAULT_ENDPOINT, DEFAULT_USER_AGENT};
use memberatlas::geocode::NominatimConfig;
use memberatlas::Coordinate;

#[derive(Debug, Deserialize, Clone, Default)]
#[serde(default)]
pub struct Config {
    pub files: FilesConfig,
    pub geocoder: GeocoderConfig,
    /// Persist the cache after this many fresh geocodes. Unset means only
    /// at the end of the run.
    pub flush_every: Option<usize>,
    pub map: MapConfig,
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct FilesConfig {
    pub cache: PathBuf,
    pub rewrites: PathBuf,
    pub groups: PathBuf,
}

impl Default for FilesConfig {
    fn default() -> Self {
        Self {
            cache: PathBuf::from(".geocache.json"),
            rewrites: PathBuf::from(".address_rewrites.json"),
            groups: PathBuf::from(".match_groups.json"),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct GeocoderConfig {
    pub endpoint: String,
    pub user_agent: String,
    pub min_interval_ms: u64,
    pub timeout_secs: u64,
}

impl Default for GeocoderConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            user_agent: DEFAULT_USER_AGENT.to_string(),
            min_interval_ms: 1000,
            timeout_secs: 10,
        }
    }
}

impl GeocoderConfig {
    pub fn nominatim(&self) -> NominatimConfig {
        NominatimConfig {
            endpoint: self.endpoint.clone(),
            user_agent: self.user_agent.clone(),
            min_interval: Duration::from_millis(self.min_interval_ms),
            timeout: Duration::from_secs(self.timeout_secs),
        }
    }
}

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct MapConfig {
    pub title: String,
    /// [lat, lon]
    pub center: [f64; 2],
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            title: "Gladsaxe Radikale Venstres medlemmer".to_string(),
            center: [55.7333, 12.4667],
        }
    }
}

impl MapConfig {
    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.center[0], self.center[1])
    }
}

impl Config {
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(path).context("Failed to read config file")?;
        let config: Config = toml::from_str(&content).context("Failed to parse config file")?;
        Ok(config)
    }
}
