//! Runtime configuration. Deployment values come from `BAIRRO_*` environment
//! variables; dashboard tuning (bands, top-N sizes, theme) from an optional YAML file.

use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::analytics::bands::{CostBandError, CostBands, DEFAULT_COST_EDGES};
use crate::data::record::Restaurant;
use crate::data::store::DEFAULT_DB_PATH;
use crate::geo::cache::DEFAULT_CACHE_PATH;
use crate::geo::geocoder::DEFAULT_GEOCODER_URL;
use crate::geo::populate::DEFAULT_LOOKUP_INTERVAL;

pub const DEFAULT_BIND: &str = "127.0.0.1:3000";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read dashboard config '{path}': {source}")]
    Read {
        path: String,
        source: std::io::Error,
    },
    #[error("failed to parse dashboard config: {0}")]
    Parse(#[from] serde_yaml::Error),
    #[error("invalid cost bands: {0}")]
    Bands(#[from] CostBandError),
    #[error("{0} must be at least 1")]
    ZeroTopN(&'static str),
    #[error("invalid {name} '{value}'")]
    InvalidEnv { name: &'static str, value: String },
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub db_path: PathBuf,
    pub bind_addr: String,
    pub geocode_cache_path: PathBuf,
    pub geocoder_url: String,
    pub geocode_suffix: String,
    pub geocode_interval: Duration,
    pub dashboard_config_path: Option<PathBuf>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            db_path: PathBuf::from(DEFAULT_DB_PATH),
            bind_addr: DEFAULT_BIND.to_string(),
            geocode_cache_path: PathBuf::from(DEFAULT_CACHE_PATH),
            geocoder_url: DEFAULT_GEOCODER_URL.to_string(),
            geocode_suffix: String::new(),
            geocode_interval: DEFAULT_LOOKUP_INTERVAL,
            dashboard_config_path: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        let defaults = Self::default();
        let geocode_interval = match env::var("BAIRRO_GEOCODE_INTERVAL_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::InvalidEnv {
                    name: "BAIRRO_GEOCODE_INTERVAL_MS",
                    value: raw,
                })?,
            Err(_) => defaults.geocode_interval,
        };
        Ok(Self {
            db_path: env::var("BAIRRO_DB").map(PathBuf::from).unwrap_or(defaults.db_path),
            bind_addr: env::var("BAIRRO_BIND").unwrap_or(defaults.bind_addr),
            geocode_cache_path: env::var("BAIRRO_GEOCODE_CACHE")
                .map(PathBuf::from)
                .unwrap_or(defaults.geocode_cache_path),
            geocoder_url: env::var("BAIRRO_GEOCODER_URL").unwrap_or(defaults.geocoder_url),
            geocode_suffix: env::var("BAIRRO_GEOCODE_SUFFIX").unwrap_or(defaults.geocode_suffix),
            geocode_interval,
            dashboard_config_path: env::var("BAIRRO_DASHBOARD_CONFIG").ok().map(PathBuf::from),
        })
    }

    /// The dashboard config file if one is configured, otherwise defaults.
    pub fn dashboard(&self) -> Result<DashboardConfig, ConfigError> {
        match &self.dashboard_config_path {
            Some(path) => DashboardConfig::load(path),
            None => Ok(DashboardConfig::default()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DashboardConfig {
    pub cost_bands: Vec<f64>,
    /// Append the data's maximum cost as the last edge.
    pub cost_bands_to_max: bool,
    pub top_groups: usize,
    pub top_restaurants: usize,
    pub top_dishes: usize,
    pub theme: Theme,
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self {
            cost_bands: DEFAULT_COST_EDGES.to_vec(),
            cost_bands_to_max: false,
            top_groups: 10,
            top_restaurants: 20,
            top_dishes: 15,
            theme: Theme::Light,
        }
    }
}

impl DashboardConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&raw)
    }

    pub fn from_yaml(raw: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_yaml::from_str(raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        CostBands::new(self.cost_bands.clone())?;
        for (name, value) in [
            ("top_groups", self.top_groups),
            ("top_restaurants", self.top_restaurants),
            ("top_dishes", self.top_dishes),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroTopN(name));
            }
        }
        Ok(())
    }

    /// Bands for `records`; with `cost_bands_to_max` the data maximum closes the range.
    pub fn bands_for(&self, records: &[Restaurant]) -> Result<CostBands, CostBandError> {
        if self.cost_bands_to_max {
            CostBands::up_to_max(self.cost_bands.clone(), records)
        } else {
            CostBands::new(self.cost_bands.clone())
        }
    }
}
