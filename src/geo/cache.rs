//! Neighborhood coordinate cache persisted as a JSON object:
//! `{"Banashankari": {"lat": 12.93, "lon": 77.55}, "Unknown": {}}`.
//!
//! Loading never fails: a missing or unreadable file is an empty cache.
//! Saving overwrites the whole file.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

pub const DEFAULT_CACHE_PATH: &str = "data/neighborhood_coords.json";

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lat: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lon: Option<f64>,
}

impl Coordinates {
    pub fn resolved(lat: f64, lon: f64) -> Self {
        Self {
            lat: Some(lat),
            lon: Some(lon),
        }
    }

    pub fn failed() -> Self {
        Self::default()
    }

    /// Both halves present. A lat-only or lon-only entry is not usable.
    pub fn pair(&self) -> Option<(f64, f64)> {
        Some((self.lat?, self.lon?))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum GeocodeState {
    Unresolved,
    Resolved,
    Failed,
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("failed to write geocode cache: {0}")]
    Write(#[from] std::io::Error),
    #[error("failed to serialize geocode cache: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GeocodeCache {
    entries: BTreeMap<String, Coordinates>,
}

impl GeocodeCache {
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref();
        let raw = match fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(err) => {
                warn!(path = %path.display(), error = %err, "geocode cache unavailable; starting empty");
                return Self::default();
            }
        };
        match serde_json::from_str::<Self>(&raw) {
            Ok(cache) => {
                info!(path = %path.display(), entries = cache.len(), "loaded geocode cache");
                cache
            }
            Err(err) => {
                warn!(path = %path.display(), error = %err, "geocode cache unreadable; starting empty");
                Self::default()
            }
        }
    }

    /// Replaces the file at `path` with the full mapping.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), CacheError> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        let serialized = serde_json::to_string_pretty(self)?;
        fs::write(path, serialized)?;
        info!(path = %path.display(), entries = self.len(), "saved geocode cache");
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, neighborhood: &str) -> Option<&Coordinates> {
        self.entries.get(neighborhood)
    }

    pub fn coordinates(&self, neighborhood: &str) -> Option<(f64, f64)> {
        self.entries.get(neighborhood).and_then(Coordinates::pair)
    }

    pub fn insert(&mut self, neighborhood: impl Into<String>, coordinates: Coordinates) {
        self.entries.insert(neighborhood.into(), coordinates);
    }

    pub fn state(&self, neighborhood: &str) -> GeocodeState {
        match self.entries.get(neighborhood) {
            None => GeocodeState::Unresolved,
            Some(coords) if coords.pair().is_some() => GeocodeState::Resolved,
            Some(_) => GeocodeState::Failed,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Coordinates)> {
        self.entries.iter()
    }
}
