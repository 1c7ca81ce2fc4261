use std::fmt;
use std::path::PathBuf;
use std::time::{Duration, UNIX_EPOCH};

use chrono::TimeZone;
use serde::Serialize;
use tracing::info;

use crate::analytics::bands::CostBandError;
use crate::analytics::filter::{filter_records, FilterDomains, FilterSelection};
use crate::analytics::report::build_report;
use crate::config::DashboardConfig;
use crate::data::export::{export_to_string, ExportError};
use crate::data::record::Restaurant;
use crate::data::store::NeighborhoodSummary;
use crate::geo::cache::{CacheError, GeocodeCache, GeocodeState};
use crate::geo::geocoder::Geocoder;
use crate::geo::populate::{distinct_neighborhoods, rebuild_cache, PopulationMode, DEFAULT_LOOKUP_INTERVAL};

/// Everything the dashboard serves from. Records are a read-only snapshot
/// taken at startup; only the geocode cache changes while serving.
pub struct DashboardState {
    pub records: Vec<Restaurant>,
    pub summary: Vec<NeighborhoodSummary>,
    pub domains: FilterDomains,
    pub config: DashboardConfig,
    pub cache: GeocodeCache,
    pub cache_path: PathBuf,
    pub geocoder: Option<Box<dyn Geocoder>>,
    pub geocode_interval: Duration,
}

impl DashboardState {
    pub fn new(
        records: Vec<Restaurant>,
        summary: Vec<NeighborhoodSummary>,
        config: DashboardConfig,
        cache_path: PathBuf,
    ) -> Self {
        let domains = FilterDomains::observe(&records);
        let cache = GeocodeCache::load(&cache_path);
        Self {
            records,
            summary,
            domains,
            config,
            cache,
            cache_path,
            geocoder: None,
            geocode_interval: DEFAULT_LOOKUP_INTERVAL,
        }
    }

    pub fn with_geocoder(mut self, geocoder: Box<dyn Geocoder>, interval: Duration) -> Self {
        self.geocoder = Some(geocoder);
        self.geocode_interval = interval;
        self
    }
}

#[derive(Debug)]
pub enum ApiError {
    Parse(serde_json::Error),
    Bands(CostBandError),
    Export(ExportError),
    Cache(CacheError),
    GeocoderUnavailable,
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Parse(err) => write!(f, "{err}"),
            Self::Bands(err) => write!(f, "{err}"),
            Self::Export(err) => write!(f, "{err}"),
            Self::Cache(err) => write!(f, "{err}"),
            Self::GeocoderUnavailable => write!(f, "no geocoder configured"),
        }
    }
}

impl std::error::Error for ApiError {}

pub fn health_payload(state: &DashboardState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "service": "bairro-dashboard",
        "version": env!("CARGO_PKG_VERSION"),
        "records": state.records.len(),
    }))
}

/// Repeated `neighborhood`, `rest_type` and `cuisine` query parameters.
pub fn selection_from_query(path: &str) -> FilterSelection {
    let mut selection = FilterSelection::default();
    let query = path.split_once('?').map(|(_, q)| q).unwrap_or("");
    for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (key, value) = pair.split_once('=').unwrap_or((pair, ""));
        let value = decode_component(value);
        if value.is_empty() {
            continue;
        }
        match key {
            "neighborhood" => {
                selection.neighborhoods.insert(value);
            }
            "rest_type" => {
                selection.rest_types.insert(value);
            }
            "cuisine" => {
                selection.cuisines.insert(value);
            }
            _ => {}
        }
    }
    selection
}

fn decode_component(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    urlencoding::decode(&spaced)
        .map(|value| value.into_owned())
        .unwrap_or(spaced)
}

pub fn domains_payload(state: &DashboardState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&state.domains)
}

pub fn dashboard_payload(state: &DashboardState, selection: &FilterSelection) -> Result<String, ApiError> {
    let report = build_report(&state.records, selection, &state.config, &state.cache)
        .map_err(ApiError::Bands)?;
    let stale = state.domains.stale_values(selection);
    serde_json::to_string_pretty(&serde_json::json!({
        "status": "ok",
        "stale_selection": stale,
        "report": report,
    }))
    .map_err(ApiError::Parse)
}

pub fn dashboard_post_payload(state: &DashboardState, body: &str) -> Result<String, ApiError> {
    let body = body.trim();
    let selection: FilterSelection = if body.is_empty() {
        FilterSelection::default()
    } else {
        serde_json::from_str(body).map_err(ApiError::Parse)?
    };
    dashboard_payload(state, &selection)
}

pub fn summary_payload(state: &DashboardState) -> Result<String, serde_json::Error> {
    serde_json::to_string_pretty(&serde_json::json!({ "neighborhoods": state.summary }))
}

pub fn export_payload(state: &DashboardState, selection: &FilterSelection) -> Result<String, ApiError> {
    let filtered = filter_records(&state.records, selection);
    let bands = state.config.bands_for(&filtered).map_err(ApiError::Bands)?;
    export_to_string(&filtered, &bands).map_err(ApiError::Export)
}

#[derive(Debug, Clone, Serialize)]
pub struct NeighborhoodGeocodeStatus {
    pub neighborhood: String,
    pub state: GeocodeState,
}

pub fn geocode_status_payload(state: &DashboardState) -> Result<String, serde_json::Error> {
    let neighborhoods: Vec<NeighborhoodGeocodeStatus> = distinct_neighborhoods(&state.records)
        .into_iter()
        .map(|neighborhood| NeighborhoodGeocodeStatus {
            state: state.cache.state(&neighborhood),
            neighborhood,
        })
        .collect();
    let count = |wanted: GeocodeState| neighborhoods.iter().filter(|n| n.state == wanted).count();
    let last_modified_iso: Option<String> = std::fs::metadata(&state.cache_path)
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|t| {
            t.duration_since(UNIX_EPOCH).ok().and_then(|d| {
                chrono::Utc
                    .timestamp_opt(d.as_secs() as i64, d.subsec_nanos())
                    .single()
                    .map(|dt| dt.to_rfc3339())
            })
        });
    serde_json::to_string_pretty(&serde_json::json!({
        "cache_path": state.cache_path.display().to_string(),
        "last_modified_iso": last_modified_iso,
        "resolved": count(GeocodeState::Resolved),
        "failed": count(GeocodeState::Failed),
        "unresolved": count(GeocodeState::Unresolved),
        "geocoder_configured": state.geocoder.is_some(),
        "neighborhoods": neighborhoods,
    }))
}

/// `?skip_resolved=true` on the populate route keeps resolved entries.
pub fn population_mode_from_query(path: &str) -> PopulationMode {
    let query = path.split_once('?').map(|(_, q)| q).unwrap_or("");
    let skip = query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .any(|(key, value)| key == "skip_resolved" && matches!(value, "true" | "1"));
    if skip {
        PopulationMode::SkipResolved
    } else {
        PopulationMode::Full
    }
}

/// Manual population trigger. Runs synchronously; the server handles nothing
/// else until every lookup has finished. The in-memory cache and the file are
/// both replaced by the rebuilt mapping.
pub fn geocode_populate_payload(state: &mut DashboardState, mode: PopulationMode) -> Result<String, ApiError> {
    let geocoder = state.geocoder.as_deref().ok_or(ApiError::GeocoderUnavailable)?;
    let (cache, report) = rebuild_cache(&state.records, &state.cache, geocoder, state.geocode_interval, mode);
    cache.save(&state.cache_path).map_err(ApiError::Cache)?;
    state.cache = cache;
    info!(mode = ?mode, attempted = report.attempted, failed = report.failed.len(), "population triggered over http");
    serde_json::to_string_pretty(&serde_json::json!({ "status": "ok", "report": report }))
        .map_err(ApiError::Parse)
}
