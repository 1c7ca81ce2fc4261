//! External geocoding lookups. The HTTP client talks to a Nominatim-compatible
//! search endpoint; tests substitute their own `Geocoder`.

use serde::Deserialize;
use tracing::debug;

pub const DEFAULT_GEOCODER_URL: &str = "https://nominatim.openstreetmap.org/search";
const USER_AGENT: &str = concat!("bairro/", env!("CARGO_PKG_VERSION"));
const MAX_QUERY_LEN: usize = 200;

#[derive(Debug, thiserror::Error)]
pub enum GeocodeError {
    #[error("no geocoding results for '{0}'")]
    NotFound(String),
    #[error("geocoding query too long ({0} chars)")]
    QueryTooLong(usize),
    #[error("geocoding request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("geocoder returned an unparsable coordinate: {0}")]
    BadCoordinate(String),
}

pub trait Geocoder {
    /// Latitude and longitude for `query`.
    fn lookup(&self, query: &str) -> Result<(f64, f64), GeocodeError>;
}

#[derive(Debug, Deserialize)]
struct NominatimResult {
    lat: String,
    lon: String,
}

/// Blocking client for a Nominatim search endpoint. The neighborhood name is
/// followed by `suffix` (e.g. `", Bangalore, India"`) to disambiguate.
/// No request timeout is set beyond the client default.
pub struct NominatimGeocoder {
    client: reqwest::blocking::Client,
    base_url: String,
    suffix: String,
}

impl NominatimGeocoder {
    pub fn new(base_url: impl Into<String>, suffix: impl Into<String>) -> Result<Self, GeocodeError> {
        let client = reqwest::blocking::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into(),
            suffix: suffix.into(),
        })
    }
}

impl Geocoder for NominatimGeocoder {
    fn lookup(&self, query: &str) -> Result<(f64, f64), GeocodeError> {
        let full_query = format!("{query}{}", self.suffix);
        if full_query.len() > MAX_QUERY_LEN {
            return Err(GeocodeError::QueryTooLong(full_query.len()));
        }
        debug!(query = full_query.as_str(), "geocoding");
        let results: Vec<NominatimResult> = self
            .client
            .get(&self.base_url)
            .query(&[("q", full_query.as_str()), ("format", "json"), ("limit", "1")])
            .send()?
            .error_for_status()?
            .json()?;
        let first = results
            .into_iter()
            .next()
            .ok_or_else(|| GeocodeError::NotFound(full_query.clone()))?;
        let lat = first
            .lat
            .parse::<f64>()
            .map_err(|_| GeocodeError::BadCoordinate(first.lat.clone()))?;
        let lon = first
            .lon
            .parse::<f64>()
            .map_err(|_| GeocodeError::BadCoordinate(first.lon.clone()))?;
        Ok((lat, lon))
    }
}
