//! Manual cache population run: looks up every distinct neighborhood, one
//! throttled call at a time, then rewrites the cache file wholesale.
//!
//! A run does not merge into the previous file. Entries for neighborhoods no
//! longer in the data are dropped, and an interrupted run can lose coordinates
//! the old file had. `PopulationMode::SkipResolved` opts into reusing them.

use std::collections::HashSet;
use std::path::Path;
use std::thread;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::data::record::Restaurant;
use crate::geo::cache::{CacheError, Coordinates, GeocodeCache, GeocodeState};
use crate::geo::geocoder::Geocoder;

pub const DEFAULT_LOOKUP_INTERVAL: Duration = Duration::from_secs(1);

/// Enforces a minimum spacing between consecutive external calls.
#[derive(Debug)]
pub struct Throttle {
    min_interval: Duration,
    last_call: Option<Instant>,
}

impl Throttle {
    pub fn new(min_interval: Duration) -> Self {
        Self {
            min_interval,
            last_call: None,
        }
    }

    /// Sleeps until `min_interval` has passed since the previous call, then
    /// records this call.
    pub fn wait(&mut self) {
        if let Some(last) = self.last_call {
            let elapsed = last.elapsed();
            if elapsed < self.min_interval {
                thread::sleep(self.min_interval - elapsed);
            }
        }
        self.last_call = Some(Instant::now());
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PopulationMode {
    /// Start from an empty mapping and look up every neighborhood.
    #[default]
    Full,
    /// Start from the existing mapping and skip neighborhoods already resolved.
    SkipResolved,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PopulationReport {
    pub mode: PopulationMode,
    pub neighborhoods: usize,
    pub already_resolved: usize,
    pub attempted: usize,
    pub resolved: Vec<String>,
    pub failed: Vec<String>,
}

/// Distinct non-null neighborhoods in first-seen order.
pub fn distinct_neighborhoods(records: &[Restaurant]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter_map(|r| r.location.as_deref())
        .filter(|location| seen.insert(*location))
        .map(str::to_string)
        .collect()
}

/// Looks up each neighborhood into `cache`. With `SkipResolved`, entries the
/// cache already resolves are kept without a call. A failed lookup is recorded
/// as an empty entry and does not stop the batch.
pub fn populate_cache(
    cache: &mut GeocodeCache,
    neighborhoods: &[String],
    geocoder: &dyn Geocoder,
    throttle: &mut Throttle,
    mode: PopulationMode,
) -> PopulationReport {
    let mut report = PopulationReport {
        mode,
        neighborhoods: neighborhoods.len(),
        ..PopulationReport::default()
    };
    for neighborhood in neighborhoods {
        if mode == PopulationMode::SkipResolved && cache.state(neighborhood) == GeocodeState::Resolved {
            report.already_resolved += 1;
            continue;
        }
        throttle.wait();
        report.attempted += 1;
        match geocoder.lookup(neighborhood) {
            Ok((lat, lon)) => {
                info!(neighborhood = neighborhood.as_str(), lat, lon, "geocoded neighborhood");
                cache.insert(neighborhood.clone(), Coordinates::resolved(lat, lon));
                report.resolved.push(neighborhood.clone());
            }
            Err(err) => {
                warn!(neighborhood = neighborhood.as_str(), error = %err, "geocoding failed");
                cache.insert(neighborhood.clone(), Coordinates::failed());
                report.failed.push(neighborhood.clone());
            }
        }
    }
    report
}

/// Builds a new mapping from the distinct neighborhoods of `records`.
/// `previous` is only consulted for `SkipResolved`, and then only for
/// neighborhoods still present in `records`.
pub fn rebuild_cache(
    records: &[Restaurant],
    previous: &GeocodeCache,
    geocoder: &dyn Geocoder,
    min_interval: Duration,
    mode: PopulationMode,
) -> (GeocodeCache, PopulationReport) {
    let neighborhoods = distinct_neighborhoods(records);
    let mut cache = GeocodeCache::default();
    if mode == PopulationMode::SkipResolved {
        for neighborhood in &neighborhoods {
            if let Some(coordinates) = previous.get(neighborhood).filter(|c| c.pair().is_some()) {
                cache.insert(neighborhood.clone(), *coordinates);
            }
        }
    }
    let mut throttle = Throttle::new(min_interval);
    let report = populate_cache(&mut cache, &neighborhoods, geocoder, &mut throttle, mode);
    (cache, report)
}

/// Population run against the cache file at `cache_path`: rebuild from the
/// unfiltered `records`, then replace the file. Concurrent runs race; last
/// save wins.
pub fn run_population(
    records: &[Restaurant],
    cache_path: impl AsRef<Path>,
    geocoder: &dyn Geocoder,
    min_interval: Duration,
    mode: PopulationMode,
) -> Result<(GeocodeCache, PopulationReport), CacheError> {
    let cache_path = cache_path.as_ref();
    let previous = match mode {
        PopulationMode::Full => GeocodeCache::default(),
        PopulationMode::SkipResolved => GeocodeCache::load(cache_path),
    };
    let (cache, report) = rebuild_cache(records, &previous, geocoder, min_interval, mode);
    cache.save(cache_path)?;
    info!(
        mode = ?mode,
        attempted = report.attempted,
        resolved = report.resolved.len(),
        failed = report.failed.len(),
        "geocode population finished"
    );
    Ok((cache, report))
}
