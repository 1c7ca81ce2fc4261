use std::collections::BTreeMap;

use serde::Serialize;

use crate::analytics::metrics::mean;
use crate::data::record::Restaurant;
use crate::geo::cache::GeocodeCache;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MapPoint {
    pub neighborhood: String,
    pub lat: f64,
    pub lon: f64,
    pub mean_rate: f64,
    pub count: usize,
}

/// Mean rate per neighborhood (rated records only) joined with cached
/// coordinates. Neighborhoods without a complete cache entry are left out.
pub fn neighborhood_map(records: &[Restaurant], cache: &GeocodeCache) -> Vec<MapPoint> {
    let mut rates: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for record in records {
        if let (Some(location), Some(rate)) = (record.location.as_deref(), record.rate) {
            rates.entry(location).or_default().push(rate);
        }
    }

    rates
        .into_iter()
        .filter_map(|(neighborhood, rates)| {
            let (lat, lon) = cache.coordinates(neighborhood)?;
            let count = rates.len();
            Some(MapPoint {
                neighborhood: neighborhood.to_string(),
                lat,
                lon,
                mean_rate: mean(rates)?,
                count,
            })
        })
        .collect()
}
