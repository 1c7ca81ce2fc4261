//! One dashboard view: every pipeline evaluated over the same filtered set.
//! Pipelines are independent, so they run on the rayon pool.

use serde::Serialize;

use crate::analytics::bands::{BandCount, CostBandError};
use crate::analytics::dishes::{top_dishes, DishCount};
use crate::analytics::filter::{filter_records, FilterSelection};
use crate::analytics::grouping::{top_groups, Dimension, GroupStats, RankBy};
use crate::analytics::map::{neighborhood_map, MapPoint};
use crate::analytics::metrics::{headline_metrics, HeadlineMetrics};
use crate::config::{DashboardConfig, Theme};
use crate::data::record::Restaurant;
use crate::geo::cache::GeocodeCache;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardReport {
    pub selection: FilterSelection,
    pub theme: Theme,
    /// True when the selection leaves no records; charts should show "no data".
    pub empty: bool,
    pub metrics: HeadlineMetrics,
    pub cost_bands: Vec<BandCount>,
    pub neighborhood_by_type: Vec<GroupStats>,
    pub neighborhoods_by_votes: Vec<GroupStats>,
    pub top_restaurants: Vec<GroupStats>,
    pub band_by_rating: Vec<GroupStats>,
    pub top_dishes: Vec<DishCount>,
    pub map: Vec<MapPoint>,
}

pub fn build_report(
    records: &[Restaurant],
    selection: &FilterSelection,
    config: &DashboardConfig,
    cache: &GeocodeCache,
) -> Result<DashboardReport, CostBandError> {
    let filtered = filter_records(records, selection);
    let bands = config.bands_for(&filtered)?;
    let top_n = config.top_groups;

    let ((metrics, cost_bands), ((neighborhood_by_type, neighborhoods_by_votes), rest)) = rayon::join(
        || (headline_metrics(&filtered), bands.band_counts(&filtered)),
        || {
            rayon::join(
                || {
                    rayon::join(
                        || {
                            top_groups(
                                &filtered,
                                &[Dimension::Neighborhood, Dimension::RestType],
                                &bands,
                                RankBy::Count,
                                top_n,
                            )
                        },
                        || {
                            top_groups(&filtered, &[Dimension::Neighborhood], &bands, RankBy::Votes, top_n)
                        },
                    )
                },
                || {
                    let top_restaurants = top_groups(
                        &filtered,
                        &[Dimension::Name],
                        &bands,
                        RankBy::Votes,
                        config.top_restaurants,
                    );
                    let band_by_rating = top_groups(
                        &filtered,
                        &[Dimension::CostBand, Dimension::Rating],
                        &bands,
                        RankBy::Count,
                        top_n,
                    );
                    let dishes = top_dishes(&filtered, config.top_dishes);
                    let map = neighborhood_map(&filtered, cache);
                    (top_restaurants, band_by_rating, dishes, map)
                },
            )
        },
    );
    let (top_restaurants, band_by_rating, top_dishes, map) = rest;

    Ok(DashboardReport {
        selection: selection.clone(),
        theme: config.theme,
        empty: filtered.is_empty(),
        metrics,
        cost_bands,
        neighborhood_by_type,
        neighborhoods_by_votes,
        top_restaurants,
        band_by_rating,
        top_dishes,
        map,
    })
}
