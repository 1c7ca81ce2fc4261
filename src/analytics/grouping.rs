//! Grouped aggregates over one or two categorical dimensions, plus top-N ranking.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::analytics::bands::CostBands;
use crate::analytics::metrics::mean;
use crate::data::record::Restaurant;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dimension {
    Neighborhood,
    RestType,
    City,
    ListedType,
    CostBand,
    Rating,
    Name,
}

/// Sort position plus display label. Text keys sort by label; bands by edge
/// order; ratings numerically.
type KeyPart = (u64, String);

impl Dimension {
    fn key(self, record: &Restaurant, bands: &CostBands) -> Option<KeyPart> {
        let text = |value: &Option<String>| value.as_ref().map(|v| (0, v.clone()));
        match self {
            Self::Neighborhood => text(&record.location),
            Self::RestType => text(&record.rest_type),
            Self::City => text(&record.listed_city),
            Self::ListedType => text(&record.listed_type),
            Self::Name => Some((0, record.name.clone())),
            Self::CostBand => {
                let index = bands.band_index(record.approx_cost?)?;
                Some((index as u64, bands.label(index)))
            }
            Self::Rating => {
                let rate = record.rate?;
                let tenths = (rate * 10.0).round();
                Some((tenths as u64, format!("{:.1}", tenths / 10.0)))
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GroupStats {
    pub keys: Vec<String>,
    pub count: usize,
    pub mean_rate: Option<f64>,
    pub total_votes: u64,
    pub mean_cost: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankBy {
    Count,
    Votes,
    MeanRate,
}

/// Groups the valid subset (rate and cost present, every key present) and
/// returns the groups in natural key order.
pub fn group_by(records: &[Restaurant], dimensions: &[Dimension], bands: &CostBands) -> Vec<GroupStats> {
    let mut groups: BTreeMap<Vec<KeyPart>, Vec<&Restaurant>> = BTreeMap::new();
    for record in records {
        if record.rate.is_none() || record.approx_cost.is_none() {
            continue;
        }
        let key: Option<Vec<KeyPart>> = dimensions
            .iter()
            .map(|dimension| dimension.key(record, bands))
            .collect();
        if let Some(key) = key {
            groups.entry(key).or_default().push(record);
        }
    }

    groups
        .into_iter()
        .map(|(key, members)| GroupStats {
            keys: key.into_iter().map(|(_, label)| label).collect(),
            count: members.len(),
            mean_rate: mean(members.iter().filter_map(|r| r.rate)),
            total_votes: members.iter().map(|r| r.votes_or_zero()).sum(),
            mean_cost: mean(members.iter().filter_map(|r| r.approx_cost)),
        })
        .collect()
}

/// Stable descending sort by the chosen metric, truncated to `top_n`. Ties keep
/// the incoming (key) order.
pub fn rank_groups(mut groups: Vec<GroupStats>, rank_by: RankBy, top_n: usize) -> Vec<GroupStats> {
    groups.sort_by(|left, right| match rank_by {
        RankBy::Count => right.count.cmp(&left.count),
        RankBy::Votes => right.total_votes.cmp(&left.total_votes),
        RankBy::MeanRate => right
            .mean_rate
            .unwrap_or(f64::NEG_INFINITY)
            .total_cmp(&left.mean_rate.unwrap_or(f64::NEG_INFINITY)),
    });
    groups.truncate(top_n);
    groups
}

pub fn top_groups(
    records: &[Restaurant],
    dimensions: &[Dimension],
    bands: &CostBands,
    rank_by: RankBy,
    top_n: usize,
) -> Vec<GroupStats> {
    rank_groups(group_by(records, dimensions, bands), rank_by, top_n)
}
