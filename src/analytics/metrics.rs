use serde::Serialize;

use crate::data::record::Restaurant;

/// Headline numbers for the filtered set. Means are `None` when no record
/// carries the field, so an empty selection never produces NaN.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HeadlineMetrics {
    pub count: usize,
    pub mean_rate: Option<f64>,
    pub total_votes: u64,
    pub mean_cost: Option<f64>,
}

pub fn headline_metrics(records: &[Restaurant]) -> HeadlineMetrics {
    HeadlineMetrics {
        count: records.len(),
        mean_rate: mean(records.iter().filter_map(|r| r.rate)),
        total_votes: records.iter().map(Restaurant::votes_or_zero).sum(),
        mean_cost: mean(records.iter().filter_map(|r| r.approx_cost)),
    }
}

/// Arithmetic mean of the values, or `None` for an empty iterator.
pub fn mean(values: impl IntoIterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values
        .into_iter()
        .fold((0.0, 0usize), |(sum, count), value| (sum + value, count + 1));
    (count > 0).then(|| sum / count as f64)
}
