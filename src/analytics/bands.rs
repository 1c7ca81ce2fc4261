//! Cost-band bucketing over caller-supplied edges.
//!
//! Bands are half-open `[lo, hi)` except the last, which also includes its upper
//! edge. A cost below the first edge, above the last edge, or missing falls in
//! no band.

use serde::Serialize;

use crate::data::record::Restaurant;

pub const DEFAULT_COST_EDGES: [f64; 8] = [0.0, 100.0, 200.0, 400.0, 600.0, 1000.0, 2000.0, 5000.0];

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CostBandError {
    #[error("cost bands need at least two edges, got {0}")]
    TooFewEdges(usize),
    #[error("cost band edge at index {0} is not a finite number")]
    NonFinite(usize),
    #[error("cost band edges must be strictly increasing (at index {0})")]
    NotIncreasing(usize),
}

#[derive(Debug, Clone, PartialEq)]
pub struct CostBands {
    edges: Vec<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BandCount {
    pub label: String,
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

impl Default for CostBands {
    fn default() -> Self {
        Self {
            edges: DEFAULT_COST_EDGES.to_vec(),
        }
    }
}

impl CostBands {
    pub fn new(edges: Vec<f64>) -> Result<Self, CostBandError> {
        if edges.len() < 2 {
            return Err(CostBandError::TooFewEdges(edges.len()));
        }
        if let Some(index) = edges.iter().position(|edge| !edge.is_finite()) {
            return Err(CostBandError::NonFinite(index));
        }
        if let Some(index) = edges.windows(2).position(|pair| pair[0] >= pair[1]) {
            return Err(CostBandError::NotIncreasing(index + 1));
        }
        Ok(Self { edges })
    }

    /// Uses `edges` and appends the largest cost in `records` as the final edge,
    /// so every non-null cost at or above the first edge lands in a band. If the
    /// data maximum does not exceed the last given edge, the edges are used as is.
    pub fn up_to_max(mut edges: Vec<f64>, records: &[Restaurant]) -> Result<Self, CostBandError> {
        let max_cost = records
            .iter()
            .filter_map(|r| r.approx_cost)
            .fold(None, |max: Option<f64>, cost| Some(max.map_or(cost, |m| m.max(cost))));
        if let Some(max_cost) = max_cost {
            if edges.last().map_or(true, |last| max_cost > *last) {
                edges.push(max_cost);
            }
        }
        Self::new(edges)
    }

    pub fn edges(&self) -> &[f64] {
        &self.edges
    }

    pub fn len(&self) -> usize {
        self.edges.len() - 1
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the band containing `cost`.
    pub fn band_index(&self, cost: f64) -> Option<usize> {
        if !cost.is_finite() {
            return None;
        }
        let last = self.len() - 1;
        (0..self.len()).find(|&index| {
            let lower = self.edges[index];
            let upper = self.edges[index + 1];
            cost >= lower && (cost < upper || (index == last && cost == upper))
        })
    }

    pub fn label(&self, index: usize) -> String {
        format!(
            "{}-{}",
            format_edge(self.edges[index]),
            format_edge(self.edges[index + 1])
        )
    }

    pub fn band_label(&self, cost: Option<f64>) -> Option<String> {
        cost.and_then(|cost| self.band_index(cost))
            .map(|index| self.label(index))
    }

    /// Count of records per band, every band included, in edge order.
    pub fn band_counts(&self, records: &[Restaurant]) -> Vec<BandCount> {
        let mut counts = vec![0usize; self.len()];
        for cost in records.iter().filter_map(|r| r.approx_cost) {
            if let Some(index) = self.band_index(cost) {
                counts[index] += 1;
            }
        }
        counts
            .into_iter()
            .enumerate()
            .map(|(index, count)| BandCount {
                label: self.label(index),
                lower: self.edges[index],
                upper: self.edges[index + 1],
                count,
            })
            .collect()
    }

    /// `$` repeated once per band position: band 0 is `$`, band 2 is `$$$`.
    pub fn price_tier(&self, cost: Option<f64>) -> Option<String> {
        cost.and_then(|cost| self.band_index(cost))
            .map(|index| "$".repeat(index + 1))
    }
}

fn format_edge(edge: f64) -> String {
    if edge.fract() == 0.0 {
        format!("{}", edge as i64)
    } else {
        format!("{edge}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejects_unsorted_or_short_edges() {
        assert_eq!(CostBands::new(vec![0.0]), Err(CostBandError::TooFewEdges(1)));
        assert_eq!(
            CostBands::new(vec![0.0, 200.0, 100.0]),
            Err(CostBandError::NotIncreasing(2))
        );
        assert!(CostBands::new(vec![0.0, 0.0]).is_err());
    }

    #[test]
    fn non_finite_edge_reports_its_own_index() {
        assert_eq!(
            CostBands::new(vec![f64::NAN, 100.0, 200.0]),
            Err(CostBandError::NonFinite(0))
        );
        assert_eq!(
            CostBands::new(vec![0.0, 100.0, f64::INFINITY]),
            Err(CostBandError::NonFinite(2))
        );
    }

    #[test]
    fn band_boundaries_are_half_open_except_the_last() {
        let bands = CostBands::new(vec![0.0, 100.0, 200.0]).unwrap();
        assert_eq!(bands.band_index(0.0), Some(0));
        assert_eq!(bands.band_index(99.9), Some(0));
        assert_eq!(bands.band_index(100.0), Some(1));
        assert_eq!(bands.band_index(200.0), Some(1));
        assert_eq!(bands.band_index(200.1), None);
        assert_eq!(bands.band_index(-1.0), None);
    }

    #[test]
    fn labels_and_tiers() {
        let bands = CostBands::new(vec![0.0, 50.0, 100.5]).unwrap();
        assert_eq!(bands.label(0), "0-50");
        assert_eq!(bands.label(1), "50-100.5");
        assert_eq!(bands.price_tier(Some(75.0)).as_deref(), Some("$$"));
        assert_eq!(bands.price_tier(None), None);
    }
}
