//! Filter engine: narrows the record set by neighborhood, restaurant type and cuisine.
//! AND across dimensions, OR within one. An empty set means no restriction.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::data::record::Restaurant;

/// The user's current filter choices. Passed explicitly; never global.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterSelection {
    #[serde(default)]
    pub neighborhoods: BTreeSet<String>,
    #[serde(default)]
    pub rest_types: BTreeSet<String>,
    #[serde(default)]
    pub cuisines: BTreeSet<String>,
}

impl FilterSelection {
    pub fn reset(&mut self) {
        self.neighborhoods.clear();
        self.rest_types.clear();
        self.cuisines.clear();
    }

    pub fn is_unrestricted(&self) -> bool {
        self.neighborhoods.is_empty() && self.rest_types.is_empty() && self.cuisines.is_empty()
    }

    pub fn matches(&self, record: &Restaurant) -> bool {
        matches_exact(&self.neighborhoods, record.location.as_deref())
            && matches_exact(&self.rest_types, record.rest_type.as_deref())
            && self.matches_cuisine(record)
    }

    fn matches_cuisine(&self, record: &Restaurant) -> bool {
        if self.cuisines.is_empty() {
            return true;
        }
        let mut tokens = record.cuisine_tokens();
        tokens.any(|token| self.cuisines.contains(token))
    }
}

fn matches_exact(selected: &BTreeSet<String>, value: Option<&str>) -> bool {
    if selected.is_empty() {
        return true;
    }
    value.is_some_and(|value| selected.contains(value))
}

/// Records that satisfy `selection`, in input order. Each record
/// appears at most once even if several of its cuisines are selected.
pub fn filter_records(records: &[Restaurant], selection: &FilterSelection) -> Vec<Restaurant> {
    if selection.is_unrestricted() {
        return records.to_vec();
    }
    records
        .iter()
        .filter(|record| selection.matches(record))
        .cloned()
        .collect()
}

/// Distinct values observed in the full record set, for building selections.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FilterDomains {
    pub neighborhoods: Vec<String>,
    pub rest_types: Vec<String>,
    pub cuisines: Vec<String>,
}

impl FilterDomains {
    pub fn observe(records: &[Restaurant]) -> Self {
        let mut neighborhoods = BTreeSet::new();
        let mut rest_types = BTreeSet::new();
        let mut cuisines = BTreeSet::new();
        for record in records {
            if let Some(location) = &record.location {
                neighborhoods.insert(location.clone());
            }
            if let Some(rest_type) = &record.rest_type {
                rest_types.insert(rest_type.clone());
            }
            cuisines.extend(record.cuisine_tokens().map(str::to_string));
        }
        Self {
            neighborhoods: neighborhoods.into_iter().collect(),
            rest_types: rest_types.into_iter().collect(),
            cuisines: cuisines.into_iter().collect(),
        }
    }

    /// Selected values that no longer appear in the data. They are kept in the
    /// selection but match nothing.
    pub fn stale_values(&self, selection: &FilterSelection) -> Vec<String> {
        let stale = |selected: &BTreeSet<String>, domain: &[String]| {
            selected
                .iter()
                .filter(|value| domain.binary_search(*value).is_err())
                .cloned()
                .collect::<Vec<_>>()
        };
        let mut values = stale(&selection.neighborhoods, &self.neighborhoods);
        values.extend(stale(&selection.rest_types, &self.rest_types));
        values.extend(stale(&selection.cuisines, &self.cuisines));
        values
    }
}
