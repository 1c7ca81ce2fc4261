//! Restaurant listing record and the field coercions applied at ingest.
//! Malformed numeric cells become `None` rather than errors.

use serde::{Deserialize, Serialize};

pub const MAX_RATE: f64 = 5.0;

/// A stored restaurant listing. `id` is assigned by the store on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub id: i64,
    pub name: String,
    pub online_order: Option<bool>,
    pub rate: Option<f64>,
    pub votes: Option<u32>,
    pub location: Option<String>,
    pub rest_type: Option<String>,
    pub dish_liked: Option<String>,
    pub cuisines: Option<String>,
    pub approx_cost: Option<f64>,
    pub listed_type: Option<String>,
    pub listed_city: Option<String>,
}

/// A record as parsed from an export, before the store assigns an id.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NewRestaurant {
    pub name: String,
    pub online_order: Option<bool>,
    pub rate: Option<f64>,
    pub votes: Option<u32>,
    pub location: Option<String>,
    pub rest_type: Option<String>,
    pub dish_liked: Option<String>,
    pub cuisines: Option<String>,
    pub approx_cost: Option<f64>,
    pub listed_type: Option<String>,
    pub listed_city: Option<String>,
}

impl NewRestaurant {
    pub fn with_id(self, id: i64) -> Restaurant {
        Restaurant {
            id,
            name: self.name,
            online_order: self.online_order,
            rate: self.rate,
            votes: self.votes,
            location: self.location,
            rest_type: self.rest_type,
            dish_liked: self.dish_liked,
            cuisines: self.cuisines,
            approx_cost: self.approx_cost,
            listed_type: self.listed_type,
            listed_city: self.listed_city,
        }
    }
}

impl Restaurant {
    /// Individual cuisines, split on commas and trimmed. Empty tokens are skipped.
    pub fn cuisine_tokens(&self) -> impl Iterator<Item = &str> {
        split_list(self.cuisines.as_deref())
    }

    /// Liked dishes, trimmed and lowercased. Duplicates within the field are kept.
    pub fn dish_tokens(&self) -> impl Iterator<Item = String> + '_ {
        split_list(self.dish_liked.as_deref()).map(str::to_lowercase)
    }

    pub fn votes_or_zero(&self) -> u64 {
        u64::from(self.votes.unwrap_or(0))
    }
}

fn split_list(raw: Option<&str>) -> impl Iterator<Item = &str> {
    raw.unwrap_or("")
        .split(',')
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Trimmed text cell; empty becomes `None`.
pub fn parse_text(raw: Option<&str>) -> Option<String> {
    raw.map(str::trim)
        .filter(|value| !value.is_empty())
        .map(str::to_string)
}

/// Accepts `4.1` and `4.1/5`. `NEW`, `-` and anything outside 0..=5 are null.
pub fn parse_rate(raw: Option<&str>) -> Option<f64> {
    let value = raw?.trim();
    let value = value.split('/').next().unwrap_or(value).trim();
    let rate = value.parse::<f64>().ok()?;
    if rate.is_finite() && (0.0..=MAX_RATE).contains(&rate) {
        Some(rate)
    } else {
        None
    }
}

pub fn parse_votes(raw: Option<&str>) -> Option<u32> {
    let value = raw?.trim();
    if let Ok(votes) = value.parse::<u32>() {
        return Some(votes);
    }
    // Spreadsheet exports sometimes write integer columns as `12.0`.
    let float = value.parse::<f64>().ok()?;
    if float.is_finite() && float >= 0.0 && float.fract() == 0.0 && float <= f64::from(u32::MAX) {
        Some(float as u32)
    } else {
        None
    }
}

/// Accepts `800` and `1,200`. Negative and non-numeric values are null.
pub fn parse_cost(raw: Option<&str>) -> Option<f64> {
    let value: String = raw?.trim().chars().filter(|c| *c != ',').collect();
    let cost = value.parse::<f64>().ok()?;
    if cost.is_finite() && cost >= 0.0 {
        Some(cost)
    } else {
        None
    }
}

pub fn parse_yes_no(raw: Option<&str>) -> Option<bool> {
    let value = raw?.trim();
    if value.eq_ignore_ascii_case("yes") {
        Some(true)
    } else if value.eq_ignore_ascii_case("no") {
        Some(false)
    } else {
        None
    }
}

pub fn yes_no_token(value: Option<bool>) -> Option<&'static str> {
    value.map(|flag| if flag { "Yes" } else { "No" })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn with_lists(cuisines: Option<&str>, dishes: Option<&str>) -> Restaurant {
        NewRestaurant {
            name: "Test".to_string(),
            cuisines: cuisines.map(str::to_string),
            dish_liked: dishes.map(str::to_string),
            ..NewRestaurant::default()
        }
        .with_id(1)
    }

    #[test]
    fn rate_accepts_out_of_five_suffix_and_rejects_placeholders() {
        assert_eq!(parse_rate(Some("4.1/5")), Some(4.1));
        assert_eq!(parse_rate(Some(" 3.8 /5")), Some(3.8));
        assert_eq!(parse_rate(Some("4")), Some(4.0));
        assert_eq!(parse_rate(Some("NEW")), None);
        assert_eq!(parse_rate(Some("-")), None);
        assert_eq!(parse_rate(Some("7.5")), None);
        assert_eq!(parse_rate(None), None);
    }

    #[test]
    fn cost_strips_thousands_separator() {
        assert_eq!(parse_cost(Some("1,200")), Some(1200.0));
        assert_eq!(parse_cost(Some("800")), Some(800.0));
        assert_eq!(parse_cost(Some("-5")), None);
        assert_eq!(parse_cost(Some("cheap")), None);
    }

    #[test]
    fn votes_accepts_integral_floats_only() {
        assert_eq!(parse_votes(Some("775")), Some(775));
        assert_eq!(parse_votes(Some("12.0")), Some(12));
        assert_eq!(parse_votes(Some("12.5")), None);
        assert_eq!(parse_votes(Some("-3")), None);
    }

    #[test]
    fn yes_no_is_case_insensitive() {
        assert_eq!(parse_yes_no(Some("Yes")), Some(true));
        assert_eq!(parse_yes_no(Some("NO")), Some(false));
        assert_eq!(parse_yes_no(Some("maybe")), None);
        assert_eq!(yes_no_token(Some(true)), Some("Yes"));
    }

    #[test]
    fn cuisine_tokens_are_trimmed_and_skip_empty() {
        let record = with_lists(Some(" North Indian,Chinese , ,Biryani"), None);
        let tokens: Vec<&str> = record.cuisine_tokens().collect();
        assert_eq!(tokens, vec!["North Indian", "Chinese", "Biryani"]);
    }

    #[test]
    fn dish_tokens_are_lowercased_and_keep_duplicates() {
        let record = with_lists(None, Some("Pizza, pasta ,PIZZA"));
        let tokens: Vec<String> = record.dish_tokens().collect();
        assert_eq!(tokens, vec!["pizza", "pasta", "pizza"]);
    }
}
