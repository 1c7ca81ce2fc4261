//! Filtered record export: `;`-delimited CSV with the store's columns plus the
//! derived `cost_band` and `price_tier` columns.

use std::io::Write;

use crate::analytics::bands::CostBands;
use crate::data::ingest::DELIMITER;
use crate::data::record::{yes_no_token, Restaurant};

const HEADER: [&str; 14] = [
    "id",
    "name",
    "online_order",
    "rate",
    "votes",
    "location",
    "rest_type",
    "dish_liked",
    "cuisines",
    "approx_cost",
    "listed_type",
    "listed_city",
    "cost_band",
    "price_tier",
];

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("failed to write export: {0}")]
    Csv(#[from] csv::Error),
    #[error("failed to flush export: {0}")]
    Io(#[from] std::io::Error),
}

fn number(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

/// Writes `records` to `writer` and returns the number of data rows.
pub fn write_export<W: Write>(
    records: &[Restaurant],
    bands: &CostBands,
    writer: W,
) -> Result<usize, ExportError> {
    let mut csv = csv::WriterBuilder::new()
        .delimiter(DELIMITER)
        .from_writer(writer);
    csv.write_record(HEADER)?;
    for record in records {
        let text = |value: &Option<String>| value.clone().unwrap_or_default();
        csv.write_record([
            record.id.to_string(),
            record.name.clone(),
            yes_no_token(record.online_order).unwrap_or_default().to_string(),
            number(record.rate),
            record.votes.map(|v| v.to_string()).unwrap_or_default(),
            text(&record.location),
            text(&record.rest_type),
            text(&record.dish_liked),
            text(&record.cuisines),
            number(record.approx_cost),
            text(&record.listed_type),
            text(&record.listed_city),
            bands.band_label(record.approx_cost).unwrap_or_default(),
            bands.price_tier(record.approx_cost).unwrap_or_default(),
        ])?;
    }
    csv.flush()?;
    Ok(records.len())
}

/// Export rendered into a string, for HTTP downloads.
pub fn export_to_string(records: &[Restaurant], bands: &CostBands) -> Result<String, ExportError> {
    let mut buffer = Vec::new();
    write_export(records, bands, &mut buffer)?;
    Ok(String::from_utf8_lossy(&buffer).into_owned())
}
