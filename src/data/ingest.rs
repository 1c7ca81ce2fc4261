//! CSV ingest: parses a `;`-delimited listings export and appends it to the store
//! in one transaction. Any structural problem aborts the whole file.

use std::collections::HashMap;
use std::fs;
use std::path::Path;

use serde::Serialize;
use tracing::{info, warn};
use uuid::Uuid;

use crate::data::record::{
    parse_cost, parse_rate, parse_text, parse_votes, parse_yes_no, NewRestaurant,
};
use crate::data::store::{RecordStore, StoreError};

pub const DELIMITER: u8 = b';';

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Column {
    Name,
    OnlineOrder,
    Rate,
    Votes,
    Location,
    RestType,
    DishLiked,
    Cuisines,
    ApproxCost,
    ListedType,
    ListedCity,
}

impl Column {
    fn from_header(header: &str) -> Option<Self> {
        let column = match header.trim().to_ascii_lowercase().as_str() {
            "name" => Self::Name,
            "online_order" => Self::OnlineOrder,
            "rate" => Self::Rate,
            "votes" => Self::Votes,
            "location" => Self::Location,
            "rest_type" => Self::RestType,
            "dish_liked" => Self::DishLiked,
            "cuisines" => Self::Cuisines,
            "approx_cost" | "approx_cost(for two people)" => Self::ApproxCost,
            "listed_type" | "listed_in(type)" => Self::ListedType,
            "listed_city" | "listed_in(city)" => Self::ListedCity,
            _ => return None,
        };
        Some(column)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum IngestError {
    #[error("failed to read ingest file: {0}")]
    Read(#[from] std::io::Error),
    #[error("ingest file is not valid UTF-8: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
    #[error("malformed CSV: {0}")]
    Csv(#[from] csv::Error),
    #[error("schema mismatch: {0}")]
    Schema(String),
    #[error(transparent)]
    Store(#[from] StoreError),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct IngestReport {
    pub batch_id: String,
    pub ingested_at: String,
    pub source_path: String,
    pub rows_appended: usize,
    pub rows_in_store: u64,
    /// Known columns absent from the header; those fields are stored as null.
    pub missing_columns: Vec<String>,
}

/// Parses the full export text. An optional UTF-8 byte-order mark is ignored.
pub fn parse_export(text: &str) -> Result<(Vec<NewRestaurant>, Vec<String>), IngestError> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(DELIMITER)
        .has_headers(true)
        .flexible(false)
        .from_reader(text.as_bytes());

    let headers = reader.headers()?.clone();
    let columns = map_header(&headers)?;
    let missing = missing_columns(&columns);

    let mut records = Vec::new();
    for row in reader.records() {
        let row = row?;
        let cell = |column: Column| columns.get(&column).and_then(|&index| row.get(index));
        records.push(NewRestaurant {
            name: parse_text(cell(Column::Name)).unwrap_or_default(),
            online_order: parse_yes_no(cell(Column::OnlineOrder)),
            rate: parse_rate(cell(Column::Rate)),
            votes: parse_votes(cell(Column::Votes)),
            location: parse_text(cell(Column::Location)),
            rest_type: parse_text(cell(Column::RestType)),
            dish_liked: parse_text(cell(Column::DishLiked)),
            cuisines: parse_text(cell(Column::Cuisines)),
            approx_cost: parse_cost(cell(Column::ApproxCost)),
            listed_type: parse_text(cell(Column::ListedType)),
            listed_city: parse_text(cell(Column::ListedCity)),
        });
    }
    Ok((records, missing))
}

fn map_header(headers: &csv::StringRecord) -> Result<HashMap<Column, usize>, IngestError> {
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(IngestError::Schema("header row is empty".to_string()));
    }
    let mut columns = HashMap::new();
    for (index, header) in headers.iter().enumerate() {
        let Some(column) = Column::from_header(header) else {
            return Err(IngestError::Schema(format!(
                "unknown column '{}'",
                header.trim()
            )));
        };
        if columns.insert(column, index).is_some() {
            return Err(IngestError::Schema(format!(
                "duplicate column '{}'",
                header.trim()
            )));
        }
    }
    Ok(columns)
}

fn missing_columns(columns: &HashMap<Column, usize>) -> Vec<String> {
    const ALL: [(Column, &str); 11] = [
        (Column::Name, "name"),
        (Column::OnlineOrder, "online_order"),
        (Column::Rate, "rate"),
        (Column::Votes, "votes"),
        (Column::Location, "location"),
        (Column::RestType, "rest_type"),
        (Column::DishLiked, "dish_liked"),
        (Column::Cuisines, "cuisines"),
        (Column::ApproxCost, "approx_cost"),
        (Column::ListedType, "listed_type"),
        (Column::ListedCity, "listed_city"),
    ];
    ALL.iter()
        .filter(|(column, _)| !columns.contains_key(column))
        .map(|(_, name)| (*name).to_string())
        .collect()
}

/// Reads, parses and appends the export at `path`. Nothing is written unless
/// the whole file parses and the transaction commits.
pub fn ingest_csv(store: &mut RecordStore, path: impl AsRef<Path>) -> Result<IngestReport, IngestError> {
    let path = path.as_ref();
    let batch_id = Uuid::new_v4().to_string();
    let raw = fs::read(path)?;
    let text = String::from_utf8(raw)?;
    let (records, missing_columns) = parse_export(&text)?;
    if !missing_columns.is_empty() {
        warn!(batch = %batch_id, missing = ?missing_columns, "ingest header lacks known columns; storing null");
    }

    let rows_appended = store.insert_all(&records)?;
    let rows_in_store = store.record_count()?;
    info!(
        batch = %batch_id,
        path = %path.display(),
        rows_appended,
        rows_in_store,
        "ingest complete"
    );

    Ok(IngestReport {
        batch_id,
        ingested_at: chrono::Utc::now().to_rfc3339(),
        source_path: path.display().to_string(),
        rows_appended,
        rows_in_store,
        missing_columns,
    })
}
