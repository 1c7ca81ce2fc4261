//! SQLite-backed record store: the `restaurantes` table plus the
//! `neighborhood_summary` view. Rows are append-only.

use std::path::Path;

use rusqlite::{params, Connection, OpenFlags};
use serde::Serialize;
use tracing::{debug, info};

use crate::data::record::{parse_yes_no, yes_no_token, NewRestaurant, Restaurant};

pub const DEFAULT_DB_PATH: &str = "restaurantes.db";

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS restaurantes (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    name TEXT,
    online_order TEXT,
    rate REAL,
    votes INTEGER,
    location TEXT,
    rest_type TEXT,
    dish_liked TEXT,
    cuisines TEXT,
    approx_cost REAL,
    listed_type TEXT,
    listed_city TEXT
);
CREATE VIEW IF NOT EXISTS neighborhood_summary AS
    SELECT
        location,
        listed_city,
        COUNT(*) AS total_restaurants,
        AVG(rate) AS mean_rate,
        SUM(COALESCE(votes, 0)) AS total_votes,
        AVG(approx_cost) AS mean_cost
    FROM restaurantes
    GROUP BY location, listed_city
    ORDER BY total_restaurants DESC, location, listed_city;
";

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to open record store at '{path}': {source}")]
    Open {
        path: String,
        source: rusqlite::Error,
    },
    #[error("record store query failed: {0}")]
    Query(#[from] rusqlite::Error),
}

/// One row of the `neighborhood_summary` view.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NeighborhoodSummary {
    pub location: Option<String>,
    pub listed_city: Option<String>,
    pub total_restaurants: u64,
    pub mean_rate: Option<f64>,
    pub total_votes: u64,
    pub mean_cost: Option<f64>,
}

pub struct RecordStore {
    conn: Connection,
}

impl RecordStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let flags = OpenFlags::SQLITE_OPEN_READ_WRITE | OpenFlags::SQLITE_OPEN_CREATE;
        let conn = Connection::open_with_flags(path, flags).map_err(|source| StoreError::Open {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), "opened record store");
        Self::with_connection(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory().map_err(|source| StoreError::Open {
            path: ":memory:".to_string(),
            source,
        })?;
        Self::with_connection(conn)
    }

    fn with_connection(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA foreign_keys = ON;")?;
        conn.execute_batch(SCHEMA)?;
        Ok(Self { conn })
    }

    /// Appends every record in one transaction. Either all rows land or none do.
    /// Returns the number of rows written.
    pub fn insert_all(&mut self, records: &[NewRestaurant]) -> Result<usize, StoreError> {
        let tx = self.conn.transaction()?;
        {
            let mut stmt = tx.prepare(
                "INSERT INTO restaurantes (
                    name, online_order, rate, votes, location, rest_type,
                    dish_liked, cuisines, approx_cost, listed_type, listed_city
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.name,
                    yes_no_token(record.online_order),
                    record.rate,
                    record.votes,
                    record.location,
                    record.rest_type,
                    record.dish_liked,
                    record.cuisines,
                    record.approx_cost,
                    record.listed_type,
                    record.listed_city,
                ])?;
            }
        }
        tx.commit()?;
        debug!(rows = records.len(), "appended records");
        Ok(records.len())
    }

    /// Every stored record in insertion (id) order.
    pub fn all_records(&self) -> Result<Vec<Restaurant>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT id, name, online_order, rate, votes, location, rest_type,
                    dish_liked, cuisines, approx_cost, listed_type, listed_city
             FROM restaurantes ORDER BY id",
        )?;
        let rows = stmt.query_map([], |row| {
            let online_order: Option<String> = row.get(2)?;
            Ok(Restaurant {
                id: row.get(0)?,
                name: row.get::<_, Option<String>>(1)?.unwrap_or_default(),
                online_order: parse_yes_no(online_order.as_deref()),
                rate: row.get(3)?,
                votes: row.get(4)?,
                location: row.get(5)?,
                rest_type: row.get(6)?,
                dish_liked: row.get(7)?,
                cuisines: row.get(8)?,
                approx_cost: row.get(9)?,
                listed_type: row.get(10)?,
                listed_city: row.get(11)?,
            })
        })?;
        let records = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(records)
    }

    pub fn record_count(&self) -> Result<u64, StoreError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM restaurantes", [], |row| row.get(0))?;
        Ok(count.max(0) as u64)
    }

    pub fn neighborhood_summary(&self) -> Result<Vec<NeighborhoodSummary>, StoreError> {
        let mut stmt = self.conn.prepare(
            "SELECT location, listed_city, total_restaurants, mean_rate, total_votes, mean_cost
             FROM neighborhood_summary
             ORDER BY total_restaurants DESC, location, listed_city",
        )?;
        let rows = stmt.query_map([], |row| {
            let total_restaurants: i64 = row.get(2)?;
            let total_votes: Option<i64> = row.get(4)?;
            Ok(NeighborhoodSummary {
                location: row.get(0)?,
                listed_city: row.get(1)?,
                total_restaurants: total_restaurants.max(0) as u64,
                mean_rate: row.get(3)?,
                total_votes: total_votes.unwrap_or(0).max(0) as u64,
                mean_cost: row.get(5)?,
            })
        })?;
        let summary = rows.collect::<Result<Vec<_>, _>>()?;
        Ok(summary)
    }
}
