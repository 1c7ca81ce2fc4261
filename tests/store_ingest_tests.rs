use std::fs;

use bairro::analytics::bands::CostBands;
use bairro::data::export::export_to_string;
use bairro::data::ingest::{ingest_csv, IngestError};
use bairro::data::store::RecordStore;

const EXPORT: &str = "\u{feff}name;online_order;rate;votes;location;rest_type;dish_liked;cuisines;approx_cost(for two people);listed_in(type);listed_in(city)\n\
Jalsa;Yes;4.1/5;775;Banashankari;Casual Dining;Pasta, Lunch Buffet;North Indian, Mughlai, Chinese;800;Buffet;Banashankari\n\
Spice Elephant;Yes;4.1/5;787;Banashankari;Casual Dining;Momos, Lunch Buffet;Chinese, North Indian, Thai;800;Buffet;Banashankari\n\
Addhuri Udupi Bhojana;No;3.7/5;88;Banashankari;Quick Bites;Masala Dosa;South Indian, North Indian;300;Buffet;Banashankari\n\
Grand Village;No;NEW;0;Basavanagudi;Mess;;North Indian, Rajasthani;1,200;Buffet;Banashankari\n";

fn write_export_file(dir: &tempfile::TempDir, name: &str, contents: &str) -> std::path::PathBuf {
    let path = dir.path().join(name);
    fs::write(&path, contents).unwrap();
    path
}

#[test]
fn ingest_appends_every_row_and_coerces_fields() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_export_file(&dir, "zomato.csv", EXPORT);
    let mut store = RecordStore::open(dir.path().join("restaurantes.db")).unwrap();

    let report = ingest_csv(&mut store, &path).unwrap();
    assert_eq!(report.rows_appended, 4);
    assert_eq!(report.rows_in_store, 4);
    assert!(report.missing_columns.is_empty());
    assert!(!report.batch_id.is_empty());

    let records = store.all_records().unwrap();
    assert_eq!(records[0].name, "Jalsa");
    assert_eq!(records[0].rate, Some(4.1));
    assert_eq!(records[2].online_order, Some(false));
    assert_eq!(records[3].rate, None);
    assert_eq!(records[3].approx_cost, Some(1200.0));
    assert_eq!(records[3].dish_liked, None);
    assert!(records.windows(2).all(|pair| pair[0].id < pair[1].id));
}

#[test]
fn ingest_is_append_only() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_export_file(&dir, "zomato.csv", EXPORT);
    let mut store = RecordStore::open_in_memory().unwrap();

    ingest_csv(&mut store, &path).unwrap();
    let second = ingest_csv(&mut store, &path).unwrap();
    assert_eq!(second.rows_appended, 4);
    assert_eq!(second.rows_in_store, 8);
}

#[test]
fn malformed_file_leaves_the_store_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let good = write_export_file(&dir, "good.csv", EXPORT);
    let ragged = write_export_file(
        &dir,
        "ragged.csv",
        "name;rate;votes\nFine;4.0;10\nBroken;3.0\n",
    );
    let unknown = write_export_file(&dir, "unknown.csv", "name;stars\nX;5\n");
    let mut store = RecordStore::open_in_memory().unwrap();
    ingest_csv(&mut store, &good).unwrap();

    assert!(matches!(ingest_csv(&mut store, &ragged), Err(IngestError::Csv(_))));
    assert!(matches!(ingest_csv(&mut store, &unknown), Err(IngestError::Schema(_))));
    assert!(matches!(
        ingest_csv(&mut store, dir.path().join("absent.csv")),
        Err(IngestError::Read(_))
    ));
    assert_eq!(store.record_count().unwrap(), 4);
}

#[test]
fn missing_columns_are_stored_as_null() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_export_file(&dir, "partial.csv", "name;location\nCorner Cafe;BTM\n");
    let mut store = RecordStore::open_in_memory().unwrap();

    let report = ingest_csv(&mut store, &path).unwrap();
    assert!(report.missing_columns.contains(&"rate".to_string()));
    let records = store.all_records().unwrap();
    assert_eq!(records[0].location.as_deref(), Some("BTM"));
    assert_eq!(records[0].rate, None);
    assert_eq!(records[0].votes, None);
}

#[test]
fn summary_view_aggregates_per_location_and_city() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_export_file(&dir, "zomato.csv", EXPORT);
    let mut store = RecordStore::open_in_memory().unwrap();
    ingest_csv(&mut store, &path).unwrap();

    let summary = store.neighborhood_summary().unwrap();
    assert_eq!(summary.len(), 2);
    let top = &summary[0];
    assert_eq!(top.location.as_deref(), Some("Banashankari"));
    assert_eq!(top.total_restaurants, 3);
    assert_eq!(top.total_votes, 775 + 787 + 88);
    let mean_rate = top.mean_rate.unwrap();
    assert!((mean_rate - (4.1 + 4.1 + 3.7) / 3.0).abs() < 1e-9);

    let basavanagudi = &summary[1];
    assert_eq!(basavanagudi.mean_rate, None);
    assert_eq!(basavanagudi.mean_cost, Some(1200.0));
}

#[test]
fn stored_records_export_with_band_and_tier() {
    let dir = tempfile::tempdir().unwrap();
    let path = write_export_file(&dir, "zomato.csv", EXPORT);
    let mut store = RecordStore::open_in_memory().unwrap();
    ingest_csv(&mut store, &path).unwrap();

    let exported = export_to_string(&store.all_records().unwrap(), &CostBands::default()).unwrap();
    let lines: Vec<&str> = exported.lines().collect();
    assert_eq!(lines.len(), 5);
    assert!(lines[0].starts_with("id;name;online_order;rate"));
    assert!(lines[0].ends_with(";cost_band;price_tier"));
    assert!(lines[3].ends_with(";200-400;$$$"));
    assert!(lines[4].ends_with(";1000-2000;$$$$$$"));
}
