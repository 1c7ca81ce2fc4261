use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::time::Duration;

use bairro::data::record::Restaurant;
use bairro::geo::cache::{Coordinates, GeocodeCache, GeocodeState};
use bairro::geo::geocoder::{GeocodeError, Geocoder};
use bairro::geo::populate::{
    distinct_neighborhoods, populate_cache, run_population, PopulationMode, Throttle,
};

/// Answers from a fixed table and remembers every query it was asked.
struct TableGeocoder {
    known: HashMap<&'static str, (f64, f64)>,
    calls: RefCell<Vec<String>>,
}

impl TableGeocoder {
    fn new(known: &[(&'static str, (f64, f64))]) -> Self {
        Self {
            known: known.iter().copied().collect(),
            calls: RefCell::new(Vec::new()),
        }
    }

    fn calls(&self) -> Vec<String> {
        self.calls.borrow().clone()
    }
}

impl Geocoder for TableGeocoder {
    fn lookup(&self, query: &str) -> Result<(f64, f64), GeocodeError> {
        self.calls.borrow_mut().push(query.to_string());
        self.known
            .get(query)
            .copied()
            .ok_or_else(|| GeocodeError::NotFound(query.to_string()))
    }
}

fn at(id: i64, location: Option<&str>) -> Restaurant {
    Restaurant {
        id,
        name: format!("R{id}"),
        online_order: None,
        rate: Some(4.0),
        votes: None,
        location: location.map(str::to_string),
        rest_type: None,
        dish_liked: None,
        cuisines: None,
        approx_cost: None,
        listed_type: None,
        listed_city: None,
    }
}

#[test]
fn distinct_neighborhoods_keep_first_seen_order_and_skip_null() {
    let records = vec![at(1, Some("BTM")), at(2, None), at(3, Some("HSR")), at(4, Some("BTM"))];
    assert_eq!(distinct_neighborhoods(&records), vec!["BTM", "HSR"]);
}

#[test]
fn absent_or_corrupt_cache_file_loads_empty() {
    let dir = tempfile::tempdir().unwrap();
    let missing = GeocodeCache::load(dir.path().join("nope.json"));
    assert!(missing.is_empty());

    let corrupt_path = dir.path().join("corrupt.json");
    fs::write(&corrupt_path, "{ not json").unwrap();
    assert!(GeocodeCache::load(&corrupt_path).is_empty());
}

#[test]
fn one_failure_does_not_stop_the_batch() {
    let geocoder = TableGeocoder::new(&[("BTM", (12.91, 77.61)), ("HSR", (12.91, 77.64))]);
    let neighborhoods = vec!["BTM".to_string(), "Atlantis".to_string(), "HSR".to_string()];
    let mut cache = GeocodeCache::default();
    let mut throttle = Throttle::new(Duration::ZERO);

    let report = populate_cache(&mut cache, &neighborhoods, &geocoder, &mut throttle, PopulationMode::Full);

    assert_eq!(report.attempted, 3);
    assert_eq!(report.resolved, vec!["BTM", "HSR"]);
    assert_eq!(report.failed, vec!["Atlantis"]);
    assert_eq!(cache.state("BTM"), GeocodeState::Resolved);
    assert_eq!(cache.state("Atlantis"), GeocodeState::Failed);
    assert_eq!(cache.coordinates("HSR"), Some((12.91, 77.64)));
}

#[test]
fn full_mode_looks_up_resolved_entries_again() {
    let geocoder = TableGeocoder::new(&[("BTM", (12.0, 77.0)), ("Atlantis", (1.0, 2.0))]);
    let mut cache = GeocodeCache::default();
    cache.insert("BTM", Coordinates::resolved(12.91, 77.61));
    let neighborhoods = vec!["BTM".to_string(), "Atlantis".to_string()];

    let report = populate_cache(
        &mut cache,
        &neighborhoods,
        &geocoder,
        &mut Throttle::new(Duration::ZERO),
        PopulationMode::Full,
    );

    assert_eq!(geocoder.calls(), vec!["BTM", "Atlantis"]);
    assert_eq!(report.already_resolved, 0);
    assert_eq!(cache.coordinates("BTM"), Some((12.0, 77.0)));
}

#[test]
fn skip_resolved_mode_keeps_resolved_and_retries_failed() {
    let geocoder = TableGeocoder::new(&[("Atlantis", (1.0, 2.0))]);
    let mut cache = GeocodeCache::default();
    cache.insert("BTM", Coordinates::resolved(12.91, 77.61));
    cache.insert("Atlantis", Coordinates::failed());
    let neighborhoods = vec!["BTM".to_string(), "Atlantis".to_string()];

    let report = populate_cache(
        &mut cache,
        &neighborhoods,
        &geocoder,
        &mut Throttle::new(Duration::ZERO),
        PopulationMode::SkipResolved,
    );

    assert_eq!(geocoder.calls(), vec!["Atlantis"]);
    assert_eq!(report.already_resolved, 1);
    assert_eq!(cache.coordinates("Atlantis"), Some((1.0, 2.0)));
}

#[test]
fn run_population_persists_failures_as_empty_objects() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("data").join("coords.json");
    let records = vec![at(1, Some("BTM")), at(2, Some("Atlantis"))];
    let geocoder = TableGeocoder::new(&[("BTM", (12.91, 77.61))]);

    let (cache, report) =
        run_population(&records, &path, &geocoder, Duration::ZERO, PopulationMode::Full).unwrap();
    assert_eq!(report.neighborhoods, 2);
    assert_eq!(cache.len(), 2);

    let saved: serde_json::Value = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["Atlantis"], serde_json::json!({}));
    assert_eq!(saved["BTM"]["lat"], 12.91);
    assert_eq!(saved["BTM"]["lon"], 77.61);
}

#[test]
fn full_run_rebuilds_the_file_instead_of_merging() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coords.json");
    fs::write(
        &path,
        r#"{"Gone": {"lat": 1.0, "lon": 1.0}, "BTM": {"lat": 2.0, "lon": 2.0}}"#,
    )
    .unwrap();
    let records = vec![at(1, Some("BTM")), at(2, Some("HSR"))];
    let geocoder = TableGeocoder::new(&[("BTM", (12.91, 77.61)), ("HSR", (9.0, 9.0))]);

    let (cache, report) =
        run_population(&records, &path, &geocoder, Duration::ZERO, PopulationMode::Full).unwrap();

    assert_eq!(geocoder.calls(), vec!["BTM", "HSR"]);
    assert_eq!(report.attempted, 2);
    assert_eq!(cache.len(), 2);
    let saved = GeocodeCache::load(&path);
    assert_eq!(saved.state("Gone"), GeocodeState::Unresolved);
    assert_eq!(saved.coordinates("BTM"), Some((12.91, 77.61)));
    assert_eq!(saved.coordinates("HSR"), Some((9.0, 9.0)));
}

#[test]
fn full_run_can_regress_a_previously_resolved_entry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coords.json");
    let records = vec![at(1, Some("BTM"))];

    let first = TableGeocoder::new(&[("BTM", (12.91, 77.61))]);
    run_population(&records, &path, &first, Duration::ZERO, PopulationMode::Full).unwrap();

    let offline = TableGeocoder::new(&[]);
    run_population(&records, &path, &offline, Duration::ZERO, PopulationMode::Full).unwrap();

    assert_eq!(offline.calls(), vec!["BTM"]);
    assert_eq!(GeocodeCache::load(&path).state("BTM"), GeocodeState::Failed);
}

#[test]
fn skip_resolved_run_only_looks_up_what_is_still_missing() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coords.json");
    fs::write(&path, r#"{"Gone": {"lat": 1.0, "lon": 1.0}}"#).unwrap();
    let records = vec![at(1, Some("BTM")), at(2, Some("Atlantis"))];

    let first = TableGeocoder::new(&[("BTM", (12.91, 77.61))]);
    run_population(&records, &path, &first, Duration::ZERO, PopulationMode::SkipResolved).unwrap();

    let second = TableGeocoder::new(&[("BTM", (0.0, 0.0)), ("Atlantis", (3.0, 4.0))]);
    let (cache, report) =
        run_population(&records, &path, &second, Duration::ZERO, PopulationMode::SkipResolved).unwrap();

    assert_eq!(second.calls(), vec!["Atlantis"]);
    assert_eq!(report.already_resolved, 1);
    assert_eq!(cache.coordinates("BTM"), Some((12.91, 77.61)));
    let saved = GeocodeCache::load(&path);
    assert_eq!(saved.coordinates("Atlantis"), Some((3.0, 4.0)));
    assert_eq!(saved.state("Gone"), GeocodeState::Unresolved);
}

#[test]
fn save_overwrites_the_previous_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("coords.json");
    fs::write(&path, r#"{"Stale": {"lat": 1.0, "lon": 1.0}}"#).unwrap();

    let mut cache = GeocodeCache::default();
    cache.insert("Fresh", Coordinates::resolved(2.0, 2.0));
    cache.save(&path).unwrap();

    let reloaded = GeocodeCache::load(&path);
    assert_eq!(reloaded.len(), 1);
    assert_eq!(reloaded.state("Stale"), GeocodeState::Unresolved);
    assert_eq!(reloaded.state("Fresh"), GeocodeState::Resolved);
}
