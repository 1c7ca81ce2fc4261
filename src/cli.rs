use std::fs::File;
use std::io::BufWriter;

use crate::analytics::filter::{filter_records, FilterSelection};
use crate::analytics::report::build_report;
use crate::config::AppConfig;
use crate::data::export::write_export;
use crate::data::ingest::ingest_csv;
use crate::data::store::RecordStore;
use crate::geo::cache::GeocodeCache;
use crate::geo::geocoder::NominatimGeocoder;
use crate::geo::populate::{run_population, PopulationMode};
use crate::server::{self, DashboardState};

pub const USAGE: &str = "usage: bairro <serve|ingest|summary|report|export|geocode>";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    Serve,
    Ingest,
    Summary,
    Report,
    Export,
    Geocode,
}

pub fn parse_command(args: &[String]) -> Option<Command> {
    match args.get(1).map(String::as_str) {
        Some("serve") => Some(Command::Serve),
        Some("ingest") => Some(Command::Ingest),
        Some("summary") => Some(Command::Summary),
        Some("report") => Some(Command::Report),
        Some("export") => Some(Command::Export),
        Some("geocode") => Some(Command::Geocode),
        _ => None,
    }
}

pub fn run_with_args(args: &[String]) -> i32 {
    let Some(command) = parse_command(args) else {
        eprintln!("{USAGE}");
        return 2;
    };
    let config = match AppConfig::from_env() {
        Ok(config) => config,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return 1;
        }
    };
    match command {
        Command::Serve => handle_serve(&config),
        Command::Ingest => handle_ingest(&config, args),
        Command::Summary => handle_summary(&config),
        Command::Report => handle_report(&config, args),
        Command::Export => handle_export(&config, args),
        Command::Geocode => handle_geocode(&config, args),
    }
}

/// Collects `--neighborhood`, `--type` and `--cuisine` flags (each repeatable).
pub fn parse_selection(args: &[String]) -> Result<FilterSelection, String> {
    let mut selection = FilterSelection::default();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        let target = match arg.as_str() {
            "--neighborhood" => &mut selection.neighborhoods,
            "--type" => &mut selection.rest_types,
            "--cuisine" => &mut selection.cuisines,
            _ => continue,
        };
        let Some(value) = iter.next() else {
            return Err(format!("{arg} needs a value"));
        };
        target.insert(value.clone());
    }
    Ok(selection)
}

fn open_store(config: &AppConfig) -> Option<RecordStore> {
    match RecordStore::open(&config.db_path) {
        Ok(store) => Some(store),
        Err(err) => {
            eprintln!("store error: {err}");
            None
        }
    }
}

fn handle_serve(config: &AppConfig) -> i32 {
    let Some(store) = open_store(config) else {
        return 1;
    };
    let dashboard = match config.dashboard() {
        Ok(dashboard) => dashboard,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return 1;
        }
    };
    let (records, summary) = match (store.all_records(), store.neighborhood_summary()) {
        (Ok(records), Ok(summary)) => (records, summary),
        (Err(err), _) | (_, Err(err)) => {
            eprintln!("store error: {err}");
            return 1;
        }
    };
    let mut state = DashboardState::new(records, summary, dashboard, config.geocode_cache_path.clone());
    match NominatimGeocoder::new(config.geocoder_url.clone(), config.geocode_suffix.clone()) {
        Ok(geocoder) => state = state.with_geocoder(Box::new(geocoder), config.geocode_interval),
        Err(err) => eprintln!("geocoding disabled: {err}"),
    }

    match server::run_server(&config.bind_addr, state) {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("server error: {err}");
            1
        }
    }
}

fn handle_ingest(config: &AppConfig, args: &[String]) -> i32 {
    let Some(path) = args.get(2) else {
        eprintln!("usage: bairro ingest <path-to-export.csv>");
        return 2;
    };
    let Some(mut store) = open_store(config) else {
        return 1;
    };

    match ingest_csv(&mut store, path) {
        Ok(report) => {
            println!(
                "ingest complete: rows={}, total={}, source='{}'",
                report.rows_appended, report.rows_in_store, report.source_path
            );
            0
        }
        Err(err) => {
            eprintln!("ingest failed: {err}");
            1
        }
    }
}

fn handle_summary(config: &AppConfig) -> i32 {
    let Some(store) = open_store(config) else {
        return 1;
    };
    let summary = match store.neighborhood_summary() {
        Ok(summary) => summary,
        Err(err) => {
            eprintln!("store error: {err}");
            return 1;
        }
    };

    println!("location\tlisted_city\ttotal\tmean_rate\ttotal_votes\tmean_cost");
    for row in summary {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.location.as_deref().unwrap_or("-"),
            row.listed_city.as_deref().unwrap_or("-"),
            row.total_restaurants,
            row.mean_rate.map(|v| format!("{v:.2}")).unwrap_or_else(|| "-".to_string()),
            row.total_votes,
            row.mean_cost.map(|v| format!("{v:.0}")).unwrap_or_else(|| "-".to_string()),
        );
    }
    0
}

fn handle_report(config: &AppConfig, args: &[String]) -> i32 {
    let selection = match parse_selection(&args[2..]) {
        Ok(selection) => selection,
        Err(err) => {
            eprintln!("{err}");
            return 2;
        }
    };
    let Some(store) = open_store(config) else {
        return 1;
    };
    let records = match store.all_records() {
        Ok(records) => records,
        Err(err) => {
            eprintln!("store error: {err}");
            return 1;
        }
    };
    let dashboard = match config.dashboard() {
        Ok(dashboard) => dashboard,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return 1;
        }
    };
    let cache = GeocodeCache::load(&config.geocode_cache_path);

    let report = match build_report(&records, &selection, &dashboard, &cache) {
        Ok(report) => report,
        Err(err) => {
            eprintln!("report failed: {err}");
            return 1;
        }
    };
    match serde_json::to_string_pretty(&report) {
        Ok(payload) => {
            println!("{payload}");
            0
        }
        Err(err) => {
            eprintln!("failed to serialize report: {err}");
            1
        }
    }
}

fn handle_export(config: &AppConfig, args: &[String]) -> i32 {
    let Some(out_path) = args.get(2).filter(|arg| !arg.starts_with("--")) else {
        eprintln!("usage: bairro export <out.csv> [--neighborhood X] [--type T] [--cuisine C]");
        return 2;
    };
    let selection = match parse_selection(&args[3..]) {
        Ok(selection) => selection,
        Err(err) => {
            eprintln!("{err}");
            return 2;
        }
    };
    let Some(store) = open_store(config) else {
        return 1;
    };
    let records = match store.all_records() {
        Ok(records) => records,
        Err(err) => {
            eprintln!("store error: {err}");
            return 1;
        }
    };
    let filtered = filter_records(&records, &selection);
    let bands = match config.dashboard().map_err(|e| e.to_string()).and_then(|d| {
        d.bands_for(&filtered).map_err(|e| e.to_string())
    }) {
        Ok(bands) => bands,
        Err(err) => {
            eprintln!("configuration error: {err}");
            return 1;
        }
    };

    let file = match File::create(out_path) {
        Ok(file) => file,
        Err(err) => {
            eprintln!("export failed: {err}");
            return 1;
        }
    };
    match write_export(&filtered, &bands, BufWriter::new(file)) {
        Ok(rows) => {
            println!("export complete: rows={rows}, path='{out_path}'");
            0
        }
        Err(err) => {
            eprintln!("export failed: {err}");
            1
        }
    }
}

fn handle_geocode(config: &AppConfig, args: &[String]) -> i32 {
    let mode = match args.get(2).map(String::as_str) {
        None => PopulationMode::Full,
        Some("--skip-resolved") => PopulationMode::SkipResolved,
        Some(_) => {
            eprintln!("usage: bairro geocode [--skip-resolved]");
            return 2;
        }
    };
    let Some(store) = open_store(config) else {
        return 1;
    };
    let records = match store.all_records() {
        Ok(records) => records,
        Err(err) => {
            eprintln!("store error: {err}");
            return 1;
        }
    };
    let geocoder = match NominatimGeocoder::new(config.geocoder_url.clone(), config.geocode_suffix.clone()) {
        Ok(geocoder) => geocoder,
        Err(err) => {
            eprintln!("geocoder error: {err}");
            return 1;
        }
    };

    match run_population(&records, &config.geocode_cache_path, &geocoder, config.geocode_interval, mode) {
        Ok((_, report)) => {
            println!(
                "geocode complete: neighborhoods={}, cached={}, resolved={}, failed={}",
                report.neighborhoods,
                report.already_resolved,
                report.resolved.len(),
                report.failed.len()
            );
            0
        }
        Err(err) => {
            eprintln!("geocode failed: {err}");
            1
        }
    }
}
