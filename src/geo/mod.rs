pub mod cache;
pub mod geocoder;
pub mod populate;

pub use cache::{Coordinates, GeocodeCache, GeocodeState};
pub use geocoder::{GeocodeError, Geocoder, NominatimGeocoder};
pub use populate::{populate_cache, rebuild_cache, run_population, PopulationMode, PopulationReport, Throttle};
