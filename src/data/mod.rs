pub mod export;
pub mod ingest;
pub mod record;
pub mod store;

pub use record::{NewRestaurant, Restaurant};
pub use store::{NeighborhoodSummary, RecordStore, StoreError};
