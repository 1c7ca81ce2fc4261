pub mod bands;
pub mod dishes;
pub mod filter;
pub mod grouping;
pub mod map;
pub mod metrics;
pub mod report;

pub use bands::{BandCount, CostBands};
pub use filter::{filter_records, FilterDomains, FilterSelection};
pub use report::{build_report, DashboardReport};
