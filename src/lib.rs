pub mod analytics;
pub mod cli;
pub mod config;
pub mod data;
pub mod geo;
pub mod server;
