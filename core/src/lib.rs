pub mod aggregator;
pub mod context;
pub mod db;
pub mod error;
pub mod inference;
pub mod models;
pub mod orchestrator;
pub mod store;
pub mod thresholds;
