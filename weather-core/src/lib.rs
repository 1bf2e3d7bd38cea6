//! Core library for the `weather` CLI.
//!
//! This crate defines:
//! - Configuration & credentials handling
//! - The upstream client for current conditions and forecast
//! - Persisted unit preference and search history
//! - The query orchestrator that sequences the two upstream calls
//!
//! It is used by `weather-cli`, but can also be reused by other front ends.

pub mod config;
pub mod error;
pub mod location;
pub mod model;
pub mod orchestrator;
pub mod provider;
pub mod store;

pub use config::{ApiMode, Config};
pub use error::WeatherError;
pub use location::{ConfiguredLocation, LocationSource};
pub use model::{
    Coordinates, CurrentObservation, ForecastSlice, LocationQuery, QueryState, UnitSystem,
    WeatherReport,
};
pub use orchestrator::QueryOrchestrator;
pub use provider::{WeatherProvider, provider_from_config};
pub use store::{FileStore, HistoryStore, KeyValueStore, MemoryStore, SearchHistory, UnitStore};
