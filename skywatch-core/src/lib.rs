//! Core library for the `skywatch` CLI.
//!
//! This crate defines:
//! - Configuration loading & validation
//! - Forecast collection over a bounded worker pool
//! - The analysis engine (trends, anomalies, patterns, statistics)
//! - File-based persistence shared with the orchestrator
//!
//! It is used by `skywatch-cli`, but can also be reused by other binaries or services.

pub mod analysis;
pub mod collector;
pub mod config;
pub mod model;
pub mod provider;
pub mod store;

pub use analysis::AnalysisEngine;
pub use collector::Collector;
pub use config::{CollectionStrategy, Config};
pub use model::{AnalysisResult, Location, LocationData, WeatherPoint, WeatherResult};
pub use provider::{FetchedForecast, ForecastProvider, MetNoProvider};
