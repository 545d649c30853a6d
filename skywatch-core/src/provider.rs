use crate::model::{Location, WeatherPoint};
use async_trait::async_trait;
use std::fmt::Debug;

pub mod metno;

pub use metno::MetNoProvider;

/// One fetched forecast: the current reading plus the remaining ordered
/// forecast points.
#[derive(Debug, Clone)]
pub struct FetchedForecast {
    pub current: WeatherPoint,
    pub forecast: Vec<WeatherPoint>,
}

/// Abstraction over the remote forecast source. The collector only talks to
/// this trait, so tests can substitute a deterministic provider.
#[async_trait]
pub trait ForecastProvider: Send + Sync + Debug {
    async fn fetch(&self, location: &Location) -> anyhow::Result<FetchedForecast>;
}
