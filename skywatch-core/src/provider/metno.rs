use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::warn;

use crate::{
    config::ApiConfig,
    model::{Location, WeatherPoint},
};

use super::{FetchedForecast, ForecastProvider};

/// Client for the met.no locationforecast API: one GET per location with
/// `lat`/`lon` query parameters and a mandatory User-Agent header.
#[derive(Debug, Clone)]
pub struct MetNoProvider {
    base_url: String,
    user_agent: String,
    max_retries: u32,
    retry_delay: Duration,
    http: Client,
}

impl MetNoProvider {
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
            max_retries: config.max_retries,
            retry_delay: config.retry_delay(),
            http,
        })
    }

    async fn fetch_once(&self, location: &Location) -> Result<FetchedForecast> {
        let res = self
            .http
            .get(&self.base_url)
            .query(&[
                ("lat", format!("{:.4}", location.lat)),
                ("lon", format!("{:.4}", location.lon)),
            ])
            .header(reqwest::header::USER_AGENT, &self.user_agent)
            .send()
            .await
            .with_context(|| format!("HTTP request failed for '{}'", location.name))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .context("Failed to read weather API response body")?;

        if !status.is_success() {
            return Err(anyhow!(
                "API returned status {} for '{}': {}",
                status,
                location.name,
                truncate_body(&body),
            ));
        }

        parse_forecast(&body)
    }
}

#[async_trait]
impl ForecastProvider for MetNoProvider {
    async fn fetch(&self, location: &Location) -> Result<FetchedForecast> {
        let mut attempt = 0;
        loop {
            match self.fetch_once(location).await {
                Ok(fetched) => return Ok(fetched),
                Err(err) if attempt < self.max_retries => {
                    attempt += 1;
                    warn!(
                        location = %location.name,
                        attempt,
                        max_retries = self.max_retries,
                        error = %err,
                        "fetch failed, retrying"
                    );
                    tokio::time::sleep(self.retry_delay).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}

/// Parse a locationforecast response body: the first timeseries entry is
/// the current weather, the remaining entries are the forecast.
fn parse_forecast(body: &str) -> Result<FetchedForecast> {
    let parsed: ApiResponse =
        serde_json::from_str(body).context("Failed to parse weather API JSON")?;

    let mut entries = parsed.properties.timeseries.into_iter().map(into_point);

    let current = entries
        .next()
        .ok_or_else(|| anyhow!("No weather data in API response"))?;

    Ok(FetchedForecast {
        current,
        forecast: entries.collect(),
    })
}

fn into_point(entry: TimeseriesEntry) -> WeatherPoint {
    let details = entry.data.instant.details;
    let next_hour = entry.data.next_1_hours.unwrap_or_default();

    WeatherPoint {
        timestamp: entry.time,
        temperature: details.air_temperature,
        pressure: details.air_pressure_at_sea_level,
        humidity: details.relative_humidity,
        wind_speed: details.wind_speed,
        wind_direction: details.wind_from_direction,
        cloud_cover: details.cloud_area_fraction,
        precipitation_mm: next_hour.details.precipitation_amount,
        precipitation_probability: next_hour.details.probability_of_precipitation,
        symbol_code: next_hour.summary.symbol_code,
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    properties: Properties,
}

#[derive(Debug, Deserialize)]
struct Properties {
    #[serde(default)]
    timeseries: Vec<TimeseriesEntry>,
}

#[derive(Debug, Deserialize)]
struct TimeseriesEntry {
    time: DateTime<Utc>,
    data: EntryData,
}

#[derive(Debug, Deserialize)]
struct EntryData {
    instant: Instant,
    #[serde(default)]
    next_1_hours: Option<NextHours>,
}

#[derive(Debug, Deserialize)]
struct Instant {
    #[serde(default)]
    details: InstantDetails,
}

#[derive(Debug, Default, Deserialize)]
struct InstantDetails {
    #[serde(default)]
    air_temperature: f64,
    #[serde(default)]
    air_pressure_at_sea_level: f64,
    #[serde(default)]
    relative_humidity: f64,
    #[serde(default)]
    wind_speed: f64,
    #[serde(default)]
    wind_from_direction: f64,
    #[serde(default)]
    cloud_area_fraction: f64,
}

#[derive(Debug, Default, Deserialize)]
struct NextHours {
    #[serde(default)]
    summary: NextSummary,
    #[serde(default)]
    details: NextDetails,
}

#[derive(Debug, Default, Deserialize)]
struct NextSummary {
    #[serde(default)]
    symbol_code: String,
}

#[derive(Debug, Default, Deserialize)]
struct NextDetails {
    #[serde(default)]
    precipitation_amount: f64,
    #[serde(default)]
    probability_of_precipitation: f64,
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    if body.len() <= MAX {
        return body.to_string();
    }
    // Walk back to a char boundary so the slice cannot split a multi-byte
    // character.
    let mut end = MAX;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &body[..end])
}
