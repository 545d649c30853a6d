//! Deterministic analysis of one location's weather readings.
//!
//! Four independent views (statistics, trends, anomalies, patterns) run
//! over a chronologically sorted copy of the readings and get bundled into
//! a single [`AnalysisResult`]. Every view treats small samples as "nothing
//! to report", never as an error.

use chrono::Utc;
use tracing::debug;

use crate::model::{
    AnalysisResult, AnomalyKind, LocationData, Severity, TrendDirection, WeatherPoint,
    WeatherSummary, WeatherVariable,
};

pub mod anomalies;
pub mod patterns;
pub mod statistics;
pub mod trends;

pub use anomalies::AnomalyDetector;
pub use patterns::{PatternRecognizer, PatternThresholds};
pub use statistics::StatisticalAnalyzer;
pub use trends::TrendAnalyzer;

/// Runs all four analysis views and aggregates their output.
///
/// Pure given its input: the engine sorts an owned copy of the readings and
/// never mutates the caller's data. Separate locations may be analyzed in
/// parallel by the caller; the engine itself is single-threaded.
#[derive(Debug, Default)]
pub struct AnalysisEngine {
    statistics: StatisticalAnalyzer,
    trends: TrendAnalyzer,
    anomalies: AnomalyDetector,
    patterns: PatternRecognizer,
}

impl AnalysisEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(&self, data: &LocationData) -> AnalysisResult {
        let mut readings = data.readings.clone();
        readings.sort_by_key(|p| p.timestamp);

        let trends = self.trends.analyze(&readings);
        let anomalies = self.anomalies.detect(&readings);
        let patterns = self.patterns.recognize(&readings);
        let statistical_data = self.statistics.analyze(&readings);

        debug!(
            location = %data.name,
            readings = readings.len(),
            trends = trends.len(),
            anomalies = anomalies.len(),
            patterns = patterns.len(),
            "analysis complete"
        );

        let weather_summary = summarize(&readings, &trends, &anomalies);

        AnalysisResult {
            analysis_type: "comprehensive_weather_analysis".to_string(),
            timeframe: duration_label(&readings),
            location: data.name.clone(),
            generated_at: Utc::now(),
            trends,
            anomalies,
            patterns,
            weather_summary,
            statistical_data,
        }
    }
}

/// Span of the reading window as "<N>h", or "<N>d" from 24 hours up.
pub(crate) fn duration_label(readings: &[WeatherPoint]) -> String {
    if readings.len() < 2 {
        return "0h".to_string();
    }

    let first = &readings[0];
    let last = &readings[readings.len() - 1];
    let hours = (last.timestamp - first.timestamp).num_hours();

    if hours >= 24 {
        format!("{}d", hours / 24)
    } else {
        format!("{hours}h")
    }
}

pub(crate) fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation: sqrt(sum((x - mean)^2) / n).
pub(crate) fn population_std_dev(values: &[f64], mean: f64) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum_squares: f64 = values.iter().map(|v| (v - mean) * (v - mean)).sum();
    (sum_squares / values.len() as f64).sqrt()
}

const FROST_TEMPERATURE: f64 = 0.0;
const HIGH_WIND_SPEED: f64 = 15.0;

fn summarize(
    readings: &[WeatherPoint],
    trends: &[crate::model::Trend],
    anomalies: &[crate::model::Anomaly],
) -> WeatherSummary {
    let Some(last) = readings.last() else {
        return WeatherSummary::default();
    };

    let mut summary = WeatherSummary {
        current_temp: last.temperature,
        min_temperature: readings[0].temperature,
        max_temperature: readings[0].temperature,
        current_pressure: last.pressure,
        min_pressure: readings[0].pressure,
        max_pressure: readings[0].pressure,
        ..WeatherSummary::default()
    };

    for reading in readings {
        summary.min_temperature = summary.min_temperature.min(reading.temperature);
        summary.max_temperature = summary.max_temperature.max(reading.temperature);
        summary.min_pressure = summary.min_pressure.min(reading.pressure);
        summary.max_pressure = summary.max_pressure.max(reading.pressure);
    }

    summary.confidence = if readings.len() >= 10 {
        0.9
    } else if readings.len() >= 5 {
        0.7
    } else {
        0.5
    };

    let temperature_trend = trends
        .iter()
        .find(|t| t.variable == WeatherVariable::Temperature);
    summary.trend_next_hours = match temperature_trend.map(|t| t.trend) {
        Some(TrendDirection::Rising) => "warming",
        Some(TrendDirection::Falling) => "cooling",
        _ => "stable",
    }
    .to_string();

    let storm_signal = anomalies
        .iter()
        .any(|a| a.kind == AnomalyKind::PressureDrop && a.severity == Severity::High);
    let pressure_rising = trends
        .iter()
        .any(|t| t.variable == WeatherVariable::Pressure && t.trend == TrendDirection::Rising);
    summary.forecast_summary = if storm_signal {
        "storm_approaching"
    } else if pressure_rising {
        "clearing"
    } else {
        "stable"
    }
    .to_string();

    if summary.min_temperature < FROST_TEMPERATURE {
        summary.alerts.push("frost_warning".to_string());
    }
    if readings.iter().any(|r| r.wind_speed > HIGH_WIND_SPEED) {
        summary.alerts.push("high_wind_warning".to_string());
    }
    if readings
        .iter()
        .any(|r| r.precipitation_mm > 0.1 || r.precipitation_probability > 50.0)
    {
        summary.alerts.push("precipitation_expected".to_string());
    }

    summary
}

#[cfg(test)]
pub(crate) mod testutil {
    use crate::model::WeatherPoint;
    use chrono::{Duration, TimeZone, Utc};

    /// Hourly readings starting at a fixed instant, with per-reading
    /// temperatures and otherwise mild constant weather.
    pub fn hourly_temperatures(temps: &[f64]) -> Vec<WeatherPoint> {
        let start = Utc.with_ymd_and_hms(2024, 3, 1, 0, 0, 0).unwrap();
        temps
            .iter()
            .enumerate()
            .map(|(i, &temperature)| WeatherPoint {
                timestamp: start + Duration::hours(i as i64),
                temperature,
                pressure: 1013.0,
                humidity: 60.0,
                wind_speed: 3.0,
                wind_direction: 180.0,
                cloud_cover: 40.0,
                precipitation_mm: 0.0,
                precipitation_probability: 0.0,
                symbol_code: "cloudy".to_string(),
            })
            .collect()
    }

    pub fn with_pressures(mut readings: Vec<WeatherPoint>, pressures: &[f64]) -> Vec<WeatherPoint> {
        for (reading, &pressure) in readings.iter_mut().zip(pressures) {
            reading.pressure = pressure;
        }
        readings
    }
}
