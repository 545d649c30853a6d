use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A named geographic location weather is collected for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub name: String,
    /// Latitude in degrees, -90 to 90.
    pub lat: f64,
    /// Longitude in degrees, -180 to 180.
    pub lon: f64,
}

/// A single weather reading at one point in time.
///
/// Field names follow the wire format shared with the orchestrator, so the
/// same struct is used for collected forecasts and persisted history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherPoint {
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub temperature: f64,
    #[serde(default)]
    pub pressure: f64,
    #[serde(default)]
    pub humidity: f64,
    #[serde(default)]
    pub wind_speed: f64,
    #[serde(default)]
    pub wind_direction: f64,
    #[serde(default)]
    pub cloud_cover: f64,
    #[serde(default)]
    pub precipitation_mm: f64,
    #[serde(default)]
    pub precipitation_probability: f64,
    #[serde(default)]
    pub symbol_code: String,
}

/// Outcome of one collection request. Created once per location and
/// immutable afterwards; a failed fetch carries the error message instead
/// of weather data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherResult {
    pub location: Location,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_weather: Option<WeatherPoint>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub forecast: Vec<WeatherPoint>,
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl WeatherResult {
    pub fn ok(location: Location, current: WeatherPoint, forecast: Vec<WeatherPoint>) -> Self {
        Self {
            location,
            current_weather: Some(current),
            forecast,
            success: true,
            error: None,
        }
    }

    pub fn failed(location: Location, error: impl Into<String>) -> Self {
        Self {
            location,
            current_weather: None,
            forecast: Vec::new(),
            success: false,
            error: Some(error.into()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lon: f64,
}

/// All persisted readings for one location, as read back from a history
/// file. The analysis engine sorts its own copy of `readings`; callers may
/// hand the readings over in any order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationData {
    #[serde(rename = "location")]
    pub name: String,
    #[serde(default)]
    pub coordinates: Coordinates,
    #[serde(default)]
    pub readings: Vec<WeatherPoint>,
}

/// The numeric variables the analysis engine tracks.
///
/// This enum doubles as the variable table: each analyzer iterates over
/// [`WeatherVariable::all`] and pulls values out of readings through
/// [`WeatherVariable::extract`], so adding a variable is one match arm.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WeatherVariable {
    Temperature,
    Pressure,
    Humidity,
    WindSpeed,
    #[serde(rename = "precipitation_mm")]
    Precipitation,
}

impl WeatherVariable {
    pub fn as_str(&self) -> &'static str {
        match self {
            WeatherVariable::Temperature => "temperature",
            WeatherVariable::Pressure => "pressure",
            WeatherVariable::Humidity => "humidity",
            WeatherVariable::WindSpeed => "wind_speed",
            WeatherVariable::Precipitation => "precipitation_mm",
        }
    }

    pub const fn all() -> &'static [WeatherVariable] {
        &[
            WeatherVariable::Temperature,
            WeatherVariable::Pressure,
            WeatherVariable::Humidity,
            WeatherVariable::WindSpeed,
            WeatherVariable::Precipitation,
        ]
    }

    pub fn extract(&self, point: &WeatherPoint) -> f64 {
        match self {
            WeatherVariable::Temperature => point.temperature,
            WeatherVariable::Pressure => point.pressure,
            WeatherVariable::Humidity => point.humidity,
            WeatherVariable::WindSpeed => point.wind_speed,
            WeatherVariable::Precipitation => point.precipitation_mm,
        }
    }

    pub fn values(&self, readings: &[WeatherPoint]) -> Vec<f64> {
        readings.iter().map(|p| self.extract(p)).collect()
    }
}

impl std::fmt::Display for WeatherVariable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Direction label of a fitted trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Rising,
    Falling,
    Stable,
    Increasing,
    Decreasing,
}

impl TrendDirection {
    pub fn as_str(&self) -> &'static str {
        match self {
            TrendDirection::Rising => "rising",
            TrendDirection::Falling => "falling",
            TrendDirection::Stable => "stable",
            TrendDirection::Increasing => "increasing",
            TrendDirection::Decreasing => "decreasing",
        }
    }
}

impl std::fmt::Display for TrendDirection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    UnusualHigh,
    UnusualLow,
    PressureRise,
    PressureDrop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Moderate,
    High,
}

/// A variable's direction and rate of change over the reading window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Trend {
    pub variable: WeatherVariable,
    pub trend: TrendDirection,
    /// Units per hour from the regression slope.
    #[serde(rename = "rate_of_change")]
    pub change_rate: f64,
    /// Absolute Pearson correlation, 0 to 1.
    pub confidence: f64,
    /// Span of the reading window, e.g. "6h" or "2d".
    pub duration: String,
}

/// A reading flagged as deviating from the variable's baseline, or a rapid
/// short-window pressure swing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Anomaly {
    pub variable: WeatherVariable,
    #[serde(rename = "type")]
    pub kind: AnomalyKind,
    pub severity: Severity,
    pub value: f64,
    pub threshold: f64,
    pub timestamp: DateTime<Utc>,
}

/// A named rule-derived classification with the evidence that produced it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Pattern {
    pub name: String,
    pub description: String,
    pub confidence: f64,
    pub strength: f64,
    pub variables: Vec<WeatherVariable>,
    pub readings: Vec<WeatherPoint>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatisticalData {
    pub variable: WeatherVariable,
    pub mean: f64,
    pub median: f64,
    pub min: f64,
    pub max: f64,
    pub std_dev: f64,
    pub sample_size: usize,
    pub confidence_level: f64,
    pub trend_strength: f64,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WeatherSummary {
    #[serde(rename = "current_temperature")]
    pub current_temp: f64,
    pub min_temperature: f64,
    pub max_temperature: f64,
    pub current_pressure: f64,
    pub min_pressure: f64,
    pub max_pressure: f64,
    /// Short-term outlook derived from the temperature trend.
    #[serde(default)]
    pub trend_next_hours: String,
    /// e.g. "storm_approaching", "clearing", "stable".
    #[serde(default)]
    pub forecast_summary: String,
    pub confidence: f64,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub alerts: Vec<String>,
}

/// Complete analysis output for one location, written out as a single JSON
/// document by the persistence boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub analysis_type: String,
    pub timeframe: String,
    pub location: String,
    pub generated_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub trends: Vec<Trend>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub anomalies: Vec<Anomaly>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub patterns: Vec<Pattern>,
    pub weather_summary: WeatherSummary,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub statistical_data: Vec<StatisticalData>,
}
