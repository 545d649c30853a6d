use chrono::Duration;

use crate::model::{Anomaly, AnomalyKind, Severity, WeatherPoint, WeatherVariable};

use super::{mean, population_std_dev};

/// Variables a statistical baseline is computed for. Precipitation is
/// excluded: it is mostly zero and its baseline would flag every shower.
const BASELINE_VARIABLES: &[WeatherVariable] = &[
    WeatherVariable::Temperature,
    WeatherVariable::Pressure,
    WeatherVariable::Humidity,
    WeatherVariable::WindSpeed,
];

/// Window for the rapid-pressure-swing rule.
const PRESSURE_WINDOW_HOURS: i64 = 4;
/// Swing beyond this is an anomaly; beyond [`PRESSURE_SWING_HIGH`] a high one.
const PRESSURE_SWING_MODERATE: f64 = 3.0;
const PRESSURE_SWING_HIGH: f64 = 5.0;

#[derive(Debug, Clone, Copy)]
struct Baseline {
    mean: f64,
    std_dev: f64,
}

/// Flags readings that deviate from the per-variable baseline by more than
/// `threshold_factor` standard deviations, plus rapid pressure swings
/// within a short window.
#[derive(Debug)]
pub struct AnomalyDetector {
    threshold_factor: f64,
    min_readings: usize,
}

impl Default for AnomalyDetector {
    fn default() -> Self {
        Self {
            threshold_factor: 2.0,
            min_readings: 5,
        }
    }
}

impl AnomalyDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects readings sorted ascending by timestamp. Below the baseline
    /// minimum the result is empty, never an error.
    pub fn detect(&self, readings: &[WeatherPoint]) -> Vec<Anomaly> {
        if readings.len() < self.min_readings {
            return Vec::new();
        }

        let baselines: Vec<(WeatherVariable, Baseline)> = BASELINE_VARIABLES
            .iter()
            .map(|&variable| {
                let values = variable.values(readings);
                let mean = mean(&values);
                let std_dev = population_std_dev(&values, mean);
                (variable, Baseline { mean, std_dev })
            })
            .collect();

        let mut anomalies = Vec::new();
        for reading in readings {
            for &(variable, baseline) in &baselines {
                if let Some(anomaly) = self.check_value(variable, baseline, reading) {
                    anomalies.push(anomaly);
                }
            }
            if let Some(anomaly) = rapid_pressure_change(reading, readings) {
                anomalies.push(anomaly);
            }
        }
        anomalies
    }

    fn check_value(
        &self,
        variable: WeatherVariable,
        baseline: Baseline,
        reading: &WeatherPoint,
    ) -> Option<Anomaly> {
        let value = variable.extract(reading);
        let deviation = (value - baseline.mean).abs();
        if deviation <= self.threshold_factor * baseline.std_dev {
            return None;
        }

        let severity = if deviation > 3.0 * baseline.std_dev {
            Severity::High
        } else if deviation > 2.0 * baseline.std_dev {
            Severity::Moderate
        } else {
            Severity::Low
        };

        let kind = if value < baseline.mean {
            AnomalyKind::UnusualLow
        } else {
            AnomalyKind::UnusualHigh
        };

        Some(Anomaly {
            variable,
            kind,
            severity,
            value,
            threshold: baseline.mean + self.threshold_factor * baseline.std_dev,
            timestamp: reading.timestamp,
        })
    }
}

/// Pressure change against the most recent prior reading within the
/// 4-hour window; swings past 3 hPa may indicate a passing front.
fn rapid_pressure_change(current: &WeatherPoint, readings: &[WeatherPoint]) -> Option<Anomaly> {
    let window = Duration::hours(PRESSURE_WINDOW_HOURS);
    let prior = readings
        .iter()
        .filter(|r| r.timestamp < current.timestamp && current.timestamp - r.timestamp <= window)
        .max_by_key(|r| r.timestamp)?;

    let change = current.pressure - prior.pressure;
    if change.abs() <= PRESSURE_SWING_MODERATE {
        return None;
    }

    Some(Anomaly {
        variable: WeatherVariable::Pressure,
        kind: if change < 0.0 {
            AnomalyKind::PressureDrop
        } else {
            AnomalyKind::PressureRise
        },
        severity: if change.abs() > PRESSURE_SWING_HIGH {
            Severity::High
        } else {
            Severity::Moderate
        },
        value: change,
        threshold: PRESSURE_SWING_MODERATE,
        timestamp: current.timestamp,
    })
}
