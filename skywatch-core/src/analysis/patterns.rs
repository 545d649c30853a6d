use crate::model::{Pattern, WeatherPoint, WeatherVariable};

use super::mean;

/// Every detector threshold in one place, so tuning a pattern never means
/// hunting for literals inside detector bodies.
#[derive(Debug, Clone)]
pub struct PatternThresholds {
    /// Minimum confidence for a pattern to be reported at all.
    pub min_confidence: f64,
    /// A consecutive temperature delta beyond this counts towards
    /// warming/cooling, in °C.
    pub temp_delta: f64,
    /// Warming/cooling additionally need this many qualifying deltas.
    pub min_qualifying_deltas: usize,
    /// A reading above this is a high-pressure reading, in hPa.
    pub high_pressure: f64,
    /// The series mean must also exceed this for a high-pressure system.
    pub high_pressure_mean: f64,
    /// A reading below this is a low-pressure reading, in hPa.
    pub low_pressure: f64,
    /// The series mean must also fall below this for a low-pressure system.
    pub low_pressure_mean: f64,
    /// Precipitation event: more than this many millimetres...
    pub precip_amount: f64,
    /// ...or a probability above this percentage.
    pub precip_probability: f64,
    /// Event fraction for a consistent precipitation pattern.
    pub consistent_precip: f64,
    /// Event fraction for an intermittent precipitation pattern.
    pub intermittent_precip: f64,
}

impl Default for PatternThresholds {
    fn default() -> Self {
        Self {
            min_confidence: 0.6,
            temp_delta: 0.5,
            min_qualifying_deltas: 2,
            high_pressure: 1020.0,
            high_pressure_mean: 1015.0,
            low_pressure: 1000.0,
            low_pressure_mean: 1010.0,
            precip_amount: 0.1,
            precip_probability: 50.0,
            consistent_precip: 0.7,
            intermittent_precip: 0.4,
        }
    }
}

/// Runs a fixed set of independent, non-exclusive rule-based detectors.
/// Each emitted pattern names the variables involved and carries the
/// supporting readings, so consumers can explain why it fired.
#[derive(Debug, Default)]
pub struct PatternRecognizer {
    thresholds: PatternThresholds,
}

impl PatternRecognizer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_thresholds(thresholds: PatternThresholds) -> Self {
        Self { thresholds }
    }

    /// Expects readings sorted ascending by timestamp. Below three
    /// readings, no detector has enough evidence and the set is empty.
    pub fn recognize(&self, readings: &[WeatherPoint]) -> Vec<Pattern> {
        if readings.len() < 3 {
            return Vec::new();
        }

        [
            self.warming(readings),
            self.cooling(readings),
            self.high_pressure_system(readings),
            self.low_pressure_system(readings),
            self.precipitation(readings),
            self.stable_weather(readings),
        ]
        .into_iter()
        .flatten()
        .collect()
    }

    fn warming(&self, readings: &[WeatherPoint]) -> Option<Pattern> {
        self.temperature_run(readings, true)
    }

    fn cooling(&self, readings: &[WeatherPoint]) -> Option<Pattern> {
        self.temperature_run(readings, false)
    }

    /// Shared warming/cooling rule: the fraction of consecutive deltas
    /// beyond the threshold (in the requested direction) is the confidence.
    fn temperature_run(&self, readings: &[WeatherPoint], warming: bool) -> Option<Pattern> {
        if readings.len() < 4 {
            return None;
        }

        let deltas: Vec<f64> = readings
            .windows(2)
            .map(|w| w[1].temperature - w[0].temperature)
            .collect();

        let qualifying = deltas
            .iter()
            .filter(|&&d| {
                if warming {
                    d > self.thresholds.temp_delta
                } else {
                    d < -self.thresholds.temp_delta
                }
            })
            .count();

        let confidence = qualifying as f64 / deltas.len() as f64;
        if confidence < self.thresholds.min_confidence
            || qualifying < self.thresholds.min_qualifying_deltas
        {
            return None;
        }

        let avg_change = mean(&deltas.iter().map(|d| d.abs()).collect::<Vec<_>>());
        let (name, description) = if warming {
            ("warming_trend", "Temperature is increasing consistently over time")
        } else {
            ("cooling_trend", "Temperature is decreasing consistently over time")
        };

        Some(Pattern {
            name: name.to_string(),
            description: description.to_string(),
            confidence,
            // 2 °C average change is already a strong run.
            strength: (avg_change / 2.0).min(1.0),
            variables: vec![WeatherVariable::Temperature],
            readings: readings.to_vec(),
        })
    }

    fn high_pressure_system(&self, readings: &[WeatherPoint]) -> Option<Pattern> {
        let pressures = WeatherVariable::Pressure.values(readings);
        let avg = mean(&pressures);
        let high_count = pressures
            .iter()
            .filter(|&&p| p > self.thresholds.high_pressure)
            .count();
        let confidence = high_count as f64 / pressures.len() as f64;

        if confidence < self.thresholds.min_confidence || avg <= self.thresholds.high_pressure_mean
        {
            return None;
        }

        Some(Pattern {
            name: "high_pressure_system".to_string(),
            description: "High pressure system with consistently elevated atmospheric pressure"
                .to_string(),
            confidence,
            strength: (avg / 1030.0).min(1.0),
            variables: vec![WeatherVariable::Pressure],
            readings: readings.to_vec(),
        })
    }

    fn low_pressure_system(&self, readings: &[WeatherPoint]) -> Option<Pattern> {
        let pressures = WeatherVariable::Pressure.values(readings);
        let avg = mean(&pressures);
        let low_count = pressures
            .iter()
            .filter(|&&p| p < self.thresholds.low_pressure)
            .count();
        let confidence = low_count as f64 / pressures.len() as f64;

        if confidence < self.thresholds.min_confidence || avg >= self.thresholds.low_pressure_mean {
            return None;
        }

        Some(Pattern {
            name: "low_pressure_system".to_string(),
            description: "Low pressure system with consistently reduced atmospheric pressure"
                .to_string(),
            confidence,
            strength: ((1030.0 - avg) / 20.0).min(1.0),
            variables: vec![WeatherVariable::Pressure],
            readings: readings.to_vec(),
        })
    }

    fn precipitation(&self, readings: &[WeatherPoint]) -> Option<Pattern> {
        let events = readings
            .iter()
            .filter(|r| {
                r.precipitation_mm > self.thresholds.precip_amount
                    || r.precipitation_probability > self.thresholds.precip_probability
            })
            .count();
        if events == 0 {
            return None;
        }

        let confidence = events as f64 / readings.len() as f64;
        let (name, description) = if confidence >= self.thresholds.consistent_precip {
            ("consistent_precipitation", "Consistent precipitation pattern")
        } else if confidence >= self.thresholds.intermittent_precip {
            ("intermittent_precipitation", "Intermittent precipitation pattern")
        } else {
            ("precipitation_pattern", "Precipitation expected or occurring")
        };

        let avg_precip = mean(&WeatherVariable::Precipitation.values(readings));

        Some(Pattern {
            name: name.to_string(),
            description: description.to_string(),
            confidence,
            // 5 mm average is treated as saturating strength.
            strength: (avg_precip / 5.0).min(1.0),
            variables: vec![WeatherVariable::Precipitation],
            readings: readings.to_vec(),
        })
    }

    /// Stability is the product of `1/(1 + avg consecutive variation)` for
    /// temperature, pressure and humidity; only genuinely quiet series get
    /// past the confidence floor.
    fn stable_weather(&self, readings: &[WeatherPoint]) -> Option<Pattern> {
        if readings.len() < 4 {
            return None;
        }

        let variables = [
            WeatherVariable::Temperature,
            WeatherVariable::Pressure,
            WeatherVariable::Humidity,
        ];
        let avg_variations: Vec<f64> = variables
            .iter()
            .map(|v| mean(&consecutive_variations(&v.values(readings))))
            .collect();

        let stability: f64 = avg_variations.iter().map(|v| 1.0 / (1.0 + v)).product();
        let confidence = stability.min(1.0);
        if confidence < self.thresholds.min_confidence {
            return None;
        }

        let total_variation = avg_variations.iter().sum::<f64>() / avg_variations.len() as f64;

        Some(Pattern {
            name: "stable_weather".to_string(),
            description: "Weather conditions are stable with minimal variation".to_string(),
            confidence,
            strength: 1.0 - total_variation.min(1.0),
            variables: variables.to_vec(),
            readings: readings.to_vec(),
        })
    }
}

fn consecutive_variations(values: &[f64]) -> Vec<f64> {
    values.windows(2).map(|w| (w[1] - w[0]).abs()).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testutil::{hourly_temperatures, with_pressures};

    fn find<'a>(patterns: &'a [Pattern], name: &str) -> Option<&'a Pattern> {
        patterns.iter().find(|p| p.name == name)
    }

    #[test]
    fn fewer_than_three_readings_yield_no_patterns() {
        let readings = hourly_temperatures(&[10.0, 30.0]);
        assert!(PatternRecognizer::new().recognize(&readings).is_empty());
        assert!(PatternRecognizer::new().recognize(&[]).is_empty());
    }

    #[test]
    fn steady_warming_run_is_detected() {
        let readings = hourly_temperatures(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let patterns = PatternRecognizer::new().recognize(&readings);

        let warming = find(&patterns, "warming_trend").expect("warming pattern");
        assert_eq!(warming.confidence, 1.0);
        assert_eq!(warming.variables, vec![WeatherVariable::Temperature]);
        assert_eq!(warming.readings.len(), 5);
        assert!(warming.strength > 0.0);
        assert!(find(&patterns, "cooling_trend").is_none());
    }

    #[test]
    fn steady_cooling_run_is_detected() {
        let readings = hourly_temperatures(&[14.0, 12.8, 11.6, 10.4]);
        let patterns = PatternRecognizer::new().recognize(&readings);

        let cooling = find(&patterns, "cooling_trend").expect("cooling pattern");
        assert!(cooling.confidence >= 0.6);
        assert!(find(&patterns, "warming_trend").is_none());
    }

    #[test]
    fn single_jump_is_not_a_warming_trend() {
        // One qualifying delta is below the minimum of two.
        let readings = hourly_temperatures(&[10.0, 10.1, 10.2, 15.0]);
        let patterns = PatternRecognizer::new().recognize(&readings);
        assert!(find(&patterns, "warming_trend").is_none());
    }

    #[test]
    fn high_pressure_system_needs_count_and_mean() {
        let readings = with_pressures(
            hourly_temperatures(&[10.0; 4]),
            &[1022.0, 1023.0, 1021.5, 1024.0],
        );
        let patterns = PatternRecognizer::new().recognize(&readings);

        let high = find(&patterns, "high_pressure_system").expect("high pressure pattern");
        assert_eq!(high.confidence, 1.0);
        assert!(high.strength <= 1.0);

        // Too few high readings and a mean below the secondary threshold.
        let borderline = with_pressures(
            hourly_temperatures(&[10.0; 4]),
            &[1021.0, 1021.0, 1000.0, 1000.0],
        );
        let patterns = PatternRecognizer::new().recognize(&borderline);
        assert!(find(&patterns, "high_pressure_system").is_none());
    }

    #[test]
    fn low_pressure_system_is_detected() {
        let readings = with_pressures(
            hourly_temperatures(&[10.0; 4]),
            &[996.0, 995.0, 998.0, 994.0],
        );
        let patterns = PatternRecognizer::new().recognize(&readings);

        let low = find(&patterns, "low_pressure_system").expect("low pressure pattern");
        assert_eq!(low.confidence, 1.0);
        assert!(low.strength > 0.0);
    }

    #[test]
    fn precipitation_classification_by_event_fraction() {
        // All readings wet: consistent.
        let mut readings = hourly_temperatures(&[10.0; 4]);
        for reading in &mut readings {
            reading.precipitation_mm = 1.2;
        }
        let patterns = PatternRecognizer::new().recognize(&readings);
        assert!(find(&patterns, "consistent_precipitation").is_some());

        // Half the readings wet: intermittent.
        let mut readings = hourly_temperatures(&[10.0; 4]);
        readings[0].precipitation_mm = 1.2;
        readings[2].precipitation_probability = 80.0;
        let patterns = PatternRecognizer::new().recognize(&readings);
        assert!(find(&patterns, "intermittent_precipitation").is_some());

        // One of five readings wet: generic pattern.
        let mut readings = hourly_temperatures(&[10.0; 5]);
        readings[1].precipitation_mm = 0.5;
        let patterns = PatternRecognizer::new().recognize(&readings);
        assert!(find(&patterns, "precipitation_pattern").is_some());

        // Bone dry: nothing.
        let readings = hourly_temperatures(&[10.0; 5]);
        let patterns = PatternRecognizer::new().recognize(&readings);
        assert!(find(&patterns, "precipitation_pattern").is_none());
        assert!(find(&patterns, "intermittent_precipitation").is_none());
        assert!(find(&patterns, "consistent_precipitation").is_none());
    }

    #[test]
    fn flat_series_is_stable_weather() {
        let readings = hourly_temperatures(&[20.0, 20.1, 20.0, 20.1, 20.0]);
        let patterns = PatternRecognizer::new().recognize(&readings);

        let stable = find(&patterns, "stable_weather").expect("stable pattern");
        assert!(stable.confidence >= 0.6);
        assert!(stable.strength > 0.8);
        assert_eq!(stable.variables.len(), 3);
    }

    #[test]
    fn volatile_series_is_not_stable() {
        let mut readings = hourly_temperatures(&[5.0, 15.0, 4.0, 18.0, 3.0]);
        for (i, reading) in readings.iter_mut().enumerate() {
            reading.humidity = if i % 2 == 0 { 30.0 } else { 90.0 };
        }
        let patterns = PatternRecognizer::new().recognize(&readings);
        assert!(find(&patterns, "stable_weather").is_none());
    }

    #[test]
    fn custom_thresholds_change_detection() {
        let readings = hourly_temperatures(&[10.0, 10.3, 10.6, 10.9, 11.2]);
        // Default 0.5 °C per step: no warming run here.
        assert!(find(&PatternRecognizer::new().recognize(&readings), "warming_trend").is_none());

        let sensitive = PatternRecognizer::with_thresholds(PatternThresholds {
            temp_delta: 0.2,
            ..PatternThresholds::default()
        });
        assert!(find(&sensitive.recognize(&readings), "warming_trend").is_some());
    }
}
