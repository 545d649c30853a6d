use crate::model::{StatisticalData, WeatherPoint, WeatherVariable};

use super::{mean, population_std_dev};

/// Offset keeping the trend-strength ratio finite when a mean is near zero.
const MEAN_EPSILON: f64 = 0.001;

/// Descriptive statistics per tracked variable.
///
/// Variables with fewer than two samples are omitted from the output
/// entirely; a thin series is not an error.
#[derive(Debug)]
pub struct StatisticalAnalyzer {
    confidence_level: f64,
}

impl Default for StatisticalAnalyzer {
    fn default() -> Self {
        Self {
            confidence_level: 0.95,
        }
    }
}

impl StatisticalAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn analyze(&self, readings: &[WeatherPoint]) -> Vec<StatisticalData> {
        WeatherVariable::all()
            .iter()
            .filter_map(|variable| self.variable_stats(*variable, &variable.values(readings)))
            .collect()
    }

    fn variable_stats(
        &self,
        variable: WeatherVariable,
        values: &[f64],
    ) -> Option<StatisticalData> {
        if values.len() < 2 {
            return None;
        }

        let mut sorted = values.to_vec();
        sorted.sort_by(|a, b| a.total_cmp(b));

        let n = sorted.len();
        let median = if n % 2 == 0 {
            (sorted[n / 2 - 1] + sorted[n / 2]) / 2.0
        } else {
            sorted[n / 2]
        };

        let mean = mean(values);
        let std_dev = population_std_dev(values, mean);

        Some(StatisticalData {
            variable,
            mean,
            median,
            min: sorted[0],
            max: sorted[n - 1],
            std_dev,
            sample_size: n,
            confidence_level: self.confidence_level,
            trend_strength: trend_strength(mean, std_dev, n),
        })
    }
}

/// More variation relative to the mean and more samples both push the
/// strength up; capped at 1.
fn trend_strength(mean: f64, std_dev: f64, sample_size: usize) -> f64 {
    let variation_ratio = std_dev / (mean + MEAN_EPSILON).abs();
    let sample_factor = ((sample_size + 1) as f64).log10();
    (variation_ratio * sample_factor).min(1.0)
}
