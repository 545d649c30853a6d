use crate::model::{Trend, TrendDirection, WeatherPoint, WeatherVariable};

use super::duration_label;

/// Per-variable slope band: beyond +threshold the trend is `above`, below
/// -threshold it is `below`, otherwise stable. Keeping the bands in one
/// table means adding a trended variable is a single row.
struct TrendBand {
    variable: WeatherVariable,
    threshold: f64,
    above: TrendDirection,
    below: TrendDirection,
}

const TREND_BANDS: &[TrendBand] = &[
    TrendBand {
        variable: WeatherVariable::Temperature,
        threshold: 0.1,
        above: TrendDirection::Rising,
        below: TrendDirection::Falling,
    },
    TrendBand {
        variable: WeatherVariable::Pressure,
        threshold: 0.5,
        above: TrendDirection::Rising,
        below: TrendDirection::Falling,
    },
    TrendBand {
        variable: WeatherVariable::Humidity,
        threshold: 1.0,
        above: TrendDirection::Increasing,
        below: TrendDirection::Decreasing,
    },
    TrendBand {
        variable: WeatherVariable::WindSpeed,
        threshold: 0.1,
        above: TrendDirection::Increasing,
        below: TrendDirection::Decreasing,
    },
];

/// Least-squares trends per variable over elapsed hours, with the absolute
/// Pearson correlation as confidence.
#[derive(Debug)]
pub struct TrendAnalyzer {
    min_readings: usize,
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self { min_readings: 3 }
    }
}

impl TrendAnalyzer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Expects readings sorted ascending by timestamp.
    pub fn analyze(&self, readings: &[WeatherPoint]) -> Vec<Trend> {
        if readings.len() < self.min_readings {
            return Vec::new();
        }

        let duration = duration_label(readings);

        TREND_BANDS
            .iter()
            .filter_map(|band| {
                let (slope, confidence) = linear_trend(readings, band.variable)?;
                let trend = if slope > band.threshold {
                    band.above
                } else if slope < -band.threshold {
                    band.below
                } else {
                    TrendDirection::Stable
                };

                Some(Trend {
                    variable: band.variable,
                    trend,
                    change_rate: slope,
                    confidence,
                    duration: duration.clone(),
                })
            })
            .collect()
    }
}

/// OLS slope (units per hour) and |Pearson r| of a variable against elapsed
/// hours since the first reading. None below two points; zero slope and
/// confidence when the series is degenerate (all timestamps equal).
fn linear_trend(readings: &[WeatherPoint], variable: WeatherVariable) -> Option<(f64, f64)> {
    let n = readings.len();
    if n < 2 {
        return None;
    }

    let base = readings[0].timestamp;
    let xs: Vec<f64> = readings
        .iter()
        .map(|r| (r.timestamp - base).num_seconds() as f64 / 3600.0)
        .collect();
    let ys: Vec<f64> = readings.iter().map(|r| variable.extract(r)).collect();

    let mean_x = xs.iter().sum::<f64>() / n as f64;
    let mean_y = ys.iter().sum::<f64>() / n as f64;

    let mut sum_xy = 0.0;
    let mut sum_xx = 0.0;
    let mut sum_yy = 0.0;
    for i in 0..n {
        let dx = xs[i] - mean_x;
        let dy = ys[i] - mean_y;
        sum_xy += dx * dy;
        sum_xx += dx * dx;
        sum_yy += dy * dy;
    }

    if sum_xx == 0.0 {
        return Some((0.0, 0.0));
    }

    let slope = sum_xy / sum_xx;
    let denom = (sum_xx * sum_yy).sqrt();
    let confidence = if denom == 0.0 {
        0.0
    } else {
        (sum_xy / denom).abs()
    };

    Some((slope, confidence))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::testutil::hourly_temperatures;

    fn trend_for(trends: &[Trend], variable: WeatherVariable) -> Option<&Trend> {
        trends.iter().find(|t| t.variable == variable)
    }

    #[test]
    fn strictly_increasing_temperature_is_rising() {
        let readings = hourly_temperatures(&[10.0, 11.0, 12.0, 13.0, 14.0]);
        let trends = TrendAnalyzer::new().analyze(&readings);

        let temp = trend_for(&trends, WeatherVariable::Temperature).expect("temperature trend");
        assert_eq!(temp.trend, TrendDirection::Rising);
        assert!((temp.change_rate - 1.0).abs() < 1e-9);
        // A perfect line has full correlation.
        assert!((temp.confidence - 1.0).abs() < 1e-9);
        assert_eq!(temp.duration, "4h");
    }

    #[test]
    fn falling_temperature_is_classified_falling() {
        let readings = hourly_temperatures(&[14.0, 12.5, 11.0, 9.5]);
        let trends = TrendAnalyzer::new().analyze(&readings);

        let temp = trend_for(&trends, WeatherVariable::Temperature).expect("temperature trend");
        assert_eq!(temp.trend, TrendDirection::Falling);
        assert!(temp.change_rate < 0.0);
    }

    #[test]
    fn near_flat_series_is_stable() {
        let readings = hourly_temperatures(&[20.0, 20.05, 20.02, 20.08]);
        let trends = TrendAnalyzer::new().analyze(&readings);

        let temp = trend_for(&trends, WeatherVariable::Temperature).expect("temperature trend");
        assert_eq!(temp.trend, TrendDirection::Stable);
    }

    #[test]
    fn pressure_band_is_wider_than_temperature() {
        // Slope of 0.3 hPa/h: beyond the temperature band, inside pressure's.
        let mut readings = hourly_temperatures(&[10.0; 5]);
        for (i, reading) in readings.iter_mut().enumerate() {
            reading.pressure = 1010.0 + 0.3 * i as f64;
        }
        let trends = TrendAnalyzer::new().analyze(&readings);

        let pressure = trend_for(&trends, WeatherVariable::Pressure).expect("pressure trend");
        assert_eq!(pressure.trend, TrendDirection::Stable);
    }

    #[test]
    fn humidity_uses_increasing_decreasing_labels() {
        let mut readings = hourly_temperatures(&[10.0; 5]);
        for (i, reading) in readings.iter_mut().enumerate() {
            reading.humidity = 40.0 + 5.0 * i as f64;
        }
        let trends = TrendAnalyzer::new().analyze(&readings);

        let humidity = trend_for(&trends, WeatherVariable::Humidity).expect("humidity trend");
        assert_eq!(humidity.trend, TrendDirection::Increasing);
    }

    #[test]
    fn fewer_than_three_readings_yield_no_trends() {
        let readings = hourly_temperatures(&[10.0, 20.0]);
        assert!(TrendAnalyzer::new().analyze(&readings).is_empty());
        assert!(TrendAnalyzer::new().analyze(&[]).is_empty());
    }

    #[test]
    fn duration_switches_to_days_on_long_series() {
        let temps: Vec<f64> = (0..30).map(|i| 10.0 + i as f64 * 0.01).collect();
        let readings = hourly_temperatures(&temps);
        let trends = TrendAnalyzer::new().analyze(&readings);
        assert_eq!(trends[0].duration, "1d");
    }

    #[test]
    fn identical_timestamps_degenerate_to_zero_slope() {
        let mut readings = hourly_temperatures(&[10.0, 12.0, 14.0]);
        let stamp = readings[0].timestamp;
        for reading in &mut readings {
            reading.timestamp = stamp;
        }
        let trends = TrendAnalyzer::new().analyze(&readings);

        let temp = trend_for(&trends, WeatherVariable::Temperature).expect("temperature trend");
        assert_eq!(temp.change_rate, 0.0);
        assert_eq!(temp.confidence, 0.0);
        assert_eq!(temp.trend, TrendDirection::Stable);
    }
}
