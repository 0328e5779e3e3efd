//! Per-series direction, velocity and acceleration.

use crate::config::EngineConfig;
use crate::models::{Acceleration, SeriesTrend, TrendDirection, Velocity};
use crate::series::{ObservationSeries, Reading};

use super::reference::reference_range;

/// Second-half rate must differ from the first-half rate by this factor.
const ACCELERATION_RATIO: f64 = 1.25;

/// Readings needed before acceleration is meaningful.
const MIN_ACCELERATION_READINGS: usize = 3;

/// Trend analyzer with configurable deadband and velocity cut-offs.
#[derive(Debug, Clone)]
pub struct TrendAnalyzer {
    deadband_percent: f64,
    rapid_percent: f64,
    gradual_percent: f64,
}

impl Default for TrendAnalyzer {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl TrendAnalyzer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            deadband_percent: config.direction_deadband_percent,
            rapid_percent: config.rapid_velocity_percent,
            gradual_percent: config.gradual_velocity_percent,
        }
    }

    /// One trend per numeric series, in code order.
    pub fn analyze(&self, series: &ObservationSeries) -> Vec<SeriesTrend> {
        series
            .iter()
            .filter_map(|(code, _, readings)| self.analyze_series(code, readings))
            .collect()
    }

    /// Trend for one series. `None` when the series has no numeric reading.
    pub fn analyze_series(&self, code: &str, readings: &[Reading]) -> Option<SeriesTrend> {
        let numeric: Vec<(f64, &Reading)> = readings
            .iter()
            .filter_map(|r| r.value.as_f64().map(|v| (v, r)))
            .collect();
        let (first_value, first) = *numeric.first()?;
        let (last_value, last) = *numeric.last()?;

        let delta = last_value - first_value;
        let delta_percent = if numeric.len() >= 2 && first_value != 0.0 {
            Some(delta / first_value * 100.0)
        } else {
            None
        };

        let direction = match delta_percent {
            Some(p) if p > self.deadband_percent => TrendDirection::Increasing,
            Some(p) if p < -self.deadband_percent => TrendDirection::Decreasing,
            _ => TrendDirection::Stable,
        };

        let velocity = match delta_percent.map(f64::abs) {
            Some(p) if p > self.rapid_percent => Velocity::Rapid,
            Some(p) if p > self.gradual_percent => Velocity::Gradual,
            _ => Velocity::Slow,
        };

        let range = reference_range(code);
        let abnormal = range.is_some_and(|r| r.is_abnormal(last_value));
        let baseline_abnormal = range.is_some_and(|r| r.is_abnormal(first_value));
        let critical = range.is_some_and(|r| r.is_critical(last_value));
        let worsening = direction != TrendDirection::Stable
            && range.is_some_and(|r| r.is_worse(first_value, last_value));

        Some(SeriesTrend {
            code: code.to_string(),
            unit: last.unit.clone().or_else(|| first.unit.clone()),
            readings: numeric.len(),
            first_value,
            last_value,
            first_at: first.timestamp,
            last_at: last.timestamp,
            delta,
            delta_percent,
            direction,
            velocity,
            acceleration: acceleration(&numeric, delta),
            abnormal,
            baseline_abnormal,
            critical,
            worsening,
        })
    }
}

/// Compare the rate of change in the first and second half of the series,
/// measured along the overall direction of travel.
fn acceleration(values: &[(f64, &Reading)], delta: f64) -> Acceleration {
    if values.len() < MIN_ACCELERATION_READINGS || delta == 0.0 {
        return Acceleration::Steady;
    }

    let mid = values.len() / 2;
    let (Some(r1), Some(r2)) = (
        rate(values[0], values[mid]),
        rate(values[mid], values[values.len() - 1]),
    ) else {
        return Acceleration::Steady;
    };

    let sign = delta.signum();
    let (r1, r2) = (r1 * sign, r2 * sign);

    if r2 > 0.0 && r2 > r1 * ACCELERATION_RATIO {
        Acceleration::Accelerating
    } else if r1 > 0.0 && r2 < r1 / ACCELERATION_RATIO {
        Acceleration::Decelerating
    } else {
        Acceleration::Steady
    }
}

/// Change per hour between two readings; `None` if they share a timestamp.
fn rate(from: (f64, &Reading), to: (f64, &Reading)) -> Option<f64> {
    let hours = (to.1.timestamp - from.1.timestamp).num_seconds() as f64 / 3600.0;
    (hours > 0.0).then(|| (to.0 - from.0) / hours)
}
