//! Trend models produced by the trend analyzer.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Direction of change across the window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrendDirection {
    Increasing,
    Decreasing,
    Stable,
}

/// Magnitude of change across the window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Velocity {
    Slow,
    Gradual,
    Rapid,
}

/// Change of rate between the first and second half of the window.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum Acceleration {
    Accelerating,
    Steady,
    Decelerating,
}

/// Overall patient trajectory. Ordered from most to least favorable.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Trajectory {
    Improving,
    Stable,
    Worsening,
    RapidlyWorsening,
}

impl Trajectory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trajectory::Improving => "IMPROVING",
            Trajectory::Stable => "STABLE",
            Trajectory::Worsening => "WORSENING",
            Trajectory::RapidlyWorsening => "RAPIDLY_WORSENING",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "IMPROVING" => Some(Trajectory::Improving),
            "STABLE" => Some(Trajectory::Stable),
            "WORSENING" => Some(Trajectory::Worsening),
            "RAPIDLY_WORSENING" => Some(Trajectory::RapidlyWorsening),
            _ => None,
        }
    }
}

/// Trend of a single observation code over the window.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SeriesTrend {
    /// Canonical observation code
    pub code: String,
    pub unit: Option<String>,
    /// Number of usable in-window readings
    pub readings: usize,
    pub first_value: f64,
    pub last_value: f64,
    pub first_at: DateTime<Utc>,
    pub last_at: DateTime<Utc>,
    pub delta: f64,
    /// `None` when there is a single reading or the first value is zero
    pub delta_percent: Option<f64>,
    pub direction: TrendDirection,
    pub velocity: Velocity,
    pub acceleration: Acceleration,
    /// Current value outside the reference range
    pub abnormal: bool,
    /// First value outside the reference range
    pub baseline_abnormal: bool,
    /// Current value beyond a hard clinical threshold
    pub critical: bool,
    /// Moving in the clinically unfavorable direction
    pub worsening: bool,
}

impl SeriesTrend {
    /// Elapsed hours between first and last reading.
    pub fn span_hours(&self) -> f64 {
        (self.last_at - self.first_at).num_seconds() as f64 / 3600.0
    }

    /// Baseline was abnormal and the current value is back in range.
    pub fn recovered(&self) -> bool {
        self.baseline_abnormal && !self.abnormal
    }

    /// Significant movement: gradual or rapid and outside the deadband.
    pub fn is_significant(&self) -> bool {
        self.direction != TrendDirection::Stable && self.velocity >= Velocity::Gradual
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trajectory_ordering() {
        assert!(Trajectory::RapidlyWorsening > Trajectory::Worsening);
        assert!(Trajectory::Worsening > Trajectory::Stable);
        assert!(Trajectory::Stable > Trajectory::Improving);
    }

    #[test]
    fn test_trajectory_serde() {
        let json = serde_json::to_string(&Trajectory::RapidlyWorsening).unwrap();
        assert_eq!(json, "\"RAPIDLY_WORSENING\"");
        assert_eq!(Trajectory::RapidlyWorsening.as_str(), "RAPIDLY_WORSENING");
    }
}
