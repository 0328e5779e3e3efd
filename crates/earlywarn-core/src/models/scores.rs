//! Score models.

use serde::{Deserialize, Serialize};

use super::trend::{Acceleration, TrendDirection};

/// Standardized severity scores for one analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Scores {
    /// NEWS2-style aggregate (0 - 20)
    pub news2_score: u32,
    /// Latest NEWS2 vs NEWS2 from the earliest in-window readings
    pub news2_trend: TrendDirection,
    /// qSOFA-style sepsis screen (0 - 3)
    pub qsofa_score: u32,
    /// Transparent weighted risk score (0 - 100)
    pub custom_risk_score: u32,
    pub trend_acceleration: Acceleration,
    /// How many NEWS2 parameters were available
    pub news2_parameters_used: u32,
}

/// One banded NEWS2 parameter.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct News2Component {
    pub parameter: String,
    /// Reading that was banded (`None` for derived parameters like oxygen use)
    pub value: Option<f64>,
    pub points: u32,
}

/// One itemized contribution to the custom risk score.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskContribution {
    pub factor: String,
    pub points: i32,
}

/// Scores plus the itemized detail behind them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ScoreCard {
    pub scores: Scores,
    pub news2_components: Vec<News2Component>,
    pub risk_contributions: Vec<RiskContribution>,
    /// qSOFA criteria that were met
    pub qsofa_criteria: Vec<String>,
}

impl ScoreCard {
    /// Highest single-parameter NEWS2 sub-score ("red score" when 3).
    pub fn max_news2_component(&self) -> u32 {
        self.news2_components
            .iter()
            .map(|c| c.points)
            .max()
            .unwrap_or(0)
    }
}
