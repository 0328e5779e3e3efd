//! Signal and recommendation models.

use serde::{Deserialize, Serialize};

use super::trend::TrendDirection;

/// Origin of a signal.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum SignalType {
    Vital,
    Lab,
    Oxygen,
    Medication,
    Composite,
    Clinical,
}

/// Signal severity. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Low,
    Moderate,
    High,
    Critical,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Low => "low",
            Severity::Moderate => "moderate",
            Severity::High => "high",
            Severity::Critical => "critical",
        }
    }
}

/// Baseline/current values behind a signal.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SignalValues {
    pub baseline: f64,
    pub current: f64,
    pub change: f64,
    #[serde(default)]
    pub change_percent: Option<f64>,
}

/// A discrete, severity-tagged finding.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Signal {
    pub signal_type: SignalType,
    pub code: String,
    pub description: String,
    pub severity: Severity,
    pub trend: TrendDirection,
    #[serde(default)]
    pub values: Option<SignalValues>,
    /// Hours between baseline and current value (0 for point findings)
    pub time_span_hours: f64,
    pub clinical_significance: String,
}

/// Recommendation priority. Ordered from least to most pressing.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    Routine,
    Urgent,
    Immediate,
}

/// Strength of the evidence behind a recommendation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum EvidenceLevel {
    A,
    B,
    C,
    #[serde(rename = "expert-opinion")]
    ExpertOpinion,
}

/// A recommended action.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Recommendation {
    pub priority: Priority,
    pub action: String,
    pub rationale: String,
    pub evidence_level: EvidenceLevel,
    pub timeframe: String,
}
