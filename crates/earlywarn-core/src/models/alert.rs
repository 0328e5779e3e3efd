//! Alert aggregate and explainability models.

use chrono::{DateTime, Utc};
use earlywarn_narrative::ClinicalInsights;
use serde::{Deserialize, Serialize};

use super::governance::Governance;
use super::scores::{News2Component, RiskContribution, Scores};
use super::signal::{Recommendation, Signal};
use super::trend::{SeriesTrend, Trajectory};

/// Alert risk level. Ordered from least to most severe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RiskLevel {
    Low,
    Moderate,
    High,
    Critical,
}

impl RiskLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            RiskLevel::Low => "LOW",
            RiskLevel::Moderate => "MODERATE",
            RiskLevel::High => "HIGH",
            RiskLevel::Critical => "CRITICAL",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(RiskLevel::Low),
            "MODERATE" => Some(RiskLevel::Moderate),
            "HIGH" => Some(RiskLevel::High),
            "CRITICAL" => Some(RiskLevel::Critical),
            _ => None,
        }
    }
}

/// The time window an analysis covered.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    pub hours: f64,
}

/// A piece of evidence cited by the explanation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Evidence {
    pub source: String,
    pub description: String,
    #[serde(default)]
    pub value: Option<f64>,
    #[serde(default)]
    pub unit: Option<String>,
}

/// An input whose presence or absence shaped the confidence value.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ConfidenceFactor {
    pub factor: String,
    pub present: bool,
}

/// Rule-based explanation of an analysis.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Explainability {
    /// Full deterministic narrative
    pub reasoning: String,
    pub evidence: Vec<Evidence>,
    pub confidence_factors: Vec<ConfidenceFactor>,
    pub limitations: Vec<String>,
    pub news2_components: Vec<News2Component>,
    pub risk_contributions: Vec<RiskContribution>,
}

/// Optional narrative produced by the enhancement layer.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AiInsights {
    #[serde(flatten)]
    pub insights: ClinicalInsights,
    /// Model identifier reported by the generator
    pub model: String,
    pub analysis_time_ms: u64,
}

/// Deterministic output of the analysis pipeline, before persistence.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisOutcome {
    pub risk_level: RiskLevel,
    pub trajectory: Trajectory,
    pub confidence: f64,
    pub scores: Scores,
    pub trends: Vec<SeriesTrend>,
    pub key_signals: Vec<Signal>,
    pub recommendations: Vec<Recommendation>,
    pub explainability: Explainability,
    pub analysis_window: AnalysisWindow,
}

/// A persisted deterioration alert (aggregate root).
///
/// Everything except `governance` is immutable after creation.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Alert {
    pub id: String,
    pub patient_id: String,
    /// Tenant/hospital scope that owns this alert
    pub scope_id: String,
    pub timestamp: DateTime<Utc>,
    pub risk_level: RiskLevel,
    pub trajectory: Trajectory,
    pub confidence: f64,
    pub scores: Scores,
    pub trends: Vec<SeriesTrend>,
    pub key_signals: Vec<Signal>,
    pub recommendations: Vec<Recommendation>,
    pub explainability: Explainability,
    pub analysis_window: AnalysisWindow,
    #[serde(default)]
    pub ai_insights: Option<AiInsights>,
    pub governance: Governance,
}

impl Alert {
    /// Wrap an analysis outcome into a new alert with an empty governance trail.
    pub fn from_outcome(
        outcome: AnalysisOutcome,
        patient_id: String,
        scope_id: String,
        ai_insights: Option<AiInsights>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            patient_id,
            scope_id,
            timestamp: Utc::now(),
            risk_level: outcome.risk_level,
            trajectory: outcome.trajectory,
            confidence: outcome.confidence,
            scores: outcome.scores,
            trends: outcome.trends,
            key_signals: outcome.key_signals,
            recommendations: outcome.recommendations,
            explainability: outcome.explainability,
            analysis_window: outcome.analysis_window,
            ai_insights,
            governance: Governance::default(),
        }
    }

    /// Neither acknowledged nor dismissed.
    pub fn is_active(&self) -> bool {
        !self.governance.is_acknowledged() && !self.governance.is_dismissed()
    }

    /// JSON of the immutable part of the alert (governance excluded).
    pub fn body_json(&self) -> Result<String, serde_json::Error> {
        let mut value = serde_json::to_value(self)?;
        if let Some(map) = value.as_object_mut() {
            map.remove("governance");
        }
        serde_json::to_string(&value)
    }
}
