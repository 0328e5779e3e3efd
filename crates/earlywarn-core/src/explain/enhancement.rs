//! Optional narrative enhancement, bounded by a timeout.
//!
//! The enhancement runs after the rule-based outcome is complete and can only
//! add `ai_insights`. Any failure is reported as an [`EnhancementError`] for the
//! caller to record as a limitation.

use std::sync::Arc;
use std::time::{Duration, Instant};

use earlywarn_narrative::{generate_insights, GenerationError, NarrativeGenerator};
use serde_json::json;
use thiserror::Error;

use crate::models::{AiInsights, AnalysisOutcome, PatientContext};

/// Why enhancement produced nothing.
#[derive(Error, Debug)]
pub enum EnhancementError {
    #[error("no narrative generator configured")]
    NotConfigured,

    #[error("narrative generation timed out after {0} ms")]
    Timeout(u64),

    #[error("narrative generation failed: {0}")]
    Generation(#[from] GenerationError),

    #[error("narrative worker failed: {0}")]
    Worker(String),

    #[error("context serialization failed: {0}")]
    Context(#[from] serde_json::Error),
}

/// Structured, de-identified context sent to the generator.
pub fn build_context(outcome: &AnalysisOutcome, context: &PatientContext) -> serde_json::Value {
    let signals: Vec<serde_json::Value> = outcome
        .key_signals
        .iter()
        .map(|s| {
            json!({
                "code": s.code,
                "description": s.description,
                "severity": s.severity,
                "trend": s.trend,
            })
        })
        .collect();
    let recommendations: Vec<&str> = outcome
        .recommendations
        .iter()
        .map(|r| r.action.as_str())
        .collect();

    json!({
        "age": context.age,
        "gender": context.gender,
        "comorbidities": context.comorbidity_list(),
        "current_diagnoses": context.current_diagnoses,
        "risk_level": outcome.risk_level,
        "trajectory": outcome.trajectory,
        "news2_score": outcome.scores.news2_score,
        "qsofa_score": outcome.scores.qsofa_score,
        "custom_risk_score": outcome.scores.custom_risk_score,
        "trend_acceleration": outcome.scores.trend_acceleration,
        "signals": signals,
        "recommendations": recommendations,
        "analysis_window_hours": outcome.analysis_window.hours,
    })
}

/// Runs a [`NarrativeGenerator`] on a blocking worker with a deadline.
#[derive(Clone)]
pub struct Enhancer {
    generator: Option<Arc<dyn NarrativeGenerator>>,
    timeout: Duration,
}

impl Enhancer {
    pub fn new(generator: Option<Arc<dyn NarrativeGenerator>>, timeout: Duration) -> Self {
        Self { generator, timeout }
    }

    pub fn is_configured(&self) -> bool {
        self.generator.is_some()
    }

    /// Produce insights for an outcome.
    ///
    /// Dropping the returned future abandons the worker; its result is discarded.
    pub async fn enhance(
        &self,
        outcome: &AnalysisOutcome,
        context: &PatientContext,
    ) -> Result<AiInsights, EnhancementError> {
        let generator = self
            .generator
            .clone()
            .ok_or(EnhancementError::NotConfigured)?;
        let context_json = serde_json::to_string(&build_context(outcome, context))?;

        let started = Instant::now();
        let worker_generator = Arc::clone(&generator);
        let worker = tokio::task::spawn_blocking(move || {
            generate_insights(worker_generator.as_ref(), &context_json)
        });

        let insights = match tokio::time::timeout(self.timeout, worker).await {
            Err(_) => return Err(EnhancementError::Timeout(self.timeout.as_millis() as u64)),
            Ok(Err(join)) => return Err(EnhancementError::Worker(join.to_string())),
            Ok(Ok(result)) => result?,
        };

        Ok(AiInsights {
            insights,
            model: generator.model_id().to_string(),
            analysis_time_ms: started.elapsed().as_millis() as u64,
        })
    }
}
