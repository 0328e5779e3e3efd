//! Rule-based analysis pipeline.
//!
//! ```text
//! request → series → trends ─┬→ scores ─┬→ signals → risk → recommendations
//!                            └→ trajectory ┘                 → explanation
//! ```
//!
//! Everything here is a pure function of the request. No I/O, no clock reads
//! beyond the fallback window end for requests with no timestamps at all.

use crate::config::EngineConfig;
use crate::explain::{confidence, synthesize, ExplanationInput};
use crate::models::codes::CodeNormalizer;
use crate::models::{AnalysisOutcome, AnalysisRequest, ObservationValue};
use crate::scoring::ScoreCalculator;
use crate::series::ObservationSeries;
use crate::signals::{classify_risk, recommend, PatternInput, SignalGenerator};
use crate::trends::{classify, TrendAnalyzer};

use super::error::{EngineError, EngineResult};

/// Runs the deterministic pipeline.
pub struct Analyzer {
    normalizer: CodeNormalizer,
    trends: TrendAnalyzer,
    scores: ScoreCalculator,
    signals: SignalGenerator,
}

impl Analyzer {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            normalizer: CodeNormalizer::new(),
            trends: TrendAnalyzer::new(config),
            scores: ScoreCalculator::new(),
            signals: SignalGenerator::new(),
        }
    }

    /// Analyze a request. Incomplete input lowers confidence; it never fails.
    pub fn analyze(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        let context = &request.context;
        let series = ObservationSeries::from_request(request, &self.normalizer);

        let trends = self.trends.analyze(&series);
        let card = self.scores.calculate(&series, context, &trends);
        let trajectory = classify(&trends);
        let signals = self.signals.generate(&series, &trends, &card, context);
        let risk_level = classify_risk(&card, &signals, trajectory);

        let recommendations = recommend(&PatternInput {
            card: &card,
            trends: &trends,
            signals: &signals,
            trajectory,
        });

        let explainability = synthesize(&ExplanationInput {
            context,
            series: &series,
            card: &card,
            trends: &trends,
            signals: &signals,
            trajectory,
            risk_level,
        });

        AnalysisOutcome {
            risk_level,
            trajectory,
            confidence: confidence(&explainability.confidence_factors),
            scores: card.scores,
            analysis_window: series.window().clone(),
            trends,
            key_signals: signals,
            recommendations,
            explainability,
        }
    }
}

/// Reject requests that cannot be analyzed at all.
pub fn validate_request(request: &AnalysisRequest, config: &EngineConfig) -> EngineResult<()> {
    if request.patient_id.trim().is_empty() {
        return Err(EngineError::Validation("patient_id is required".into()));
    }

    let hours = request.analysis_window_hours;
    if !hours.is_finite() || hours <= 0.0 || hours > config.max_window_hours {
        return Err(EngineError::Validation(format!(
            "analysis_window_hours must be in (0, {}], got {}",
            config.max_window_hours, hours
        )));
    }

    for observation in request.vitals.iter().chain(request.labs.iter()) {
        if observation.code.trim().is_empty() {
            return Err(EngineError::Validation(format!(
                "observation {} has no code",
                observation.id
            )));
        }
        if let ObservationValue::Numeric(value) = observation.value {
            if !value.is_finite() {
                return Err(EngineError::Validation(format!(
                    "observation {} ({}) has a non-finite value",
                    observation.id, observation.code
                )));
            }
        }
    }

    for event in &request.oxygen_support {
        let finite = [event.flow_rate, event.fio2]
            .iter()
            .flatten()
            .all(|v| v.is_finite());
        if !finite {
            return Err(EngineError::Validation(format!(
                "oxygen event {} has a non-finite setting",
                event.id
            )));
        }
    }

    Ok(())
}
