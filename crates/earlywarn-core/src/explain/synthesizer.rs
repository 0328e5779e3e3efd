//! Deterministic explanation: narrative, evidence, confidence and limitations.

use crate::models::codes::{self, display_name, NEWS2_PARAMETERS};
use crate::models::{
    Acceleration, ConfidenceFactor, Evidence, Explainability, PatientContext, RiskLevel,
    ScoreCard, SeriesTrend, Signal, SignalType, Trajectory, TrendDirection,
};
use crate::series::ObservationSeries;

/// Key findings quoted in the narrative.
const NARRATIVE_SIGNALS: usize = 3;

/// Everything the synthesizer reads.
pub struct ExplanationInput<'a> {
    pub context: &'a PatientContext,
    pub series: &'a ObservationSeries,
    pub card: &'a ScoreCard,
    pub trends: &'a [SeriesTrend],
    pub signals: &'a [Signal],
    pub trajectory: Trajectory,
    pub risk_level: RiskLevel,
}

/// Confidence factors: the six NEWS2 physiological parameters, age and a
/// recorded comorbidity list.
pub fn confidence_factors(series: &ObservationSeries, context: &PatientContext) -> Vec<ConfidenceFactor> {
    let mut factors: Vec<ConfidenceFactor> = NEWS2_PARAMETERS
        .iter()
        .map(|code| ConfidenceFactor {
            factor: display_name(code).to_string(),
            present: parameter_present(series, code),
        })
        .collect();

    factors.push(ConfidenceFactor {
        factor: "Age".to_string(),
        present: context.age.is_some(),
    });
    factors.push(ConfidenceFactor {
        factor: "Comorbidity list".to_string(),
        present: context.comorbidities.is_some(),
    });
    factors
}

/// Fraction of expected inputs present, rounded to two decimals.
pub fn confidence(factors: &[ConfidenceFactor]) -> f64 {
    if factors.is_empty() {
        return 0.0;
    }
    let present = factors.iter().filter(|f| f.present).count() as f64;
    (present / factors.len() as f64 * 100.0).round() / 100.0
}

fn parameter_present(series: &ObservationSeries, code: &str) -> bool {
    // GCS stands in for a missing ACVPU reading
    series.has(code) || (code == codes::CONSCIOUSNESS && series.has(codes::GCS))
}

/// Build the rule-based explanation.
pub fn synthesize(input: &ExplanationInput<'_>) -> Explainability {
    let factors = confidence_factors(input.series, input.context);

    Explainability {
        reasoning: narrative(input),
        evidence: evidence(input),
        limitations: limitations(input, &factors),
        confidence_factors: factors,
        news2_components: input.card.news2_components.clone(),
        risk_contributions: input.card.risk_contributions.clone(),
    }
}

fn narrative(input: &ExplanationInput<'_>) -> String {
    let mut sentences = Vec::new();
    let context = input.context;
    let scores = &input.card.scores;

    let mut summary = match context.age {
        Some(age) => format!("Patient aged {}", age),
        None => "Patient of unrecorded age".to_string(),
    };
    match context.comorbidities.as_deref() {
        Some([]) => summary.push_str(" with no documented comorbidities"),
        Some(list) => summary.push_str(&format!(
            " with {} documented comorbidities ({})",
            list.len(),
            list.join(", ")
        )),
        None => summary.push_str(", comorbidities not recorded"),
    }
    if let Some(ward) = &context.ward {
        summary.push_str(&format!(", located on {}", ward));
    }
    sentences.push(format!("{}.", summary));

    let factors: Vec<&str> = input
        .card
        .risk_contributions
        .iter()
        .skip(1)
        .map(|c| c.factor.as_str())
        .collect();
    if !factors.is_empty() {
        sentences.push(format!("Risk factors: {}.", factors.join("; ")));
    }

    sentences.push(format!(
        "NEWS2 {} ({}, {} of {} parameters), qSOFA {}/3, custom risk {}/100.",
        scores.news2_score,
        direction_word(scores.news2_trend),
        scores.news2_parameters_used,
        NEWS2_PARAMETERS.len(),
        scores.qsofa_score,
        scores.custom_risk_score
    ));

    let moving = input.trends.iter().filter(|t| t.worsening).count();
    sentences.push(format!(
        "Trajectory {} with {} worsening series and {} trend acceleration.",
        input.trajectory.as_str(),
        moving,
        acceleration_word(scores.trend_acceleration)
    ));

    let findings: Vec<&str> = input
        .signals
        .iter()
        .take(NARRATIVE_SIGNALS)
        .map(|s| s.description.as_str())
        .collect();
    if !findings.is_empty() {
        sentences.push(format!("Key findings: {}.", findings.join("; ")));
    }

    sentences.push(format!("Assessed risk level: {}.", input.risk_level.as_str()));
    sentences.join(" ")
}

fn direction_word(direction: TrendDirection) -> &'static str {
    match direction {
        TrendDirection::Increasing => "rising",
        TrendDirection::Decreasing => "falling",
        TrendDirection::Stable => "unchanged",
    }
}

fn acceleration_word(acceleration: Acceleration) -> &'static str {
    match acceleration {
        Acceleration::Accelerating => "accelerating",
        Acceleration::Steady => "steady",
        Acceleration::Decelerating => "decelerating",
    }
}

fn evidence(input: &ExplanationInput<'_>) -> Vec<Evidence> {
    let scores = &input.card.scores;
    let mut evidence = vec![
        Evidence {
            source: "news2".to_string(),
            description: format!(
                "NEWS2 aggregate from {} parameters",
                scores.news2_parameters_used
            ),
            value: Some(scores.news2_score as f64),
            unit: None,
        },
        Evidence {
            source: "qsofa".to_string(),
            description: if input.card.qsofa_criteria.is_empty() {
                "No qSOFA criteria met".to_string()
            } else {
                input.card.qsofa_criteria.join(", ")
            },
            value: Some(scores.qsofa_score as f64),
            unit: None,
        },
    ];

    evidence.extend(
        input
            .signals
            .iter()
            .filter(|s| matches!(s.signal_type, SignalType::Vital | SignalType::Lab))
            .map(|s| {
                let trend = input.trends.iter().find(|t| t.code == s.code);
                Evidence {
                    source: s.code.clone(),
                    description: s.description.clone(),
                    value: s.values.as_ref().map(|v| v.current),
                    unit: trend.and_then(|t| t.unit.clone()),
                }
            }),
    );
    evidence
}

fn limitations(input: &ExplanationInput<'_>, factors: &[ConfidenceFactor]) -> Vec<String> {
    let mut limitations: Vec<String> = factors
        .iter()
        .filter(|f| !f.present)
        .map(|f| format!("{} not available in the analysis window or record", f.factor))
        .collect();

    if !input.trends.iter().any(|t| t.readings >= 2) {
        limitations.push("Insufficient serial readings for trend analysis".to_string());
    }
    limitations.push(
        "Rule-based assessment; supports but does not replace clinical judgment".to_string(),
    );
    limitations
}
