//! Prompts for clinical deterioration narrative generation.
//!
//! The generator receives a structured JSON context (scores, trends, signals)
//! wrapped in [`make_insight_prompt`] and must answer with a single JSON object.

/// System prompt for the deterioration narrative.
pub const SYSTEM_PROMPT: &str = r#"You are a clinical decision-support assistant reviewing an early-warning analysis for a hospitalised patient.

You are given pre-computed, rule-based results:
- news2_score, qsofa_score, custom_risk_score
- risk_level and trajectory
- key signals with baseline/current values and severity
- recommended actions

Do not recompute or contradict the scores. Do not diagnose.
Describe the pattern you recognise, the likely short-term trajectory, how urgent
review is, differential considerations worth excluding, and interventions to consider.

Output JSON with the fields:
- pattern_recognition: string
- predicted_trajectory: string
- urgency_assessment: string
- differential_considerations: array of strings
- recommended_interventions: array of strings"#;

/// User prompt template wrapping the structured analysis context.
pub fn make_insight_prompt(context_json: &str) -> String {
    format!(
        r#"Review this early-warning analysis:

{}

Return a JSON object with:
- pattern_recognition: One or two sentences on the clinical pattern
- predicted_trajectory: Expected course over the next 12-24 hours
- urgency_assessment: How soon a clinician should review, and why
- differential_considerations: Conditions worth excluding (max 5)
- recommended_interventions: Interventions to consider (max 5)"#,
        context_json
    )
}
