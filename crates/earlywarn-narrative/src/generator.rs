//! Pluggable narrative generator seam.

use thiserror::Error;

use crate::insights::{parse_insights_output, ClinicalInsights, InsightError};
use crate::prompts::{make_insight_prompt, SYSTEM_PROMPT};

/// Errors raised by a narrative generator backend.
#[derive(Error, Debug)]
pub enum GenerationError {
    #[error("Generator unavailable: {0}")]
    Unavailable(String),

    #[error("Inference error: {0}")]
    Inference(String),

    #[error("Invalid generator output: {0}")]
    InvalidOutput(#[from] InsightError),
}

pub type GenerationResult<T> = Result<T, GenerationError>;

/// An external capability that turns a structured analysis context into a narrative.
///
/// Implementations may block (remote HTTP, local inference); callers are expected
/// to run them off the async executor and bound them with a timeout.
pub trait NarrativeGenerator: Send + Sync {
    /// Identifier of the model behind this generator, recorded on the alert.
    fn model_id(&self) -> &str;

    /// Produce raw narrative output (expected to contain a JSON object).
    fn generate(&self, system_prompt: &str, user_prompt: &str) -> GenerationResult<String>;
}

/// Run a generator with the standard prompts around `context_json` and parse its answer.
pub fn generate_insights(
    generator: &dyn NarrativeGenerator,
    context_json: &str,
) -> GenerationResult<ClinicalInsights> {
    let raw = generator.generate(SYSTEM_PROMPT, &make_insight_prompt(context_json))?;
    Ok(parse_insights_output(&raw)?)
}

/// Mock generator for testing without a model backend.
///
/// Produces a deterministic answer from keywords found in the context.
pub struct MockGenerator;

impl MockGenerator {
    fn compose(prompt: &str) -> serde_json::Value {
        let context = prompt.to_lowercase();

        let patterns = [
            ("sepsis", "Sepsis", "Take blood cultures and start the sepsis pathway"),
            ("lactate", "Tissue hypoperfusion", "Repeat lactate within 2 hours"),
            ("oxygen_saturation", "Hypoxaemic respiratory failure", "Titrate oxygen to target saturation"),
            ("creatinine", "Acute kidney injury", "Review nephrotoxic medications"),
            ("crp", "Evolving infection", "Source review"),
        ];

        let mut differentials = Vec::new();
        let mut interventions = Vec::new();
        for (needle, differential, intervention) in patterns {
            if context.contains(needle) {
                differentials.push(differential);
                interventions.push(intervention);
            }
        }

        let (trajectory, urgency) = if context.contains("rapidly_worsening") {
            ("Further rapid deterioration likely", "Immediate review")
        } else if context.contains("worsening") {
            ("Gradual deterioration expected", "Review within one hour")
        } else if context.contains("improving") {
            ("Continued recovery expected", "Routine review")
        } else {
            ("No change expected", "Routine review")
        };

        serde_json::json!({
            "pattern_recognition": format!("{} contributing signal pattern(s) identified", differentials.len()),
            "predicted_trajectory": trajectory,
            "urgency_assessment": urgency,
            "differential_considerations": differentials,
            "recommended_interventions": interventions,
        })
    }
}

impl NarrativeGenerator for MockGenerator {
    fn model_id(&self) -> &str {
        "mock-narrative-v1"
    }

    fn generate(&self, _system_prompt: &str, user_prompt: &str) -> GenerationResult<String> {
        Ok(Self::compose(user_prompt).to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct GarbageGenerator;

    impl NarrativeGenerator for GarbageGenerator {
        fn model_id(&self) -> &str {
            "garbage"
        }

        fn generate(&self, _: &str, _: &str) -> GenerationResult<String> {
            Ok("the model rambles without any braces".into())
        }
    }

    #[test]
    fn test_mock_generator_parses() {
        let insights = generate_insights(
            &MockGenerator,
            r#"{"trajectory":"RAPIDLY_WORSENING","signals":["lactate","crp"]}"#,
        )
        .unwrap();

        assert_eq!(insights.urgency_assessment, "Immediate review");
        assert_eq!(insights.differential_considerations.len(), 2);
    }

    #[test]
    fn test_mock_generator_stable() {
        let insights = generate_insights(&MockGenerator, r#"{"trajectory":"STABLE"}"#).unwrap();
        assert_eq!(insights.predicted_trajectory, "No change expected");
        assert!(insights.recommended_interventions.is_empty());
    }

    struct CapturingGenerator(std::sync::Mutex<Vec<(String, String)>>);

    impl NarrativeGenerator for CapturingGenerator {
        fn model_id(&self) -> &str {
            "capture"
        }

        fn generate(&self, system: &str, user: &str) -> GenerationResult<String> {
            self.0.lock().unwrap().push((system.to_string(), user.to_string()));
            MockGenerator.generate(system, user)
        }
    }

    #[test]
    fn test_generator_receives_wrapped_context() {
        let generator = CapturingGenerator(std::sync::Mutex::new(Vec::new()));
        generate_insights(&generator, r#"{"news2_score":7}"#).unwrap();

        let calls = generator.0.lock().unwrap();
        assert_eq!(calls.len(), 1);
        let (system, user) = &calls[0];
        assert_eq!(system, SYSTEM_PROMPT);
        assert_eq!(user, &make_insight_prompt(r#"{"news2_score":7}"#));
        assert!(user.starts_with("Review this early-warning analysis:"));
    }

    #[test]
    fn test_garbage_output_is_error() {
        let err = generate_insights(&GarbageGenerator, "{}").unwrap_err();
        assert!(matches!(err, GenerationError::InvalidOutput(_)));
    }
}
