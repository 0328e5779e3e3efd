//! Parsing and validation of generator output.
//!
//! Generator output is untrusted: it may wrap the JSON in prose, omit fields,
//! or return absurdly long text. Everything that leaves this module has been
//! trimmed and capped.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Longest accepted free-text field, in characters.
pub const MAX_FIELD_CHARS: usize = 1_000;

/// Longest accepted list field.
pub const MAX_LIST_ITEMS: usize = 8;

/// Insight parsing errors.
#[derive(Error, Debug)]
pub enum InsightError {
    #[error("JSON parse error: {0}")]
    JsonParse(#[from] serde_json::Error),

    #[error("Invalid response format: {0}")]
    InvalidFormat(String),

    #[error("Missing required field: {0}")]
    MissingField(&'static str),
}

pub type InsightResult<T> = Result<T, InsightError>;

/// Raw generator answer before validation.
#[derive(Debug, Clone, Deserialize)]
struct RawInsights {
    #[serde(default)]
    pattern_recognition: Option<String>,
    #[serde(default)]
    predicted_trajectory: Option<String>,
    #[serde(default)]
    urgency_assessment: Option<String>,
    #[serde(default)]
    differential_considerations: Vec<String>,
    #[serde(default)]
    recommended_interventions: Vec<String>,
}

/// Validated narrative insights.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClinicalInsights {
    pub pattern_recognition: String,
    pub predicted_trajectory: String,
    pub urgency_assessment: String,
    pub differential_considerations: Vec<String>,
    pub recommended_interventions: Vec<String>,
}

/// Parse generator output into validated insights.
pub fn parse_insights_output(output: &str) -> InsightResult<ClinicalInsights> {
    // Generators like to add a preamble; take the outermost object.
    let json_start = output.find('{').ok_or_else(|| {
        InsightError::InvalidFormat("No JSON object found in response".into())
    })?;
    let json_end = output.rfind('}').ok_or_else(|| {
        InsightError::InvalidFormat("No closing brace found in response".into())
    })?;
    if json_end < json_start {
        return Err(InsightError::InvalidFormat(
            "Closing brace precedes opening brace".into(),
        ));
    }

    let raw: RawInsights = serde_json::from_str(&output[json_start..=json_end])?;
    validate(raw)
}

fn validate(raw: RawInsights) -> InsightResult<ClinicalInsights> {
    let pattern_recognition = required_text(raw.pattern_recognition, "pattern_recognition")?;
    let urgency_assessment = required_text(raw.urgency_assessment, "urgency_assessment")?;
    let predicted_trajectory = raw
        .predicted_trajectory
        .map(|s| clip(&s))
        .unwrap_or_default();

    Ok(ClinicalInsights {
        pattern_recognition,
        predicted_trajectory,
        urgency_assessment,
        differential_considerations: clean_list(raw.differential_considerations),
        recommended_interventions: clean_list(raw.recommended_interventions),
    })
}

fn required_text(value: Option<String>, field: &'static str) -> InsightResult<String> {
    let text = value.map(|s| clip(&s)).unwrap_or_default();
    if text.is_empty() {
        return Err(InsightError::MissingField(field));
    }
    Ok(text)
}

fn clean_list(items: Vec<String>) -> Vec<String> {
    items
        .iter()
        .map(|s| clip(s))
        .filter(|s| !s.is_empty())
        .take(MAX_LIST_ITEMS)
        .collect()
}

/// Trim and truncate to [`MAX_FIELD_CHARS`] on a char boundary.
fn clip(text: &str) -> String {
    text.trim().chars().take(MAX_FIELD_CHARS).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const VALID: &str = r#"{"pattern_recognition":"Fever with tachypnoea","predicted_trajectory":"Worsening","urgency_assessment":"Review within 30 minutes","differential_considerations":["Sepsis"],"recommended_interventions":["Blood cultures","Lactate"]}"#;

    #[test]
    fn test_parse_valid_output() {
        let insights = parse_insights_output(VALID).unwrap();
        assert_eq!(insights.pattern_recognition, "Fever with tachypnoea");
        assert_eq!(insights.differential_considerations, vec!["Sepsis"]);
        assert_eq!(insights.recommended_interventions.len(), 2);
    }

    #[test]
    fn test_parse_output_with_prefix() {
        let output = format!("Here is my assessment:\n{}\nHope this helps.", VALID);
        let insights = parse_insights_output(&output).unwrap();
        assert_eq!(insights.urgency_assessment, "Review within 30 minutes");
    }

    #[test]
    fn test_missing_required_field() {
        let output = r#"{"pattern_recognition":"  ","urgency_assessment":"Soon"}"#;
        let err = parse_insights_output(output).unwrap_err();
        assert!(matches!(err, InsightError::MissingField("pattern_recognition")));
    }

    #[test]
    fn test_no_json() {
        let err = parse_insights_output("I cannot help with that").unwrap_err();
        assert!(matches!(err, InsightError::InvalidFormat(_)));
    }

    #[test]
    fn test_reversed_braces() {
        let err = parse_insights_output("} nothing {").unwrap_err();
        assert!(matches!(err, InsightError::InvalidFormat(_)));
    }

    #[test]
    fn test_lists_are_capped_and_cleaned() {
        let many: Vec<String> = (0..20).map(|i| format!("item {}", i)).collect();
        let output = serde_json::json!({
            "pattern_recognition": "p",
            "urgency_assessment": "u",
            "differential_considerations": many,
            "recommended_interventions": ["", "  fluids  "],
        })
        .to_string();

        let insights = parse_insights_output(&output).unwrap();
        assert_eq!(insights.differential_considerations.len(), MAX_LIST_ITEMS);
        assert_eq!(insights.recommended_interventions, vec!["fluids"]);
        assert_eq!(insights.predicted_trajectory, "");
    }

    #[test]
    fn test_long_text_truncated() {
        let long = "x".repeat(MAX_FIELD_CHARS * 3);
        let output = serde_json::json!({
            "pattern_recognition": long,
            "urgency_assessment": "u",
        })
        .to_string();

        let insights = parse_insights_output(&output).unwrap();
        assert_eq!(insights.pattern_recognition.chars().count(), MAX_FIELD_CHARS);
    }

    proptest! {
        #[test]
        fn parse_never_panics(input in ".*") {
            let _ = parse_insights_output(&input);
        }
    }
}
