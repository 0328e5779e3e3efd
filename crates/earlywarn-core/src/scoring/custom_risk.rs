//! Transparent weighted risk score (0 - 100).
//!
//! Every point is itemized as a [`RiskContribution`] so a reviewer can
//! reconstruct the score by hand.

use crate::models::{PatientContext, RiskContribution};

use super::conditions::match_categories;

pub const BASE_SCORE: i32 = 20;
pub const MAX_SCORE: i32 = 100;

/// Age bands: (minimum age, points), checked in order.
const AGE_BANDS: &[(u32, i32)] = &[(75, 25), (65, 15), (55, 10)];

/// Comorbidity count bands: (minimum count, points), checked in order.
const COMORBIDITY_BANDS: &[(usize, i32)] = &[(5, 15), (3, 10), (1, 5)];

/// Medication count bands: (minimum count, points), checked in order.
const MEDICATION_BANDS: &[(usize, i32)] = &[(10, 15), (5, 8)];

const POINTS_PER_ACTIVE_CASE: i32 = 5;
const EXISTING_ALERT_POINTS: i32 = 10;

/// Score and its itemized contributions.
#[derive(Debug, Clone, PartialEq)]
pub struct CustomRiskResult {
    pub score: u32,
    pub contributions: Vec<RiskContribution>,
}

/// Compute the custom risk score.
///
/// `medication_count` is the number of distinct active medications.
pub fn calculate(context: &PatientContext, medication_count: usize) -> CustomRiskResult {
    let mut contributions = vec![RiskContribution {
        factor: "Baseline".to_string(),
        points: BASE_SCORE,
    }];

    if let Some(age) = context.age {
        if let Some((min, points)) = AGE_BANDS.iter().find(|(min, _)| age >= *min) {
            contributions.push(RiskContribution {
                factor: format!("Age {} (≥{})", age, min),
                points: *points,
            });
        }
    }

    let comorbidities = context.comorbidity_list();
    if let Some((min, points)) = COMORBIDITY_BANDS
        .iter()
        .find(|(min, _)| comorbidities.len() >= *min)
    {
        contributions.push(RiskContribution {
            factor: format!("{} comorbidities (≥{})", comorbidities.len(), min),
            points: *points,
        });
    }

    for rule in match_categories(comorbidities) {
        contributions.push(RiskContribution {
            factor: format!("High-risk condition: {}", rule.category.as_str()),
            points: rule.points,
        });
    }

    if let Some((min, points)) = MEDICATION_BANDS
        .iter()
        .find(|(min, _)| medication_count >= *min)
    {
        contributions.push(RiskContribution {
            factor: format!("{} active medications (≥{})", medication_count, min),
            points: *points,
        });
    }

    if context.active_case_count > 0 {
        let points = (context.active_case_count as i32).saturating_mul(POINTS_PER_ACTIVE_CASE);
        contributions.push(RiskContribution {
            factor: format!("{} active case(s)", context.active_case_count),
            points,
        });
    }

    if context.has_existing_risk_alert {
        contributions.push(RiskContribution {
            factor: "Existing risk alert".to_string(),
            points: EXISTING_ALERT_POINTS,
        });
    }

    let total = contributions
        .iter()
        .fold(0i32, |acc, c| acc.saturating_add(c.points));

    CustomRiskResult {
        score: total.clamp(0, MAX_SCORE) as u32,
        contributions,
    }
}
