//! Standardized severity scoring.
//!
//! Pipeline: NEWS2 (latest + earliest snapshot) → qSOFA → custom risk → acceleration

pub mod bands;
pub mod conditions;
pub mod custom_risk;
pub mod news2;
pub mod qsofa;

use std::collections::BTreeSet;

use crate::models::{
    Acceleration, PatientContext, ScoreCard, Scores, SeriesTrend, TrendDirection,
};
use crate::series::ObservationSeries;

use news2::Snapshot;

/// Computes the [`ScoreCard`] for one analysis run. Pure and deterministic.
#[derive(Debug, Default, Clone, Copy)]
pub struct ScoreCalculator;

impl ScoreCalculator {
    pub fn new() -> Self {
        Self
    }

    /// Score a windowed series.
    ///
    /// `trends` supplies the per-series acceleration; scoring itself never
    /// depends on trend classification.
    pub fn calculate(
        &self,
        series: &ObservationSeries,
        context: &PatientContext,
        trends: &[SeriesTrend],
    ) -> ScoreCard {
        let latest = news2::calculate(series, Snapshot::Latest);
        let earliest = news2::calculate(series, Snapshot::Earliest);
        let qsofa = qsofa::calculate(series);
        let custom = custom_risk::calculate(context, medication_count(series, context));

        let news2_trend = match latest.total.cmp(&earliest.total) {
            std::cmp::Ordering::Greater => TrendDirection::Increasing,
            std::cmp::Ordering::Less => TrendDirection::Decreasing,
            std::cmp::Ordering::Equal => TrendDirection::Stable,
        };

        ScoreCard {
            scores: Scores {
                news2_score: latest.total,
                news2_trend,
                qsofa_score: qsofa.score,
                custom_risk_score: custom.score,
                trend_acceleration: overall_acceleration(trends),
                news2_parameters_used: latest.parameters_used,
            },
            news2_components: latest.components,
            risk_contributions: custom.contributions,
            qsofa_criteria: qsofa.criteria,
        }
    }
}

/// Distinct medications: active event series plus the charted list.
pub fn medication_count(series: &ObservationSeries, context: &PatientContext) -> usize {
    let mut names: BTreeSet<String> = series.active_medication_names().into_iter().collect();
    names.extend(
        context
            .current_medications
            .iter()
            .map(|m| m.trim().to_lowercase())
            .filter(|m| !m.is_empty()),
    );
    names.len()
}

/// Accelerating if any worsening series speeds up; decelerating if every
/// worsening series slows down; otherwise steady.
pub fn overall_acceleration(trends: &[SeriesTrend]) -> Acceleration {
    let worsening: Vec<Acceleration> = trends
        .iter()
        .filter(|t| t.worsening)
        .map(|t| t.acceleration)
        .collect();

    if worsening.contains(&Acceleration::Accelerating) {
        Acceleration::Accelerating
    } else if !worsening.is_empty()
        && worsening.iter().all(|a| *a == Acceleration::Decelerating)
    {
        Acceleration::Decelerating
    } else {
        Acceleration::Steady
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::codes::CodeNormalizer;
    use crate::models::{AnalysisRequest, Observation, Velocity};
    use chrono::{Duration, TimeZone, Utc};

    fn trend(worsening: bool, acceleration: Acceleration) -> SeriesTrend {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        SeriesTrend {
            code: "lactate".into(),
            unit: None,
            readings: 3,
            first_value: 1.0,
            last_value: 2.0,
            first_at: t,
            last_at: t + Duration::hours(4),
            delta: 1.0,
            delta_percent: Some(100.0),
            direction: TrendDirection::Increasing,
            velocity: Velocity::Rapid,
            acceleration,
            abnormal: false,
            baseline_abnormal: false,
            critical: false,
            worsening,
        }
    }

    #[test]
    fn test_acceleration_rollup() {
        assert_eq!(overall_acceleration(&[]), Acceleration::Steady);
        assert_eq!(
            overall_acceleration(&[
                trend(true, Acceleration::Decelerating),
                trend(true, Acceleration::Accelerating),
            ]),
            Acceleration::Accelerating
        );
        assert_eq!(
            overall_acceleration(&[trend(true, Acceleration::Decelerating)]),
            Acceleration::Decelerating
        );
        // Improving series never drive acceleration
        assert_eq!(
            overall_acceleration(&[trend(false, Acceleration::Accelerating)]),
            Acceleration::Steady
        );
    }

    #[test]
    fn test_news2_trend_direction() {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        let mut request = AnalysisRequest::new("p1");
        request.vitals = vec![
            Observation::numeric("rr", 16.0, "/min", t),
            Observation::numeric("rr", 26.0, "/min", t + Duration::hours(12)),
        ];
        request.context.current_medications = vec!["Aspirin".into(), "aspirin ".into()];

        let series = ObservationSeries::from_request(&request, &CodeNormalizer::new());
        let card = ScoreCalculator::new().calculate(&series, &request.context, &[]);

        assert_eq!(card.scores.news2_score, 3);
        assert_eq!(card.scores.news2_trend, TrendDirection::Increasing);
        assert_eq!(medication_count(&series, &request.context), 1);
    }
}
