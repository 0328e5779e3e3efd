//! Risk level classification. The worst applicable rule wins.

use crate::models::{RiskLevel, ScoreCard, Severity, Signal, Trajectory};

const NEWS2_CRITICAL: u32 = 7;
const NEWS2_HIGH: u32 = 5;
const NEWS2_MODERATE: u32 = 3;
const QSOFA_CRITICAL: u32 = 2;
const CUSTOM_RISK_MODERATE: u32 = 50;

/// Classify overall risk from scores, signal severity and trajectory.
pub fn classify_risk(card: &ScoreCard, signals: &[Signal], trajectory: Trajectory) -> RiskLevel {
    let scores = &card.scores;
    let worst_signal = signals.iter().map(|s| s.severity).max();
    let any_critical = worst_signal == Some(Severity::Critical);

    let news2 = if scores.news2_score >= NEWS2_CRITICAL {
        RiskLevel::Critical
    } else if scores.news2_score >= NEWS2_HIGH || card.max_news2_component() >= 3 {
        RiskLevel::High
    } else if scores.news2_score >= NEWS2_MODERATE {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };

    let qsofa = if scores.qsofa_score >= QSOFA_CRITICAL {
        RiskLevel::Critical
    } else {
        RiskLevel::Low
    };

    let signal = match worst_signal {
        Some(Severity::Critical) => RiskLevel::High,
        Some(Severity::High) => RiskLevel::Moderate,
        _ => RiskLevel::Low,
    };

    let trajectory_level = match trajectory {
        Trajectory::RapidlyWorsening if any_critical => RiskLevel::Critical,
        Trajectory::RapidlyWorsening | Trajectory::Worsening => RiskLevel::Moderate,
        _ => RiskLevel::Low,
    };

    let custom = if scores.custom_risk_score >= CUSTOM_RISK_MODERATE {
        RiskLevel::Moderate
    } else {
        RiskLevel::Low
    };

    [news2, qsofa, signal, trajectory_level, custom]
        .into_iter()
        .max()
        .unwrap_or(RiskLevel::Low)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Acceleration, News2Component, Scores, SignalType, TrendDirection};

    fn card(news2: u32, qsofa: u32, custom: u32) -> ScoreCard {
        ScoreCard {
            scores: Scores {
                news2_score: news2,
                news2_trend: TrendDirection::Stable,
                qsofa_score: qsofa,
                custom_risk_score: custom,
                trend_acceleration: Acceleration::Steady,
                news2_parameters_used: 6,
            },
            news2_components: Vec::new(),
            risk_contributions: Vec::new(),
            qsofa_criteria: Vec::new(),
        }
    }

    fn signal(severity: Severity) -> Signal {
        Signal {
            signal_type: SignalType::Lab,
            code: "lactate".into(),
            description: String::new(),
            severity,
            trend: TrendDirection::Increasing,
            values: None,
            time_span_hours: 0.0,
            clinical_significance: String::new(),
        }
    }

    #[test]
    fn test_news2_bands() {
        assert_eq!(classify_risk(&card(7, 0, 20), &[], Trajectory::Stable), RiskLevel::Critical);
        assert_eq!(classify_risk(&card(5, 0, 20), &[], Trajectory::Stable), RiskLevel::High);
        assert_eq!(classify_risk(&card(3, 0, 20), &[], Trajectory::Stable), RiskLevel::Moderate);
        assert_eq!(classify_risk(&card(0, 0, 20), &[], Trajectory::Stable), RiskLevel::Low);
    }

    #[test]
    fn test_red_score_is_high() {
        let mut card = card(3, 0, 20);
        card.news2_components.push(News2Component {
            parameter: "respiratory_rate".into(),
            value: Some(26.0),
            points: 3,
        });
        assert_eq!(classify_risk(&card, &[], Trajectory::Stable), RiskLevel::High);
    }

    #[test]
    fn test_worst_rule_wins() {
        let sepsis = card(0, 2, 20);
        assert_eq!(classify_risk(&sepsis, &[], Trajectory::Stable), RiskLevel::Critical);

        let quiet = card(0, 0, 60);
        assert_eq!(classify_risk(&quiet, &[], Trajectory::Stable), RiskLevel::Moderate);
    }

    #[test]
    fn test_rapid_worsening_with_critical_signal() {
        let card = card(0, 0, 20);
        let signals = [signal(Severity::Critical)];
        assert_eq!(
            classify_risk(&card, &signals, Trajectory::RapidlyWorsening),
            RiskLevel::Critical
        );
        assert_eq!(classify_risk(&card, &signals, Trajectory::Stable), RiskLevel::High);
    }
}
