//! Severity-tagged signals from trends, therapy events, scores and context.

use crate::models::codes::{self, display_name};
use crate::models::{
    MedicationEvent, OxygenSupportEvent, OxygenSupportType, PatientContext, ScoreCard,
    SeriesTrend, Severity, Signal, SignalType, SignalValues, TherapyAction, TrendDirection,
    Velocity,
};
use crate::scoring::medication_count;
use crate::series::{ObservationSeries, SeriesKind};
use crate::trends::reference_range;

const ELDERLY_AGE: u32 = 75;
const COMORBIDITY_BURDEN: usize = 3;
const HIGH_COMORBIDITY_BURDEN: usize = 5;
const POLYPHARMACY: usize = 10;

const VASOPRESSOR_NAMES: &[&str] = &[
    "norepinephrine",
    "noradrenaline",
    "epinephrine",
    "adrenaline",
    "vasopressin",
    "dopamine",
    "phenylephrine",
    "dobutamine",
];

const ANTIMICROBIAL_CATEGORIES: &[&str] =
    &["antibiotic", "antimicrobial", "antifungal", "antiviral", "antibacterial"];

/// Signal severity for a trend; `None` when the series is neither abnormal nor
/// significantly moving.
pub fn trend_severity(trend: &SeriesTrend) -> Option<Severity> {
    let significant_worsening = trend.worsening && trend.is_significant();
    if !trend.abnormal && !trend.is_significant() {
        return None;
    }

    let severity = if trend.critical || (trend.worsening && trend.velocity == Velocity::Rapid) {
        Severity::Critical
    } else if trend.abnormal && trend.worsening {
        Severity::High
    } else if trend.abnormal || significant_worsening {
        Severity::Moderate
    } else {
        Severity::Low
    };
    Some(severity)
}

/// Builds signals. Output is sorted most severe first; ties keep generation order.
#[derive(Debug, Default, Clone, Copy)]
pub struct SignalGenerator;

impl SignalGenerator {
    pub fn new() -> Self {
        Self
    }

    pub fn generate(
        &self,
        series: &ObservationSeries,
        trends: &[SeriesTrend],
        card: &ScoreCard,
        context: &PatientContext,
    ) -> Vec<Signal> {
        let mut signals: Vec<Signal> = trends
            .iter()
            .filter_map(|t| trend_signal(t, series.kind(&t.code)))
            .collect();

        signals.extend(series.oxygen_events_in_window().filter_map(oxygen_signal));
        signals.extend(series.medication_events_in_window().filter_map(medication_signal));
        signals.extend(clinical_signals(card));
        signals.extend(composite_signals(context, medication_count(series, context)));

        signals.sort_by(|a, b| b.severity.cmp(&a.severity));
        signals
    }
}

fn trend_signal(trend: &SeriesTrend, kind: Option<SeriesKind>) -> Option<Signal> {
    let severity = trend_severity(trend)?;
    let name = display_name(&trend.code);
    let unit = trend
        .unit
        .as_deref()
        .filter(|u| !u.is_empty())
        .map(|u| format!(" {}", u))
        .unwrap_or_default();

    let movement = match trend.direction {
        TrendDirection::Increasing => "rising",
        TrendDirection::Decreasing => "falling",
        TrendDirection::Stable => "unchanged",
    };
    let mut description = if trend.readings >= 2 {
        format!(
            "{} {} ({} → {}{})",
            name, movement, trend.first_value, trend.last_value, unit
        )
    } else {
        format!("{} {}{}", name, trend.last_value, unit)
    };
    if trend.abnormal {
        if let Some(range) = reference_range(&trend.code) {
            description.push_str(&format!(", outside reference {}", range.describe()));
        }
    }

    Some(Signal {
        signal_type: match kind {
            Some(SeriesKind::Lab) => SignalType::Lab,
            _ => SignalType::Vital,
        },
        code: trend.code.clone(),
        description,
        severity,
        trend: trend.direction,
        values: Some(SignalValues {
            baseline: trend.first_value,
            current: trend.last_value,
            change: trend.delta,
            change_percent: trend.delta_percent,
        }),
        time_span_hours: trend.span_hours(),
        clinical_significance: significance(&trend.code, severity),
    })
}

fn significance(code: &str, severity: Severity) -> String {
    let base = match code {
        codes::RESPIRATORY_RATE => "Respiratory rate is the most sensitive early marker of deterioration",
        codes::OXYGEN_SATURATION => "Falling saturation indicates impaired gas exchange",
        codes::TEMPERATURE => "Temperature derangement may indicate infection",
        codes::SYSTOLIC_BP => "Hypotension suggests impaired perfusion",
        codes::HEART_RATE => "Heart rate change may reflect sepsis, hypovolaemia or arrhythmia",
        codes::LACTATE => "Lactate is a marker of tissue hypoperfusion",
        codes::CREATININE => "Rising creatinine suggests declining renal function",
        codes::WBC => "White cell derangement may indicate infection or marrow suppression",
        codes::CRP | codes::PROCALCITONIN => "Inflammatory marker consistent with active infection",
        codes::POTASSIUM => "Potassium derangement carries arrhythmia risk",
        _ => "Outside expected range or changing significantly",
    };
    match severity {
        Severity::Critical => format!("{}; critical finding requiring immediate attention", base),
        _ => base.to_string(),
    }
}

fn oxygen_signal(event: &OxygenSupportEvent) -> Option<Signal> {
    if !event.action.is_escalation() || event.support_type == OxygenSupportType::RoomAir {
        return None;
    }

    let severity = if event.support_type.is_advanced() {
        Severity::Critical
    } else {
        Severity::High
    };
    let mut description = format!(
        "Oxygen support {}: {}",
        event.action.as_str(),
        event.support_type.label()
    );
    if let Some(flow) = event.flow_rate {
        description.push_str(&format!(" at {} L/min", flow));
    }
    if let Some(fio2) = event.fio2 {
        description.push_str(&format!(", FiO2 {}", fio2));
    }

    Some(Signal {
        signal_type: SignalType::Oxygen,
        code: "oxygen_support".to_string(),
        description,
        severity,
        trend: TrendDirection::Increasing,
        values: None,
        time_span_hours: 0.0,
        clinical_significance: "New or increasing oxygen requirement indicates respiratory compromise"
            .to_string(),
    })
}

fn is_vasopressor(event: &MedicationEvent) -> bool {
    let category = event.category.to_lowercase();
    let name = event.medication_name.to_lowercase();
    category.contains("vasopressor")
        || category.contains("inotrope")
        || VASOPRESSOR_NAMES.iter().any(|v| name.contains(v))
}

fn is_antimicrobial(event: &MedicationEvent) -> bool {
    let category = event.category.to_lowercase();
    ANTIMICROBIAL_CATEGORIES.iter().any(|c| category.contains(c))
}

fn medication_signal(event: &MedicationEvent) -> Option<Signal> {
    let (severity, significance) = if is_vasopressor(event) && event.action.is_escalation() {
        (
            Severity::Critical,
            "Vasopressor support indicates circulatory failure",
        )
    } else if is_antimicrobial(event) && event.action == TherapyAction::Started {
        (
            Severity::Moderate,
            "New antimicrobial therapy suggests suspected infection",
        )
    } else {
        return None;
    };

    Some(Signal {
        signal_type: SignalType::Medication,
        code: event.medication_name.trim().to_lowercase(),
        description: format!(
            "{} {} ({})",
            event.medication_name,
            event.action.as_str(),
            event.category
        ),
        severity,
        trend: TrendDirection::Increasing,
        values: None,
        time_span_hours: 0.0,
        clinical_significance: significance.to_string(),
    })
}

fn clinical_signals(card: &ScoreCard) -> Vec<Signal> {
    let mut signals = Vec::new();
    let scores = &card.scores;

    if scores.news2_score >= 5 {
        let severity = if scores.news2_score >= 7 {
            Severity::Critical
        } else {
            Severity::High
        };
        signals.push(Signal {
            signal_type: SignalType::Clinical,
            code: "news2".to_string(),
            description: format!("NEWS2 score {}", scores.news2_score),
            severity,
            trend: scores.news2_trend,
            values: None,
            time_span_hours: 0.0,
            clinical_significance: "Aggregate early warning score above the urgent response threshold"
                .to_string(),
        });
    }

    if scores.qsofa_score >= 2 {
        signals.push(Signal {
            signal_type: SignalType::Clinical,
            code: "qsofa".to_string(),
            description: format!(
                "qSOFA {} ({})",
                scores.qsofa_score,
                card.qsofa_criteria.join(", ")
            ),
            severity: Severity::Critical,
            trend: TrendDirection::Stable,
            values: None,
            time_span_hours: 0.0,
            clinical_significance: "Positive sepsis screen; high risk of poor outcome".to_string(),
        });
    }

    signals
}

fn composite(code: &str, description: String, severity: Severity, significance: &str) -> Signal {
    Signal {
        signal_type: SignalType::Composite,
        code: code.to_string(),
        description,
        severity,
        trend: TrendDirection::Stable,
        values: None,
        time_span_hours: 0.0,
        clinical_significance: significance.to_string(),
    }
}

fn composite_signals(context: &PatientContext, medications: usize) -> Vec<Signal> {
    let mut signals = Vec::new();

    if let Some(age) = context.age.filter(|a| *a >= ELDERLY_AGE) {
        signals.push(composite(
            "age",
            format!("Age {}", age),
            Severity::Moderate,
            "Advanced age reduces physiological reserve",
        ));
    }

    let comorbidities = context.comorbidity_list().len();
    if comorbidities >= COMORBIDITY_BURDEN {
        let severity = if comorbidities >= HIGH_COMORBIDITY_BURDEN {
            Severity::High
        } else {
            Severity::Moderate
        };
        signals.push(composite(
            "comorbidity_burden",
            format!("{} documented comorbidities", comorbidities),
            severity,
            "High comorbidity burden increases deterioration risk",
        ));
    }

    if medications >= POLYPHARMACY {
        signals.push(composite(
            "polypharmacy",
            format!("{} active medications", medications),
            Severity::Moderate,
            "Polypharmacy increases risk of adverse drug events",
        ));
    }

    let severe: Vec<&str> = context
        .allergies
        .iter()
        .filter(|a| a.is_severe())
        .map(|a| a.substance.as_str())
        .collect();
    if !severe.is_empty() {
        signals.push(composite(
            "severe_allergy",
            format!("Severe allergies: {}", severe.join(", ")),
            Severity::Moderate,
            "Restricts treatment options",
        ));
    }

    signals
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Acceleration, Allergy, AllergySeverity};
    use chrono::{Duration, TimeZone, Utc};

    fn trend(code: &str, first: f64, last: f64) -> SeriesTrend {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        crate::trends::TrendAnalyzer::default()
            .analyze_series(
                code,
                &[
                    crate::series::Reading {
                        value: crate::models::ObservationValue::Numeric(first),
                        unit: None,
                        timestamp: t,
                    },
                    crate::series::Reading {
                        value: crate::models::ObservationValue::Numeric(last),
                        unit: None,
                        timestamp: t + Duration::hours(12),
                    },
                ],
            )
            .unwrap()
    }

    #[test]
    fn test_trend_severity_bands() {
        // Critical threshold breach
        assert_eq!(trend_severity(&trend(codes::LACTATE, 2.0, 4.5)), Some(Severity::Critical));
        // Abnormal and worsening, not rapid
        assert_eq!(trend_severity(&trend(codes::WBC, 12.0, 15.0)), Some(Severity::High));
        // Abnormal but stable
        assert_eq!(trend_severity(&trend(codes::CRP, 40.0, 41.0)), Some(Severity::Moderate));
        // Normal and stable: no signal
        assert_eq!(trend_severity(&trend(codes::HEART_RATE, 70.0, 72.0)), None);
    }

    #[test]
    fn test_rapid_rise_within_range_is_critical() {
        let t = trend(codes::LACTATE, 0.8, 1.9);
        assert!(!t.abnormal);
        assert_eq!(t.velocity, Velocity::Rapid);
        assert_eq!(trend_severity(&t), Some(Severity::Critical));
    }

    #[test]
    fn test_improving_abnormal_is_moderate() {
        let t = trend(codes::CRP, 80.0, 40.0);
        assert!(!t.worsening);
        assert_eq!(trend_severity(&t), Some(Severity::Moderate));
        assert_eq!(t.acceleration, Acceleration::Steady);
    }

    #[test]
    fn test_composite_signals() {
        let context = PatientContext {
            age: Some(82),
            comorbidities: Some(vec!["a".into(), "b".into(), "c".into()]),
            allergies: vec![Allergy {
                substance: "penicillin".into(),
                severity: AllergySeverity::Anaphylaxis,
            }],
            ..Default::default()
        };

        let signals = composite_signals(&context, 11);
        let codes: Vec<&str> = signals.iter().map(|s| s.code.as_str()).collect();
        assert_eq!(codes, vec!["age", "comorbidity_burden", "polypharmacy", "severe_allergy"]);
        assert!(signals.iter().all(|s| s.signal_type == SignalType::Composite));
    }

    #[test]
    fn test_vasopressor_is_critical() {
        let event = MedicationEvent {
            id: "m1".into(),
            medication_name: "Noradrenaline".into(),
            category: "cardiovascular".into(),
            action: TherapyAction::Started,
            timestamp: Utc::now(),
        };
        assert_eq!(medication_signal(&event).unwrap().severity, Severity::Critical);

        let stopped = MedicationEvent {
            action: TherapyAction::Stopped,
            ..event
        };
        assert!(medication_signal(&stopped).is_none());
    }

    #[test]
    fn test_advanced_oxygen_is_critical() {
        let event = OxygenSupportEvent {
            id: "o1".into(),
            support_type: OxygenSupportType::HighFlow,
            flow_rate: Some(40.0),
            fio2: Some(0.6),
            action: TherapyAction::Started,
            timestamp: Utc::now(),
        };
        let signal = oxygen_signal(&event).unwrap();
        assert_eq!(signal.severity, Severity::Critical);
        assert_eq!(signal.signal_type, SignalType::Oxygen);
    }
}
