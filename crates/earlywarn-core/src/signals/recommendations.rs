//! Fixed rule table mapping detected patterns to recommended actions.
//!
//! Each pattern has a base priority that escalates to `immediate` when the
//! signal driving it is critical. Output order is deterministic.

use std::collections::HashSet;

use crate::models::{
    codes, EvidenceLevel, Priority, Recommendation, ScoreCard, SeriesTrend, Severity, Signal,
    SignalType, Trajectory,
};

/// Creatinine ratio to baseline that suggests acute kidney injury.
const AKI_RATIO: f64 = 1.5;
/// Absolute creatinine rise (mg/dL) that suggests acute kidney injury.
const AKI_ABSOLUTE_RISE: f64 = 0.3;

/// Detected clinical pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    SepsisWarning,
    InflammatoryProgression,
    AcuteKidneyInjury,
    RespiratoryDeterioration,
    HemodynamicInstability,
    News2Escalation,
    Recovery,
    /// Fallback when nothing else is detected
    Routine,
}

/// One row of the rule table.
struct Rule {
    pattern: Pattern,
    base_priority: Priority,
    action: &'static str,
    rationale: &'static str,
    evidence_level: EvidenceLevel,
    timeframe: &'static str,
}

static RULES: &[Rule] = &[
    Rule {
        pattern: Pattern::SepsisWarning,
        base_priority: Priority::Urgent,
        action: "Initiate sepsis screening: blood cultures, repeat lactate, consider broad-spectrum antibiotics",
        rationale: "Screening criteria for sepsis are met",
        evidence_level: EvidenceLevel::A,
        timeframe: "Within 1 hour",
    },
    Rule {
        pattern: Pattern::RespiratoryDeterioration,
        base_priority: Priority::Urgent,
        action: "Urgent respiratory assessment: arterial blood gas, chest imaging, titrate oxygen to target saturation",
        rationale: "Respiratory parameters or oxygen requirement are worsening",
        evidence_level: EvidenceLevel::B,
        timeframe: "Within 30 minutes",
    },
    Rule {
        pattern: Pattern::HemodynamicInstability,
        base_priority: Priority::Urgent,
        action: "Assess perfusion and fluid responsiveness; consider critical care review",
        rationale: "Blood pressure, heart rate or vasopressor requirement indicate circulatory compromise",
        evidence_level: EvidenceLevel::B,
        timeframe: "Within 30 minutes",
    },
    Rule {
        pattern: Pattern::News2Escalation,
        base_priority: Priority::Urgent,
        action: "Urgent review by a clinician competent in acute illness; increase observations to at least hourly",
        rationale: "NEWS2 aggregate or single-parameter score at the urgent response threshold",
        evidence_level: EvidenceLevel::A,
        timeframe: "Within 1 hour",
    },
    Rule {
        pattern: Pattern::AcuteKidneyInjury,
        base_priority: Priority::Urgent,
        action: "Assess for acute kidney injury: review fluid balance, urine output and nephrotoxic medications",
        rationale: "Creatinine has risen above the acute kidney injury threshold",
        evidence_level: EvidenceLevel::B,
        timeframe: "Within 6 hours",
    },
    Rule {
        pattern: Pattern::InflammatoryProgression,
        base_priority: Priority::Routine,
        action: "Review likely source of inflammation; repeat inflammatory markers and consider imaging",
        rationale: "Inflammatory markers are rising",
        evidence_level: EvidenceLevel::B,
        timeframe: "Within 12 hours",
    },
    Rule {
        pattern: Pattern::Recovery,
        base_priority: Priority::Routine,
        action: "Continue current management; consider reducing observation frequency",
        rationale: "Previously abnormal parameters have returned to the reference range",
        evidence_level: EvidenceLevel::C,
        timeframe: "Next scheduled review",
    },
];

const ROUTINE_MONITORING: Rule = Rule {
    pattern: Pattern::Routine,
    base_priority: Priority::Routine,
    action: "Continue routine monitoring per the NEWS2 observation schedule",
    rationale: "No pattern requiring escalation was detected",
    evidence_level: EvidenceLevel::ExpertOpinion,
    timeframe: "Per routine schedule",
};

/// Inputs the rule table is evaluated against.
pub struct PatternInput<'a> {
    pub card: &'a ScoreCard,
    pub trends: &'a [SeriesTrend],
    pub signals: &'a [Signal],
    pub trajectory: Trajectory,
}

impl PatternInput<'_> {
    fn trend(&self, code: &str) -> Option<&SeriesTrend> {
        self.trends.iter().find(|t| t.code == code)
    }

    fn abnormal(&self, code: &str) -> bool {
        self.trend(code).is_some_and(|t| t.abnormal)
    }

    fn worsening(&self, code: &str) -> bool {
        self.trend(code).is_some_and(|t| t.worsening)
    }

    /// Highest severity among signals matching a predicate.
    fn max_severity(&self, predicate: impl Fn(&Signal) -> bool) -> Option<Severity> {
        self.signals.iter().filter(|s| predicate(s)).map(|s| s.severity).max()
    }

    fn code_severity(&self, codes: &[&str]) -> Option<Severity> {
        self.max_severity(|s| codes.contains(&s.code.as_str()))
    }

    /// Driving severity when the pattern is present, `None` when absent.
    fn detect(&self, pattern: Pattern) -> Option<Severity> {
        let scores = &self.card.scores;
        match pattern {
            Pattern::SepsisWarning => {
                let lactate_plus = self.abnormal(codes::LACTATE)
                    && (self.abnormal(codes::TEMPERATURE) || self.abnormal(codes::WBC));
                (scores.qsofa_score >= 2 || lactate_plus).then(|| {
                    self.code_severity(&["qsofa", codes::LACTATE])
                        .unwrap_or(Severity::High)
                })
            }
            Pattern::InflammatoryProgression => {
                let markers = [codes::CRP, codes::WBC, codes::PROCALCITONIN];
                markers
                    .iter()
                    .any(|c| self.worsening(c))
                    .then(|| self.code_severity(&markers).unwrap_or(Severity::Moderate))
            }
            Pattern::AcuteKidneyInjury => {
                let t = self.trend(codes::CREATININE).filter(|t| t.readings >= 2)?;
                let ratio_hit = t.first_value > 0.0 && t.last_value >= t.first_value * AKI_RATIO;
                let rise_hit = t.delta >= AKI_ABSOLUTE_RISE;
                (ratio_hit || rise_hit)
                    .then(|| self.code_severity(&[codes::CREATININE]).unwrap_or(Severity::Moderate))
            }
            Pattern::RespiratoryDeterioration => {
                let present = self.worsening(codes::RESPIRATORY_RATE)
                    || self.worsening(codes::OXYGEN_SATURATION)
                    || self.signals.iter().any(|s| s.signal_type == SignalType::Oxygen);
                present.then(|| {
                    self.max_severity(|s| {
                        s.signal_type == SignalType::Oxygen
                            || s.code == codes::RESPIRATORY_RATE
                            || s.code == codes::OXYGEN_SATURATION
                    })
                    .unwrap_or(Severity::Moderate)
                })
            }
            Pattern::HemodynamicInstability => {
                let pressure = self.abnormal(codes::SYSTOLIC_BP) && self.worsening(codes::SYSTOLIC_BP);
                let rate = self.abnormal(codes::HEART_RATE) && self.worsening(codes::HEART_RATE);
                let pressor = self.signals.iter().any(|s| {
                    s.signal_type == SignalType::Medication && s.severity == Severity::Critical
                });
                (pressure || rate || pressor).then(|| {
                    self.max_severity(|s| {
                        s.code == codes::SYSTOLIC_BP
                            || s.code == codes::HEART_RATE
                            || s.signal_type == SignalType::Medication
                    })
                    .unwrap_or(Severity::Moderate)
                })
            }
            Pattern::News2Escalation => {
                (scores.news2_score >= 5 || self.card.max_news2_component() >= 3).then(|| {
                    self.code_severity(&["news2"]).unwrap_or(Severity::High)
                })
            }
            Pattern::Recovery => {
                (self.trajectory == Trajectory::Improving).then_some(Severity::Low)
            }
            Pattern::Routine => None,
        }
    }
}

/// Evaluate the rule table.
///
/// Sorted by priority (most pressing first), then table order, with
/// duplicate actions removed.
pub fn recommend(input: &PatternInput<'_>) -> Vec<Recommendation> {
    let mut recommendations: Vec<Recommendation> = RULES
        .iter()
        .filter_map(|rule| input.detect(rule.pattern).map(|s| build(rule, s)))
        .collect();

    if recommendations.is_empty() {
        recommendations.push(build(&ROUTINE_MONITORING, Severity::Low));
    }

    recommendations.sort_by(|a, b| b.priority.cmp(&a.priority));

    let mut seen = HashSet::new();
    recommendations.retain(|r| seen.insert(r.action.clone()));
    recommendations
}

fn build(rule: &Rule, driving: Severity) -> Recommendation {
    let priority = if driving == Severity::Critical {
        Priority::Immediate
    } else {
        rule.base_priority
    };
    Recommendation {
        priority,
        action: rule.action.to_string(),
        rationale: rule.rationale.to_string(),
        evidence_level: rule.evidence_level,
        timeframe: if priority == Priority::Immediate {
            "Immediately".to_string()
        } else {
            rule.timeframe.to_string()
        },
    }
}
