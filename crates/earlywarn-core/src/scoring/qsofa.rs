//! qSOFA-style sepsis screen: one point per criterion, no partial credit.

use crate::models::codes;
use crate::series::ObservationSeries;

use super::news2::{consciousness, Snapshot};

pub const RESPIRATORY_RATE_THRESHOLD: f64 = 22.0;
pub const SYSTOLIC_BP_THRESHOLD: f64 = 100.0;

/// qSOFA score (0 - 3) plus the criteria that were met.
#[derive(Debug, Clone, PartialEq)]
pub struct QsofaResult {
    pub score: u32,
    pub criteria: Vec<String>,
}

pub fn calculate(series: &ObservationSeries) -> QsofaResult {
    let mut criteria = Vec::new();

    if consciousness(series, Snapshot::Latest) == Some(true) {
        criteria.push("Altered mentation".to_string());
    }
    if let Some(rr) = series.latest_numeric(codes::RESPIRATORY_RATE) {
        if rr >= RESPIRATORY_RATE_THRESHOLD {
            criteria.push(format!("Respiratory rate {} ≥ 22/min", rr));
        }
    }
    if let Some(sbp) = series.latest_numeric(codes::SYSTOLIC_BP) {
        if sbp <= SYSTOLIC_BP_THRESHOLD {
            criteria.push(format!("Systolic BP {} ≤ 100 mmHg", sbp));
        }
    }

    QsofaResult {
        score: criteria.len() as u32,
        criteria,
    }
}
