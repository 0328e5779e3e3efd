//! Static per-code reference ranges and hard clinical thresholds.

use crate::models::codes;

/// Which direction of change is clinically unfavorable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorseWhen {
    High,
    Low,
    /// Away from the middle of the reference range
    Both,
}

/// Reference range for one canonical code.
#[derive(Debug)]
pub struct ReferenceRange {
    pub code: &'static str,
    pub low: f64,
    pub high: f64,
    /// Values `<=` this are critical
    pub critical_low: Option<f64>,
    /// Values `>=` this are critical
    pub critical_high: Option<f64>,
    pub worse_when: WorseWhen,
}

impl ReferenceRange {
    pub fn is_abnormal(&self, value: f64) -> bool {
        value < self.low || value > self.high
    }

    pub fn is_critical(&self, value: f64) -> bool {
        self.critical_low.is_some_and(|c| value <= c)
            || self.critical_high.is_some_and(|c| value >= c)
    }

    /// Whether a move from `first` to `last` is clinically unfavorable.
    pub fn is_worse(&self, first: f64, last: f64) -> bool {
        match self.worse_when {
            WorseWhen::High => last > first,
            WorseWhen::Low => last < first,
            WorseWhen::Both => {
                let mid = (self.low + self.high) / 2.0;
                (last - mid).abs() > (first - mid).abs()
            }
        }
    }

    /// Human-readable range, e.g. "12-20".
    pub fn describe(&self) -> String {
        format!("{}-{}", self.low, self.high)
    }
}

const fn range(
    code: &'static str,
    low: f64,
    high: f64,
    critical_low: Option<f64>,
    critical_high: Option<f64>,
    worse_when: WorseWhen,
) -> ReferenceRange {
    ReferenceRange {
        code,
        low,
        high,
        critical_low,
        critical_high,
        worse_when,
    }
}

pub static REFERENCE_RANGES: &[ReferenceRange] = &[
    range(codes::RESPIRATORY_RATE, 12.0, 20.0, Some(8.0), Some(25.0), WorseWhen::Both),
    range(codes::OXYGEN_SATURATION, 96.0, 100.0, Some(91.0), None, WorseWhen::Low),
    range(codes::TEMPERATURE, 36.1, 38.0, Some(35.0), Some(39.1), WorseWhen::Both),
    range(codes::SYSTOLIC_BP, 111.0, 219.0, Some(90.0), Some(220.0), WorseWhen::Both),
    range(codes::DIASTOLIC_BP, 60.0, 90.0, Some(40.0), Some(120.0), WorseWhen::Both),
    range(codes::HEART_RATE, 51.0, 90.0, Some(40.0), Some(131.0), WorseWhen::Both),
    range(codes::GCS, 15.0, 15.0, Some(8.0), None, WorseWhen::Low),
    range(codes::WBC, 4.0, 11.0, Some(2.0), Some(20.0), WorseWhen::Both),
    range(codes::CRP, 0.0, 10.0, None, None, WorseWhen::High),
    range(codes::LACTATE, 0.5, 2.0, None, Some(4.0), WorseWhen::High),
    range(codes::CREATININE, 0.6, 1.3, None, Some(3.5), WorseWhen::High),
    range(codes::POTASSIUM, 3.5, 5.0, Some(2.5), Some(6.0), WorseWhen::Both),
    range(codes::SODIUM, 135.0, 145.0, Some(120.0), Some(160.0), WorseWhen::Both),
    range(codes::PROCALCITONIN, 0.0, 0.5, None, Some(10.0), WorseWhen::High),
    range(codes::HEMOGLOBIN, 12.0, 17.5, Some(7.0), None, WorseWhen::Low),
    range(codes::PLATELETS, 150.0, 400.0, Some(50.0), None, WorseWhen::Low),
    range(codes::BILIRUBIN, 0.1, 1.2, None, None, WorseWhen::High),
    range(codes::GLUCOSE, 70.0, 180.0, Some(54.0), Some(400.0), WorseWhen::Both),
];

/// Look up the reference range for a canonical code.
pub fn reference_range(code: &str) -> Option<&'static ReferenceRange> {
    REFERENCE_RANGES.iter().find(|r| r.code == code)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup() {
        assert!(reference_range(codes::LACTATE).is_some());
        assert!(reference_range("troponin").is_none());
    }

    #[test]
    fn test_critical_thresholds_inclusive() {
        let rr = reference_range(codes::RESPIRATORY_RATE).unwrap();
        assert!(rr.is_critical(25.0));
        assert!(!rr.is_critical(24.0));
        assert!(rr.is_critical(8.0));

        let lactate = reference_range(codes::LACTATE).unwrap();
        assert!(lactate.is_abnormal(2.5));
        assert!(!lactate.is_critical(3.9));
        assert!(lactate.is_critical(4.5));
    }

    #[test]
    fn test_worse_direction() {
        let spo2 = reference_range(codes::OXYGEN_SATURATION).unwrap();
        assert!(spo2.is_worse(97.0, 90.0));
        assert!(!spo2.is_worse(90.0, 97.0));

        // Falling blood pressure moves away from the middle of the range
        let sbp = reference_range(codes::SYSTOLIC_BP).unwrap();
        assert!(sbp.is_worse(125.0, 95.0));
        assert!(!sbp.is_worse(95.0, 125.0));
    }
}
