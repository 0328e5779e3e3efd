//! Overall trajectory from per-series trends.

use crate::models::{codes, SeriesTrend, Trajectory, Velocity};

/// Codes whose rapid worsening alone forces `RAPIDLY_WORSENING`.
pub const SENTINEL_CODES: &[&str] = &[
    codes::LACTATE,
    codes::OXYGEN_SATURATION,
    codes::CREATININE,
    codes::RESPIRATORY_RATE,
    codes::SYSTOLIC_BP,
];

/// Trajectory implied by a single series.
pub fn implied_trajectory(trend: &SeriesTrend) -> Trajectory {
    let rapid = trend.worsening && trend.velocity == Velocity::Rapid;

    if rapid && (SENTINEL_CODES.contains(&trend.code.as_str()) || trend.critical) {
        Trajectory::RapidlyWorsening
    } else if trend.abnormal && trend.worsening {
        Trajectory::Worsening
    } else {
        Trajectory::Stable
    }
}

/// Compose the overall trajectory. Never more favorable than the worst series.
pub fn classify(trends: &[SeriesTrend]) -> Trajectory {
    let worst = trends
        .iter()
        .map(implied_trajectory)
        .max()
        .unwrap_or(Trajectory::Stable);

    let any_abnormal = trends.iter().any(|t| t.abnormal);
    let any_recovered = trends.iter().any(|t| t.recovered());

    if worst == Trajectory::Stable && !any_abnormal && any_recovered {
        Trajectory::Improving
    } else {
        worst
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Acceleration, TrendDirection};
    use chrono::{Duration, TimeZone, Utc};

    fn trend(code: &str) -> SeriesTrend {
        let t = Utc.with_ymd_and_hms(2024, 3, 1, 8, 0, 0).unwrap();
        SeriesTrend {
            code: code.into(),
            unit: None,
            readings: 2,
            first_value: 1.0,
            last_value: 1.0,
            first_at: t,
            last_at: t + Duration::hours(6),
            delta: 0.0,
            delta_percent: Some(0.0),
            direction: TrendDirection::Stable,
            velocity: Velocity::Slow,
            acceleration: Acceleration::Steady,
            abnormal: false,
            baseline_abnormal: false,
            critical: false,
            worsening: false,
        }
    }

    #[test]
    fn test_rapid_sentinel_forces_rapidly_worsening() {
        let mut lactate = trend(codes::LACTATE);
        lactate.worsening = true;
        lactate.velocity = Velocity::Rapid;
        lactate.direction = TrendDirection::Increasing;

        assert_eq!(classify(&[trend(codes::CRP), lactate]), Trajectory::RapidlyWorsening);
    }

    #[test]
    fn test_rapid_non_sentinel_needs_critical() {
        let mut crp = trend(codes::CRP);
        crp.worsening = true;
        crp.abnormal = true;
        crp.velocity = Velocity::Rapid;
        assert_eq!(classify(&[crp.clone()]), Trajectory::Worsening);

        crp.critical = true;
        assert_eq!(classify(&[crp]), Trajectory::RapidlyWorsening);
    }

    #[test]
    fn test_improving_requires_recovery_and_no_abnormal() {
        let mut wbc = trend(codes::WBC);
        wbc.baseline_abnormal = true;
        assert_eq!(classify(&[wbc.clone()]), Trajectory::Improving);

        let mut crp = trend(codes::CRP);
        crp.abnormal = true;
        assert_eq!(classify(&[wbc, crp]), Trajectory::Stable);
    }

    #[test]
    fn test_empty_is_stable() {
        assert_eq!(classify(&[]), Trajectory::Stable);
    }
}
