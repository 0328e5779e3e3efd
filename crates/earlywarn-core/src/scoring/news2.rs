//! NEWS2-style aggregate early warning score.

use crate::models::codes;
use crate::models::News2Component;
use crate::series::ObservationSeries;

use super::bands::{
    is_altered_consciousness, ALTERED_CONSCIOUSNESS_POINTS, NUMERIC_NEWS2_TABLES,
    SUPPLEMENTAL_OXYGEN_POINTS,
};

/// Result of banding one snapshot of vitals.
#[derive(Debug, Clone, PartialEq)]
pub struct News2Result {
    pub total: u32,
    pub components: Vec<News2Component>,
    /// Physiological parameters present (out of six)
    pub parameters_used: u32,
}

/// Which reading of each series to band.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Snapshot {
    Latest,
    Earliest,
}

/// Compute NEWS2 from a snapshot of the series. Missing parameters are omitted.
pub fn calculate(series: &ObservationSeries, snapshot: Snapshot) -> News2Result {
    let numeric = |code: &str| match snapshot {
        Snapshot::Latest => series.latest_numeric(code),
        Snapshot::Earliest => series.earliest_numeric(code),
    };

    let mut components = Vec::new();
    let mut parameters_used = 0;

    for table in NUMERIC_NEWS2_TABLES {
        if let Some(value) = numeric(table.code) {
            parameters_used += 1;
            components.push(News2Component {
                parameter: table.code.to_string(),
                value: Some(value),
                points: table.points(value),
            });
        }
    }

    let on_oxygen = match snapshot {
        Snapshot::Latest => series.on_supplemental_oxygen(),
        Snapshot::Earliest => series.on_oxygen_at_start(),
    };
    components.push(News2Component {
        parameter: "supplemental_oxygen".to_string(),
        value: None,
        points: if on_oxygen { SUPPLEMENTAL_OXYGEN_POINTS } else { 0 },
    });

    if let Some(altered) = consciousness(series, snapshot) {
        parameters_used += 1;
        components.push(News2Component {
            parameter: codes::CONSCIOUSNESS.to_string(),
            value: None,
            points: if altered { ALTERED_CONSCIOUSNESS_POINTS } else { 0 },
        });
    }

    News2Result {
        total: components.iter().map(|c| c.points).sum(),
        components,
        parameters_used,
    }
}

/// Altered mentation from ACVPU, falling back to GCS < 15.
pub fn consciousness(series: &ObservationSeries, snapshot: Snapshot) -> Option<bool> {
    let categorical = match snapshot {
        Snapshot::Latest => series.latest_categorical(codes::CONSCIOUSNESS),
        Snapshot::Earliest => series.earliest_categorical(codes::CONSCIOUSNESS),
    };
    if let Some(altered) = categorical.and_then(is_altered_consciousness) {
        return Some(altered);
    }

    let gcs = match snapshot {
        Snapshot::Latest => series.latest_numeric(codes::GCS),
        Snapshot::Earliest => series.earliest_numeric(codes::GCS),
    };
    gcs.map(|g| g < 15.0)
}
