//! Windowed, code-normalized observation series.
//!
//! All scoring and trend logic reads observations through [`ObservationSeries`]:
//! codes are canonical, unusable statuses are dropped, readings outside the
//! window are dropped, and every series is ordered oldest-first.

use std::collections::BTreeMap;

use chrono::{DateTime, Duration, Utc};

use crate::models::codes::CodeNormalizer;
use crate::models::units::to_reference_unit;
use crate::models::{
    AnalysisRequest, AnalysisWindow, MedicationEvent, Observation, ObservationValue,
    OxygenSupportEvent,
};

/// Whether a series came from vitals or labs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeriesKind {
    Vital,
    Lab,
}

/// A single in-window reading.
#[derive(Debug, Clone, PartialEq)]
pub struct Reading {
    pub value: ObservationValue,
    pub unit: Option<String>,
    pub timestamp: DateTime<Utc>,
}

/// All in-window readings grouped by canonical code.
#[derive(Debug, Clone)]
pub struct ObservationSeries {
    window: AnalysisWindow,
    series: BTreeMap<String, (SeriesKind, Vec<Reading>)>,
    oxygen: Vec<OxygenSupportEvent>,
    medications: Vec<MedicationEvent>,
}

impl ObservationSeries {
    /// Build series from a request.
    ///
    /// The window ends at `as_of` (or the latest supplied timestamp) so that the
    /// same input always yields the same window.
    pub fn from_request(request: &AnalysisRequest, normalizer: &CodeNormalizer) -> Self {
        let end = request
            .as_of
            .or_else(|| request.latest_timestamp())
            .unwrap_or_else(Utc::now);
        let hours = window_hours(request.analysis_window_hours);
        let span = Duration::seconds((hours * 3600.0).round() as i64);
        let window = AnalysisWindow {
            start: end.checked_sub_signed(span).unwrap_or(DateTime::<Utc>::MIN_UTC),
            end,
            hours,
        };

        let mut series: BTreeMap<String, (SeriesKind, Vec<Reading>)> = BTreeMap::new();
        let tagged = request
            .vitals
            .iter()
            .map(|o| (SeriesKind::Vital, o))
            .chain(request.labs.iter().map(|o| (SeriesKind::Lab, o)));

        for (kind, observation) in tagged {
            if !observation.status.is_usable() || !in_window(&window, observation.timestamp) {
                continue;
            }
            let code = normalizer.normalize(&observation.code);
            let reading = to_reading(observation, &code);
            series
                .entry(code)
                .or_insert_with(|| (kind, Vec::new()))
                .1
                .push(reading);
        }
        for (_, readings) in series.values_mut() {
            readings.sort_by_key(|r| r.timestamp);
        }

        let mut oxygen: Vec<OxygenSupportEvent> = request
            .oxygen_support
            .iter()
            .filter(|e| e.timestamp <= window.end)
            .cloned()
            .collect();
        oxygen.sort_by_key(|e| e.timestamp);

        let mut medications: Vec<MedicationEvent> = request
            .medications
            .iter()
            .filter(|e| e.timestamp <= window.end)
            .cloned()
            .collect();
        medications.sort_by_key(|e| e.timestamp);

        Self {
            window,
            series,
            oxygen,
            medications,
        }
    }

    pub fn window(&self) -> &AnalysisWindow {
        &self.window
    }

    /// Iterate `(code, kind, readings)` in code order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, SeriesKind, &[Reading])> {
        self.series
            .iter()
            .map(|(code, (kind, readings))| (code.as_str(), *kind, readings.as_slice()))
    }

    pub fn readings(&self, code: &str) -> &[Reading] {
        self.series
            .get(code)
            .map(|(_, r)| r.as_slice())
            .unwrap_or(&[])
    }

    pub fn kind(&self, code: &str) -> Option<SeriesKind> {
        self.series.get(code).map(|(kind, _)| *kind)
    }

    pub fn has(&self, code: &str) -> bool {
        !self.readings(code).is_empty()
    }

    /// Latest numeric reading for a code.
    pub fn latest_numeric(&self, code: &str) -> Option<f64> {
        self.readings(code).iter().rev().find_map(|r| r.value.as_f64())
    }

    /// Earliest numeric reading for a code.
    pub fn earliest_numeric(&self, code: &str) -> Option<f64> {
        self.readings(code).iter().find_map(|r| r.value.as_f64())
    }

    /// Latest categorical reading for a code.
    pub fn latest_categorical(&self, code: &str) -> Option<&str> {
        self.readings(code).iter().rev().find_map(|r| r.value.as_str())
    }

    /// Earliest categorical reading for a code.
    pub fn earliest_categorical(&self, code: &str) -> Option<&str> {
        self.readings(code).iter().find_map(|r| r.value.as_str())
    }

    /// Oxygen events up to the window end, oldest-first.
    pub fn oxygen_events(&self) -> &[OxygenSupportEvent] {
        &self.oxygen
    }

    /// Oxygen events inside the window.
    pub fn oxygen_events_in_window(&self) -> impl Iterator<Item = &OxygenSupportEvent> {
        self.oxygen
            .iter()
            .filter(move |e| in_window(&self.window, e.timestamp))
    }

    /// Whether the patient is on supplemental oxygen at the window end.
    pub fn on_supplemental_oxygen(&self) -> bool {
        self.oxygen
            .last()
            .map(|e| e.leaves_on_oxygen())
            .unwrap_or(false)
    }

    /// Whether the patient was on supplemental oxygen at the window start.
    pub fn on_oxygen_at_start(&self) -> bool {
        self.oxygen
            .iter()
            .filter(|e| e.timestamp <= self.window.start)
            .last()
            .map(|e| e.leaves_on_oxygen())
            .unwrap_or(false)
    }

    /// Medication events inside the window.
    pub fn medication_events_in_window(&self) -> impl Iterator<Item = &MedicationEvent> {
        self.medications
            .iter()
            .filter(move |e| in_window(&self.window, e.timestamp))
    }

    /// Distinct medication names whose latest event is not `stopped`.
    pub fn active_medication_names(&self) -> Vec<String> {
        let mut latest: BTreeMap<String, bool> = BTreeMap::new();
        for event in &self.medications {
            latest.insert(
                event.medication_name.trim().to_lowercase(),
                event.action != crate::models::TherapyAction::Stopped,
            );
        }
        latest
            .into_iter()
            .filter_map(|(name, active)| active.then_some(name))
            .collect()
    }
}

/// Longest window the series will honour, in hours (one hundred years).
const MAX_WINDOW_HOURS: f64 = 876_000.0;

/// Window length clamped to `0..=MAX_WINDOW_HOURS`; NaN collapses to zero.
fn window_hours(requested: f64) -> f64 {
    if requested.is_nan() {
        0.0
    } else {
        requested.clamp(0.0, MAX_WINDOW_HOURS)
    }
}

fn in_window(window: &AnalysisWindow, timestamp: DateTime<Utc>) -> bool {
    timestamp >= window.start && timestamp <= window.end
}

fn to_reading(observation: &Observation, code: &str) -> Reading {
    let converted = match (&observation.value, observation.unit.as_deref()) {
        (ObservationValue::Numeric(value), Some(unit)) => to_reference_unit(code, *value, unit),
        _ => None,
    };
    match converted {
        Some((value, unit)) => Reading {
            value: ObservationValue::Numeric(value),
            unit: Some(unit.to_string()),
            timestamp: observation.timestamp,
        },
        None => Reading {
            value: observation.value.clone(),
            unit: observation.unit.clone(),
            timestamp: observation.timestamp,
        },
    }
}
