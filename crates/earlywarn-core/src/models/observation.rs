//! Observation models: vitals, labs, oxygen support and medication events.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A reading value: numeric for most vitals/labs, categorical for e.g. ACVPU.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum ObservationValue {
    Numeric(f64),
    Categorical(String),
}

impl ObservationValue {
    /// Numeric value, if this reading is numeric.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ObservationValue::Numeric(v) => Some(*v),
            ObservationValue::Categorical(_) => None,
        }
    }

    /// Categorical value, if this reading is categorical.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            ObservationValue::Numeric(_) => None,
            ObservationValue::Categorical(s) => Some(s),
        }
    }
}

/// Observation status (FHIR-like).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "kebab-case")]
pub enum ObservationStatus {
    #[default]
    Final,
    Preliminary,
    Amended,
    Cancelled,
    EnteredInError,
}

impl ObservationStatus {
    /// Whether a reading with this status may be used for scoring.
    pub fn is_usable(&self) -> bool {
        !matches!(
            self,
            ObservationStatus::Cancelled | ObservationStatus::EnteredInError
        )
    }
}

/// A single vital-sign or laboratory reading.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Observation {
    pub id: String,
    /// Observation code (alias or canonical, normalized before analysis)
    pub code: String,
    pub value: ObservationValue,
    #[serde(default)]
    pub unit: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub status: ObservationStatus,
}

impl Observation {
    /// Create a final numeric observation with a generated ID.
    pub fn numeric(code: &str, value: f64, unit: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            code: code.to_string(),
            value: ObservationValue::Numeric(value),
            unit: Some(unit.to_string()),
            timestamp,
            status: ObservationStatus::Final,
        }
    }

    /// Create a final categorical observation with a generated ID.
    pub fn categorical(code: &str, value: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            code: code.to_string(),
            value: ObservationValue::Categorical(value.to_string()),
            unit: None,
            timestamp,
            status: ObservationStatus::Final,
        }
    }
}

/// Direction of a therapy change.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TherapyAction {
    Started,
    Increased,
    Decreased,
    Stopped,
}

impl TherapyAction {
    /// Started or increased.
    pub fn is_escalation(&self) -> bool {
        matches!(self, TherapyAction::Started | TherapyAction::Increased)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            TherapyAction::Started => "started",
            TherapyAction::Increased => "increased",
            TherapyAction::Decreased => "decreased",
            TherapyAction::Stopped => "stopped",
        }
    }
}

/// Kind of oxygen delivery.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum OxygenSupportType {
    RoomAir,
    NasalCannula,
    SimpleMask,
    Venturi,
    NonRebreather,
    HighFlow,
    Niv,
    MechanicalVentilation,
}

impl OxygenSupportType {
    /// Advanced respiratory support (beyond simple supplemental oxygen).
    pub fn is_advanced(&self) -> bool {
        matches!(
            self,
            OxygenSupportType::HighFlow
                | OxygenSupportType::Niv
                | OxygenSupportType::MechanicalVentilation
        )
    }

    pub fn label(&self) -> &'static str {
        match self {
            OxygenSupportType::RoomAir => "room air",
            OxygenSupportType::NasalCannula => "nasal cannula",
            OxygenSupportType::SimpleMask => "simple mask",
            OxygenSupportType::Venturi => "venturi mask",
            OxygenSupportType::NonRebreather => "non-rebreather mask",
            OxygenSupportType::HighFlow => "high-flow nasal oxygen",
            OxygenSupportType::Niv => "non-invasive ventilation",
            OxygenSupportType::MechanicalVentilation => "mechanical ventilation",
        }
    }
}

/// A supplemental-oxygen event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct OxygenSupportEvent {
    pub id: String,
    pub support_type: OxygenSupportType,
    /// Flow rate in L/min
    #[serde(default)]
    pub flow_rate: Option<f64>,
    /// Fraction of inspired oxygen (0.21 - 1.0)
    #[serde(default)]
    pub fio2: Option<f64>,
    pub action: TherapyAction,
    pub timestamp: DateTime<Utc>,
}

impl OxygenSupportEvent {
    /// Whether this event leaves the patient on supplemental oxygen.
    pub fn leaves_on_oxygen(&self) -> bool {
        self.support_type != OxygenSupportType::RoomAir && self.action != TherapyAction::Stopped
    }
}

/// A medication event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct MedicationEvent {
    pub id: String,
    pub medication_name: String,
    /// Free-text therapeutic category (e.g. "vasopressor", "antibiotic")
    pub category: String,
    pub action: TherapyAction,
    pub timestamp: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_value_untagged_serde() {
        let numeric: ObservationValue = serde_json::from_str("38.5").unwrap();
        assert_eq!(numeric.as_f64(), Some(38.5));

        let categorical: ObservationValue = serde_json::from_str("\"alert\"").unwrap();
        assert_eq!(categorical.as_str(), Some("alert"));
    }

    #[test]
    fn test_status_defaults_to_final() {
        let json = r#"{"id":"o1","code":"hr","value":88,"timestamp":"2024-01-01T00:00:00Z"}"#;
        let obs: Observation = serde_json::from_str(json).unwrap();
        assert_eq!(obs.status, ObservationStatus::Final);
        assert!(obs.status.is_usable());
        assert!(!ObservationStatus::EnteredInError.is_usable());
    }

    #[test]
    fn test_oxygen_event_state() {
        let event = OxygenSupportEvent {
            id: "e1".into(),
            support_type: OxygenSupportType::NasalCannula,
            flow_rate: Some(2.0),
            fio2: None,
            action: TherapyAction::Started,
            timestamp: Utc::now(),
        };
        assert!(event.leaves_on_oxygen());
        assert!(!event.support_type.is_advanced());
    }
}
