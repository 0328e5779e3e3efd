//! Patient context and analysis request models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::observation::{MedicationEvent, Observation, OxygenSupportEvent};

/// Allergy severity as recorded on the patient record.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AllergySeverity {
    Mild,
    Moderate,
    Severe,
    Anaphylaxis,
}

/// A recorded allergy.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Allergy {
    pub substance: String,
    pub severity: AllergySeverity,
}

impl Allergy {
    pub fn is_severe(&self) -> bool {
        matches!(
            self.severity,
            AllergySeverity::Severe | AllergySeverity::Anaphylaxis
        )
    }
}

/// Patient context. Every field is optional; absence lowers confidence only.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct PatientContext {
    pub age: Option<u32>,
    pub gender: Option<String>,
    /// `None` means "not recorded", distinct from an empty list.
    pub comorbidities: Option<Vec<String>>,
    pub current_diagnoses: Vec<String>,
    pub ward: Option<String>,
    /// Medications on the chart outside the supplied event series
    pub current_medications: Vec<String>,
    pub allergies: Vec<Allergy>,
    /// Number of open cases for the patient
    pub active_case_count: u32,
    /// Whether a risk alert already exists for the patient
    pub has_existing_risk_alert: bool,
}

impl PatientContext {
    /// Comorbidity list, empty when not recorded.
    pub fn comorbidity_list(&self) -> &[String] {
        self.comorbidities.as_deref().unwrap_or(&[])
    }
}

/// Input to an analysis run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisRequest {
    pub patient_id: String,
    #[serde(default)]
    pub context: PatientContext,
    #[serde(default)]
    pub vitals: Vec<Observation>,
    #[serde(default)]
    pub labs: Vec<Observation>,
    #[serde(default)]
    pub oxygen_support: Vec<OxygenSupportEvent>,
    #[serde(default)]
    pub medications: Vec<MedicationEvent>,
    #[serde(default = "default_window_hours")]
    pub analysis_window_hours: f64,
    #[serde(default)]
    pub use_enhancement: bool,
    /// End of the analysis window. Defaults to the latest supplied timestamp.
    #[serde(default)]
    pub as_of: Option<DateTime<Utc>>,
}

fn default_window_hours() -> f64 {
    24.0
}

impl AnalysisRequest {
    /// Create an empty request for a patient.
    pub fn new(patient_id: impl Into<String>) -> Self {
        Self {
            patient_id: patient_id.into(),
            context: PatientContext::default(),
            vitals: Vec::new(),
            labs: Vec::new(),
            oxygen_support: Vec::new(),
            medications: Vec::new(),
            analysis_window_hours: default_window_hours(),
            use_enhancement: false,
            as_of: None,
        }
    }

    /// Latest timestamp across all supplied observations and events.
    pub fn latest_timestamp(&self) -> Option<DateTime<Utc>> {
        self.vitals
            .iter()
            .chain(self.labs.iter())
            .map(|o| o.timestamp)
            .chain(self.oxygen_support.iter().map(|e| e.timestamp))
            .chain(self.medications.iter().map(|e| e.timestamp))
            .max()
    }
}

/// The caller identity for an operation.
///
/// `scope_id` is the tenant/hospital scope established by the caller's auth layer;
/// it is never read from a request payload.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Actor {
    pub user_id: String,
    pub scope_id: String,
    #[serde(default)]
    pub ip_address: Option<String>,
    #[serde(default)]
    pub user_agent: Option<String>,
}

impl Actor {
    pub fn new(user_id: impl Into<String>, scope_id: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            scope_id: scope_id.into(),
            ip_address: None,
            user_agent: None,
        }
    }
}
