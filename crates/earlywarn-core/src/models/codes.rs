//! Canonical observation codes and alias normalization.
//!
//! Handles:
//! - Short-hand aliases (rr → respiratory_rate, spo2 → oxygen_saturation)
//! - LOINC codes for the common vitals and labs
//! - Case and separator differences ("Heart Rate", "heart-rate")

use std::collections::HashMap;

pub const RESPIRATORY_RATE: &str = "respiratory_rate";
pub const OXYGEN_SATURATION: &str = "oxygen_saturation";
pub const TEMPERATURE: &str = "temperature";
pub const SYSTOLIC_BP: &str = "systolic_bp";
pub const DIASTOLIC_BP: &str = "diastolic_bp";
pub const HEART_RATE: &str = "heart_rate";
pub const CONSCIOUSNESS: &str = "consciousness";
pub const GCS: &str = "gcs";

pub const WBC: &str = "wbc";
pub const CRP: &str = "crp";
pub const LACTATE: &str = "lactate";
pub const CREATININE: &str = "creatinine";
pub const POTASSIUM: &str = "potassium";
pub const SODIUM: &str = "sodium";
pub const PROCALCITONIN: &str = "procalcitonin";
pub const HEMOGLOBIN: &str = "hemoglobin";
pub const PLATELETS: &str = "platelets";
pub const BILIRUBIN: &str = "bilirubin";
pub const GLUCOSE: &str = "glucose";

/// The physiological parameters NEWS2 expects (supplemental oxygen is derived
/// from oxygen-support events and is always determinable).
pub const NEWS2_PARAMETERS: &[&str] = &[
    RESPIRATORY_RATE,
    OXYGEN_SATURATION,
    TEMPERATURE,
    SYSTOLIC_BP,
    HEART_RATE,
    CONSCIOUSNESS,
];

/// Human-readable label for a canonical code.
pub fn display_name(code: &str) -> &str {
    match code {
        RESPIRATORY_RATE => "Respiratory rate",
        OXYGEN_SATURATION => "Oxygen saturation",
        TEMPERATURE => "Temperature",
        SYSTOLIC_BP => "Systolic blood pressure",
        DIASTOLIC_BP => "Diastolic blood pressure",
        HEART_RATE => "Heart rate",
        CONSCIOUSNESS => "Level of consciousness",
        GCS => "Glasgow Coma Scale",
        WBC => "White cell count",
        CRP => "C-reactive protein",
        LACTATE => "Lactate",
        CREATININE => "Creatinine",
        POTASSIUM => "Potassium",
        SODIUM => "Sodium",
        PROCALCITONIN => "Procalcitonin",
        HEMOGLOBIN => "Hemoglobin",
        PLATELETS => "Platelets",
        BILIRUBIN => "Bilirubin",
        GLUCOSE => "Glucose",
        other => other,
    }
}

/// Normalizer for observation codes.
pub struct CodeNormalizer {
    aliases: HashMap<String, &'static str>,
}

impl Default for CodeNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl CodeNormalizer {
    pub fn new() -> Self {
        Self {
            aliases: Self::default_aliases(),
        }
    }

    /// Normalize a code to its canonical form; unknown codes are lowercased.
    pub fn normalize(&self, code: &str) -> String {
        let key = code.trim().to_lowercase().replace([' ', '-'], "_");
        match self.aliases.get(&key) {
            Some(canonical) => (*canonical).to_string(),
            None => key,
        }
    }

    fn default_aliases() -> HashMap<String, &'static str> {
        let pairs: &[(&str, &'static str)] = &[
            // Respiratory rate
            ("rr", RESPIRATORY_RATE),
            ("resp_rate", RESPIRATORY_RATE),
            ("respiratory_rate", RESPIRATORY_RATE),
            ("respiration_rate", RESPIRATORY_RATE),
            ("9279_1", RESPIRATORY_RATE),
            // Oxygen saturation
            ("spo2", OXYGEN_SATURATION),
            ("sao2", OXYGEN_SATURATION),
            ("o2_sat", OXYGEN_SATURATION),
            ("oxygen_saturation", OXYGEN_SATURATION),
            ("59408_5", OXYGEN_SATURATION),
            ("2708_6", OXYGEN_SATURATION),
            // Temperature
            ("temp", TEMPERATURE),
            ("temperature", TEMPERATURE),
            ("body_temperature", TEMPERATURE),
            ("8310_5", TEMPERATURE),
            // Blood pressure
            ("sbp", SYSTOLIC_BP),
            ("systolic", SYSTOLIC_BP),
            ("systolic_bp", SYSTOLIC_BP),
            ("systolic_blood_pressure", SYSTOLIC_BP),
            ("8480_6", SYSTOLIC_BP),
            ("dbp", DIASTOLIC_BP),
            ("diastolic", DIASTOLIC_BP),
            ("diastolic_bp", DIASTOLIC_BP),
            ("8462_4", DIASTOLIC_BP),
            // Heart rate
            ("hr", HEART_RATE),
            ("pulse", HEART_RATE),
            ("heart_rate", HEART_RATE),
            ("8867_4", HEART_RATE),
            // Consciousness
            ("avpu", CONSCIOUSNESS),
            ("acvpu", CONSCIOUSNESS),
            ("loc", CONSCIOUSNESS),
            ("consciousness", CONSCIOUSNESS),
            ("gcs", GCS),
            ("glasgow_coma_scale", GCS),
            ("9269_2", GCS),
            // Labs
            ("wbc", WBC),
            ("white_cell_count", WBC),
            ("leukocytes", WBC),
            ("6690_2", WBC),
            ("crp", CRP),
            ("c_reactive_protein", CRP),
            ("1988_5", CRP),
            ("lactate", LACTATE),
            ("lactic_acid", LACTATE),
            ("2524_7", LACTATE),
            ("creatinine", CREATININE),
            ("creat", CREATININE),
            ("2160_0", CREATININE),
            ("potassium", POTASSIUM),
            ("k", POTASSIUM),
            ("2823_3", POTASSIUM),
            ("sodium", SODIUM),
            ("na", SODIUM),
            ("2951_2", SODIUM),
            ("procalcitonin", PROCALCITONIN),
            ("pct", PROCALCITONIN),
            ("33959_8", PROCALCITONIN),
            ("hemoglobin", HEMOGLOBIN),
            ("haemoglobin", HEMOGLOBIN),
            ("hb", HEMOGLOBIN),
            ("hgb", HEMOGLOBIN),
            ("718_7", HEMOGLOBIN),
            ("platelets", PLATELETS),
            ("plt", PLATELETS),
            ("777_3", PLATELETS),
            ("bilirubin", BILIRUBIN),
            ("bili", BILIRUBIN),
            ("1975_2", BILIRUBIN),
            ("glucose", GLUCOSE),
            ("glu", GLUCOSE),
            ("2345_7", GLUCOSE),
        ];

        pairs.iter().map(|(k, v)| (k.to_string(), *v)).collect()
    }
}
