//! Unit conversion into the units the reference ranges are written in.
//!
//! Reference ranges, hard thresholds and rule constants assume:
//! temperature °C, creatinine and bilirubin mg/dL, lactate mmol/L,
//! glucose mg/dL, hemoglobin g/dL. Readings reported in a recognised
//! alternative unit are converted before trend analysis; anything else is
//! passed through untouched.

use super::codes;

/// One alternative unit accepted for a canonical code.
struct Conversion {
    code: &'static str,
    /// Lowercased spellings of the alternative unit
    from: &'static [&'static str],
    to: &'static str,
    convert: fn(f64) -> f64,
}

const MICROMOL_PER_L: &[&str] = &["umol/l", "µmol/l", "μmol/l", "micromol/l"];

static CONVERSIONS: &[Conversion] = &[
    Conversion {
        code: codes::TEMPERATURE,
        from: &["°f", "degf", "f", "fahrenheit"],
        to: "°C",
        convert: |f| (f - 32.0) * 5.0 / 9.0,
    },
    Conversion {
        code: codes::CREATININE,
        from: MICROMOL_PER_L,
        to: "mg/dL",
        convert: |v| v / 88.4,
    },
    Conversion {
        code: codes::BILIRUBIN,
        from: MICROMOL_PER_L,
        to: "mg/dL",
        convert: |v| v / 17.1,
    },
    Conversion {
        code: codes::LACTATE,
        from: &["mg/dl"],
        to: "mmol/L",
        convert: |v| v / 9.01,
    },
    Conversion {
        code: codes::GLUCOSE,
        from: &["mmol/l"],
        to: "mg/dL",
        convert: |v| v * 18.0,
    },
    Conversion {
        code: codes::HEMOGLOBIN,
        from: &["g/l"],
        to: "g/dL",
        convert: |v| v / 10.0,
    },
];

/// Convert `value` reported in `unit` for canonical `code`.
///
/// Returns `None` when the unit is already the expected one or is not recognised.
pub fn to_reference_unit(code: &str, value: f64, unit: &str) -> Option<(f64, &'static str)> {
    let unit = unit.trim().to_lowercase().replace(' ', "");
    CONVERSIONS
        .iter()
        .find(|c| c.code == code && c.from.contains(&unit.as_str()))
        .map(|c| ((c.convert)(value), c.to))
}
