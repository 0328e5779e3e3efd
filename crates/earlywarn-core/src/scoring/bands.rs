//! Static NEWS2 banding tables (Royal College of Physicians, SpO2 scale 1).

use crate::models::codes;

/// A band: values `<= upper` (and above the previous band) score `points`.
#[derive(Debug, Clone, Copy)]
pub struct Band {
    pub upper: f64,
    pub points: u32,
}

const fn band(upper: f64, points: u32) -> Band {
    Band { upper, points }
}

/// Banding for one physiological parameter.
#[derive(Debug)]
pub struct BandTable {
    pub code: &'static str,
    pub bands: &'static [Band],
}

impl BandTable {
    /// Points for a value; non-finite values score nothing.
    pub fn points(&self, value: f64) -> u32 {
        self.bands
            .iter()
            .find(|b| value <= b.upper)
            .map(|b| b.points)
            .unwrap_or(0)
    }
}

pub static RESPIRATORY_RATE: BandTable = BandTable {
    code: codes::RESPIRATORY_RATE,
    bands: &[
        band(8.0, 3),
        band(11.0, 1),
        band(20.0, 0),
        band(24.0, 2),
        band(f64::INFINITY, 3),
    ],
};

pub static OXYGEN_SATURATION: BandTable = BandTable {
    code: codes::OXYGEN_SATURATION,
    bands: &[
        band(91.0, 3),
        band(93.0, 2),
        band(95.0, 1),
        band(f64::INFINITY, 0),
    ],
};

pub static TEMPERATURE: BandTable = BandTable {
    code: codes::TEMPERATURE,
    bands: &[
        band(35.0, 3),
        band(36.0, 1),
        band(38.0, 0),
        band(39.0, 1),
        band(f64::INFINITY, 2),
    ],
};

pub static SYSTOLIC_BP: BandTable = BandTable {
    code: codes::SYSTOLIC_BP,
    bands: &[
        band(90.0, 3),
        band(100.0, 2),
        band(110.0, 1),
        band(219.0, 0),
        band(f64::INFINITY, 3),
    ],
};

pub static HEART_RATE: BandTable = BandTable {
    code: codes::HEART_RATE,
    bands: &[
        band(40.0, 3),
        band(50.0, 1),
        band(90.0, 0),
        band(110.0, 1),
        band(130.0, 2),
        band(f64::INFINITY, 3),
    ],
};

/// Numeric NEWS2 parameters in reporting order.
pub static NUMERIC_NEWS2_TABLES: &[&BandTable] = &[
    &RESPIRATORY_RATE,
    &OXYGEN_SATURATION,
    &TEMPERATURE,
    &SYSTOLIC_BP,
    &HEART_RATE,
];

/// Points for supplemental oxygen use.
pub const SUPPLEMENTAL_OXYGEN_POINTS: u32 = 2;

/// Points for any consciousness level other than alert.
pub const ALTERED_CONSCIOUSNESS_POINTS: u32 = 3;

/// ACVPU values meaning "alert".
const ALERT_VALUES: &[&str] = &["a", "alert"];

/// ACVPU values meaning new confusion, voice, pain or unresponsive.
const ALTERED_VALUES: &[&str] = &[
    "c", "confusion", "new confusion", "confused", "v", "voice", "p", "pain", "u",
    "unresponsive",
];

/// Interpret an ACVPU reading. `None` when the value is not recognised.
pub fn is_altered_consciousness(value: &str) -> Option<bool> {
    let lower = value.trim().to_lowercase();
    if ALERT_VALUES.contains(&lower.as_str()) {
        Some(false)
    } else if ALTERED_VALUES.contains(&lower.as_str()) {
        Some(true)
    } else {
        None
    }
}
