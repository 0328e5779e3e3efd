//! Narrative enhancement layer for deterioration alerts.
//!
//! This crate builds the prompts sent to an external narrative generator, defines
//! the pluggable [`NarrativeGenerator`] seam, and parses the (untrusted) generator
//! output into validated [`ClinicalInsights`].

pub mod generator;
pub mod insights;
pub mod prompts;

pub use generator::*;
pub use insights::*;
pub use prompts::*;
