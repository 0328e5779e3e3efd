//! Explainability: deterministic explanation plus optional narrative enhancement.

pub mod enhancement;
pub mod synthesizer;

pub use enhancement::{build_context, EnhancementError, Enhancer};
pub use synthesizer::{confidence, confidence_factors, synthesize, ExplanationInput};
