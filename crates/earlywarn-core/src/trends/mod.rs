//! Trend analysis and trajectory classification.
//!
//! Pipeline: Series → per-code trend (reference ranges) → overall trajectory

pub mod analyzer;
pub mod reference;
pub mod trajectory;

pub use analyzer::TrendAnalyzer;
pub use reference::{reference_range, ReferenceRange, WorseWhen};
pub use trajectory::{classify, implied_trajectory, SENTINEL_CODES};
