//! Signal, recommendation and risk-level generation.

pub mod generator;
pub mod recommendations;
pub mod risk;

pub use generator::{trend_severity, SignalGenerator};
pub use recommendations::{recommend, Pattern, PatternInput};
pub use risk::classify_risk;
