//! Domain models for the deterioration engine.

pub mod codes;
pub mod units;
mod alert;
mod context;
mod governance;
mod observation;
mod scores;
mod signal;
mod trend;

pub use alert::*;
pub use context::*;
pub use governance::*;
pub use observation::*;
pub use scores::*;
pub use signal::*;
pub use trend::*;
