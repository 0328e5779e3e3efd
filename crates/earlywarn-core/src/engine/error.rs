//! Engine error taxonomy.

use thiserror::Error;

use crate::governance::{LedgerError, TransitionError};
use crate::store::StoreError;

#[derive(Error, Debug)]
pub enum EngineError {
    /// Missing or malformed input; nothing was computed or written.
    #[error("validation failed: {0}")]
    Validation(String),

    #[error("alert not found: {0}")]
    NotFound(String),

    /// The actor's scope does not own the alert.
    #[error("alert {alert_id} is outside scope {scope_id}")]
    Forbidden { alert_id: String, scope_id: String },

    #[error(transparent)]
    InvalidTransition(#[from] TransitionError),

    /// Storage failed; the operation wrote nothing and may be retried.
    #[error("persistence failed: {0}")]
    Persistence(#[from] StoreError),

    #[error("audit chain error: {0}")]
    Ledger(#[from] LedgerError),
}

impl EngineError {
    pub fn is_retryable(&self) -> bool {
        matches!(self, EngineError::Persistence(_))
    }
}

pub type EngineResult<T> = Result<T, EngineError>;
