//! Earlywarn Core Library
//!
//! Deterioration scoring and alert governance for ward patients.
//!
//! # Architecture
//!
//! ```text
//! Vitals / Labs / O₂ / Medications
//!                │
//!        Observation Series (normalized codes, analysis window)
//!                │
//!        ┌───────┴────────┐
//!        ▼                ▼
//!  Score Calculator   Trend Analyzer
//!  (NEWS2, qSOFA,     (direction, velocity,
//!   custom risk)       acceleration, trajectory)
//!        └───────┬────────┘
//!                ▼
//!     Signals → Risk level → Recommendations
//!                │
//!     Explainability (+ optional narrative, time-bounded)
//!                │
//!     ┌──────────▼──────────┐
//!     │    Alert Manager    │
//!     │  hash-chained trail │
//!     │  per-alert locking  │
//!     └──────────┬──────────┘
//!                ▼
//!       SQLite store + audit log
//! ```
//!
//! # Core Principle
//!
//! **Decision support only.** Every score is rule-based and itemized; the
//! narrative layer can add text but never changes a risk level.
//!
//! # Modules
//!
//! - [`models`]: Domain types (Observation, Alert, Governance, etc.)
//! - [`scoring`]: NEWS2, qSOFA and custom risk scoring
//! - [`trends`]: Per-series trends and overall trajectory
//! - [`signals`]: Signals, risk level and recommendations
//! - [`explain`]: Deterministic explanation and narrative enhancement
//! - [`governance`]: State machine, audit hash chain, export
//! - [`engine`]: Analyzer and alert lifecycle manager
//! - [`db`] / [`store`]: SQLite persistence
//! - [`audit`]: Security audit events

pub mod audit;
pub mod config;
pub mod db;
pub mod engine;
pub mod explain;
pub mod governance;
pub mod models;
pub mod scoring;
pub mod series;
pub mod signals;
pub mod store;
pub mod trends;

// Re-export commonly used types
pub use audit::{AuditEvent, AuditEventType, AuditSink, SqliteAuditSink, TracingAuditSink};
pub use config::EngineConfig;
pub use db::Database;
pub use engine::{AlertManager, Analyzer, DashboardSummary, EngineError, EngineResult};
pub use governance::{AuditTrailExport, ChainVerification};
pub use models::{
    Actor, Alert, AnalysisOutcome, AnalysisRequest, GovernanceAction, Observation, RiskLevel,
    Trajectory,
};
pub use store::{AlertStore, SqliteAlertStore, StoreError};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::sync::{Arc, Mutex};

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum EarlyWarnError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid transition: {0}")]
    InvalidTransition(String),

    /// Retryable
    #[error("Persistence error: {0}")]
    PersistenceError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Runtime error: {0}")]
    RuntimeError(String),
}

impl From<EngineError> for EarlyWarnError {
    fn from(e: EngineError) -> Self {
        match e {
            EngineError::Validation(msg) => EarlyWarnError::ValidationError(msg),
            EngineError::NotFound(id) => EarlyWarnError::NotFound(id),
            e @ EngineError::Forbidden { .. } => EarlyWarnError::Forbidden(e.to_string()),
            EngineError::InvalidTransition(t) => EarlyWarnError::InvalidTransition(t.to_string()),
            EngineError::Persistence(s) => EarlyWarnError::PersistenceError(s.to_string()),
            EngineError::Ledger(l) => EarlyWarnError::SerializationError(l.to_string()),
        }
    }
}

impl From<db::DbError> for EarlyWarnError {
    fn from(e: db::DbError) -> Self {
        EarlyWarnError::PersistenceError(e.to_string())
    }
}

impl From<serde_json::Error> for EarlyWarnError {
    fn from(e: serde_json::Error) -> Self {
        EarlyWarnError::SerializationError(e.to_string())
    }
}

impl From<std::io::Error> for EarlyWarnError {
    fn from(e: std::io::Error) -> Self {
        EarlyWarnError::RuntimeError(e.to_string())
    }
}

// =========================================================================
// Logging
// =========================================================================

/// Install a `fmt` subscriber filtered by `RUST_LOG` (default `info`).
///
/// Safe to call more than once; later calls are no-ops.
#[uniffi::export]
pub fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .try_init();
}

// =========================================================================
// Factory Functions (exported to FFI)
// =========================================================================

/// Open or create an engine backed by the database at `path`.
///
/// `config_json` may be any subset of [`EngineConfig`]; missing fields take defaults.
#[uniffi::export]
pub fn open_engine(
    path: String,
    config_json: Option<String>,
) -> Result<Arc<EarlyWarnEngine>, EarlyWarnError> {
    EarlyWarnEngine::build(Database::open(&path)?, config_json)
}

/// Create an engine over an in-memory database (for testing).
#[uniffi::export]
pub fn open_engine_in_memory(
    config_json: Option<String>,
) -> Result<Arc<EarlyWarnEngine>, EarlyWarnError> {
    EarlyWarnEngine::build(Database::open_in_memory()?, config_json)
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe engine wrapper for FFI. Payloads cross the boundary as JSON.
#[derive(uniffi::Object)]
pub struct EarlyWarnEngine {
    runtime: tokio::runtime::Runtime,
    manager: AlertManager,
}

impl EarlyWarnEngine {
    fn build(db: Database, config_json: Option<String>) -> Result<Arc<Self>, EarlyWarnError> {
        let config = match config_json {
            Some(json) => {
                let config = EngineConfig::from_json(&json)?;
                config
                    .validate()
                    .map_err(|e| EarlyWarnError::ValidationError(e.to_string()))?;
                config
            }
            None => EngineConfig::default(),
        };

        let db = Arc::new(Mutex::new(db));
        let store = Arc::new(SqliteAlertStore::from_shared(Arc::clone(&db)));
        let audit = Arc::new(SqliteAuditSink::new(db));
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .build()?;

        Ok(Arc::new(Self {
            runtime,
            manager: AlertManager::new(config, store, audit),
        }))
    }
}

/// FFI-safe caller identity. The scope comes from the host's auth layer.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiActor {
    pub user_id: String,
    pub scope_id: String,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl From<FfiActor> for Actor {
    fn from(actor: FfiActor) -> Self {
        Actor {
            user_id: actor.user_id,
            scope_id: actor.scope_id,
            ip_address: actor.ip_address,
            user_agent: actor.user_agent,
        }
    }
}

#[uniffi::export]
impl EarlyWarnEngine {
    // =========================================================================
    // Analysis
    // =========================================================================

    /// Rule-based preview of a request; nothing is stored.
    pub fn analyze(&self, request_json: String) -> Result<String, EarlyWarnError> {
        let request: AnalysisRequest = serde_json::from_str(&request_json)?;
        let outcome = self.manager.analyze(&request)?;
        Ok(serde_json::to_string(&outcome)?)
    }

    /// Analyze and persist a new alert. Returns the alert as JSON.
    pub fn create_alert(
        &self,
        request_json: String,
        actor: FfiActor,
    ) -> Result<String, EarlyWarnError> {
        let request: AnalysisRequest = serde_json::from_str(&request_json)?;
        let actor: Actor = actor.into();
        let alert = self
            .runtime
            .block_on(self.manager.create(request, &actor))?;
        Ok(serde_json::to_string(&alert)?)
    }

    // =========================================================================
    // Governance
    // =========================================================================

    pub fn view_alert(&self, alert_id: String, actor: FfiActor) -> Result<String, EarlyWarnError> {
        let actor: Actor = actor.into();
        let alert = self.runtime.block_on(self.manager.view(&alert_id, &actor))?;
        Ok(serde_json::to_string(&alert)?)
    }

    pub fn acknowledge_alert(
        &self,
        alert_id: String,
        actor: FfiActor,
        notes: Option<String>,
    ) -> Result<String, EarlyWarnError> {
        let actor: Actor = actor.into();
        let alert = self
            .runtime
            .block_on(self.manager.acknowledge(&alert_id, &actor, notes))?;
        Ok(serde_json::to_string(&alert)?)
    }

    pub fn escalate_alert(
        &self,
        alert_id: String,
        actor: FfiActor,
        target: String,
        notes: Option<String>,
    ) -> Result<String, EarlyWarnError> {
        let actor: Actor = actor.into();
        let alert = self
            .runtime
            .block_on(self.manager.escalate(&alert_id, &actor, &target, notes))?;
        Ok(serde_json::to_string(&alert)?)
    }

    pub fn dismiss_alert(
        &self,
        alert_id: String,
        actor: FfiActor,
        reason: String,
        notes: Option<String>,
    ) -> Result<String, EarlyWarnError> {
        let actor: Actor = actor.into();
        let alert = self
            .runtime
            .block_on(self.manager.dismiss(&alert_id, &actor, &reason, notes))?;
        Ok(serde_json::to_string(&alert)?)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    pub fn get_alert(&self, alert_id: String, actor: FfiActor) -> Result<String, EarlyWarnError> {
        let alert = self.manager.get_by_id(&alert_id, &actor.into())?;
        Ok(serde_json::to_string(&alert)?)
    }

    pub fn list_patient_alerts(
        &self,
        patient_id: String,
        actor: FfiActor,
        active_only: bool,
        limit: u32,
    ) -> Result<String, EarlyWarnError> {
        let alerts =
            self.manager
                .list_by_patient(&patient_id, &actor.into(), active_only, limit as usize)?;
        Ok(serde_json::to_string(&alerts)?)
    }

    pub fn dashboard_summary(&self, actor: FfiActor) -> Result<String, EarlyWarnError> {
        let summary = self.manager.dashboard_summary(&actor.into())?;
        Ok(serde_json::to_string(&summary)?)
    }

    // =========================================================================
    // Audit
    // =========================================================================

    /// Compliance export of an alert's audit trail (pretty JSON).
    pub fn export_audit_trail(
        &self,
        alert_id: String,
        actor: FfiActor,
    ) -> Result<String, EarlyWarnError> {
        let export = self.manager.export_audit_trail(&alert_id, &actor.into())?;
        Ok(export.to_json()?)
    }

    /// Whether the stored hash chain for an alert verifies.
    pub fn verify_audit_trail(
        &self,
        alert_id: String,
        actor: FfiActor,
    ) -> Result<bool, EarlyWarnError> {
        let verification = self.manager.verify_audit_trail(&alert_id, &actor.into())?;
        Ok(verification.valid)
    }
}
