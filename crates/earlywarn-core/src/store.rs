//! Alert persistence collaborator.

use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard};

use thiserror::Error;

use crate::db::{AlertHeadline, Database, DbError};
use crate::models::{Alert, AuditEntry};

/// Persistence failures. All of them are worth retrying.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] DbError),

    #[error("store lock poisoned")]
    Poisoned,

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// Durable storage for alerts and their trails.
///
/// `insert` writes the alert and its whole initial trail atomically.
/// `append_entry` must reject an entry that does not extend the stored head.
pub trait AlertStore: Send + Sync {
    fn insert(&self, alert: &Alert) -> StoreResult<()>;

    fn get(&self, alert_id: &str) -> StoreResult<Option<Alert>>;

    fn append_entry(&self, alert_id: &str, entry: &AuditEntry) -> StoreResult<()>;

    fn list_by_patient(
        &self,
        scope_id: &str,
        patient_id: &str,
        active_only: bool,
        limit: usize,
    ) -> StoreResult<Vec<Alert>>;

    fn headlines(&self, scope_id: &str) -> StoreResult<Vec<AlertHeadline>>;
}

/// SQLite-backed [`AlertStore`].
#[derive(Clone)]
pub struct SqliteAlertStore {
    db: Arc<Mutex<Database>>,
}

impl SqliteAlertStore {
    pub fn open<P: AsRef<Path>>(path: P) -> StoreResult<Self> {
        Ok(Self::from_shared(Arc::new(Mutex::new(Database::open(path)?))))
    }

    pub fn open_in_memory() -> StoreResult<Self> {
        Ok(Self::from_shared(Arc::new(Mutex::new(
            Database::open_in_memory()?,
        ))))
    }

    /// Wrap a database that is also used elsewhere (e.g. by an audit sink).
    pub fn from_shared(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }

    pub fn database(&self) -> Arc<Mutex<Database>> {
        Arc::clone(&self.db)
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, Database>> {
        self.db.lock().map_err(|_| StoreError::Poisoned)
    }
}

impl AlertStore for SqliteAlertStore {
    fn insert(&self, alert: &Alert) -> StoreResult<()> {
        self.lock()?.insert_alert(alert)?;
        Ok(())
    }

    fn get(&self, alert_id: &str) -> StoreResult<Option<Alert>> {
        Ok(self.lock()?.get_alert(alert_id)?)
    }

    fn append_entry(&self, alert_id: &str, entry: &AuditEntry) -> StoreResult<()> {
        self.lock()?.append_event(alert_id, entry)?;
        Ok(())
    }

    fn list_by_patient(
        &self,
        scope_id: &str,
        patient_id: &str,
        active_only: bool,
        limit: usize,
    ) -> StoreResult<Vec<Alert>> {
        Ok(self
            .lock()?
            .list_alerts_by_patient(scope_id, patient_id, active_only, limit)?)
    }

    fn headlines(&self, scope_id: &str) -> StoreResult<Vec<AlertHeadline>> {
        Ok(self.lock()?.alert_headlines(scope_id)?)
    }
}
