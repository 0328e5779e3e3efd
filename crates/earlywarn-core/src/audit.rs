//! Security audit events for governed operations.
//!
//! Every create, view, acknowledge, escalate, dismiss and export emits an
//! [`AuditEvent`], as does every scope mismatch. Sinks may fail; a failure is
//! logged and the governing operation carries on.

use std::sync::{Arc, Mutex};

use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::db::Database;
use crate::models::Actor;

/// Kind of audited event.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuditEventType {
    AlertCreated,
    AlertViewed,
    AlertAcknowledged,
    AlertEscalated,
    AlertDismissed,
    AuditTrailExported,
    AuthorizationFailure,
}

impl AuditEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuditEventType::AlertCreated => "alert_created",
            AuditEventType::AlertViewed => "alert_viewed",
            AuditEventType::AlertAcknowledged => "alert_acknowledged",
            AuditEventType::AlertEscalated => "alert_escalated",
            AuditEventType::AlertDismissed => "alert_dismissed",
            AuditEventType::AuditTrailExported => "audit_trail_exported",
            AuditEventType::AuthorizationFailure => "authorization_failure",
        }
    }
}

/// One event handed to an [`AuditSink`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEvent {
    pub event_type: AuditEventType,
    pub resource_id: String,
    pub actor_id: String,
    pub details: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
}

impl AuditEvent {
    pub fn new(event_type: AuditEventType, resource_id: &str, actor: &Actor) -> Self {
        Self {
            event_type,
            resource_id: resource_id.to_string(),
            actor_id: actor.user_id.clone(),
            details: json!({}),
            ip_address: actor.ip_address.clone(),
            user_agent: actor.user_agent.clone(),
        }
    }

    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = details;
        self
    }
}

/// Destination for audit events.
pub trait AuditSink: Send + Sync {
    fn record(&self, event: &AuditEvent) -> anyhow::Result<()>;
}

/// Writes audit events to the log only.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingAuditSink;

impl AuditSink for TracingAuditSink {
    fn record(&self, event: &AuditEvent) -> anyhow::Result<()> {
        tracing::info!(
            event_type = event.event_type.as_str(),
            resource_id = %event.resource_id,
            actor_id = %event.actor_id,
            details = %event.details,
            "audit event"
        );
        Ok(())
    }
}

/// Writes audit events to the `audit_log` table.
#[derive(Clone)]
pub struct SqliteAuditSink {
    db: Arc<Mutex<Database>>,
}

impl SqliteAuditSink {
    pub fn new(db: Arc<Mutex<Database>>) -> Self {
        Self { db }
    }
}

impl AuditSink for SqliteAuditSink {
    fn record(&self, event: &AuditEvent) -> anyhow::Result<()> {
        let db = self
            .db
            .lock()
            .map_err(|e| anyhow::anyhow!("audit database lock poisoned: {}", e))?;
        db.insert_audit_log(
            event.event_type.as_str(),
            &event.resource_id,
            &event.actor_id,
            &event.details,
            event.ip_address.as_deref(),
            event.user_agent.as_deref(),
        )?;
        Ok(())
    }
}

/// Record an event, logging and swallowing any sink failure.
pub(crate) fn emit(sink: &dyn AuditSink, event: AuditEvent) {
    if let Err(e) = sink.record(&event) {
        tracing::warn!(
            event_type = event.event_type.as_str(),
            resource_id = %event.resource_id,
            error = %e,
            "audit sink failed; continuing"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BrokenSink;

    impl AuditSink for BrokenSink {
        fn record(&self, _: &AuditEvent) -> anyhow::Result<()> {
            anyhow::bail!("disk full")
        }
    }

    fn actor() -> Actor {
        let mut actor = Actor::new("dr-a", "ward-a");
        actor.ip_address = Some("10.1.2.3".into());
        actor
    }

    #[test]
    fn test_sqlite_sink_writes_row() {
        let db = Arc::new(Mutex::new(Database::open_in_memory().unwrap()));
        let sink = SqliteAuditSink::new(Arc::clone(&db));

        let event = AuditEvent::new(AuditEventType::AlertViewed, "alert-1", &actor())
            .with_details(json!({"patient_id": "p1"}));
        sink.record(&event).unwrap();

        let records = db.lock().unwrap().get_audit_log("alert-1").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].event_type, "alert_viewed");
        assert_eq!(records[0].actor_id, "dr-a");
        assert_eq!(records[0].ip_address.as_deref(), Some("10.1.2.3"));
    }

    #[test]
    fn test_emit_swallows_failures() {
        emit(
            &BrokenSink,
            AuditEvent::new(AuditEventType::AlertCreated, "alert-1", &actor()),
        );
    }
}
