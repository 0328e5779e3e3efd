//! Alert database operations.

use std::collections::HashMap;

use rusqlite::{params, OptionalExtension};
use serde::{Deserialize, Serialize};

use super::events::{insert_event, EventRow, EVENT_COLUMNS};
use super::{format_timestamp, Database, DbError, DbResult};
use crate::models::{Alert, AuditEntry, RiskLevel, Trajectory};

/// Risk and trajectory of one stored alert, for dashboard counts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AlertHeadline {
    pub alert_id: String,
    pub patient_id: String,
    pub risk_level: RiskLevel,
    pub trajectory: Trajectory,
    pub active: bool,
}

/// Active: no acknowledged or dismissed entry in the trail.
const ACTIVE_CONDITION: &str = r#"
    NOT EXISTS (
        SELECT 1 FROM alert_events e
        WHERE e.alert_id = a.id
          AND e.action IN ('acknowledged', 'dismissed')
    )
"#;

impl Database {
    /// Insert an alert and its initial trail in one transaction.
    pub fn insert_alert(&mut self, alert: &Alert) -> DbResult<()> {
        let body = alert.body_json()?;
        let tx = self.conn.transaction()?;

        tx.execute(
            r#"
            INSERT INTO alerts (
                id, patient_id, scope_id, risk_level, trajectory, body, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#,
            params![
                alert.id,
                alert.patient_id,
                alert.scope_id,
                alert.risk_level.as_str(),
                alert.trajectory.as_str(),
                body,
                format_timestamp(&alert.timestamp),
            ],
        )?;

        for entry in alert.governance.audit_trail() {
            insert_event(&tx, &alert.id, entry)?;
        }

        tx.commit()?;
        Ok(())
    }

    /// Get an alert by ID, with governance rebuilt from its trail.
    pub fn get_alert(&self, alert_id: &str) -> DbResult<Option<Alert>> {
        let body: Option<String> = self
            .conn
            .query_row("SELECT body FROM alerts WHERE id = ?", [alert_id], |row| {
                row.get(0)
            })
            .optional()?;

        match body {
            Some(body) => {
                let trail = self.get_events(alert_id)?;
                Ok(Some(assemble_alert(&body, trail)?))
            }
            None => Ok(None),
        }
    }

    /// Alerts for a patient within a scope, newest first.
    pub fn list_alerts_by_patient(
        &self,
        scope_id: &str,
        patient_id: &str,
        active_only: bool,
        limit: usize,
    ) -> DbResult<Vec<Alert>> {
        let sql = format!(
            r#"
            SELECT a.id, a.body
            FROM alerts a
            WHERE a.scope_id = ?1 AND a.patient_id = ?2
              {}
            ORDER BY a.created_at DESC, a.rowid DESC
            LIMIT ?3
            "#,
            if active_only {
                format!("AND {}", ACTIVE_CONDITION)
            } else {
                String::new()
            }
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(params![scope_id, patient_id, limit as i64], |row| {
            Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
        })?;

        let mut bodies = Vec::new();
        for row in rows {
            bodies.push(row?);
        }

        let ids: Vec<&str> = bodies.iter().map(|(id, _)| id.as_str()).collect();
        let mut trails = self.get_events_for(&ids)?;

        let mut alerts = Vec::with_capacity(bodies.len());
        for (id, body) in &bodies {
            let trail = trails.remove(id).unwrap_or_default();
            alerts.push(assemble_alert(body, trail)?);
        }
        Ok(alerts)
    }

    /// Risk, trajectory and active flag for every alert in a scope.
    pub fn alert_headlines(&self, scope_id: &str) -> DbResult<Vec<AlertHeadline>> {
        let sql = format!(
            r#"
            SELECT a.id, a.patient_id, a.risk_level, a.trajectory,
                   CASE WHEN {} THEN 1 ELSE 0 END
            FROM alerts a
            WHERE a.scope_id = ?1
            ORDER BY a.created_at DESC
            "#,
            ACTIVE_CONDITION
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([scope_id], |row| {
            Ok((
                row.get::<_, String>(0)?,
                row.get::<_, String>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, i64>(4)?,
            ))
        })?;

        let mut headlines = Vec::new();
        for row in rows {
            let (alert_id, patient_id, risk, trajectory, active) = row?;
            headlines.push(AlertHeadline {
                risk_level: RiskLevel::parse(&risk)
                    .ok_or_else(|| DbError::InvalidData(format!("risk level {}", risk)))?,
                trajectory: Trajectory::parse(&trajectory)
                    .ok_or_else(|| DbError::InvalidData(format!("trajectory {}", trajectory)))?,
                alert_id,
                patient_id,
                active: active != 0,
            });
        }
        Ok(headlines)
    }

    /// Trails for several alerts, keyed by alert ID.
    fn get_events_for(&self, alert_ids: &[&str]) -> DbResult<HashMap<String, Vec<AuditEntry>>> {
        let mut trails: HashMap<String, Vec<AuditEntry>> = HashMap::new();
        if alert_ids.is_empty() {
            return Ok(trails);
        }

        let placeholders = vec!["?"; alert_ids.len()].join(", ");
        let sql = format!(
            "SELECT alert_id, {} FROM alert_events WHERE alert_id IN ({}) ORDER BY alert_id, sequence",
            EVENT_COLUMNS, placeholders
        );

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map(rusqlite::params_from_iter(alert_ids.iter()), |row| {
            Ok((row.get::<_, String>(0)?, EventRow::from_row(row, 1)?))
        })?;

        for row in rows {
            let (alert_id, event) = row?;
            trails.entry(alert_id).or_default().push(event.try_into()?);
        }
        Ok(trails)
    }
}

/// Merge a stored body with its trail and deserialize.
fn assemble_alert(body: &str, trail: Vec<AuditEntry>) -> DbResult<Alert> {
    let mut value: serde_json::Value = serde_json::from_str(body)?;
    let map = value
        .as_object_mut()
        .ok_or_else(|| DbError::InvalidData("alert body is not an object".into()))?;
    map.insert(
        "governance".into(),
        serde_json::json!({ "audit_trail": trail }),
    );
    Ok(serde_json::from_value(value)?)
}
