//! Security audit log operations.

use rusqlite::params;
use serde::{Deserialize, Serialize};

use super::{Database, DbResult};

/// One stored audit log record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditLogRecord {
    pub id: i64,
    pub event_type: String,
    pub resource_id: String,
    pub actor_id: String,
    pub details: serde_json::Value,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: String,
}

impl Database {
    /// Record a security event.
    pub fn insert_audit_log(
        &self,
        event_type: &str,
        resource_id: &str,
        actor_id: &str,
        details: &serde_json::Value,
        ip_address: Option<&str>,
        user_agent: Option<&str>,
    ) -> DbResult<i64> {
        self.conn.execute(
            r#"
            INSERT INTO audit_log (
                event_type, resource_id, actor_id, details, ip_address, user_agent
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
            params![
                event_type,
                resource_id,
                actor_id,
                serde_json::to_string(details)?,
                ip_address,
                user_agent,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    /// Audit records for a resource, oldest first.
    pub fn get_audit_log(&self, resource_id: &str) -> DbResult<Vec<AuditLogRecord>> {
        let mut stmt = self.conn.prepare(
            r#"
            SELECT id, event_type, resource_id, actor_id, details,
                   ip_address, user_agent, created_at
            FROM audit_log
            WHERE resource_id = ?
            ORDER BY id
            "#,
        )?;

        let rows = stmt.query_map([resource_id], |row| {
            Ok((
                AuditLogRecord {
                    id: row.get(0)?,
                    event_type: row.get(1)?,
                    resource_id: row.get(2)?,
                    actor_id: row.get(3)?,
                    details: serde_json::Value::Null,
                    ip_address: row.get(5)?,
                    user_agent: row.get(6)?,
                    created_at: row.get(7)?,
                },
                row.get::<_, String>(4)?,
            ))
        })?;

        let mut records = Vec::new();
        for row in rows {
            let (mut record, details) = row?;
            record.details = serde_json::from_str(&details)?;
            records.push(record);
        }
        Ok(records)
    }
}
