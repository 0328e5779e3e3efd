//! Append-only governance event operations.

use rusqlite::{params, Connection, Row};

use super::{format_timestamp, parse_timestamp, Database, DbError, DbResult};
use crate::models::{AuditEntry, GovernanceAction};

pub(super) const EVENT_COLUMNS: &str =
    "sequence, timestamp, action, user_id, notes, target, prev_hash, hash";

impl Database {
    /// Append one entry to an alert's trail.
    ///
    /// The schema rejects entries that do not extend the current head.
    pub fn append_event(&self, alert_id: &str, entry: &AuditEntry) -> DbResult<()> {
        insert_event(&self.conn, alert_id, entry)
    }

    /// An alert's trail in sequence order.
    pub fn get_events(&self, alert_id: &str) -> DbResult<Vec<AuditEntry>> {
        let sql = format!(
            "SELECT {} FROM alert_events WHERE alert_id = ? ORDER BY sequence",
            EVENT_COLUMNS
        );
        let mut stmt = self.conn.prepare(&sql)?;
        let rows = stmt.query_map([alert_id], |row| EventRow::from_row(row, 0))?;

        let mut entries = Vec::new();
        for row in rows {
            entries.push(row?.try_into()?);
        }
        Ok(entries)
    }
}

pub(super) fn insert_event(conn: &Connection, alert_id: &str, entry: &AuditEntry) -> DbResult<()> {
    conn.execute(
        r#"
        INSERT INTO alert_events (
            alert_id, sequence, timestamp, action, user_id,
            notes, target, prev_hash, hash
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
        "#,
        params![
            alert_id,
            entry.sequence as i64,
            format_timestamp(&entry.timestamp),
            entry.action.as_str(),
            entry.user_id,
            entry.notes,
            entry.target,
            entry.prev_hash,
            entry.hash,
        ],
    )?;
    Ok(())
}

/// Raw database row for an event.
pub(super) struct EventRow {
    sequence: i64,
    timestamp: String,
    action: String,
    user_id: String,
    notes: Option<String>,
    target: Option<String>,
    prev_hash: String,
    hash: String,
}

impl EventRow {
    /// Read the `EVENT_COLUMNS` starting at column `offset`.
    pub(super) fn from_row(row: &Row<'_>, offset: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            sequence: row.get(offset)?,
            timestamp: row.get(offset + 1)?,
            action: row.get(offset + 2)?,
            user_id: row.get(offset + 3)?,
            notes: row.get(offset + 4)?,
            target: row.get(offset + 5)?,
            prev_hash: row.get(offset + 6)?,
            hash: row.get(offset + 7)?,
        })
    }
}

impl TryFrom<EventRow> for AuditEntry {
    type Error = DbError;

    fn try_from(row: EventRow) -> Result<Self, Self::Error> {
        let action = GovernanceAction::parse(&row.action)
            .ok_or_else(|| DbError::InvalidData(format!("governance action {}", row.action)))?;
        let sequence = u64::try_from(row.sequence)
            .map_err(|_| DbError::InvalidData(format!("sequence {}", row.sequence)))?;

        Ok(AuditEntry {
            sequence,
            timestamp: parse_timestamp(&row.timestamp)?,
            action,
            user_id: row.user_id,
            notes: row.notes,
            target: row.target,
            prev_hash: row.prev_hash,
            hash: row.hash,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::{chain_entry, verify_chain, EntryDraft};
    use crate::models::{Alert, AnalysisRequest};
    use crate::engine::Analyzer;
    use crate::config::EngineConfig;

    fn stored_alert(db: &mut Database) -> Alert {
        let request = AnalysisRequest::new("p1");
        let outcome = Analyzer::new(&EngineConfig::default()).analyze(&request);
        let mut alert = Alert::from_outcome(outcome, "p1".into(), "ward-a".into(), None);
        let genesis = chain_entry(
            &alert.id,
            None,
            EntryDraft::now(GovernanceAction::Created, "system"),
        )
        .unwrap();
        alert.governance.apply(genesis);
        db.insert_alert(&alert).unwrap();
        alert
    }

    #[test]
    fn test_alert_round_trip() {
        let mut db = Database::open_in_memory().unwrap();
        let alert = stored_alert(&mut db);

        let loaded = db.get_alert(&alert.id).unwrap().unwrap();
        assert_eq!(loaded, alert);
        assert!(db.get_alert("missing").unwrap().is_none());
    }

    #[test]
    fn test_append_extends_chain() {
        let mut db = Database::open_in_memory().unwrap();
        let alert = stored_alert(&mut db);

        let entry = chain_entry(
            &alert.id,
            alert.governance.last_entry(),
            EntryDraft::now(GovernanceAction::Viewed, "dr-a"),
        )
        .unwrap();
        db.append_event(&alert.id, &entry).unwrap();

        let trail = db.get_events(&alert.id).unwrap();
        assert_eq!(trail.len(), 2);
        assert_eq!(trail[1], entry);
        assert!(verify_chain(&alert.id, &trail).unwrap().valid);
    }

    #[test]
    fn test_unlinked_entry_rejected() {
        let mut db = Database::open_in_memory().unwrap();
        let alert = stored_alert(&mut db);

        let mut entry = chain_entry(
            &alert.id,
            alert.governance.last_entry(),
            EntryDraft::now(GovernanceAction::Viewed, "dr-a"),
        )
        .unwrap();
        entry.prev_hash = "f".repeat(64);

        assert!(db.append_event(&alert.id, &entry).is_err());
        assert_eq!(db.get_events(&alert.id).unwrap().len(), 1);
    }

    #[test]
    fn test_events_are_append_only() {
        let mut db = Database::open_in_memory().unwrap();
        let alert = stored_alert(&mut db);

        let update = db.conn().execute(
            "UPDATE alert_events SET user_id = 'mallory' WHERE alert_id = ?",
            [&alert.id],
        );
        assert!(update.is_err());

        let delete = db
            .conn()
            .execute("DELETE FROM alert_events WHERE alert_id = ?", [&alert.id]);
        assert!(delete.is_err());

        let alert_update = db
            .conn()
            .execute("UPDATE alerts SET risk_level = 'LOW' WHERE id = ?", [&alert.id]);
        assert!(alert_update.is_err());
    }

    #[test]
    fn test_list_and_headlines() {
        let mut db = Database::open_in_memory().unwrap();
        let first = stored_alert(&mut db);
        let second = stored_alert(&mut db);

        let dismissed = chain_entry(
            &first.id,
            first.governance.last_entry(),
            EntryDraft::now(GovernanceAction::Dismissed, "dr-a")
                .with_target(Some("duplicate".into())),
        )
        .unwrap();
        db.append_event(&first.id, &dismissed).unwrap();

        let all = db.list_alerts_by_patient("ward-a", "p1", false, 10).unwrap();
        assert_eq!(all.len(), 2);

        let active = db.list_alerts_by_patient("ward-a", "p1", true, 10).unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id, second.id);

        assert!(db.list_alerts_by_patient("ward-b", "p1", false, 10).unwrap().is_empty());
        assert_eq!(db.list_alerts_by_patient("ward-a", "p1", false, 1).unwrap().len(), 1);

        let headlines = db.alert_headlines("ward-a").unwrap();
        assert_eq!(headlines.len(), 2);
        assert_eq!(headlines.iter().filter(|h| h.active).count(), 1);
    }
}
