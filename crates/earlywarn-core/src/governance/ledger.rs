//! SHA-256 hash chain over an alert's audit trail.
//!
//! Each entry's hash covers the previous hash plus a canonical JSON encoding of
//! the entry, so any edit, removal or reordering breaks verification from that
//! point on.

use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use thiserror::Error;

use crate::models::{AuditEntry, GovernanceAction};

/// `prev_hash` of the first entry in every trail.
pub const GENESIS_HASH: &str = "0000000000000000000000000000000000000000000000000000000000000000";

pub const HASH_ALGORITHM: &str = "SHA-256";

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

pub type LedgerResult<T> = Result<T, LedgerError>;

/// Compute SHA-256 hash of data, hex encoded.
pub fn hash_data(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

/// A new entry before it is placed in the chain.
#[derive(Debug, Clone)]
pub struct EntryDraft {
    pub action: GovernanceAction,
    pub user_id: String,
    pub notes: Option<String>,
    pub target: Option<String>,
    pub timestamp: DateTime<Utc>,
}

impl EntryDraft {
    /// Draft stamped now. Timestamps keep microsecond precision so they survive
    /// storage unchanged.
    pub fn now(action: GovernanceAction, user_id: &str) -> Self {
        Self {
            action,
            user_id: user_id.to_string(),
            notes: None,
            target: None,
            timestamp: Utc::now().trunc_subsecs(6),
        }
    }

    pub fn with_notes(mut self, notes: Option<String>) -> Self {
        self.notes = notes;
        self
    }

    pub fn with_target(mut self, target: Option<String>) -> Self {
        self.target = target;
        self
    }
}

/// Fields covered by an entry hash, in fixed order.
#[derive(Serialize)]
struct HashedFields<'a> {
    alert_id: &'a str,
    sequence: u64,
    timestamp: String,
    action: GovernanceAction,
    user_id: &'a str,
    notes: Option<&'a str>,
    target: Option<&'a str>,
}

#[allow(clippy::too_many_arguments)]
fn entry_hash(
    alert_id: &str,
    sequence: u64,
    prev_hash: &str,
    timestamp: &DateTime<Utc>,
    action: GovernanceAction,
    user_id: &str,
    notes: Option<&str>,
    target: Option<&str>,
) -> LedgerResult<String> {
    let canonical = serde_json::to_string(&HashedFields {
        alert_id,
        sequence,
        timestamp: timestamp.to_rfc3339_opts(chrono::SecondsFormat::Micros, true),
        action,
        user_id,
        notes,
        target,
    })?;

    let mut data = Vec::with_capacity(prev_hash.len() + canonical.len());
    data.extend_from_slice(prev_hash.as_bytes());
    data.extend_from_slice(canonical.as_bytes());
    Ok(hash_data(&data))
}

/// Place a draft after `prev` (or at the start of the trail).
pub fn chain_entry(
    alert_id: &str,
    prev: Option<&AuditEntry>,
    draft: EntryDraft,
) -> LedgerResult<AuditEntry> {
    let (sequence, prev_hash) = match prev {
        Some(p) => (p.sequence + 1, p.hash.clone()),
        None => (0, GENESIS_HASH.to_string()),
    };
    let hash = entry_hash(
        alert_id,
        sequence,
        &prev_hash,
        &draft.timestamp,
        draft.action,
        &draft.user_id,
        draft.notes.as_deref(),
        draft.target.as_deref(),
    )?;

    Ok(AuditEntry {
        sequence,
        timestamp: draft.timestamp,
        action: draft.action,
        user_id: draft.user_id,
        notes: draft.notes,
        target: draft.target,
        prev_hash,
        hash,
    })
}

/// Result of verifying a trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChainVerification {
    pub valid: bool,
    pub entries_checked: usize,
    /// Sequence of the first entry that failed, if any
    pub first_invalid_sequence: Option<u64>,
    /// Hash of the last entry
    pub head_hash: Option<String>,
}

/// Recompute every hash and check the links between entries.
pub fn verify_chain(alert_id: &str, entries: &[AuditEntry]) -> LedgerResult<ChainVerification> {
    let mut expected_prev = GENESIS_HASH.to_string();

    for (index, entry) in entries.iter().enumerate() {
        let recomputed = entry_hash(
            alert_id,
            entry.sequence,
            &entry.prev_hash,
            &entry.timestamp,
            entry.action,
            &entry.user_id,
            entry.notes.as_deref(),
            entry.target.as_deref(),
        )?;

        let linked = entry.prev_hash == expected_prev && entry.sequence == index as u64;
        if !linked || recomputed != entry.hash {
            return Ok(ChainVerification {
                valid: false,
                entries_checked: index + 1,
                first_invalid_sequence: Some(entry.sequence),
                head_hash: entries.last().map(|e| e.hash.clone()),
            });
        }
        expected_prev = entry.hash.clone();
    }

    Ok(ChainVerification {
        valid: true,
        entries_checked: entries.len(),
        first_invalid_sequence: None,
        head_hash: entries.last().map(|e| e.hash.clone()),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trail(alert_id: &str) -> Vec<AuditEntry> {
        let mut entries: Vec<AuditEntry> = Vec::new();
        for (action, user) in [
            (GovernanceAction::Created, "system"),
            (GovernanceAction::Viewed, "dr-a"),
            (GovernanceAction::Acknowledged, "nurse-b"),
        ] {
            let entry = chain_entry(alert_id, entries.last(), EntryDraft::now(action, user)).unwrap();
            entries.push(entry);
        }
        entries
    }

    #[test]
    fn test_hash_data() {
        let hash = hash_data(b"hello");
        assert_eq!(hash.len(), 64);
        assert_eq!(hash, hash_data(b"hello"));
        assert_ne!(hash, hash_data(b"world"));
    }

    #[test]
    fn test_chain_links() {
        let entries = trail("a1");
        assert_eq!(entries[0].sequence, 0);
        assert_eq!(entries[0].prev_hash, GENESIS_HASH);
        assert_eq!(entries[1].prev_hash, entries[0].hash);
        assert_eq!(entries[2].sequence, 2);

        let verification = verify_chain("a1", &entries).unwrap();
        assert!(verification.valid);
        assert_eq!(verification.entries_checked, 3);
        assert_eq!(verification.head_hash.as_deref(), Some(entries[2].hash.as_str()));
    }

    #[test]
    fn test_tampering_detected() {
        let mut entries = trail("a1");
        entries[1].user_id = "someone-else".into();

        let verification = verify_chain("a1", &entries).unwrap();
        assert!(!verification.valid);
        assert_eq!(verification.first_invalid_sequence, Some(1));
    }

    #[test]
    fn test_removal_detected() {
        let mut entries = trail("a1");
        entries.remove(1);
        assert!(!verify_chain("a1", &entries).unwrap().valid);
    }

    #[test]
    fn test_chain_bound_to_alert() {
        let entries = trail("a1");
        assert!(!verify_chain("a2", &entries).unwrap().valid);
    }
}
