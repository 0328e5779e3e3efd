//! Event-sourced alert governance.
//!
//! The audit trail is the source of truth. The acknowledged/escalated/dismissed
//! state is derived by folding the trail, so a flag can only ever be set by
//! appending an entry and can never be cleared.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Action recorded in the audit trail.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GovernanceAction {
    Created,
    Viewed,
    Acknowledged,
    /// Acknowledge on an already-acknowledged alert (first acknowledger kept)
    AcknowledgeRepeated,
    Escalated,
    /// Escalate on an already-escalated alert (no state change)
    EscalationRepeated,
    Dismissed,
    /// Dismiss on an already-dismissed alert (first dismissal kept)
    DismissRepeated,
}

impl GovernanceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            GovernanceAction::Created => "created",
            GovernanceAction::Viewed => "viewed",
            GovernanceAction::Acknowledged => "acknowledged",
            GovernanceAction::AcknowledgeRepeated => "acknowledge_repeated",
            GovernanceAction::Escalated => "escalated",
            GovernanceAction::EscalationRepeated => "escalation_repeated",
            GovernanceAction::Dismissed => "dismissed",
            GovernanceAction::DismissRepeated => "dismiss_repeated",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "created" => Some(GovernanceAction::Created),
            "viewed" => Some(GovernanceAction::Viewed),
            "acknowledged" => Some(GovernanceAction::Acknowledged),
            "acknowledge_repeated" => Some(GovernanceAction::AcknowledgeRepeated),
            "escalated" => Some(GovernanceAction::Escalated),
            "escalation_repeated" => Some(GovernanceAction::EscalationRepeated),
            "dismissed" => Some(GovernanceAction::Dismissed),
            "dismiss_repeated" => Some(GovernanceAction::DismissRepeated),
            _ => None,
        }
    }
}

/// One append-only audit trail entry, hash-chained to its predecessor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AuditEntry {
    /// Position in the trail, starting at 0 for `Created`
    pub sequence: u64,
    pub timestamp: DateTime<Utc>,
    pub action: GovernanceAction,
    pub user_id: String,
    #[serde(default)]
    pub notes: Option<String>,
    /// Escalation target, when escalating
    #[serde(default)]
    pub target: Option<String>,
    pub prev_hash: String,
    pub hash: String,
}

/// Who set a governance flag, and when.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GovernanceStamp {
    pub by: String,
    pub at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
    /// Escalation target or dismissal reason
    #[serde(default)]
    pub detail: Option<String>,
}

impl GovernanceStamp {
    fn from_entry(entry: &AuditEntry) -> Self {
        Self {
            by: entry.user_id.clone(),
            at: entry.timestamp,
            notes: entry.notes.clone(),
            detail: entry.target.clone(),
        }
    }
}

/// Governance state of an alert plus its audit trail.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(from = "GovernanceRecord")]
pub struct Governance {
    acknowledged: Option<GovernanceStamp>,
    escalated: Option<GovernanceStamp>,
    dismissed: Option<GovernanceStamp>,
    view_count: u32,
    audit_trail: Vec<AuditEntry>,
}

/// Serialized form that deserialization rebuilds state from.
#[derive(Deserialize)]
struct GovernanceRecord {
    #[serde(default)]
    audit_trail: Vec<AuditEntry>,
}

impl From<GovernanceRecord> for Governance {
    fn from(record: GovernanceRecord) -> Self {
        Governance::from_trail(record.audit_trail)
    }
}

impl Governance {
    /// Rebuild state by folding a trail in sequence order.
    pub fn from_trail(trail: Vec<AuditEntry>) -> Self {
        let mut governance = Governance::default();
        for entry in trail {
            governance.apply(entry);
        }
        governance
    }

    /// Append an entry and fold it into the derived state.
    pub(crate) fn apply(&mut self, entry: AuditEntry) {
        match entry.action {
            GovernanceAction::Viewed => self.view_count += 1,
            GovernanceAction::Acknowledged if self.acknowledged.is_none() => {
                self.acknowledged = Some(GovernanceStamp::from_entry(&entry));
            }
            GovernanceAction::Escalated if self.escalated.is_none() => {
                self.escalated = Some(GovernanceStamp::from_entry(&entry));
            }
            GovernanceAction::Dismissed if self.dismissed.is_none() => {
                self.dismissed = Some(GovernanceStamp::from_entry(&entry));
            }
            _ => {}
        }
        self.audit_trail.push(entry);
    }

    pub fn audit_trail(&self) -> &[AuditEntry] {
        &self.audit_trail
    }

    pub fn last_entry(&self) -> Option<&AuditEntry> {
        self.audit_trail.last()
    }

    pub fn acknowledged(&self) -> Option<&GovernanceStamp> {
        self.acknowledged.as_ref()
    }

    pub fn escalated(&self) -> Option<&GovernanceStamp> {
        self.escalated.as_ref()
    }

    pub fn dismissed(&self) -> Option<&GovernanceStamp> {
        self.dismissed.as_ref()
    }

    pub fn is_acknowledged(&self) -> bool {
        self.acknowledged.is_some()
    }

    pub fn is_escalated(&self) -> bool {
        self.escalated.is_some()
    }

    pub fn is_dismissed(&self) -> bool {
        self.dismissed.is_some()
    }

    pub fn view_count(&self) -> u32 {
        self.view_count
    }

    /// Number of trail entries with the given action.
    pub fn count(&self, action: GovernanceAction) -> usize {
        self.audit_trail.iter().filter(|e| e.action == action).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(sequence: u64, action: GovernanceAction, user: &str) -> AuditEntry {
        AuditEntry {
            sequence,
            timestamp: Utc::now(),
            action,
            user_id: user.into(),
            notes: None,
            target: None,
            prev_hash: String::new(),
            hash: format!("h{}", sequence),
        }
    }

    #[test]
    fn test_first_acknowledger_kept() {
        let governance = Governance::from_trail(vec![
            entry(0, GovernanceAction::Created, "system"),
            entry(1, GovernanceAction::Acknowledged, "nurse-a"),
            entry(2, GovernanceAction::Acknowledged, "nurse-b"),
        ]);

        assert!(governance.is_acknowledged());
        assert_eq!(governance.acknowledged().unwrap().by, "nurse-a");
        assert_eq!(governance.audit_trail().len(), 3);
    }

    #[test]
    fn test_views_counted() {
        let governance = Governance::from_trail(vec![
            entry(0, GovernanceAction::Created, "system"),
            entry(1, GovernanceAction::Viewed, "dr-a"),
            entry(2, GovernanceAction::Viewed, "dr-a"),
        ]);
        assert_eq!(governance.view_count(), 2);
        assert_eq!(governance.count(GovernanceAction::Viewed), 2);
        assert!(!governance.is_escalated());
    }

    #[test]
    fn test_serde_rebuilds_state_from_trail() {
        let governance = Governance::from_trail(vec![
            entry(0, GovernanceAction::Created, "system"),
            entry(1, GovernanceAction::Dismissed, "dr-a"),
        ]);

        let json = serde_json::to_string(&governance).unwrap();
        // A tampered flag in the payload is ignored; the trail decides.
        let tampered = json.replace("\"dismissed\":{", "\"ignored\":{");
        let restored: Governance = serde_json::from_str(&tampered).unwrap();

        assert!(restored.is_dismissed());
        assert_eq!(restored, governance);
    }
}
