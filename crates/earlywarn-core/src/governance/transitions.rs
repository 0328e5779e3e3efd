//! Governance state machine.
//!
//! `created` ends in exactly one of acknowledged or dismissed. Escalation is an
//! orthogonal flag that may be raised before or after acknowledgment but not
//! after dismissal. Repeats are recorded, never rejected, and never change the
//! first stamp.

use thiserror::Error;

use crate::models::{Governance, GovernanceAction};

/// A requested governance operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    View,
    Acknowledge,
    Escalate,
    Dismiss,
}

impl Command {
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::View => "view",
            Command::Acknowledge => "acknowledge",
            Command::Escalate => "escalate",
            Command::Dismiss => "dismiss",
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("cannot {command} an alert that is already {state}")]
pub struct TransitionError {
    pub command: &'static str,
    pub state: &'static str,
}

/// The audit action a command produces in the current state.
pub fn decide(state: &Governance, command: Command) -> Result<GovernanceAction, TransitionError> {
    let reject = |state: &'static str| TransitionError {
        command: command.as_str(),
        state,
    };

    match command {
        Command::View => Ok(GovernanceAction::Viewed),
        Command::Acknowledge if state.is_dismissed() => Err(reject("dismissed")),
        Command::Acknowledge if state.is_acknowledged() => Ok(GovernanceAction::AcknowledgeRepeated),
        Command::Acknowledge => Ok(GovernanceAction::Acknowledged),
        Command::Escalate if state.is_dismissed() => Err(reject("dismissed")),
        Command::Escalate if state.is_escalated() => Ok(GovernanceAction::EscalationRepeated),
        Command::Escalate => Ok(GovernanceAction::Escalated),
        Command::Dismiss if state.is_acknowledged() => Err(reject("acknowledged")),
        Command::Dismiss if state.is_dismissed() => Ok(GovernanceAction::DismissRepeated),
        Command::Dismiss => Ok(GovernanceAction::Dismissed),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::governance::ledger::{chain_entry, EntryDraft};

    fn state(actions: &[GovernanceAction]) -> Governance {
        let mut trail = Vec::new();
        for action in [GovernanceAction::Created].iter().chain(actions) {
            let entry = chain_entry("a1", trail.last(), EntryDraft::now(*action, "u")).unwrap();
            trail.push(entry);
        }
        Governance::from_trail(trail)
    }

    #[test]
    fn test_fresh_alert() {
        let fresh = state(&[]);
        assert_eq!(decide(&fresh, Command::Acknowledge), Ok(GovernanceAction::Acknowledged));
        assert_eq!(decide(&fresh, Command::Escalate), Ok(GovernanceAction::Escalated));
        assert_eq!(decide(&fresh, Command::Dismiss), Ok(GovernanceAction::Dismissed));
    }

    #[test]
    fn test_escalate_after_acknowledge_allowed() {
        let acked = state(&[GovernanceAction::Acknowledged]);
        assert_eq!(decide(&acked, Command::Escalate), Ok(GovernanceAction::Escalated));
        assert_eq!(
            decide(&acked, Command::Acknowledge),
            Ok(GovernanceAction::AcknowledgeRepeated)
        );
        assert!(decide(&acked, Command::Dismiss).is_err());
    }

    #[test]
    fn test_dismissed_is_terminal() {
        let dismissed = state(&[GovernanceAction::Dismissed]);
        assert!(decide(&dismissed, Command::Acknowledge).is_err());
        assert!(decide(&dismissed, Command::Escalate).is_err());
        assert_eq!(decide(&dismissed, Command::View), Ok(GovernanceAction::Viewed));
        assert_eq!(
            decide(&dismissed, Command::Dismiss),
            Ok(GovernanceAction::DismissRepeated)
        );
    }

    #[test]
    fn test_second_escalation_is_repeat() {
        let escalated = state(&[GovernanceAction::Escalated]);
        assert_eq!(
            decide(&escalated, Command::Escalate),
            Ok(GovernanceAction::EscalationRepeated)
        );
    }
}
