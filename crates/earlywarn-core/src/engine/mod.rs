//! Alert lifecycle manager.
//!
//! Wraps the rule-based [`Analyzer`] into persisted [`Alert`]s and governs
//! them. Governance writes on one alert are serialized by a per-id lock;
//! different alerts never contend on it.

mod analyzer;
mod error;

pub use analyzer::{validate_request, Analyzer};
pub use error::{EngineError, EngineResult};

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use earlywarn_narrative::NarrativeGenerator;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::audit::{emit, AuditEvent, AuditEventType, AuditSink};
use crate::config::EngineConfig;
use crate::explain::Enhancer;
use crate::governance::{
    chain_entry, decide, verify_chain, AuditTrailExport, ChainVerification, Command, EntryDraft,
    KeyedLocks,
};
use crate::models::{
    Actor, Alert, AnalysisOutcome, AnalysisRequest, GovernanceAction, RiskLevel, Trajectory,
};
use crate::store::AlertStore;

/// Scope-wide counts of alerts.
///
/// The groupings cover active alerts only; every level and trajectory is
/// present, zero when unused.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DashboardSummary {
    pub scope_id: String,
    pub total_alerts: usize,
    pub active_alerts: usize,
    pub by_risk_level: BTreeMap<RiskLevel, usize>,
    pub by_trajectory: BTreeMap<Trajectory, usize>,
    /// Distinct patients with at least one active alert
    pub patients_with_active_alerts: usize,
}

/// Creates and governs alerts.
pub struct AlertManager {
    config: EngineConfig,
    analyzer: Analyzer,
    enhancer: Enhancer,
    store: Arc<dyn AlertStore>,
    audit: Arc<dyn AuditSink>,
    locks: KeyedLocks,
}

impl AlertManager {
    pub fn new(config: EngineConfig, store: Arc<dyn AlertStore>, audit: Arc<dyn AuditSink>) -> Self {
        let timeout = Duration::from_millis(config.enhancement_timeout_ms);
        Self {
            analyzer: Analyzer::new(&config),
            enhancer: Enhancer::new(None, timeout),
            config,
            store,
            audit,
            locks: KeyedLocks::new(),
        }
    }

    /// Attach a narrative generator for requests with `use_enhancement`.
    pub fn with_generator(mut self, generator: Arc<dyn NarrativeGenerator>) -> Self {
        let timeout = Duration::from_millis(self.config.enhancement_timeout_ms);
        self.enhancer = Enhancer::new(Some(generator), timeout);
        self
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Rule-based result for a request, without persisting anything.
    pub fn analyze(&self, request: &AnalysisRequest) -> EngineResult<AnalysisOutcome> {
        validate_request(request, &self.config)?;
        Ok(self.analyzer.analyze(request))
    }

    /// Analyze, optionally enhance, and persist a new alert owned by the actor's scope.
    ///
    /// Nothing is written until the alert is complete; the row and its
    /// `created` entry land in one transaction.
    pub async fn create(&self, request: AnalysisRequest, actor: &Actor) -> EngineResult<Alert> {
        validate_request(&request, &self.config)?;
        let mut outcome = self.analyzer.analyze(&request);

        let ai_insights = if request.use_enhancement {
            match self.enhancer.enhance(&outcome, &request.context).await {
                Ok(insights) => Some(insights),
                Err(e) => {
                    tracing::warn!(patient_id = %request.patient_id, error = %e, "narrative enhancement unavailable");
                    outcome
                        .explainability
                        .limitations
                        .push(format!("Narrative enhancement unavailable: {}", e));
                    None
                }
            }
        } else {
            None
        };

        let mut alert = Alert::from_outcome(
            outcome,
            request.patient_id.clone(),
            actor.scope_id.clone(),
            ai_insights,
        );
        let genesis = chain_entry(
            &alert.id,
            None,
            EntryDraft::now(GovernanceAction::Created, &actor.user_id),
        )?;
        alert.governance.apply(genesis);

        if let Err(e) = self.store.insert(&alert) {
            tracing::error!(alert_id = %alert.id, patient_id = %alert.patient_id, error = %e, "failed to persist alert");
            return Err(e.into());
        }

        emit(
            self.audit.as_ref(),
            AuditEvent::new(AuditEventType::AlertCreated, &alert.id, actor).with_details(json!({
                "patient_id": alert.patient_id,
                "risk_level": alert.risk_level,
                "trajectory": alert.trajectory,
                "enhanced": alert.ai_insights.is_some(),
            })),
        );
        tracing::info!(
            alert_id = %alert.id,
            patient_id = %alert.patient_id,
            risk_level = alert.risk_level.as_str(),
            trajectory = alert.trajectory.as_str(),
            "alert created"
        );

        Ok(alert)
    }

    /// Record a view. Never changes state.
    pub async fn view(&self, alert_id: &str, actor: &Actor) -> EngineResult<Alert> {
        self.govern(alert_id, actor, Command::View, None, None).await
    }

    pub async fn acknowledge(
        &self,
        alert_id: &str,
        actor: &Actor,
        notes: Option<String>,
    ) -> EngineResult<Alert> {
        self.govern(alert_id, actor, Command::Acknowledge, notes, None)
            .await
    }

    /// Escalate to `target` (a team, role or person).
    pub async fn escalate(
        &self,
        alert_id: &str,
        actor: &Actor,
        target: &str,
        notes: Option<String>,
    ) -> EngineResult<Alert> {
        let target = required(target, "escalation target")?;
        self.govern(alert_id, actor, Command::Escalate, notes, Some(target))
            .await
    }

    /// Dismiss with a reason. A blank reason is rejected before anything is read.
    pub async fn dismiss(
        &self,
        alert_id: &str,
        actor: &Actor,
        reason: &str,
        notes: Option<String>,
    ) -> EngineResult<Alert> {
        let reason = required(reason, "dismissal reason")?;
        self.govern(alert_id, actor, Command::Dismiss, notes, Some(reason))
            .await
    }

    pub fn get_by_id(&self, alert_id: &str, actor: &Actor) -> EngineResult<Alert> {
        self.load_authorized(alert_id, actor)
    }

    /// Alerts for a patient in the actor's scope, newest first.
    ///
    /// `limit` is clamped to the configured maximum.
    pub fn list_by_patient(
        &self,
        patient_id: &str,
        actor: &Actor,
        active_only: bool,
        limit: usize,
    ) -> EngineResult<Vec<Alert>> {
        let patient_id = required(patient_id, "patient_id")?;
        if limit == 0 {
            return Err(EngineError::Validation("limit must be at least 1".into()));
        }
        let limit = limit.min(self.config.max_list_limit);

        Ok(self
            .store
            .list_by_patient(&actor.scope_id, &patient_id, active_only, limit)?)
    }

    pub fn dashboard_summary(&self, actor: &Actor) -> EngineResult<DashboardSummary> {
        let headlines = self.store.headlines(&actor.scope_id)?;

        let mut by_risk_level: BTreeMap<RiskLevel, usize> = [
            RiskLevel::Low,
            RiskLevel::Moderate,
            RiskLevel::High,
            RiskLevel::Critical,
        ]
        .into_iter()
        .map(|level| (level, 0))
        .collect();
        let mut by_trajectory: BTreeMap<Trajectory, usize> = [
            Trajectory::Improving,
            Trajectory::Stable,
            Trajectory::Worsening,
            Trajectory::RapidlyWorsening,
        ]
        .into_iter()
        .map(|trajectory| (trajectory, 0))
        .collect();
        let mut patients = std::collections::BTreeSet::new();

        for headline in headlines.iter().filter(|h| h.active) {
            *by_risk_level.entry(headline.risk_level).or_default() += 1;
            *by_trajectory.entry(headline.trajectory).or_default() += 1;
            patients.insert(headline.patient_id.as_str());
        }

        Ok(DashboardSummary {
            scope_id: actor.scope_id.clone(),
            total_alerts: headlines.len(),
            active_alerts: headlines.iter().filter(|h| h.active).count(),
            patients_with_active_alerts: patients.len(),
            by_risk_level,
            by_trajectory,
        })
    }

    /// Compliance export of an alert's trail, verified at export time.
    pub fn export_audit_trail(&self, alert_id: &str, actor: &Actor) -> EngineResult<AuditTrailExport> {
        let alert = self.load_authorized(alert_id, actor)?;
        let export = AuditTrailExport::build(&alert, &actor.user_id, self.config.system_id.clone())?;

        if !export.verification.valid {
            tracing::error!(
                alert_id = %alert.id,
                first_invalid_sequence = ?export.verification.first_invalid_sequence,
                "audit trail failed verification"
            );
        }
        emit(
            self.audit.as_ref(),
            AuditEvent::new(AuditEventType::AuditTrailExported, &alert.id, actor).with_details(
                json!({
                    "entries": export.audit_trail.len(),
                    "valid": export.verification.valid,
                }),
            ),
        );
        Ok(export)
    }

    /// Recompute the stored hash chain.
    pub fn verify_audit_trail(&self, alert_id: &str, actor: &Actor) -> EngineResult<ChainVerification> {
        let alert = self.load_authorized(alert_id, actor)?;
        Ok(verify_chain(&alert.id, alert.governance.audit_trail())?)
    }

    /// Apply one governance command under the alert's lock.
    async fn govern(
        &self,
        alert_id: &str,
        actor: &Actor,
        command: Command,
        notes: Option<String>,
        detail: Option<String>,
    ) -> EngineResult<Alert> {
        let _guard = self.locks.lock(alert_id).await;

        let mut alert = self.load_authorized(alert_id, actor)?;
        let action = decide(&alert.governance, command)?;

        let draft = EntryDraft::now(action, &actor.user_id)
            .with_notes(notes)
            .with_target(detail);
        let entry = chain_entry(&alert.id, alert.governance.last_entry(), draft)?;

        if let Err(e) = self.store.append_entry(&alert.id, &entry) {
            tracing::error!(alert_id = %alert.id, action = action.as_str(), error = %e, "failed to append audit entry");
            return Err(e.into());
        }

        let details = json!({
            "action": action,
            "sequence": entry.sequence,
            "patient_id": alert.patient_id,
            "target": entry.target,
        });
        alert.governance.apply(entry);

        emit(
            self.audit.as_ref(),
            AuditEvent::new(event_type(command), &alert.id, actor).with_details(details),
        );
        tracing::info!(
            alert_id = %alert.id,
            user_id = %actor.user_id,
            action = action.as_str(),
            "governance action recorded"
        );

        Ok(alert)
    }

    /// Load an alert the actor's scope owns. Mismatches are audited.
    fn load_authorized(&self, alert_id: &str, actor: &Actor) -> EngineResult<Alert> {
        let alert = self
            .store
            .get(alert_id)?
            .ok_or_else(|| EngineError::NotFound(alert_id.to_string()))?;

        if alert.scope_id != actor.scope_id {
            tracing::warn!(
                alert_id = %alert_id,
                user_id = %actor.user_id,
                scope_id = %actor.scope_id,
                "scope mismatch"
            );
            emit(
                self.audit.as_ref(),
                AuditEvent::new(AuditEventType::AuthorizationFailure, alert_id, actor)
                    .with_details(json!({ "actor_scope": actor.scope_id })),
            );
            return Err(EngineError::Forbidden {
                alert_id: alert_id.to_string(),
                scope_id: actor.scope_id.clone(),
            });
        }
        Ok(alert)
    }
}

fn event_type(command: Command) -> AuditEventType {
    match command {
        Command::View => AuditEventType::AlertViewed,
        Command::Acknowledge => AuditEventType::AlertAcknowledged,
        Command::Escalate => AuditEventType::AlertEscalated,
        Command::Dismiss => AuditEventType::AlertDismissed,
    }
}

/// Trimmed value, or a validation error naming the field.
fn required(value: &str, field: &str) -> EngineResult<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(EngineError::Validation(format!("{} is required", field)));
    }
    Ok(trimmed.to_string())
}
