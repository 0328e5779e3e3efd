//! Alert lifecycle integration tests.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use earlywarn_core::audit::TracingAuditSink;
use earlywarn_core::db::AlertHeadline;
use earlywarn_core::models::{
    codes, AuditEntry, GovernanceAction, Severity, SignalType, TrendDirection,
};
use earlywarn_core::store::{StoreError, StoreResult};
use earlywarn_core::{
    Actor, Alert, AlertManager, AlertStore, AnalysisRequest, EngineConfig, EngineError,
    Observation, RiskLevel, SqliteAlertStore, Trajectory,
};
use earlywarn_narrative::{GenerationError, GenerationResult, MockGenerator, NarrativeGenerator};

fn at(hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, hour, 0, 0).unwrap()
}

fn manager() -> AlertManager {
    let store = Arc::new(SqliteAlertStore::open_in_memory().unwrap());
    AlertManager::new(EngineConfig::default(), store, Arc::new(TracingAuditSink))
}

fn nurse() -> Actor {
    Actor::new("nurse-a", "ward-7")
}

/// Septic picture developing over 23 hours.
fn deteriorating_request() -> AnalysisRequest {
    let mut request = AnalysisRequest::new("patient-1");
    request.context.age = Some(72);
    request.context.comorbidities = Some(vec!["Type 2 diabetes".into()]);
    request.vitals = vec![
        Observation::numeric("RR", 16.0, "/min", at(0)),
        Observation::numeric("RR", 21.0, "/min", at(12)),
        Observation::numeric("RR", 28.0, "/min", at(23)),
        Observation::numeric("temp", 37.2, "°C", at(0)),
        Observation::numeric("temp", 39.2, "°C", at(23)),
        Observation::numeric("sbp", 125.0, "mmHg", at(0)),
        Observation::numeric("sbp", 95.0, "mmHg", at(23)),
        Observation::numeric("hr", 88.0, "bpm", at(0)),
        Observation::numeric("hr", 118.0, "bpm", at(23)),
        Observation::numeric("spo2", 97.0, "%", at(0)),
        Observation::numeric("spo2", 94.0, "%", at(23)),
        Observation::categorical("acvpu", "A", at(23)),
    ];
    request.labs = vec![
        Observation::numeric("wbc", 9.0, "10^9/L", at(0)),
        Observation::numeric("wbc", 16.5, "10^9/L", at(22)),
        Observation::numeric("crp", 12.0, "mg/L", at(0)),
        Observation::numeric("crp", 140.0, "mg/L", at(22)),
    ];
    request
}

// =========================================================================
// Scenarios
// =========================================================================

#[tokio::test]
async fn test_deteriorating_patient_raises_critical_respiratory_signal() {
    let manager = manager();
    let alert = manager.create(deteriorating_request(), &nurse()).await.unwrap();

    assert!(matches!(alert.risk_level, RiskLevel::Critical | RiskLevel::High));
    assert!(matches!(
        alert.trajectory,
        Trajectory::RapidlyWorsening | Trajectory::Worsening
    ));
    assert!(alert.key_signals.iter().any(|s| {
        s.signal_type == SignalType::Vital
            && s.severity == Severity::Critical
            && s.code == codes::RESPIRATORY_RATE
    }));
    assert!(alert.scores.news2_score >= 7);
    assert_eq!(alert.scores.news2_trend, TrendDirection::Increasing);
    assert!(!alert.recommendations.is_empty());
    assert!(!alert.explainability.reasoning.is_empty());
}

#[tokio::test]
async fn test_repeated_create_yields_identical_assessment() {
    let manager = manager();
    let first = manager.create(deteriorating_request(), &nurse()).await.unwrap();
    let second = manager.create(deteriorating_request(), &nurse()).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.scores, second.scores);
    assert_eq!(first.key_signals, second.key_signals);
    assert_eq!(first.recommendations, second.recommendations);
    assert_eq!(first.risk_level, second.risk_level);
    assert_eq!(first.trajectory, second.trajectory);

    let stored = manager.get_by_id(&second.id, &nurse()).unwrap();
    assert_eq!(stored.scores, first.scores);
    assert_eq!(stored.key_signals, first.key_signals);
    assert_eq!(stored.recommendations, first.recommendations);
}

#[tokio::test]
async fn test_single_crp_reading_is_stable() {
    let mut request = AnalysisRequest::new("patient-2");
    request.labs = vec![Observation::numeric("CRP", 85.0, "mg/L", at(6))];

    let alert = manager().create(request, &nurse()).await.unwrap();
    let crp = alert.trends.iter().find(|t| t.code == codes::CRP).unwrap();

    assert_eq!(crp.direction, TrendDirection::Stable);
    assert_eq!(crp.readings, 1);
    assert!(crp.delta_percent.is_none());
    assert!(!crp.worsening);
    assert!(alert
        .explainability
        .limitations
        .iter()
        .any(|l| l.contains("Insufficient serial readings")));
}

#[tokio::test]
async fn test_dismiss_without_reason_changes_nothing() {
    let manager = manager();
    let alert = manager.create(AnalysisRequest::new("patient-3"), &nurse()).await.unwrap();

    for reason in ["", "   "] {
        let err = manager
            .dismiss(&alert.id, &nurse(), reason, None)
            .await
            .unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    let stored = manager.get_by_id(&alert.id, &nurse()).unwrap();
    assert_eq!(stored, alert);
    assert!(!stored.governance.is_dismissed());
    assert_eq!(stored.governance.count(GovernanceAction::Dismissed), 0);
}

struct FailingGenerator;

impl NarrativeGenerator for FailingGenerator {
    fn model_id(&self) -> &str {
        "failing"
    }

    fn generate(&self, _: &str, _: &str) -> GenerationResult<String> {
        Err(GenerationError::Unavailable("upstream 503".into()))
    }
}

struct StallingGenerator;

impl NarrativeGenerator for StallingGenerator {
    fn model_id(&self) -> &str {
        "stalling"
    }

    fn generate(&self, _: &str, _: &str) -> GenerationResult<String> {
        std::thread::sleep(Duration::from_millis(400));
        Ok("{}".into())
    }
}

fn enhanced_manager(generator: Arc<dyn NarrativeGenerator>, timeout_ms: u64) -> AlertManager {
    let config = EngineConfig {
        enhancement_timeout_ms: timeout_ms,
        ..EngineConfig::default()
    };
    let store = Arc::new(SqliteAlertStore::open_in_memory().unwrap());
    AlertManager::new(config, store, Arc::new(TracingAuditSink)).with_generator(generator)
}

#[tokio::test]
async fn test_enhancement_failure_falls_back_to_rule_based_alert() {
    for (manager, label) in [
        (enhanced_manager(Arc::new(FailingGenerator), 2_000), "failure"),
        (enhanced_manager(Arc::new(StallingGenerator), 25), "timeout"),
    ] {
        let mut request = deteriorating_request();
        request.use_enhancement = true;

        let alert = manager.create(request, &nurse()).await.unwrap();
        assert!(alert.ai_insights.is_none(), "{}", label);
        assert!(
            alert
                .explainability
                .limitations
                .iter()
                .any(|l| l.starts_with("Narrative enhancement unavailable")),
            "{}",
            label
        );
        assert!(matches!(alert.risk_level, RiskLevel::Critical | RiskLevel::High));
    }
}

#[tokio::test]
async fn test_enhancement_adds_insights_without_changing_scores() {
    let plain = manager().analyze(&deteriorating_request()).unwrap();

    let manager = enhanced_manager(Arc::new(MockGenerator), 5_000);
    let mut request = deteriorating_request();
    request.use_enhancement = true;
    let alert = manager.create(request, &nurse()).await.unwrap();

    let insights = alert.ai_insights.as_ref().unwrap();
    assert_eq!(insights.model, "mock-narrative-v1");
    assert_eq!(alert.scores, plain.scores);
    assert_eq!(alert.risk_level, plain.risk_level);
}

#[tokio::test]
async fn test_enhancement_skipped_unless_requested() {
    let manager = enhanced_manager(Arc::new(MockGenerator), 5_000);
    let alert = manager.create(deteriorating_request(), &nurse()).await.unwrap();
    assert!(alert.ai_insights.is_none());
}

// =========================================================================
// Governance properties
// =========================================================================

#[tokio::test]
async fn test_views_only_append() {
    let manager = manager();
    let alert = manager.create(deteriorating_request(), &nurse()).await.unwrap();

    let mut last = alert.clone();
    for _ in 0..5 {
        last = manager.view(&alert.id, &nurse()).await.unwrap();
    }

    assert_eq!(last.governance.count(GovernanceAction::Viewed), 5);
    assert_eq!(last.governance.view_count(), 5);
    assert_eq!(last.risk_level, alert.risk_level);
    assert_eq!(last.scores, alert.scores);
    assert_eq!(last.trajectory, alert.trajectory);
    assert!(manager.verify_audit_trail(&alert.id, &nurse()).unwrap().valid);
}

#[tokio::test]
async fn test_terminal_flags_never_unset() {
    let manager = manager();
    let alert = manager.create(AnalysisRequest::new("patient-4"), &nurse()).await.unwrap();

    manager
        .dismiss(&alert.id, &nurse(), "Reading taken during transfer", None)
        .await
        .unwrap();

    assert!(matches!(
        manager.acknowledge(&alert.id, &nurse(), None).await,
        Err(EngineError::InvalidTransition(_))
    ));
    assert!(matches!(
        manager.escalate(&alert.id, &nurse(), "outreach", None).await,
        Err(EngineError::InvalidTransition(_))
    ));

    let repeat = manager
        .dismiss(&alert.id, &Actor::new("dr-b", "ward-7"), "again", None)
        .await
        .unwrap();
    let dismissed = repeat.governance.dismissed().unwrap();
    assert_eq!(dismissed.by, "nurse-a");
    assert_eq!(dismissed.detail.as_deref(), Some("Reading taken during transfer"));
    assert_eq!(repeat.governance.count(GovernanceAction::DismissRepeated), 1);
    assert!(!repeat.is_active());
}

#[tokio::test]
async fn test_concurrent_governance_keeps_trail_ordered() {
    let manager = Arc::new(manager());
    let alert = manager.create(AnalysisRequest::new("patient-5"), &nurse()).await.unwrap();

    let mut handles = Vec::new();
    for i in 0..12 {
        let manager = Arc::clone(&manager);
        let id = alert.id.clone();
        handles.push(tokio::spawn(async move {
            let actor = Actor::new(format!("user-{}", i), "ward-7");
            match i % 3 {
                0 => manager.view(&id, &actor).await.map(|_| ()),
                1 => manager.acknowledge(&id, &actor, None).await.map(|_| ()),
                _ => manager.escalate(&id, &actor, "rrt", None).await.map(|_| ()),
            }
        }));
    }
    for handle in handles {
        handle.await.unwrap().unwrap();
    }

    let stored = manager.get_by_id(&alert.id, &nurse()).unwrap();
    let trail = stored.governance.audit_trail();
    assert_eq!(trail.len(), 13);
    for (index, entry) in trail.iter().enumerate() {
        assert_eq!(entry.sequence, index as u64);
    }
    assert_eq!(stored.governance.count(GovernanceAction::Acknowledged), 1);
    assert_eq!(stored.governance.count(GovernanceAction::Escalated), 1);
    assert!(manager.verify_audit_trail(&alert.id, &nurse()).unwrap().valid);
}

#[tokio::test]
async fn test_list_by_patient_active_filter() {
    let manager = manager();
    let first = manager.create(deteriorating_request(), &nurse()).await.unwrap();
    let second = manager.create(deteriorating_request(), &nurse()).await.unwrap();
    manager.acknowledge(&first.id, &nurse(), None).await.unwrap();

    let all = manager.list_by_patient("patient-1", &nurse(), false, 10).unwrap();
    assert_eq!(all.len(), 2);

    let active = manager.list_by_patient("patient-1", &nurse(), true, 10).unwrap();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].id, second.id);

    let other_scope = Actor::new("nurse-z", "ward-9");
    assert!(manager
        .list_by_patient("patient-1", &other_scope, false, 10)
        .unwrap()
        .is_empty());
}

// =========================================================================
// Persistence
// =========================================================================

#[tokio::test]
async fn test_file_database_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("alerts.db");

    let alert = {
        let store = Arc::new(SqliteAlertStore::open(&path).unwrap());
        let manager = AlertManager::new(EngineConfig::default(), store, Arc::new(TracingAuditSink));
        let alert = manager.create(deteriorating_request(), &nurse()).await.unwrap();
        manager
            .escalate(&alert.id, &nurse(), "critical care outreach", Some("NEWS2 ≥ 7".into()))
            .await
            .unwrap()
    };

    let store = Arc::new(SqliteAlertStore::open(&path).unwrap());
    let manager = AlertManager::new(EngineConfig::default(), store, Arc::new(TracingAuditSink));
    let reloaded = manager.get_by_id(&alert.id, &nurse()).unwrap();

    assert_eq!(reloaded, alert);
    assert!(reloaded.governance.is_escalated());
    assert!(manager.verify_audit_trail(&alert.id, &nurse()).unwrap().valid);
}

/// Store whose writes always fail.
struct UnavailableStore;

impl AlertStore for UnavailableStore {
    fn insert(&self, _: &Alert) -> StoreResult<()> {
        Err(StoreError::Unavailable("disk I/O error".into()))
    }

    fn get(&self, _: &str) -> StoreResult<Option<Alert>> {
        Ok(None)
    }

    fn append_entry(&self, _: &str, _: &AuditEntry) -> StoreResult<()> {
        Err(StoreError::Unavailable("disk I/O error".into()))
    }

    fn list_by_patient(&self, _: &str, _: &str, _: bool, _: usize) -> StoreResult<Vec<Alert>> {
        Ok(Vec::new())
    }

    fn headlines(&self, _: &str) -> StoreResult<Vec<AlertHeadline>> {
        Ok(Vec::new())
    }
}

#[tokio::test]
async fn test_persistence_failure_is_retryable() {
    let manager = AlertManager::new(
        EngineConfig::default(),
        Arc::new(UnavailableStore),
        Arc::new(TracingAuditSink),
    );

    let err = manager.create(deteriorating_request(), &nurse()).await.unwrap_err();
    assert!(matches!(err, EngineError::Persistence(_)));
    assert!(err.is_retryable());
}

#[tokio::test]
async fn test_missing_patient_id_rejected() {
    let err = manager()
        .create(AnalysisRequest::new(""), &nurse())
        .await
        .unwrap_err();
    assert!(matches!(err, EngineError::Validation(_)));
    assert!(!err.is_retryable());
}
