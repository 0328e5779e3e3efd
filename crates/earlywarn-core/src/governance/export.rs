//! Compliance export of an alert's audit trail.

use serde::{Deserialize, Serialize};

use crate::models::{Alert, AuditEntry, RiskLevel, Trajectory};

use super::ledger::{verify_chain, ChainVerification, LedgerResult, HASH_ALGORITHM};

pub const EXPORT_FORMAT_VERSION: &str = "1.0";

/// Audit trail export metadata.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditExportMetadata {
    /// Export format version
    pub format_version: String,
    /// Export timestamp
    pub exported_at: String,
    /// Hash algorithm used for the chain
    pub hash_algorithm: String,
    /// Exporting system identifier
    pub system_id: Option<String>,
    /// User who requested the export
    pub exported_by: String,
}

/// Full compliance export for a single alert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditTrailExport {
    pub metadata: AuditExportMetadata,
    pub alert_id: String,
    pub patient_id: String,
    pub scope_id: String,
    pub risk_level: RiskLevel,
    pub trajectory: Trajectory,
    pub audit_trail: Vec<AuditEntry>,
    /// Chain verification at export time
    pub verification: ChainVerification,
}

impl AuditTrailExport {
    /// Build an export and verify the chain.
    pub fn build(alert: &Alert, exported_by: &str, system_id: Option<String>) -> LedgerResult<Self> {
        let trail = alert.governance.audit_trail().to_vec();
        let verification = verify_chain(&alert.id, &trail)?;

        Ok(Self {
            metadata: AuditExportMetadata {
                format_version: EXPORT_FORMAT_VERSION.to_string(),
                exported_at: chrono::Utc::now().to_rfc3339(),
                hash_algorithm: HASH_ALGORITHM.to_string(),
                system_id,
                exported_by: exported_by.to_string(),
            },
            alert_id: alert.id.clone(),
            patient_id: alert.patient_id.clone(),
            scope_id: alert.scope_id.clone(),
            risk_level: alert.risk_level,
            trajectory: alert.trajectory,
            audit_trail: trail,
            verification,
        })
    }

    /// Export to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Re-verify the exported trail, e.g. after it has been transmitted.
    pub fn reverify(&self) -> LedgerResult<ChainVerification> {
        verify_chain(&self.alert_id, &self.audit_trail)
    }
}
