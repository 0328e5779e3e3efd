//! SQLite schema definition.

/// Complete database schema for the alert store.
pub const SCHEMA: &str = r#"
-- Enable foreign keys
PRAGMA foreign_keys = ON;

-- ============================================================================
-- Alerts (immutable once written)
-- ============================================================================

CREATE TABLE IF NOT EXISTS alerts (
    id TEXT PRIMARY KEY,
    patient_id TEXT NOT NULL,
    scope_id TEXT NOT NULL,
    risk_level TEXT NOT NULL CHECK (risk_level IN ('LOW', 'MODERATE', 'HIGH', 'CRITICAL')),
    trajectory TEXT NOT NULL CHECK (trajectory IN ('IMPROVING', 'STABLE', 'WORSENING', 'RAPIDLY_WORSENING')),
    body TEXT NOT NULL,                          -- JSON alert without governance
    created_at TEXT NOT NULL                     -- RFC 3339, microseconds
);

CREATE TRIGGER IF NOT EXISTS alerts_no_update BEFORE UPDATE ON alerts
BEGIN
    SELECT RAISE(ABORT, 'Alerts are immutable');
END;

CREATE TRIGGER IF NOT EXISTS alerts_no_delete BEFORE DELETE ON alerts
BEGIN
    SELECT RAISE(ABORT, 'Alerts cannot be deleted');
END;

CREATE INDEX IF NOT EXISTS idx_alerts_scope_patient ON alerts(scope_id, patient_id, created_at);

-- ============================================================================
-- Governance events (append-only, hash-chained per alert)
-- ============================================================================

CREATE TABLE IF NOT EXISTS alert_events (
    alert_id TEXT NOT NULL REFERENCES alerts(id),
    sequence INTEGER NOT NULL CHECK (sequence >= 0),
    timestamp TEXT NOT NULL,
    action TEXT NOT NULL,
    user_id TEXT NOT NULL,
    notes TEXT,
    target TEXT,
    prev_hash TEXT NOT NULL,
    hash TEXT NOT NULL,
    PRIMARY KEY (alert_id, sequence)
);

CREATE TRIGGER IF NOT EXISTS alert_events_no_update BEFORE UPDATE ON alert_events
BEGIN
    SELECT RAISE(ABORT, 'Audit trail entries are append-only');
END;

CREATE TRIGGER IF NOT EXISTS alert_events_no_delete BEFORE DELETE ON alert_events
BEGIN
    SELECT RAISE(ABORT, 'Audit trail entries are append-only');
END;

-- Entries must extend the chain: next sequence, linked to the current head
CREATE TRIGGER IF NOT EXISTS alert_events_check_link BEFORE INSERT ON alert_events
WHEN new.sequence > 0
BEGIN
    SELECT CASE
        WHEN NOT EXISTS (
            SELECT 1 FROM alert_events
            WHERE alert_id = new.alert_id
              AND sequence = new.sequence - 1
              AND hash = new.prev_hash
        ) THEN
            RAISE(ABORT, 'Audit entry does not extend the chain')
    END;
END;

-- ============================================================================
-- Audit log (security events from every governed operation)
-- ============================================================================

CREATE TABLE IF NOT EXISTS audit_log (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    event_type TEXT NOT NULL,
    resource_id TEXT NOT NULL,
    actor_id TEXT NOT NULL,
    details TEXT NOT NULL DEFAULT '{}',          -- JSON object
    ip_address TEXT,
    user_agent TEXT,
    created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
);

CREATE INDEX IF NOT EXISTS idx_audit_log_resource ON audit_log(resource_id);
"#;
