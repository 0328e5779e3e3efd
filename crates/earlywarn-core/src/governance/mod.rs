//! Alert governance: state machine, hash-chained audit trail, per-alert locks
//! and compliance export.

pub mod export;
pub mod ledger;
pub mod locks;
pub mod transitions;

pub use export::{AuditExportMetadata, AuditTrailExport};
pub use ledger::{
    chain_entry, hash_data, verify_chain, ChainVerification, EntryDraft, LedgerError,
    LedgerResult, GENESIS_HASH,
};
pub use locks::{KeyGuard, KeyedLocks};
pub use transitions::{decide, Command, TransitionError};
