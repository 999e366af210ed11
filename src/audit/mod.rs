//! Audit logging
//!
//! Every committed ledger operation appends one entry per record it
//! created, updated or deleted to an append-only JSONL file. Entries are
//! derived from the committed change set and written only after the
//! ledger snapshot is safely on disk.

mod entry;
mod logger;

pub use entry::{AuditEntry, EntityType, Operation};
pub use logger::AuditLogger;
