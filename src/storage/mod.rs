//! Ledger store
//!
//! Workspaces, buckets and transactions live in memory and are persisted
//! together as one JSON snapshot (`data/ledger.json`) written with an atomic
//! rename. All mutations go through [`Storage::atomic`], which serializes
//! writers on a process lock plus an advisory lock on `data/ledger.lock`,
//! reloads the snapshot under that lock, and commits a [`UnitOfWork`] as a
//! whole. Other processes writing the same directory therefore never act on
//! a stale balance.

pub mod buckets;
pub mod file_io;
pub mod transactions;
pub mod unit;
pub mod workspaces;

pub use buckets::BucketRepository;
pub use file_io::{read_json, read_json_required, write_json_atomic, FileLock};
pub use transactions::TransactionRepository;
pub use unit::UnitOfWork;
pub use workspaces::WorkspaceRepository;

use std::collections::BTreeMap;
use std::sync::Mutex;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::audit::{AuditEntry, AuditLogger};
use crate::config::paths::LedgerPaths;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{Bucket, BucketId, Transaction, TransactionId, Workspace, WorkspaceId};

const SCHEMA_VERSION: u32 = 1;

pub(crate) fn lock_poisoned<E: std::fmt::Display>(err: E) -> LedgerError {
    LedgerError::Storage(format!("Failed to acquire lock: {}", err))
}

/// On-disk snapshot of the whole ledger
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LedgerData {
    #[serde(default = "default_schema_version")]
    pub schema_version: u32,
    #[serde(default)]
    pub workspaces: Vec<Workspace>,
    #[serde(default)]
    pub buckets: Vec<Bucket>,
    #[serde(default)]
    pub transactions: Vec<Transaction>,
}

fn default_schema_version() -> u32 {
    SCHEMA_VERSION
}

impl Default for LedgerData {
    fn default() -> Self {
        Self {
            schema_version: SCHEMA_VERSION,
            workspaces: Vec::new(),
            buckets: Vec::new(),
            transactions: Vec::new(),
        }
    }
}

/// Row changes staged by a unit of work; `None` marks a deletion
#[derive(Debug, Default)]
pub(crate) struct ChangeSet {
    pub workspaces: BTreeMap<WorkspaceId, Option<Workspace>>,
    pub buckets: BTreeMap<BucketId, Option<Bucket>>,
    pub transactions: BTreeMap<TransactionId, Option<Transaction>>,
}

impl ChangeSet {
    pub fn is_empty(&self) -> bool {
        self.workspaces.is_empty() && self.buckets.is_empty() && self.transactions.is_empty()
    }
}

/// Main storage coordinator that provides access to all repositories
pub struct Storage {
    paths: LedgerPaths,
    pub workspaces: WorkspaceRepository,
    pub buckets: BucketRepository,
    pub transactions: TransactionRepository,
    audit: AuditLogger,
    write_lock: Mutex<()>,
}

impl Storage {
    /// Create a storage instance with empty tables
    pub fn new(paths: LedgerPaths) -> Result<Self, LedgerError> {
        paths.ensure_directories()?;

        Ok(Self {
            workspaces: WorkspaceRepository::new(),
            buckets: BucketRepository::new(),
            transactions: TransactionRepository::new(),
            audit: AuditLogger::new(paths.audit_log()),
            write_lock: Mutex::new(()),
            paths,
        })
    }

    /// Create a storage instance and load the ledger file
    pub fn open(paths: LedgerPaths) -> Result<Self, LedgerError> {
        let storage = Self::new(paths)?;
        storage.load_all()?;
        Ok(storage)
    }

    pub fn paths(&self) -> &LedgerPaths {
        &self.paths
    }

    pub fn audit_log(&self) -> &AuditLogger {
        &self.audit
    }

    /// Load all data from disk, replacing what is in memory
    pub fn load_all(&self) -> Result<(), LedgerError> {
        let _guard = self.write_lock.lock().map_err(lock_poisoned)?;
        let _file_lock = FileLock::shared(self.paths.lock_file())?;
        self.reload()
    }

    /// Replace the in-memory tables with the snapshot on disk; callers hold the locks
    fn reload(&self) -> Result<(), LedgerError> {
        let data: LedgerData = read_json(self.paths.ledger_file())?;
        if data.schema_version > SCHEMA_VERSION {
            return Err(LedgerError::Storage(format!(
                "Ledger file schema version {} is newer than supported version {}",
                data.schema_version, SCHEMA_VERSION
            )));
        }

        debug!(
            workspaces = data.workspaces.len(),
            buckets = data.buckets.len(),
            transactions = data.transactions.len(),
            "loaded ledger"
        );
        self.workspaces.replace_all(data.workspaces)?;
        self.buckets.replace_all(data.buckets)?;
        self.transactions.replace_all(data.transactions)?;
        Ok(())
    }

    fn save_all(&self) -> Result<(), LedgerError> {
        let data = LedgerData {
            schema_version: SCHEMA_VERSION,
            workspaces: self.workspaces.to_vec()?,
            buckets: self.buckets.to_vec()?,
            transactions: self.transactions.to_vec()?,
        };
        write_json_atomic(self.paths.ledger_file(), &data)
    }

    /// Run `op` as one all-or-nothing unit.
    ///
    /// The process lock and the exclusive file lock are held for the whole
    /// call, and the snapshot is reloaded once both are taken. Balance checks
    /// made inside `op` therefore see every commit from any process and
    /// cannot be invalidated before this commit lands. If `op` fails nothing
    /// is applied. If persisting fails the in-memory tables are rolled back
    /// to their previous rows.
    pub fn atomic<T, F>(&self, op: F) -> LedgerResult<T>
    where
        F: FnOnce(&mut UnitOfWork<'_>) -> LedgerResult<T>,
    {
        let _guard = self.write_lock.lock().map_err(lock_poisoned)?;
        let _file_lock = FileLock::exclusive(self.paths.lock_file())?;
        self.reload()?;

        let mut unit = UnitOfWork::new(self);
        let value = op(&mut unit)?;
        let changes = unit.into_changes();

        self.commit(changes)?;
        Ok(value)
    }

    /// Run a read-only closure against the latest committed state while no writer is active
    pub fn read<T, F>(&self, op: F) -> LedgerResult<T>
    where
        F: FnOnce(&UnitOfWork<'_>) -> LedgerResult<T>,
    {
        let _guard = self.write_lock.lock().map_err(lock_poisoned)?;
        let _file_lock = FileLock::shared(self.paths.lock_file())?;
        self.reload()?;
        let unit = UnitOfWork::new(self);
        op(&unit)
    }

    fn commit(&self, changes: ChangeSet) -> LedgerResult<()> {
        if changes.is_empty() {
            return Ok(());
        }

        let previous_workspaces = self.workspaces.apply(&changes.workspaces)?;
        let previous_buckets = self.buckets.apply(&changes.buckets)?;
        let previous_transactions = self.transactions.apply(&changes.transactions)?;

        if let Err(err) = self.save_all() {
            warn!(error = %err, "ledger save failed, rolling back in-memory changes");
            self.workspaces.apply(&previous_workspaces)?;
            self.buckets.apply(&previous_buckets)?;
            self.transactions.apply(&previous_transactions)?;
            return Err(err);
        }

        let mut entries = Vec::new();
        for (id, after) in &changes.workspaces {
            let before = previous_workspaces.get(id).and_then(Option::as_ref);
            entries.extend(AuditEntry::workspace(before, after.as_ref()));
        }
        for (id, after) in &changes.buckets {
            let before = previous_buckets.get(id).and_then(Option::as_ref);
            entries.extend(AuditEntry::bucket(before, after.as_ref()));
        }
        for (id, after) in &changes.transactions {
            match (previous_transactions.get(id).and_then(Option::as_ref), after) {
                (None, Some(txn)) => entries.push(AuditEntry::transaction_created(txn)),
                (Some(before), Some(txn)) => {
                    entries.push(AuditEntry::transaction_updated(before, txn))
                }
                (Some(txn), None) => entries.push(AuditEntry::transaction_deleted(txn)),
                (None, None) => {}
            }
        }

        // The ledger is already committed; a lost audit line must not undo it.
        if let Err(err) = self.audit.log_batch(&entries) {
            warn!(error = %err, entries = entries.len(), "failed to write audit entries");
        }
        Ok(())
    }
}
