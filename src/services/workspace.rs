//! Workspace service
//!
//! Creates workspaces together with their inbox, and checks the two ledger
//! invariants: the recorded total equals the bucket sum, and there is
//! exactly one inbox.

use tracing::{info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Bucket, Money, UserId, Workspace, WorkspaceId};
use crate::storage::Storage;

const DEFAULT_INBOX_NAME: &str = "Inbox";

/// Service for workspace management
pub struct WorkspaceService<'a> {
    storage: &'a Storage,
    inbox_name: String,
}

/// Recorded total versus what the buckets actually hold
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BalanceReport {
    pub workspace_id: WorkspaceId,
    pub recorded_total: Money,
    pub bucket_sum: Money,
    pub inbox_count: usize,
}

impl BalanceReport {
    pub fn is_consistent(&self) -> bool {
        self.recorded_total == self.bucket_sum && self.inbox_count == 1
    }

    /// `recorded_total - bucket_sum`
    pub fn drift(&self) -> Money {
        self.recorded_total - self.bucket_sum
    }
}

impl<'a> WorkspaceService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            inbox_name: DEFAULT_INBOX_NAME.to_string(),
        }
    }

    /// Name given to the inbox of workspaces created by this service
    pub fn with_inbox_name(mut self, name: impl Into<String>) -> Self {
        self.inbox_name = name.into();
        self
    }

    /// Create a workspace and its inbox in one unit
    pub fn create(&self, owner_id: UserId, name: &str, currency: &str) -> LedgerResult<Workspace> {
        let workspace = Workspace::new(owner_id, name.trim(), currency.trim());
        let inbox = Bucket::inbox(workspace.id, self.inbox_name.trim());
        let id = workspace.id;

        let result = self.storage.atomic(|unit| {
            unit.put_workspace(workspace)?;
            unit.put_bucket(inbox)?;
            unit.require_workspace(id)
        });

        match &result {
            Ok(ws) => info!(workspace = %ws.id.short(), name = %ws.name, "created workspace"),
            Err(err) => warn!(name = %name, error = %err, "workspace create rejected"),
        }
        result
    }

    pub fn get(&self, id: WorkspaceId) -> LedgerResult<Option<Workspace>> {
        self.storage.workspaces.get(id)
    }

    pub fn require(&self, id: WorkspaceId) -> LedgerResult<Workspace> {
        self.get(id)?
            .ok_or_else(|| LedgerError::workspace_not_found(id.to_string()))
    }

    /// Find a workspace by id, short id or name (case-insensitive)
    pub fn find(&self, identifier: &str) -> LedgerResult<Option<Workspace>> {
        if let Ok(id) = identifier.parse::<WorkspaceId>() {
            if let Some(ws) = self.get(id)? {
                return Ok(Some(ws));
            }
        }
        Ok(self.list()?.into_iter().find(|ws| {
            ws.id.matches(identifier) || ws.name.eq_ignore_ascii_case(identifier.trim())
        }))
    }

    /// All workspaces, oldest first
    pub fn list(&self) -> LedgerResult<Vec<Workspace>> {
        self.storage.workspaces.to_vec()
    }

    pub fn list_for_owner(&self, owner_id: UserId) -> LedgerResult<Vec<Workspace>> {
        self.storage.workspaces.get_by_owner(owner_id)
    }

    /// Rename a workspace or change its currency code
    pub fn update(
        &self,
        id: WorkspaceId,
        name: Option<&str>,
        currency: Option<&str>,
    ) -> LedgerResult<Workspace> {
        let result = self.storage.atomic(|unit| {
            let mut workspace = unit.require_workspace(id)?;
            if let Some(name) = name {
                workspace.name = name.trim().to_string();
            }
            if let Some(currency) = currency {
                workspace.currency = currency.trim().to_uppercase();
            }
            unit.put_workspace(workspace)?;
            unit.require_workspace(id)
        });

        match &result {
            Ok(ws) => info!(workspace = %ws.id.short(), name = %ws.name, "updated workspace"),
            Err(err) => warn!(workspace = %id.short(), error = %err, "workspace update rejected"),
        }
        result
    }

    /// Delete a workspace with all of its buckets and transactions
    pub fn delete(&self, id: WorkspaceId) -> LedgerResult<Workspace> {
        let result = self.storage.atomic(|unit| {
            let workspace = unit.require_workspace(id)?;
            for txn in unit.transactions_in(id)? {
                unit.remove_transaction(txn.id);
            }
            for bucket in unit.buckets_in(id)? {
                unit.remove_bucket(bucket.id);
            }
            unit.remove_workspace(id);
            Ok(workspace)
        });

        match &result {
            Ok(ws) => info!(workspace = %ws.id.short(), name = %ws.name, "deleted workspace"),
            Err(err) => warn!(workspace = %id.short(), error = %err, "workspace delete rejected"),
        }
        result
    }

    /// Compare the recorded total with the sum of bucket balances
    pub fn reconcile(&self, id: WorkspaceId) -> LedgerResult<BalanceReport> {
        let report = self.storage.read(|unit| {
            let workspace = unit.require_workspace(id)?;
            let buckets = unit.buckets_in(id)?;
            Ok(BalanceReport {
                workspace_id: workspace.id,
                recorded_total: workspace.total_balance,
                bucket_sum: buckets.iter().map(|b| b.current_balance).sum(),
                inbox_count: buckets.iter().filter(|b| b.is_default).count(),
            })
        })?;

        if !report.is_consistent() {
            warn!(
                workspace = %id.short(),
                recorded = %report.recorded_total,
                buckets = %report.bucket_sum,
                inboxes = report.inbox_count,
                "workspace is out of balance"
            );
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerPaths;
    use crate::models::TransactionKind;
    use crate::services::transaction::{PostTransactionInput, TransactionService};
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let storage =
            Storage::open(LedgerPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        (temp_dir, storage)
    }

    #[test]
    fn test_create_adds_single_inbox() {
        let (_tmp, storage) = create_test_storage();
        let ws = WorkspaceService::new(&storage)
            .with_inbox_name("Caixa")
            .create(UserId::new(), "  Home ", "brl")
            .unwrap();

        assert_eq!(ws.name, "Home");
        assert_eq!(ws.currency, "BRL");
        assert!(ws.total_balance.is_zero());

        let buckets = storage.buckets.get_by_workspace(ws.id).unwrap();
        assert_eq!(buckets.len(), 1);
        assert!(buckets[0].is_default);
        assert_eq!(buckets[0].name, "Caixa");
    }

    #[test]
    fn test_invalid_workspace_leaves_nothing_behind() {
        let (_tmp, storage) = create_test_storage();
        let result = WorkspaceService::new(&storage).create(UserId::new(), "Home", "dollars");

        assert!(result.unwrap_err().is_validation());
        assert_eq!(storage.workspaces.count().unwrap(), 0);
        assert!(storage.buckets.to_vec().unwrap().is_empty());
    }

    #[test]
    fn test_find_by_name_and_short_id() {
        let (_tmp, storage) = create_test_storage();
        let service = WorkspaceService::new(&storage);
        let ws = service.create(UserId::new(), "Household", "USD").unwrap();

        assert_eq!(service.find("household").unwrap().unwrap().id, ws.id);
        assert_eq!(service.find(&ws.id.short()).unwrap().unwrap().id, ws.id);
        assert_eq!(service.find(&ws.id.to_string()).unwrap().unwrap().id, ws.id);
        assert!(service.find("nope").unwrap().is_none());
    }

    #[test]
    fn test_list_for_owner() {
        let (_tmp, storage) = create_test_storage();
        let service = WorkspaceService::new(&storage);
        let alice = UserId::new();
        service.create(alice, "A1", "USD").unwrap();
        service.create(alice, "A2", "EUR").unwrap();
        service.create(UserId::new(), "B1", "USD").unwrap();

        let owned = service.list_for_owner(alice).unwrap();
        assert_eq!(owned.len(), 2);
        assert_eq!(service.list().unwrap().len(), 3);
    }

    #[test]
    fn test_update() {
        let (_tmp, storage) = create_test_storage();
        let service = WorkspaceService::new(&storage);
        let ws = service.create(UserId::new(), "Old", "USD").unwrap();

        let updated = service.update(ws.id, Some("New"), Some("eur")).unwrap();
        assert_eq!(updated.name, "New");
        assert_eq!(updated.currency, "EUR");

        let err = service.update(ws.id, Some(""), None).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(service.get(ws.id).unwrap().unwrap().name, "New");

        assert!(service
            .update(WorkspaceId::new(), Some("X"), None)
            .unwrap_err()
            .is_not_found());
    }

    #[test]
    fn test_delete_cascades() {
        let (_tmp, storage) = create_test_storage();
        let service = WorkspaceService::new(&storage);
        let ws = service.create(UserId::new(), "Main", "USD").unwrap();
        let keep = service.create(UserId::new(), "Other", "USD").unwrap();
        TransactionService::new(&storage)
            .post(PostTransactionInput {
                workspace_id: ws.id,
                bucket_id: None,
                amount: Money::from_units(10),
                kind: TransactionKind::Income,
                description: "Gift".into(),
                date: None,
                is_allocated: false,
            })
            .unwrap();

        service.delete(ws.id).unwrap();

        assert!(service.get(ws.id).unwrap().is_none());
        assert!(storage.buckets.get_by_workspace(ws.id).unwrap().is_empty());
        assert!(storage.transactions.get_by_workspace(ws.id).unwrap().is_empty());
        assert!(service.get(keep.id).unwrap().is_some());
        assert_eq!(storage.buckets.get_by_workspace(keep.id).unwrap().len(), 1);
    }

    #[test]
    fn test_reconcile_reports_consistency() {
        let (_tmp, storage) = create_test_storage();
        let service = WorkspaceService::new(&storage);
        let ws = service.create(UserId::new(), "Main", "USD").unwrap();
        let txns = TransactionService::new(&storage);
        for (kind, units) in [(TransactionKind::Income, 500), (TransactionKind::Expense, 120)] {
            txns.post(PostTransactionInput {
                workspace_id: ws.id,
                bucket_id: None,
                amount: Money::from_units(units),
                kind,
                description: String::new(),
                date: None,
                is_allocated: false,
            })
            .unwrap();
        }

        let report = service.reconcile(ws.id).unwrap();
        assert!(report.is_consistent());
        assert_eq!(report.recorded_total, Money::from_units(380));
        assert_eq!(report.bucket_sum, Money::from_units(380));
        assert_eq!(report.inbox_count, 1);
        assert!(report.drift().is_zero());
    }

    #[test]
    fn test_reconcile_detects_drift() {
        let (_tmp, storage) = create_test_storage();
        let service = WorkspaceService::new(&storage);
        let ws = service.create(UserId::new(), "Main", "USD").unwrap();

        // Corrupt the cached total directly
        storage
            .atomic(|unit| {
                let mut workspace = unit.require_workspace(ws.id)?;
                workspace.total_balance = Money::from_units(7);
                unit.put_workspace(workspace)
            })
            .unwrap();

        let report = service.reconcile(ws.id).unwrap();
        assert!(!report.is_consistent());
        assert_eq!(report.drift(), Money::from_units(7));
    }
}
