//! Unit of work
//!
//! Stages row changes for one ledger operation. Reads see staged rows
//! first, then committed ones. Nothing reaches the repositories until
//! [`Storage::atomic`](super::Storage::atomic) commits the unit.
//!
//! The balance helpers keep each bucket change and the workspace total in
//! lockstep: posting helpers move both, internal moves (transfer,
//! distribution) move only buckets.

use std::collections::BTreeMap;

use tracing::trace;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Bucket, BucketId, Money, Transaction, TransactionId, Workspace, WorkspaceId};

use super::{ChangeSet, Storage};

pub struct UnitOfWork<'a> {
    storage: &'a Storage,
    workspaces: BTreeMap<WorkspaceId, Option<Workspace>>,
    buckets: BTreeMap<BucketId, Option<Bucket>>,
    transactions: BTreeMap<TransactionId, Option<Transaction>>,
}

impl<'a> UnitOfWork<'a> {
    pub(crate) fn new(storage: &'a Storage) -> Self {
        Self {
            storage,
            workspaces: BTreeMap::new(),
            buckets: BTreeMap::new(),
            transactions: BTreeMap::new(),
        }
    }

    pub(crate) fn into_changes(self) -> ChangeSet {
        ChangeSet {
            workspaces: self.workspaces,
            buckets: self.buckets,
            transactions: self.transactions,
        }
    }

    pub fn has_changes(&self) -> bool {
        !(self.workspaces.is_empty() && self.buckets.is_empty() && self.transactions.is_empty())
    }

    // Reads

    pub fn workspace(&self, id: WorkspaceId) -> LedgerResult<Option<Workspace>> {
        match self.workspaces.get(&id) {
            Some(staged) => Ok(staged.clone()),
            None => self.storage.workspaces.get(id),
        }
    }

    pub fn require_workspace(&self, id: WorkspaceId) -> LedgerResult<Workspace> {
        self.workspace(id)?
            .ok_or_else(|| LedgerError::workspace_not_found(id.to_string()))
    }

    /// All workspaces including staged ones, oldest first
    pub fn workspaces(&self) -> LedgerResult<Vec<Workspace>> {
        let mut rows: BTreeMap<WorkspaceId, Workspace> = self
            .storage
            .workspaces
            .to_vec()?
            .into_iter()
            .map(|ws| (ws.id, ws))
            .collect();
        overlay(&mut rows, &self.workspaces, |_| true);

        let mut workspaces: Vec<_> = rows.into_values().collect();
        workspaces.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(workspaces)
    }

    pub fn bucket(&self, id: BucketId) -> LedgerResult<Option<Bucket>> {
        match self.buckets.get(&id) {
            Some(staged) => Ok(staged.clone()),
            None => self.storage.buckets.get(id),
        }
    }

    pub fn require_bucket(&self, id: BucketId) -> LedgerResult<Bucket> {
        self.bucket(id)?
            .ok_or_else(|| LedgerError::bucket_not_found(id.to_string()))
    }

    /// A bucket that must belong to `workspace_id`
    pub fn bucket_in(&self, workspace_id: WorkspaceId, id: BucketId) -> LedgerResult<Bucket> {
        let bucket = self.require_bucket(id)?;
        if bucket.workspace_id != workspace_id {
            return Err(LedgerError::CrossWorkspace(format!(
                "Bucket '{}' belongs to another workspace",
                bucket.name
            )));
        }
        Ok(bucket)
    }

    /// Buckets of a workspace including staged changes, in listing order
    pub fn buckets_in(&self, workspace_id: WorkspaceId) -> LedgerResult<Vec<Bucket>> {
        let mut rows: BTreeMap<BucketId, Bucket> = self
            .storage
            .buckets
            .get_by_workspace(workspace_id)?
            .into_iter()
            .map(|b| (b.id, b))
            .collect();
        overlay(&mut rows, &self.buckets, |b| b.workspace_id == workspace_id);

        let mut buckets: Vec<_> = rows.into_values().collect();
        buckets.sort_by(Bucket::display_order);
        Ok(buckets)
    }

    pub fn transaction(&self, id: TransactionId) -> LedgerResult<Option<Transaction>> {
        match self.transactions.get(&id) {
            Some(staged) => Ok(staged.clone()),
            None => self.storage.transactions.get(id),
        }
    }

    pub fn require_transaction(&self, id: TransactionId) -> LedgerResult<Transaction> {
        self.transaction(id)?
            .ok_or_else(|| LedgerError::transaction_not_found(id.to_string()))
    }

    /// Transactions of a workspace including staged changes, newest first
    pub fn transactions_in(&self, workspace_id: WorkspaceId) -> LedgerResult<Vec<Transaction>> {
        let mut rows: BTreeMap<TransactionId, Transaction> = self
            .storage
            .transactions
            .get_by_workspace(workspace_id)?
            .into_iter()
            .map(|t| (t.id, t))
            .collect();
        overlay(&mut rows, &self.transactions, |t| t.workspace_id == workspace_id);

        let mut transactions: Vec<_> = rows.into_values().collect();
        transactions.sort_by(|a, b| {
            b.date
                .cmp(&a.date)
                .then(b.created_at.cmp(&a.created_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(transactions)
    }

    // Writes

    pub fn put_workspace(&mut self, mut workspace: Workspace) -> LedgerResult<()> {
        workspace
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;
        workspace.touch();
        self.workspaces.insert(workspace.id, Some(workspace));
        Ok(())
    }

    pub fn put_bucket(&mut self, mut bucket: Bucket) -> LedgerResult<()> {
        bucket
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;
        bucket.touch();
        self.buckets.insert(bucket.id, Some(bucket));
        Ok(())
    }

    /// Stage a new transaction row
    pub fn insert_transaction(&mut self, transaction: Transaction) -> LedgerResult<()> {
        transaction
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;
        if self.transaction(transaction.id)?.is_some() {
            return Err(LedgerError::Storage(format!(
                "Transaction {} already exists",
                transaction.id
            )));
        }
        trace!(id = %transaction.id.short(), kind = %transaction.kind, amount = %transaction.amount, "staging transaction");
        self.transactions.insert(transaction.id, Some(transaction));
        Ok(())
    }

    /// Stage a changed version of a transaction row that already exists
    pub fn replace_transaction(&mut self, transaction: Transaction) -> LedgerResult<()> {
        transaction
            .validate()
            .map_err(|e| LedgerError::Validation(e.to_string()))?;
        self.require_transaction(transaction.id)?;
        trace!(id = %transaction.id.short(), "restaging transaction");
        self.transactions.insert(transaction.id, Some(transaction));
        Ok(())
    }

    pub fn remove_workspace(&mut self, id: WorkspaceId) {
        self.workspaces.insert(id, None);
    }

    pub fn remove_bucket(&mut self, id: BucketId) {
        self.buckets.insert(id, None);
    }

    pub fn remove_transaction(&mut self, id: TransactionId) {
        self.transactions.insert(id, None);
    }

    // Balance helpers

    fn adjust_workspace_total(&mut self, workspace_id: WorkspaceId, delta: Money) -> LedgerResult<()> {
        let mut workspace = self.require_workspace(workspace_id)?;
        workspace.total_balance = shift(workspace.total_balance, delta, "Workspace total")?;
        self.put_workspace(workspace)
    }

    /// Posted income: credit the bucket and raise the workspace total
    pub fn record_income(
        &mut self,
        workspace_id: WorkspaceId,
        bucket_id: BucketId,
        amount: Money,
    ) -> LedgerResult<()> {
        self.credit(workspace_id, bucket_id, amount)?;
        self.adjust_workspace_total(workspace_id, amount)
    }

    /// Posted expense: debit the bucket, count it as spent, lower the workspace total
    pub fn record_expense(
        &mut self,
        workspace_id: WorkspaceId,
        bucket_id: BucketId,
        amount: Money,
    ) -> LedgerResult<()> {
        let mut bucket = self.bucket_in(workspace_id, bucket_id)?;
        bucket.current_balance = unshift(bucket.current_balance, amount, "Bucket balance")?;
        bucket.total_spent = shift(bucket.total_spent, amount, "Bucket spending")?;
        self.put_bucket(bucket)?;
        self.adjust_workspace_total(workspace_id, negate(amount)?)
    }

    /// Undo [`record_income`](Self::record_income)
    pub fn reverse_income(
        &mut self,
        workspace_id: WorkspaceId,
        bucket_id: BucketId,
        amount: Money,
    ) -> LedgerResult<()> {
        let mut bucket = self.bucket_in(workspace_id, bucket_id)?;
        bucket.current_balance = unshift(bucket.current_balance, amount, "Bucket balance")?;
        bucket.total_allocated = unshift(bucket.total_allocated, amount, "Bucket allocation")?;
        self.put_bucket(bucket)?;
        self.adjust_workspace_total(workspace_id, negate(amount)?)
    }

    /// Undo [`record_expense`](Self::record_expense)
    pub fn reverse_expense(
        &mut self,
        workspace_id: WorkspaceId,
        bucket_id: BucketId,
        amount: Money,
    ) -> LedgerResult<()> {
        let mut bucket = self.bucket_in(workspace_id, bucket_id)?;
        bucket.current_balance = shift(bucket.current_balance, amount, "Bucket balance")?;
        bucket.total_spent = unshift(bucket.total_spent, amount, "Bucket spending")?;
        self.put_bucket(bucket)?;
        self.adjust_workspace_total(workspace_id, amount)
    }

    /// Internal move in: credit a bucket without touching the workspace total
    pub fn credit(
        &mut self,
        workspace_id: WorkspaceId,
        bucket_id: BucketId,
        amount: Money,
    ) -> LedgerResult<()> {
        let mut bucket = self.bucket_in(workspace_id, bucket_id)?;
        bucket.current_balance = shift(bucket.current_balance, amount, "Bucket balance")?;
        bucket.total_allocated = shift(bucket.total_allocated, amount, "Bucket allocation")?;
        self.put_bucket(bucket)
    }

    /// Internal move out: debit a bucket only if it holds at least `amount`
    pub fn debit_checked(
        &mut self,
        workspace_id: WorkspaceId,
        bucket_id: BucketId,
        amount: Money,
    ) -> LedgerResult<Bucket> {
        let mut bucket = self.bucket_in(workspace_id, bucket_id)?;
        if bucket.current_balance < amount {
            return Err(LedgerError::InsufficientBalance {
                bucket: bucket.name,
                needed: amount,
                available: bucket.current_balance,
            });
        }
        bucket.current_balance = unshift(bucket.current_balance, amount, "Bucket balance")?;
        bucket.total_allocated = unshift(bucket.total_allocated, amount, "Bucket allocation")?;
        self.put_bucket(bucket.clone())?;
        Ok(bucket)
    }
}

fn out_of_range(what: &str) -> LedgerError {
    LedgerError::InvalidOperation(format!("{} would leave the representable range", what))
}

/// `value + delta`, failing instead of wrapping
fn shift(value: Money, delta: Money, what: &str) -> LedgerResult<Money> {
    value.checked_add(delta).ok_or_else(|| out_of_range(what))
}

/// `value - delta`, failing instead of wrapping
fn unshift(value: Money, delta: Money, what: &str) -> LedgerResult<Money> {
    value.checked_sub(delta).ok_or_else(|| out_of_range(what))
}

fn negate(amount: Money) -> LedgerResult<Money> {
    Money::zero()
        .checked_sub(amount)
        .ok_or_else(|| out_of_range("Amount"))
}

/// Merge staged rows over committed ones, keeping rows that pass `keep`
fn overlay<K: Ord + Copy, V: Clone>(
    rows: &mut BTreeMap<K, V>,
    staged: &BTreeMap<K, Option<V>>,
    keep: impl Fn(&V) -> bool,
) {
    for (id, row) in staged {
        match row {
            Some(value) if keep(value) => {
                rows.insert(*id, value.clone());
            }
            _ => {
                rows.remove(id);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerPaths;
    use crate::models::{BucketKind, Percentage, TransactionKind, UserId};
    use chrono::NaiveDate;
    use tempfile::TempDir;

    fn setup() -> (TempDir, Storage, WorkspaceId, BucketId) {
        let temp_dir = TempDir::new().unwrap();
        let storage =
            Storage::open(LedgerPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        let (ws_id, inbox_id) = storage
            .atomic(|unit| {
                let ws = Workspace::new(UserId::new(), "Main", "USD");
                let inbox = Bucket::inbox(ws.id, "Inbox");
                let ids = (ws.id, inbox.id);
                unit.put_workspace(ws)?;
                unit.put_bucket(inbox)?;
                Ok(ids)
            })
            .unwrap();
        (temp_dir, storage, ws_id, inbox_id)
    }

    #[test]
    fn test_reads_see_staged_rows() {
        let (_tmp, storage, ws_id, _) = setup();
        storage
            .atomic(|unit| {
                let food = Bucket::new(ws_id, "Food", BucketKind::Spending, Percentage::ZERO);
                let food_id = food.id;
                unit.put_bucket(food)?;
                assert_eq!(unit.buckets_in(ws_id)?.len(), 2);

                unit.remove_bucket(food_id);
                assert!(unit.bucket(food_id)?.is_none());
                assert_eq!(unit.buckets_in(ws_id)?.len(), 1);
                Ok(())
            })
            .unwrap();
    }

    #[test]
    fn test_income_and_expense_keep_total_in_lockstep() {
        let (_tmp, storage, ws_id, inbox_id) = setup();
        storage
            .atomic(|unit| {
                unit.record_income(ws_id, inbox_id, Money::from_units(100))?;
                unit.record_expense(ws_id, inbox_id, Money::from_units(30))
            })
            .unwrap();

        let inbox = storage.buckets.get(inbox_id).unwrap().unwrap();
        let ws = storage.workspaces.get(ws_id).unwrap().unwrap();
        assert_eq!(inbox.current_balance, Money::from_units(70));
        assert_eq!(inbox.total_allocated, Money::from_units(100));
        assert_eq!(inbox.total_spent, Money::from_units(30));
        assert_eq!(ws.total_balance, inbox.current_balance);
    }

    #[test]
    fn test_debit_checked_rejects_overdraw() {
        let (_tmp, storage, ws_id, inbox_id) = setup();
        storage
            .atomic(|unit| unit.record_income(ws_id, inbox_id, Money::from_units(200)))
            .unwrap();

        let result = storage.atomic(|unit| unit.debit_checked(ws_id, inbox_id, Money::from_units(600)));
        match result {
            Err(LedgerError::InsufficientBalance {
                needed, available, ..
            }) => {
                assert_eq!(needed, Money::from_units(600));
                assert_eq!(available, Money::from_units(200));
            }
            other => panic!("expected InsufficientBalance, got {:?}", other),
        }
    }

    #[test]
    fn test_cross_workspace_bucket_rejected() {
        let (_tmp, storage, _ws_id, inbox_id) = setup();
        let other_ws = storage
            .atomic(|unit| {
                let ws = Workspace::new(UserId::new(), "Other", "USD");
                let id = ws.id;
                unit.put_workspace(ws)?;
                Ok(id)
            })
            .unwrap();

        let result = storage.atomic(|unit| unit.credit(other_ws, inbox_id, Money::from_units(1)));
        assert!(matches!(result, Err(LedgerError::CrossWorkspace(_))));
    }

    #[test]
    fn test_duplicate_transaction_rejected() {
        let (_tmp, storage, ws_id, inbox_id) = setup();
        let txn = Transaction::new(
            ws_id,
            inbox_id,
            TransactionKind::Income,
            Money::from_units(1),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        );
        let result = storage.atomic(|unit| {
            unit.insert_transaction(txn.clone())?;
            unit.insert_transaction(txn.clone())
        });
        assert!(result.is_err());
        assert!(storage.transactions.get(txn.id).unwrap().is_none());
    }

    #[test]
    fn test_balance_overflow_is_rejected() {
        let (_tmp, storage, ws_id, inbox_id) = setup();
        storage
            .atomic(|unit| unit.record_income(ws_id, inbox_id, Money::from_cents(i64::MAX)))
            .unwrap();

        let result = storage.atomic(|unit| unit.credit(ws_id, inbox_id, Money::from_cents(1)));
        assert!(matches!(result, Err(LedgerError::InvalidOperation(_))));

        let result =
            storage.atomic(|unit| unit.record_income(ws_id, inbox_id, Money::from_cents(1)));
        assert!(matches!(result, Err(LedgerError::InvalidOperation(_))));

        let inbox = storage.buckets.get(inbox_id).unwrap().unwrap();
        assert_eq!(inbox.current_balance, Money::from_cents(i64::MAX));
        let ws = storage.workspaces.get(ws_id).unwrap().unwrap();
        assert_eq!(ws.total_balance, Money::from_cents(i64::MAX));
    }

    #[test]
    fn test_replace_transaction_requires_existing_row() {
        let (_tmp, storage, ws_id, inbox_id) = setup();
        let txn = Transaction::new(
            ws_id,
            inbox_id,
            TransactionKind::Income,
            Money::from_units(1),
            NaiveDate::from_ymd_opt(2025, 2, 1).unwrap(),
        );
        let missing = storage.atomic(|unit| unit.replace_transaction(txn.clone()));
        assert!(missing.unwrap_err().is_not_found());

        storage.atomic(|unit| unit.insert_transaction(txn.clone())).unwrap();
        let mut edited = txn.clone();
        edited.description = "Edited".into();
        storage.atomic(|unit| unit.replace_transaction(edited)).unwrap();
        assert_eq!(
            storage.transactions.get(txn.id).unwrap().unwrap().description,
            "Edited"
        );
    }
}
