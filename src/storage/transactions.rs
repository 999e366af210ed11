//! In-memory transaction table with workspace and bucket indexes

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use crate::error::LedgerError;
use crate::models::{BucketId, Transaction, TransactionId, WorkspaceId};

use super::lock_poisoned;

pub struct TransactionRepository {
    data: RwLock<HashMap<TransactionId, Transaction>>,
    /// Index: workspace_id -> transaction_ids
    by_workspace: RwLock<HashMap<WorkspaceId, HashSet<TransactionId>>>,
    /// Index: bucket_id -> transaction_ids (primary bucket and allocation legs)
    by_bucket: RwLock<HashMap<BucketId, HashSet<TransactionId>>>,
}

/// Newest first: by date, then creation time
fn newest_first(a: &Transaction, b: &Transaction) -> std::cmp::Ordering {
    b.date
        .cmp(&a.date)
        .then(b.created_at.cmp(&a.created_at))
        .then(a.id.cmp(&b.id))
}

fn touched_buckets(txn: &Transaction) -> impl Iterator<Item = BucketId> + '_ {
    std::iter::once(txn.bucket_id).chain(txn.allocations.iter().map(|leg| leg.bucket_id))
}

impl TransactionRepository {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            by_workspace: RwLock::new(HashMap::new()),
            by_bucket: RwLock::new(HashMap::new()),
        }
    }

    pub fn replace_all(&self, transactions: Vec<Transaction>) -> Result<(), LedgerError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        let mut by_workspace = self.by_workspace.write().map_err(lock_poisoned)?;
        let mut by_bucket = self.by_bucket.write().map_err(lock_poisoned)?;
        data.clear();
        by_workspace.clear();
        by_bucket.clear();

        for txn in transactions {
            by_workspace.entry(txn.workspace_id).or_default().insert(txn.id);
            for bucket_id in touched_buckets(&txn) {
                by_bucket.entry(bucket_id).or_default().insert(txn.id);
            }
            data.insert(txn.id, txn);
        }
        Ok(())
    }

    pub fn to_vec(&self) -> Result<Vec<Transaction>, LedgerError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        let mut transactions: Vec<_> = data.values().cloned().collect();
        transactions.sort_by(newest_first);
        Ok(transactions)
    }

    pub fn get(&self, id: TransactionId) -> Result<Option<Transaction>, LedgerError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.get(&id).cloned())
    }

    /// Transactions of one workspace, newest first
    pub fn get_by_workspace(
        &self,
        workspace_id: WorkspaceId,
    ) -> Result<Vec<Transaction>, LedgerError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        let by_workspace = self.by_workspace.read().map_err(lock_poisoned)?;

        let mut transactions: Vec<_> = by_workspace
            .get(&workspace_id)
            .into_iter()
            .flatten()
            .filter_map(|id| data.get(id).cloned())
            .collect();
        transactions.sort_by(newest_first);
        Ok(transactions)
    }

    /// Transactions that touched a bucket, including allocation legs
    pub fn get_by_bucket(&self, bucket_id: BucketId) -> Result<Vec<Transaction>, LedgerError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        let by_bucket = self.by_bucket.read().map_err(lock_poisoned)?;

        let mut transactions: Vec<_> = by_bucket
            .get(&bucket_id)
            .into_iter()
            .flatten()
            .filter_map(|id| data.get(id).cloned())
            .collect();
        transactions.sort_by(newest_first);
        Ok(transactions)
    }

    pub(crate) fn apply(
        &self,
        changes: &BTreeMap<TransactionId, Option<Transaction>>,
    ) -> Result<BTreeMap<TransactionId, Option<Transaction>>, LedgerError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        let mut by_workspace = self.by_workspace.write().map_err(lock_poisoned)?;
        let mut by_bucket = self.by_bucket.write().map_err(lock_poisoned)?;
        let mut previous = BTreeMap::new();

        for (id, row) in changes {
            let old = data.remove(id);
            if let Some(old) = &old {
                if let Some(ids) = by_workspace.get_mut(&old.workspace_id) {
                    ids.remove(id);
                }
                for bucket_id in touched_buckets(old) {
                    if let Some(ids) = by_bucket.get_mut(&bucket_id) {
                        ids.remove(id);
                    }
                }
            }
            if let Some(txn) = row {
                by_workspace.entry(txn.workspace_id).or_default().insert(*id);
                for bucket_id in touched_buckets(txn) {
                    by_bucket.entry(bucket_id).or_default().insert(*id);
                }
                data.insert(*id, txn.clone());
            }
            previous.insert(*id, old);
        }
        by_workspace.retain(|_, ids| !ids.is_empty());
        by_bucket.retain(|_, ids| !ids.is_empty());
        Ok(previous)
    }
}

impl Default for TransactionRepository {
    fn default() -> Self {
        Self::new()
    }
}
