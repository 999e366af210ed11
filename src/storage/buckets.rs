//! In-memory bucket table, indexed by workspace

use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::RwLock;

use crate::error::LedgerError;
use crate::models::{Bucket, BucketId, WorkspaceId};

use super::lock_poisoned;

pub struct BucketRepository {
    data: RwLock<HashMap<BucketId, Bucket>>,
    /// Index: workspace_id -> bucket_ids
    by_workspace: RwLock<HashMap<WorkspaceId, HashSet<BucketId>>>,
}

impl BucketRepository {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
            by_workspace: RwLock::new(HashMap::new()),
        }
    }

    pub fn replace_all(&self, buckets: Vec<Bucket>) -> Result<(), LedgerError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        let mut by_workspace = self.by_workspace.write().map_err(lock_poisoned)?;
        data.clear();
        by_workspace.clear();

        for bucket in buckets {
            by_workspace
                .entry(bucket.workspace_id)
                .or_default()
                .insert(bucket.id);
            data.insert(bucket.id, bucket);
        }
        Ok(())
    }

    pub fn to_vec(&self) -> Result<Vec<Bucket>, LedgerError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        let mut buckets: Vec<_> = data.values().cloned().collect();
        buckets.sort_by(|a, b| {
            a.workspace_id
                .cmp(&b.workspace_id)
                .then(a.created_at.cmp(&b.created_at))
                .then(a.id.cmp(&b.id))
        });
        Ok(buckets)
    }

    pub fn get(&self, id: BucketId) -> Result<Option<Bucket>, LedgerError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.get(&id).cloned())
    }

    /// Buckets of one workspace, in listing order
    pub fn get_by_workspace(&self, workspace_id: WorkspaceId) -> Result<Vec<Bucket>, LedgerError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        let by_workspace = self.by_workspace.read().map_err(lock_poisoned)?;

        let mut buckets: Vec<_> = by_workspace
            .get(&workspace_id)
            .into_iter()
            .flatten()
            .filter_map(|id| data.get(id).cloned())
            .collect();
        buckets.sort_by(Bucket::display_order);
        Ok(buckets)
    }

    pub(crate) fn apply(
        &self,
        changes: &BTreeMap<BucketId, Option<Bucket>>,
    ) -> Result<BTreeMap<BucketId, Option<Bucket>>, LedgerError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        let mut by_workspace = self.by_workspace.write().map_err(lock_poisoned)?;
        let mut previous = BTreeMap::new();

        for (id, row) in changes {
            let old = data.remove(id);
            if let Some(old) = &old {
                if let Some(ids) = by_workspace.get_mut(&old.workspace_id) {
                    ids.remove(id);
                }
            }
            if let Some(bucket) = row {
                by_workspace
                    .entry(bucket.workspace_id)
                    .or_default()
                    .insert(*id);
                data.insert(*id, bucket.clone());
            }
            previous.insert(*id, old);
        }
        by_workspace.retain(|_, ids| !ids.is_empty());
        Ok(previous)
    }
}

impl Default for BucketRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{BucketKind, Percentage};

    #[test]
    fn test_index_follows_changes() {
        let repo = BucketRepository::new();
        let ws = WorkspaceId::new();
        let inbox = Bucket::inbox(ws, "Inbox");
        let food = Bucket::new(ws, "Food", BucketKind::Spending, Percentage::whole(20).unwrap());
        repo.replace_all(vec![inbox.clone()]).unwrap();

        let mut changes = BTreeMap::new();
        changes.insert(food.id, Some(food.clone()));
        repo.apply(&changes).unwrap();

        let listed = repo.get_by_workspace(ws).unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "Food");

        let mut removal = BTreeMap::new();
        removal.insert(food.id, None);
        let previous = repo.apply(&removal).unwrap();
        assert_eq!(previous[&food.id].as_ref().unwrap().name, "Food");
        assert_eq!(repo.get_by_workspace(ws).unwrap().len(), 1);
        assert!(repo.get(food.id).unwrap().is_none());
    }

    #[test]
    fn test_unknown_workspace_is_empty() {
        let repo = BucketRepository::new();
        assert!(repo.get_by_workspace(WorkspaceId::new()).unwrap().is_empty());
    }
}
