//! In-memory workspace table

use std::collections::{BTreeMap, HashMap};
use std::sync::RwLock;

use crate::error::LedgerError;
use crate::models::{UserId, Workspace, WorkspaceId};

use super::lock_poisoned;

pub struct WorkspaceRepository {
    data: RwLock<HashMap<WorkspaceId, Workspace>>,
}

impl WorkspaceRepository {
    pub fn new() -> Self {
        Self {
            data: RwLock::new(HashMap::new()),
        }
    }

    /// Replace the whole table (used when loading the ledger file)
    pub fn replace_all(&self, workspaces: Vec<Workspace>) -> Result<(), LedgerError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        data.clear();
        data.extend(workspaces.into_iter().map(|ws| (ws.id, ws)));
        Ok(())
    }

    /// All workspaces, oldest first
    pub fn to_vec(&self) -> Result<Vec<Workspace>, LedgerError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        let mut workspaces: Vec<_> = data.values().cloned().collect();
        workspaces.sort_by(|a, b| a.created_at.cmp(&b.created_at).then(a.id.cmp(&b.id)));
        Ok(workspaces)
    }

    pub fn get(&self, id: WorkspaceId) -> Result<Option<Workspace>, LedgerError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.get(&id).cloned())
    }

    pub fn get_by_owner(&self, owner: UserId) -> Result<Vec<Workspace>, LedgerError> {
        Ok(self
            .to_vec()?
            .into_iter()
            .filter(|ws| ws.owner_id == owner)
            .collect())
    }

    pub fn count(&self) -> Result<usize, LedgerError> {
        let data = self.data.read().map_err(lock_poisoned)?;
        Ok(data.len())
    }

    /// Apply staged rows (`None` deletes) and return the rows they replaced
    pub(crate) fn apply(
        &self,
        changes: &BTreeMap<WorkspaceId, Option<Workspace>>,
    ) -> Result<BTreeMap<WorkspaceId, Option<Workspace>>, LedgerError> {
        let mut data = self.data.write().map_err(lock_poisoned)?;
        let mut previous = BTreeMap::new();
        for (id, row) in changes {
            let old = match row {
                Some(ws) => data.insert(*id, ws.clone()),
                None => data.remove(id),
            };
            previous.insert(*id, old);
        }
        Ok(previous)
    }
}

impl Default for WorkspaceRepository {
    fn default() -> Self {
        Self::new()
    }
}
