//! Inbox resolution
//!
//! Every workspace owns exactly one default INBOX bucket. These helpers turn
//! "no bucket given" into that concrete bucket so the posting path never
//! carries an optional bucket past this point.

use tracing::{debug, error};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Bucket, BucketId, WorkspaceId};
use crate::storage::UnitOfWork;

/// The workspace's single default bucket.
///
/// Zero or several defaults is a broken ledger, reported as
/// [`LedgerError::InboxInvariant`].
pub fn resolve_inbox(unit: &UnitOfWork<'_>, workspace_id: WorkspaceId) -> LedgerResult<Bucket> {
    let mut defaults: Vec<Bucket> = unit
        .buckets_in(workspace_id)?
        .into_iter()
        .filter(|b| b.is_default)
        .collect();

    match defaults.len() {
        1 => Ok(defaults.remove(0)),
        0 => {
            error!(workspace = %workspace_id.short(), "workspace has no inbox");
            Err(LedgerError::InboxInvariant(format!(
                "Workspace {} has no default inbox bucket",
                workspace_id
            )))
        }
        n => {
            error!(workspace = %workspace_id.short(), count = n, "workspace has several inboxes");
            Err(LedgerError::InboxInvariant(format!(
                "Workspace {} has {} default buckets",
                workspace_id, n
            )))
        }
    }
}

/// Resolve an optional bucket to a concrete one in `workspace_id`.
///
/// An explicit bucket must exist and belong to the workspace; no bucket
/// means the inbox.
pub fn resolve_target_bucket(
    unit: &UnitOfWork<'_>,
    workspace_id: WorkspaceId,
    bucket_id: Option<BucketId>,
) -> LedgerResult<BucketId> {
    match bucket_id {
        Some(id) => Ok(unit.bucket_in(workspace_id, id)?.id),
        None => {
            let inbox = resolve_inbox(unit, workspace_id)?;
            debug!(bucket = %inbox.id.short(), "no bucket given, using inbox");
            Ok(inbox.id)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::LedgerPaths;
    use crate::models::{BucketKind, Percentage, UserId, Workspace};
    use crate::storage::Storage;
    use tempfile::TempDir;

    fn create_test_storage() -> (TempDir, Storage) {
        let temp_dir = TempDir::new().unwrap();
        let storage =
            Storage::open(LedgerPaths::with_base_dir(temp_dir.path().to_path_buf())).unwrap();
        (temp_dir, storage)
    }

    fn workspace_with(storage: &Storage, with_inbox: bool) -> (WorkspaceId, Option<BucketId>) {
        storage
            .atomic(|unit| {
                let ws = Workspace::new(UserId::new(), "Main", "USD");
                let ws_id = ws.id;
                unit.put_workspace(ws)?;
                let inbox_id = if with_inbox {
                    let inbox = Bucket::inbox(ws_id, "Inbox");
                    let id = inbox.id;
                    unit.put_bucket(inbox)?;
                    Some(id)
                } else {
                    None
                };
                Ok((ws_id, inbox_id))
            })
            .unwrap()
    }

    #[test]
    fn test_resolves_inbox_when_no_bucket_given() {
        let (_tmp, storage) = create_test_storage();
        let (ws_id, inbox_id) = workspace_with(&storage, true);

        let resolved = storage
            .read(|unit| resolve_target_bucket(unit, ws_id, None))
            .unwrap();
        assert_eq!(Some(resolved), inbox_id);
    }

    #[test]
    fn test_explicit_bucket_must_belong_to_workspace() {
        let (_tmp, storage) = create_test_storage();
        let (ws_a, _) = workspace_with(&storage, true);
        let (ws_b, inbox_b) = workspace_with(&storage, true);

        let food = storage
            .atomic(|unit| {
                let food = Bucket::new(ws_a, "Food", BucketKind::Spending, Percentage::ZERO);
                let id = food.id;
                unit.put_bucket(food)?;
                Ok(id)
            })
            .unwrap();

        let same = storage
            .read(|unit| resolve_target_bucket(unit, ws_a, Some(food)))
            .unwrap();
        assert_eq!(same, food);

        let cross = storage.read(|unit| resolve_target_bucket(unit, ws_a, inbox_b));
        assert!(matches!(cross, Err(LedgerError::CrossWorkspace(_))));

        let missing = storage.read(|unit| resolve_target_bucket(unit, ws_b, Some(BucketId::new())));
        assert!(missing.unwrap_err().is_not_found());
    }

    #[test]
    fn test_missing_inbox_is_fatal() {
        let (_tmp, storage) = create_test_storage();
        let (ws_id, _) = workspace_with(&storage, false);

        let err = storage
            .read(|unit| resolve_target_bucket(unit, ws_id, None))
            .unwrap_err();
        assert!(matches!(err, LedgerError::InboxInvariant(_)));
        assert!(err.is_fatal());
    }
}
