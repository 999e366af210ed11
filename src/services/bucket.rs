//! Bucket service
//!
//! CRUD for the buckets of a workspace. The inbox is created with its
//! workspace and can never be created, demoted or deleted through here.

use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    AllocationLeg, Bucket, BucketId, BucketKind, Money, Percentage, Transaction, WorkspaceId,
};
use crate::storage::{Storage, UnitOfWork};

use super::inbox::resolve_inbox;

/// Input for creating a bucket
#[derive(Debug, Clone)]
pub struct CreateBucketInput {
    pub workspace_id: WorkspaceId,
    pub name: String,
    pub kind: BucketKind,
    pub allocation: Percentage,
}

/// Fields to change on a bucket; `None` leaves a field as it is
#[derive(Debug, Clone, Default)]
pub struct UpdateBucketInput {
    pub name: Option<String>,
    pub kind: Option<BucketKind>,
    pub allocation: Option<Percentage>,
    pub is_default: Option<bool>,
}

/// Service for bucket management
pub struct BucketService<'a> {
    storage: &'a Storage,
}

impl<'a> BucketService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn create(&self, input: CreateBucketInput) -> LedgerResult<Bucket> {
        let result = self.storage.atomic(|unit| {
            let workspace = unit.require_workspace(input.workspace_id)?;
            if input.kind == BucketKind::Inbox {
                return Err(LedgerError::InboxMutationForbidden(
                    "A workspace already has its inbox; create a SPENDING or INVESTMENT bucket"
                        .into(),
                ));
            }

            let bucket = Bucket::new(workspace.id, input.name.trim(), input.kind, input.allocation);
            check_allocation_total(unit, &bucket)?;
            let id = bucket.id;
            unit.put_bucket(bucket)?;
            unit.require_bucket(id)
        });

        match &result {
            Ok(bucket) => info!(
                bucket = %bucket.id.short(),
                name = %bucket.name,
                allocation = %bucket.allocation_percentage,
                "created bucket"
            ),
            Err(err) => warn!(name = %input.name, error = %err, "bucket create rejected"),
        }
        result
    }

    pub fn get(&self, id: BucketId) -> LedgerResult<Option<Bucket>> {
        self.storage.buckets.get(id)
    }

    /// Find a bucket of a workspace by name (case-insensitive) or id
    pub fn find(&self, workspace_id: WorkspaceId, identifier: &str) -> LedgerResult<Option<Bucket>> {
        if let Ok(id) = identifier.parse::<BucketId>() {
            if let Some(bucket) = self.get(id)? {
                if bucket.workspace_id == workspace_id {
                    return Ok(Some(bucket));
                }
            }
        }
        Ok(self
            .list(workspace_id)?
            .into_iter()
            .find(|b| b.matches(identifier)))
    }

    /// Buckets of a workspace, largest allocation first
    pub fn list(&self, workspace_id: WorkspaceId) -> LedgerResult<Vec<Bucket>> {
        self.storage.read(|unit| {
            unit.require_workspace(workspace_id)?;
            unit.buckets_in(workspace_id)
        })
    }

    pub fn update(&self, id: BucketId, input: UpdateBucketInput) -> LedgerResult<Bucket> {
        let result = self.storage.atomic(|unit| {
            let mut bucket = unit.require_bucket(id)?;

            if bucket.is_inbox() {
                if input.is_default == Some(false) {
                    return Err(LedgerError::InboxMutationForbidden(format!(
                        "'{}' is the workspace inbox and must stay the default bucket",
                        bucket.name
                    )));
                }
                if matches!(input.kind, Some(kind) if kind != BucketKind::Inbox) {
                    return Err(LedgerError::InboxMutationForbidden(format!(
                        "The type of inbox '{}' cannot be changed",
                        bucket.name
                    )));
                }
                if matches!(input.allocation, Some(pct) if !pct.is_zero()) {
                    return Err(LedgerError::InboxMutationForbidden(format!(
                        "Inbox '{}' cannot take an allocation percentage",
                        bucket.name
                    )));
                }
            } else {
                if input.is_default == Some(true) || input.kind == Some(BucketKind::Inbox) {
                    return Err(LedgerError::InboxMutationForbidden(format!(
                        "'{}' cannot become a second inbox",
                        bucket.name
                    )));
                }
                if let Some(kind) = input.kind {
                    bucket.kind = kind;
                }
                if let Some(pct) = input.allocation {
                    bucket.allocation_percentage = pct;
                }
            }

            if let Some(name) = &input.name {
                bucket.name = name.trim().to_string();
            }

            check_allocation_total(unit, &bucket)?;
            unit.put_bucket(bucket)?;
            unit.require_bucket(id)
        });

        match &result {
            Ok(bucket) => info!(bucket = %bucket.id.short(), name = %bucket.name, "updated bucket"),
            Err(err) => warn!(bucket = %id.short(), error = %err, "bucket update rejected"),
        }
        result
    }

    /// Delete an empty non-inbox bucket.
    ///
    /// Transaction rows are history and stay: every row or allocation leg
    /// that points at the bucket is re-pointed at the inbox. The bucket's
    /// rows net out to its zero balance, so the inbox balance is still the
    /// sum of its rows afterwards.
    pub fn delete(&self, id: BucketId) -> LedgerResult<Bucket> {
        let result = self.storage.atomic(|unit| {
            let bucket = unit.require_bucket(id)?;
            if bucket.is_inbox() {
                return Err(LedgerError::InboxMutationForbidden(format!(
                    "Inbox '{}' cannot be deleted",
                    bucket.name
                )));
            }
            if !bucket.current_balance.is_zero() {
                return Err(LedgerError::InvalidOperation(format!(
                    "Bucket '{}' still holds {}; move the balance out first",
                    bucket.name, bucket.current_balance
                )));
            }

            let inbox = resolve_inbox(unit, bucket.workspace_id)?;
            let mut rehomed = 0usize;
            for txn in unit.transactions_in(bucket.workspace_id)? {
                if let Some(moved) = rehome(&txn, id, inbox.id) {
                    unit.replace_transaction(moved)?;
                    rehomed += 1;
                }
            }

            // Later reversals of re-homed rows adjust the inbox counters
            let mut inbox = unit.require_bucket(inbox.id)?;
            inbox.total_allocated = carry(inbox.total_allocated, bucket.total_allocated)?;
            inbox.total_spent = carry(inbox.total_spent, bucket.total_spent)?;
            unit.put_bucket(inbox)?;

            unit.remove_bucket(id);
            debug!(bucket = %id.short(), rows = rehomed, "re-homed bucket history to inbox");
            Ok(bucket)
        });

        match &result {
            Ok(bucket) => info!(bucket = %bucket.id.short(), name = %bucket.name, "deleted bucket"),
            Err(err) => warn!(bucket = %id.short(), error = %err, "bucket delete rejected"),
        }
        result
    }
}

/// `txn` with every reference to `from` pointed at `to`, or `None` if it never touched `from`
fn rehome(txn: &Transaction, from: BucketId, to: BucketId) -> Option<Transaction> {
    let touches = txn.bucket_id == from || txn.allocations.iter().any(|leg| leg.bucket_id == from);
    if !touches {
        return None;
    }

    let mut moved = txn.clone();
    if moved.bucket_id == from {
        moved.bucket_id = to;
    }
    let mut legs: Vec<AllocationLeg> = Vec::with_capacity(moved.allocations.len());
    for mut leg in moved.allocations.drain(..) {
        if leg.bucket_id == from {
            leg.bucket_id = to;
        }
        match legs.iter_mut().find(|l| l.bucket_id == leg.bucket_id) {
            Some(existing) => existing.amount += leg.amount,
            None => legs.push(leg),
        }
    }
    moved.allocations = legs;
    Some(moved)
}

fn carry(into: Money, amount: Money) -> LedgerResult<Money> {
    into.checked_add(amount).ok_or_else(|| {
        LedgerError::InvalidOperation("Inbox counters would leave the representable range".into())
    })
}

/// Non-inbox allocation percentages of a workspace may not exceed 100
fn check_allocation_total(unit: &UnitOfWork<'_>, candidate: &Bucket) -> LedgerResult<()> {
    let others: Decimal = unit
        .buckets_in(candidate.workspace_id)?
        .iter()
        .filter(|b| b.id != candidate.id && !b.is_inbox())
        .map(|b| b.allocation_percentage.value())
        .sum();
    let total = others + candidate.allocation_percentage.value();

    if total > Percentage::FULL.value() {
        return Err(LedgerError::InvalidOperation(format!(
            "Allocation percentages would total {}%, more than 100%",
            total.normalize()
        )));
    }
    Ok(())
}
