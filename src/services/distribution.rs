//! Distribution service
//!
//! Spreads part of one bucket's resting balance across other buckets of the
//! same workspace, by percentage or fixed share. Only what the shares add up
//! to leaves the source; the undistributed remainder stays where it is.

use chrono::Utc;
use rust_decimal::Decimal;
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::models::distribution::{calculate_distribution, remainder, total_distributed};
use crate::models::{
    Bucket, BucketId, DistributionId, DistributionTarget, Money, Transaction, TransactionKind,
    TransactionLink, WorkspaceId,
};
use crate::storage::{Storage, UnitOfWork};

/// Input for a distribution
#[derive(Debug, Clone)]
pub struct DistributeInput {
    pub workspace_id: WorkspaceId,
    pub source_bucket_id: BucketId,
    /// Basis for percentage targets; not a debit ceiling
    pub amount: Money,
    /// Empty means automatic mode: every other non-inbox bucket at its configured percentage
    pub targets: Vec<DistributionTarget>,
}

/// Credit received by one target
#[derive(Debug, Clone)]
pub struct DistributionReceipt {
    pub bucket_id: BucketId,
    pub name: String,
    pub amount: Money,
    /// Target balance after the credit
    pub current_balance: Money,
}

/// Result of a distribution
#[derive(Debug, Clone)]
pub struct DistributionOutcome {
    /// Shared by every row this distribution wrote
    pub batch: DistributionId,
    pub source: Bucket,
    pub source_before: Money,
    pub source_after: Money,
    /// One entry per non-zero share, in target order
    pub receipts: Vec<DistributionReceipt>,
    pub total_distributed: Money,
    /// `amount - total_distributed`; stays in the source
    pub remainder: Money,
}

/// Service for distributing a bucket's balance
pub struct DistributionService<'a> {
    storage: &'a Storage,
}

impl<'a> DistributionService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    pub fn distribute(&self, input: DistributeInput) -> LedgerResult<DistributionOutcome> {
        let result = self.storage.atomic(|unit| {
            let workspace = unit.require_workspace(input.workspace_id)?;
            let source = unit.bucket_in(workspace.id, input.source_bucket_id)?;
            if !input.amount.is_positive() {
                return Err(LedgerError::InvalidOperation(format!(
                    "Distribution amount must be positive, got {}",
                    input.amount
                )));
            }

            let targets = if input.targets.is_empty() {
                automatic_targets(unit, workspace.id, source.id)?
            } else {
                validate_targets(unit, workspace.id, source.id, &input.targets)?;
                input.targets.clone()
            };
            debug!(targets = targets.len(), "resolved distribution targets");

            let shares = calculate_distribution(input.amount, &targets)?;
            let distributed = total_distributed(&shares)?;

            if distributed > source.current_balance {
                return Err(LedgerError::InsufficientBalance {
                    bucket: source.name.clone(),
                    needed: distributed,
                    available: source.current_balance,
                });
            }

            let batch = DistributionId::new();
            let today = Utc::now().date_naive();
            let link = Some(TransactionLink::Distribution { batch });
            let source_before = source.current_balance;

            let source = if distributed.is_positive() {
                let debited = unit.debit_checked(workspace.id, source.id, distributed)?;
                let mut row = Transaction::new(
                    workspace.id,
                    source.id,
                    TransactionKind::Expense,
                    distributed,
                    today,
                )
                .with_description("Distribution of balance to other buckets");
                row.is_allocated = true;
                row.link = link;
                unit.insert_transaction(row)?;
                debited
            } else {
                source
            };

            let mut receipts = Vec::new();
            for share in shares.iter().filter(|s| !s.amount.is_zero()) {
                unit.credit(workspace.id, share.bucket_id, share.amount)?;
                let mut row = Transaction::new(
                    workspace.id,
                    share.bucket_id,
                    TransactionKind::Income,
                    share.amount,
                    today,
                )
                .with_description(format!("Received via distribution from {}", source.name));
                row.is_allocated = true;
                row.link = link;
                unit.insert_transaction(row)?;

                let target = unit.require_bucket(share.bucket_id)?;
                receipts.push(DistributionReceipt {
                    bucket_id: target.id,
                    name: target.name,
                    amount: share.amount,
                    current_balance: target.current_balance,
                });
            }

            Ok(DistributionOutcome {
                batch,
                source_before,
                source_after: source.current_balance,
                source,
                receipts,
                total_distributed: distributed,
                remainder: remainder(input.amount, distributed),
            })
        });

        match &result {
            Ok(outcome) => info!(
                source = %outcome.source.name,
                distributed = %outcome.total_distributed,
                targets = outcome.receipts.len(),
                remainder = %outcome.remainder,
                "distribution committed"
            ),
            Err(err) => warn!(
                source = %input.source_bucket_id.short(),
                error = %err,
                "distribution rejected"
            ),
        }
        result
    }
}

/// Percentage targets for every non-inbox, non-source bucket with a configured share
fn automatic_targets(
    unit: &UnitOfWork<'_>,
    workspace_id: WorkspaceId,
    source_id: BucketId,
) -> LedgerResult<Vec<DistributionTarget>> {
    Ok(unit
        .buckets_in(workspace_id)?
        .iter()
        .filter(|b| b.id != source_id && b.receives_allocation())
        .map(|b| DistributionTarget::percentage(b.id, b.allocation_percentage.value()))
        .collect())
}

fn validate_targets(
    unit: &UnitOfWork<'_>,
    workspace_id: WorkspaceId,
    source_id: BucketId,
    targets: &[DistributionTarget],
) -> LedgerResult<()> {
    for target in targets {
        let bucket = unit.bucket_in(workspace_id, target.bucket_id)?;
        if bucket.id == source_id {
            return Err(LedgerError::InvalidOperation(format!(
                "Cannot distribute from '{}' to itself",
                bucket.name
            )));
        }
        if target.value < Decimal::ZERO {
            return Err(LedgerError::InvalidOperation(format!(
                "Distribution share for '{}' cannot be negative",
                bucket.name
            )));
        }
    }
    Ok(())
}
