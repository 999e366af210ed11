//! Transfer service
//!
//! Moves a fixed amount between two buckets of the same workspace. A
//! transfer writes a linked pair of rows: an EXPENSE on the source and an
//! INCOME on the destination. The workspace total does not change.

use chrono::Utc;
use tracing::{info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Bucket, BucketId, Money, Transaction, TransactionKind, TransactionLink};
use crate::storage::Storage;

/// Service for transfers between buckets
pub struct TransferService<'a> {
    storage: &'a Storage,
}

/// Result of a transfer
#[derive(Debug, Clone)]
pub struct TransferResult {
    /// Source bucket after the debit
    pub source: Bucket,
    /// Destination bucket after the credit
    pub destination: Bucket,
    /// The EXPENSE row on the source
    pub outflow: Transaction,
    /// The INCOME row on the destination
    pub inflow: Transaction,
}

impl<'a> TransferService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Move `amount` from `source_id` to `destination_id`.
    ///
    /// The balance check and the debit happen under the store's write lock,
    /// so two concurrent transfers can never both spend the same money.
    pub fn transfer(
        &self,
        source_id: BucketId,
        destination_id: BucketId,
        amount: Money,
    ) -> LedgerResult<TransferResult> {
        let result = self.storage.atomic(|unit| {
            if !amount.is_positive() {
                return Err(LedgerError::InvalidOperation(format!(
                    "Transfer amount must be positive, got {}",
                    amount
                )));
            }

            let source = unit.require_bucket(source_id)?;
            let destination = unit.require_bucket(destination_id)?;

            if source.workspace_id != destination.workspace_id {
                return Err(LedgerError::CrossWorkspace(format!(
                    "Cannot transfer from '{}' to '{}': buckets are in different workspaces",
                    source.name, destination.name
                )));
            }
            if source.id == destination.id {
                return Err(LedgerError::InvalidOperation(
                    "Cannot transfer to the same bucket".into(),
                ));
            }

            let workspace_id = source.workspace_id;
            let source = unit.debit_checked(workspace_id, source.id, amount)?;
            unit.credit(workspace_id, destination.id, amount)?;

            let today = Utc::now().date_naive();
            let mut outflow =
                Transaction::new(workspace_id, source.id, TransactionKind::Expense, amount, today)
                    .with_description(format!("Transfer to {}", destination.name));
            let mut inflow = Transaction::new(
                workspace_id,
                destination.id,
                TransactionKind::Income,
                amount,
                today,
            )
            .with_description(format!("Transfer from {}", source.name));

            outflow.is_allocated = true;
            inflow.is_allocated = true;
            outflow.link = Some(TransactionLink::Transfer {
                counterpart: inflow.id,
            });
            inflow.link = Some(TransactionLink::Transfer {
                counterpart: outflow.id,
            });

            unit.insert_transaction(outflow.clone())?;
            unit.insert_transaction(inflow.clone())?;

            Ok(TransferResult {
                source,
                destination: unit.require_bucket(destination.id)?,
                outflow,
                inflow,
            })
        });

        match &result {
            Ok(r) => info!(
                from = %r.source.name,
                to = %r.destination.name,
                amount = %amount,
                "transfer committed"
            ),
            Err(err) => warn!(
                from = %source_id.short(),
                to = %destination_id.short(),
                error = %err,
                "transfer rejected"
            ),
        }
        result
    }
}
