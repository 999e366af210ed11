//! Transaction service
//!
//! Posting, deletion and import of income/expense transactions. Every
//! posting moves the bucket balance and the workspace total in the same
//! unit of work; deletion applies the exact inverse.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::{LedgerError, LedgerResult};
use crate::models::{
    AllocationLeg, Bucket, BucketId, Money, Percentage, Transaction, TransactionId,
    TransactionKind, TransactionLink, WorkspaceId,
};
use crate::storage::{Storage, UnitOfWork};

use super::inbox::{resolve_inbox, resolve_target_bucket};

/// Input for posting a transaction
#[derive(Debug, Clone)]
pub struct PostTransactionInput {
    pub workspace_id: WorkspaceId,
    /// `None` posts to the workspace inbox
    pub bucket_id: Option<BucketId>,
    pub amount: Money,
    pub kind: TransactionKind,
    pub description: String,
    /// Defaults to today (UTC)
    pub date: Option<NaiveDate>,
    /// Fan income out across buckets by their allocation percentage
    pub is_allocated: bool,
}

/// One pre-parsed row of a bulk import
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImportRow {
    pub date: NaiveDate,
    #[serde(default)]
    pub description: String,
    /// Sign is ignored; the kind decides the direction
    pub amount: Money,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
}

/// Filter options for listing transactions
#[derive(Debug, Clone, Default)]
pub struct TransactionFilter {
    pub bucket_id: Option<BucketId>,
    pub kind: Option<TransactionKind>,
    pub start_date: Option<NaiveDate>,
    pub end_date: Option<NaiveDate>,
    pub min_amount: Option<Money>,
    pub max_amount: Option<Money>,
    pub limit: Option<usize>,
}

impl TransactionFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bucket(mut self, bucket_id: BucketId) -> Self {
        self.bucket_id = Some(bucket_id);
        self
    }

    pub fn kind(mut self, kind: TransactionKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn date_range(mut self, start: NaiveDate, end: NaiveDate) -> Self {
        self.start_date = Some(start);
        self.end_date = Some(end);
        self
    }

    pub fn amount_range(mut self, min: Option<Money>, max: Option<Money>) -> Self {
        self.min_amount = min;
        self.max_amount = max;
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    fn matches(&self, txn: &Transaction) -> bool {
        if let Some(bucket_id) = self.bucket_id {
            let touches = txn.bucket_id == bucket_id
                || txn.allocations.iter().any(|leg| leg.bucket_id == bucket_id);
            if !touches {
                return false;
            }
        }
        if self.kind.is_some_and(|kind| txn.kind != kind) {
            return false;
        }
        if self.start_date.is_some_and(|start| txn.date < start) {
            return false;
        }
        if self.end_date.is_some_and(|end| txn.date > end) {
            return false;
        }
        if self.min_amount.is_some_and(|min| txn.amount < min) {
            return false;
        }
        if self.max_amount.is_some_and(|max| txn.amount > max) {
            return false;
        }
        true
    }
}

/// Service for transaction management
pub struct TransactionService<'a> {
    storage: &'a Storage,
}

impl<'a> TransactionService<'a> {
    pub fn new(storage: &'a Storage) -> Self {
        Self { storage }
    }

    /// Post an income or expense transaction.
    ///
    /// Allocated income ignores the resolved bucket and fans out via
    /// [`allocate_income`]; everything else lands on the resolved bucket.
    pub fn post(&self, input: PostTransactionInput) -> LedgerResult<Transaction> {
        let result = self.storage.atomic(|unit| {
            let workspace = unit.require_workspace(input.workspace_id)?;
            if !input.amount.is_positive() {
                return Err(LedgerError::InvalidOperation(format!(
                    "Transaction amount must be positive, got {}",
                    input.amount
                )));
            }

            let bucket_id = resolve_target_bucket(unit, workspace.id, input.bucket_id)?;
            let date = input.date.unwrap_or_else(|| Utc::now().date_naive());
            let mut txn = Transaction::new(workspace.id, bucket_id, input.kind, input.amount, date)
                .with_description(input.description.clone());

            match input.kind {
                TransactionKind::Expense => {
                    unit.record_expense(workspace.id, bucket_id, input.amount)?;
                }
                TransactionKind::Income if input.is_allocated => {
                    let legs = allocate_income(unit, workspace.id, input.amount)?;
                    for leg in &legs {
                        unit.record_income(workspace.id, leg.bucket_id, leg.amount)?;
                    }
                    txn.is_allocated = true;
                    txn.allocations = legs;
                }
                TransactionKind::Income => {
                    unit.record_income(workspace.id, bucket_id, input.amount)?;
                }
            }

            unit.insert_transaction(txn.clone())?;
            Ok(txn)
        });

        match &result {
            Ok(txn) => info!(
                id = %txn.id.short(),
                kind = %txn.kind,
                amount = %txn.amount,
                allocated = txn.is_allocated,
                "posted transaction"
            ),
            Err(err) => warn!(error = %err, "transaction rejected"),
        }
        result
    }

    /// Delete a transaction by exactly reversing its balance effect.
    ///
    /// Transfer legs and distribution rows are removed together with the
    /// rest of their group. Returns every removed row.
    pub fn delete(&self, id: TransactionId) -> LedgerResult<Vec<Transaction>> {
        let result = self.storage.atomic(|unit| {
            let txn = unit.require_transaction(id)?;
            let group = linked_group(unit, &txn)?;

            // Credits back first, so a group can never fail a debit it funds itself
            let mut ordered = group.clone();
            ordered.sort_by_key(|t| t.is_income());
            for row in &ordered {
                reverse_row(unit, row)?;
                unit.remove_transaction(row.id);
            }
            Ok(group)
        });

        match &result {
            Ok(rows) => info!(id = %id.short(), removed = rows.len(), "deleted transaction"),
            Err(err) => warn!(id = %id.short(), error = %err, "transaction delete rejected"),
        }
        result
    }

    /// Post a batch of rows to the inbox in a single unit
    pub fn import(&self, workspace_id: WorkspaceId, rows: &[ImportRow]) -> LedgerResult<Vec<Transaction>> {
        let result = self.storage.atomic(|unit| {
            let workspace = unit.require_workspace(workspace_id)?;
            if rows.is_empty() {
                return Err(LedgerError::InvalidOperation(
                    "No transactions supplied for import".into(),
                ));
            }
            let inbox = resolve_inbox(unit, workspace.id)?;

            let mut imported = Vec::with_capacity(rows.len());
            for row in rows {
                let amount = row.amount.abs();
                if amount.is_zero() {
                    return Err(LedgerError::InvalidOperation(format!(
                        "Import row '{}' on {} has a zero amount",
                        row.description, row.date
                    )));
                }
                match row.kind {
                    TransactionKind::Income => unit.record_income(workspace.id, inbox.id, amount)?,
                    TransactionKind::Expense => {
                        unit.record_expense(workspace.id, inbox.id, amount)?
                    }
                }
                let txn = Transaction::new(workspace.id, inbox.id, row.kind, amount, row.date)
                    .with_description(row.description.clone());
                unit.insert_transaction(txn.clone())?;
                imported.push(txn);
            }
            Ok(imported)
        });

        match &result {
            Ok(rows) => info!(workspace = %workspace_id.short(), count = rows.len(), "imported transactions"),
            Err(err) => warn!(workspace = %workspace_id.short(), error = %err, "import rejected"),
        }
        result
    }

    pub fn get(&self, id: TransactionId) -> LedgerResult<Option<Transaction>> {
        self.storage.read(|unit| unit.transaction(id))
    }

    /// Find a transaction of a workspace by full id or short form
    pub fn find(&self, workspace_id: WorkspaceId, identifier: &str) -> LedgerResult<Option<Transaction>> {
        if let Ok(id) = identifier.parse::<TransactionId>() {
            if let Some(txn) = self.get(id)? {
                if txn.workspace_id == workspace_id {
                    return Ok(Some(txn));
                }
            }
        }
        Ok(self
            .list(workspace_id, &TransactionFilter::new())?
            .into_iter()
            .find(|t| t.id.matches(identifier)))
    }

    /// Transactions of a workspace matching `filter`, newest first
    pub fn list(
        &self,
        workspace_id: WorkspaceId,
        filter: &TransactionFilter,
    ) -> LedgerResult<Vec<Transaction>> {
        self.storage.read(|unit| {
            unit.require_workspace(workspace_id)?;
            let matching = unit
                .transactions_in(workspace_id)?
                .into_iter()
                .filter(|t| filter.matches(t));
            Ok(match filter.limit {
                Some(limit) => matching.take(limit).collect(),
                None => matching.collect(),
            })
        })
    }
}

/// Split allocated income across buckets by their configured percentage.
///
/// Every non-inbox bucket with a percentage above zero gets
/// `round2(amount * pct / 100)`; whatever is left goes to the inbox.
/// Rounding each share on its own can overshoot `amount` by a few cents, and
/// those cents come off the last shares. Percentages adding up to more than
/// 100 are rejected.
pub fn allocate_income(
    unit: &UnitOfWork<'_>,
    workspace_id: WorkspaceId,
    amount: Money,
) -> LedgerResult<Vec<AllocationLeg>> {
    let inbox = resolve_inbox(unit, workspace_id)?;
    let receivers: Vec<Bucket> = unit
        .buckets_in(workspace_id)?
        .into_iter()
        .filter(Bucket::receives_allocation)
        .collect();

    let configured: Decimal = receivers
        .iter()
        .map(|b| b.allocation_percentage.value())
        .sum();
    if configured > Percentage::FULL.value() {
        return Err(LedgerError::InvalidOperation(format!(
            "Bucket allocations total {}%, more than 100%",
            configured.normalize()
        )));
    }

    let mut legs: Vec<AllocationLeg> = receivers
        .iter()
        .map(|b| AllocationLeg {
            bucket_id: b.id,
            amount: amount.percentage(b.allocation_percentage),
        })
        .collect();

    let overshoot = Money::checked_sum(legs.iter().map(|leg| leg.amount))
        .and_then(|allocated| allocated.checked_sub(amount))
        .ok_or_else(|| {
            LedgerError::InvalidOperation(format!("Income {} is too large to allocate", amount))
        })?;
    let mut excess = overshoot;
    for leg in legs.iter_mut().rev() {
        if !excess.is_positive() {
            break;
        }
        let cut = excess.min(leg.amount);
        leg.amount -= cut;
        excess -= cut;
    }
    legs.retain(|leg| !leg.amount.is_zero());

    let allocated: Money = legs.iter().map(|leg| leg.amount).sum();
    let remainder = amount - allocated;
    if !remainder.is_zero() {
        legs.push(AllocationLeg {
            bucket_id: inbox.id,
            amount: remainder,
        });
    }
    debug!(
        legs = legs.len(),
        trimmed = %overshoot.max(Money::zero()),
        remainder = %remainder,
        "allocated income"
    );
    Ok(legs)
}

/// All rows that must be deleted together with `txn`
fn linked_group(unit: &UnitOfWork<'_>, txn: &Transaction) -> LedgerResult<Vec<Transaction>> {
    match txn.link {
        None => Ok(vec![txn.clone()]),
        Some(TransactionLink::Transfer { counterpart }) => {
            let mut group = vec![txn.clone()];
            match unit.transaction(counterpart)? {
                Some(other) => group.push(other),
                None => warn!(id = %txn.id.short(), "transfer counterpart already missing"),
            }
            Ok(group)
        }
        Some(TransactionLink::Distribution { batch }) => Ok(unit
            .transactions_in(txn.workspace_id)?
            .into_iter()
            .filter(|t| t.distribution_batch() == Some(batch))
            .collect()),
    }
}

fn reverse_row(unit: &mut UnitOfWork<'_>, txn: &Transaction) -> LedgerResult<()> {
    let ws = txn.workspace_id;
    match (txn.is_internal_move(), txn.kind) {
        // Internal moves: give the debited bucket its money back, take it from the credited one
        (true, TransactionKind::Expense) => unit.credit(ws, txn.bucket_id, txn.amount),
        (true, TransactionKind::Income) => {
            unit.debit_checked(ws, txn.bucket_id, txn.amount).map(|_| ())
        }
        (false, TransactionKind::Expense) => unit.reverse_expense(ws, txn.bucket_id, txn.amount),
        (false, TransactionKind::Income) => {
            for (bucket_id, amount) in txn.bucket_effects() {
                unit.reverse_income(ws, bucket_id, amount)?;
            }
            Ok(())
        }
    }
}
