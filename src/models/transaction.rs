//! Transaction model
//!
//! Every balance change in the ledger is explained by a transaction row.
//! Amounts are always positive; the kind decides the direction.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::ids::{BucketId, DistributionId, TransactionId, WorkspaceId};
use super::money::Money;

/// Direction of a transaction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum TransactionKind {
    Income,
    Expense,
}

impl TransactionKind {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "income" | "in" => Some(Self::Income),
            "expense" | "out" => Some(Self::Expense),
            _ => None,
        }
    }
}

impl fmt::Display for TransactionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Income => write!(f, "INCOME"),
            Self::Expense => write!(f, "EXPENSE"),
        }
    }
}

/// One credit applied by an auto-allocated income posting
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AllocationLeg {
    pub bucket_id: BucketId,
    pub amount: Money,
}

/// Rows written together by one internal money movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum TransactionLink {
    /// One leg of a transfer; points at the other leg
    Transfer { counterpart: TransactionId },
    /// One row of a distribution batch
    Distribution { batch: DistributionId },
}

/// A ledger transaction
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: TransactionId,

    pub workspace_id: WorkspaceId,

    /// Always a concrete bucket; omitted buckets resolve to the inbox
    pub bucket_id: BucketId,

    /// Strictly positive
    pub amount: Money,

    #[serde(rename = "type")]
    pub kind: TransactionKind,

    #[serde(default)]
    pub description: String,

    pub date: NaiveDate,

    /// True when this row was produced by percentage fan-out or an internal move
    #[serde(default)]
    pub is_allocated: bool,

    /// Credits actually applied by an auto-allocated income posting
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allocations: Vec<AllocationLeg>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<TransactionLink>,

    pub created_at: DateTime<Utc>,
}

impl Transaction {
    pub fn new(
        workspace_id: WorkspaceId,
        bucket_id: BucketId,
        kind: TransactionKind,
        amount: Money,
        date: NaiveDate,
    ) -> Self {
        Self {
            id: TransactionId::new(),
            workspace_id,
            bucket_id,
            amount,
            kind,
            description: String::new(),
            date,
            is_allocated: false,
            allocations: Vec::new(),
            link: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    pub fn is_income(&self) -> bool {
        self.kind == TransactionKind::Income
    }

    pub fn is_expense(&self) -> bool {
        self.kind == TransactionKind::Expense
    }

    /// True for rows written by a transfer or distribution
    pub fn is_internal_move(&self) -> bool {
        self.link.is_some()
    }

    pub fn transfer_counterpart(&self) -> Option<TransactionId> {
        match self.link {
            Some(TransactionLink::Transfer { counterpart }) => Some(counterpart),
            _ => None,
        }
    }

    pub fn distribution_batch(&self) -> Option<DistributionId> {
        match self.link {
            Some(TransactionLink::Distribution { batch }) => Some(batch),
            _ => None,
        }
    }

    /// Balance change this row applied to its buckets, as (bucket, signed amount)
    pub fn bucket_effects(&self) -> Vec<(BucketId, Money)> {
        match self.kind {
            TransactionKind::Expense => vec![(self.bucket_id, -self.amount)],
            TransactionKind::Income if !self.allocations.is_empty() => self
                .allocations
                .iter()
                .map(|leg| (leg.bucket_id, leg.amount))
                .collect(),
            TransactionKind::Income => vec![(self.bucket_id, self.amount)],
        }
    }

    /// Effect on the workspace total; internal moves leave it unchanged
    pub fn workspace_effect(&self) -> Money {
        if self.is_internal_move() {
            return Money::zero();
        }
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }

    pub fn validate(&self) -> Result<(), TransactionValidationError> {
        if !self.amount.is_positive() {
            return Err(TransactionValidationError::NonPositiveAmount(self.amount));
        }
        if !self.allocations.is_empty() {
            if self.kind != TransactionKind::Income {
                return Err(TransactionValidationError::AllocatedExpense);
            }
            match Money::checked_sum(self.allocations.iter().map(|leg| leg.amount)) {
                Some(legs) if legs == self.amount => {}
                Some(legs) => {
                    return Err(TransactionValidationError::AllocationMismatch {
                        amount: self.amount,
                        legs,
                    })
                }
                None => return Err(TransactionValidationError::AllocationOverflow),
            }
        }
        Ok(())
    }
}

impl fmt::Display for Transaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {} {} {}",
            self.date, self.kind, self.amount, self.description
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransactionValidationError {
    NonPositiveAmount(Money),
    AllocatedExpense,
    AllocationMismatch { amount: Money, legs: Money },
    AllocationOverflow,
}

impl fmt::Display for TransactionValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositiveAmount(amount) => {
                write!(f, "Transaction amount must be positive, got {}", amount)
            }
            Self::AllocatedExpense => write!(f, "Expenses cannot carry allocation legs"),
            Self::AllocationMismatch { amount, legs } => write!(
                f,
                "Allocation legs sum to {} but the transaction amount is {}",
                legs, amount
            ),
            Self::AllocationOverflow => write!(f, "Allocation legs overflow the amount range"),
        }
    }
}

impl std::error::Error for TransactionValidationError {}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_plain_income_effects() {
        let bucket = BucketId::new();
        let txn = Transaction::new(
            WorkspaceId::new(),
            bucket,
            TransactionKind::Income,
            Money::from_cents(5000),
            test_date(),
        );
        assert_eq!(txn.bucket_effects(), vec![(bucket, Money::from_cents(5000))]);
        assert_eq!(txn.workspace_effect(), Money::from_cents(5000));
        assert!(txn.validate().is_ok());
    }

    #[test]
    fn test_expense_effects() {
        let bucket = BucketId::new();
        let txn = Transaction::new(
            WorkspaceId::new(),
            bucket,
            TransactionKind::Expense,
            Money::from_cents(5000),
            test_date(),
        );
        assert_eq!(txn.bucket_effects(), vec![(bucket, Money::from_cents(-5000))]);
        assert_eq!(txn.workspace_effect(), Money::from_cents(-5000));
    }

    #[test]
    fn test_allocated_income_effects() {
        let inbox = BucketId::new();
        let food = BucketId::new();
        let mut txn = Transaction::new(
            WorkspaceId::new(),
            inbox,
            TransactionKind::Income,
            Money::from_units(1000),
            test_date(),
        );
        txn.is_allocated = true;
        txn.allocations = vec![
            AllocationLeg {
                bucket_id: food,
                amount: Money::from_units(200),
            },
            AllocationLeg {
                bucket_id: inbox,
                amount: Money::from_units(800),
            },
        ];
        assert!(txn.validate().is_ok());
        assert_eq!(txn.bucket_effects().len(), 2);

        txn.allocations[1].amount = Money::from_units(700);
        assert!(matches!(
            txn.validate(),
            Err(TransactionValidationError::AllocationMismatch { .. })
        ));
    }

    #[test]
    fn test_internal_move_leaves_workspace_total() {
        let mut txn = Transaction::new(
            WorkspaceId::new(),
            BucketId::new(),
            TransactionKind::Expense,
            Money::from_cents(100),
            test_date(),
        );
        txn.link = Some(TransactionLink::Distribution {
            batch: DistributionId::new(),
        });
        assert!(txn.is_internal_move());
        assert!(txn.workspace_effect().is_zero());
        assert!(txn.distribution_batch().is_some());
        assert!(txn.transfer_counterpart().is_none());
    }

    #[test]
    fn test_rejects_non_positive_amount() {
        let txn = Transaction::new(
            WorkspaceId::new(),
            BucketId::new(),
            TransactionKind::Income,
            Money::zero(),
            test_date(),
        );
        assert!(matches!(
            txn.validate(),
            Err(TransactionValidationError::NonPositiveAmount(_))
        ));
    }

    #[test]
    fn test_serialized_shape() {
        let txn = Transaction::new(
            WorkspaceId::new(),
            BucketId::new(),
            TransactionKind::Income,
            Money::from_cents(100),
            test_date(),
        );
        let value = serde_json::to_value(&txn).unwrap();
        assert_eq!(value["type"], "INCOME");
        assert_eq!(value["amount"], 100);
        assert!(value.get("allocations").is_none());
        assert!(value.get("link").is_none());

        let back: Transaction = serde_json::from_value(value).unwrap();
        assert_eq!(back, txn);
    }
}
