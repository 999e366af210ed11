//! Distribution calculator
//!
//! Pure share computation for spreading a total across targets. Bucket
//! existence and ownership are validated by the caller.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::ids::BucketId;
use super::money::Money;
use crate::error::{LedgerError, LedgerResult};

/// A requested share: either a percentage of the total or a fixed amount
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionTarget {
    pub bucket_id: BucketId,
    /// Percent (e.g. 20 for 20%) or currency units, depending on `is_percentage`
    pub value: Decimal,
    pub is_percentage: bool,
}

impl DistributionTarget {
    pub fn percentage(bucket_id: BucketId, value: Decimal) -> Self {
        Self {
            bucket_id,
            value,
            is_percentage: true,
        }
    }

    pub fn fixed(bucket_id: BucketId, value: Decimal) -> Self {
        Self {
            bucket_id,
            value,
            is_percentage: false,
        }
    }
}

/// Computed amount for one target
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionShare {
    pub bucket_id: BucketId,
    pub amount: Money,
}

/// Compute each target's share of `total`, in input order.
///
/// Percentage shares are `round2(total * value / 100)`, fixed shares are
/// `round2(value)`. Shares are independent of each other, so their sum may
/// differ from `total` in either direction.
pub fn calculate_distribution(
    total: Money,
    targets: &[DistributionTarget],
) -> LedgerResult<Vec<DistributionShare>> {
    targets
        .iter()
        .map(|target| {
            let amount = if target.is_percentage {
                total.scaled_by_percent(target.value)
            } else {
                Money::from_decimal(target.value)
            }
            .ok_or_else(|| {
                LedgerError::InvalidOperation(format!(
                    "Share for bucket {} is out of range",
                    target.bucket_id.short()
                ))
            })?;

            Ok(DistributionShare {
                bucket_id: target.bucket_id,
                amount,
            })
        })
        .collect()
}

/// Sum of all shares; fails instead of wrapping when the sum leaves the cent range
pub fn total_distributed(shares: &[DistributionShare]) -> LedgerResult<Money> {
    Money::checked_sum(shares.iter().map(|s| s.amount)).ok_or_else(|| {
        LedgerError::InvalidOperation("Distribution shares add up to more than a ledger can hold".into())
    })
}

pub fn remainder(total: Money, distributed: Money) -> Money {
    total - distributed
}
