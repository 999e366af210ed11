//! Transaction display formatting
//!
//! Register views and detail output for transaction rows.

use std::collections::HashMap;

use crate::models::{BucketId, Money, Transaction, TransactionKind, TransactionLink};
use crate::services::TransferResult;

use super::truncate;

fn link_marker(txn: &Transaction) -> &'static str {
    match txn.link {
        Some(TransactionLink::Transfer { .. }) => "⇄",
        Some(TransactionLink::Distribution { .. }) => "⇉",
        None if txn.is_allocated => "%",
        None => " ",
    }
}

/// Signed amount as seen from the bucket: expenses negative
fn signed_amount(txn: &Transaction) -> Money {
    match txn.kind {
        TransactionKind::Income => txn.amount,
        TransactionKind::Expense => -txn.amount,
    }
}

/// Format one register row; `bucket_names` maps ids to display names
pub fn format_transaction_row(txn: &Transaction, bucket_names: &HashMap<BucketId, String>) -> String {
    let bucket = bucket_names
        .get(&txn.bucket_id)
        .cloned()
        .unwrap_or_else(|| txn.bucket_id.short());
    let description = if txn.description.is_empty() {
        "(no description)"
    } else {
        &txn.description
    };

    format!(
        "{} {:<12} {} {} {} {:>12}",
        link_marker(txn),
        txn.id.short(),
        txn.date.format("%Y-%m-%d"),
        truncate(&bucket, 14),
        truncate(description, 30),
        signed_amount(txn).to_string()
    )
}

/// Format a list of transactions as a register
pub fn format_transaction_register(
    transactions: &[Transaction],
    bucket_names: &HashMap<BucketId, String>,
) -> String {
    if transactions.is_empty() {
        return "No transactions found.\n".to_string();
    }

    let mut output = String::new();
    output.push_str(&format!(
        "  {:<12} {:10} {:14} {:30} {:>12}\n",
        "ID", "Date", "Bucket", "Description", "Amount"
    ));
    output.push_str(&"-".repeat(84));
    output.push('\n');

    for txn in transactions {
        output.push_str(&format_transaction_row(txn, bucket_names));
        output.push('\n');
    }

    output
}

/// Format transaction details for display
pub fn format_transaction_details(
    txn: &Transaction,
    bucket_names: &HashMap<BucketId, String>,
) -> String {
    let name = |id: &BucketId| bucket_names.get(id).cloned().unwrap_or_else(|| id.short());
    let mut output = String::new();

    output.push_str(&format!("Transaction: {}\n", txn.id));
    output.push_str(&format!("Date:        {}\n", txn.date.format("%Y-%m-%d")));
    output.push_str(&format!("Type:        {}\n", txn.kind));
    output.push_str(&format!("Amount:      {}\n", txn.amount));
    output.push_str(&format!("Bucket:      {}\n", name(&txn.bucket_id)));

    if !txn.description.is_empty() {
        output.push_str(&format!("Description: {}\n", txn.description));
    }

    match txn.link {
        Some(TransactionLink::Transfer { counterpart }) => {
            output.push_str(&format!("Transfer:    paired with {}\n", counterpart.short()));
        }
        Some(TransactionLink::Distribution { batch }) => {
            output.push_str(&format!("Distribution: batch {}\n", batch.short()));
        }
        None => {}
    }

    if !txn.allocations.is_empty() {
        output.push_str("\nAllocations:\n");
        for (i, leg) in txn.allocations.iter().enumerate() {
            output.push_str(&format!(
                "  {}. {:>12} to {}\n",
                i + 1,
                leg.amount.to_string(),
                name(&leg.bucket_id)
            ));
        }
    }

    output
}

pub fn format_transfer(result: &TransferResult) -> String {
    format!(
        "Transferred {} from {} to {}\n  {}: {}\n  {}: {}\n",
        result.outflow.amount,
        result.source.name,
        result.destination.name,
        result.source.name,
        result.source.current_balance,
        result.destination.name,
        result.destination.current_balance,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AllocationLeg, WorkspaceId};
    use chrono::NaiveDate;

    fn sample(kind: TransactionKind) -> Transaction {
        Transaction::new(
            WorkspaceId::new(),
            BucketId::new(),
            kind,
            Money::from_cents(4_250),
            NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
        )
        .with_description("Groceries")
    }

    #[test]
    fn test_register_shows_signed_amounts() {
        let expense = sample(TransactionKind::Expense);
        let mut names = HashMap::new();
        names.insert(expense.bucket_id, "Food".to_string());

        let output = format_transaction_register(&[expense], &names);
        assert!(output.contains("2025-03-14"));
        assert!(output.contains("Food"));
        assert!(output.contains("-42.50"));
    }

    #[test]
    fn test_empty_register() {
        assert_eq!(
            format_transaction_register(&[], &HashMap::new()),
            "No transactions found.\n"
        );
    }

    #[test]
    fn test_details_list_allocation_legs() {
        let mut income = sample(TransactionKind::Income);
        let food = BucketId::new();
        income.is_allocated = true;
        income.allocations = vec![
            AllocationLeg {
                bucket_id: food,
                amount: Money::from_cents(850),
            },
            AllocationLeg {
                bucket_id: income.bucket_id,
                amount: Money::from_cents(3_400),
            },
        ];
        let mut names = HashMap::new();
        names.insert(food, "Food".to_string());

        let output = format_transaction_details(&income, &names);
        assert!(output.contains("Allocations:"));
        assert!(output.contains("8.50 to Food"));
        assert!(output.contains(&income.bucket_id.short()));
    }
}
