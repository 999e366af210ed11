//! Bucket display formatting
//!
//! Formats buckets for terminal output in table and detail views, and the
//! per-target summary printed after a distribution.

use crate::models::{Bucket, Money};
use crate::services::DistributionOutcome;

/// Format a workspace's buckets as a table with a total row
pub fn format_bucket_list(buckets: &[Bucket]) -> String {
    if buckets.is_empty() {
        return "No buckets found.".to_string();
    }

    let name_width = buckets
        .iter()
        .map(|b| b.name.chars().count())
        .max()
        .unwrap_or(4)
        .max(5);

    let mut output = String::new();
    output.push_str(&format!(
        "{:<name_width$}  {:<10}  {:>7}  {:>12}  {:>12}  {:>12}\n",
        "Name",
        "Type",
        "Alloc",
        "Balance",
        "Allocated",
        "Spent",
        name_width = name_width,
    ));
    let separator = format!(
        "{:-<name_width$}  {:-<10}  {:->7}  {:->12}  {:->12}  {:->12}\n",
        "",
        "",
        "",
        "",
        "",
        "",
        name_width = name_width,
    );
    output.push_str(&separator);

    for bucket in buckets {
        let alloc = if bucket.is_inbox() {
            "-".to_string()
        } else {
            bucket.allocation_percentage.to_string()
        };
        output.push_str(&format!(
            "{:<name_width$}  {:<10}  {:>7}  {:>12}  {:>12}  {:>12}\n",
            bucket.name,
            bucket.kind.to_string(),
            alloc,
            bucket.current_balance.to_string(),
            bucket.total_allocated.to_string(),
            bucket.total_spent.to_string(),
            name_width = name_width,
        ));
    }

    let total: Money = buckets.iter().map(|b| b.current_balance).sum();
    output.push_str(&separator);
    output.push_str(&format!(
        "{:<name_width$}  {:<10}  {:>7}  {:>12}\n",
        "TOTAL",
        "",
        "",
        total.to_string(),
        name_width = name_width,
    ));

    output
}

pub fn format_bucket_details(bucket: &Bucket, transaction_count: usize) -> String {
    let mut output = String::new();

    output.push_str(&format!("Bucket: {}\n", bucket.name));
    output.push_str(&format!("  ID:          {}\n", bucket.id));
    output.push_str(&format!("  Type:        {}\n", bucket.kind));
    if bucket.is_inbox() {
        output.push_str("  Default:     Yes (inbox)\n");
    } else {
        output.push_str(&format!("  Allocation:  {}\n", bucket.allocation_percentage));
    }
    output.push('\n');
    output.push_str(&format!("  Balance:     {}\n", bucket.current_balance));
    output.push_str(&format!("  Allocated:   {}\n", bucket.total_allocated));
    output.push_str(&format!("  Spent:       {}\n", bucket.total_spent));
    output.push_str(&format!("  Transactions: {}\n", transaction_count));

    output
}

pub fn format_distribution_outcome(outcome: &DistributionOutcome) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Distributed {} from {} ({} -> {})\n",
        outcome.total_distributed, outcome.source.name, outcome.source_before, outcome.source_after
    ));

    if outcome.receipts.is_empty() {
        output.push_str("  Nothing to distribute.\n");
    }
    for receipt in &outcome.receipts {
        output.push_str(&format!(
            "  + {:>12}  {}  (now {})\n",
            receipt.amount.to_string(),
            receipt.name,
            receipt.current_balance
        ));
    }
    if !outcome.remainder.is_zero() {
        output.push_str(&format!(
            "  Remainder {} stays in {}\n",
            outcome.remainder, outcome.source.name
        ));
    }

    output
}
