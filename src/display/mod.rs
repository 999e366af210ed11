//! Display formatting for terminal output
//!
//! Formats workspaces, buckets, transactions and operation results as
//! plain-text tables and detail views.

pub mod bucket;
pub mod transaction;
pub mod workspace;

pub use bucket::{format_bucket_details, format_bucket_list, format_distribution_outcome};
pub use transaction::{format_transaction_details, format_transaction_register, format_transfer};
pub use workspace::{format_balance_report, format_workspace_details, format_workspace_list};

/// Pad or cut a string to exactly `max_len` characters
pub(crate) fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        format!("{:width$}", s, width = max_len)
    } else {
        let cut: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}
