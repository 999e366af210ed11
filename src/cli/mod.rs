//! CLI command handlers
//!
//! Bridges the clap argument parsing with the service layer. Handlers take
//! names or ids as typed by the user and resolve them here.

pub mod audit;
pub mod bucket;
pub mod distribute;
pub mod transaction;
pub mod transfer;
pub mod workspace;

pub use audit::handle_audit_command;
pub use bucket::{handle_bucket_command, BucketCommands};
pub use distribute::handle_distribute_command;
pub use transaction::{handle_transaction_command, TransactionCommands};
pub use transfer::handle_transfer_command;
pub use workspace::{handle_workspace_command, WorkspaceCommands};

use std::collections::HashMap;

use chrono::NaiveDate;

use crate::error::{LedgerError, LedgerResult};
use crate::models::{Bucket, BucketId, Money, Workspace};
use crate::services::{BucketService, WorkspaceService};
use crate::storage::Storage;

/// Resolve `-w/--workspace`; without one, the only workspace there is
pub(crate) fn resolve_workspace(storage: &Storage, identifier: Option<&str>) -> LedgerResult<Workspace> {
    let service = WorkspaceService::new(storage);
    match identifier {
        Some(identifier) => service
            .find(identifier)?
            .ok_or_else(|| LedgerError::workspace_not_found(identifier)),
        None => {
            let mut all = service.list()?;
            match all.len() {
                1 => Ok(all.remove(0)),
                0 => Err(LedgerError::InvalidOperation(
                    "No workspaces yet. Create one with 'bucket workspace create <name>'".into(),
                )),
                n => Err(LedgerError::InvalidOperation(format!(
                    "{} workspaces exist; pick one with --workspace",
                    n
                ))),
            }
        }
    }
}

pub(crate) fn resolve_bucket(storage: &Storage, workspace: &Workspace, identifier: &str) -> LedgerResult<Bucket> {
    BucketService::new(storage)
        .find(workspace.id, identifier)?
        .ok_or_else(|| LedgerError::bucket_not_found(identifier))
}

/// Id to name lookup for register output
pub(crate) fn bucket_names(storage: &Storage, workspace: &Workspace) -> LedgerResult<HashMap<BucketId, String>> {
    Ok(BucketService::new(storage)
        .list(workspace.id)?
        .into_iter()
        .map(|b| (b.id, b.name))
        .collect())
}

pub(crate) fn parse_money(amount: &str) -> LedgerResult<Money> {
    Money::parse(amount).map_err(|e| {
        LedgerError::Validation(format!(
            "Invalid amount format: '{}'. Use format like '100.00' or '100'. Error: {}",
            amount, e
        ))
    })
}

pub(crate) fn parse_date(date: &str) -> LedgerResult<NaiveDate> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|_| LedgerError::Validation(format!("Invalid date format: '{}'. Use YYYY-MM-DD", date)))
}
