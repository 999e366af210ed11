//! Bucket CLI commands

use clap::Subcommand;

use crate::display::{format_bucket_details, format_bucket_list};
use crate::error::{LedgerError, LedgerResult};
use crate::models::{BucketKind, Percentage};
use crate::services::{BucketService, CreateBucketInput, UpdateBucketInput};
use crate::storage::Storage;

use super::{resolve_bucket, resolve_workspace};

/// Bucket subcommands
#[derive(Subcommand)]
pub enum BucketCommands {
    /// Create a bucket
    Create {
        /// Bucket name
        name: String,
        /// Bucket type (spending, investment)
        #[arg(short = 't', long = "type", default_value = "spending")]
        kind: String,
        /// Share of allocated income, e.g. "20" or "12.5%"
        #[arg(short, long, default_value = "0")]
        allocation: String,
        /// Workspace name or ID
        #[arg(short, long)]
        workspace: Option<String>,
    },
    /// List the buckets of a workspace
    List {
        #[arg(short, long)]
        workspace: Option<String>,
    },
    /// Show bucket details
    Show {
        /// Bucket name or ID
        bucket: String,
        #[arg(short, long)]
        workspace: Option<String>,
    },
    /// Edit a bucket
    Edit {
        /// Bucket name or ID
        bucket: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
        #[arg(short, long)]
        allocation: Option<String>,
        #[arg(short, long)]
        workspace: Option<String>,
    },
    /// Delete an empty bucket
    Delete {
        /// Bucket name or ID
        bucket: String,
        #[arg(short, long)]
        workspace: Option<String>,
    },
}

fn parse_kind(kind: &str) -> LedgerResult<BucketKind> {
    BucketKind::parse(kind).ok_or_else(|| {
        LedgerError::Validation(format!(
            "Invalid bucket type: '{}'. Valid types: spending, investment",
            kind
        ))
    })
}

fn parse_allocation(allocation: &str) -> LedgerResult<Percentage> {
    allocation
        .parse::<Percentage>()
        .map_err(|e| LedgerError::Validation(e.to_string()))
}

/// Handle a bucket command
pub fn handle_bucket_command(storage: &Storage, cmd: BucketCommands) -> LedgerResult<()> {
    let service = BucketService::new(storage);

    match cmd {
        BucketCommands::Create {
            name,
            kind,
            allocation,
            workspace,
        } => {
            let ws = resolve_workspace(storage, workspace.as_deref())?;
            let bucket = service.create(CreateBucketInput {
                workspace_id: ws.id,
                name,
                kind: parse_kind(&kind)?,
                allocation: parse_allocation(&allocation)?,
            })?;

            println!("Created bucket: {}", bucket.name);
            println!("  Type: {}", bucket.kind);
            println!("  Allocation: {}", bucket.allocation_percentage);
            println!("  ID: {}", bucket.id);
        }

        BucketCommands::List { workspace } => {
            let ws = resolve_workspace(storage, workspace.as_deref())?;
            println!("{}", ws);
            print!("{}", format_bucket_list(&service.list(ws.id)?));
        }

        BucketCommands::Show { bucket, workspace } => {
            let ws = resolve_workspace(storage, workspace.as_deref())?;
            let found = resolve_bucket(storage, &ws, &bucket)?;
            let count = storage.transactions.get_by_bucket(found.id)?.len();
            print!("{}", format_bucket_details(&found, count));
        }

        BucketCommands::Edit {
            bucket,
            name,
            kind,
            allocation,
            workspace,
        } => {
            let ws = resolve_workspace(storage, workspace.as_deref())?;
            let found = resolve_bucket(storage, &ws, &bucket)?;
            if name.is_none() && kind.is_none() && allocation.is_none() {
                println!("No changes specified. Use --name, --type or --allocation.");
                return Ok(());
            }

            let updated = service.update(
                found.id,
                UpdateBucketInput {
                    name,
                    kind: kind.as_deref().map(parse_kind).transpose()?,
                    allocation: allocation.as_deref().map(parse_allocation).transpose()?,
                    is_default: None,
                },
            )?;
            println!("Updated bucket: {}", updated.name);
        }

        BucketCommands::Delete { bucket, workspace } => {
            let ws = resolve_workspace(storage, workspace.as_deref())?;
            let found = resolve_bucket(storage, &ws, &bucket)?;
            let deleted = service.delete(found.id)?;
            println!("Deleted bucket: {}", deleted.name);
        }
    }

    Ok(())
}
