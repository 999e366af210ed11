//! Transaction CLI commands
//!
//! Posting, listing, deleting and bulk-importing income and expense rows.

use std::path::PathBuf;

use clap::Subcommand;

use crate::display::{format_transaction_details, format_transaction_register};
use crate::error::{LedgerError, LedgerResult};
use crate::models::TransactionKind;
use crate::services::{ImportRow, PostTransactionInput, TransactionFilter, TransactionService};
use crate::storage::{read_json_required, Storage};

use super::{bucket_names, parse_date, parse_money, resolve_bucket, resolve_workspace};

/// Transaction subcommands
#[derive(Subcommand)]
pub enum TransactionCommands {
    /// Post income or an expense
    Add {
        /// income or expense
        kind: String,
        /// Amount, e.g. "42.50"
        amount: String,
        /// Target bucket (defaults to the inbox)
        #[arg(short, long)]
        bucket: Option<String>,
        #[arg(short = 'm', long)]
        description: Option<String>,
        /// Transaction date (YYYY-MM-DD)
        #[arg(short, long)]
        date: Option<String>,
        /// Split income across buckets by their allocation percentage
        #[arg(short, long)]
        allocate: bool,
        #[arg(short, long)]
        workspace: Option<String>,
    },
    /// List transactions, newest first
    List {
        /// Only rows touching this bucket
        #[arg(short, long)]
        bucket: Option<String>,
        /// Only income or only expense rows
        #[arg(short = 't', long = "type")]
        kind: Option<String>,
        /// Start date (YYYY-MM-DD)
        #[arg(long)]
        from: Option<String>,
        /// End date (YYYY-MM-DD)
        #[arg(long)]
        to: Option<String>,
        /// Number of transactions to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
        #[arg(short, long)]
        workspace: Option<String>,
    },
    /// Show transaction details
    Show {
        /// Transaction ID or short ID
        transaction: String,
        #[arg(short, long)]
        workspace: Option<String>,
    },
    /// Delete a transaction, reversing its balance effect
    Delete {
        /// Transaction ID or short ID
        transaction: String,
        #[arg(short, long)]
        workspace: Option<String>,
    },
    /// Post a JSON array of {date, description, amount, type} rows to the inbox
    Import {
        /// Path to the JSON file
        file: PathBuf,
        #[arg(short, long)]
        workspace: Option<String>,
    },
}

fn parse_kind(kind: &str) -> LedgerResult<TransactionKind> {
    TransactionKind::parse(kind).ok_or_else(|| {
        LedgerError::Validation(format!(
            "Invalid transaction type: '{}'. Use income or expense",
            kind
        ))
    })
}

/// Handle a transaction command
pub fn handle_transaction_command(storage: &Storage, cmd: TransactionCommands) -> LedgerResult<()> {
    let service = TransactionService::new(storage);

    match cmd {
        TransactionCommands::Add {
            kind,
            amount,
            bucket,
            description,
            date,
            allocate,
            workspace,
        } => {
            let ws = resolve_workspace(storage, workspace.as_deref())?;
            let kind = parse_kind(&kind)?;
            if allocate && kind == TransactionKind::Expense {
                return Err(LedgerError::InvalidOperation(
                    "--allocate only applies to income".into(),
                ));
            }
            let bucket_id = match bucket {
                Some(name) => Some(resolve_bucket(storage, &ws, &name)?.id),
                None => None,
            };

            let txn = service.post(PostTransactionInput {
                workspace_id: ws.id,
                bucket_id,
                amount: parse_money(&amount)?,
                kind,
                description: description.unwrap_or_default(),
                date: date.as_deref().map(parse_date).transpose()?,
                is_allocated: allocate,
            })?;

            println!("Posted {} of {} ({})", txn.kind, ws.format(txn.amount), txn.id.short());
            if !txn.allocations.is_empty() {
                let names = bucket_names(storage, &ws)?;
                for leg in &txn.allocations {
                    let name = names.get(&leg.bucket_id).map(String::as_str).unwrap_or("?");
                    println!("  {:>12} -> {}", leg.amount.to_string(), name);
                }
            }
        }

        TransactionCommands::List {
            bucket,
            kind,
            from,
            to,
            limit,
            workspace,
        } => {
            let ws = resolve_workspace(storage, workspace.as_deref())?;
            let mut filter = TransactionFilter::new().limit(limit);
            if let Some(name) = bucket {
                filter = filter.bucket(resolve_bucket(storage, &ws, &name)?.id);
            }
            if let Some(kind) = kind {
                filter = filter.kind(parse_kind(&kind)?);
            }
            filter.start_date = from.as_deref().map(parse_date).transpose()?;
            filter.end_date = to.as_deref().map(parse_date).transpose()?;

            let transactions = service.list(ws.id, &filter)?;
            print!(
                "{}",
                format_transaction_register(&transactions, &bucket_names(storage, &ws)?)
            );
        }

        TransactionCommands::Show {
            transaction,
            workspace,
        } => {
            let ws = resolve_workspace(storage, workspace.as_deref())?;
            let txn = service
                .find(ws.id, &transaction)?
                .ok_or_else(|| LedgerError::transaction_not_found(&transaction))?;
            print!(
                "{}",
                format_transaction_details(&txn, &bucket_names(storage, &ws)?)
            );
        }

        TransactionCommands::Delete {
            transaction,
            workspace,
        } => {
            let ws = resolve_workspace(storage, workspace.as_deref())?;
            let txn = service
                .find(ws.id, &transaction)?
                .ok_or_else(|| LedgerError::transaction_not_found(&transaction))?;
            let removed = service.delete(txn.id)?;
            println!("Deleted {} transaction(s):", removed.len());
            for row in &removed {
                println!("  {} {} {}", row.id.short(), row.kind, row.amount);
            }
        }

        TransactionCommands::Import { file, workspace } => {
            let ws = resolve_workspace(storage, workspace.as_deref())?;
            let rows: Vec<ImportRow> = read_json_required(&file)?;
            let imported = service.import(ws.id, &rows)?;
            println!(
                "Imported {} transaction(s) into {}",
                imported.len(),
                ws.name
            );
        }
    }

    Ok(())
}
