//! Workspace CLI commands

use clap::Subcommand;

use crate::config::Settings;
use crate::display::{format_balance_report, format_workspace_details, format_workspace_list};
use crate::error::LedgerResult;
use crate::services::WorkspaceService;
use crate::storage::Storage;

use super::resolve_workspace;

/// Workspace subcommands
#[derive(Subcommand)]
pub enum WorkspaceCommands {
    /// Create a workspace with its inbox bucket
    Create {
        /// Workspace name
        name: String,
        /// ISO currency code (defaults to the configured currency)
        #[arg(short, long)]
        currency: Option<String>,
    },
    /// List workspaces
    List {
        /// Only workspaces owned by the local user
        #[arg(short, long)]
        mine: bool,
    },
    /// Show workspace details
    Show {
        /// Workspace name or ID
        workspace: String,
    },
    /// Rename a workspace or change its currency
    Edit {
        /// Workspace name or ID
        workspace: String,
        #[arg(short, long)]
        name: Option<String>,
        #[arg(short, long)]
        currency: Option<String>,
    },
    /// Delete a workspace with all of its buckets and transactions
    Delete {
        /// Workspace name or ID
        workspace: String,
        /// Required; the delete cannot be undone
        #[arg(long)]
        force: bool,
    },
    /// Verify the recorded total and the single-inbox rule
    Check {
        /// Workspace name or ID
        workspace: Option<String>,
    },
}

/// Handle a workspace command
pub fn handle_workspace_command(
    storage: &Storage,
    settings: &Settings,
    cmd: WorkspaceCommands,
) -> LedgerResult<()> {
    let service = WorkspaceService::new(storage).with_inbox_name(settings.inbox_name.as_str());

    match cmd {
        WorkspaceCommands::Create { name, currency } => {
            let currency = currency.unwrap_or_else(|| settings.default_currency.clone());
            let ws = service.create(settings.local_user, &name, &currency)?;
            println!("Created workspace: {}", ws);
            println!("  Inbox: {}", settings.inbox_name);
            println!("  ID: {}", ws.id);
        }

        WorkspaceCommands::List { mine } => {
            let workspaces = if mine {
                service.list_for_owner(settings.local_user)?
            } else {
                service.list()?
            };
            print!("{}", format_workspace_list(&workspaces));
            if workspaces.is_empty() {
                println!();
            }
        }

        WorkspaceCommands::Show { workspace } => {
            let ws = resolve_workspace(storage, Some(&workspace))?;
            let bucket_count = storage.buckets.get_by_workspace(ws.id)?.len();
            print!("{}", format_workspace_details(&ws, bucket_count));
        }

        WorkspaceCommands::Edit {
            workspace,
            name,
            currency,
        } => {
            let ws = resolve_workspace(storage, Some(&workspace))?;
            if name.is_none() && currency.is_none() {
                println!("No changes specified. Use --name or --currency.");
                return Ok(());
            }
            let updated = service.update(ws.id, name.as_deref(), currency.as_deref())?;
            println!("Updated workspace: {}", updated);
        }

        WorkspaceCommands::Delete { workspace, force } => {
            let ws = resolve_workspace(storage, Some(&workspace))?;
            if !force {
                println!(
                    "Deleting '{}' removes all of its buckets and transactions. Re-run with --force.",
                    ws.name
                );
                return Ok(());
            }
            let deleted = service.delete(ws.id)?;
            println!("Deleted workspace: {}", deleted.name);
        }

        WorkspaceCommands::Check { workspace } => {
            let ws = resolve_workspace(storage, workspace.as_deref())?;
            let report = service.reconcile(ws.id)?;
            print!("{}", format_balance_report(&ws, &report));
        }
    }

    Ok(())
}
