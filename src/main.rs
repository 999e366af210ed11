use anyhow::Result;
use clap::{Parser, Subcommand};

use bucket_ledger::cli::{
    handle_audit_command, handle_bucket_command, handle_distribute_command,
    handle_transaction_command, handle_transfer_command, handle_workspace_command,
    BucketCommands, TransactionCommands, WorkspaceCommands,
};
use bucket_ledger::config::{LedgerPaths, Settings};
use bucket_ledger::logging::init_logging;
use bucket_ledger::storage::Storage;

#[derive(Parser)]
#[command(
    name = "bucket",
    version,
    about = "Bucket-based cash ledger",
    long_about = "Keeps money in named buckets inside currency workspaces. Post income \
                  and expenses, split income by allocation percentage, and move money \
                  between buckets with transfers and distributions."
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Workspace management commands
    #[command(subcommand, alias = "ws")]
    Workspace(WorkspaceCommands),

    /// Bucket management commands
    #[command(subcommand)]
    Bucket(BucketCommands),

    /// Transaction management commands
    #[command(subcommand, alias = "transaction")]
    Txn(TransactionCommands),

    /// Move a fixed amount between two buckets
    Transfer {
        /// Source bucket name or ID
        from: String,
        /// Destination bucket name or ID
        to: String,
        /// Amount, e.g. "100.00"
        amount: String,
        #[arg(short, long)]
        workspace: Option<String>,
    },

    /// Spread part of a bucket's balance across other buckets
    Distribute {
        /// Source bucket name or ID
        source: String,
        /// Basis amount for percentage targets
        amount: String,
        /// Target as NAME=AMOUNT or NAME=PERCENT%; repeatable. Omit to use configured percentages.
        #[arg(long = "to", value_name = "TARGET")]
        targets: Vec<String>,
        #[arg(short, long)]
        workspace: Option<String>,
    },

    /// Show recent audit log entries
    Audit {
        /// Only entries for this workspace
        #[arg(short, long)]
        workspace: Option<String>,
        /// Number of entries to show
        #[arg(short, long, default_value = "20")]
        limit: usize,
    },

    /// Initialize the data directory and settings
    Init,

    /// Show current configuration and paths
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let paths = LedgerPaths::new()?;
    let settings = Settings::load_or_create(&paths)?;
    if !paths.is_initialized() {
        // Persist the generated local user id so ownership is stable across runs
        settings.save(&paths)?;
    }
    init_logging(&settings);

    let storage = Storage::open(paths.clone())?;

    match cli.command {
        Some(Commands::Workspace(cmd)) => {
            handle_workspace_command(&storage, &settings, cmd)?;
        }
        Some(Commands::Bucket(cmd)) => {
            handle_bucket_command(&storage, cmd)?;
        }
        Some(Commands::Txn(cmd)) => {
            handle_transaction_command(&storage, cmd)?;
        }
        Some(Commands::Transfer {
            from,
            to,
            amount,
            workspace,
        }) => {
            handle_transfer_command(&storage, workspace.as_deref(), &from, &to, &amount)?;
        }
        Some(Commands::Distribute {
            source,
            amount,
            targets,
            workspace,
        }) => {
            handle_distribute_command(&storage, workspace.as_deref(), &source, &amount, &targets)?;
        }
        Some(Commands::Audit { workspace, limit }) => {
            handle_audit_command(&storage, workspace.as_deref(), limit)?;
        }
        Some(Commands::Init) => {
            println!("Initializing bucket-ledger at: {}", paths.base_dir().display());
            paths.ensure_directories()?;
            settings.save(&paths)?;
            println!("Initialization complete!");
            println!();
            println!("Run 'bucket workspace create <name>' to create your first workspace.");
        }
        Some(Commands::Config) => {
            println!("bucket-ledger Configuration");
            println!("===========================");
            println!("Base directory:  {}", paths.base_dir().display());
            println!("Ledger file:     {}", paths.ledger_file().display());
            println!("Audit log:       {}", paths.audit_log().display());
            println!();
            println!("Settings:");
            println!("  Default currency: {}", settings.default_currency);
            println!("  Inbox name:       {}", settings.inbox_name);
            println!("  Log level:        {}", settings.log_level);
            println!("  Local user:       {}", settings.local_user);
        }
        None => {
            println!("bucket - bucket-based cash ledger");
            println!();
            println!("Run 'bucket --help' for usage information.");
        }
    }

    Ok(())
}
