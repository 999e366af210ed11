//! CLI command handler for bucket transfers

use crate::display::format_transfer;
use crate::error::LedgerResult;
use crate::services::TransferService;
use crate::storage::Storage;

use super::{parse_money, resolve_bucket, resolve_workspace};

/// Handle the transfer command
pub fn handle_transfer_command(
    storage: &Storage,
    workspace: Option<&str>,
    from: &str,
    to: &str,
    amount: &str,
) -> LedgerResult<()> {
    let ws = resolve_workspace(storage, workspace)?;
    let source = resolve_bucket(storage, &ws, from)?;
    let destination = resolve_bucket(storage, &ws, to)?;
    let amount = parse_money(amount)?;

    let result = TransferService::new(storage).transfer(source.id, destination.id, amount)?;
    print!("{}", format_transfer(&result));
    Ok(())
}
