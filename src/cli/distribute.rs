//! CLI command handler for distributions
//!
//! Targets are given as `--to NAME=VALUE`, where a trailing `%` marks a
//! percentage of the amount and anything else is a fixed share. With no
//! targets the configured bucket percentages are used.

use rust_decimal::Decimal;
use std::str::FromStr;

use crate::display::format_distribution_outcome;
use crate::error::{LedgerError, LedgerResult};
use crate::models::{DistributionTarget, Workspace};
use crate::services::{DistributeInput, DistributionService};
use crate::storage::Storage;

use super::{parse_money, resolve_bucket, resolve_workspace};

/// Parse one `NAME=VALUE[%]` target
fn parse_target(storage: &Storage, workspace: &Workspace, text: &str) -> LedgerResult<DistributionTarget> {
    let (name, value) = text.rsplit_once('=').ok_or_else(|| {
        LedgerError::Validation(format!(
            "Invalid target '{}'. Use NAME=AMOUNT or NAME=PERCENT%",
            text
        ))
    })?;
    let bucket = resolve_bucket(storage, workspace, name.trim())?;

    let value = value.trim();
    let (number, is_percentage) = match value.strip_suffix('%') {
        Some(number) => (number.trim(), true),
        None => (value, false),
    };
    let number = Decimal::from_str(number)
        .map_err(|_| LedgerError::Validation(format!("Invalid target value: '{}'", value)))?;

    Ok(if is_percentage {
        DistributionTarget::percentage(bucket.id, number)
    } else {
        DistributionTarget::fixed(bucket.id, number)
    })
}

/// Handle the distribute command
pub fn handle_distribute_command(
    storage: &Storage,
    workspace: Option<&str>,
    source: &str,
    amount: &str,
    targets: &[String],
) -> LedgerResult<()> {
    let ws = resolve_workspace(storage, workspace)?;
    let source = resolve_bucket(storage, &ws, source)?;
    let targets = targets
        .iter()
        .map(|text| parse_target(storage, &ws, text))
        .collect::<LedgerResult<Vec<_>>>()?;

    let outcome = DistributionService::new(storage).distribute(DistributeInput {
        workspace_id: ws.id,
        source_bucket_id: source.id,
        amount: parse_money(amount)?,
        targets,
    })?;
    print!("{}", format_distribution_outcome(&outcome));
    Ok(())
}
