//! Audit log CLI command

use crate::error::LedgerResult;
use crate::storage::Storage;

use super::resolve_workspace;

/// Print the most recent audit entries, oldest first
pub fn handle_audit_command(storage: &Storage, workspace: Option<&str>, limit: usize) -> LedgerResult<()> {
    let log = storage.audit_log();
    let mut entries = match workspace {
        Some(identifier) => {
            let ws = resolve_workspace(storage, Some(identifier))?;
            log.read_for_workspace(ws.id)?
        }
        None => log.read_recent(limit)?,
    };
    if entries.len() > limit {
        entries.drain(..entries.len() - limit);
    }

    if entries.is_empty() {
        println!("No audit entries.");
        return Ok(());
    }
    for entry in &entries {
        println!("{}", entry.format_human_readable());
    }
    Ok(())
}
