//! Append-only JSONL audit log

use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::PathBuf;

use crate::error::{LedgerError, LedgerResult};
use crate::models::WorkspaceId;

use super::entry::AuditEntry;

/// Writes audit entries, one JSON object per line
pub struct AuditLogger {
    log_path: PathBuf,
}

impl AuditLogger {
    pub fn new(log_path: PathBuf) -> Self {
        Self { log_path }
    }

    fn open_for_append(&self) -> LedgerResult<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.log_path)
            .map_err(|e| LedgerError::Io(format!("Failed to open audit log: {}", e)))
    }

    pub fn log(&self, entry: &AuditEntry) -> LedgerResult<()> {
        self.log_batch(std::slice::from_ref(entry))
    }

    /// Append all entries of one committed operation with a single flush
    pub fn log_batch(&self, entries: &[AuditEntry]) -> LedgerResult<()> {
        if entries.is_empty() {
            return Ok(());
        }

        let mut writer = BufWriter::new(self.open_for_append()?);
        for entry in entries {
            let json = serde_json::to_string(entry).map_err(|e| {
                LedgerError::Json(format!("Failed to serialize audit entry: {}", e))
            })?;
            writeln!(writer, "{}", json)
                .map_err(|e| LedgerError::Io(format!("Failed to write audit entry: {}", e)))?;
        }

        writer
            .flush()
            .map_err(|e| LedgerError::Io(format!("Failed to flush audit log: {}", e)))
    }

    /// Read all entries, oldest first
    pub fn read_all(&self) -> LedgerResult<Vec<AuditEntry>> {
        if !self.log_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.log_path)
            .map_err(|e| LedgerError::Io(format!("Failed to open audit log: {}", e)))?;

        let mut entries = Vec::new();
        for (line_num, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| {
                LedgerError::Io(format!("Failed to read audit log line {}: {}", line_num + 1, e))
            })?;
            if line.trim().is_empty() {
                continue;
            }

            let entry: AuditEntry = serde_json::from_str(&line).map_err(|e| {
                LedgerError::Json(format!(
                    "Failed to parse audit entry at line {}: {}",
                    line_num + 1,
                    e
                ))
            })?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Entries for one workspace, oldest first
    pub fn read_for_workspace(&self, workspace_id: WorkspaceId) -> LedgerResult<Vec<AuditEntry>> {
        Ok(self
            .read_all()?
            .into_iter()
            .filter(|e| e.workspace_id == Some(workspace_id))
            .collect())
    }

    pub fn read_recent(&self, count: usize) -> LedgerResult<Vec<AuditEntry>> {
        let all_entries = self.read_all()?;
        let start = all_entries.len().saturating_sub(count);
        Ok(all_entries[start..].to_vec())
    }

    pub fn path(&self) -> &PathBuf {
        &self.log_path
    }
}
