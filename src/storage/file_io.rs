//! JSON file helpers with atomic writes, plus the advisory file lock that
//! guards the ledger snapshot across processes

use std::fs::{self, File, OpenOptions};
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

use fs4::fs_std::FileExt;
use serde::{de::DeserializeOwned, Serialize};

use crate::error::LedgerError;

/// Read JSON from a file, returning a default value if the file doesn't exist
pub fn read_json<T, P>(path: P) -> Result<T, LedgerError>
where
    T: DeserializeOwned + Default,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    if !path.exists() {
        return Ok(T::default());
    }
    read_json_required(path)
}

/// Read JSON from a file that must exist
pub fn read_json_required<T, P>(path: P) -> Result<T, LedgerError>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    let file = File::open(path)
        .map_err(|e| LedgerError::Storage(format!("Failed to open {}: {}", path.display(), e)))?;

    serde_json::from_reader(BufReader::new(file))
        .map_err(|e| LedgerError::Storage(format!("Failed to parse {}: {}", path.display(), e)))
}

/// Write JSON to a file atomically (write to temp, sync, then rename)
///
/// Readers of `path` see either the previous contents or the new ones, never
/// a partial write.
pub fn write_json_atomic<T, P>(path: P, data: &T) -> Result<(), LedgerError>
where
    T: Serialize,
    P: AsRef<Path>,
{
    let path = path.as_ref();

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| {
            LedgerError::Storage(format!(
                "Failed to create directory {}: {}",
                parent.display(),
                e
            ))
        })?;
    }

    // Same directory as the target so the rename stays on one filesystem
    let temp_path = path.with_extension("json.tmp");

    let file = File::create(&temp_path)
        .map_err(|e| LedgerError::Storage(format!("Failed to create temp file: {}", e)))?;

    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, data)
        .map_err(|e| LedgerError::Storage(format!("Failed to serialize data: {}", e)))?;

    writer
        .flush()
        .map_err(|e| LedgerError::Storage(format!("Failed to flush data: {}", e)))?;

    writer
        .get_ref()
        .sync_all()
        .map_err(|e| LedgerError::Storage(format!("Failed to sync data: {}", e)))?;

    fs::rename(&temp_path, path).map_err(|e| {
        let _ = fs::remove_file(&temp_path);
        LedgerError::Storage(format!("Failed to rename temp file: {}", e))
    })?;

    Ok(())
}

/// Held advisory lock; released when dropped
#[derive(Debug)]
pub struct FileLock {
    file: File,
}

impl FileLock {
    /// Block until no other handle holds any lock on `path`
    pub fn exclusive<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let file = open_lock_file(path.as_ref())?;
        FileExt::lock_exclusive(&file).map_err(|e| lock_failed(path.as_ref(), e))?;
        Ok(Self { file })
    }

    /// Block until no other handle holds an exclusive lock on `path`
    pub fn shared<P: AsRef<Path>>(path: P) -> Result<Self, LedgerError> {
        let file = open_lock_file(path.as_ref())?;
        FileExt::lock_shared(&file).map_err(|e| lock_failed(path.as_ref(), e))?;
        Ok(Self { file })
    }
}

impl Drop for FileLock {
    fn drop(&mut self) {
        // Closing the handle releases the lock as well
        let _ = FileExt::unlock(&self.file);
    }
}

fn open_lock_file(path: &Path) -> Result<File, LedgerError> {
    OpenOptions::new()
        .read(true)
        .write(true)
        .create(true)
        .truncate(false)
        .open(path)
        .map_err(|e| LedgerError::Storage(format!("Failed to open {}: {}", path.display(), e)))
}

fn lock_failed(path: &Path, err: std::io::Error) -> LedgerError {
    LedgerError::Storage(format!("Failed to lock {}: {}", path.display(), err))
}
