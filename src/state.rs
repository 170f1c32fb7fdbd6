//! Filesystem hygiene shared by the saved-state sidecar and manifest writers.
//!
//! Writes are atomic: content lands in a temp file in the same directory,
//! gets synced, then is renamed over the target. A crashed run never leaves
//! a half-written `.isolated` or `.isolated.state` behind (spec §5).

use std::fs::{self, File};
use std::io::{self, Write};
use std::path::Path;

use crate::error::{IsolateError, Result};

/// Returns the current Unix timestamp in seconds.
///
/// # Panics
/// Panics if system time is before UNIX epoch (should never happen in practice).
#[must_use]
pub fn current_unix_timestamp() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .expect("system time before UNIX_EPOCH")
        .as_secs()
}

/// Ensure the parent directory exists for a given path.
///
/// # Errors
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)?;
    }
    Ok(())
}

/// RAII guard for temporary file cleanup.
///
/// Ensures the temp file is removed if the write operation fails.
/// Call `commit()` after a successful rename to prevent cleanup.
struct TempFileGuard<'a> {
    path: &'a Path,
    should_remove: bool,
}

impl<'a> TempFileGuard<'a> {
    const fn new(path: &'a Path) -> Self {
        Self {
            path,
            should_remove: true,
        }
    }

    const fn commit(&mut self) {
        self.should_remove = false;
    }
}

impl Drop for TempFileGuard<'_> {
    fn drop(&mut self) {
        if self.should_remove {
            let _ = fs::remove_file(self.path);
        }
    }
}

/// Atomically write content to a file.
///
/// 1. Write content to a temporary file in the same directory.
/// 2. Sync the temp file to disk for durability.
/// 3. Rename temp -> target (atomic on the platforms this tool targets).
///
/// If any step before the rename fails, the temp file is cleaned up via the
/// RAII guard and the original file (if any) is left untouched.
///
/// # Errors
/// Returns an error if the file cannot be written or renamed.
pub fn atomic_write(path: &Path, content: &[u8]) -> Result<()> {
    ensure_parent_dir(path).map_err(|e| {
        IsolateError::io_with_context(e, path.to_path_buf(), "create parent directory")
    })?;

    let parent = path.parent().unwrap_or_else(|| Path::new("."));
    let file_stem = path.file_name().and_then(|n| n.to_str()).unwrap_or("file");
    let temp_name = format!(".{file_stem}.tmp.{}", std::process::id());
    let temp_path = parent.join(&temp_name);

    let mut temp_guard = TempFileGuard::new(&temp_path);

    {
        let temp_file = File::create(&temp_path).map_err(|e| {
            IsolateError::io_with_context(e, temp_path.clone(), "create temp file")
        })?;
        let mut writer = io::BufWriter::new(&temp_file);
        writer.write_all(content).map_err(|e| {
            IsolateError::io_with_context(e, temp_path.clone(), "write temp file")
        })?;
        writer.flush().map_err(|e| {
            IsolateError::io_with_context(e, temp_path.clone(), "flush temp file")
        })?;
        temp_file
            .sync_all()
            .map_err(|e| IsolateError::io_with_context(e, temp_path.clone(), "sync temp file"))?;
    }

    fs::rename(&temp_path, path)
        .map_err(|e| IsolateError::io_with_context(e, path.to_path_buf(), "rename"))?;
    temp_guard.commit();

    Ok(())
}

#[cfg(test)]
#[path = "state_tests.rs"]
mod tests;
