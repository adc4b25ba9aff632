//! Optional advisory locking around a load/save span.
//!
//! Uses `fs2` advisory locks on a `<file>.lock` sibling. Only cooperating
//! processes that also lock are excluded; the store file itself is never
//! locked. The lock file is left in place after release.

use crate::error::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

/// Lock flavour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LockMode {
    /// Many readers.
    Shared,
    /// One writer, no readers.
    Exclusive,
}

/// Held lock. Released on drop.
#[derive(Debug)]
pub struct LockGuard {
    file: File,
    path: PathBuf,
    mode: LockMode,
}

impl LockGuard {
    /// Path of the lock file.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Mode the lock was taken in.
    pub fn mode(&self) -> LockMode {
        self.mode
    }
}

impl Drop for LockGuard {
    fn drop(&mut self) {
        // unlock errors on drop are ignored; closing the fd releases it anyway
        let _ = FileExt::unlock(&self.file);
    }
}

/// Lock file used for a given store file.
pub fn lock_path(store: &Path) -> PathBuf {
    let mut name = store.file_name().unwrap_or_default().to_os_string();
    name.push(".lock");
    store.with_file_name(name)
}

/// Block until the lock for `store` is held in `mode`.
pub fn acquire(store: &Path, mode: LockMode) -> Result<LockGuard> {
    let path = lock_path(store);
    let file = OpenOptions::new()
        .create(true)
        .truncate(false)
        .read(true)
        .write(true)
        .open(&path)
        .map_err(|e| Error::io_at(&path, e))?;
    let locked = match mode {
        LockMode::Shared => FileExt::lock_shared(&file),
        LockMode::Exclusive => FileExt::lock_exclusive(&file),
    };
    locked.map_err(|e| Error::io_at(&path, e))?;
    log::trace!("acquired {mode:?} lock on {}", path.display());
    Ok(LockGuard { file, path, mode })
}
