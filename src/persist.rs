//! Disk I/O helpers: whole-file load and save.
//!
//! [`WriteMode::Atomic`] writes a sibling temp file and renames it over the
//! target, which is close to atomic on most local filesystems. On FAT32 or
//! network shares there are no hard guarantees. [`WriteMode::Direct`] truncates
//! and rewrites in place; a crash mid-write can leave a corrupt store.

use crate::error::{Error, Result};
use crate::serializer::Serializer;
use crate::Mapping;
use std::io::Write;
use std::path::{Path, PathBuf};

/// How a snapshot replaces the previous file.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WriteMode {
    /// Temp file + fsync + rename.
    #[default]
    Atomic,
    /// Truncate and overwrite the target.
    Direct,
}

/// Reads and deserializes the file at `path`.
///
/// `Ok(None)` means the file is missing; callers decide whether that is fine.
/// A zero-byte file is what an interrupted in-place write leaves behind, so it
/// goes through the serializer and fails like any other corrupt snapshot.
pub fn load<S: Serializer>(path: &Path, serializer: &S) -> Result<Option<Mapping>> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            log::debug!("no snapshot at {}", path.display());
            return Ok(None);
        }
        Err(e) => return Err(Error::io_at(path, e)),
    };
    let map = serializer.deserialize(&bytes).map_err(|e| match e {
        Error::Deserialize(msg) => Error::corrupt_at(path, msg),
        other => other,
    })?;
    log::debug!(
        "loaded {} entries ({} bytes) from {}",
        map.len(),
        bytes.len(),
        path.display()
    );
    Ok(Some(map))
}

/// Encode `data` and write it to `path`, replacing whatever was there.
/// The parent directory must already exist.
pub fn save<S: Serializer>(
    path: &Path,
    data: &Mapping,
    serializer: &S,
    mode: WriteMode,
) -> Result<()> {
    let bytes = serializer.serialize(data)?;
    match mode {
        WriteMode::Atomic => atomic_write(path, &bytes)?,
        WriteMode::Direct => std::fs::write(path, &bytes).map_err(|e| Error::io_at(path, e))?,
    }
    log::debug!(
        "saved {} entries ({} bytes) to {} ({mode:?})",
        data.len(),
        bytes.len(),
        path.display()
    );
    Ok(())
}

/// Write `bytes` to `<path>.tmp` and then rename over `path`. A failed write
/// leaves the previous snapshot untouched.
///
/// An existing target keeps its permissions, and a symlinked target is
/// followed so the file it points at gets replaced, not the link.
pub fn atomic_write(path: &Path, bytes: &[u8]) -> Result<()> {
    let target = match std::fs::canonicalize(path) {
        Ok(real) => real,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => path.to_path_buf(),
        Err(e) => return Err(Error::io_at(path, e)),
    };
    let perms = match std::fs::metadata(&target) {
        Ok(meta) => Some(meta.permissions()),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => None,
        Err(e) => return Err(Error::io_at(&target, e)),
    };

    let tmp = tmp_path(&target);
    let written = std::fs::File::create(&tmp).and_then(|mut f| {
        // restrict before any content lands in the temp file
        if let Some(perms) = perms {
            f.set_permissions(perms)?;
        }
        f.write_all(bytes)?;
        f.sync_all()
    });
    if let Err(e) = written {
        let _ = std::fs::remove_file(&tmp);
        return Err(Error::io_at(&tmp, e));
    }
    if let Err(e) = std::fs::rename(&tmp, &target) {
        let _ = std::fs::remove_file(&tmp);
        return Err(Error::io_at(&target, e));
    }
    Ok(())
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().unwrap_or_default().to_os_string();
    name.push(".tmp");
    path.with_file_name(name)
}
