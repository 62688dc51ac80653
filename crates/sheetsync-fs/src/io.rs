//! Atomic writes and small file helpers

use std::fs;
use std::io::Write;
use std::path::Path;

use fs2::FileExt;
use tempfile::NamedTempFile;

use crate::{Error, NormalizedPath, Result};

/// Replace `path` with `content` in one step.
///
/// The bytes are staged in a locked temp file next to `path` and persisted
/// over it, so a reader sees either the old table or the new one.
pub fn write_atomic(path: &NormalizedPath, content: &[u8]) -> Result<()> {
    let target = path.to_native();
    let dir = match target.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;

    let mut staged = NamedTempFile::new_in(dir).map_err(|e| Error::io(dir, e))?;
    staged
        .as_file()
        .lock_exclusive()
        .map_err(|_| Error::LockFailed { path: target.clone() })?;
    staged
        .write_all(content)
        .and_then(|()| staged.as_file().sync_all())
        .map_err(|e| Error::io(staged.path(), e))?;

    staged
        .persist(&target)
        .map_err(|e| Error::io(&target, e.error))?;
    Ok(())
}

/// Read text content from a file.
pub fn read_text(path: &NormalizedPath) -> Result<String> {
    let native_path = path.to_native();
    fs::read_to_string(&native_path).map_err(|e| Error::io(&native_path, e))
}

/// Write text content to a file atomically.
pub fn write_text(path: &NormalizedPath, content: &str) -> Result<()> {
    write_atomic(path, content.as_bytes())
}

/// Copy a file byte-for-byte, atomically replacing the destination.
pub fn copy_file(from: &NormalizedPath, to: &NormalizedPath) -> Result<()> {
    let native_from = from.to_native();
    let content = fs::read(&native_from).map_err(|e| Error::io(&native_from, e))?;
    write_atomic(to, &content)
}

/// Remove a file, treating an already-missing file as success.
///
/// Returns whether a file was actually removed.
pub fn remove_if_exists(path: &NormalizedPath) -> Result<bool> {
    let native_path = path.to_native();
    match fs::remove_file(&native_path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
        Err(e) => Err(Error::io(&native_path, e)),
    }
}

/// Move a file, falling back to copy-and-delete across filesystems.
pub fn move_file(from: &NormalizedPath, to: &NormalizedPath) -> Result<()> {
    let native_from = from.to_native();
    let native_to = to.to_native();
    if let Some(parent) = native_to.parent()
        && !parent.as_os_str().is_empty()
    {
        fs::create_dir_all(parent).map_err(|e| Error::io(parent, e))?;
    }
    if fs::rename(&native_from, &native_to).is_ok() {
        return Ok(());
    }
    copy_file(from, to)?;
    remove_if_exists(from)?;
    Ok(())
}
