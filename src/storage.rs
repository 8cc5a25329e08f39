//! File helpers shared by network and agent persistence.

use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::{Builder, NamedTempFile};

use crate::error::Result;

/// Write `bytes` to `path` through a temp file in the same directory, then rename.
///
/// Readers see either the previous file or the complete new one. On any error
/// the temp file is removed when it drops.
pub fn write_atomically(path: &Path, bytes: &[u8]) -> Result<()> {
    let mut file = NamedTempFile::new_in(parent_of(path))?;
    file.write_all(bytes)?;
    file.as_file().sync_all()?;
    file.persist(path)?;
    Ok(())
}

/// Replace the directory `dir` as a whole with one filled in by `populate`.
///
/// `populate` writes into a staging directory next to `dir`. Only once it
/// succeeds is the staging directory renamed into place, so on any error the
/// previous contents of `dir` (or its absence) are left exactly as they were.
pub fn replace_dir<F>(dir: &Path, populate: F) -> Result<()>
where
    F: FnOnce(&Path) -> Result<()>,
{
    let parent = parent_of(dir);
    fs::create_dir_all(parent)?;

    let staging = Builder::new().prefix(".staging-").tempdir_in(parent)?;
    populate(staging.path())?;

    if !dir.exists() {
        fs::rename(staging.path(), dir)?;
        return Ok(());
    }

    // Dropping `backup` deletes the previous contents once the swap is done
    let backup = Builder::new().prefix(".previous-").tempdir_in(parent)?;
    let previous = backup.path().join("contents");
    fs::rename(dir, &previous)?;
    if let Err(err) = fs::rename(staging.path(), dir) {
        fs::rename(&previous, dir)?;
        return Err(err.into());
    }
    Ok(())
}

fn parent_of(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}
