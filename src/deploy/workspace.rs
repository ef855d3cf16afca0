// ABOUTME: Clone workspace helpers enforcing the clean-room checkout property

use std::fs;
use std::io;
use std::path::Path;
use tracing::debug;

pub fn is_dir_empty(dir: &Path) -> io::Result<bool> {
    Ok(fs::read_dir(dir)?.next().is_none())
}

/// Removes every entry under `dir`, leaving the directory itself in place.
/// Called before each clone so no artifact from a prior attempt survives.
pub fn reset_workspace(dir: &Path) -> io::Result<()> {
    if is_dir_empty(dir)? {
        return Ok(());
    }

    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        let path = entry.path();
        if entry.file_type()?.is_dir() {
            fs::remove_dir_all(&path)?;
        } else {
            fs::remove_file(&path)?;
        }
    }

    debug!(clone_dir = %dir.display(), "workspace emptied");
    Ok(())
}
