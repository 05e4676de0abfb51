use std::fs;
use std::path::{Path, PathBuf};
use log::warn;
use crate::Result;

/// Non-directory entries directly inside `dir`, sorted by file name.
///
/// Symlinks to directories are neither followed nor returned. Entries that
/// cannot be read are logged and skipped.
pub fn sorted_files(dir: impl AsRef<Path>) -> Result<Vec<PathBuf>> {
    let dir = dir.as_ref();
    let mut files: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry.path()),
            Err(err) => {
                warn!("Error accessing entry in {}: {}", dir.display(), err);
                None
            }
        })
        .filter(|path| !path.is_dir())
        .collect();

    files.sort_by(|a, b| a.file_name().cmp(&b.file_name()));
    Ok(files)
}
