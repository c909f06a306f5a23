//! Copies locally selected packages into the device's package directory.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::selection::SelectionSet;
use crate::{Result, UpdaterError};

/// Copy every selected file to `dest_dir/<file name>`, overwriting existing files.
///
/// `on_file` is called with the 1-based position, the total and the file name
/// before each copy.
pub fn stage_packages<F>(selection: &SelectionSet, dest_dir: &Path, mut on_file: F) -> Result<Vec<PathBuf>>
where
    F: FnMut(usize, usize, &str),
{
    std::fs::create_dir_all(dest_dir)?;

    let entries: Vec<&str> = selection.iter().filter(|e| !e.trim().is_empty()).collect();

    // Resolve every destination first so a collision copies nothing
    let mut names = HashSet::with_capacity(entries.len());
    for entry in &entries {
        let file_name = Path::new(entry)
            .file_name()
            .ok_or_else(|| UpdaterError::InvalidPackagePath {
                entry: entry.to_string(),
            })?;
        if !names.insert(file_name) {
            return Err(UpdaterError::DuplicatePackageName {
                name: file_name.to_string_lossy().into_owned(),
            });
        }
    }

    let mut staged = Vec::with_capacity(entries.len());
    for (index, entry) in entries.iter().enumerate() {
        let source = Path::new(entry);
        let Some(file_name) = source.file_name() else {
            continue;
        };
        let name = file_name.to_string_lossy();
        on_file(index + 1, entries.len(), &name);

        let dest = dest_dir.join(file_name);
        std::fs::copy(source, &dest)?;
        log::debug!("Copied {} to {}", source.display(), dest.display());
        staged.push(dest);
    }

    Ok(staged)
}
