//! Directory scanning for group subdirectories and their image files.
//!
//! Groups are the immediate subdirectories of the input root (one per
//! collection batch). Files are listed one level deep only; results are
//! sorted lexicographically so that processing order, and therefore output
//! order, is deterministic.

use std::path::Path;

use walkdir::WalkDir;

use crate::error::ConvertError;

/// Returns the names of the immediate subdirectories of `root`, sorted.
///
/// Plain files at the root (such as the label manifest itself) are ignored.
/// An empty result is valid.
pub fn list_groups(root: &Path) -> Result<Vec<String>, ConvertError> {
    let mut groups = Vec::new();

    for entry in WalkDir::new(root).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| ConvertError::Io(e.into()))?;
        if entry.file_type().is_dir() {
            groups.push(entry.file_name().to_string_lossy().into_owned());
        }
    }

    groups.sort();
    Ok(groups)
}

/// Returns the names of the regular files directly inside `dir`, sorted.
///
/// Dotfiles are skipped, as is `exclude` (compared by file name) so the
/// label manifest is never treated as an image when it lives inside the
/// input tree. An empty result is valid.
pub fn list_files(dir: &Path, exclude: Option<&Path>) -> Result<Vec<String>, ConvertError> {
    let excluded = exclude.and_then(|path| path.file_name());
    let mut files = Vec::new();

    for entry in WalkDir::new(dir).min_depth(1).max_depth(1) {
        let entry = entry.map_err(|e| ConvertError::Io(e.into()))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let name = entry.file_name();
        if name.to_string_lossy().starts_with('.') {
            continue;
        }
        if Some(name) == excluded {
            continue;
        }
        files.push(name.to_string_lossy().into_owned());
    }

    files.sort();
    Ok(files)
}
