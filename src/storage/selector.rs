//! Picks `<uuid>.dat` player files out of a directory listing

use crate::core::{ConfigError, Result};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;
use uuid::fmt::Hyphenated;

/// Extension of per-player record files
pub const RECORD_EXTENSION: &str = "dat";

/// True when `name` is `<uuid>.dat` with the uuid in hyphenated 8-4-4-4-12 form.
///
/// Simple, braced and URN spellings are rejected. This is a name filter only:
/// the file may still be undecodable.
pub fn is_record_file_name(name: &str) -> bool {
    let Some((stem, extension)) = name.rsplit_once('.') else {
        return false;
    };
    extension == RECORD_EXTENSION
        && stem.len() == Hyphenated::LENGTH
        && Uuid::try_parse(stem).is_ok()
}

/// Lists candidate record files in `dir`, sorted by path.
///
/// Directories, other extensions and malformed names are skipped silently.
pub fn select_record_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let list_err = |source| ConfigError::ListDir {
        path: dir.to_path_buf(),
        source,
    };

    let mut selected = Vec::new();
    for entry in fs::read_dir(dir).map_err(list_err)? {
        let entry = entry.map_err(list_err)?;
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let accepted = path
            .file_name()
            .and_then(|name| name.to_str())
            .is_some_and(is_record_file_name);
        if accepted {
            selected.push(path);
        }
    }

    selected.sort();
    Ok(selected)
}
