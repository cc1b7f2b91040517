//! Timestamped backup sets written before any record is overwritten

use crate::core::BackupError;
use chrono::NaiveDateTime;
use std::fs::{self, File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Backup folder name pattern, one folder per run start second
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H-%M-%S";

pub fn folder_name(started: NaiveDateTime) -> String {
    started.format(TIMESTAMP_FORMAT).to_string()
}

/// Folder holding pristine copies of every record a run rewrote
#[derive(Debug)]
pub struct BackupSet {
    dir: PathBuf,
    created: bool,
}

impl BackupSet {
    /// Names the set after the run start. Nothing is created yet.
    pub fn for_run(root: &Path, started: NaiveDateTime) -> Self {
        Self {
            dir: root.join(folder_name(started)),
            created: false,
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    /// Creates the folder on first call; later calls are no-ops
    pub fn ensure_created(&mut self) -> Result<&Path, BackupError> {
        if !self.created {
            fs::create_dir_all(&self.dir).map_err(|source| BackupError::CreateDir {
                path: self.dir.clone(),
                source,
            })?;
            debug!(dir = %self.dir.display(), "Created backup folder");
            self.created = true;
        }
        Ok(&self.dir)
    }

    /// Stores `original_bytes` under the file name of `original`.
    ///
    /// An existing backup is never replaced. The copy is synced before
    /// returning, so a returned path means the bytes are on disk.
    pub fn store(&self, original: &Path, original_bytes: &[u8]) -> Result<PathBuf, BackupError> {
        if !self.created {
            return Err(BackupError::DirUnavailable(self.dir.clone()));
        }
        let name = original
            .file_name()
            .ok_or_else(|| BackupError::NoFileName(original.to_path_buf()))?;
        let target = self.dir.join(name);

        let write_err = |source| BackupError::Write {
            from: original.to_path_buf(),
            to: target.clone(),
            source,
        };

        let mut file = match OpenOptions::new().write(true).create_new(true).open(&target) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(BackupError::AlreadyExists(target.clone()));
            }
            Err(e) => return Err(write_err(e)),
        };
        fill_or_remove(&mut file, &target, |file| {
            file.write_all(original_bytes)?;
            file.sync_all()
        })
        .map_err(write_err)?;

        Ok(target)
    }
}

/// Runs `fill` on a freshly created `file`, deleting `path` if it fails
fn fill_or_remove<F>(file: &mut File, path: &Path, fill: F) -> std::io::Result<()>
where
    F: FnOnce(&mut File) -> std::io::Result<()>,
{
    let result = fill(file);
    if result.is_err() {
        if let Err(e) = fs::remove_file(path) {
            warn!(backup = %path.display(), error = %e, "Failed to remove partial backup");
        }
    }
    result
}
