use super::player::{Decision, PlayerRecord, decide};
use crate::core::{BackupError, BatchRequest, Result};
use crate::storage::{BackupSet, LocalStore, RecordStore, select_record_files};
use chrono::{Local, NaiveDateTime};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, error, info, info_span, warn};

// ============================================================================
// Per-file outcomes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// Could not be read, decoded or lacks the relocated fields. Untouched.
    Unreadable,
    /// Backup could not be made. Untouched.
    BackupFailed,
    /// Backup exists but the rewrite failed; check the original by hand
    WriteFailed,
}

impl FailureKind {
    pub fn needs_manual_recovery(self) -> bool {
        matches!(self, Self::WriteFailed)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Unreadable => "unreadable",
            Self::BackupFailed => "backup failed",
            Self::WriteFailed => "write failed",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FileFailure {
    pub path: PathBuf,
    pub kind: FailureKind,
    pub reason: String,
    /// Backup copy of the original, present only for write failures
    pub backup: Option<PathBuf>,
}

impl FileFailure {
    pub fn file_name(&self) -> String {
        file_label(&self.path)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum FileOutcome {
    Relocated { backup: PathBuf },
    WouldRelocate,
    Ineligible { dimension: i32 },
    Failed(FileFailure),
}

// ============================================================================
// Batch result
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct BatchResult {
    /// Candidate files found by name
    pub discovered: usize,
    /// Files rewritten, or that would be in a dry run
    pub relocated: usize,
    /// Records outside the target dimensions
    pub ineligible: usize,
    pub failures: Vec<FileFailure>,
    pub dry_run: bool,
    /// Set once at least one backup was made
    pub backup_dir: Option<PathBuf>,
}

impl BatchResult {
    fn new(discovered: usize, dry_run: bool) -> Self {
        Self {
            discovered,
            dry_run,
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: FileOutcome) {
        match outcome {
            FileOutcome::Relocated { .. } | FileOutcome::WouldRelocate => self.relocated += 1,
            FileOutcome::Ineligible { .. } => self.ineligible += 1,
            FileOutcome::Failed(failure) => self.failures.push(failure),
        }
    }

    pub fn failed(&self) -> usize {
        self.failures.len()
    }

    /// Files not relocated, for any reason
    pub fn skipped(&self) -> usize {
        self.discovered - self.relocated
    }

    pub fn needs_manual_recovery(&self) -> impl Iterator<Item = &FileFailure> {
        self.failures
            .iter()
            .filter(|failure| failure.kind.needs_manual_recovery())
    }
}

// ============================================================================
// Runner
// ============================================================================

/// Drives every candidate file through decode, relocate, backup and write.
///
/// Per-file problems become [`FileOutcome::Failed`] entries; only a failure to
/// list the source folder aborts the run.
pub struct BatchRunner<'a, S: RecordStore = LocalStore> {
    request: &'a BatchRequest,
    store: S,
    backups: BackupSet,
}

impl<'a> BatchRunner<'a, LocalStore> {
    pub fn new(request: &'a BatchRequest, started: NaiveDateTime) -> Self {
        Self::with_store(request, started, LocalStore)
    }
}

impl<'a, S: RecordStore> BatchRunner<'a, S> {
    pub fn with_store(request: &'a BatchRequest, started: NaiveDateTime, store: S) -> Self {
        Self {
            request,
            store,
            backups: BackupSet::for_run(&request.backup_root(), started),
        }
    }

    pub fn backups(&self) -> &BackupSet {
        &self.backups
    }

    pub fn run(mut self) -> Result<BatchResult> {
        let request = self.request;
        let span = info_span!("relocate", source = %request.source_dir.display());
        let _guard = span.enter();

        info!(
            targets = ?request.targets,
            x = request.destination.x,
            y = request.destination.y,
            z = request.destination.z,
            dimension = request.destination.dimension,
            dry_run = request.dry_run,
            backup_dir = %self.backups.dir().display(),
            "Relocating players out of target dimensions"
        );

        let candidates = select_record_files(&request.source_dir)?;
        info!(count = candidates.len(), "Found player data files");

        let mut result = BatchResult::new(candidates.len(), request.dry_run);
        for path in &candidates {
            let outcome = self.process_file(path);
            result.record(outcome);
        }

        if self.backups.is_created() {
            result.backup_dir = Some(self.backups.dir().to_path_buf());
        }

        info!(
            discovered = result.discovered,
            relocated = result.relocated,
            ineligible = result.ineligible,
            failed = result.failed(),
            dry_run = result.dry_run,
            "Relocation finished"
        );
        Ok(result)
    }

    /// Runs one file to a terminal state. Never panics on bad input.
    pub fn process_file(&mut self, path: &Path) -> FileOutcome {
        let name = file_label(path);

        let original = match self.store.read(path) {
            Ok(bytes) => bytes,
            Err(e) => {
                let reason = format!("Unable to read player data: {}", e);
                return failure(path, FailureKind::Unreadable, reason, None);
            }
        };

        let record = match PlayerRecord::decode(&original) {
            Ok(record) => record,
            Err(e) => {
                return failure(
                    path,
                    FailureKind::Unreadable,
                    format!("Unable to decode player data: {}", e),
                    None,
                );
            }
        };

        let relocated = match decide(record, self.request) {
            Ok(Decision::Ineligible { dimension }) => {
                debug!(file = %name, dimension, "Not in a target dimension");
                return FileOutcome::Ineligible { dimension };
            }
            Ok(Decision::DryRun(_)) => {
                info!(file = %name, "Would relocate (dry run)");
                return FileOutcome::WouldRelocate;
            }
            Ok(Decision::Relocate(record)) => record,
            Err(e) => {
                return failure(
                    path,
                    FailureKind::Unreadable,
                    format!("Malformed player data: {}", e),
                    None,
                );
            }
        };

        let backup = match self.back_up(path, &original) {
            Ok(backup) => backup,
            Err(e) => {
                return failure(
                    path,
                    FailureKind::BackupFailed,
                    format!("Failed to make player data backup, skipping file: {}", e),
                    None,
                );
            }
        };

        let written = relocated
            .encode()
            .map_err(|e| format!("Failed to encode player data: {}", e))
            .and_then(|bytes| {
                self.store
                    .replace(path, &bytes)
                    .map_err(|e| format!("Failed to write player data: {}", e))
            });
        if let Err(reason) = written {
            return failure(path, FailureKind::WriteFailed, reason, Some(backup));
        }

        debug!(file = %name, backup = %backup.display(), "Relocated");
        FileOutcome::Relocated { backup }
    }

    fn back_up(&mut self, path: &Path, original: &[u8]) -> std::result::Result<PathBuf, BackupError> {
        self.backups.ensure_created()?;
        self.backups.store(path, original)
    }
}

fn failure(path: &Path, kind: FailureKind, reason: String, backup: Option<PathBuf>) -> FileOutcome {
    let name = file_label(path);
    if kind.needs_manual_recovery() {
        error!(
            file = %name,
            kind = kind.label(),
            backup = ?backup,
            "{}; restore from backup if the file is damaged",
            reason
        );
    } else {
        warn!(file = %name, kind = kind.label(), "{}", reason);
    }
    FileOutcome::Failed(FileFailure {
        path: path.to_path_buf(),
        kind,
        reason,
        backup,
    })
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// Validates `request` and relocates every eligible record under its source.
///
/// Configuration problems are returned before any file is opened.
pub fn run_batch(request: &BatchRequest) -> Result<BatchResult> {
    request.validate()?;
    BatchRunner::new(request, Local::now().naive_local()).run()
}
