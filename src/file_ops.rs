//! File operations module - Backup copy and relocation
//!
//! This module handles the two file-system steps of a move: copying the
//! file into the backup folder and relocating it into the target folder.
//! Every attempt is recorded in an operation log.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use thiserror::Error;
use uuid::Uuid;

/// Name of the backup folder created under the working root
pub const BACKUP_DIR_NAME: &str = "false-positive";

/// File operation errors
#[derive(Error, Debug)]
pub enum FileOpError {
    #[error("Failed to create directory {path}: {source}")]
    CreateDir { path: PathBuf, source: io::Error },

    #[error("Failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("Target folder {0} does not exist")]
    MissingTarget(PathBuf),

    #[error("{0} already exists")]
    DestinationExists(PathBuf),

    #[error("Failed to move {from} to {to}: {source}")]
    Relocate {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },

    #[error("{0} has no file name")]
    NoFileName(PathBuf),
}

/// What to do when the backup folder already holds a file of the same name
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum BackupPolicy {
    /// Keep the existing backup and continue with the move
    #[default]
    SkipExisting,
    /// Write the new copy under a numbered name
    KeepBoth,
}

/// Outcome of the backup step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackupCopy {
    Created(PathBuf),
    Skipped(PathBuf),
}

/// Log entry for file operations
#[derive(Debug, Clone)]
pub struct OperationLog {
    pub timestamp: DateTime<Local>,
    pub operation: String,
    pub source: PathBuf,
    pub destination: Option<PathBuf>,
    pub success: bool,
    pub message: String,
}

/// File operations handler
pub struct FileOperations {
    logs: Vec<OperationLog>,
}

impl Default for FileOperations {
    fn default() -> Self {
        Self::new()
    }
}

impl FileOperations {
    pub fn new() -> Self {
        Self { logs: Vec::new() }
    }

    /// Get operation logs
    pub fn get_logs(&self) -> &[OperationLog] {
        &self.logs
    }

    /// Clear operation logs
    pub fn clear_logs(&mut self) {
        self.logs.clear();
    }

    fn record(
        &mut self,
        operation: &str,
        source: &Path,
        destination: Option<&Path>,
        success: bool,
        message: String,
    ) {
        if success {
            log::info!("{}", message);
        } else {
            log::error!("{}", message);
        }
        self.logs.push(OperationLog {
            timestamp: Local::now(),
            operation: operation.to_string(),
            source: source.to_path_buf(),
            destination: destination.map(Path::to_path_buf),
            success,
            message,
        });
    }

    /// Copy `source` into `backup_dir` under its own file name
    pub fn backup_file(
        &mut self,
        source: &Path,
        backup_dir: &Path,
        policy: BackupPolicy,
    ) -> Result<BackupCopy, FileOpError> {
        let file_name = source
            .file_name()
            .ok_or_else(|| FileOpError::NoFileName(source.to_path_buf()))?;
        let mut dest_path = backup_dir.join(file_name);

        if dest_path.exists() {
            match policy {
                BackupPolicy::SkipExisting => {
                    let msg = format!(
                        "Backup exists, keeping it: {}",
                        dest_path.display()
                    );
                    self.record("BACKUP", source, Some(&dest_path), true, msg);
                    return Ok(BackupCopy::Skipped(dest_path));
                }
                BackupPolicy::KeepBoth => dest_path = generate_unique_path(&dest_path),
            }
        }

        match fs::copy(source, &dest_path) {
            Ok(_) => {
                let msg = format!(
                    "Backed up: {} -> {}",
                    source.display(),
                    dest_path.display()
                );
                self.record("BACKUP", source, Some(&dest_path), true, msg);
                Ok(BackupCopy::Created(dest_path))
            }
            Err(e) => {
                let msg = format!("Failed to back up {}: {}", source.display(), e);
                self.record("BACKUP", source, Some(&dest_path), false, msg);
                Err(FileOpError::Copy {
                    from: source.to_path_buf(),
                    to: dest_path,
                    source: e,
                })
            }
        }
    }

    /// Remove a backup copy written by a move that did not complete
    pub fn discard_backup(&mut self, backup: &BackupCopy) {
        if let BackupCopy::Created(path) = backup {
            match fs::remove_file(path) {
                Ok(()) => {
                    let msg = format!("Discarded backup: {}", path.display());
                    self.record("DISCARD", path, None, true, msg);
                }
                Err(e) => {
                    let msg = format!("Failed to discard backup {}: {}", path.display(), e);
                    self.record("DISCARD", path, None, false, msg);
                }
            }
        }
    }

    /// Move `source` into `dest_dir` under the same file name.
    ///
    /// Never overwrites: an existing file of the same name in `dest_dir`
    /// is an error and nothing is touched.
    pub fn relocate_file(&mut self, source: &Path, dest_dir: &Path) -> Result<PathBuf, FileOpError> {
        if !dest_dir.is_dir() {
            let msg = format!(
                "Failed to move {}: target {} is not a folder",
                source.display(),
                dest_dir.display()
            );
            self.record("MOVE", source, Some(dest_dir), false, msg);
            return Err(FileOpError::MissingTarget(dest_dir.to_path_buf()));
        }

        let file_name = source
            .file_name()
            .ok_or_else(|| FileOpError::NoFileName(source.to_path_buf()))?;
        let dest_path = dest_dir.join(file_name);

        if dest_path.exists() {
            let msg = format!(
                "Failed to move {}: {} already exists",
                source.display(),
                dest_path.display()
            );
            self.record("MOVE", source, Some(&dest_path), false, msg);
            return Err(FileOpError::DestinationExists(dest_path));
        }

        match fs::rename(source, &dest_path) {
            Ok(()) => {
                let msg = format!("Moved: {} -> {}", source.display(), dest_path.display());
                self.record("MOVE", source, Some(&dest_path), true, msg);
                Ok(dest_path)
            }
            Err(e) => {
                // Try copy + delete if rename fails (cross-drive moves)
                match fs::copy(source, &dest_path) {
                    Ok(_) => match fs::remove_file(source) {
                        Ok(()) => {
                            let msg =
                                format!("Moved: {} -> {}", source.display(), dest_path.display());
                            self.record("MOVE", source, Some(&dest_path), true, msg);
                            Ok(dest_path)
                        }
                        Err(del_err) => {
                            // Copy succeeded but delete failed - clean up
                            let _ = fs::remove_file(&dest_path);
                            let msg = format!(
                                "Failed to complete move of {}: {}",
                                source.display(),
                                del_err
                            );
                            self.record("MOVE", source, Some(&dest_path), false, msg);
                            Err(FileOpError::Relocate {
                                from: source.to_path_buf(),
                                to: dest_path,
                                source: del_err,
                            })
                        }
                    },
                    Err(_) => {
                        let msg = format!("Failed to move {}: {}", source.display(), e);
                        self.record("MOVE", source, Some(&dest_path), false, msg);
                        Err(FileOpError::Relocate {
                            from: source.to_path_buf(),
                            to: dest_path,
                            source: e,
                        })
                    }
                }
            }
        }
    }
}

/// Create the backup folder if it is missing
pub fn ensure_backup_dir(path: &Path) -> Result<(), FileOpError> {
    match fs::create_dir_all(path) {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists && path.is_dir() => Ok(()),
        Err(e) => Err(FileOpError::CreateDir {
            path: path.to_path_buf(),
            source: e,
        }),
    }
}

/// Generate a unique path by appending a number
fn generate_unique_path(path: &Path) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("file");
    let extension = path.extension().and_then(|s| s.to_str()).unwrap_or("");
    let parent = path.parent().unwrap_or(Path::new("."));

    let mut counter = 1;
    loop {
        let new_name = if extension.is_empty() {
            format!("{}_{}", stem, counter)
        } else {
            format!("{}_{}.{}", stem, counter, extension)
        };

        let new_path = parent.join(new_name);
        if !new_path.exists() {
            return new_path;
        }
        counter += 1;

        // Safety limit
        if counter > 10000 {
            return parent.join(format!("{}_{}", stem, Uuid::new_v4()));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_generate_unique_path() {
        let path = Path::new("/tmp/test.txt");
        let unique = generate_unique_path(path);
        assert!(unique.to_string_lossy().contains("test_1.txt"));
    }

    #[test]
    fn test_backup_skips_existing_name() {
        let dir = tempdir().unwrap();
        let backup = dir.path().join(BACKUP_DIR_NAME);
        ensure_backup_dir(&backup).unwrap();
        let source = dir.path().join("cat.jpg");
        fs::write(&source, "new").unwrap();
        fs::write(backup.join("cat.jpg"), "old").unwrap();

        let mut ops = FileOperations::new();
        let copy = ops
            .backup_file(&source, &backup, BackupPolicy::SkipExisting)
            .unwrap();

        assert_eq!(copy, BackupCopy::Skipped(backup.join("cat.jpg")));
        assert_eq!(fs::read_to_string(backup.join("cat.jpg")).unwrap(), "old");
    }

    #[test]
    fn test_backup_keep_both_writes_numbered_copy() {
        let dir = tempdir().unwrap();
        let backup = dir.path().join(BACKUP_DIR_NAME);
        ensure_backup_dir(&backup).unwrap();
        let source = dir.path().join("cat.jpg");
        fs::write(&source, "new").unwrap();
        fs::write(backup.join("cat.jpg"), "old").unwrap();

        let mut ops = FileOperations::new();
        let copy = ops
            .backup_file(&source, &backup, BackupPolicy::KeepBoth)
            .unwrap();

        assert_eq!(copy, BackupCopy::Created(backup.join("cat_1.jpg")));
        assert_eq!(fs::read_to_string(backup.join("cat_1.jpg")).unwrap(), "new");
        assert_eq!(fs::read_to_string(backup.join("cat.jpg")).unwrap(), "old");
    }

    #[test]
    fn test_relocate_refuses_to_overwrite() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();
        let source = dir.path().join("dog.jpg");
        fs::write(&source, "src").unwrap();
        fs::write(target.join("dog.jpg"), "dst").unwrap();

        let mut ops = FileOperations::new();
        let err = ops.relocate_file(&source, &target).unwrap_err();

        assert!(matches!(err, FileOpError::DestinationExists(_)));
        assert!(source.exists());
        assert_eq!(fs::read_to_string(target.join("dog.jpg")).unwrap(), "dst");
        assert!(!ops.get_logs().last().unwrap().success);
    }

    #[test]
    fn test_relocate_moves_file_and_logs() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("target");
        fs::create_dir(&target).unwrap();
        let source = dir.path().join("dog.jpg");
        fs::write(&source, "src").unwrap();

        let mut ops = FileOperations::new();
        let dest = ops.relocate_file(&source, &target).unwrap();

        assert_eq!(dest, target.join("dog.jpg"));
        assert!(!source.exists());
        assert!(dest.exists());
        let log = ops.get_logs().last().unwrap();
        assert_eq!(log.operation, "MOVE");
        assert!(log.success);
    }

    #[test]
    fn test_discard_backup_only_removes_created_copies() {
        let dir = tempdir().unwrap();
        let kept = dir.path().join("kept.jpg");
        let created = dir.path().join("created.jpg");
        fs::write(&kept, "k").unwrap();
        fs::write(&created, "c").unwrap();

        let mut ops = FileOperations::new();
        ops.discard_backup(&BackupCopy::Skipped(kept.clone()));
        ops.discard_backup(&BackupCopy::Created(created.clone()));

        assert!(kept.exists());
        assert!(!created.exists());
    }
}
