//! Session module - Active folder, cursor and move bookkeeping
//!
//! Two folders ("left" and "right") are listed side by side. One of them is
//! designated as the source; the cursor walks its files and a move sends the
//! current file into the other folder, leaving a copy in the backup folder.

use std::io;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::config::SessionConfig;
use crate::file_ops::{BackupCopy, BackupPolicy, FileOpError, FileOperations};
use crate::scanner::{list_folder, FileEntry, FolderList};

/// One of the two folder slots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    Left,
    Right,
}

impl Side {
    pub const BOTH: [Side; 2] = [Side::Left, Side::Right];

    pub fn other(self) -> Side {
        match self {
            Side::Left => Side::Right,
            Side::Right => Side::Left,
        }
    }

    pub fn index(self) -> usize {
        match self {
            Side::Left => 0,
            Side::Right => 1,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Side::Left => "Folder 1",
            Side::Right => "Folder 2",
        }
    }
}

/// How the move target follows the non-active folder
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TargetMode {
    /// The other folder's path is read once, when a side is designated
    CapturedAtDesignation,
    /// The other folder's current path is used for every move
    #[default]
    TracksLiveField,
}

/// Where the cursor goes once a moved file has left the list
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AfterMove {
    /// Step forward from the removed position, as `advance` does
    #[default]
    Advance,
    /// Stay on the removed position, which now holds the following file
    StayOnNext,
}

/// Behaviour switches for a sorting session
#[derive(Debug, Clone, Copy)]
pub struct SessionOptions {
    pub target_mode: TargetMode,
    pub reset_cursor_on_designate: bool,
    pub refresh_after_move: bool,
    pub after_move: AfterMove,
    pub backup_policy: BackupPolicy,
}

impl Default for SessionOptions {
    fn default() -> Self {
        Self {
            target_mode: TargetMode::default(),
            reset_cursor_on_designate: true,
            refresh_after_move: true,
            after_move: AfterMove::default(),
            backup_policy: BackupPolicy::default(),
        }
    }
}

/// Result of a cursor step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    /// No folder has been designated
    Inactive,
    /// The active folder has no files
    Empty,
    /// The cursor now points at this index
    Moved(usize),
    /// At the last file; the cursor stays there
    AtEnd,
    /// At the first file; the cursor stays there
    AtStart,
}

/// Result of designating a folder as the source
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Designation {
    Preview(FileEntry),
    Empty,
}

/// A completed move
#[derive(Debug)]
pub struct MoveOutcome {
    pub entry: FileEntry,
    pub destination: PathBuf,
    pub backup: BackupCopy,
    /// Where the cursor landed after the entry left the list
    pub step: Step,
    /// Re-listing the folders after the move failed
    pub refresh_error: Option<io::Error>,
}

#[derive(Error, Debug)]
pub enum MoveError {
    #[error("No source folder selected")]
    NoActiveFolder,

    #[error("No move target folder selected")]
    NoMoveTarget,

    #[error("The source folder has no files")]
    EmptyFolder,

    #[error("Move target {0} is the source folder")]
    TargetIsSource(PathBuf),

    #[error("Backup failed: {0}")]
    Backup(#[source] FileOpError),

    #[error("Move failed: {0}")]
    Relocate(#[source] FileOpError),
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum UndoError {
    #[error("Undo is not supported")]
    Unsupported,
}

#[derive(Debug, Default)]
struct FolderSlot {
    path: Option<PathBuf>,
    files: FolderList,
}

/// Sorting session state
pub struct Session {
    options: SessionOptions,
    slots: [FolderSlot; 2],
    active: Option<Side>,
    cursor: usize,
    captured_target: Option<PathBuf>,
    backup_dir: PathBuf,
    file_ops: FileOperations,
}

impl Session {
    pub fn new(options: SessionOptions, backup_dir: PathBuf) -> Self {
        Self {
            options,
            slots: Default::default(),
            active: None,
            cursor: 0,
            captured_target: None,
            backup_dir,
            file_ops: FileOperations::new(),
        }
    }

    pub fn options(&self) -> &SessionOptions {
        &self.options
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    pub fn file_ops(&self) -> &FileOperations {
        &self.file_ops
    }

    pub fn clear_activity(&mut self) {
        self.file_ops.clear_logs();
    }

    pub fn folder_path(&self, side: Side) -> Option<&Path> {
        self.slots[side.index()].path.as_deref()
    }

    pub fn files(&self, side: Side) -> &[FileEntry] {
        &self.slots[side.index()].files
    }

    pub fn active_side(&self) -> Option<Side> {
        self.active
    }

    fn active_files(&self) -> &[FileEntry] {
        match self.active {
            Some(side) => self.files(side),
            None => &[],
        }
    }

    /// Point a side at `path` and list its files.
    ///
    /// On a listing error the side keeps the path but holds no files.
    pub fn set_folder(&mut self, side: Side, path: PathBuf) -> io::Result<usize> {
        self.slots[side.index()].path = Some(path);
        self.refresh(side)
    }

    pub fn clear_folder(&mut self, side: Side) {
        self.slots[side.index()] = FolderSlot::default();
        self.clamp_cursor();
    }

    /// Re-list one side from disk
    pub fn refresh(&mut self, side: Side) -> io::Result<usize> {
        let slot = &mut self.slots[side.index()];
        let result = match slot.path.as_deref() {
            Some(path) => list_folder(path),
            None => Ok(Vec::new()),
        };
        let result = match result {
            Ok(files) => {
                let count = files.len();
                slot.files = files;
                Ok(count)
            }
            Err(e) => {
                slot.files.clear();
                Err(e)
            }
        };
        self.clamp_cursor();
        result
    }

    /// Re-list both sides; returns the first error after trying both
    pub fn refresh_all(&mut self) -> io::Result<()> {
        let mut first_err = None;
        for side in Side::BOTH {
            if let Err(e) = self.refresh(side) {
                log::warn!("Failed to refresh {}: {}", side.label(), e);
                first_err.get_or_insert(e);
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Make `side` the source folder
    pub fn designate(&mut self, side: Side) -> Designation {
        self.active = Some(side);
        if self.options.target_mode == TargetMode::CapturedAtDesignation {
            self.captured_target = self.folder_path(side.other()).map(Path::to_path_buf);
        }
        if self.options.reset_cursor_on_designate {
            self.cursor = 0;
        }
        self.clamp_cursor();

        log::debug!(
            "Designated {} ({} files), target {:?}",
            side.label(),
            self.files(side).len(),
            self.move_target()
        );

        match self.current_entry() {
            Some(entry) => Designation::Preview(entry.clone()),
            None => Designation::Empty,
        }
    }

    /// Cursor into the active list, if it points at a file
    pub fn cursor(&self) -> Option<usize> {
        if self.active_files().is_empty() {
            None
        } else {
            Some(self.cursor)
        }
    }

    pub fn current_entry(&self) -> Option<&FileEntry> {
        self.active_files().get(self.cursor)
    }

    /// Status line text: `cursor/count`
    pub fn status(&self) -> String {
        match self.active {
            None => "-/-".to_string(),
            Some(_) => format!("{}/{}", self.cursor, self.active_files().len()),
        }
    }

    pub fn advance(&mut self) -> Step {
        let len = match self.active {
            None => return Step::Inactive,
            Some(_) => self.active_files().len(),
        };
        if len == 0 {
            return Step::Empty;
        }
        if self.cursor + 1 >= len {
            self.cursor = len - 1;
            return Step::AtEnd;
        }
        self.cursor += 1;
        Step::Moved(self.cursor)
    }

    pub fn retreat(&mut self) -> Step {
        if self.active.is_none() {
            return Step::Inactive;
        }
        if self.active_files().is_empty() {
            return Step::Empty;
        }
        if self.cursor == 0 {
            return Step::AtStart;
        }
        self.cursor -= 1;
        Step::Moved(self.cursor)
    }

    /// Folder a move from the active side goes to
    pub fn move_target(&self) -> Option<PathBuf> {
        let side = self.active?;
        let target = match self.options.target_mode {
            TargetMode::CapturedAtDesignation => self.captured_target.clone(),
            TargetMode::TracksLiveField => self.folder_path(side.other()).map(Path::to_path_buf),
        };
        target.filter(|p| !p.as_os_str().is_empty())
    }

    /// Back up the current file, then move it into the target folder
    pub fn move_current(&mut self) -> Result<MoveOutcome, MoveError> {
        let side = self.active.ok_or(MoveError::NoActiveFolder)?;
        let target = self.move_target().ok_or(MoveError::NoMoveTarget)?;
        let entry = self
            .current_entry()
            .cloned()
            .ok_or(MoveError::EmptyFolder)?;

        if let Some(source_dir) = entry.path.parent() {
            if same_dir(source_dir, &target) {
                return Err(MoveError::TargetIsSource(target));
            }
        }

        let backup = self
            .file_ops
            .backup_file(&entry.path, &self.backup_dir, self.options.backup_policy)
            .map_err(MoveError::Backup)?;

        let destination = match self.file_ops.relocate_file(&entry.path, &target) {
            Ok(destination) => destination,
            Err(e) => {
                self.file_ops.discard_backup(&backup);
                return Err(MoveError::Relocate(e));
            }
        };

        let removed_at = self.cursor;
        self.slots[side.index()].files.remove(removed_at);

        let refresh_error = if self.options.refresh_after_move {
            self.refresh_all().err()
        } else {
            None
        };

        let len = self.active_files().len();
        let step = if len == 0 {
            self.cursor = 0;
            Step::Empty
        } else {
            self.cursor = removed_at.min(len - 1);
            match self.options.after_move {
                AfterMove::Advance => self.advance(),
                AfterMove::StayOnNext if removed_at >= len => Step::AtEnd,
                AfterMove::StayOnNext => Step::Moved(removed_at),
            }
        };

        Ok(MoveOutcome {
            entry,
            destination,
            backup,
            step,
            refresh_error,
        })
    }

    pub fn undo(&mut self) -> Result<(), UndoError> {
        log::warn!("Undo requested but not supported");
        Err(UndoError::Unsupported)
    }

    /// Snapshot for persistence
    pub fn snapshot(&self) -> SessionConfig {
        let path_string = |side: Side| {
            self.folder_path(side)
                .map(|p| p.to_string_lossy().to_string())
                .unwrap_or_default()
        };
        SessionConfig {
            current_index: self.cursor as i64,
            folder1: path_string(Side::Left),
            folder2: path_string(Side::Right),
        }
    }

    /// Reload folders from a saved session and make folder 1 the source.
    ///
    /// The saved cursor is kept regardless of `reset_cursor_on_designate`,
    /// clamped to the restored list.
    pub fn restore(&mut self, config: &SessionConfig) -> Designation {
        for (side, path) in [(Side::Left, &config.folder1), (Side::Right, &config.folder2)] {
            if path.is_empty() {
                self.clear_folder(side);
            } else if let Err(e) = self.set_folder(side, PathBuf::from(path)) {
                log::warn!("Could not list saved {} {}: {}", side.label(), path, e);
            }
        }

        let reset = self.options.reset_cursor_on_designate;
        self.options.reset_cursor_on_designate = false;
        self.cursor = config.current_index.max(0) as usize;
        let designation = self.designate(Side::Left);
        self.options.reset_cursor_on_designate = reset;
        designation
    }

    fn clamp_cursor(&mut self) {
        let len = self.active_files().len();
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }
}

fn same_dir(a: &Path, b: &Path) -> bool {
    match (a.canonicalize(), b.canonicalize()) {
        (Ok(a), Ok(b)) => a == b,
        _ => a == b,
    }
}
