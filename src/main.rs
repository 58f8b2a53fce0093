//! Folder Sorter - A lightweight two-folder image sorting tool
//!
//! Browse the images of one folder, preview them one at a time and move
//! the current one into the other folder. Every moved file is first
//! copied into a backup folder.

#![cfg_attr(not(debug_assertions), windows_subsystem = "windows")]

mod app;
mod config;
mod file_ops;
mod scanner;
mod session;

use std::path::PathBuf;

use clap::{Parser, ValueEnum};

use app::FolderSorterApp;
use config::{default_working_root, SorterOptions};
use file_ops::BackupPolicy;
use session::{AfterMove, TargetMode};

#[derive(Debug, Clone, Copy, ValueEnum)]
enum TargetArg {
    /// Move target is read when a source folder is chosen
    Captured,
    /// Move target follows the other folder's path field
    Live,
}

#[derive(Debug, Parser)]
#[command(name = "folder-sorter", version, about = "Sort images between two folders")]
struct Args {
    /// Start directory for folder dialogs and parent of the backup folder
    #[arg(long)]
    working_root: Option<PathBuf>,

    /// Backup folder (default: <working-root>/false-positive)
    #[arg(long)]
    backup_dir: Option<PathBuf>,

    /// Open this folder as folder 1
    #[arg(long)]
    folder1: Option<PathBuf>,

    /// Open this folder as folder 2
    #[arg(long)]
    folder2: Option<PathBuf>,

    /// Session file read at start and written on close
    #[arg(long, default_value = config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Do not load or save the session file
    #[arg(long)]
    no_persist: bool,

    #[arg(long, value_enum, default_value_t = TargetArg::Live)]
    target_mode: TargetArg,

    /// Keep the cursor position when switching the source folder
    #[arg(long)]
    keep_cursor: bool,

    /// Do not re-list both folders after each move
    #[arg(long)]
    no_refresh_after_move: bool,

    /// After a move, show the file that took its place instead of stepping past it
    #[arg(long)]
    stay_on_next: bool,

    /// Keep older backups of the same name instead of skipping the copy
    #[arg(long)]
    keep_both_backups: bool,
}

impl Args {
    fn into_options(self) -> SorterOptions {
        let working_root = self.working_root.unwrap_or_else(default_working_root);
        let mut options = SorterOptions::new(working_root);

        if let Some(backup_dir) = self.backup_dir {
            options.backup_dir = backup_dir;
        }
        options.config_path = (!self.no_persist).then_some(self.config);
        options.initial_folders = [self.folder1, self.folder2];

        options.session.target_mode = match self.target_mode {
            TargetArg::Captured => TargetMode::CapturedAtDesignation,
            TargetArg::Live => TargetMode::TracksLiveField,
        };
        options.session.reset_cursor_on_designate = !self.keep_cursor;
        options.session.refresh_after_move = !self.no_refresh_after_move;
        if self.stay_on_next {
            options.session.after_move = AfterMove::StayOnNext;
        }
        if self.keep_both_backups {
            options.session.backup_policy = BackupPolicy::KeepBoth;
        }
        options
    }
}

fn main() -> eframe::Result<()> {
    // Initialize logging in debug mode
    #[cfg(debug_assertions)]
    env_logger::init();

    let options = Args::parse().into_options();
    log::debug!("Starting with {:?}", options);

    let native_options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1000.0, 700.0])
            .with_min_inner_size([600.0, 400.0])
            .with_title("Folder Sorter"),
        ..Default::default()
    };

    eframe::run_native(
        "Folder Sorter",
        native_options,
        Box::new(|cc| Ok(Box::new(FolderSorterApp::new(cc, options)))),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_args() {
        let options = Args::parse_from(["folder-sorter", "--working-root", "/data"]).into_options();
        assert_eq!(options.backup_dir, PathBuf::from("/data/false-positive"));
        assert_eq!(options.config_path, Some(PathBuf::from("config.json")));
        assert_eq!(options.session.target_mode, TargetMode::TracksLiveField);
        assert!(options.session.reset_cursor_on_designate);
        assert!(options.session.refresh_after_move);
        assert_eq!(options.session.after_move, AfterMove::Advance);
        assert_eq!(options.session.backup_policy, BackupPolicy::SkipExisting);
    }

    #[test]
    fn test_flags_map_to_options() {
        let options = Args::parse_from([
            "folder-sorter",
            "--folder1",
            "/x",
            "--folder2",
            "/y",
            "--no-persist",
            "--target-mode",
            "captured",
            "--keep-cursor",
            "--no-refresh-after-move",
            "--stay-on-next",
            "--keep-both-backups",
            "--backup-dir",
            "/bk",
        ])
        .into_options();
        assert_eq!(
            options.initial_folders,
            [Some(PathBuf::from("/x")), Some(PathBuf::from("/y"))]
        );
        assert_eq!(options.config_path, None);
        assert_eq!(options.backup_dir, PathBuf::from("/bk"));
        assert_eq!(options.session.target_mode, TargetMode::CapturedAtDesignation);
        assert!(!options.session.reset_cursor_on_designate);
        assert!(!options.session.refresh_after_move);
        assert_eq!(options.session.after_move, AfterMove::StayOnNext);
        assert_eq!(options.session.backup_policy, BackupPolicy::KeepBoth);
    }
}
