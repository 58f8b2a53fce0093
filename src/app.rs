//! GUI module - Application state and UI rendering
//!
//! This module wires the sorting session to an egui window: folder rows,
//! preview, navigation buttons, keyboard shortcuts and the status bar.

use std::path::{Path, PathBuf};

use rfd::{FileDialog, MessageButtons, MessageDialog, MessageLevel};

use crate::config::{self, SorterOptions};
use crate::file_ops::{ensure_backup_dir, BackupCopy};
use crate::scanner::{format_size, FileEntry};
use crate::session::{Designation, MoveError, Session, Side, Step, TargetMode};

const ACTIVE_FRAME_COLOR: egui::Color32 = egui::Color32::from_rgb(0, 0, 255);

/// Modal notice shown at list boundaries and for empty folders
#[derive(Clone)]
struct Notice {
    title: String,
    text: String,
}

#[derive(Clone)]
enum MessageType {
    Info,
    Success,
    Error,
}

/// Cached size line for the previewed file
struct PreviewInfo {
    path: PathBuf,
    dimensions: Option<(u32, u32)>,
}

/// Application state
pub struct FolderSorterApp {
    options: SorterOptions,
    session: Session,
    path_fields: [String; 2],
    notice: Option<Notice>,
    status_message: Option<(String, MessageType)>,
    preview_info: Option<PreviewInfo>,
    show_log_panel: bool,
}

impl FolderSorterApp {
    pub fn new(cc: &eframe::CreationContext<'_>, options: SorterOptions) -> Self {
        egui_extras::install_image_loaders(&cc.egui_ctx);
        Self::with_options(options)
    }

    fn with_options(options: SorterOptions) -> Self {
        let session = Session::new(options.session, options.backup_dir.clone());
        let mut app = Self {
            options,
            session,
            path_fields: Default::default(),
            notice: None,
            status_message: None,
            preview_info: None,
            show_log_panel: false,
        };

        if let Err(e) = ensure_backup_dir(&app.options.backup_dir) {
            log::error!("{}", e);
            let _ = MessageDialog::new()
                .set_level(MessageLevel::Error)
                .set_title("Create Folder")
                .set_description(e.to_string())
                .set_buttons(MessageButtons::Ok)
                .show();
            app.status_message = Some((e.to_string(), MessageType::Error));
        }

        app.restore_session();

        for side in Side::BOTH {
            if let Some(folder) = app.options.initial_folders[side.index()].clone() {
                app.select_folder(side, folder);
            }
        }

        app.sync_path_fields();
        app
    }

    fn restore_session(&mut self) {
        let Some(path) = self.options.config_path.clone() else {
            return;
        };
        match config::load_session(&path) {
            Ok(Some(saved)) => {
                log::info!("Restoring session from {}", path.display());
                let designation = self.session.restore(&saved);
                self.show_designation(Side::Left, designation);
            }
            Ok(None) => {}
            Err(e) => {
                log::warn!("Ignoring saved session: {:#}", e);
                self.status_message = Some((
                    format!("Saved session ignored: {}", e),
                    MessageType::Error,
                ));
            }
        }
    }

    fn save_session(&self) {
        let Some(path) = &self.options.config_path else {
            return;
        };
        match config::save_session(path, &self.session.snapshot()) {
            Ok(()) => log::info!("Saved session to {}", path.display()),
            Err(e) => log::error!("Failed to save session: {:#}", e),
        }
    }

    fn sync_path_fields(&mut self) {
        for side in Side::BOTH {
            self.path_fields[side.index()] = self
                .session
                .folder_path(side)
                .map(|p| p.display().to_string())
                .unwrap_or_default();
        }
    }

    fn pick_folder(&mut self, side: Side) {
        let start = self
            .session
            .folder_path(side)
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.options.working_root.clone());
        if let Some(folder) = FileDialog::new()
            .set_title("Open a folder")
            .set_directory(start)
            .pick_folder()
        {
            self.path_fields[side.index()] = folder.display().to_string();
            self.select_folder(side, folder);
        }
    }

    fn select_folder(&mut self, side: Side, folder: PathBuf) {
        match self.session.set_folder(side, folder.clone()) {
            Ok(count) => {
                self.status_message = Some((
                    format!("{}: {} file(s)", side.label(), count),
                    MessageType::Info,
                ));
            }
            Err(e) => {
                log::warn!("Could not list {}: {}", folder.display(), e);
                self.status_message = Some((
                    format!("Could not list {}: {}", folder.display(), e),
                    MessageType::Error,
                ));
            }
        }
    }

    fn on_path_edited(&mut self, side: Side) {
        let text = self.path_fields[side.index()].trim().to_string();
        if text.is_empty() {
            self.session.clear_folder(side);
        } else {
            self.select_folder(side, PathBuf::from(text));
        }
    }

    fn designate(&mut self, side: Side) {
        let designation = self.session.designate(side);
        self.show_designation(side, designation);
    }

    fn show_designation(&mut self, side: Side, designation: Designation) {
        match designation {
            Designation::Preview(entry) => {
                self.status_message = Some((
                    format!("Sorting {} -> {}", side.label(), side.other().label()),
                    MessageType::Info,
                ));
                log::debug!("Preview {}", entry.name);
            }
            Designation::Empty => self.notice_not_found(side),
        }
    }

    fn notice_not_found(&mut self, side: Side) {
        let folder = self
            .session
            .folder_path(side)
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none)".to_string());
        self.notice = Some(Notice {
            title: "Not Found".to_string(),
            text: format!("No files found in {}", folder),
        });
    }

    fn show_step(&mut self, step: Step) {
        match step {
            Step::Moved(_) => {}
            Step::Inactive => {
                log::warn!("No source folder selected");
                self.status_message = Some((
                    "Select a source folder first.".to_string(),
                    MessageType::Error,
                ));
            }
            Step::Empty => {
                if let Some(side) = self.session.active_side() {
                    self.notice_not_found(side);
                }
            }
            Step::AtEnd => {
                self.notice = Some(Notice {
                    title: "End".to_string(),
                    text: "This is the last file.".to_string(),
                });
            }
            Step::AtStart => {
                self.notice = Some(Notice {
                    title: "Start".to_string(),
                    text: "This is the first file.".to_string(),
                });
            }
        }
    }

    fn on_next(&mut self) {
        let step = self.session.advance();
        self.show_step(step);
    }

    fn on_previous(&mut self) {
        let step = self.session.retreat();
        self.show_step(step);
    }

    fn on_move(&mut self, ctx: &egui::Context) {
        match self.session.move_current() {
            Ok(outcome) => {
                ctx.forget_image(&file_uri(&outcome.entry.path));
                let note = match &outcome.backup {
                    BackupCopy::Created(_) => "",
                    BackupCopy::Skipped(_) => " (existing backup kept)",
                };
                self.status_message = Some(match &outcome.refresh_error {
                    None => (
                        format!(
                            "Moved {} -> {}{}",
                            outcome.entry.name,
                            outcome.destination.display(),
                            note
                        ),
                        MessageType::Success,
                    ),
                    Some(e) => (
                        format!(
                            "Moved {} -> {}, but re-listing the folders failed: {}",
                            outcome.entry.name,
                            outcome.destination.display(),
                            e
                        ),
                        MessageType::Error,
                    ),
                });
                self.show_step(outcome.step);
            }
            Err(e) => {
                match &e {
                    MoveError::Backup(_) | MoveError::Relocate(_) => log::error!("{}", e),
                    _ => log::warn!("{}", e),
                }
                self.status_message = Some((e.to_string(), MessageType::Error));
            }
        }
    }

    fn on_undo(&mut self) {
        if let Err(e) = self.session.undo() {
            self.status_message = Some((e.to_string(), MessageType::Info));
        }
    }

    fn on_refresh(&mut self) {
        match self.session.refresh_all() {
            Ok(()) => {
                self.status_message = Some(("Folders refreshed.".to_string(), MessageType::Info))
            }
            Err(e) => {
                self.status_message =
                    Some((format!("Refresh failed: {}", e), MessageType::Error))
            }
        }
    }

    /// Everything behind an open notice is inert until it is dismissed
    fn interactive(&self) -> bool {
        self.notice.is_none()
    }

    fn handle_shortcuts(&mut self, ctx: &egui::Context) {
        let pressed = |key| ctx.input_mut(|i| i.consume_key(egui::Modifiers::NONE, key));

        if self.notice.is_some() {
            if pressed(egui::Key::Enter) || pressed(egui::Key::Escape) || pressed(egui::Key::Space) {
                self.notice = None;
            }
            return;
        }
        // Typing in a path field
        if ctx.wants_keyboard_input() {
            return;
        }

        if pressed(egui::Key::ArrowRight) {
            self.on_next();
        }
        if pressed(egui::Key::ArrowLeft) {
            self.on_previous();
        }
        if pressed(egui::Key::Space) {
            self.on_move(ctx);
        }
        if pressed(egui::Key::Backspace) {
            self.on_undo();
        }
        if pressed(egui::Key::F5) {
            self.on_refresh();
        }
    }

    fn render_header(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.heading("Folder Sorter");
            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(env!("CARGO_PKG_VERSION"));
                ui.separator();
                ui.checkbox(&mut self.show_log_panel, "Activity");
                if ui.button("Refresh").on_hover_text("F5").clicked() {
                    self.on_refresh();
                }
            });
        });
        ui.separator();
    }

    fn render_folder_row(&mut self, ui: &mut egui::Ui, side: Side) {
        let is_active = self.session.active_side() == Some(side);
        let file_count = self.session.files(side).len();
        let stroke = if is_active {
            egui::Stroke::new(1.0, ACTIVE_FRAME_COLOR)
        } else {
            egui::Stroke::NONE
        };

        let mut pick = false;
        let mut edited = false;
        let mut activate = false;

        egui::Frame::group(ui.style()).stroke(stroke).show(ui, |ui| {
            ui.horizontal(|ui| {
                ui.label(side.label());
                if ui.button("Select...").clicked() {
                    pick = true;
                }
                let field = egui::TextEdit::singleline(&mut self.path_fields[side.index()])
                    .hint_text("Folder path")
                    .desired_width((ui.available_width() - 200.0).max(120.0));
                if ui.add(field).changed() {
                    edited = true;
                }
                ui.label(format!("{} file(s)", file_count));
                if ui.button("Use as source").clicked() {
                    activate = true;
                }
            });
        });

        if pick {
            self.pick_folder(side);
        }
        if edited {
            self.on_path_edited(side);
        }
        if activate {
            self.designate(side);
        }
    }

    fn render_controls(&mut self, ui: &mut egui::Ui, ctx: &egui::Context) {
        ui.horizontal(|ui| {
            if ui.button("< Previous").on_hover_text("Left arrow").clicked() {
                self.on_previous();
            }
            if ui.button("Move").on_hover_text("Space").clicked() {
                self.on_move(ctx);
            }
            if ui.button("Next >").on_hover_text("Right arrow").clicked() {
                self.on_next();
            }
            if ui.button("Undo").on_hover_text("Backspace").clicked() {
                self.on_undo();
            }
            ui.separator();
            let target = self
                .session
                .move_target()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "(no target)".to_string());
            let mode = match self.session.options().target_mode {
                TargetMode::CapturedAtDesignation => "captured when the source was chosen",
                TargetMode::TracksLiveField => "follows the other folder",
            };
            ui.label(egui::RichText::new(format!("Target: {}", target)).small())
                .on_hover_text(format!(
                    "Target {}\nBackups go to {}",
                    mode,
                    self.session.backup_dir().display()
                ));
        });
    }

    fn render_preview(&mut self, ui: &mut egui::Ui) {
        let entry = match self.session.current_entry().cloned() {
            Some(e) => e,
            None => {
                ui.vertical_centered(|ui| {
                    ui.add_space(50.0);
                    ui.label("Select two folders and choose one as the source.");
                });
                return;
            }
        };

        let dimensions = self.dimensions_for(&entry);
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new(&entry.name).strong());
            ui.label(format_size(entry.size));
            if let Some((w, h)) = dimensions {
                ui.label(egui::RichText::new(format!("{}x{}", w, h)).small());
            }
            if ui
                .small_button("Open")
                .on_hover_text("Open with default app")
                .clicked()
            {
                if let Err(e) = open::that(&entry.path) {
                    log::warn!("Failed to open {}: {}", entry.path.display(), e);
                }
            }
        });
        ui.add_space(4.0);

        let available = ui.available_size();
        ui.centered_and_justified(|ui| {
            ui.add(
                egui::Image::new(file_uri(&entry.path))
                    .max_size(available)
                    .maintain_aspect_ratio(true)
                    .shrink_to_fit(),
            );
        });
    }

    fn dimensions_for(&mut self, entry: &FileEntry) -> Option<(u32, u32)> {
        let stale = self
            .preview_info
            .as_ref()
            .map_or(true, |info| info.path != entry.path);
        if stale {
            self.preview_info = Some(PreviewInfo {
                path: entry.path.clone(),
                dimensions: image::image_dimensions(&entry.path).ok(),
            });
        }
        self.preview_info.as_ref().and_then(|info| info.dimensions)
    }

    fn render_log_panel(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            ui.label(egui::RichText::new("Activity").strong());
            if ui.small_button("Clear").clicked() {
                self.session.clear_activity();
            }
        });
        ui.separator();
        egui::ScrollArea::vertical()
            .auto_shrink([false, false])
            .stick_to_bottom(true)
            .show(ui, |ui| {
                for entry in self.session.file_ops().get_logs() {
                    let color = if entry.success {
                        egui::Color32::GRAY
                    } else {
                        egui::Color32::RED
                    };
                    let detail = match &entry.destination {
                        Some(dest) => format!("{}\n-> {}", entry.source.display(), dest.display()),
                        None => entry.source.display().to_string(),
                    };
                    ui.label(
                        egui::RichText::new(format!(
                            "{} [{}] {}",
                            entry.timestamp.format("%H:%M:%S"),
                            entry.operation,
                            entry.message
                        ))
                        .color(color)
                        .small(),
                    )
                    .on_hover_text(detail);
                }
            });
    }

    fn render_notice(&mut self, ctx: &egui::Context) {
        let notice = match self.notice.clone() {
            Some(n) => n,
            None => return,
        };

        egui::Window::new(notice.title.as_str())
            .collapsible(false)
            .resizable(false)
            .anchor(egui::Align2::CENTER_CENTER, [0.0, 0.0])
            .show(ctx, |ui| {
                ui.label(&notice.text);
                if ui.button("OK").clicked() {
                    self.notice = None;
                }
            });
    }

    fn render_status_bar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if let Some((msg, msg_type)) = &self.status_message {
                let color = match msg_type {
                    MessageType::Info => egui::Color32::GRAY,
                    MessageType::Success => egui::Color32::from_rgb(100, 255, 100),
                    MessageType::Error => egui::Color32::RED,
                };
                ui.label(egui::RichText::new(msg).color(color));
            }

            ui.with_layout(egui::Layout::right_to_left(egui::Align::Center), |ui| {
                ui.label(self.session.status());
            });
        });
    }
}

fn file_uri(path: &Path) -> String {
    format!("file://{}", path.display())
}

impl eframe::App for FolderSorterApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        self.handle_shortcuts(ctx);

        // Bottom panel for status bar - always anchored at bottom
        egui::TopBottomPanel::bottom("status_bar")
            .exact_height(28.0)
            .show(ctx, |ui| {
                self.render_status_bar(ui);
            });

        let interactive = self.interactive();

        egui::TopBottomPanel::top("folders").show(ctx, |ui| {
            ui.add_enabled_ui(interactive, |ui| {
                self.render_header(ui);
                self.render_folder_row(ui, Side::Left);
                self.render_folder_row(ui, Side::Right);
                ui.add_space(4.0);
                self.render_controls(ui, ctx);
                ui.add_space(4.0);
            });
        });

        if self.show_log_panel {
            egui::SidePanel::right("activity_panel")
                .resizable(true)
                .default_width(260.0)
                .width_range(150.0..=500.0)
                .show(ctx, |ui| {
                    self.render_log_panel(ui);
                });
        }

        egui::CentralPanel::default().show(ctx, |ui| {
            ui.add_enabled_ui(interactive, |ui| {
                self.render_preview(ui);
            });
        });

        self.render_notice(ctx);
    }

    fn on_exit(&mut self, _gl: Option<&eframe::glow::Context>) {
        self.save_session();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn options_in(root: &Path) -> SorterOptions {
        let mut options = SorterOptions::new(root.to_path_buf());
        options.config_path = None;
        options
    }

    #[test]
    fn test_notice_disables_controls_until_dismissed() {
        let dir = tempdir().unwrap();
        let x = dir.path().join("x");
        let y = dir.path().join("y");
        fs::create_dir(&x).unwrap();
        fs::create_dir(&y).unwrap();
        fs::write(x.join("a.jpg"), "a").unwrap();

        let mut options = options_in(dir.path());
        options.initial_folders = [Some(x), Some(y)];
        let mut app = FolderSorterApp::with_options(options);
        assert!(app.interactive());
        assert!(dir.path().join("false-positive").is_dir());

        app.designate(Side::Right);
        assert!(!app.interactive());
        assert_eq!(app.notice.as_ref().unwrap().title, "Not Found");

        app.notice = None;
        app.designate(Side::Left);
        app.on_next();
        assert!(!app.interactive());
        assert_eq!(app.notice.as_ref().unwrap().title, "End");
    }

    #[test]
    fn test_move_reports_failed_refresh() {
        let dir = tempdir().unwrap();
        let x = dir.path().join("x");
        let y = dir.path().join("y");
        fs::create_dir(&x).unwrap();
        fs::create_dir(&y).unwrap();
        fs::write(x.join("a.jpg"), "a").unwrap();
        fs::write(x.join("b.jpg"), "b").unwrap();

        let mut options = options_in(dir.path());
        options.initial_folders = [Some(x), Some(y.clone())];
        options.session.target_mode = TargetMode::CapturedAtDesignation;
        let mut app = FolderSorterApp::with_options(options);
        app.designate(Side::Left);
        app.path_fields[Side::Right.index()] = dir.path().join("gone").display().to_string();
        app.on_path_edited(Side::Right);

        app.on_move(&egui::Context::default());

        assert!(y.join("a.jpg").exists());
        let (msg, msg_type) = app.status_message.clone().unwrap();
        assert!(matches!(msg_type, MessageType::Error));
        assert!(msg.contains("re-listing the folders failed"));
    }
}
