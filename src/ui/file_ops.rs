//! File operations: importing star maps, choosing background images and saving exports.
//!
//! Native file dialogs run on the tokio runtime and report back over the channel in
//! [`super::state::FileState`], which is drained once per frame.

use super::state::{FileOperationResult, StarMapApp};
use crate::export::ExportFormat;
use eframe::egui;
use std::future::Future;
use std::time::Duration;

/// How often to repaint while a background image is decoding.
const DECODE_POLL_INTERVAL: Duration = Duration::from_millis(100);

impl StarMapApp {
    /// Handles completed file operations and background decodes.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context for requesting repaints
    pub fn handle_pending_operations(&mut self, ctx: &egui::Context) {
        while let Ok(result) = self.file.file_operation_receiver.try_recv() {
            match result {
                FileOperationResult::ImportLoaded(path, content) => {
                    self.import_text(&content, &path);
                }
                FileOperationResult::BackgroundChosen(path) => {
                    self.editor.set_background_image(&path);
                    self.set_status(format!("Loading {path}"));
                }
                FileOperationResult::ExportSaved(path) => {
                    self.file.export_in_flight = false;
                    self.set_status(format!("Exported to {path}"));
                }
                FileOperationResult::ExportCancelled => {
                    self.file.export_in_flight = false;
                }
                FileOperationResult::ExportFailed(error) => {
                    self.file.export_in_flight = false;
                    self.set_error(error);
                }
                FileOperationResult::OperationFailed(error) => {
                    self.set_error(error);
                }
            }
        }

        match self.editor.poll_resources() {
            Some(Ok(())) => self.set_status("Background image loaded"),
            Some(Err(err)) => self.set_error(err.to_string()),
            None => {}
        }
        if self.editor.is_loading_background() {
            ctx.request_repaint_after(DECODE_POLL_INTERVAL);
        }
    }

    /// Imports a JSON star map and reports the outcome in the status line.
    ///
    /// # Arguments
    ///
    /// * `text` - The JSON document
    /// * `source` - Where the document came from, for the status message
    ///
    /// # Returns
    ///
    /// Whether the import was applied.
    pub fn import_text(&mut self, text: &str, source: &str) -> bool {
        match self.editor.import_json(text) {
            Ok(summary) => {
                self.set_status(format!(
                    "Imported {} stars and {} lines from {source}",
                    summary.stars, summary.lines
                ));
                true
            }
            Err(err) => {
                self.set_error(err.to_string());
                false
            }
        }
    }

    /// Opens a file picker for a JSON star map.
    pub fn open_import_dialog(&mut self, ctx: &egui::Context) {
        let ctx = ctx.clone();
        let sender = self.file.file_operation_sender.clone();
        self.spawn_file_task(async move {
            if let Some(handle) = rfd::AsyncFileDialog::new()
                .add_filter("JSON", &["json"])
                .pick_file()
                .await
            {
                let path = handle.path().display().to_string();
                let message = match std::fs::read_to_string(handle.path()) {
                    Ok(content) => FileOperationResult::ImportLoaded(path, content),
                    Err(e) => {
                        FileOperationResult::OperationFailed(format!("Failed to read {path}: {e}"))
                    }
                };
                let _ = sender.send(message);
            }
            ctx.request_repaint();
        });
    }

    /// Opens a file picker for a background image.
    pub fn open_background_dialog(&mut self, ctx: &egui::Context) {
        let ctx = ctx.clone();
        let sender = self.file.file_operation_sender.clone();
        self.spawn_file_task(async move {
            if let Some(handle) = rfd::AsyncFileDialog::new()
                .add_filter("Images", &["png", "jpg", "jpeg"])
                .pick_file()
                .await
            {
                let path = handle.path().display().to_string();
                let _ = sender.send(FileOperationResult::BackgroundChosen(path));
            }
            ctx.request_repaint();
        });
    }

    /// Renders an export with the panel's options and asks where to save it.
    ///
    /// Only one export runs at a time; a request made while one is waiting on its save dialog
    /// is refused.
    ///
    /// # Returns
    ///
    /// Whether a save dialog was started.
    pub fn start_export(&mut self, ctx: &egui::Context) -> bool {
        if self.file.export_in_flight {
            self.set_status("An export is already in progress");
            return false;
        }
        let options = self.panel.export;
        let output = match self.editor.export(&options) {
            Ok(output) => output,
            Err(err) => {
                self.set_error(format!("Export failed: {err}"));
                return false;
            }
        };

        let ctx = ctx.clone();
        let sender = self.file.file_operation_sender.clone();
        let filter = match options.format {
            ExportFormat::Png => "PNG image",
            ExportFormat::Jpeg => "JPEG image",
        };
        let extension = options.format.extension();
        let started = self.spawn_file_task(async move {
            let message = match rfd::AsyncFileDialog::new()
                .add_filter(filter, &[extension])
                .set_file_name(output.filename.as_str())
                .save_file()
                .await
            {
                Some(handle) => {
                    let path = handle.path().display().to_string();
                    match std::fs::write(handle.path(), &output.bytes) {
                        Ok(()) => FileOperationResult::ExportSaved(path),
                        Err(e) => FileOperationResult::ExportFailed(format!(
                            "Failed to save {path}: {e}"
                        )),
                    }
                }
                None => FileOperationResult::ExportCancelled,
            };
            let _ = sender.send(message);
            ctx.request_repaint();
        });
        self.file.export_in_flight = started;
        started
    }

    /// Runs `task` on the ambient tokio runtime.
    ///
    /// # Returns
    ///
    /// `false` (with an error in the status line) when no runtime is available.
    fn spawn_file_task<F>(&mut self, task: F) -> bool
    where
        F: Future<Output = ()> + Send + 'static,
    {
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(task);
                true
            }
            Err(err) => {
                log::error!("cannot open a file dialog: {err}");
                self.set_error("File dialogs are unavailable");
                false
            }
        }
    }
}
