//! Application state management structures.
//!
//! This module contains the state structures that sit around the [`Editor`]: how the canvas
//! is placed on screen, what the pointer is doing, the side panel's edit buffers and the
//! channel that async file dialogs report back on.

use crate::constants;
use crate::editor::Editor;
use crate::export::ExportOptions;
use eframe::egui;
use std::collections::HashMap;
use std::sync::mpsc::{channel, Receiver, Sender};

/// Margin kept between the fitted canvas and the edge of the central panel, in points.
pub const CANVAS_MARGIN: f32 = 24.0;

/// Placement of the editor canvas inside the central panel.
///
/// Canvas coordinates map to screen coordinates as `canvas * zoom_factor + offset`.
pub struct CanvasView {
    /// Screen position of the canvas origin
    pub offset: egui::Vec2,
    /// Screen points per canvas pixel
    pub zoom_factor: f32,
}

impl Default for CanvasView {
    fn default() -> Self {
        Self {
            offset: egui::Vec2::ZERO,
            zoom_factor: 1.0,
        }
    }
}

impl CanvasView {
    /// Scales and centers a canvas of `dimensions` pixels inside `available`.
    ///
    /// # Arguments
    ///
    /// * `available` - Screen rectangle the canvas may occupy
    /// * `dimensions` - Canvas size in pixels
    pub fn fit(&mut self, available: egui::Rect, dimensions: (u32, u32)) {
        let (width, height) = (dimensions.0.max(1) as f32, dimensions.1.max(1) as f32);
        let room = (available.size() - egui::vec2(CANVAS_MARGIN, CANVAS_MARGIN) * 2.0)
            .max(egui::vec2(1.0, 1.0));
        self.zoom_factor = (room.x / width).min(room.y / height).min(1.0);
        let size = egui::vec2(width, height) * self.zoom_factor;
        self.offset = (available.center() - size / 2.0).to_vec2();
    }

    /// Screen rectangle covered by a canvas of `dimensions` pixels.
    pub fn screen_rect(&self, dimensions: (u32, u32)) -> egui::Rect {
        egui::Rect::from_min_size(
            self.offset.to_pos2(),
            egui::vec2(dimensions.0 as f32, dimensions.1 as f32) * self.zoom_factor,
        )
    }
}

/// State of the pointer over the canvas.
#[derive(Default)]
pub struct InteractionState {
    /// Whether a primary press on the canvas was forwarded to the editor and not yet released
    pub pointer_captured: bool,
    /// Last canvas position forwarded to the editor
    pub last_canvas_pos: Option<(f64, f64)>,
}

/// Edit buffers for the side panel.
pub struct PanelState {
    /// JSON pasted by the user for import
    pub import_text: String,
    /// Background color typed by the user
    pub background_color: String,
    /// Export options chosen in the panel
    pub export: ExportOptions,
}

impl Default for PanelState {
    fn default() -> Self {
        Self {
            import_text: String::new(),
            background_color: constants::DEFAULT_BACKGROUND_COLOR.to_string(),
            export: ExportOptions::default(),
        }
    }
}

/// A one-line message shown at the bottom of the side panel.
#[derive(Debug, Clone, PartialEq)]
pub struct StatusMessage {
    /// Text shown to the user
    pub text: String,
    /// Whether the message reports a failure
    pub is_error: bool,
}

impl StatusMessage {
    /// An informational message.
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: false,
        }
    }

    /// A failure message.
    pub fn error(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            is_error: true,
        }
    }
}

/// Messages sent from async file operations back to the main app.
#[derive(Debug)]
pub enum FileOperationResult {
    /// An import file was read, with its path and content
    ImportLoaded(String, String),
    /// The user picked a background image
    BackgroundChosen(String),
    /// An export was written to the given path
    ExportSaved(String),
    /// The user dismissed the export save dialog
    ExportCancelled,
    /// Writing the export failed with an error message
    ExportFailed(String),
    /// Operation failed with an error message
    OperationFailed(String),
}

/// State related to file dialogs and exports.
pub struct FileState {
    /// Channel for receiving file operation results from async contexts
    pub file_operation_sender: Sender<FileOperationResult>,
    /// Receiving end polled once per frame
    pub file_operation_receiver: Receiver<FileOperationResult>,
    /// Whether an export is waiting on its save dialog; only one runs at a time
    pub export_in_flight: bool,
}

impl Default for FileState {
    fn default() -> Self {
        let (sender, receiver) = channel();
        Self {
            file_operation_sender: sender,
            file_operation_receiver: receiver,
            export_in_flight: false,
        }
    }
}

/// Uploaded textures for decoded background images, keyed by the image's address.
#[derive(Default)]
pub struct TextureCache {
    /// Textures uploaded so far
    pub textures: HashMap<usize, egui::TextureHandle>,
}

/// The main application structure wrapping the [`Editor`].
///
/// This struct implements the `eframe::App` trait and handles all user interface
/// rendering and interaction logic.
pub struct StarMapApp {
    /// The editor context; every mutation goes through it
    pub editor: Editor,
    /// Canvas placement
    pub canvas: CanvasView,
    /// Pointer state
    pub interaction: InteractionState,
    /// Side panel buffers
    pub panel: PanelState,
    /// Async file operation plumbing
    pub file: FileState,
    /// Latest status message, if any
    pub status: Option<StatusMessage>,
    /// Background image textures
    pub textures: TextureCache,
}

impl Default for StarMapApp {
    fn default() -> Self {
        Self::new(Editor::default())
    }
}

impl StarMapApp {
    /// Wraps `editor`, mounting it if needed.
    ///
    /// # Arguments
    ///
    /// * `editor` - Editor context to drive
    pub fn new(mut editor: Editor) -> Self {
        if !editor.is_mounted() {
            editor.mount();
        }
        Self {
            editor,
            canvas: CanvasView::default(),
            interaction: InteractionState::default(),
            panel: PanelState::default(),
            file: FileState::default(),
            status: None,
            textures: TextureCache::default(),
        }
    }

    /// Replaces the status line with an informational message.
    pub fn set_status(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage::info(text));
    }

    /// Replaces the status line with a failure message.
    pub fn set_error(&mut self, text: impl Into<String>) {
        self.status = Some(StatusMessage::error(text));
    }
}

impl Drop for StarMapApp {
    fn drop(&mut self) {
        self.editor.unmount();
    }
}
