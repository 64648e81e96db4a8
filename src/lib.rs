//! # Star Map Editor
//!
//! An interactive editor for star maps: import a set of stars and the connections between
//! them, render them with layered glow styling on a resizable canvas, move, scale and rotate
//! the whole constellation as one rigid body, and export a PNG or JPEG snapshot.
//!
//! ## Architecture
//! - [`store::GeometryStore`] owns canonical state and validates imports
//! - [`reconciler::RenderReconciler`] keeps the retained [`scene::SceneTree`] in sync with it
//! - [`session::TransformSession`] drives drag/scale/rotate gestures and commits them
//! - [`export::ExportPipeline`] rasterizes the scene without disturbing it
//! - [`editor::Editor`] owns all of the above and is the only entry point the UI uses

#![warn(missing_docs)]
#![deny(unsafe_code)]

pub mod constants;
pub mod editor;
pub mod error;
pub mod export;
pub mod mapper;
pub mod raster;
pub mod reconciler;
pub mod resources;
pub mod scene;
pub mod session;
pub mod store;
pub mod style;
pub mod types;
mod ui;

pub use editor::{Editor, PointerButton};
pub use error::{ConfigError, ExportError, ImportError, ResourceError, ValidationError};
pub use export::{ExportFormat, ExportOptions, ExportOutput, PixelRatio};
pub use style::StyleDefaults;
pub use types::*;
pub use ui::StarMapApp;

/// Runs the star map editor with default settings.
///
/// This function initializes the egui application window and starts the main event loop.
/// Background decoding and file dialogs use the tokio runtime entered by the caller, if any.
///
/// # Returns
///
/// Returns `Ok(())` if the application runs successfully, or an `eframe::Error` if
/// initialization fails.
///
/// # Example
///
/// ```no_run
/// use star_map_editor::run_app;
///
/// fn main() -> Result<(), eframe::Error> {
///     run_app()
/// }
/// ```
pub fn run_app() -> Result<(), eframe::Error> {
    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1100.0, 800.0])
            .with_title("Star Map Editor"),
        ..Default::default()
    };
    eframe::run_native(
        "Star Map Editor",
        options,
        Box::new(|_cc| Ok(Box::new(StarMapApp::default()))),
    )
}
