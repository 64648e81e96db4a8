//! The editor context: one explicitly constructed owner of the store, the render reconciler,
//! the transform session, the export pipeline and the background loader.
//!
//! The interaction layer talks to nothing else. Every mutation commits a gesture still in
//! progress, writes the store, then reconciles the render tree, so the session never holds
//! the tree while something else rebuilds it.

use crate::error::{ConfigError, ExportError, ImportError, ResourceError, ValidationError};
use crate::export::{ExportOptions, ExportOutput, ExportPipeline};
use crate::reconciler::{Hit, RenderReconciler};
use crate::resources::BackgroundLoader;
use crate::scene::{GizmoHandle, SceneTree};
use crate::session::{GestureKind, TransformSession};
use crate::store::{GeometryStore, ImportSummary};
use crate::style::StyleDefaults;
use crate::types::*;
use serde_json::Value;

/// Pointer button of a press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerButton {
    /// Left button, or a touch
    Primary,
    /// Right button
    Secondary,
    /// Middle button
    Middle,
}

/// Editor context object.
#[derive(Debug)]
pub struct Editor {
    store: GeometryStore,
    reconciler: RenderReconciler,
    session: TransformSession,
    exporter: ExportPipeline,
    loader: BackgroundLoader,
}

impl Default for Editor {
    fn default() -> Self {
        Self::new(StyleDefaults::default())
    }
}

impl Editor {
    /// Creates an unmounted editor seeded from `defaults`.
    pub fn new(defaults: StyleDefaults) -> Self {
        Self::with_loader(defaults, BackgroundLoader::default())
    }

    /// Creates an unmounted editor with a specific background loader.
    pub fn with_loader(defaults: StyleDefaults, loader: BackgroundLoader) -> Self {
        Self {
            store: GeometryStore::new(defaults),
            reconciler: RenderReconciler::new(),
            session: TransformSession::new(),
            exporter: ExportPipeline::new(),
            loader,
        }
    }

    // ----- lifecycle -----

    /// Builds the render tree and starts loading the background image, if any.
    pub fn mount(&mut self) {
        self.loader.attach();
        self.reconciler.mount(&mut self.store);
        self.request_background_image();
    }

    /// Commits any gesture, detaches pending decodes and drops the render tree.
    pub fn unmount(&mut self) {
        self.session.end(&mut self.store, &mut self.reconciler);
        self.loader.detach();
        self.reconciler.unmount();
    }

    /// Whether the render tree exists.
    pub fn is_mounted(&self) -> bool {
        self.reconciler.is_mounted()
    }

    // ----- read access -----

    /// Canonical state.
    pub fn store(&self) -> &GeometryStore {
        &self.store
    }

    /// The render reconciler.
    pub fn reconciler(&self) -> &RenderReconciler {
        &self.reconciler
    }

    /// The render tree.
    pub fn tree(&self) -> &SceneTree {
        self.reconciler.tree()
    }

    /// The transform session.
    pub fn session(&self) -> &TransformSession {
        &self.session
    }

    /// Whether a background decode is outstanding.
    pub fn is_loading_background(&self) -> bool {
        self.loader.is_pending()
    }

    // ----- mutation plumbing -----

    fn commit_gesture(&mut self) {
        self.session.end(&mut self.store, &mut self.reconciler);
    }

    fn reconcile(&mut self) {
        self.reconciler.sync(&mut self.store);
    }

    fn request_background_image(&mut self) {
        let Some(url) = self.store.background().image_url().map(str::to_string) else {
            self.loader.cancel();
            return;
        };
        match self.reconciler.background_image(&url).map(|image| image.size()) {
            // Already decoded; the store forgot its size when the background switched away.
            Some(size) => {
                self.loader.cancel();
                self.store.set_background_natural_size(&url, size);
            }
            None => {
                self.loader.request(&url);
            }
        }
    }

    // ----- store operations -----

    /// Imports a JSON scene document.
    pub fn import_json(&mut self, text: &str) -> Result<ImportSummary, ImportError> {
        self.commit_gesture();
        let result = self.store.import_json(text);
        if let Err(err) = &result {
            log::warn!("import rejected: {err}");
        }
        self.reconcile();
        result
    }

    /// Imports already-parsed `points` and `connections` arrays.
    pub fn import_scene(
        &mut self,
        points: &[Value],
        connections: &[Value],
    ) -> Result<ImportSummary, ValidationError> {
        self.commit_gesture();
        let result = self.store.import_scene(points, connections);
        if let Err(err) = &result {
            log::warn!("import rejected: {err}");
        }
        self.reconcile();
        result
    }

    /// Shallow-merges into the canvas configuration.
    pub fn set_canvas_config(&mut self, patch: CanvasConfigPatch) {
        self.commit_gesture();
        self.store.set_canvas_config(patch);
        self.reconcile();
    }

    /// Selects an aspect ratio.
    pub fn set_aspect_ratio(&mut self, ratio: AspectRatio) {
        self.set_canvas_config(CanvasConfigPatch {
            aspect_ratio: Some(ratio),
            ..Default::default()
        });
    }

    /// Selects an aspect ratio by wire name; unknown names keep the current ratio.
    pub fn set_aspect_ratio_name(&mut self, name: &str) -> Result<(), ConfigError> {
        self.set_aspect_ratio(name.parse().inspect_err(|err| log::warn!("{err}"))?);
        Ok(())
    }

    /// Shallow-merges into the background configuration and starts any image decode it needs.
    pub fn set_background(&mut self, patch: BackgroundPatch) {
        self.commit_gesture();
        self.store.set_background(patch);
        self.request_background_image();
        self.reconcile();
    }

    /// Switches the background variant by wire name; unknown names are ignored.
    pub fn set_background_kind_name(&mut self, name: &str) -> Result<(), ConfigError> {
        let kind = name
            .parse::<BackgroundKind>()
            .inspect_err(|err| log::warn!("{err}"))?;
        self.set_background(BackgroundPatch {
            kind: Some(kind),
            ..Default::default()
        });
        Ok(())
    }

    /// Switches to an image background loaded from `path`.
    pub fn set_background_image(&mut self, path: &str) {
        self.set_background(BackgroundPatch {
            kind: Some(BackgroundKind::Image),
            image_url: Some(path.to_string()),
            ..Default::default()
        });
    }

    /// Merges into the star default and broadcasts to every star.
    pub fn set_star_style(&mut self, patch: StarStylePatch) {
        self.commit_gesture();
        self.store.set_star_style(patch);
        self.reconcile();
    }

    /// Merges into the line default and broadcasts to every line.
    pub fn set_line_style(&mut self, patch: LineStylePatch) {
        self.commit_gesture();
        self.store.set_line_style(patch);
        self.reconcile();
    }

    /// Re-applies the static baseline styles through the broadcast path.
    pub fn reset_styles(&mut self) {
        self.commit_gesture();
        self.store.reset_styles();
        self.reconcile();
    }

    /// Moves a single star.
    pub fn update_point_position(&mut self, id: StarId, x: f64, y: f64) -> bool {
        self.commit_gesture();
        let moved = self.store.update_point_position(id, x, y);
        self.reconcile();
        moved
    }

    /// Empties the scene and resets the background to the grid.
    pub fn clear(&mut self) {
        self.commit_gesture();
        self.store.clear();
        self.loader.cancel();
        self.reconcile();
    }

    /// Selects a star or clears the selection.
    pub fn set_selection(&mut self, id: Option<StarId>) -> bool {
        self.store.set_selection(id)
    }

    /// Hides the gizmo and clears the selection.
    pub fn deselect(&mut self) {
        self.commit_gesture();
        self.reconciler.set_gizmo_visible(false);
        self.store.set_selection(None);
    }

    // ----- pointer input (canvas coordinates) -----

    /// Handles a press. Non-primary buttons are ignored and report [`Hit::Empty`].
    pub fn pointer_down(&mut self, pos: (f64, f64), button: PointerButton) -> Hit {
        if button != PointerButton::Primary {
            return Hit::Empty;
        }
        self.commit_gesture();
        let hit = self.reconciler.hit_test(pos);
        match hit {
            Hit::GizmoHandle(handle) => {
                let kind = match handle {
                    GizmoHandle::Corner(corner) => GestureKind::Scale(corner),
                    GizmoHandle::Rotate => GestureKind::Rotate,
                };
                self.session
                    .begin(kind, pos, &mut self.store, &mut self.reconciler);
            }
            Hit::StarGroup(star) => {
                self.reconciler.set_gizmo_visible(true);
                if star.is_some() {
                    self.store.set_selection(star);
                }
                self.session
                    .begin(GestureKind::Drag, pos, &mut self.store, &mut self.reconciler);
            }
            Hit::LineHitTarget(_) => self.reconciler.set_gizmo_visible(true),
            Hit::Empty => {
                self.reconciler.set_gizmo_visible(false);
                self.store.set_selection(None);
            }
        }
        hit
    }

    /// Feeds a pointer move to the active gesture, if any.
    pub fn pointer_move(&mut self, pos: (f64, f64)) {
        self.session.update(pos, &mut self.reconciler);
    }

    /// Ends the active gesture at `pos`, committing it.
    pub fn pointer_up(&mut self, pos: (f64, f64)) {
        if self.session.is_active() {
            self.session.update(pos, &mut self.reconciler);
            self.commit_gesture();
        }
    }

    // ----- export & resources -----

    /// Rasterizes the scene. Never mutates the store.
    pub fn export(&mut self, options: &ExportOptions) -> Result<ExportOutput, ExportError> {
        self.commit_gesture();
        self.reconcile();
        let background = self.store.background().kind();
        self.exporter
            .export(&mut self.reconciler, background, options)
            .inspect_err(|err| log::error!("export failed: {err}"))
    }

    /// Applies a finished background decode, if one arrived.
    ///
    /// A result for a source that is no longer the active image background is dropped. A failed
    /// decode keeps the previously rendered background.
    pub fn poll_resources(&mut self) -> Option<Result<(), ResourceError>> {
        let result = self.loader.poll()?;
        if self.store.background().image_url() != Some(result.url.as_str()) {
            log::debug!("ignoring decode of `{}`: background changed", result.url);
            return None;
        }
        match result.outcome {
            Ok(image) => {
                self.commit_gesture();
                let size = image.size();
                self.reconciler.set_background_image(&result.url, image);
                self.store.set_background_natural_size(&result.url, size);
                self.reconcile();
                log::info!("background image loaded ({}x{})", size.0, size.1);
                Some(Ok(()))
            }
            Err(err) => {
                log::warn!("{err}");
                Some(Err(err))
            }
        }
    }
}
