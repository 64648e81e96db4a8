//! Canvas placement and pointer routing.
//!
//! The canvas is fitted into the central panel every frame. Presses, moves and releases are
//! translated into canvas coordinates and forwarded to the [`crate::editor::Editor`], which
//! owns hit testing and gestures.

use super::state::StarMapApp;
use crate::editor::PointerButton;
use eframe::egui;

impl StarMapApp {
    /// Converts screen coordinates to canvas coordinates accounting for the fitted zoom.
    ///
    /// # Arguments
    ///
    /// * `screen_pos` - Position in screen space (points)
    ///
    /// # Returns
    ///
    /// The corresponding position in canvas pixel space
    pub fn screen_to_canvas(&self, screen_pos: egui::Pos2) -> (f64, f64) {
        let p = (screen_pos - self.canvas.offset) / self.canvas.zoom_factor;
        (f64::from(p.x), f64::from(p.y))
    }

    /// Converts canvas coordinates to screen coordinates accounting for the fitted zoom.
    ///
    /// # Arguments
    ///
    /// * `canvas_pos` - Position in canvas pixel space
    ///
    /// # Returns
    ///
    /// The corresponding position in screen space (points)
    pub fn canvas_to_screen(&self, (x, y): (f64, f64)) -> egui::Pos2 {
        egui::pos2(x as f32, y as f32) * self.canvas.zoom_factor + self.canvas.offset
    }

    /// Draws the canvas and routes pointer input to the editor.
    ///
    /// # Arguments
    ///
    /// * `ui` - The egui UI context of the central panel
    pub fn draw_canvas(&mut self, ui: &mut egui::Ui) {
        let (response, painter) =
            ui.allocate_painter(ui.available_size(), egui::Sense::click_and_drag());

        let dimensions = self.editor.store().dimensions();
        self.canvas.fit(response.rect, dimensions);

        self.handle_canvas_pointer(ui, &response);

        if self.editor.session().is_active() {
            ui.ctx().set_cursor_icon(egui::CursorIcon::Grabbing);
        }

        self.render_scene(&painter);
    }

    /// Forwards this frame's press, move and release to the editor.
    fn handle_canvas_pointer(&mut self, ui: &mut egui::Ui, response: &egui::Response) {
        let (pressed, secondary_pressed, released, pointer_pos) = ui.input(|i| {
            (
                i.pointer.primary_pressed(),
                i.pointer.button_pressed(egui::PointerButton::Secondary),
                i.pointer.primary_released(),
                i.pointer.interact_pos(),
            )
        });
        let Some(pointer_pos) = pointer_pos else {
            return;
        };
        let canvas_pos = self.screen_to_canvas(pointer_pos);

        if secondary_pressed && response.rect.contains(pointer_pos) {
            self.editor.pointer_down(canvas_pos, PointerButton::Secondary);
        }

        if pressed && response.rect.contains(pointer_pos) {
            self.editor.pointer_down(canvas_pos, PointerButton::Primary);
            self.interaction.pointer_captured = true;
            self.interaction.last_canvas_pos = Some(canvas_pos);
        }

        if !self.interaction.pointer_captured {
            return;
        }

        if self.interaction.last_canvas_pos != Some(canvas_pos) {
            self.editor.pointer_move(canvas_pos);
            self.interaction.last_canvas_pos = Some(canvas_pos);
        }

        if released {
            self.editor.pointer_up(canvas_pos);
            self.interaction.pointer_captured = false;
            self.interaction.last_canvas_pos = None;
        }
    }
}
