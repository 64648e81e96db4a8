//! User interface for the star map editor.
//!
//! This module contains the eframe application wrapping the [`crate::editor::Editor`]: the
//! toolbar, the settings panel and the canvas.
//!
//! # Module Organization
//!
//! - `state` - Application state structures and the main StarMapApp
//! - `file_ops` - Import, background image and export file dialogs
//! - `canvas` - Canvas placement and pointer routing
//! - `rendering` - Drawing the scene tree with the egui painter

mod canvas;
mod file_ops;
mod rendering;
mod state;


pub use state::StarMapApp;

use crate::constants;
use crate::export::{ExportFormat, PixelRatio};
use crate::raster::{parse_color, Rgba};
use crate::types::*;
use eframe::egui;

impl eframe::App for StarMapApp {
    /// Main update function called by egui for each frame.
    ///
    /// This method handles the overall UI layout, including the settings panel,
    /// toolbar, and main canvas area.
    ///
    /// # Arguments
    ///
    /// * `ctx` - The egui context
    /// * `_frame` - The eframe frame
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        ctx.set_visuals(egui::Visuals::dark());

        // Handle finished file dialogs and background decodes
        self.handle_pending_operations(ctx);

        // Escape dismisses the gizmo and selection
        self.handle_escape_key(ctx);

        egui::TopBottomPanel::top("top_toolbar").show(ctx, |ui| {
            self.draw_toolbar(ui);
        });

        egui::SidePanel::right("settings_panel")
            .resizable(true)
            .default_width(280.0)
            .show(ctx, |ui| {
                egui::ScrollArea::vertical().show(ui, |ui| {
                    self.draw_settings_panel(ui);
                });
            });

        egui::CentralPanel::default().show(ctx, |ui| {
            self.draw_canvas(ui);
        });
    }
}

impl StarMapApp {
    fn handle_escape_key(&mut self, ctx: &egui::Context) {
        let wants_keyboard = ctx.wants_keyboard_input();
        if !wants_keyboard && ctx.input(|i| i.key_pressed(egui::Key::Escape)) {
            self.editor.deselect();
        }
    }

    fn draw_toolbar(&mut self, ui: &mut egui::Ui) {
        ui.horizontal(|ui| {
            if ui.button("Import JSON…").clicked() {
                self.open_import_dialog(ui.ctx());
            }
            if ui.button("Background Image…").clicked() {
                self.open_background_dialog(ui.ctx());
            }
            ui.add_enabled_ui(!self.file.export_in_flight, |ui| {
                if ui.button("Export…").clicked() {
                    self.start_export(ui.ctx());
                }
            });

            ui.separator();

            if ui.button("Clear").clicked() {
                self.editor.clear();
                self.set_status("Canvas cleared");
            }
            if ui.button("Reset Styles").clicked() {
                self.editor.reset_styles();
            }

            ui.separator();

            let store = self.editor.store();
            let (width, height) = store.dimensions();
            ui.label(format!(
                "{} stars · {} lines · {width}×{height}",
                store.star_count(),
                store.lines().len()
            ));
        });
    }

    fn draw_settings_panel(&mut self, ui: &mut egui::Ui) {
        ui.heading("Canvas");
        self.draw_canvas_settings(ui);
        ui.separator();

        ui.heading("Background");
        self.draw_background_settings(ui);
        ui.separator();

        ui.heading("Stars");
        self.draw_star_style(ui);
        ui.separator();

        ui.heading("Lines");
        self.draw_line_style(ui);
        ui.separator();

        ui.heading("Import");
        self.draw_import_box(ui);
        ui.separator();

        ui.heading("Export");
        self.draw_export_settings(ui);

        if let Some(status) = &self.status {
            ui.separator();
            let color = if status.is_error {
                egui::Color32::from_rgb(230, 90, 90)
            } else {
                ui.visuals().text_color()
            };
            ui.colored_label(color, &status.text);
        }
    }

    fn draw_canvas_settings(&mut self, ui: &mut egui::Ui) {
        let current = self.editor.store().canvas().aspect_ratio;
        let mut selected = current;
        egui::ComboBox::from_label("Aspect ratio")
            .selected_text(current.to_string())
            .show_ui(ui, |ui| {
                for ratio in AspectRatio::ALL {
                    ui.selectable_value(&mut selected, ratio, ratio.to_string());
                }
            });
        if selected != current {
            self.editor.set_aspect_ratio(selected);
        }

        let base = self.editor.store().canvas().background_color.clone();
        if let Some(color) = color_row(ui, "Base color", &base) {
            self.editor.set_canvas_config(CanvasConfigPatch {
                background_color: Some(color),
                ..Default::default()
            });
        }
    }

    fn draw_background_settings(&mut self, ui: &mut egui::Ui) {
        let current = self.editor.store().background().clone();
        let mut selected = current.kind();
        egui::ComboBox::from_label("Type")
            .selected_text(selected.to_string())
            .show_ui(ui, |ui| {
                for kind in BackgroundKind::ALL {
                    ui.selectable_value(&mut selected, kind, kind.to_string());
                }
            });
        if selected != current.kind() {
            self.editor.set_background(BackgroundPatch {
                kind: Some(selected),
                color: Some(self.panel.background_color.clone()),
                ..Default::default()
            });
        }

        match &current {
            BackgroundConfig::Grid => {}
            BackgroundConfig::Image { url } => {
                ui.horizontal(|ui| {
                    if ui.button("Choose…").clicked() {
                        self.open_background_dialog(ui.ctx());
                    }
                    if url.is_empty() {
                        ui.label("No image selected");
                    } else if self.editor.is_loading_background() {
                        ui.spinner();
                        ui.label("Loading…");
                    } else {
                        ui.label(url.as_str());
                    }
                });
            }
            BackgroundConfig::Color { color } => {
                if let Some(color) = color_row(ui, "Color", color) {
                    self.panel.background_color.clone_from(&color);
                    self.editor.set_background(BackgroundPatch {
                        color: Some(color),
                        ..Default::default()
                    });
                }
            }
        }
    }

    fn draw_star_style(&mut self, ui: &mut egui::Ui) {
        let style = self.editor.store().star_style().clone();
        let mut patch = StarStylePatch::default();

        let mut radius = style.radius;
        ui.horizontal(|ui| {
            ui.label("Radius");
            if ui
                .add(
                    egui::DragValue::new(&mut radius)
                        .range(constants::MIN_STAR_RADIUS..=50.0)
                        .speed(0.1),
                )
                .changed()
            {
                patch.radius = Some(radius);
            }
        });
        patch.fill = color_row(ui, "Fill", &style.fill);
        patch.stroke = color_row(ui, "Stroke", &style.stroke);
        let mut stroke_width = style.stroke_width;
        ui.horizontal(|ui| {
            ui.label("Stroke width");
            if ui
                .add(egui::DragValue::new(&mut stroke_width).range(0.0..=20.0).speed(0.1))
                .changed()
            {
                patch.stroke_width = Some(stroke_width);
            }
        });
        patch.opacity = opacity_slider(ui, style.opacity);
        patch.shadow = shadow_controls(ui, "star_shadow", &style.shadow);

        if !patch.is_empty() {
            self.editor.set_star_style(patch);
        }
    }

    fn draw_line_style(&mut self, ui: &mut egui::Ui) {
        let style = self.editor.store().line_style().clone();
        let mut patch = LineStylePatch {
            stroke: color_row(ui, "Stroke", &style.stroke),
            ..Default::default()
        };
        let mut stroke_width = style.stroke_width;
        ui.horizontal(|ui| {
            ui.label("Width");
            if ui
                .add(egui::DragValue::new(&mut stroke_width).range(0.0..=20.0).speed(0.1))
                .changed()
            {
                patch.stroke_width = Some(stroke_width);
            }
        });
        patch.opacity = opacity_slider(ui, style.opacity);
        patch.shadow = shadow_controls(ui, "line_shadow", &style.shadow);

        if patch != LineStylePatch::default() {
            self.editor.set_line_style(patch);
        }
    }

    fn draw_import_box(&mut self, ui: &mut egui::Ui) {
        ui.label("Paste a star map:");
        ui.add(
            egui::TextEdit::multiline(&mut self.panel.import_text)
                .code_editor()
                .desired_rows(4)
                .hint_text(r#"{"points":[{"id":1,"x":0.5,"y":0.5}],"connections":[]}"#),
        );
        if ui.button("Import").clicked() {
            let text = self.panel.import_text.clone();
            if self.import_text(&text, "pasted text") {
                self.panel.import_text.clear();
            }
        }
    }

    fn draw_export_settings(&mut self, ui: &mut egui::Ui) {
        let options = &mut self.panel.export;
        egui::ComboBox::from_label("Pixel ratio")
            .selected_text(format!("{}×", options.pixel_ratio.factor()))
            .show_ui(ui, |ui| {
                for ratio in PixelRatio::ALL {
                    ui.selectable_value(
                        &mut options.pixel_ratio,
                        ratio,
                        format!("{}×", ratio.factor()),
                    );
                }
            });
        ui.horizontal(|ui| {
            ui.radio_value(&mut options.format, ExportFormat::Png, "PNG");
            ui.radio_value(&mut options.format, ExportFormat::Jpeg, "JPEG");
        });
        if options.format == ExportFormat::Jpeg {
            ui.add(egui::Slider::new(&mut options.quality, 0.0..=1.0).text("Quality"));
        }
        ui.add_enabled_ui(!self.file.export_in_flight, |ui| {
            if ui.button("Export…").clicked() {
                self.start_export(ui.ctx());
            }
        });
    }
}

/// A labelled color button for a CSS color string.
///
/// # Returns
///
/// The new color as `#rrggbb` when the user changed it.
fn color_row(ui: &mut egui::Ui, label: &str, css: &str) -> Option<String> {
    let parsed = parse_color(css).unwrap_or(Rgba::rgb(255, 255, 255));
    let mut rgb = [parsed.r, parsed.g, parsed.b];
    let mut changed = false;
    ui.horizontal(|ui| {
        ui.label(label);
        changed = ui.color_edit_button_srgb(&mut rgb).changed();
    });
    changed.then(|| Rgba::rgb(rgb[0], rgb[1], rgb[2]).hex())
}

fn opacity_slider(ui: &mut egui::Ui, current: f64) -> Option<f64> {
    let mut opacity = current;
    ui.add(egui::Slider::new(&mut opacity, 0.0..=1.0).text("Opacity"))
        .changed()
        .then_some(opacity)
}

/// Glow controls shared by stars and lines.
fn shadow_controls(ui: &mut egui::Ui, id: &str, shadow: &Shadow) -> ShadowPatch {
    let mut patch = ShadowPatch::default();
    egui::CollapsingHeader::new("Glow")
        .id_salt(id)
        .default_open(true)
        .show(ui, |ui| {
            let mut enabled = shadow.enabled;
            if ui.checkbox(&mut enabled, "Enabled").changed() {
                patch.enabled = Some(enabled);
            }
            patch.color = color_row(ui, "Color", &shadow.color);
            let mut blur = shadow.blur;
            ui.horizontal(|ui| {
                ui.label("Blur");
                if ui
                    .add(egui::DragValue::new(&mut blur).range(0.0..=100.0).speed(0.5))
                    .changed()
                {
                    patch.blur = Some(blur);
                }
            });
        });
    patch
}
