//! Rendering of the editor's scene tree with the egui painter.
//!
//! Shapes are drawn back to front from [`SceneTree::draw_list`]. Drop shadows are approximated
//! with a few widening translucent layers; the exported image gets real blurred shadows.

use super::state::{CanvasView, StarMapApp, TextureCache};
use crate::constants;
use crate::mapper::Bounds;
use crate::raster::parse_color;
use crate::resources::DecodedImage;
use crate::scene::{DrawItem, Paint, SceneTree, Shape};
use crate::types::Shadow;
use eframe::egui;
use std::collections::HashSet;
use std::sync::Arc;

/// Number of translucent layers used to fake a blurred shadow.
const SHADOW_LAYERS: usize = 3;

impl StarMapApp {
    /// Paints the whole scene into the canvas area.
    ///
    /// # Arguments
    ///
    /// * `painter` - Painter of the central panel
    pub fn render_scene(&mut self, painter: &egui::Painter) {
        let dimensions = self.editor.store().dimensions();
        let canvas_rect = self.canvas.screen_rect(dimensions);

        // Frame around the canvas so an empty scene is still visible
        painter.rect_stroke(
            canvas_rect.expand(1.0),
            0.0,
            egui::Stroke::new(1.0, egui::Color32::from_gray(70)),
            egui::StrokeKind::Outside,
        );

        let clipped = painter.with_clip_rect(canvas_rect);
        paint_tree(
            &clipped,
            painter,
            self.editor.tree(),
            &self.canvas,
            &mut self.textures,
        );
    }
}

/// Paints every visible node of `tree`.
///
/// Content goes through `clipped`; the gizmo may extend past the canvas and uses `overlay`.
fn paint_tree(
    clipped: &egui::Painter,
    overlay: &egui::Painter,
    tree: &SceneTree,
    view: &CanvasView,
    textures: &mut TextureCache,
) {
    let mut live_images = HashSet::new();
    for item in tree.draw_list() {
        let opacity = item.inherited_opacity * item.node.paint.opacity;
        if opacity <= 0.0 {
            continue;
        }
        let to_screen = |p: (f64, f64)| {
            let (x, y) = item.world.apply(p);
            egui::pos2(x as f32, y as f32) * view.zoom_factor + view.offset
        };
        let scale = (item.world.mean_scale() as f32) * view.zoom_factor;
        match &item.node.shape {
            Shape::Group => {}
            Shape::Rect {
                x,
                y,
                width,
                height,
            } => {
                let points = vec![
                    to_screen((*x, *y)),
                    to_screen((x + width, *y)),
                    to_screen((x + width, y + height)),
                    to_screen((*x, y + height)),
                ];
                let fill =
                    fill_color(&item.node.paint, opacity).unwrap_or(egui::Color32::TRANSPARENT);
                clipped.add(egui::Shape::convex_polygon(
                    points,
                    fill,
                    stroke(&item.node.paint, opacity, scale),
                ));
            }
            Shape::Circle { x, y, radius } => {
                paint_circle(clipped, &item, opacity, scale, (*x, *y), *radius, &to_screen);
            }
            Shape::Line { points } => {
                paint_line(clipped, &item, opacity, scale, points, &to_screen);
            }
            Shape::Image { image, crop, dest } => {
                let key = Arc::as_ptr(image) as usize;
                live_images.insert(key);
                let texture = texture_for(clipped.ctx(), textures, key, image);
                paint_image(clipped, texture, image, crop, dest, opacity, &to_screen);
            }
            Shape::Gizmo { .. } => paint_gizmo(overlay, tree, &item, view),
        }
    }
    textures.textures.retain(|key, _| live_images.contains(key));
}

/// Fill color of `paint` with `opacity` folded into the alpha.
fn fill_color(paint: &Paint, opacity: f64) -> Option<egui::Color32> {
    color(paint.fill.as_deref()?, opacity)
}

fn color(css: &str, opacity: f64) -> Option<egui::Color32> {
    let c = parse_color(css)?;
    let alpha = (f64::from(c.a) * opacity.clamp(0.0, 1.0)).round() as u8;
    Some(egui::Color32::from_rgba_unmultiplied(c.r, c.g, c.b, alpha))
}

fn stroke(paint: &Paint, opacity: f64, scale: f32) -> egui::Stroke {
    match paint.stroke.as_deref().and_then(|css| color(css, opacity)) {
        Some(c) if paint.stroke_width > 0.0 => {
            egui::Stroke::new(paint.stroke_width as f32 * scale, c)
        }
        _ => egui::Stroke::NONE,
    }
}

/// Alpha multiplier and spread of each fake shadow layer, outermost first.
fn shadow_layers(shadow: &Shadow, scale: f32) -> impl Iterator<Item = (f32, f64)> {
    let blur = shadow.blur.max(0.0) as f32 * scale;
    (1..=SHADOW_LAYERS).rev().map(move |i| {
        let t = i as f32 / SHADOW_LAYERS as f32;
        (blur * t, 0.6 / SHADOW_LAYERS as f64)
    })
}

fn enabled_shadow(paint: &Paint) -> Option<&Shadow> {
    paint.shadow.as_ref().filter(|s| s.enabled && s.blur > 0.0)
}

fn paint_circle(
    painter: &egui::Painter,
    item: &DrawItem<'_>,
    opacity: f64,
    scale: f32,
    center: (f64, f64),
    radius: f64,
    to_screen: &impl Fn((f64, f64)) -> egui::Pos2,
) {
    let paint = &item.node.paint;
    let radius = radius as f32 * scale;
    if let Some(shadow) = enabled_shadow(paint) {
        let shadow_center = to_screen((center.0 + shadow.offset_x, center.1 + shadow.offset_y));
        for (spread, alpha) in shadow_layers(shadow, scale) {
            if let Some(c) = color(&shadow.color, opacity * alpha) {
                painter.circle_filled(shadow_center, radius + spread, c);
            }
        }
    }
    let fill = fill_color(paint, opacity).unwrap_or(egui::Color32::TRANSPARENT);
    painter.circle(to_screen(center), radius, fill, stroke(paint, opacity, scale));
}

fn paint_line(
    painter: &egui::Painter,
    item: &DrawItem<'_>,
    opacity: f64,
    scale: f32,
    points: &[f64; 4],
    to_screen: &impl Fn((f64, f64)) -> egui::Pos2,
) {
    let paint = &item.node.paint;
    let base = stroke(paint, opacity, scale);
    if base.is_empty() {
        return;
    }
    if let Some(shadow) = enabled_shadow(paint) {
        let (dx, dy) = (shadow.offset_x, shadow.offset_y);
        let a = to_screen((points[0] + dx, points[1] + dy));
        let b = to_screen((points[2] + dx, points[3] + dy));
        for (spread, alpha) in shadow_layers(shadow, scale) {
            if let Some(c) = color(&shadow.color, opacity * alpha) {
                painter.line_segment([a, b], egui::Stroke::new(base.width + spread * 2.0, c));
            }
        }
    }
    let a = to_screen((points[0], points[1]));
    let b = to_screen((points[2], points[3]));
    painter.line_segment([a, b], base);
}

/// Uploads a decoded image once and returns its texture.
fn texture_for<'t>(
    ctx: &egui::Context,
    textures: &'t mut TextureCache,
    key: usize,
    image: &DecodedImage,
) -> &'t egui::TextureHandle {
    textures.textures.entry(key).or_insert_with(|| {
        let size = [image.width as usize, image.height as usize];
        let pixels = egui::ColorImage::from_rgba_unmultiplied(size, &image.rgba);
        ctx.load_texture(format!("background-{key}"), pixels, egui::TextureOptions::LINEAR)
    })
}

fn paint_image(
    painter: &egui::Painter,
    texture: &egui::TextureHandle,
    image: &DecodedImage,
    crop: &Bounds,
    dest: &Bounds,
    opacity: f64,
    to_screen: &impl Fn((f64, f64)) -> egui::Pos2,
) {
    let (w, h) = (f64::from(image.width.max(1)), f64::from(image.height.max(1)));
    let uv = |x: f64, y: f64| egui::pos2((x / w) as f32, (y / h) as f32);
    let tint = egui::Color32::from_white_alpha((opacity.clamp(0.0, 1.0) * 255.0).round() as u8);
    let mut mesh = egui::Mesh::with_texture(texture.id());
    let corners = [
        ((dest.min_x, dest.min_y), uv(crop.min_x, crop.min_y)),
        ((dest.max_x, dest.min_y), uv(crop.max_x, crop.min_y)),
        ((dest.max_x, dest.max_y), uv(crop.max_x, crop.max_y)),
        ((dest.min_x, dest.max_y), uv(crop.min_x, crop.max_y)),
    ];
    for (pos, uv) in corners {
        mesh.vertices.push(egui::epaint::Vertex {
            pos: to_screen(pos),
            uv,
            color: tint,
        });
    }
    mesh.add_triangle(0, 1, 2);
    mesh.add_triangle(0, 2, 3);
    painter.add(egui::Shape::mesh(mesh));
}

fn paint_gizmo(painter: &egui::Painter, tree: &SceneTree, item: &DrawItem<'_>, view: &CanvasView) {
    let Some(frame) = tree.gizmo_frame(item.id) else {
        return;
    };
    let accent = color(constants::GIZMO_COLOR, 1.0).unwrap_or(egui::Color32::LIGHT_BLUE);
    let to_screen = |(x, y): (f64, f64)| {
        egui::pos2(x as f32, y as f32) * view.zoom_factor + view.offset
    };
    let outline = egui::Stroke::new(1.0, accent);
    let corners: Vec<egui::Pos2> = frame.corners.iter().map(|p| to_screen(*p)).collect();
    painter.add(egui::Shape::closed_line(corners.clone(), outline));

    let (a, b) = (frame.corners[0], frame.corners[1]);
    let top_mid = to_screen(((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0));
    let rotate = to_screen(frame.rotate_handle);
    painter.line_segment([top_mid, rotate], outline);

    let half = (constants::HANDLE_SIZE as f32 * view.zoom_factor) / 2.0;
    for corner in corners {
        let handle = egui::Rect::from_center_size(corner, egui::vec2(half * 2.0, half * 2.0));
        painter.rect(handle, 0.0, egui::Color32::WHITE, outline, egui::StrokeKind::Middle);
    }
    painter.circle(rotate, half, egui::Color32::WHITE, outline);
}
