//! Rasterization of a [`SceneTree`] into pixels, plus PNG/JPEG encoding.
//!
//! Vector nodes are serialized to SVG and rendered with `resvg`; image nodes are composited
//! straight into the pixmap with tiny-skia so decoded backgrounds never round-trip through
//! an encoder. Z-order is kept by splitting the draw list into runs at every image node.

use crate::constants;
use crate::error::ExportError;
use crate::mapper::{Affine, Bounds};
use crate::scene::{DrawItem, Paint, SceneTree, Shape};
use std::fmt::Write;
use tiny_skia::Pixmap;

/// An RGBA8 color parsed from a CSS color string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgba {
    /// Red
    pub r: u8,
    /// Green
    pub g: u8,
    /// Blue
    pub b: u8,
    /// Alpha
    pub a: u8,
}

impl Rgba {
    /// Opaque color.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    /// `#rrggbb`, without alpha.
    pub fn hex(&self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Alpha as a `0..=1` fraction.
    pub fn alpha(&self) -> f64 {
        f64::from(self.a) / 255.0
    }
}

/// Parses `#rgb`, `#rgba`, `#rrggbb`, `#rrggbbaa`, `rgb(..)`, `rgba(..)` and a few names.
pub fn parse_color(input: &str) -> Option<Rgba> {
    let s = input.trim().to_ascii_lowercase();
    if let Some(hex) = s.strip_prefix('#') {
        return parse_hex(hex);
    }
    if let Some(body) = s
        .strip_prefix("rgba(")
        .or_else(|| s.strip_prefix("rgb("))
        .and_then(|rest| rest.strip_suffix(')'))
    {
        let parts: Vec<&str> = body.split(',').map(str::trim).collect();
        if parts.len() != 3 && parts.len() != 4 {
            return None;
        }
        let channel = |p: &str| p.parse::<f64>().ok().map(|v| v.clamp(0.0, 255.0).round() as u8);
        let a = match parts.get(3) {
            Some(p) => (p.parse::<f64>().ok()?.clamp(0.0, 1.0) * 255.0).round() as u8,
            None => 255,
        };
        return Some(Rgba {
            r: channel(parts[0])?,
            g: channel(parts[1])?,
            b: channel(parts[2])?,
            a,
        });
    }
    let named = match s.as_str() {
        "white" => Rgba::rgb(255, 255, 255),
        "black" => Rgba::rgb(0, 0, 0),
        "red" => Rgba::rgb(255, 0, 0),
        "green" => Rgba::rgb(0, 128, 0),
        "blue" => Rgba::rgb(0, 0, 255),
        "yellow" => Rgba::rgb(255, 255, 0),
        "cyan" => Rgba::rgb(0, 255, 255),
        "magenta" => Rgba::rgb(255, 0, 255),
        "orange" => Rgba::rgb(255, 165, 0),
        "purple" => Rgba::rgb(128, 0, 128),
        "gray" | "grey" => Rgba::rgb(128, 128, 128),
        "transparent" => Rgba { r: 0, g: 0, b: 0, a: 0 },
        _ => return None,
    };
    Some(named)
}

fn parse_hex(hex: &str) -> Option<Rgba> {
    let digit = |i: usize| u8::from_str_radix(hex.get(i..i + 1)?, 16).ok().map(|v| v * 17);
    let pair = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
    match hex.len() {
        3 => Some(Rgba::rgb(digit(0)?, digit(1)?, digit(2)?)),
        4 => Some(Rgba {
            r: digit(0)?,
            g: digit(1)?,
            b: digit(2)?,
            a: digit(3)?,
        }),
        6 => Some(Rgba::rgb(pair(0)?, pair(2)?, pair(4)?)),
        8 => Some(Rgba {
            r: pair(0)?,
            g: pair(2)?,
            b: pair(4)?,
            a: pair(6)?,
        }),
        _ => None,
    }
}

/// Serializes every visible vector node of `tree` into a standalone SVG document.
///
/// Image nodes are left out; see [`rasterize`] for full output.
pub fn render_svg(tree: &SceneTree, width: u32, height: u32) -> String {
    let items = tree.draw_list();
    let refs: Vec<&DrawItem<'_>> = items.iter().collect();
    svg_document(tree, &refs, width, height)
}

/// Renders `tree` into a `width·ratio × height·ratio` pixmap.
pub fn rasterize(
    tree: &SceneTree,
    width: u32,
    height: u32,
    pixel_ratio: f32,
) -> Result<Pixmap, ExportError> {
    let out_w = (width as f32 * pixel_ratio).round().max(1.0) as u32;
    let out_h = (height as f32 * pixel_ratio).round().max(1.0) as u32;
    let mut pixmap = Pixmap::new(out_w, out_h)
        .ok_or_else(|| ExportError::Raster(format!("cannot allocate {out_w}x{out_h} pixmap")))?;
    let scale = tiny_skia::Transform::from_scale(pixel_ratio, pixel_ratio);

    let items = tree.draw_list();
    let mut run: Vec<&DrawItem<'_>> = Vec::new();
    for item in &items {
        if let Shape::Image { image, crop, dest } = &item.node.shape {
            flush_vector_run(tree, &mut run, width, height, scale, &mut pixmap)?;
            let opacity = (item.inherited_opacity * item.node.paint.opacity) as f32;
            draw_image(&mut pixmap, image, crop, dest, &item.world, scale, opacity);
        } else {
            run.push(item);
        }
    }
    flush_vector_run(tree, &mut run, width, height, scale, &mut pixmap)?;
    Ok(pixmap)
}

fn flush_vector_run(
    tree: &SceneTree,
    run: &mut Vec<&DrawItem<'_>>,
    width: u32,
    height: u32,
    scale: tiny_skia::Transform,
    pixmap: &mut Pixmap,
) -> Result<(), ExportError> {
    if run.iter().all(|item| matches!(item.node.shape, Shape::Group)) {
        run.clear();
        return Ok(());
    }
    let svg = svg_document(tree, run, width, height);
    run.clear();
    let parsed = usvg::Tree::from_data(svg.as_bytes(), &usvg::Options::default())
        .map_err(|err| ExportError::Raster(err.to_string()))?;
    resvg::render(&parsed, scale, &mut pixmap.as_mut());
    Ok(())
}

fn draw_image(
    pixmap: &mut Pixmap,
    image: &crate::resources::DecodedImage,
    crop: &Bounds,
    dest: &Bounds,
    world: &Affine,
    scale: tiny_skia::Transform,
    opacity: f32,
) {
    let Some(source) = image.to_pixmap() else {
        log::warn!("skipping empty image node");
        return;
    };
    let Some(rect) = tiny_skia::Rect::from_ltrb(
        dest.min_x as f32,
        dest.min_y as f32,
        dest.max_x as f32,
        dest.max_y as f32,
    ) else {
        return;
    };
    let sx = dest.width() / crop.width().max(f64::EPSILON);
    let sy = dest.height() / crop.height().max(f64::EPSILON);
    let pattern_transform = tiny_skia::Transform::from_row(
        sx as f32,
        0.0,
        0.0,
        sy as f32,
        (dest.min_x - crop.min_x * sx) as f32,
        (dest.min_y - crop.min_y * sy) as f32,
    );
    let paint = tiny_skia::Paint {
        shader: tiny_skia::Pattern::new(
            source.as_ref(),
            tiny_skia::SpreadMode::Pad,
            tiny_skia::FilterQuality::Bilinear,
            opacity,
            pattern_transform,
        ),
        anti_alias: true,
        ..Default::default()
    };
    pixmap.fill_rect(rect, &paint, scale.pre_concat(world.to_skia()), None);
}

fn svg_document(tree: &SceneTree, items: &[&DrawItem<'_>], width: u32, height: u32) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{width}" height="{height}" viewBox="0 0 {width} {height}">"#
    );
    let mut defs = String::new();
    let mut body = String::new();
    for (index, item) in items.iter().enumerate() {
        write_item(tree, item, index, &mut defs, &mut body);
    }
    if !defs.is_empty() {
        let _ = writeln!(out, "<defs>\n{defs}</defs>");
    }
    out.push_str(&body);
    let _ = writeln!(out, "</svg>");
    out
}

fn write_item(
    tree: &SceneTree,
    item: &DrawItem<'_>,
    index: usize,
    defs: &mut String,
    body: &mut String,
) {
    let node = item.node;
    let opacity = item.inherited_opacity * node.paint.opacity;
    if opacity <= 0.0 {
        return;
    }
    if let Shape::Gizmo { .. } = node.shape {
        write_gizmo(tree, item, body);
        return;
    }
    let geometry = match &node.shape {
        Shape::Rect {
            x,
            y,
            width,
            height,
        } => format!(r#"<rect x="{x}" y="{y}" width="{width}" height="{height}""#),
        Shape::Circle { x, y, radius } => format!(r#"<circle cx="{x}" cy="{y}" r="{radius}""#),
        Shape::Line { points } => format!(
            r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke-linecap="round""#,
            points[0], points[1], points[2], points[3]
        ),
        Shape::Group | Shape::Image { .. } | Shape::Gizmo { .. } => return,
    };
    let paint = paint_attributes(&node.paint);
    if paint.is_empty() {
        return;
    }
    let mut element = geometry;
    element.push_str(&paint);
    let _ = write!(element, r#" opacity="{opacity}""#);
    if !item.world.is_identity() {
        let _ = write!(element, r#" transform="{}""#, item.world.to_svg());
    }
    if let Some(filter) = shadow_filter(tree, item, index) {
        defs.push_str(&filter);
        let _ = write!(element, r#" filter="url(#shadow{index})""#);
    }
    element.push_str("/>\n");
    body.push_str(&element);
}

fn paint_attributes(paint: &Paint) -> String {
    let mut out = String::new();
    let fill = paint.fill.as_deref().and_then(parse_color);
    let stroke = paint
        .stroke
        .as_deref()
        .and_then(parse_color)
        .filter(|_| paint.stroke_width > 0.0);
    match fill {
        Some(c) => {
            let _ = write!(out, r#" fill="{}" fill-opacity="{}""#, c.hex(), c.alpha());
        }
        None => out.push_str(r#" fill="none""#),
    }
    if let Some(c) = stroke {
        let _ = write!(
            out,
            r#" stroke="{}" stroke-opacity="{}" stroke-width="{}""#,
            c.hex(),
            c.alpha(),
            paint.stroke_width
        );
    }
    if fill.is_none() && stroke.is_none() {
        out.clear();
    }
    out
}

fn shadow_filter(tree: &SceneTree, item: &DrawItem<'_>, index: usize) -> Option<String> {
    let shadow = item.node.paint.shadow.as_ref().filter(|s| s.enabled)?;
    let color = parse_color(&shadow.color)?;
    if shadow.blur <= 0.0 && shadow.offset_x == 0.0 && shadow.offset_y == 0.0 {
        return None;
    }
    let reach = shadow.blur * 3.0 + shadow.offset_x.abs().max(shadow.offset_y.abs());
    let region = tree.local_bounds(item.id)?.padded(reach.max(1.0));
    Some(format!(
        concat!(
            r#"<filter id="shadow{}" filterUnits="userSpaceOnUse" x="{}" y="{}" width="{}" height="{}">"#,
            r#"<feDropShadow dx="{}" dy="{}" stdDeviation="{}" flood-color="{}" flood-opacity="{}"/>"#,
            "</filter>\n"
        ),
        index,
        region.min_x,
        region.min_y,
        region.width(),
        region.height(),
        shadow.offset_x,
        shadow.offset_y,
        shadow.blur / 2.0,
        color.hex(),
        color.alpha()
    ))
}

fn write_gizmo(tree: &SceneTree, item: &DrawItem<'_>, body: &mut String) {
    let Some(frame) = tree.gizmo_frame(item.id) else {
        return;
    };
    let color = constants::GIZMO_COLOR;
    let points: Vec<String> = frame
        .corners
        .iter()
        .map(|(x, y)| format!("{x},{y}"))
        .collect();
    let _ = writeln!(
        body,
        r#"<polygon points="{}" fill="none" stroke="{color}" stroke-width="1"/>"#,
        points.join(" ")
    );
    let top_mid = (
        (frame.corners[0].0 + frame.corners[1].0) / 2.0,
        (frame.corners[0].1 + frame.corners[1].1) / 2.0,
    );
    let _ = writeln!(
        body,
        r#"<line x1="{}" y1="{}" x2="{}" y2="{}" stroke="{color}" stroke-width="1"/>"#,
        top_mid.0, top_mid.1, frame.rotate_handle.0, frame.rotate_handle.1
    );
    let half = constants::HANDLE_SIZE / 2.0;
    for (x, y) in frame.corners {
        let _ = writeln!(
            body,
            r##"<rect x="{}" y="{}" width="{}" height="{}" fill="#ffffff" stroke="{color}" stroke-width="1"/>"##,
            x - half,
            y - half,
            constants::HANDLE_SIZE,
            constants::HANDLE_SIZE
        );
    }
    let _ = writeln!(
        body,
        r##"<circle cx="{}" cy="{}" r="{half}" fill="#ffffff" stroke="{color}" stroke-width="1"/>"##,
        frame.rotate_handle.0, frame.rotate_handle.1
    );
}

/// Encodes a pixmap as PNG.
pub fn encode_png(pixmap: &Pixmap) -> Result<Vec<u8>, ExportError> {
    pixmap
        .encode_png()
        .map_err(|err| ExportError::Encode(err.to_string()))
}

/// Maps a `0..=1` quality to the JPEG encoder's `1..=100` scale.
pub fn jpeg_quality(quality: f64) -> u8 {
    let q = if quality.is_finite() { quality } else { 1.0 };
    (q * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Encodes a pixmap as JPEG; alpha is dropped after un-premultiplying.
pub fn encode_jpeg(pixmap: &Pixmap, quality: f64) -> Result<Vec<u8>, ExportError> {
    use image::ImageEncoder;

    let mut rgb = Vec::with_capacity(pixmap.pixels().len() * 3);
    for px in pixmap.pixels() {
        let c = px.demultiply();
        rgb.extend_from_slice(&[c.red(), c.green(), c.blue()]);
    }
    let mut out = Vec::new();
    image::codecs::jpeg::JpegEncoder::new_with_quality(&mut out, jpeg_quality(quality))
        .write_image(
            &rgb,
            pixmap.width(),
            pixmap.height(),
            image::ExtendedColorType::Rgb8,
        )
        .map_err(|err| ExportError::Encode(err.to_string()))?;
    Ok(out)
}
