//! Core data types for the star map editor.
//!
//! This module defines the canonical data model owned by the geometry store: canvas and
//! background configuration, stars, connections, derived lines, and the per-entity style
//! records together with the partial patches used to edit them.

use crate::constants;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;
use uuid::Uuid;

/// Unique identifier for stars, stable for the session.
pub type StarId = Uuid;

/// Identifier of a derived line: its connection's index in the current generation.
///
/// Lines are regenerated wholesale, so a `LineId` is only meaningful until the next
/// regeneration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LineId(pub usize);

/// Caller-supplied numeric point identifier from an import payload.
///
/// Only used to resolve connections. Compared by value; `-0.0` and `0.0` are the same id.
#[derive(Debug, Clone, Copy)]
pub struct OriginalId(f64);

impl OriginalId {
    /// Wraps a numeric import id.
    pub fn new(value: f64) -> Self {
        // Fold negative zero so equality and hashing agree.
        Self(if value == 0.0 { 0.0 } else { value })
    }

    /// The numeric value as it appeared in the payload.
    pub fn value(self) -> f64 {
        self.0
    }
}

impl PartialEq for OriginalId {
    fn eq(&self, other: &Self) -> bool {
        self.0.to_bits() == other.0.to_bits()
    }
}

impl Eq for OriginalId {}

impl Hash for OriginalId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.0.to_bits().hash(state);
    }
}

impl fmt::Display for OriginalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Canvas aspect ratio selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    /// Portrait 9:16
    Portrait916,
    /// Portrait 3:4
    Portrait34,
    /// Square 1:1
    Square,
    /// Follow the loaded background image's natural size
    Auto,
}

impl AspectRatio {
    /// All selectable ratios, in menu order.
    pub const ALL: [AspectRatio; 4] = [
        AspectRatio::Portrait916,
        AspectRatio::Portrait34,
        AspectRatio::Square,
        AspectRatio::Auto,
    ];
}

impl fmt::Display for AspectRatio {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AspectRatio::Portrait916 => "9:16",
            AspectRatio::Portrait34 => "3:4",
            AspectRatio::Square => "1:1",
            AspectRatio::Auto => "auto",
        };
        f.write_str(name)
    }
}

impl FromStr for AspectRatio {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "9:16" => Ok(AspectRatio::Portrait916),
            "3:4" => Ok(AspectRatio::Portrait34),
            "1:1" => Ok(AspectRatio::Square),
            "auto" => Ok(AspectRatio::Auto),
            other => Err(ConfigError::UnknownAspectRatio(other.to_string())),
        }
    }
}

/// Canvas dimensions and base color.
///
/// `width`/`height` always reflect `aspect_ratio`, except for [`AspectRatio::Auto`] where
/// they track the loaded background image's natural size.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Canvas width in pixels
    pub width: u32,
    /// Canvas height in pixels
    pub height: u32,
    /// Selected aspect ratio
    pub aspect_ratio: AspectRatio,
    /// Base fill color, also used under the grid background
    pub background_color: String,
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            width: constants::BASE_WIDTH,
            height: constants::DEFAULT_HEIGHT,
            aspect_ratio: AspectRatio::Portrait916,
            background_color: constants::DEFAULT_BACKGROUND_COLOR.to_string(),
        }
    }
}

/// Partial update of [`CanvasConfig`]; `None` fields keep their current value.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CanvasConfigPatch {
    /// New width (only meaningful for [`AspectRatio::Auto`])
    pub width: Option<u32>,
    /// New height (only meaningful for [`AspectRatio::Auto`])
    pub height: Option<u32>,
    /// New aspect ratio
    pub aspect_ratio: Option<AspectRatio>,
    /// New base color
    pub background_color: Option<String>,
}

/// Discriminant of [`BackgroundConfig`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackgroundKind {
    /// Grid pattern over the base color
    Grid,
    /// Fitted image
    Image,
    /// Solid color
    Color,
}

impl BackgroundKind {
    /// All background kinds, in menu order.
    pub const ALL: [BackgroundKind; 3] =
        [BackgroundKind::Grid, BackgroundKind::Image, BackgroundKind::Color];
}

impl fmt::Display for BackgroundKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BackgroundKind::Grid => "grid",
            BackgroundKind::Image => "image",
            BackgroundKind::Color => "color",
        };
        f.write_str(name)
    }
}

impl FromStr for BackgroundKind {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "grid" => Ok(BackgroundKind::Grid),
            "image" => Ok(BackgroundKind::Image),
            "color" => Ok(BackgroundKind::Color),
            other => Err(ConfigError::UnknownBackgroundType(other.to_string())),
        }
    }
}

/// Background configuration; exactly one variant is active and only it carries a payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum BackgroundConfig {
    /// Grid pattern, no payload
    #[default]
    Grid,
    /// Image loaded from `url` (a filesystem path)
    Image {
        /// Image source
        url: String,
    },
    /// Solid color fill
    Color {
        /// CSS color
        color: String,
    },
}

impl BackgroundConfig {
    /// Which variant is active.
    pub fn kind(&self) -> BackgroundKind {
        match self {
            BackgroundConfig::Grid => BackgroundKind::Grid,
            BackgroundConfig::Image { .. } => BackgroundKind::Image,
            BackgroundConfig::Color { .. } => BackgroundKind::Color,
        }
    }

    /// The image source, when the image variant is active and has one.
    pub fn image_url(&self) -> Option<&str> {
        match self {
            BackgroundConfig::Image { url } if !url.is_empty() => Some(url),
            _ => None,
        }
    }
}

/// Partial update of [`BackgroundConfig`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct BackgroundPatch {
    /// Switch to this variant
    pub kind: Option<BackgroundKind>,
    /// Image payload (used when the resulting variant is `Image`)
    pub image_url: Option<String>,
    /// Color payload (used when the resulting variant is `Color`)
    pub color: Option<String>,
}

/// Drop shadow parameters; for glow styling the shadow is the glow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shadow {
    /// Whether the shadow is drawn
    pub enabled: bool,
    /// Shadow color
    pub color: String,
    /// Blur radius in pixels
    pub blur: f64,
    /// Horizontal offset
    pub offset_x: f64,
    /// Vertical offset
    pub offset_y: f64,
}

/// Partial update of a [`Shadow`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ShadowPatch {
    /// New enabled flag
    pub enabled: Option<bool>,
    /// New color
    pub color: Option<String>,
    /// New blur radius
    pub blur: Option<f64>,
    /// New horizontal offset
    pub offset_x: Option<f64>,
    /// New vertical offset
    pub offset_y: Option<f64>,
}

impl ShadowPatch {
    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.enabled.is_none()
            && self.color.is_none()
            && self.blur.is_none()
            && self.offset_x.is_none()
            && self.offset_y.is_none()
    }

    /// Writes every set field onto `shadow`.
    pub fn apply(&self, shadow: &mut Shadow) {
        if let Some(enabled) = self.enabled {
            shadow.enabled = enabled;
        }
        if let Some(color) = &self.color {
            shadow.color.clone_from(color);
        }
        if let Some(blur) = self.blur {
            shadow.blur = blur.max(0.0);
        }
        if let Some(x) = self.offset_x {
            shadow.offset_x = x;
        }
        if let Some(y) = self.offset_y {
            shadow.offset_y = y;
        }
    }

    /// A patch that sets every field to `shadow`'s values.
    pub fn full(shadow: &Shadow) -> Self {
        Self {
            enabled: Some(shadow.enabled),
            color: Some(shadow.color.clone()),
            blur: Some(shadow.blur),
            offset_x: Some(shadow.offset_x),
            offset_y: Some(shadow.offset_y),
        }
    }
}

/// Visual fields of a star; also the global star default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StarStyle {
    /// Main circle radius, never below [`constants::MIN_STAR_RADIUS`]
    pub radius: f64,
    /// Fill color
    pub fill: String,
    /// Stroke color
    pub stroke: String,
    /// Stroke width
    pub stroke_width: f64,
    /// Glow shadow
    pub shadow: Shadow,
    /// Opacity in `0..=1`
    pub opacity: f64,
}

/// Partial update of a [`StarStyle`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StarStylePatch {
    /// New radius (clamped)
    pub radius: Option<f64>,
    /// New fill color
    pub fill: Option<String>,
    /// New stroke color
    pub stroke: Option<String>,
    /// New stroke width
    pub stroke_width: Option<f64>,
    /// Shadow changes
    pub shadow: ShadowPatch,
    /// New opacity
    pub opacity: Option<f64>,
}

impl StarStylePatch {
    /// A patch that sets every field to `style`'s values.
    pub fn full(style: &StarStyle) -> Self {
        Self {
            radius: Some(style.radius),
            fill: Some(style.fill.clone()),
            stroke: Some(style.stroke.clone()),
            stroke_width: Some(style.stroke_width),
            shadow: ShadowPatch::full(&style.shadow),
            opacity: Some(style.opacity),
        }
    }

    /// Whether no field is set.
    pub fn is_empty(&self) -> bool {
        self.radius.is_none()
            && self.fill.is_none()
            && self.stroke.is_none()
            && self.stroke_width.is_none()
            && self.shadow.is_empty()
            && self.opacity.is_none()
    }
}

impl StarStyle {
    /// Writes every set field of `patch` onto this style, clamping radius and opacity.
    pub fn apply(&mut self, patch: &StarStylePatch) {
        if let Some(radius) = patch.radius {
            self.radius = clamp_radius(radius);
        }
        if let Some(fill) = &patch.fill {
            self.fill.clone_from(fill);
        }
        if let Some(stroke) = &patch.stroke {
            self.stroke.clone_from(stroke);
        }
        if let Some(width) = patch.stroke_width {
            self.stroke_width = width.max(0.0);
        }
        patch.shadow.apply(&mut self.shadow);
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
    }
}

/// Visual fields of a line; also the global line default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineStyle {
    /// Stroke color
    pub stroke: String,
    /// Stroke width
    pub stroke_width: f64,
    /// Glow shadow
    pub shadow: Shadow,
    /// Opacity in `0..=1`
    pub opacity: f64,
}

/// Partial update of a [`LineStyle`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LineStylePatch {
    /// New stroke color
    pub stroke: Option<String>,
    /// New stroke width
    pub stroke_width: Option<f64>,
    /// Shadow changes
    pub shadow: ShadowPatch,
    /// New opacity
    pub opacity: Option<f64>,
}

impl LineStylePatch {
    /// A patch that sets every field to `style`'s values.
    pub fn full(style: &LineStyle) -> Self {
        Self {
            stroke: Some(style.stroke.clone()),
            stroke_width: Some(style.stroke_width),
            shadow: ShadowPatch::full(&style.shadow),
            opacity: Some(style.opacity),
        }
    }
}

impl LineStyle {
    /// Writes every set field of `patch` onto this style.
    pub fn apply(&mut self, patch: &LineStylePatch) {
        if let Some(stroke) = &patch.stroke {
            self.stroke.clone_from(stroke);
        }
        if let Some(width) = patch.stroke_width {
            self.stroke_width = width.max(0.0);
        }
        patch.shadow.apply(&mut self.shadow);
        if let Some(opacity) = patch.opacity {
            self.opacity = opacity.clamp(0.0, 1.0);
        }
    }
}

/// Clamps a star radius to the allowed minimum.
pub fn clamp_radius(radius: f64) -> f64 {
    if radius.is_nan() {
        constants::MIN_STAR_RADIUS
    } else {
        radius.max(constants::MIN_STAR_RADIUS)
    }
}

/// A single star on the canvas.
#[derive(Debug, Clone, PartialEq)]
pub struct Star {
    /// Generated identifier
    pub id: StarId,
    /// Identifier from the import payload, used to resolve connections
    pub original_id: OriginalId,
    /// Position in canvas pixel space
    pub position: (f64, f64),
    /// Visual fields
    pub style: StarStyle,
}

impl Star {
    /// Creates a star with a fresh id.
    pub fn new(original_id: OriginalId, position: (f64, f64), style: StarStyle) -> Self {
        Self {
            id: Uuid::new_v4(),
            original_id,
            position,
            style,
        }
    }
}

/// An unordered pair of import ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Connection {
    /// One endpoint
    pub a: OriginalId,
    /// The other endpoint
    pub b: OriginalId,
}

impl Connection {
    /// Creates a connection between two import ids.
    pub fn new(a: OriginalId, b: OriginalId) -> Self {
        Self { a, b }
    }
}

/// A derived segment between two stars' current positions.
#[derive(Debug, Clone, PartialEq)]
pub struct Line {
    /// Index of the originating connection
    pub id: LineId,
    /// First endpoint star
    pub from: StarId,
    /// Second endpoint star
    pub to: StarId,
    /// `[x1, y1, x2, y2]` copied from the endpoints at generation time
    pub points: [f64; 4],
    /// Visual fields inherited from the line default
    pub style: LineStyle,
}
