//! Shared application-wide constants.
//! Centralizes tweakable values used by the store, the render tree and the interactions.

// Canvas
/// Design-time canvas width in pixels; every fixed aspect ratio derives its height from it.
pub const BASE_WIDTH: u32 = 400;
/// Canvas height used before any aspect ratio has been applied.
pub const DEFAULT_HEIGHT: u32 = 711;
/// Default canvas background color (also the base fill of the grid background).
pub const DEFAULT_BACKGROUND_COLOR: &str = "#0b0d1a";

// Stars
/// Smallest radius a star may have, both in the style default and on each star.
pub const MIN_STAR_RADIUS: f64 = 2.0;
/// Outer star glow: radius multiplier.
pub const STAR_OUTER_GLOW_RADIUS: f64 = 2.5;
/// Outer star glow: opacity.
pub const STAR_OUTER_GLOW_OPACITY: f64 = 0.1;
/// Middle star glow: radius multiplier.
pub const STAR_MIDDLE_GLOW_RADIUS: f64 = 1.5;
/// Middle star glow: opacity.
pub const STAR_MIDDLE_GLOW_OPACITY: f64 = 0.25;

// Lines
/// Outer line glow: stroke width multiplier.
pub const LINE_OUTER_GLOW_WIDTH: f64 = 3.0;
/// Outer line glow: shadow blur multiplier.
pub const LINE_OUTER_GLOW_BLUR: f64 = 2.5;
/// Outer line glow: opacity.
pub const LINE_OUTER_GLOW_OPACITY: f64 = 0.15;
/// Middle line glow: stroke width multiplier.
pub const LINE_MIDDLE_GLOW_WIDTH: f64 = 1.8;
/// Middle line glow: shadow blur multiplier.
pub const LINE_MIDDLE_GLOW_BLUR: f64 = 1.5;
/// Middle line glow: opacity.
pub const LINE_MIDDLE_GLOW_OPACITY: f64 = 0.3;
/// Minimum width of the invisible line hit-target.
pub const HIT_TARGET_MIN_WIDTH: f64 = 20.0;
/// Hit-target width as a multiple of the line's stroke width.
pub const HIT_TARGET_WIDTH_FACTOR: f64 = 5.0;

// Grid background
/// Grid cell size in canvas pixels.
pub const GRID_SIZE: f64 = 20.0;
/// Grid line color.
pub const GRID_LINE_COLOR: &str = "rgba(255,255,255,0.08)";

// Gizmo
/// Side length of a corner scale handle, in canvas pixels.
pub const HANDLE_SIZE: f64 = 10.0;
/// Distance of the rotation handle above the top edge of the gizmo.
pub const ROTATE_HANDLE_OFFSET: f64 = 30.0;
/// Padding between the star group's bounds and the gizmo outline.
pub const GIZMO_PADDING: f64 = 4.0;
/// Gizmo outline and handle color.
pub const GIZMO_COLOR: &str = "#4da3ff";
/// Smallest absolute scale a corner handle may produce in one gesture.
pub const MIN_GESTURE_SCALE: f64 = 0.05;

// Export
/// Backing color placed behind grid-mode content for lossy exports.
pub const EXPORT_BACKING_COLOR: &str = "#ffffff";
/// Prefix of suggested export filenames.
pub const EXPORT_FILE_PREFIX: &str = "star-map";
