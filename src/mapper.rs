//! Coordinate mapping: canvas dimensions, relative→absolute conversion and affine transforms.
//!
//! Everything in here is a pure function of its inputs.

use crate::constants::BASE_WIDTH;
use crate::types::{AspectRatio, CanvasConfig};

/// Derives canvas `(width, height)` from the configured aspect ratio.
///
/// Fixed ratios use the design-time base width of 400 pixels; [`AspectRatio::Auto`] passes the
/// configured size through unchanged (it is set from the background image's natural size).
pub fn compute_dimensions(config: &CanvasConfig) -> (u32, u32) {
    let base = f64::from(BASE_WIDTH);
    match config.aspect_ratio {
        AspectRatio::Portrait916 => (BASE_WIDTH, (base * 16.0 / 9.0).round() as u32),
        AspectRatio::Portrait34 => (BASE_WIDTH, (base * 4.0 / 3.0).round() as u32),
        AspectRatio::Square => (BASE_WIDTH, BASE_WIDTH),
        AspectRatio::Auto => (config.width.max(1), config.height.max(1)),
    }
}

/// Maps one coordinate: values in `0..=1` are fractions of `extent`, anything else is absolute.
///
/// Exactly `1.0` counts as a fraction, so an absolute 1-pixel coordinate cannot be expressed.
pub fn resolve_coordinate(value: f64, extent: u32) -> f64 {
    if (0.0..=1.0).contains(&value) {
        value * f64::from(extent)
    } else {
        value
    }
}

/// Converts import coordinates to canvas pixels using the current dimensions.
pub fn relative_to_absolute(points: &[(f64, f64)], dims: (u32, u32)) -> Vec<(f64, f64)> {
    points
        .iter()
        .map(|&(x, y)| (resolve_coordinate(x, dims.0), resolve_coordinate(y, dims.1)))
        .collect()
}

/// A 2×3 affine matrix in SVG order: `x' = a·x + c·y + e`, `y' = b·x + d·y + f`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Affine {
    /// Row 1, column 1
    pub a: f64,
    /// Row 2, column 1
    pub b: f64,
    /// Row 1, column 2
    pub c: f64,
    /// Row 2, column 2
    pub d: f64,
    /// Horizontal translation
    pub e: f64,
    /// Vertical translation
    pub f: f64,
}

impl Affine {
    /// The identity matrix.
    pub const IDENTITY: Affine = Affine {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        e: 0.0,
        f: 0.0,
    };

    /// Maps a point.
    pub fn apply(&self, (x, y): (f64, f64)) -> (f64, f64) {
        (
            self.a * x + self.c * y + self.e,
            self.b * x + self.d * y + self.f,
        )
    }

    /// `self ∘ inner`: applies `inner` first, then `self`.
    pub fn then_after(&self, inner: &Affine) -> Affine {
        Affine {
            a: self.a * inner.a + self.c * inner.b,
            b: self.b * inner.a + self.d * inner.b,
            c: self.a * inner.c + self.c * inner.d,
            d: self.b * inner.c + self.d * inner.d,
            e: self.a * inner.e + self.c * inner.f + self.e,
            f: self.b * inner.e + self.d * inner.f + self.f,
        }
    }

    /// The inverse matrix, or `None` when the matrix is singular.
    pub fn inverse(&self) -> Option<Affine> {
        let det = self.a * self.d - self.b * self.c;
        if det.abs() < f64::EPSILON {
            return None;
        }
        let inv = 1.0 / det;
        Some(Affine {
            a: self.d * inv,
            b: -self.b * inv,
            c: -self.c * inv,
            d: self.a * inv,
            e: (self.c * self.f - self.d * self.e) * inv,
            f: (self.b * self.e - self.a * self.f) * inv,
        })
    }

    /// Whether this is the identity matrix.
    pub fn is_identity(&self) -> bool {
        *self == Affine::IDENTITY
    }

    /// Mean scale factor; used to keep hit slop and handle sizes in screen proportion.
    pub fn mean_scale(&self) -> f64 {
        let sx = (self.a * self.a + self.b * self.b).sqrt();
        let sy = (self.c * self.c + self.d * self.d).sqrt();
        (sx + sy) / 2.0
    }

    /// Converts to a tiny-skia transform for rasterization.
    pub fn to_skia(&self) -> tiny_skia::Transform {
        tiny_skia::Transform::from_row(
            self.a as f32,
            self.b as f32,
            self.c as f32,
            self.d as f32,
            self.e as f32,
            self.f as f32,
        )
    }

    /// SVG `transform` attribute value.
    pub fn to_svg(&self) -> String {
        format!(
            "matrix({} {} {} {} {} {})",
            self.a, self.b, self.c, self.d, self.e, self.f
        )
    }
}

impl Default for Affine {
    fn default() -> Self {
        Affine::IDENTITY
    }
}

/// Group transform attributes: translation, rotation (radians) and independent X/Y scale,
/// applied around the group's own origin as `T · R · S`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupTransform {
    /// Horizontal translation
    pub x: f64,
    /// Vertical translation
    pub y: f64,
    /// Rotation in radians, clockwise in canvas space (y grows downward)
    pub rotation: f64,
    /// Horizontal scale
    pub scale_x: f64,
    /// Vertical scale
    pub scale_y: f64,
}

impl GroupTransform {
    /// Translation 0, rotation 0, scale 1.
    pub const IDENTITY: GroupTransform = GroupTransform {
        x: 0.0,
        y: 0.0,
        rotation: 0.0,
        scale_x: 1.0,
        scale_y: 1.0,
    };

    /// Pure translation.
    pub fn translation(dx: f64, dy: f64) -> Self {
        Self {
            x: dx,
            y: dy,
            ..Self::IDENTITY
        }
    }

    /// Scale by `(sx, sy)` keeping `anchor` fixed.
    pub fn scale_about(anchor: (f64, f64), sx: f64, sy: f64) -> Self {
        Self {
            x: anchor.0 * (1.0 - sx),
            y: anchor.1 * (1.0 - sy),
            rotation: 0.0,
            scale_x: sx,
            scale_y: sy,
        }
    }

    /// Rotate by `angle` radians keeping `center` fixed.
    pub fn rotation_about(center: (f64, f64), angle: f64) -> Self {
        let (sin, cos) = angle.sin_cos();
        Self {
            x: center.0 - (cos * center.0 - sin * center.1),
            y: center.1 - (sin * center.0 + cos * center.1),
            rotation: angle,
            scale_x: 1.0,
            scale_y: 1.0,
        }
    }

    /// Whether the attributes are exactly the identity.
    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }

    /// The equivalent matrix.
    pub fn to_affine(&self) -> Affine {
        let (sin, cos) = self.rotation.sin_cos();
        Affine {
            a: cos * self.scale_x,
            b: sin * self.scale_x,
            c: -sin * self.scale_y,
            d: cos * self.scale_y,
            e: self.x,
            f: self.y,
        }
    }

    /// Maps one point.
    pub fn apply(&self, point: (f64, f64)) -> (f64, f64) {
        self.to_affine().apply(point)
    }

    /// Maps a batch of points.
    pub fn apply_all(&self, points: &[(f64, f64)]) -> Vec<(f64, f64)> {
        let m = self.to_affine();
        points.iter().map(|&p| m.apply(p)).collect()
    }

    /// Maps both endpoints of a `[x1, y1, x2, y2]` segment.
    pub fn apply_segment(&self, seg: [f64; 4]) -> [f64; 4] {
        let m = self.to_affine();
        let (x1, y1) = m.apply((seg[0], seg[1]));
        let (x2, y2) = m.apply((seg[2], seg[3]));
        [x1, y1, x2, y2]
    }
}

impl Default for GroupTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// Axis-aligned bounds in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    /// Left edge
    pub min_x: f64,
    /// Top edge
    pub min_y: f64,
    /// Right edge
    pub max_x: f64,
    /// Bottom edge
    pub max_y: f64,
}

impl Bounds {
    /// Bounds of a point set, or `None` when it is empty.
    pub fn from_points(points: impl IntoIterator<Item = (f64, f64)>) -> Option<Bounds> {
        points.into_iter().fold(None, |acc, (x, y)| {
            Some(match acc {
                None => Bounds {
                    min_x: x,
                    min_y: y,
                    max_x: x,
                    max_y: y,
                },
                Some(b) => Bounds {
                    min_x: b.min_x.min(x),
                    min_y: b.min_y.min(y),
                    max_x: b.max_x.max(x),
                    max_y: b.max_y.max(y),
                },
            })
        })
    }

    /// Grows the bounds by `pad` on every side.
    pub fn padded(&self, pad: f64) -> Bounds {
        Bounds {
            min_x: self.min_x - pad,
            min_y: self.min_y - pad,
            max_x: self.max_x + pad,
            max_y: self.max_y + pad,
        }
    }

    /// Smallest bounds containing both.
    pub fn union(&self, other: &Bounds) -> Bounds {
        Bounds {
            min_x: self.min_x.min(other.min_x),
            min_y: self.min_y.min(other.min_y),
            max_x: self.max_x.max(other.max_x),
            max_y: self.max_y.max(other.max_y),
        }
    }

    /// Center point.
    pub fn center(&self) -> (f64, f64) {
        ((self.min_x + self.max_x) / 2.0, (self.min_y + self.max_y) / 2.0)
    }

    /// Width.
    pub fn width(&self) -> f64 {
        self.max_x - self.min_x
    }

    /// Height.
    pub fn height(&self) -> f64 {
        self.max_y - self.min_y
    }

    /// Corners in order top-left, top-right, bottom-right, bottom-left.
    pub fn corners(&self) -> [(f64, f64); 4] {
        [
            (self.min_x, self.min_y),
            (self.max_x, self.min_y),
            (self.max_x, self.max_y),
            (self.min_x, self.max_y),
        ]
    }

    /// Whether `p` lies inside (edges included).
    pub fn contains(&self, (x, y): (f64, f64)) -> bool {
        x >= self.min_x && x <= self.max_x && y >= self.min_y && y <= self.max_y
    }
}
