//! Export pipeline: rasterizes the render tree without disturbing the live scene.
//!
//! Grid backgrounds are exported from an isolated copy of the content layer (optionally on a
//! white backing for JPEG). Image and color backgrounds are exported from the live tree with
//! the gizmo and every line hit-target hidden for the duration of the capture; a guard puts
//! their visibility back whether or not the capture succeeds.

use crate::constants;
use crate::error::ExportError;
use crate::raster;
use crate::reconciler::{Layers, RenderReconciler};
use crate::scene::{NodeId, Paint, Role, SceneNode, SceneTree, Shape};
use crate::types::BackgroundKind;
use chrono::Local;
use std::fmt;
use std::ops::Deref;
use std::str::FromStr;

/// Output density multiplier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PixelRatio {
    /// 2×
    #[default]
    X2,
    /// 3×
    X3,
    /// 4×
    X4,
}

impl PixelRatio {
    /// All supported ratios.
    pub const ALL: [PixelRatio; 3] = [PixelRatio::X2, PixelRatio::X3, PixelRatio::X4];

    /// The multiplier as a number.
    pub fn factor(self) -> u8 {
        match self {
            PixelRatio::X2 => 2,
            PixelRatio::X3 => 3,
            PixelRatio::X4 => 4,
        }
    }
}

impl TryFrom<u8> for PixelRatio {
    type Error = ExportError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            2 => Ok(PixelRatio::X2),
            3 => Ok(PixelRatio::X3),
            4 => Ok(PixelRatio::X4),
            other => Err(ExportError::InvalidOptions(format!(
                "pixel ratio must be 2, 3 or 4, got {other}"
            ))),
        }
    }
}

/// Output encoding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    /// Lossless PNG
    #[default]
    Png,
    /// Lossy JPEG
    Jpeg,
}

impl ExportFormat {
    /// MIME type.
    pub fn mime_type(self) -> &'static str {
        match self {
            ExportFormat::Png => "image/png",
            ExportFormat::Jpeg => "image/jpeg",
        }
    }

    /// File extension without the dot.
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::Png => "png",
            ExportFormat::Jpeg => "jpg",
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.mime_type())
    }
}

impl FromStr for ExportFormat {
    type Err = ExportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "image/png" => Ok(ExportFormat::Png),
            "image/jpeg" => Ok(ExportFormat::Jpeg),
            other => Err(ExportError::InvalidOptions(format!(
                "unsupported mime type `{other}`"
            ))),
        }
    }
}

/// Caller-facing export options.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExportOptions {
    /// Output density
    pub pixel_ratio: PixelRatio,
    /// Output encoding
    pub format: ExportFormat,
    /// JPEG quality in `0..=1`; ignored for PNG
    pub quality: f64,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            pixel_ratio: PixelRatio::X2,
            format: ExportFormat::Png,
            quality: 0.92,
        }
    }
}

impl ExportOptions {
    /// Validates the wire-level options `{ pixelRatio, mimeType, quality }`.
    pub fn new(pixel_ratio: u8, mime_type: &str, quality: f64) -> Result<Self, ExportError> {
        if !(0.0..=1.0).contains(&quality) {
            return Err(ExportError::InvalidOptions(format!(
                "quality must be within 0..1, got {quality}"
            )));
        }
        Ok(Self {
            pixel_ratio: PixelRatio::try_from(pixel_ratio)?,
            format: mime_type.parse()?,
            quality,
        })
    }
}

/// Encoded image plus a suggested file name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportOutput {
    /// Encoded bytes
    pub bytes: Vec<u8>,
    /// `star-map-YYYYMMDD-HHMMSS.{png,jpg}`
    pub filename: String,
    /// MIME type of `bytes`
    pub mime_type: &'static str,
}

/// Suggested file name for an export made now.
pub fn suggested_filename(format: ExportFormat) -> String {
    format!(
        "{}-{}.{}",
        constants::EXPORT_FILE_PREFIX,
        Local::now().format("%Y%m%d-%H%M%S"),
        format.extension()
    )
}

/// Hides nodes for the lifetime of the guard and restores their prior visibility on drop.
pub struct VisibilityGuard<'a> {
    tree: &'a mut SceneTree,
    saved: Vec<(NodeId, bool)>,
}

impl<'a> VisibilityGuard<'a> {
    /// Hides every node matching `pred`.
    pub fn hide(tree: &'a mut SceneTree, pred: impl Fn(&SceneNode) -> bool) -> Self {
        let targets: Vec<NodeId> = tree
            .walk_all()
            .into_iter()
            .filter(|id| tree.get(*id).is_some_and(&pred))
            .collect();
        let mut saved = Vec::with_capacity(targets.len());
        for id in targets {
            if let Some(node) = tree.get_mut(id) {
                saved.push((id, node.visible));
                node.visible = false;
            }
        }
        Self { tree, saved }
    }
}

impl Deref for VisibilityGuard<'_> {
    type Target = SceneTree;

    fn deref(&self) -> &SceneTree {
        self.tree
    }
}

impl Drop for VisibilityGuard<'_> {
    fn drop(&mut self) {
        for (id, visible) in self.saved.drain(..) {
            if let Some(node) = self.tree.get_mut(id) {
                node.visible = visible;
            }
        }
    }
}

fn is_interaction_chrome(node: &SceneNode) -> bool {
    node.role == Role::Gizmo || node.role.is_hit_target()
}

/// Builds a fresh tree holding only the content layer, minus gizmo and hit-targets.
///
/// JPEG output gets an opaque white backing since it cannot carry transparency.
pub fn isolated_content(
    live: &SceneTree,
    layers: &Layers,
    dimensions: (u32, u32),
    format: ExportFormat,
) -> SceneTree {
    let mut isolated = SceneTree::new();
    let root = isolated.root();
    if format == ExportFormat::Jpeg {
        isolated.add(
            root,
            SceneNode::new(
                Role::ExportBacking,
                Shape::Rect {
                    x: 0.0,
                    y: 0.0,
                    width: f64::from(dimensions.0),
                    height: f64::from(dimensions.1),
                },
            )
            .with_paint(Paint {
                fill: Some(constants::EXPORT_BACKING_COLOR.to_string()),
                ..Paint::default()
            }),
        );
    }
    live.deep_copy_into(layers.content, &mut isolated, root, &|n| {
        !is_interaction_chrome(n)
    });
    isolated
}

/// Produces export images from the reconciler's tree.
#[derive(Debug, Default)]
pub struct ExportPipeline;

impl ExportPipeline {
    /// Creates the pipeline.
    pub fn new() -> Self {
        Self
    }

    /// Rasterizes and encodes the current scene under the background-dependent policy.
    pub fn export(
        &self,
        reconciler: &mut RenderReconciler,
        background: BackgroundKind,
        options: &ExportOptions,
    ) -> Result<ExportOutput, ExportError> {
        let layers = reconciler.layers().ok_or(ExportError::NotInitialized)?;
        let (width, height) = reconciler.dimensions();
        let ratio = f32::from(options.pixel_ratio.factor());

        let pixmap = match background {
            BackgroundKind::Grid => {
                let isolated =
                    isolated_content(reconciler.tree(), &layers, (width, height), options.format);
                raster::rasterize(&isolated, width, height, ratio)?
            }
            BackgroundKind::Image | BackgroundKind::Color => {
                let guard = VisibilityGuard::hide(reconciler.tree_mut(), is_interaction_chrome);
                raster::rasterize(&guard, width, height, ratio)?
            }
        };

        let bytes = match options.format {
            ExportFormat::Png => raster::encode_png(&pixmap)?,
            ExportFormat::Jpeg => raster::encode_jpeg(&pixmap, options.quality)?,
        };
        let filename = suggested_filename(options.format);
        log::info!(
            "exported {}x{} {} ({} bytes)",
            pixmap.width(),
            pixmap.height(),
            options.format,
            bytes.len()
        );
        Ok(ExportOutput {
            bytes,
            filename,
            mime_type: options.format.mime_type(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resources::DecodedImage;
    use crate::store::GeometryStore;
    use crate::types::BackgroundPatch;
    use std::sync::Arc;

    const SCENE: &str = r#"{"points":[{"id":1,"x":0.1,"y":0.1},{"id":2,"x":0.9,"y":0.9}],"connections":[[1,2]]}"#;

    fn mounted() -> (GeometryStore, RenderReconciler) {
        let mut store = GeometryStore::default();
        store.import_json(SCENE).unwrap();
        let mut r = RenderReconciler::new();
        r.mount(&mut store);
        r.set_gizmo_visible(true);
        (store, r)
    }

    fn visibility(r: &RenderReconciler) -> Vec<(NodeId, bool)> {
        r.tree()
            .walk_all()
            .into_iter()
            .map(|id| (id, r.tree().get(id).unwrap().visible))
            .collect()
    }

    #[test]
    fn options_validate_wire_values() {
        let opts = ExportOptions::new(3, "image/jpeg", 0.8).unwrap();
        assert_eq!(opts.pixel_ratio, PixelRatio::X3);
        assert_eq!(opts.format, ExportFormat::Jpeg);
        assert!(matches!(
            ExportOptions::new(1, "image/png", 1.0),
            Err(ExportError::InvalidOptions(_))
        ));
        assert!(ExportOptions::new(2, "image/webp", 1.0).is_err());
        assert!(ExportOptions::new(2, "image/png", 1.5).is_err());
    }

    #[test]
    fn filename_has_timestamp_and_extension() {
        let name = suggested_filename(ExportFormat::Jpeg);
        assert!(name.starts_with("star-map-"));
        assert!(name.ends_with(".jpg"));
        // star-map-YYYYMMDD-HHMMSS.jpg
        assert_eq!(name.len(), "star-map-".len() + 15 + ".jpg".len());
        assert!(suggested_filename(ExportFormat::Png).ends_with(".png"));
    }

    #[test]
    fn unmounted_export_is_reported() {
        let mut r = RenderReconciler::new();
        let err = ExportPipeline::new()
            .export(&mut r, BackgroundKind::Grid, &ExportOptions::default())
            .unwrap_err();
        assert!(matches!(err, ExportError::NotInitialized));
    }

    #[test]
    fn isolated_copy_drops_chrome_and_background() {
        let (store, r) = mounted();
        let layers = r.layers().unwrap();
        let png = isolated_content(r.tree(), &layers, store.dimensions(), ExportFormat::Png);
        assert_eq!(png.count(|n| n.role == Role::Gizmo), 0);
        assert_eq!(png.count(|n| n.role.is_hit_target()), 0);
        assert_eq!(png.count(|n| n.role == Role::GridLine), 0);
        assert_eq!(png.count(|n| n.role == Role::ExportBacking), 0);
        assert_eq!(png.count(|n| matches!(n.role, Role::StarMain(_))), 2);

        let jpeg = isolated_content(r.tree(), &layers, store.dimensions(), ExportFormat::Jpeg);
        assert_eq!(jpeg.count(|n| n.role == Role::ExportBacking), 1);
    }

    #[test]
    fn grid_export_leaves_live_tree_untouched() {
        let (_, mut r) = mounted();
        let before = visibility(&r);
        let len = r.tree().len();
        let out = ExportPipeline::new()
            .export(&mut r, BackgroundKind::Grid, &ExportOptions::default())
            .unwrap();
        assert_eq!(&out.bytes[..4], b"\x89PNG");
        assert_eq!(visibility(&r), before);
        assert_eq!(r.tree().len(), len);
    }

    #[test]
    fn color_export_restores_visibility() {
        let (mut store, mut r) = mounted();
        store.set_background(BackgroundPatch {
            kind: Some(BackgroundKind::Color),
            color: Some("#202020".into()),
            ..Default::default()
        });
        r.sync(&mut store);
        r.set_gizmo_visible(true);
        let before = visibility(&r);
        let opts = ExportOptions::new(2, "image/jpeg", 0.9).unwrap();
        let out = ExportPipeline::new()
            .export(&mut r, BackgroundKind::Color, &opts)
            .unwrap();
        assert_eq!(&out.bytes[..2], &[0xFF, 0xD8]);
        assert!(out.filename.ends_with(".jpg"));
        assert_eq!(visibility(&r), before);
        assert!(r.gizmo_visible());
    }

    #[test]
    fn image_export_draws_background_and_restores_visibility() {
        let (mut store, mut r) = mounted();
        let url = "memory://sky.png";
        store.set_background(BackgroundPatch {
            kind: Some(BackgroundKind::Image),
            image_url: Some(url.into()),
            ..Default::default()
        });
        let sky = DecodedImage {
            width: 8,
            height: 8,
            rgba: [10, 120, 200, 255].repeat(64),
        };
        store.set_background_natural_size(url, sky.size());
        r.set_background_image(url, Arc::new(sky));
        r.sync(&mut store);
        assert_eq!(r.tree().count(|n| n.role == Role::BackgroundImage), 1);
        r.set_gizmo_visible(true);
        let before = visibility(&r);

        let out = ExportPipeline::new()
            .export(&mut r, BackgroundKind::Image, &ExportOptions::default())
            .unwrap();

        let decoded = image::load_from_memory(&out.bytes).unwrap().to_rgba8();
        let (width, height) = r.dimensions();
        assert_eq!(decoded.dimensions(), (width * 2, height * 2));
        // Top-right corner, clear of both stars and the line between them.
        let pixel = decoded.get_pixel(width * 2 * 9 / 10, height * 2 / 10);
        assert_eq!(pixel.0, [10, 120, 200, 255]);
        assert_eq!(visibility(&r), before);
        assert!(r.gizmo_visible());
    }

    #[test]
    fn guard_restores_on_drop() {
        let (_, mut r) = mounted();
        let before = visibility(&r);
        {
            let guard = VisibilityGuard::hide(r.tree_mut(), is_interaction_chrome);
            assert_eq!(guard.count(|n| n.role == Role::Gizmo && n.visible), 0);
            assert_eq!(guard.count(|n| n.role.is_hit_target() && n.visible), 0);
        }
        assert_eq!(visibility(&r), before);
    }
}
