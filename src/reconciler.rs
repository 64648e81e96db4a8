//! Render reconciler: keeps the retained [`SceneTree`] in step with the [`GeometryStore`].
//!
//! Layering, back to front: the background layer (grid, fitted image or color rectangle), then
//! the content layer holding every line's four primitives, the star group and the gizmo.
//! Rebuilds are driven by the store's [`Changes`](crate::store::Changes) flags: resizes and
//! background switches rebuild the background, any content change rebuilds lines and stars
//! wholesale. Between rebuilds only the transform session touches line geometry.

use crate::constants;
use crate::mapper::{Bounds, GroupTransform};
use crate::resources::{cover_crop, DecodedImage};
use crate::scene::{GizmoFrame, GizmoHandle, Paint, Role, SceneNode, SceneTree, Shape};
use crate::store::GeometryStore;
use crate::types::{BackgroundConfig, Line, LineId, Shadow, Star, StarId};
use std::sync::Arc;

pub use crate::scene::NodeId;

/// Handles of the fixed container nodes created at mount.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Layers {
    /// Background container
    pub background: NodeId,
    /// Content container (lines, stars, gizmo)
    pub content: NodeId,
    /// Container of all line primitives
    pub lines: NodeId,
    /// The interactive star group
    pub stars: NodeId,
    /// The transform gizmo
    pub gizmo: NodeId,
}

/// What a pointer press landed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Hit {
    /// A gizmo handle
    GizmoHandle(GizmoHandle),
    /// The star group, with the star under the pointer when one is
    StarGroup(Option<StarId>),
    /// A line's hit-target
    LineHitTarget(LineId),
    /// Nothing interactive
    Empty,
}

/// The four node handles of one rendered line, back to front.
#[derive(Debug, Clone, Copy)]
struct LineNodes {
    id: LineId,
    outer: NodeId,
    middle: NodeId,
    main: NodeId,
    hit: NodeId,
}

/// A decoded background image together with the source it came from.
#[derive(Debug, Clone)]
struct AppliedImage {
    url: String,
    image: Arc<DecodedImage>,
}

/// What the background layer currently shows.
#[derive(Debug, Clone)]
enum RenderedBackground {
    Grid,
    Image(AppliedImage),
    Color(String),
}

/// Owner of the render tree.
#[derive(Debug, Default)]
pub struct RenderReconciler {
    tree: SceneTree,
    layers: Option<Layers>,
    dimensions: (u32, u32),
    line_nodes: Vec<LineNodes>,
    loaded_image: Option<AppliedImage>,
    rendered_background: Option<RenderedBackground>,
}

impl RenderReconciler {
    /// An unmounted reconciler with an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether [`RenderReconciler::mount`] has run.
    pub fn is_mounted(&self) -> bool {
        self.layers.is_some()
    }

    /// Container handles, once mounted.
    pub fn layers(&self) -> Option<Layers> {
        self.layers
    }

    /// Read access to the render tree.
    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    /// Write access for the export pipeline's visibility toggles.
    pub(crate) fn tree_mut(&mut self) -> &mut SceneTree {
        &mut self.tree
    }

    /// Canvas size the tree was last built for.
    pub fn dimensions(&self) -> (u32, u32) {
        self.dimensions
    }

    /// Builds the layer skeleton and renders the whole store.
    pub fn mount(&mut self, store: &mut GeometryStore) {
        if self.is_mounted() {
            self.unmount();
        }
        self.layers = build_layers(&mut self.tree);
        store.take_changes();
        self.dimensions = store.dimensions();
        self.rebuild_background(store);
        self.rebuild_content(store);
        log::debug!("render tree mounted with {} nodes", self.tree.len());
    }

    /// Drops the render tree and everything cached for it.
    pub fn unmount(&mut self) {
        self.tree = SceneTree::new();
        self.layers = None;
        self.line_nodes.clear();
        self.rendered_background = None;
        log::debug!("render tree unmounted");
    }

    /// Applies pending store changes. Returns whether anything was rebuilt.
    pub fn sync(&mut self, store: &mut GeometryStore) -> bool {
        if !self.is_mounted() {
            return false;
        }
        let changes = store.take_changes();
        if !changes.any() {
            return false;
        }
        self.dimensions = store.dimensions();
        if changes.background || changes.dimensions {
            self.rebuild_background(store);
        }
        if changes.content || changes.dimensions {
            self.rebuild_content(store);
        }
        log::debug!("reconciled {changes:?}; {} nodes live", self.tree.len());
        true
    }

    /// Records a decoded background image for `url`.
    ///
    /// The caller has already checked that `url` is the active background; the next background
    /// rebuild draws it.
    pub fn set_background_image(&mut self, url: &str, image: Arc<DecodedImage>) {
        self.loaded_image = Some(AppliedImage {
            url: url.to_string(),
            image,
        });
    }

    /// The decoded background image for `url`, if it is the one already held.
    pub fn background_image(&self, url: &str) -> Option<&Arc<DecodedImage>> {
        self.loaded_image
            .as_ref()
            .filter(|img| img.url == url)
            .map(|img| &img.image)
    }

    /// Tears down the background layer and rebuilds it for the current background variant.
    ///
    /// An image background whose image is not decoded yet (or failed to decode) keeps showing
    /// the previously rendered background, or a grid when there is none.
    pub fn rebuild_background(&mut self, store: &GeometryStore) {
        let Some(layers) = self.layers else {
            return;
        };
        self.tree.clear_children(layers.background);
        let next = match store.background() {
            BackgroundConfig::Grid => RenderedBackground::Grid,
            BackgroundConfig::Color { color } => RenderedBackground::Color(color.clone()),
            BackgroundConfig::Image { url } => match &self.loaded_image {
                Some(applied) if applied.url == *url => RenderedBackground::Image(applied.clone()),
                _ => self
                    .rendered_background
                    .clone()
                    .unwrap_or(RenderedBackground::Grid),
            },
        };
        let (w, h) = self.dimensions;
        let (w, h) = (f64::from(w), f64::from(h));
        let full = Shape::Rect {
            x: 0.0,
            y: 0.0,
            width: w,
            height: h,
        };
        let base = store.canvas().background_color.clone();
        match &next {
            RenderedBackground::Grid => {
                self.add_backdrop(layers.background, full, &base);
                self.add_grid(layers.background, w, h);
            }
            RenderedBackground::Color(color) => {
                self.add_backdrop(layers.background, full, color);
            }
            RenderedBackground::Image(applied) => {
                self.add_backdrop(layers.background, full, &base);
                let crop = cover_crop(applied.image.size(), self.dimensions);
                let dest = Bounds {
                    min_x: 0.0,
                    min_y: 0.0,
                    max_x: w,
                    max_y: h,
                };
                self.tree.add(
                    layers.background,
                    SceneNode::new(
                        Role::BackgroundImage,
                        Shape::Image {
                            image: Arc::clone(&applied.image),
                            crop,
                            dest,
                        },
                    ),
                );
            }
        }
        self.rendered_background = Some(next);
    }

    fn add_backdrop(&mut self, parent: NodeId, shape: Shape, color: &str) {
        self.tree.add(
            parent,
            SceneNode::new(Role::Backdrop, shape).with_paint(Paint {
                fill: Some(color.to_string()),
                ..Paint::default()
            }),
        );
    }

    fn add_grid(&mut self, parent: NodeId, w: f64, h: f64) {
        let paint = Paint {
            stroke: Some(constants::GRID_LINE_COLOR.to_string()),
            stroke_width: 1.0,
            ..Paint::default()
        };
        let step = constants::GRID_SIZE;
        let mut x = 0.0;
        while x <= w {
            let node = SceneNode::new(Role::GridLine, Shape::Line { points: [x, 0.0, x, h] });
            self.tree.add(parent, node.with_paint(paint.clone()));
            x += step;
        }
        let mut y = 0.0;
        while y <= h {
            let node = SceneNode::new(Role::GridLine, Shape::Line { points: [0.0, y, w, y] });
            self.tree.add(parent, node.with_paint(paint.clone()));
            y += step;
        }
    }

    /// Rebuilds every line and star node from the store.
    ///
    /// The star group's transform is reset to identity; the gizmo node is kept and stays
    /// visible only while there are stars to frame.
    pub fn rebuild_content(&mut self, store: &GeometryStore) {
        let Some(layers) = self.layers else {
            return;
        };
        self.tree.clear_children(layers.lines);
        self.tree.clear_children(layers.stars);
        self.line_nodes.clear();
        if let Some(group) = self.tree.get_mut(layers.stars) {
            group.transform = GroupTransform::IDENTITY;
        }

        for line in store.lines() {
            if let Some(nodes) = self.add_line(layers.lines, line) {
                self.line_nodes.push(nodes);
            }
        }
        for star in store.stars() {
            self.add_star(layers.stars, star);
        }
        if store.star_count() == 0 {
            self.set_gizmo_visible(false);
        }
    }

    fn add_line(&mut self, parent: NodeId, line: &Line) -> Option<LineNodes> {
        let style = &line.style;
        let glow = |width_factor: f64, blur_factor: f64, opacity: f64| Paint {
            fill: None,
            stroke: Some(style.stroke.clone()),
            stroke_width: style.stroke_width * width_factor,
            opacity: style.opacity * opacity,
            shadow: scaled_shadow(&style.shadow, blur_factor),
        };
        let shape = || Shape::Line {
            points: line.points,
        };
        let id = line.id;
        let outer = self.tree.add(
            parent,
            SceneNode::new(Role::LineGlowOuter(id), shape()).with_paint(glow(
                constants::LINE_OUTER_GLOW_WIDTH,
                constants::LINE_OUTER_GLOW_BLUR,
                constants::LINE_OUTER_GLOW_OPACITY,
            )),
        )?;
        let middle = self.tree.add(
            parent,
            SceneNode::new(Role::LineGlowMiddle(id), shape()).with_paint(glow(
                constants::LINE_MIDDLE_GLOW_WIDTH,
                constants::LINE_MIDDLE_GLOW_BLUR,
                constants::LINE_MIDDLE_GLOW_OPACITY,
            )),
        )?;
        let main = self.tree.add(
            parent,
            SceneNode::new(Role::LineMain(id), shape()).with_paint(glow(1.0, 1.0, 1.0)),
        )?;
        let hit = self.tree.add(
            parent,
            SceneNode::new(Role::LineHitTarget(id), shape())
                .with_paint(Paint {
                    stroke_width: hit_target_width(style.stroke_width),
                    ..Paint::default()
                })
                .listening(true),
        )?;
        Some(LineNodes {
            id,
            outer,
            middle,
            main,
            hit,
        })
    }

    fn add_star(&mut self, parent: NodeId, star: &Star) {
        let style = &star.style;
        let (x, y) = star.position;
        let glow = |opacity: f64| Paint {
            fill: Some(style.fill.clone()),
            opacity: style.opacity * opacity,
            ..Paint::default()
        };
        let circle = |radius_factor: f64| Shape::Circle {
            x,
            y,
            radius: style.radius * radius_factor,
        };
        let nodes = [
            SceneNode::new(
                Role::StarGlowOuter(star.id),
                circle(constants::STAR_OUTER_GLOW_RADIUS),
            )
            .with_paint(glow(constants::STAR_OUTER_GLOW_OPACITY)),
            SceneNode::new(
                Role::StarGlowMiddle(star.id),
                circle(constants::STAR_MIDDLE_GLOW_RADIUS),
            )
            .with_paint(glow(constants::STAR_MIDDLE_GLOW_OPACITY)),
            SceneNode::new(Role::StarMain(star.id), circle(1.0)).with_paint(Paint {
                fill: Some(style.fill.clone()),
                stroke: Some(style.stroke.clone()),
                stroke_width: style.stroke_width,
                opacity: style.opacity,
                shadow: style.shadow.enabled.then(|| style.shadow.clone()),
            }),
        ];
        for node in nodes {
            self.tree.add(parent, node.listening(true));
        }
    }

    /// Current transform of the star group.
    pub fn group_transform(&self) -> GroupTransform {
        self.layers
            .and_then(|l| self.tree.get(l.stars))
            .map(|n| n.transform)
            .unwrap_or_default()
    }

    /// Sets the star group's live transform.
    pub fn set_group_transform(&mut self, transform: GroupTransform) {
        if let Some(group) = self.layers.and_then(|l| self.tree.get_mut(l.stars)) {
            group.transform = transform;
        }
    }

    /// Moves every rendered line (all four primitives) to `transform` applied to `origins`.
    ///
    /// `origins` are the committed segments captured when the gesture began, in line order.
    pub fn project_lines(&mut self, transform: &GroupTransform, origins: &[(LineId, [f64; 4])]) {
        let m = transform.to_affine();
        for (nodes, (id, seg)) in self.line_nodes.iter().zip(origins) {
            if nodes.id != *id {
                continue;
            }
            let (x1, y1) = m.apply((seg[0], seg[1]));
            let (x2, y2) = m.apply((seg[2], seg[3]));
            for node_id in [nodes.outer, nodes.middle, nodes.main, nodes.hit] {
                if let Some(node) = self.tree.get_mut(node_id) {
                    node.shape = Shape::Line {
                        points: [x1, y1, x2, y2],
                    };
                }
            }
        }
    }

    /// Current rendered segment of each line, in line order.
    pub fn rendered_segments(&self) -> Vec<(LineId, [f64; 4])> {
        self.line_nodes
            .iter()
            .filter_map(|nodes| match self.tree.get(nodes.main)?.shape {
                Shape::Line { points } => Some((nodes.id, points)),
                _ => None,
            })
            .collect()
    }

    /// Shows or hides the gizmo. It never shows without stars to frame.
    pub fn set_gizmo_visible(&mut self, visible: bool) {
        let Some(layers) = self.layers else {
            return;
        };
        let has_stars = !self.tree.children(layers.stars).is_empty();
        if let Some(gizmo) = self.tree.get_mut(layers.gizmo) {
            gizmo.visible = visible && has_stars;
        }
    }

    /// Whether the gizmo is visible.
    pub fn gizmo_visible(&self) -> bool {
        self.layers
            .and_then(|l| self.tree.get(l.gizmo))
            .is_some_and(|n| n.visible)
    }

    /// Canvas geometry of the gizmo, whether or not it is visible.
    pub fn gizmo_frame(&self) -> Option<GizmoFrame> {
        self.tree.gizmo_frame(self.layers?.gizmo)
    }

    /// Classifies what lies under canvas point `p`.
    pub fn hit_test(&self, p: (f64, f64)) -> Hit {
        let Some(layers) = self.layers else {
            return Hit::Empty;
        };
        if let Some(handle) = self.tree.gizmo_handle_at(layers.gizmo, p) {
            return Hit::GizmoHandle(handle);
        }
        let Some(id) = self.tree.hit_test(p) else {
            return Hit::Empty;
        };
        let Some(node) = self.tree.get(id) else {
            return Hit::Empty;
        };
        if let Role::LineHitTarget(line) = node.role {
            return Hit::LineHitTarget(line);
        }
        if self.tree.ancestor_with_role(id, Role::StarGroup).is_some() {
            return Hit::StarGroup(node.role.star_id());
        }
        Hit::Empty
    }
}

fn build_layers(tree: &mut SceneTree) -> Option<Layers> {
    let root = tree.root();
    let background = tree.add(root, SceneNode::new(Role::BackgroundLayer, Shape::Group))?;
    let content = tree.add(root, SceneNode::group(Role::ContentLayer))?;
    let lines = tree.add(content, SceneNode::group(Role::LinesGroup))?;
    let stars = tree.add(content, SceneNode::group(Role::StarGroup))?;
    let gizmo = tree.add(
        content,
        SceneNode::new(Role::Gizmo, Shape::Gizmo { target: stars })
            .visible(false)
            .listening(true),
    )?;
    Some(Layers {
        background,
        content,
        lines,
        stars,
        gizmo,
    })
}

/// Width of a line's invisible hit-target.
pub fn hit_target_width(stroke_width: f64) -> f64 {
    (stroke_width * constants::HIT_TARGET_WIDTH_FACTOR).max(constants::HIT_TARGET_MIN_WIDTH)
}

fn scaled_shadow(shadow: &Shadow, blur_factor: f64) -> Option<Shadow> {
    shadow.enabled.then(|| Shadow {
        blur: shadow.blur * blur_factor,
        ..shadow.clone()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{BackgroundKind, BackgroundPatch, StarStylePatch};
    use approx::assert_relative_eq;

    const SCENE: &str = r#"{"points":[{"id":1,"x":0.1,"y":0.1},{"id":2,"x":0.9,"y":0.9},{"id":3,"x":0.5,"y":0.2}],
        "connections":[[1,2],[2,3]]}"#;

    fn mounted() -> (GeometryStore, RenderReconciler) {
        let mut store = GeometryStore::default();
        store.import_json(SCENE).unwrap();
        let mut reconciler = RenderReconciler::new();
        reconciler.mount(&mut store);
        (store, reconciler)
    }

    fn count(r: &RenderReconciler, pred: impl Fn(&Role) -> bool) -> usize {
        r.tree().count(|n| pred(&n.role))
    }

    #[test]
    fn mount_builds_layers() {
        let (_, r) = mounted();
        assert!(r.is_mounted());
        assert_eq!(count(&r, |role| matches!(role, Role::StarMain(_))), 3);
        assert_eq!(count(&r, |role| matches!(role, Role::StarGlowOuter(_))), 3);
        assert_eq!(count(&r, |role| role.is_hit_target()), 2);
        assert_eq!(count(&r, |role| role.line_id().is_some()), 8);
        assert_eq!(count(&r, |role| *role == Role::Gizmo), 1);
        assert!(!r.gizmo_visible());
        assert!(count(&r, |role| *role == Role::GridLine) > 0);
    }

    #[test]
    fn line_primitives_follow_glow_factors() {
        let (store, r) = mounted();
        let style = store.line_style().clone();
        let paint_of = |role: Role| {
            let id = r.tree().find_role(role).unwrap();
            r.tree().get(id).unwrap().paint.clone()
        };
        let outer = paint_of(Role::LineGlowOuter(LineId(0)));
        assert_relative_eq!(outer.stroke_width, style.stroke_width * 3.0);
        assert_relative_eq!(outer.shadow.unwrap().blur, style.shadow.blur * 2.5);
        assert_relative_eq!(outer.opacity, style.opacity * 0.15);

        let middle = paint_of(Role::LineGlowMiddle(LineId(0)));
        assert_relative_eq!(middle.stroke_width, style.stroke_width * 1.8);
        assert_relative_eq!(middle.opacity, style.opacity * 0.3);

        let hit = paint_of(Role::LineHitTarget(LineId(0)));
        assert_eq!(hit.stroke, None);
        assert_eq!(hit.stroke_width, 20.0);
        assert_eq!(hit_target_width(6.0), 30.0);
    }

    #[test]
    fn only_hit_targets_and_stars_listen() {
        let (_, r) = mounted();
        let listening_lines = r
            .tree()
            .count(|n| n.role.line_id().is_some() && n.listening);
        assert_eq!(listening_lines, 2);
        assert_eq!(r.tree().count(|n| n.role == Role::GridLine && n.listening), 0);
    }

    #[test]
    fn rebuild_does_not_leak_nodes() {
        let (mut store, mut r) = mounted();
        let before = r.tree().len();
        store.set_star_style(StarStylePatch {
            radius: Some(5.0),
            ..Default::default()
        });
        assert!(r.sync(&mut store));
        assert_eq!(r.tree().len(), before);
        assert!(!r.sync(&mut store));
    }

    #[test]
    fn resize_recomputes_grid() {
        let (mut store, mut r) = mounted();
        let tall = count(&r, |role| *role == Role::GridLine);
        store.set_aspect_ratio_name("1:1").unwrap();
        r.sync(&mut store);
        let square = count(&r, |role| *role == Role::GridLine);
        assert!(square < tall);
        assert_eq!(r.dimensions(), (400, 400));
    }

    #[test]
    fn background_switch_tears_down_previous_layer() {
        let (mut store, mut r) = mounted();
        store.set_background(BackgroundPatch {
            kind: Some(BackgroundKind::Color),
            color: Some("#123456".into()),
            ..Default::default()
        });
        r.sync(&mut store);
        assert_eq!(count(&r, |role| *role == Role::GridLine), 0);
        assert_eq!(count(&r, |role| *role == Role::Backdrop), 1);

        let url = "memory://sky.png";
        store.set_background(BackgroundPatch {
            kind: Some(BackgroundKind::Image),
            image_url: Some(url.into()),
            ..Default::default()
        });
        r.set_background_image(
            url,
            Arc::new(DecodedImage {
                width: 2,
                height: 2,
                rgba: vec![255; 16],
            }),
        );
        r.sync(&mut store);
        assert_eq!(count(&r, |role| *role == Role::BackgroundImage), 1);

        store.set_background_kind_name("grid").unwrap();
        r.sync(&mut store);
        assert_eq!(count(&r, |role| *role == Role::BackgroundImage), 0);
        assert!(count(&r, |role| *role == Role::GridLine) > 0);
    }

    #[test]
    fn pending_image_keeps_prior_background() {
        let (mut store, mut r) = mounted();
        store.set_background(BackgroundPatch {
            kind: Some(BackgroundKind::Color),
            color: Some("#123456".into()),
            ..Default::default()
        });
        r.sync(&mut store);
        store.set_background(BackgroundPatch {
            kind: Some(BackgroundKind::Image),
            image_url: Some("not-loaded.png".into()),
            ..Default::default()
        });
        r.sync(&mut store);
        let backdrop = r.tree().find_role(Role::Backdrop).unwrap();
        assert_eq!(
            r.tree().get(backdrop).unwrap().paint.fill.as_deref(),
            Some("#123456")
        );
        assert_eq!(count(&r, |role| *role == Role::BackgroundImage), 0);
    }

    fn backdrop_size(r: &RenderReconciler) -> (f64, f64) {
        let id = r.tree().find_role(Role::Backdrop).unwrap();
        match r.tree().get(id).unwrap().shape {
            Shape::Rect { width, height, .. } => (width, height),
            ref other => panic!("backdrop is not a rect: {other:?}"),
        }
    }

    #[test]
    fn resize_refits_color_backdrop() {
        let (mut store, mut r) = mounted();
        store.set_background(BackgroundPatch {
            kind: Some(BackgroundKind::Color),
            color: Some("#123456".into()),
            ..Default::default()
        });
        r.sync(&mut store);
        assert_eq!(backdrop_size(&r), (400.0, 711.0));

        store.set_aspect_ratio_name("1:1").unwrap();
        r.sync(&mut store);
        assert_eq!(r.dimensions(), (400, 400));
        assert_eq!(backdrop_size(&r), (400.0, 400.0));
        let backdrop = r.tree().find_role(Role::Backdrop).unwrap();
        assert_eq!(
            r.tree().get(backdrop).unwrap().paint.fill.as_deref(),
            Some("#123456")
        );
    }

    #[test]
    fn resize_refits_image_crop() {
        let (mut store, mut r) = mounted();
        let url = "memory://wide.png";
        store.set_background(BackgroundPatch {
            kind: Some(BackgroundKind::Image),
            image_url: Some(url.into()),
            ..Default::default()
        });
        r.set_background_image(
            url,
            Arc::new(DecodedImage {
                width: 800,
                height: 400,
                rgba: vec![255; 800 * 400 * 4],
            }),
        );
        r.sync(&mut store);
        let image_geometry = |r: &RenderReconciler| {
            let id = r.tree().find_role(Role::BackgroundImage).unwrap();
            match r.tree().get(id).unwrap().shape {
                Shape::Image { crop, dest, .. } => (crop, dest),
                ref other => panic!("background is not an image: {other:?}"),
            }
        };
        let (tall_crop, tall_dest) = image_geometry(&r);
        assert_eq!(tall_crop, cover_crop((800, 400), (400, 711)));
        assert_eq!((tall_dest.max_x, tall_dest.max_y), (400.0, 711.0));

        store.set_aspect_ratio_name("1:1").unwrap();
        r.sync(&mut store);
        let (square_crop, square_dest) = image_geometry(&r);
        assert_ne!(square_crop, tall_crop);
        assert_eq!(
            square_crop,
            Bounds { min_x: 200.0, min_y: 0.0, max_x: 600.0, max_y: 400.0 }
        );
        assert_eq!((square_dest.max_x, square_dest.max_y), (400.0, 400.0));
        assert_eq!(count(&r, |role| *role == Role::BackgroundImage), 1);
    }

    #[test]
    fn hit_test_classifies_targets() {
        let (store, mut r) = mounted();
        let star = store.stars().next().unwrap();
        assert_eq!(r.hit_test(star.position), Hit::StarGroup(Some(star.id)));

        let line = &store.lines()[0];
        let mid = (
            (line.points[0] + line.points[2]) / 2.0,
            (line.points[1] + line.points[3]) / 2.0,
        );
        assert_eq!(r.hit_test(mid), Hit::LineHitTarget(LineId(0)));
        assert_eq!(r.hit_test((390.0, 5.0)), Hit::Empty);

        r.set_gizmo_visible(true);
        let frame = r.gizmo_frame().unwrap();
        assert_eq!(r.hit_test(frame.rotate_handle), Hit::GizmoHandle(GizmoHandle::Rotate));
    }

    #[test]
    fn projection_moves_all_line_primitives() {
        let (store, mut r) = mounted();
        let origins: Vec<(LineId, [f64; 4])> =
            store.lines().iter().map(|l| (l.id, l.points)).collect();
        r.project_lines(&GroupTransform::translation(10.0, 20.0), &origins);
        for (id, seg) in r.rendered_segments() {
            let original = origins.iter().find(|(o, _)| *o == id).unwrap().1;
            assert_relative_eq!(seg[0], original[0] + 10.0);
            assert_relative_eq!(seg[3], original[3] + 20.0);
        }
        let hit = r.tree().find_role(Role::LineHitTarget(LineId(1))).unwrap();
        let Shape::Line { points } = r.tree().get(hit).unwrap().shape else {
            panic!("hit target is not a line");
        };
        assert_relative_eq!(points[0], origins[1].1[0] + 10.0);
    }

    #[test]
    fn gizmo_hides_without_stars() {
        let (mut store, mut r) = mounted();
        r.set_gizmo_visible(true);
        assert!(r.gizmo_visible());
        store.clear();
        r.sync(&mut store);
        assert!(!r.gizmo_visible());
        r.set_gizmo_visible(true);
        assert!(!r.gizmo_visible());
    }
}
