//! Retained-mode render tree.
//!
//! An arena of shape and group nodes with per-node paint, an affine transform, visibility and
//! a `listening` flag for hit testing. The render reconciler is the only writer in normal
//! operation; the transform session patches line geometry during a gesture and the export
//! pipeline toggles visibility or deep-copies content into an isolated tree.

use crate::constants;
use crate::mapper::{Affine, Bounds, GroupTransform};
use crate::resources::DecodedImage;
use crate::types::{LineId, Shadow, StarId};
use std::collections::HashMap;
use std::sync::Arc;

/// Handle of a node inside one [`SceneTree`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(u64);

/// What a node represents in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Role {
    /// Tree root
    Root,
    /// Container of the background nodes
    BackgroundLayer,
    /// Container of lines, the star group and the gizmo
    ContentLayer,
    /// Container of every line's four primitives
    LinesGroup,
    /// Base fill rectangle (grid base or solid color)
    Backdrop,
    /// One grid line
    GridLine,
    /// The fitted background image
    BackgroundImage,
    /// Outer glow of a line
    LineGlowOuter(LineId),
    /// Middle glow of a line
    LineGlowMiddle(LineId),
    /// Visible stroke of a line
    LineMain(LineId),
    /// Invisible wide hit area of a line
    LineHitTarget(LineId),
    /// The single interactive group holding every star
    StarGroup,
    /// Outer glow of a star
    StarGlowOuter(StarId),
    /// Middle glow of a star
    StarGlowMiddle(StarId),
    /// Main circle of a star
    StarMain(StarId),
    /// Transform handles bound to the star group
    Gizmo,
    /// Opaque backing placed behind isolated exports
    ExportBacking,
}

impl Role {
    /// Whether this is a line hit-target.
    pub fn is_hit_target(&self) -> bool {
        matches!(self, Role::LineHitTarget(_))
    }

    /// The line this node belongs to, if any.
    pub fn line_id(&self) -> Option<LineId> {
        match *self {
            Role::LineGlowOuter(id)
            | Role::LineGlowMiddle(id)
            | Role::LineMain(id)
            | Role::LineHitTarget(id) => Some(id),
            _ => None,
        }
    }

    /// The star this node belongs to, if any.
    pub fn star_id(&self) -> Option<StarId> {
        match *self {
            Role::StarGlowOuter(id) | Role::StarGlowMiddle(id) | Role::StarMain(id) => Some(id),
            _ => None,
        }
    }
}

/// Node geometry in the node's local coordinates.
#[derive(Debug, Clone)]
pub enum Shape {
    /// Container without geometry of its own
    Group,
    /// Axis-aligned rectangle
    Rect {
        /// Left edge
        x: f64,
        /// Top edge
        y: f64,
        /// Width
        width: f64,
        /// Height
        height: f64,
    },
    /// Circle
    Circle {
        /// Center x
        x: f64,
        /// Center y
        y: f64,
        /// Radius
        radius: f64,
    },
    /// Straight segment `[x1, y1, x2, y2]` with round caps
    Line {
        /// Endpoints
        points: [f64; 4],
    },
    /// Raster image; the `crop` region of the source is drawn into `dest`
    Image {
        /// Decoded pixels
        image: Arc<DecodedImage>,
        /// Source region in image pixels
        crop: Bounds,
        /// Destination region in local coordinates
        dest: Bounds,
    },
    /// Scale/rotate handles framing `target`
    Gizmo {
        /// Node the gizmo is bound to
        target: NodeId,
    },
}

/// Fill, stroke, opacity and shadow of a node.
#[derive(Debug, Clone, PartialEq)]
pub struct Paint {
    /// Fill color, none for unfilled
    pub fill: Option<String>,
    /// Stroke color, none for unstroked
    pub stroke: Option<String>,
    /// Stroke width; also the hit width of lines
    pub stroke_width: f64,
    /// Opacity in `0..=1`
    pub opacity: f64,
    /// Optional drop shadow
    pub shadow: Option<Shadow>,
}

impl Default for Paint {
    fn default() -> Self {
        Self {
            fill: None,
            stroke: None,
            stroke_width: 0.0,
            opacity: 1.0,
            shadow: None,
        }
    }
}

/// One node of the render tree.
#[derive(Debug, Clone)]
pub struct SceneNode {
    /// What the node represents
    pub role: Role,
    /// Geometry
    pub shape: Shape,
    /// Appearance
    pub paint: Paint,
    /// Local transform relative to the parent
    pub transform: GroupTransform,
    /// Hidden nodes and their subtrees are neither drawn nor hit
    pub visible: bool,
    /// Whether pointer events may land on this node (and, for groups, their children)
    pub listening: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
}

impl SceneNode {
    /// A visible, non-listening node with default paint.
    pub fn new(role: Role, shape: Shape) -> Self {
        Self {
            role,
            shape,
            paint: Paint::default(),
            transform: GroupTransform::IDENTITY,
            visible: true,
            listening: false,
            parent: None,
            children: Vec::new(),
        }
    }

    /// A listening group.
    pub fn group(role: Role) -> Self {
        Self::new(role, Shape::Group).listening(true)
    }

    /// Sets the paint.
    pub fn with_paint(mut self, paint: Paint) -> Self {
        self.paint = paint;
        self
    }

    /// Sets the listening flag.
    pub fn listening(mut self, listening: bool) -> Self {
        self.listening = listening;
        self
    }

    /// Sets the visibility flag.
    pub fn visible(mut self, visible: bool) -> Self {
        self.visible = visible;
        self
    }

    /// Parent node, `None` for the root.
    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Children in back-to-front order.
    pub fn children(&self) -> &[NodeId] {
        &self.children
    }
}

/// A node ready to be drawn, with its accumulated transform and opacity.
#[derive(Debug, Clone, Copy)]
pub struct DrawItem<'a> {
    /// Node handle
    pub id: NodeId,
    /// The node
    pub node: &'a SceneNode,
    /// Local → canvas transform
    pub world: Affine,
    /// Product of ancestor opacities (excluding the node's own)
    pub inherited_opacity: f64,
}

/// Corner of the gizmo frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Corner {
    /// Top-left
    TopLeft,
    /// Top-right
    TopRight,
    /// Bottom-right
    BottomRight,
    /// Bottom-left
    BottomLeft,
}

impl Corner {
    /// All corners in frame order.
    pub const ALL: [Corner; 4] = [
        Corner::TopLeft,
        Corner::TopRight,
        Corner::BottomRight,
        Corner::BottomLeft,
    ];

    /// Index into [`Bounds::corners`].
    pub fn index(self) -> usize {
        match self {
            Corner::TopLeft => 0,
            Corner::TopRight => 1,
            Corner::BottomRight => 2,
            Corner::BottomLeft => 3,
        }
    }

    /// The diagonally opposite corner.
    pub fn opposite(self) -> Corner {
        match self {
            Corner::TopLeft => Corner::BottomRight,
            Corner::TopRight => Corner::BottomLeft,
            Corner::BottomRight => Corner::TopLeft,
            Corner::BottomLeft => Corner::TopRight,
        }
    }
}

/// A manipulable part of the gizmo.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GizmoHandle {
    /// Corner scale handle
    Corner(Corner),
    /// Rotation handle above the top edge
    Rotate,
}

/// Gizmo geometry in canvas space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GizmoFrame {
    /// Target bounds (padded) in the target's local space
    pub local: Bounds,
    /// Frame corners in canvas space, in [`Corner::ALL`] order
    pub corners: [(f64, f64); 4],
    /// Center of the rotation handle in canvas space
    pub rotate_handle: (f64, f64),
}

impl GizmoFrame {
    /// Canvas position of a handle.
    pub fn handle_position(&self, handle: GizmoHandle) -> (f64, f64) {
        match handle {
            GizmoHandle::Corner(corner) => self.corners[corner.index()],
            GizmoHandle::Rotate => self.rotate_handle,
        }
    }
}

/// Arena-backed render tree.
#[derive(Debug, Clone)]
pub struct SceneTree {
    nodes: HashMap<NodeId, SceneNode>,
    root: NodeId,
    next_id: u64,
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneTree {
    /// A tree holding only the root group.
    pub fn new() -> Self {
        let root = NodeId(0);
        let mut nodes = HashMap::new();
        nodes.insert(root, SceneNode::group(Role::Root));
        Self {
            nodes,
            root,
            next_id: 1,
        }
    }

    /// The root group.
    pub fn root(&self) -> NodeId {
        self.root
    }

    /// Number of live nodes, root included.
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether only the root is left.
    pub fn is_empty(&self) -> bool {
        self.nodes.len() <= 1
    }

    /// Looks up a node.
    pub fn get(&self, id: NodeId) -> Option<&SceneNode> {
        self.nodes.get(&id)
    }

    /// Looks up a node mutably.
    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut SceneNode> {
        self.nodes.get_mut(&id)
    }

    /// Children of `id`, back to front.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.nodes.get(&id).map(|n| n.children.as_slice()).unwrap_or(&[])
    }

    /// Appends `node` as the front-most child of `parent`.
    ///
    /// Returns `None` when `parent` does not exist.
    pub fn add(&mut self, parent: NodeId, mut node: SceneNode) -> Option<NodeId> {
        if !self.nodes.contains_key(&parent) {
            return None;
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        node.parent = Some(parent);
        node.children.clear();
        self.nodes.insert(id, node);
        if let Some(p) = self.nodes.get_mut(&parent) {
            p.children.push(id);
        }
        Some(id)
    }

    /// Removes `id` and its whole subtree. The root cannot be removed.
    pub fn remove(&mut self, id: NodeId) -> bool {
        if id == self.root {
            return false;
        }
        let Some(node) = self.nodes.get(&id) else {
            return false;
        };
        if let Some(parent) = node.parent.and_then(|p| self.nodes.get_mut(&p)) {
            parent.children.retain(|c| *c != id);
        }
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            if let Some(node) = self.nodes.remove(&next) {
                stack.extend(node.children);
            }
        }
        true
    }

    /// Removes every descendant of `id`, keeping `id` itself.
    pub fn clear_children(&mut self, id: NodeId) {
        let children: Vec<NodeId> = self.children(id).to_vec();
        for child in children {
            self.remove(child);
        }
    }

    /// First node (in arena order) with `role`.
    pub fn find_role(&self, role: Role) -> Option<NodeId> {
        self.walk_all().into_iter().find(|id| self.nodes[id].role == role)
    }

    /// Counts nodes matching `pred`.
    pub fn count(&self, pred: impl Fn(&SceneNode) -> bool) -> usize {
        self.nodes.values().filter(|n| pred(n)).count()
    }

    /// Every node id in z-order (depth-first, back to front).
    pub fn walk_all(&self) -> Vec<NodeId> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack = vec![self.root];
        while let Some(id) = stack.pop() {
            out.push(id);
            if let Some(node) = self.nodes.get(&id) {
                stack.extend(node.children.iter().rev().copied());
            }
        }
        out
    }

    /// Local → canvas transform of `id`.
    pub fn world_transform(&self, id: NodeId) -> Affine {
        let mut chain = Vec::new();
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let Some(node) = self.nodes.get(&current) else {
                break;
            };
            chain.push(node.transform.to_affine());
            cursor = node.parent;
        }
        chain
            .iter()
            .rev()
            .fold(Affine::IDENTITY, |acc, local| acc.then_after(local))
    }

    /// Visible nodes in z-order with their accumulated transform and opacity.
    pub fn draw_list(&self) -> Vec<DrawItem<'_>> {
        let mut out = Vec::new();
        self.collect_draw(self.root, Affine::IDENTITY, 1.0, &mut out);
        out
    }

    fn collect_draw<'a>(
        &'a self,
        id: NodeId,
        parent_world: Affine,
        inherited_opacity: f64,
        out: &mut Vec<DrawItem<'a>>,
    ) {
        let Some(node) = self.nodes.get(&id) else {
            return;
        };
        if !node.visible {
            return;
        }
        let world = parent_world.then_after(&node.transform.to_affine());
        out.push(DrawItem {
            id,
            node,
            world,
            inherited_opacity,
        });
        if matches!(node.shape, Shape::Group) {
            let opacity = inherited_opacity * node.paint.opacity;
            for child in &node.children {
                self.collect_draw(*child, world, opacity, out);
            }
        }
    }

    /// Front-most visible, listening shape under canvas point `p`.
    pub fn hit_test(&self, p: (f64, f64)) -> Option<NodeId> {
        self.hit_node(self.root, Affine::IDENTITY, p)
    }

    fn hit_node(&self, id: NodeId, parent_world: Affine, p: (f64, f64)) -> Option<NodeId> {
        let node = self.nodes.get(&id)?;
        if !node.visible || !node.listening {
            return None;
        }
        let world = parent_world.then_after(&node.transform.to_affine());
        if matches!(node.shape, Shape::Group) {
            return node
                .children
                .iter()
                .rev()
                .find_map(|child| self.hit_node(*child, world, p));
        }
        let local = world.inverse()?.apply(p);
        shape_contains(&node.shape, &node.paint, local).then_some(id)
    }

    /// Nearest ancestor of `id` (inclusive) with `role`.
    pub fn ancestor_with_role(&self, id: NodeId, role: Role) -> Option<NodeId> {
        let mut cursor = Some(id);
        while let Some(current) = cursor {
            let node = self.nodes.get(&current)?;
            if node.role == role {
                return Some(current);
            }
            cursor = node.parent;
        }
        None
    }

    /// Bounds of `id`'s geometry (including descendants) in `id`'s local space.
    pub fn local_bounds(&self, id: NodeId) -> Option<Bounds> {
        let node = self.nodes.get(&id)?;
        match &node.shape {
            Shape::Group => node
                .children
                .iter()
                .filter_map(|child| {
                    let child_node = self.nodes.get(child)?;
                    let b = self.local_bounds(*child)?;
                    let m = child_node.transform.to_affine();
                    Bounds::from_points(b.corners().map(|c| m.apply(c)))
                })
                .reduce(|a, b| a.union(&b)),
            Shape::Rect {
                x,
                y,
                width,
                height,
            } => Some(Bounds {
                min_x: *x,
                min_y: *y,
                max_x: x + width,
                max_y: y + height,
            }),
            Shape::Circle { x, y, radius } => Some(Bounds {
                min_x: x - radius,
                min_y: y - radius,
                max_x: x + radius,
                max_y: y + radius,
            }),
            Shape::Line { points } => {
                Bounds::from_points([(points[0], points[1]), (points[2], points[3])])
                    .map(|b| b.padded(node.paint.stroke_width / 2.0))
            }
            Shape::Image { dest, .. } => Some(*dest),
            Shape::Gizmo { .. } => None,
        }
    }

    /// Canvas-space geometry of a gizmo, or `None` if its target is missing or empty.
    pub fn gizmo_frame(&self, gizmo: NodeId) -> Option<GizmoFrame> {
        let Shape::Gizmo { target } = self.nodes.get(&gizmo)?.shape else {
            return None;
        };
        let local = self.local_bounds(target)?.padded(constants::GIZMO_PADDING);
        let world = self.world_transform(target);
        let corners = local.corners().map(|c| world.apply(c));
        let top_mid = midpoint(corners[0], corners[1]);
        let bottom_mid = midpoint(corners[3], corners[2]);
        let (dx, dy) = (top_mid.0 - bottom_mid.0, top_mid.1 - bottom_mid.1);
        let len = (dx * dx + dy * dy).sqrt();
        let (ux, uy) = if len > f64::EPSILON {
            (dx / len, dy / len)
        } else {
            (0.0, -1.0)
        };
        let rotate_handle = (
            top_mid.0 + ux * constants::ROTATE_HANDLE_OFFSET,
            top_mid.1 + uy * constants::ROTATE_HANDLE_OFFSET,
        );
        Some(GizmoFrame {
            local,
            corners,
            rotate_handle,
        })
    }

    /// Handle of a visible gizmo under canvas point `p`.
    pub fn gizmo_handle_at(&self, gizmo: NodeId, p: (f64, f64)) -> Option<GizmoHandle> {
        let node = self.nodes.get(&gizmo)?;
        if !node.visible {
            return None;
        }
        let frame = self.gizmo_frame(gizmo)?;
        let reach = constants::HANDLE_SIZE;
        let near = |q: (f64, f64)| (q.0 - p.0).abs() <= reach && (q.1 - p.1).abs() <= reach;
        if near(frame.rotate_handle) {
            return Some(GizmoHandle::Rotate);
        }
        Corner::ALL
            .into_iter()
            .find(|corner| near(frame.corners[corner.index()]))
            .map(GizmoHandle::Corner)
    }

    /// Copies `src` and its descendants accepted by `keep` under `dst_parent` in `dst`.
    ///
    /// A rejected node is skipped together with its subtree. Returns the copy's id.
    pub fn deep_copy_into(
        &self,
        src: NodeId,
        dst: &mut SceneTree,
        dst_parent: NodeId,
        keep: &dyn Fn(&SceneNode) -> bool,
    ) -> Option<NodeId> {
        let node = self.nodes.get(&src)?;
        if !keep(node) {
            return None;
        }
        let copy = dst.add(dst_parent, node.clone())?;
        for child in &node.children {
            self.deep_copy_into(*child, dst, copy, keep);
        }
        Some(copy)
    }
}

fn midpoint(a: (f64, f64), b: (f64, f64)) -> (f64, f64) {
    ((a.0 + b.0) / 2.0, (a.1 + b.1) / 2.0)
}

/// Distance from `p` to the segment `a`–`b`.
pub fn distance_to_segment(p: (f64, f64), a: (f64, f64), b: (f64, f64)) -> f64 {
    let (dx, dy) = (b.0 - a.0, b.1 - a.1);
    let len_sq = dx * dx + dy * dy;
    let t = if len_sq > 0.0 {
        (((p.0 - a.0) * dx + (p.1 - a.1) * dy) / len_sq).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let (cx, cy) = (a.0 + t * dx, a.1 + t * dy);
    ((p.0 - cx).powi(2) + (p.1 - cy).powi(2)).sqrt()
}

fn shape_contains(shape: &Shape, paint: &Paint, p: (f64, f64)) -> bool {
    match shape {
        Shape::Group | Shape::Gizmo { .. } => false,
        Shape::Rect {
            x,
            y,
            width,
            height,
        } => p.0 >= *x && p.0 <= x + width && p.1 >= *y && p.1 <= y + height,
        Shape::Circle { x, y, radius } => {
            let r = radius + paint.stroke_width / 2.0;
            (p.0 - x).powi(2) + (p.1 - y).powi(2) <= r * r
        }
        Shape::Line { points } => {
            distance_to_segment(p, (points[0], points[1]), (points[2], points[3]))
                <= paint.stroke_width / 2.0
        }
        Shape::Image { dest, .. } => dest.contains(p),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn circle(x: f64, y: f64, radius: f64) -> Shape {
        Shape::Circle { x, y, radius }
    }

    #[test]
    fn add_and_remove_subtree() {
        let mut tree = SceneTree::new();
        let group = tree.add(tree.root(), SceneNode::group(Role::StarGroup)).unwrap();
        let a = tree.add(group, SceneNode::new(Role::Backdrop, circle(0.0, 0.0, 1.0))).unwrap();
        tree.add(group, SceneNode::new(Role::Backdrop, circle(5.0, 0.0, 1.0)));
        assert_eq!(tree.len(), 4);
        assert_eq!(tree.children(group).len(), 2);

        assert!(tree.remove(a));
        assert_eq!(tree.children(group).len(), 1);
        assert!(tree.remove(group));
        assert!(tree.is_empty());
        assert!(tree.children(tree.root()).is_empty());
        assert!(!tree.remove(tree.root()));
    }

    #[test]
    fn hit_test_respects_listening_and_order() {
        let mut tree = SceneTree::new();
        let back = tree
            .add(tree.root(), SceneNode::new(Role::Backdrop, circle(10.0, 10.0, 5.0)).listening(true))
            .unwrap();
        let front = tree
            .add(tree.root(), SceneNode::new(Role::Backdrop, circle(12.0, 10.0, 5.0)).listening(true))
            .unwrap();
        tree.add(tree.root(), SceneNode::new(Role::Backdrop, circle(10.0, 10.0, 50.0)));

        assert_eq!(tree.hit_test((11.0, 10.0)), Some(front));
        assert_eq!(tree.hit_test((6.0, 10.0)), Some(back));
        assert_eq!(tree.hit_test((40.0, 40.0)), None);

        tree.get_mut(front).unwrap().visible = false;
        assert_eq!(tree.hit_test((11.0, 10.0)), Some(back));
    }

    #[test]
    fn hit_test_follows_group_transform() {
        let mut tree = SceneTree::new();
        let group = tree.add(tree.root(), SceneNode::group(Role::StarGroup)).unwrap();
        let dot = tree
            .add(group, SceneNode::new(Role::Backdrop, circle(0.0, 0.0, 2.0)).listening(true))
            .unwrap();
        tree.get_mut(group).unwrap().transform = GroupTransform::translation(100.0, 50.0);
        assert_eq!(tree.hit_test((101.0, 50.0)), Some(dot));
        assert_eq!(tree.hit_test((1.0, 0.0)), None);
        assert_eq!(tree.ancestor_with_role(dot, Role::StarGroup), Some(group));
    }

    #[test]
    fn line_hit_uses_stroke_width() {
        let mut tree = SceneTree::new();
        let line = tree
            .add(
                tree.root(),
                SceneNode::new(Role::Backdrop, Shape::Line { points: [0.0, 0.0, 100.0, 0.0] })
                    .with_paint(Paint {
                        stroke_width: 20.0,
                        ..Paint::default()
                    })
                    .listening(true),
            )
            .unwrap();
        assert_eq!(tree.hit_test((50.0, 9.0)), Some(line));
        assert_eq!(tree.hit_test((50.0, 11.0)), None);
    }

    #[test]
    fn gizmo_frame_tracks_target_transform() {
        let mut tree = SceneTree::new();
        let group = tree.add(tree.root(), SceneNode::group(Role::StarGroup)).unwrap();
        tree.add(group, SceneNode::new(Role::Backdrop, circle(10.0, 10.0, 2.0)));
        tree.add(group, SceneNode::new(Role::Backdrop, circle(50.0, 30.0, 2.0)));
        let gizmo = tree
            .add(tree.root(), SceneNode::new(Role::Gizmo, Shape::Gizmo { target: group }))
            .unwrap();

        let frame = tree.gizmo_frame(gizmo).unwrap();
        let pad = constants::GIZMO_PADDING;
        assert_eq!(frame.corners[0], (8.0 - pad, 8.0 - pad));
        assert_eq!(frame.corners[2], (52.0 + pad, 32.0 + pad));

        tree.get_mut(group).unwrap().transform = GroupTransform::translation(5.0, 5.0);
        let moved = tree.gizmo_frame(gizmo).unwrap();
        assert_eq!(moved.corners[0], (13.0 - pad, 13.0 - pad));
        assert_eq!(
            tree.gizmo_handle_at(gizmo, moved.corners[2]),
            Some(GizmoHandle::Corner(Corner::BottomRight))
        );
        assert_eq!(tree.gizmo_handle_at(gizmo, moved.rotate_handle), Some(GizmoHandle::Rotate));
    }

    #[test]
    fn deep_copy_filters_subtrees() {
        let mut tree = SceneTree::new();
        let group = tree.add(tree.root(), SceneNode::group(Role::LinesGroup)).unwrap();
        tree.add(group, SceneNode::new(Role::LineMain(LineId(0)), Shape::Line { points: [0.0; 4] }));
        tree.add(
            group,
            SceneNode::new(Role::LineHitTarget(LineId(0)), Shape::Line { points: [0.0; 4] }),
        );

        let mut other = SceneTree::new();
        let root = other.root();
        let copy = tree
            .deep_copy_into(group, &mut other, root, &|n| !n.role.is_hit_target())
            .unwrap();
        assert_eq!(other.children(copy).len(), 1);
        assert_eq!(other.count(|n| n.role.is_hit_target()), 0);
        assert_eq!(tree.count(|n| n.role.is_hit_target()), 1);
    }

    #[test]
    fn draw_list_skips_hidden_subtrees() {
        let mut tree = SceneTree::new();
        let group = tree.add(tree.root(), SceneNode::group(Role::StarGroup)).unwrap();
        tree.add(group, SceneNode::new(Role::Backdrop, circle(0.0, 0.0, 1.0)));
        assert_eq!(tree.draw_list().len(), 3);
        tree.get_mut(group).unwrap().visible = false;
        assert_eq!(tree.draw_list().len(), 1);
    }
}
