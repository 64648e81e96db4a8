//! Transform session: the drag/scale/rotate state machine for the star group.
//!
//! While a gesture is active the session only touches the render tree: the star group's
//! transform and the projected line geometry. The store is written once, at commit, with every
//! star's transformed position; the group transform then returns to identity so geometry never
//! accumulates on the group.

use crate::constants::MIN_GESTURE_SCALE;
use crate::mapper::GroupTransform;
use crate::reconciler::RenderReconciler;
use crate::scene::{Corner, GizmoFrame};
use crate::store::GeometryStore;
use crate::types::{LineId, StarId};
use std::collections::HashMap;

/// Which manipulation a gesture performs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GestureKind {
    /// Translate the whole group
    Drag,
    /// Non-uniform scale from a corner handle, anchored at the opposite corner
    Scale(Corner),
    /// Rotate around the frame center
    Rotate,
}

/// State of a gesture in progress.
#[derive(Debug, Clone)]
pub struct ActiveGesture {
    kind: GestureKind,
    start: (f64, f64),
    frame: Option<GizmoFrame>,
    transform: GroupTransform,
    line_origins: Vec<(LineId, [f64; 4])>,
}

impl ActiveGesture {
    /// The manipulation being performed.
    pub fn kind(&self) -> GestureKind {
        self.kind
    }

    /// Live transform accumulated so far.
    pub fn transform(&self) -> GroupTransform {
        self.transform
    }
}

/// Session state.
#[derive(Debug, Clone, Default)]
pub enum SessionState {
    /// No gesture
    #[default]
    Idle,
    /// A gesture is in progress
    Active(ActiveGesture),
}

/// The interaction state machine.
#[derive(Debug, Default)]
pub struct TransformSession {
    state: SessionState,
}

impl TransformSession {
    /// An idle session.
    pub fn new() -> Self {
        Self::default()
    }

    /// Current state.
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Whether a gesture is in progress.
    pub fn is_active(&self) -> bool {
        matches!(self.state, SessionState::Active(_))
    }

    /// Live transform, identity when idle.
    pub fn transform(&self) -> GroupTransform {
        match &self.state {
            SessionState::Active(gesture) => gesture.transform,
            SessionState::Idle => GroupTransform::IDENTITY,
        }
    }

    /// Starts a gesture at canvas point `start`, committing any gesture still in progress.
    ///
    /// Scale and rotate need the gizmo frame; without stars to frame they do not start.
    /// Returns whether a gesture is now active.
    pub fn begin(
        &mut self,
        kind: GestureKind,
        start: (f64, f64),
        store: &mut GeometryStore,
        reconciler: &mut RenderReconciler,
    ) -> bool {
        if self.is_active() {
            self.end(store, reconciler);
        }
        let frame = reconciler.gizmo_frame();
        if frame.is_none() && kind != GestureKind::Drag {
            return false;
        }
        let line_origins = store.lines().iter().map(|l| (l.id, l.points)).collect();
        log::debug!("gesture {kind:?} started");
        self.state = SessionState::Active(ActiveGesture {
            kind,
            start,
            frame,
            transform: GroupTransform::IDENTITY,
            line_origins,
        });
        true
    }

    /// Recomputes the live transform for pointer position `pos` and projects it onto the tree.
    pub fn update(&mut self, pos: (f64, f64), reconciler: &mut RenderReconciler) {
        let SessionState::Active(gesture) = &mut self.state else {
            return;
        };
        gesture.transform = gesture_transform(gesture, pos);
        reconciler.set_group_transform(gesture.transform);
        reconciler.project_lines(&gesture.transform, &gesture.line_origins);
    }

    /// Commits the gesture into the store and rebuilds the tree from it.
    ///
    /// Returns whether a gesture was active.
    pub fn end(&mut self, store: &mut GeometryStore, reconciler: &mut RenderReconciler) -> bool {
        let SessionState::Active(gesture) = std::mem::take(&mut self.state) else {
            return false;
        };
        let transform = gesture.transform;
        reconciler.set_group_transform(GroupTransform::IDENTITY);
        if transform.is_identity() {
            reconciler.rebuild_content(store);
            return true;
        }
        let m = transform.to_affine();
        let mapping: HashMap<StarId, (f64, f64)> =
            store.stars().map(|s| (s.id, m.apply(s.position))).collect();
        let moved = store.update_all_point_positions(&mapping);
        reconciler.sync(store);
        log::debug!("gesture {:?} committed for {moved} stars", gesture.kind);
        true
    }
}

fn gesture_transform(gesture: &ActiveGesture, pos: (f64, f64)) -> GroupTransform {
    let (dx, dy) = (pos.0 - gesture.start.0, pos.1 - gesture.start.1);
    let Some(frame) = &gesture.frame else {
        return GroupTransform::translation(dx, dy);
    };
    match gesture.kind {
        GestureKind::Drag => GroupTransform::translation(dx, dy),
        GestureKind::Scale(corner) => {
            let anchor = frame.corners[corner.opposite().index()];
            let handle = frame.corners[corner.index()];
            let factor = |from: f64, to: f64, anchor: f64| {
                let span = from - anchor;
                if span.abs() < f64::EPSILON {
                    1.0
                } else {
                    ((to - anchor) / span).max(MIN_GESTURE_SCALE)
                }
            };
            let sx = factor(handle.0, handle.0 + dx, anchor.0);
            let sy = factor(handle.1, handle.1 + dy, anchor.1);
            GroupTransform::scale_about(anchor, sx, sy)
        }
        GestureKind::Rotate => {
            let c0 = frame.corners[Corner::TopLeft.index()];
            let c2 = frame.corners[Corner::BottomRight.index()];
            let center = ((c0.0 + c2.0) / 2.0, (c0.1 + c2.1) / 2.0);
            let angle = |p: (f64, f64)| (p.1 - center.1).atan2(p.0 - center.0);
            GroupTransform::rotation_about(center, angle(pos) - angle(gesture.start))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const SCENE: &str = r#"{"points":[{"id":1,"x":100,"y":100},{"id":2,"x":300,"y":200},{"id":3,"x":200,"y":400}],
        "connections":[[1,2],[2,3],[3,1]]}"#;

    fn setup() -> (GeometryStore, RenderReconciler, TransformSession) {
        let mut store = GeometryStore::default();
        store.import_json(SCENE).unwrap();
        let mut reconciler = RenderReconciler::new();
        reconciler.mount(&mut store);
        (store, reconciler, TransformSession::new())
    }

    fn positions(store: &GeometryStore) -> Vec<(f64, f64)> {
        store.stars().map(|s| s.position).collect()
    }

    fn assert_lines_match_points(store: &GeometryStore, reconciler: &RenderReconciler) {
        for line in store.lines() {
            let a = store.star(&line.from).unwrap().position;
            let b = store.star(&line.to).unwrap().position;
            assert_relative_eq!(line.points[0], a.0, epsilon = 1e-9);
            assert_relative_eq!(line.points[1], a.1, epsilon = 1e-9);
            assert_relative_eq!(line.points[2], b.0, epsilon = 1e-9);
            assert_relative_eq!(line.points[3], b.1, epsilon = 1e-9);
        }
        for ((_, rendered), line) in reconciler.rendered_segments().iter().zip(store.lines()) {
            assert_eq!(*rendered, line.points);
        }
    }

    #[test]
    fn drag_translates_every_star_exactly() {
        let (mut store, mut r, mut session) = setup();
        let before = positions(&store);
        assert!(session.begin(GestureKind::Drag, (150.0, 150.0), &mut store, &mut r));
        session.update((155.0, 160.0), &mut r);
        session.update((160.0, 170.0), &mut r);
        // Store untouched while active.
        assert_eq!(positions(&store), before);
        assert!(session.end(&mut store, &mut r));

        for (old, new) in before.iter().zip(positions(&store)) {
            assert_eq!(new, (old.0 + 10.0, old.1 + 20.0));
        }
        assert!(r.group_transform().is_identity());
        assert!(!session.is_active());
        assert_lines_match_points(&store, &r);
    }

    #[test]
    fn projection_tracks_live_transform() {
        let (mut store, mut r, mut session) = setup();
        session.begin(GestureKind::Drag, (0.0, 0.0), &mut store, &mut r);
        session.update((5.0, -5.0), &mut r);
        let live = r.rendered_segments();
        for ((_, seg), line) in live.iter().zip(store.lines()) {
            assert_relative_eq!(seg[0], line.points[0] + 5.0);
            assert_relative_eq!(seg[1], line.points[1] - 5.0);
        }
        assert_eq!(r.group_transform(), GroupTransform::translation(5.0, -5.0));
    }

    #[test]
    fn scale_keeps_opposite_corner_fixed() {
        let (mut store, mut r, mut session) = setup();
        let frame = r.gizmo_frame().unwrap();
        let anchor = frame.corners[Corner::TopLeft.index()];
        let handle = frame.corners[Corner::BottomRight.index()];
        let width = handle.0 - anchor.0;
        let height = handle.1 - anchor.1;

        session.begin(GestureKind::Scale(Corner::BottomRight), handle, &mut store, &mut r);
        session.update((handle.0 + width, handle.1), &mut r);
        let t = session.transform();
        assert_relative_eq!(t.scale_x, 2.0, epsilon = 1e-9);
        assert_relative_eq!(t.scale_y, 1.0, epsilon = 1e-9);
        let fixed = t.apply(anchor);
        assert_relative_eq!(fixed.0, anchor.0, epsilon = 1e-9);
        assert_relative_eq!(fixed.1, anchor.1, epsilon = 1e-9);

        // Collapsing past the anchor clamps instead of flipping.
        session.update((anchor.0 - 50.0, handle.1 - height * 2.0), &mut r);
        assert_relative_eq!(session.transform().scale_x, MIN_GESTURE_SCALE);
        assert_relative_eq!(session.transform().scale_y, MIN_GESTURE_SCALE);

        session.update((handle.0 + width, handle.1), &mut r);
        session.end(&mut store, &mut r);
        assert!(r.group_transform().is_identity());
        assert_lines_match_points(&store, &r);
    }

    #[test]
    fn rotate_quarter_turn_about_center() {
        let (mut store, mut r, mut session) = setup();
        let frame = r.gizmo_frame().unwrap();
        let c0 = frame.corners[0];
        let c2 = frame.corners[2];
        let center = ((c0.0 + c2.0) / 2.0, (c0.1 + c2.1) / 2.0);
        let before = positions(&store);

        let start = (center.0 + 100.0, center.1);
        session.begin(GestureKind::Rotate, start, &mut store, &mut r);
        session.update((center.0, center.1 + 100.0), &mut r);
        session.end(&mut store, &mut r);

        for (old, new) in before.iter().zip(positions(&store)) {
            let (rx, ry) = (old.0 - center.0, old.1 - center.1);
            assert_relative_eq!(new.0, center.0 - ry, epsilon = 1e-9);
            assert_relative_eq!(new.1, center.1 + rx, epsilon = 1e-9);
        }
        assert!(r.group_transform().is_identity());
        assert_lines_match_points(&store, &r);
    }

    #[test]
    fn new_gesture_commits_the_previous_one() {
        let (mut store, mut r, mut session) = setup();
        let before = positions(&store);
        session.begin(GestureKind::Drag, (0.0, 0.0), &mut store, &mut r);
        session.update((3.0, 4.0), &mut r);
        session.begin(GestureKind::Drag, (0.0, 0.0), &mut store, &mut r);
        assert!(session.is_active());
        assert!(session.transform().is_identity());
        for (old, new) in before.iter().zip(positions(&store)) {
            assert_eq!(new, (old.0 + 3.0, old.1 + 4.0));
        }
    }

    #[test]
    fn repeated_gestures_do_not_drift() {
        let (mut store, mut r, mut session) = setup();
        let before = positions(&store);
        for _ in 0..10 {
            session.begin(GestureKind::Drag, (0.0, 0.0), &mut store, &mut r);
            session.update((1.0, 2.0), &mut r);
            session.end(&mut store, &mut r);
            assert!(r.group_transform().is_identity());
        }
        for (old, new) in before.iter().zip(positions(&store)) {
            assert_relative_eq!(new.0, old.0 + 10.0, epsilon = 1e-9);
            assert_relative_eq!(new.1, old.1 + 20.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn click_without_motion_changes_nothing() {
        let (mut store, mut r, mut session) = setup();
        let before = positions(&store);
        session.begin(GestureKind::Drag, (10.0, 10.0), &mut store, &mut r);
        assert!(session.end(&mut store, &mut r));
        assert_eq!(positions(&store), before);
        assert!(!session.end(&mut store, &mut r));
    }

    #[test]
    fn scale_needs_stars() {
        let mut store = GeometryStore::default();
        let mut r = RenderReconciler::new();
        r.mount(&mut store);
        let mut session = TransformSession::new();
        assert!(!session.begin(GestureKind::Rotate, (0.0, 0.0), &mut store, &mut r));
        assert!(session.begin(GestureKind::Drag, (0.0, 0.0), &mut store, &mut r));
    }
}
