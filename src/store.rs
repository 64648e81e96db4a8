//! Geometry store: the single owner of canonical editor state.
//!
//! Holds the canvas and background configuration, the star arena, the connection list, the
//! derived lines, the global style defaults and the selection. Every mutation is synchronous
//! and either applies completely or not at all. Mutations record which parts of the render
//! tree went stale in a [`Changes`] set that the render reconciler drains.

use crate::error::{ConfigError, ImportError, ImportSection, ValidationError, ValidationKind};
use crate::mapper;
use crate::style::StyleDefaults;
use crate::types::*;
use indexmap::IndexMap;
use serde_json::{Map, Value};
use std::collections::HashMap;

/// Which parts of the render tree are stale after store mutations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Changes {
    /// Background configuration or base color changed
    pub background: bool,
    /// Canvas dimensions changed
    pub dimensions: bool,
    /// Stars, lines or their styles changed
    pub content: bool,
}

impl Changes {
    /// Whether anything is stale.
    pub fn any(&self) -> bool {
        self.background || self.dimensions || self.content
    }
}

/// Counts reported after a successful import.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImportSummary {
    /// Number of imported stars
    pub stars: usize,
    /// Number of imported connections
    pub connections: usize,
    /// Number of generated lines
    pub lines: usize,
}

/// A validated point, waiting for the whole payload to pass.
struct StagedStar {
    original_id: OriginalId,
    position: (f64, f64),
    overrides: StarStylePatch,
}

/// Canonical editor state.
#[derive(Debug, Clone)]
pub struct GeometryStore {
    canvas: CanvasConfig,
    background: BackgroundConfig,
    background_natural_size: Option<(u32, u32)>,
    stars: IndexMap<StarId, Star>,
    connections: Vec<Connection>,
    lines: Vec<Line>,
    star_style: StarStyle,
    line_style: LineStyle,
    defaults: StyleDefaults,
    selection: Option<StarId>,
    changes: Changes,
}

impl Default for GeometryStore {
    fn default() -> Self {
        Self::new(StyleDefaults::default())
    }
}

impl GeometryStore {
    /// Creates an empty store seeded from `defaults`.
    pub fn new(defaults: StyleDefaults) -> Self {
        let mut canvas = CanvasConfig::default();
        let (width, height) = mapper::compute_dimensions(&canvas);
        canvas.width = width;
        canvas.height = height;
        Self {
            canvas,
            background: BackgroundConfig::Grid,
            background_natural_size: None,
            stars: IndexMap::new(),
            connections: Vec::new(),
            lines: Vec::new(),
            star_style: defaults.star.clone(),
            line_style: defaults.line.clone(),
            defaults,
            selection: None,
            changes: Changes {
                background: true,
                dimensions: true,
                content: true,
            },
        }
    }

    // ----- read access -----

    /// Current canvas configuration.
    pub fn canvas(&self) -> &CanvasConfig {
        &self.canvas
    }

    /// Current `(width, height)` in pixels.
    pub fn dimensions(&self) -> (u32, u32) {
        (self.canvas.width, self.canvas.height)
    }

    /// Current background configuration.
    pub fn background(&self) -> &BackgroundConfig {
        &self.background
    }

    /// Natural size of the applied background image, if one has loaded.
    pub fn background_natural_size(&self) -> Option<(u32, u32)> {
        self.background_natural_size
    }

    /// Stars in import order.
    pub fn stars(&self) -> impl Iterator<Item = &Star> {
        self.stars.values()
    }

    /// Number of stars.
    pub fn star_count(&self) -> usize {
        self.stars.len()
    }

    /// Looks up a star.
    pub fn star(&self, id: &StarId) -> Option<&Star> {
        self.stars.get(id)
    }

    /// Connections as imported.
    pub fn connections(&self) -> &[Connection] {
        &self.connections
    }

    /// Derived lines in connection order.
    pub fn lines(&self) -> &[Line] {
        &self.lines
    }

    /// Global star style default.
    pub fn star_style(&self) -> &StarStyle {
        &self.star_style
    }

    /// Global line style default.
    pub fn line_style(&self) -> &LineStyle {
        &self.line_style
    }

    /// Static baseline the global defaults were seeded from.
    pub fn style_defaults(&self) -> &StyleDefaults {
        &self.defaults
    }

    /// Selected star, if any.
    pub fn selection(&self) -> Option<StarId> {
        self.selection
    }

    /// Returns and resets the pending change set.
    pub fn take_changes(&mut self) -> Changes {
        std::mem::take(&mut self.changes)
    }

    /// Pending change set without resetting it.
    pub fn pending_changes(&self) -> Changes {
        self.changes
    }

    // ----- canvas & background -----

    /// Shallow-merges `patch` into the canvas configuration and re-derives the dimensions.
    pub fn set_canvas_config(&mut self, patch: CanvasConfigPatch) {
        let before = self.canvas.clone();
        if let Some(ratio) = patch.aspect_ratio {
            self.canvas.aspect_ratio = ratio;
            if ratio == AspectRatio::Auto && patch.width.is_none() && patch.height.is_none() {
                if let Some((w, h)) = self.background_natural_size {
                    self.canvas.width = w;
                    self.canvas.height = h;
                }
            }
        }
        if let Some(width) = patch.width {
            self.canvas.width = width.max(1);
        }
        if let Some(height) = patch.height {
            self.canvas.height = height.max(1);
        }
        if let Some(color) = patch.background_color {
            self.canvas.background_color = color;
        }
        let (width, height) = mapper::compute_dimensions(&self.canvas);
        self.canvas.width = width;
        self.canvas.height = height;

        if (before.width, before.height) != (width, height) {
            log::debug!("canvas resized to {width}x{height}");
            self.changes.dimensions = true;
        }
        if before.background_color != self.canvas.background_color {
            self.changes.background = true;
        }
    }

    /// Sets the aspect ratio from its wire name; an unknown name leaves the config untouched.
    pub fn set_aspect_ratio_name(&mut self, name: &str) -> Result<(), ConfigError> {
        let ratio = name.parse::<AspectRatio>().inspect_err(|err| log::warn!("{err}"))?;
        self.set_canvas_config(CanvasConfigPatch {
            aspect_ratio: Some(ratio),
            ..Default::default()
        });
        Ok(())
    }

    /// Shallow-merges `patch` into the background configuration.
    ///
    /// Switching the variant drops the previous variant's payload. A missing payload for the
    /// new variant is empty for images and the canvas base color for colors.
    pub fn set_background(&mut self, patch: BackgroundPatch) {
        let kind = patch.kind.unwrap_or_else(|| self.background.kind());
        let next = match kind {
            BackgroundKind::Grid => BackgroundConfig::Grid,
            BackgroundKind::Image => {
                let url = match (patch.image_url, &self.background) {
                    (Some(url), _) => url,
                    (None, BackgroundConfig::Image { url }) => url.clone(),
                    (None, _) => String::new(),
                };
                BackgroundConfig::Image { url }
            }
            BackgroundKind::Color => {
                let color = match (patch.color, &self.background) {
                    (Some(color), _) => color,
                    (None, BackgroundConfig::Color { color }) => color.clone(),
                    (None, _) => self.canvas.background_color.clone(),
                };
                BackgroundConfig::Color { color }
            }
        };
        if next == self.background {
            return;
        }
        if next.image_url() != self.background.image_url() {
            self.background_natural_size = None;
        }
        log::info!("background switched to {}", next.kind());
        self.background = next;
        self.changes.background = true;
    }

    /// Switches the background variant from its wire name; an unknown name is ignored.
    pub fn set_background_kind_name(&mut self, name: &str) -> Result<(), ConfigError> {
        let kind = name.parse::<BackgroundKind>().inspect_err(|err| log::warn!("{err}"))?;
        self.set_background(BackgroundPatch {
            kind: Some(kind),
            ..Default::default()
        });
        Ok(())
    }

    /// Records the natural size of a freshly decoded background image.
    ///
    /// Ignored unless `url` is still the active image. Under [`AspectRatio::Auto`] the canvas
    /// adopts the size.
    pub fn set_background_natural_size(&mut self, url: &str, size: (u32, u32)) -> bool {
        if self.background.image_url() != Some(url) {
            return false;
        }
        self.background_natural_size = Some(size);
        self.changes.background = true;
        if self.canvas.aspect_ratio == AspectRatio::Auto {
            self.set_canvas_config(CanvasConfigPatch {
                width: Some(size.0),
                height: Some(size.1),
                ..Default::default()
            });
        }
        true
    }

    // ----- import -----

    /// Parses and imports a `{ "points": [...], "connections": [...] }` document.
    pub fn import_json(&mut self, text: &str) -> Result<ImportSummary, ImportError> {
        let root: Value = serde_json::from_str(text)?;
        let Some(obj) = root.as_object() else {
            return Err(ValidationError::new(
                ValidationKind::TypeMismatch("payload"),
                ImportSection::Points,
                0,
            )
            .into());
        };
        let points = match obj.get("points") {
            Some(Value::Array(points)) => points.as_slice(),
            Some(_) => {
                return Err(ValidationError::new(
                    ValidationKind::TypeMismatch("points"),
                    ImportSection::Points,
                    0,
                )
                .into())
            }
            None => {
                return Err(ValidationError::new(
                    ValidationKind::MissingField("points"),
                    ImportSection::Points,
                    0,
                )
                .into())
            }
        };
        let connections = match obj.get("connections") {
            Some(Value::Array(connections)) => connections.as_slice(),
            Some(Value::Null) | None => &[],
            Some(_) => {
                return Err(ValidationError::new(
                    ValidationKind::TypeMismatch("connections"),
                    ImportSection::Connections,
                    0,
                )
                .into())
            }
        };
        Ok(self.import_scene(points, connections)?)
    }

    /// Validates and imports points and connections, replacing the current scene.
    ///
    /// On the first violation the whole import is rejected and the store is left untouched.
    pub fn import_scene(
        &mut self,
        points: &[Value],
        connections: &[Value],
    ) -> Result<ImportSummary, ValidationError> {
        let staged = points
            .iter()
            .enumerate()
            .map(|(index, value)| stage_point(value, index))
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|err| log::warn!("import rejected: {err}"))?;

        let known: std::collections::HashSet<OriginalId> =
            staged.iter().map(|s| s.original_id).collect();
        let parsed_connections = connections
            .iter()
            .enumerate()
            .map(|(index, value)| stage_connection(value, index, &known))
            .collect::<Result<Vec<_>, _>>()
            .inspect_err(|err| log::warn!("import rejected: {err}"))?;

        // Validation passed; nothing below can fail.
        let raw_positions: Vec<(f64, f64)> = staged.iter().map(|s| s.position).collect();
        let positions = mapper::relative_to_absolute(&raw_positions, self.dimensions());

        self.stars = staged
            .into_iter()
            .zip(positions)
            .map(|(staged, position)| {
                let mut style = self.star_style.clone();
                style.apply(&staged.overrides);
                let star = Star::new(staged.original_id, position, style);
                (star.id, star)
            })
            .collect();
        self.connections = parsed_connections;
        self.selection = None;
        self.regenerate_lines();

        let summary = ImportSummary {
            stars: self.stars.len(),
            connections: self.connections.len(),
            lines: self.lines.len(),
        };
        log::info!(
            "imported {} stars, {} connections",
            summary.stars,
            summary.connections
        );
        Ok(summary)
    }

    // ----- geometry -----

    /// Moves a single star. Returns `false` if the id is unknown.
    pub fn update_point_position(&mut self, id: StarId, x: f64, y: f64) -> bool {
        let Some(star) = self.stars.get_mut(&id) else {
            return false;
        };
        star.position = (x, y);
        self.regenerate_lines();
        true
    }

    /// Moves many stars at once with a single line regeneration. Returns how many moved.
    pub fn update_all_point_positions(&mut self, mapping: &HashMap<StarId, (f64, f64)>) -> usize {
        let mut moved = 0;
        for (id, position) in mapping {
            if let Some(star) = self.stars.get_mut(id) {
                star.position = *position;
                moved += 1;
            }
        }
        if moved > 0 {
            self.regenerate_lines();
        }
        moved
    }

    // ----- styles -----

    /// Merges `patch` into the star default and writes every set field onto every star.
    pub fn set_star_style(&mut self, patch: StarStylePatch) {
        if patch.is_empty() {
            return;
        }
        self.star_style.apply(&patch);
        for star in self.stars.values_mut() {
            star.style.apply(&patch);
        }
        self.changes.content = true;
    }

    /// Merges `patch` into the line default and writes every set field onto every line.
    pub fn set_line_style(&mut self, patch: LineStylePatch) {
        self.line_style.apply(&patch);
        for line in &mut self.lines {
            line.style.apply(&patch);
        }
        self.changes.content = true;
    }

    /// Re-applies the static baseline to both defaults and every entity.
    pub fn reset_styles(&mut self) {
        let star = StarStylePatch::full(&self.defaults.star);
        let line = LineStylePatch::full(&self.defaults.line);
        self.set_star_style(star);
        self.set_line_style(line);
    }

    // ----- lifecycle -----

    /// Empties the scene and resets the background to the grid; dimensions are kept.
    pub fn clear(&mut self) {
        self.stars.clear();
        self.connections.clear();
        self.lines.clear();
        self.selection = None;
        if self.background != BackgroundConfig::Grid {
            self.background = BackgroundConfig::Grid;
            self.changes.background = true;
        }
        self.background_natural_size = None;
        self.changes.content = true;
        log::info!("canvas cleared");
    }

    /// Selects a star, or clears the selection with `None`. Unknown ids are ignored.
    pub fn set_selection(&mut self, id: Option<StarId>) -> bool {
        match id {
            Some(id) if !self.stars.contains_key(&id) => false,
            other => {
                self.selection = other;
                true
            }
        }
    }

    /// Rebuilds every line from the connections and the stars' current positions.
    fn regenerate_lines(&mut self) {
        let mut by_original: HashMap<OriginalId, &Star> = HashMap::with_capacity(self.stars.len());
        for star in self.stars.values() {
            by_original.entry(star.original_id).or_insert(star);
        }
        self.lines = self
            .connections
            .iter()
            .enumerate()
            .filter_map(|(index, conn)| {
                let a = by_original.get(&conn.a)?;
                let b = by_original.get(&conn.b)?;
                Some(Line {
                    id: LineId(index),
                    from: a.id,
                    to: b.id,
                    points: [a.position.0, a.position.1, b.position.0, b.position.1],
                    style: self.line_style.clone(),
                })
            })
            .collect();
        self.changes.content = true;
    }
}

fn stage_point(value: &Value, index: usize) -> Result<StagedStar, ValidationError> {
    let fail = |kind| ValidationError::new(kind, ImportSection::Points, index);
    let obj = value
        .as_object()
        .ok_or_else(|| fail(ValidationKind::TypeMismatch("point")))?;
    let id = required_number(obj, "id").map_err(fail)?;
    let x = required_number(obj, "x").map_err(fail)?;
    let y = required_number(obj, "y").map_err(fail)?;
    let overrides = read_style_overrides(obj).map_err(fail)?;
    Ok(StagedStar {
        original_id: OriginalId::new(id),
        position: (x, y),
        overrides,
    })
}

fn stage_connection(
    value: &Value,
    index: usize,
    known: &std::collections::HashSet<OriginalId>,
) -> Result<Connection, ValidationError> {
    let fail = |kind| ValidationError::new(kind, ImportSection::Connections, index);
    let pair = value
        .as_array()
        .filter(|pair| pair.len() <= 2)
        .ok_or_else(|| fail(ValidationKind::TypeMismatch("connection")))?;
    let mut ends = [OriginalId::new(0.0); 2];
    for (slot, end) in ends.iter_mut().enumerate() {
        let raw = pair
            .get(slot)
            .ok_or_else(|| fail(ValidationKind::MissingField("endpoint")))?;
        *end = raw
            .as_f64()
            .map(OriginalId::new)
            .ok_or_else(|| fail(ValidationKind::TypeMismatch("endpoint")))?;
    }
    if let Some(missing) = ends.iter().find(|id| !known.contains(id)) {
        return Err(fail(ValidationKind::DanglingReference(missing.value())));
    }
    Ok(Connection::new(ends[0], ends[1]))
}

fn required_number(obj: &Map<String, Value>, field: &'static str) -> Result<f64, ValidationKind> {
    match obj.get(field) {
        None | Some(Value::Null) => Err(ValidationKind::MissingField(field)),
        Some(v) => v.as_f64().ok_or(ValidationKind::TypeMismatch(field)),
    }
}

fn optional_number(obj: &Map<String, Value>, field: &'static str) -> Result<Option<f64>, ValidationKind> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(v) => v.as_f64().map(Some).ok_or(ValidationKind::TypeMismatch(field)),
    }
}

fn optional_string(
    obj: &Map<String, Value>,
    field: &'static str,
) -> Result<Option<String>, ValidationKind> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(_) => Err(ValidationKind::TypeMismatch(field)),
    }
}

fn optional_bool(obj: &Map<String, Value>, field: &'static str) -> Result<Option<bool>, ValidationKind> {
    match obj.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::Bool(b)) => Ok(Some(*b)),
        Some(_) => Err(ValidationKind::TypeMismatch(field)),
    }
}

/// Reads per-star style fields, accepting both a nested `shadow` object and flat keys.
fn read_style_overrides(obj: &Map<String, Value>) -> Result<StarStylePatch, ValidationKind> {
    let mut shadow = ShadowPatch {
        enabled: optional_bool(obj, "shadowEnabled")?,
        color: optional_string(obj, "shadowColor")?,
        blur: optional_number(obj, "shadowBlur")?,
        offset_x: optional_number(obj, "shadowOffsetX")?,
        offset_y: optional_number(obj, "shadowOffsetY")?,
    };
    match obj.get("shadow") {
        None | Some(Value::Null) => {}
        Some(Value::Object(nested)) => {
            shadow.enabled = optional_bool(nested, "enabled")
                .map_err(|_| ValidationKind::TypeMismatch("shadow.enabled"))?
                .or(shadow.enabled);
            shadow.color = optional_string(nested, "color")
                .map_err(|_| ValidationKind::TypeMismatch("shadow.color"))?
                .or(shadow.color);
            shadow.blur = optional_number(nested, "blur")
                .map_err(|_| ValidationKind::TypeMismatch("shadow.blur"))?
                .or(shadow.blur);
            shadow.offset_x = optional_number(nested, "offsetX")
                .map_err(|_| ValidationKind::TypeMismatch("shadow.offsetX"))?
                .or(shadow.offset_x);
            shadow.offset_y = optional_number(nested, "offsetY")
                .map_err(|_| ValidationKind::TypeMismatch("shadow.offsetY"))?
                .or(shadow.offset_y);
        }
        Some(_) => return Err(ValidationKind::TypeMismatch("shadow")),
    }
    Ok(StarStylePatch {
        radius: optional_number(obj, "radius")?,
        fill: optional_string(obj, "fill")?,
        stroke: optional_string(obj, "stroke")?,
        stroke_width: optional_number(obj, "strokeWidth")?,
        shadow,
        opacity: optional_number(obj, "opacity")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use serde_json::json;

    const SCENARIO: &str = r#"{
        "points": [{"id": 1, "x": 0.1, "y": 0.1}, {"id": 2, "x": 0.9, "y": 0.9}],
        "connections": [[1, 2]]
    }"#;

    fn store() -> GeometryStore {
        let mut store = GeometryStore::new(StyleDefaults::builtin());
        store.take_changes();
        store
    }

    fn position_of(store: &GeometryStore, original: f64) -> (f64, f64) {
        store
            .stars()
            .find(|s| s.original_id == OriginalId::new(original))
            .map(|s| s.position)
            .unwrap()
    }

    #[test]
    fn default_canvas_is_portrait_916() {
        let store = store();
        assert_eq!(store.dimensions(), (400, 711));
        assert_eq!(store.background(), &BackgroundConfig::Grid);
    }

    #[test]
    fn scenario_import_places_fractional_points() {
        let mut store = store();
        let summary = store.import_json(SCENARIO).unwrap();
        assert_eq!(summary, ImportSummary { stars: 2, connections: 1, lines: 1 });

        let p1 = position_of(&store, 1.0);
        let p2 = position_of(&store, 2.0);
        assert_relative_eq!(p1.0, 40.0);
        assert_relative_eq!(p1.1, 71.1, epsilon = 1e-9);
        assert_relative_eq!(p2.0, 360.0);
        assert_relative_eq!(p2.1, 639.9, epsilon = 1e-9);

        let line = &store.lines()[0];
        assert_eq!(line.points, [p1.0, p1.1, p2.0, p2.1]);
        assert!(store.take_changes().content);
    }

    #[test]
    fn dangling_connection_rejects_whole_import() {
        let mut store = store();
        store.import_json(SCENARIO).unwrap();
        let before: Vec<Star> = store.stars().cloned().collect();

        let err = store
            .import_json(r#"{"points":[{"id":1,"x":5,"y":5},{"id":2,"x":6,"y":6}],"connections":[[1,3]]}"#)
            .unwrap_err();
        match err {
            ImportError::Validation(v) => {
                assert_eq!(v.section, ImportSection::Connections);
                assert_eq!(v.index, 0);
                assert_eq!(v.kind, ValidationKind::DanglingReference(3.0));
            }
            other => panic!("unexpected error: {other}"),
        }
        let after: Vec<Star> = store.stars().cloned().collect();
        assert_eq!(before, after);
        assert_eq!(store.lines().len(), 1);
    }

    #[test]
    fn dangling_connection_on_empty_store_creates_nothing() {
        let mut store = store();
        let points = vec![json!({"id": 1, "x": 1, "y": 2}), json!({"id": 2, "x": 3, "y": 4})];
        let err = store.import_scene(&points, &[json!([1, 3])]).unwrap_err();
        assert_eq!(err.kind, ValidationKind::DanglingReference(3.0));
        assert_eq!(store.star_count(), 0);
        assert!(store.lines().is_empty());
        assert!(!store.take_changes().any());
    }

    #[test]
    fn connection_with_extra_endpoints_is_rejected() {
        let mut store = store();
        store.import_json(SCENARIO).unwrap();
        store.take_changes();
        let before: Vec<Star> = store.stars().cloned().collect();

        let err = store
            .import_json(r#"{"points":[{"id":1,"x":5,"y":5},{"id":2,"x":6,"y":6},{"id":3,"x":7,"y":7}],"connections":[[1,2],[1,2,3]]}"#)
            .unwrap_err();
        match err {
            ImportError::Validation(v) => {
                assert_eq!(v.section, ImportSection::Connections);
                assert_eq!(v.index, 1);
                assert_eq!(v.kind, ValidationKind::TypeMismatch("connection"));
            }
            other => panic!("unexpected error: {other}"),
        }
        let after: Vec<Star> = store.stars().cloned().collect();
        assert_eq!(before, after);
        assert!(!store.take_changes().any());
    }

    #[test]
    fn first_offending_point_is_reported() {
        let mut store = store();
        let points = vec![
            json!({"id": 1, "x": 1, "y": 2}),
            json!({"id": 2, "x": "left", "y": 4}),
            json!({"id": 3, "y": 4}),
        ];
        let err = store.import_scene(&points, &[]).unwrap_err();
        assert_eq!(err.index, 1);
        assert_eq!(err.kind, ValidationKind::TypeMismatch("x"));

        let err = store.import_scene(&points[2..], &[]).unwrap_err();
        assert_eq!(err.index, 0);
        assert_eq!(err.kind, ValidationKind::MissingField("x"));
    }

    #[test]
    fn malformed_payloads_are_structured_errors() {
        let mut store = store();
        assert!(matches!(store.import_json("not json"), Err(ImportError::Parse(_))));
        match store.import_json(r#"{"connections": []}"#) {
            Err(ImportError::Validation(v)) => {
                assert_eq!(v.kind, ValidationKind::MissingField("points"))
            }
            other => panic!("unexpected: {other:?}"),
        }
        match store.import_json(r#"{"points": [], "connections": [[1]]}"#) {
            Err(ImportError::Validation(v)) => {
                assert_eq!(v.kind, ValidationKind::MissingField("endpoint"))
            }
            other => panic!("unexpected: {other:?}"),
        }
    }

    #[test]
    fn missing_connections_key_imports_points_only() {
        let mut store = store();
        let summary = store.import_json(r#"{"points": [{"id": 7, "x": 10, "y": 10}]}"#).unwrap();
        assert_eq!(summary.stars, 1);
        assert_eq!(summary.lines, 0);
    }

    #[test]
    fn import_fills_styles_and_clamps_radius() {
        let mut store = store();
        let points = vec![
            json!({"id": 1, "x": 10, "y": 10, "radius": 0.5, "fill": "#ff0000"}),
            json!({"id": 2, "x": 20, "y": 20, "shadow": {"color": "#00ff00"}, "shadowBlur": 4}),
        ];
        store.import_scene(&points, &[]).unwrap();
        let stars: Vec<&Star> = store.stars().collect();
        assert_eq!(stars[0].style.radius, 2.0);
        assert_eq!(stars[0].style.fill, "#ff0000");
        assert_eq!(stars[0].style.stroke, store.star_style().stroke);
        assert_eq!(stars[1].style.shadow.color, "#00ff00");
        assert_eq!(stars[1].style.shadow.blur, 4.0);
    }

    #[test]
    fn style_field_type_mismatch_is_rejected() {
        let mut store = store();
        let points = vec![json!({"id": 1, "x": 1, "y": 1, "shadow": {"blur": "big"}})];
        let err = store.import_scene(&points, &[]).unwrap_err();
        assert_eq!(err.kind, ValidationKind::TypeMismatch("shadow.blur"));
    }

    #[test]
    fn fractions_use_current_dimensions() {
        let mut store = store();
        store.set_canvas_config(CanvasConfigPatch {
            aspect_ratio: Some(AspectRatio::Square),
            ..Default::default()
        });
        store.import_json(SCENARIO).unwrap();
        let p2 = position_of(&store, 2.0);
        assert_relative_eq!(p2.0, 360.0);
        assert_relative_eq!(p2.1, 360.0);
    }

    #[test]
    fn unknown_aspect_ratio_keeps_prior_value() {
        let mut store = store();
        assert!(store.set_aspect_ratio_name("3:4").is_ok());
        assert_eq!(store.dimensions(), (400, 533));
        assert!(store.set_aspect_ratio_name("21:9").is_err());
        assert_eq!(store.canvas().aspect_ratio, AspectRatio::Portrait34);
        assert_eq!(store.dimensions(), (400, 533));
    }

    #[test]
    fn auto_ratio_tracks_background_image() {
        let mut store = store();
        store.set_background(BackgroundPatch {
            kind: Some(BackgroundKind::Image),
            image_url: Some("sky.png".into()),
            ..Default::default()
        });
        store.set_canvas_config(CanvasConfigPatch {
            aspect_ratio: Some(AspectRatio::Auto),
            ..Default::default()
        });
        assert_eq!(store.dimensions(), (400, 711));
        assert!(store.set_background_natural_size("sky.png", (1024, 768)));
        assert_eq!(store.dimensions(), (1024, 768));
        assert!(!store.set_background_natural_size("other.png", (10, 10)));
        assert_eq!(store.dimensions(), (1024, 768));
    }

    #[test]
    fn switching_background_drops_previous_payload() {
        let mut store = store();
        store.set_background(BackgroundPatch {
            kind: Some(BackgroundKind::Image),
            image_url: Some("sky.png".into()),
            ..Default::default()
        });
        store.set_background(BackgroundPatch {
            kind: Some(BackgroundKind::Color),
            ..Default::default()
        });
        assert_eq!(
            store.background(),
            &BackgroundConfig::Color {
                color: store.canvas().background_color.clone()
            }
        );
        assert_eq!(store.background().image_url(), None);

        store.set_background(BackgroundPatch {
            color: Some("#123456".into()),
            ..Default::default()
        });
        assert_eq!(store.background(), &BackgroundConfig::Color { color: "#123456".into() });
        assert!(store.set_background_kind_name("sparkles").is_err());
        assert_eq!(store.background().kind(), BackgroundKind::Color);
    }

    #[test]
    fn radius_zero_is_clamped_everywhere() {
        let mut store = store();
        store.import_json(SCENARIO).unwrap();
        store.set_star_style(StarStylePatch {
            radius: Some(0.0),
            ..Default::default()
        });
        assert_eq!(store.star_style().radius, 2.0);
        assert!(store.stars().all(|s| s.style.radius == 2.0));
    }

    #[test]
    fn style_broadcast_overwrites_per_star_values() {
        let mut store = store();
        let points = vec![json!({"id": 1, "x": 1, "y": 1, "fill": "#ff0000", "opacity": 0.5})];
        store.import_scene(&points, &[]).unwrap();
        store.set_star_style(StarStylePatch {
            fill: Some("#00ffff".into()),
            ..Default::default()
        });
        let star = store.stars().next().unwrap();
        assert_eq!(star.style.fill, "#00ffff");
        assert_eq!(star.style.opacity, 0.5);
    }

    #[test]
    fn line_style_broadcasts_and_survives_regeneration() {
        let mut store = store();
        store.import_json(SCENARIO).unwrap();
        store.set_line_style(LineStylePatch {
            stroke_width: Some(4.0),
            ..Default::default()
        });
        assert_eq!(store.lines()[0].style.stroke_width, 4.0);
        let id = store.stars().next().unwrap().id;
        store.update_point_position(id, 1.0, 2.0);
        assert_eq!(store.lines()[0].style.stroke_width, 4.0);
        assert_eq!(&store.lines()[0].points[..2], &[1.0, 2.0]);
    }

    #[test]
    fn reset_styles_restores_baseline() {
        let mut store = store();
        store.import_json(SCENARIO).unwrap();
        store.set_star_style(StarStylePatch {
            radius: Some(9.0),
            ..Default::default()
        });
        store.reset_styles();
        assert_eq!(store.star_style(), &StyleDefaults::builtin().star);
        assert!(store.stars().all(|s| s.style == StyleDefaults::builtin().star));
    }

    #[test]
    fn batch_update_moves_all_and_regenerates_once() {
        let mut store = store();
        store.import_json(SCENARIO).unwrap();
        let mapping: HashMap<StarId, (f64, f64)> = store
            .stars()
            .map(|s| (s.id, (s.position.0 + 10.0, s.position.1 + 20.0)))
            .collect();
        assert_eq!(store.update_all_point_positions(&mapping), 2);
        let line = &store.lines()[0];
        let p1 = position_of(&store, 1.0);
        assert_eq!((line.points[0], line.points[1]), p1);
    }

    #[test]
    fn clear_resets_scene_but_keeps_dimensions() {
        let mut store = store();
        store.set_aspect_ratio_name("1:1").unwrap();
        store.import_json(SCENARIO).unwrap();
        let id = store.stars().next().unwrap().id;
        assert!(store.set_selection(Some(id)));
        store.set_background(BackgroundPatch {
            kind: Some(BackgroundKind::Color),
            color: Some("#000".into()),
            ..Default::default()
        });
        store.clear();
        assert_eq!(store.star_count(), 0);
        assert!(store.connections().is_empty());
        assert!(store.lines().is_empty());
        assert_eq!(store.selection(), None);
        assert_eq!(store.background(), &BackgroundConfig::Grid);
        assert_eq!(store.dimensions(), (400, 400));
    }

    #[test]
    fn selection_ignores_unknown_ids() {
        let mut store = store();
        assert!(!store.set_selection(Some(uuid::Uuid::new_v4())));
        assert!(store.set_selection(None));
    }
}
