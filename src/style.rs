//! Baseline visual parameters for stars and lines.
//!
//! The baseline is a static JSON document compiled into the binary. It is parsed once; every
//! later "reset to defaults" reads the same cached values.

use crate::types::{LineStyle, Shadow, StarStyle};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

const STYLE_DEFAULTS_JSON: &str = include_str!("../assets/style_defaults.json");

/// Immutable baseline styles for stars and lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StyleDefaults {
    /// Baseline star style
    pub star: StarStyle,
    /// Baseline line style
    pub line: LineStyle,
}

impl StyleDefaults {
    /// Parses a style document.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let mut defaults: StyleDefaults = serde_json::from_str(json)?;
        defaults.star.radius = crate::types::clamp_radius(defaults.star.radius);
        Ok(defaults)
    }

    /// The static baseline, parsed on first use.
    ///
    /// Falls back to [`StyleDefaults::builtin`] if the bundled document does not parse.
    pub fn baseline() -> &'static StyleDefaults {
        static BASELINE: OnceLock<StyleDefaults> = OnceLock::new();
        BASELINE.get_or_init(|| match Self::from_json(STYLE_DEFAULTS_JSON) {
            Ok(defaults) => defaults,
            Err(err) => {
                log::warn!("bundled style defaults are invalid ({err}); using built-in values");
                Self::builtin()
            }
        })
    }

    /// Hard-coded white glow styling.
    pub fn builtin() -> Self {
        Self {
            star: StarStyle {
                radius: 3.0,
                fill: "#ffffff".into(),
                stroke: "#ffffff".into(),
                stroke_width: 0.0,
                shadow: Shadow {
                    enabled: true,
                    color: "#ffffff".into(),
                    blur: 10.0,
                    offset_x: 0.0,
                    offset_y: 0.0,
                },
                opacity: 1.0,
            },
            line: LineStyle {
                stroke: "#ffffff".into(),
                stroke_width: 1.0,
                shadow: Shadow {
                    enabled: true,
                    color: "#ffffff".into(),
                    blur: 6.0,
                    offset_x: 0.0,
                    offset_y: 0.0,
                },
                opacity: 0.8,
            },
        }
    }
}

impl Default for StyleDefaults {
    fn default() -> Self {
        Self::baseline().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bundled_document_matches_builtin() {
        let parsed = StyleDefaults::from_json(STYLE_DEFAULTS_JSON).unwrap();
        assert_eq!(parsed, StyleDefaults::builtin());
    }

    #[test]
    fn baseline_is_cached() {
        let a = StyleDefaults::baseline() as *const StyleDefaults;
        let b = StyleDefaults::baseline() as *const StyleDefaults;
        assert_eq!(a, b);
    }

    #[test]
    fn parsed_radius_is_clamped() {
        let mut doc: serde_json::Value = serde_json::from_str(STYLE_DEFAULTS_JSON).unwrap();
        doc["star"]["radius"] = serde_json::json!(0.5);
        let parsed = StyleDefaults::from_json(&doc.to_string()).unwrap();
        assert_eq!(parsed.star.radius, 2.0);
    }
}
