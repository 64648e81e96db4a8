//! Error taxonomy for the editor core.
//!
//! Every failure is reported as a value; callers surface it to the user as a message and the
//! store and render tree stay in their last consistent state.

use std::fmt;
use thiserror::Error;

/// Which array of the import payload an offending item belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportSection {
    /// The `points` array (or the payload root, for a missing `points` key)
    Points,
    /// The `connections` array
    Connections,
}

impl fmt::Display for ImportSection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ImportSection::Points => write!(f, "points"),
            ImportSection::Connections => write!(f, "connections"),
        }
    }
}

/// What exactly was wrong with the offending import item.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationKind {
    /// A required field is absent
    MissingField(&'static str),
    /// A field is present but has the wrong JSON type
    TypeMismatch(&'static str),
    /// A connection references a point id that is not part of the import
    DanglingReference(f64),
}

impl fmt::Display for ValidationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationKind::MissingField(field) => write!(f, "missing field `{field}`"),
            ValidationKind::TypeMismatch(field) => write!(f, "field `{field}` has the wrong type"),
            ValidationKind::DanglingReference(id) => write!(f, "references unknown point id {id}"),
        }
    }
}

/// First offense found while validating an import payload.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("{section}[{index}]: {kind}")]
pub struct ValidationError {
    /// What was wrong
    pub kind: ValidationKind,
    /// Which array the item lives in
    pub section: ImportSection,
    /// Position of the item inside that array
    pub index: usize,
}

impl ValidationError {
    pub(crate) fn new(kind: ValidationKind, section: ImportSection, index: usize) -> Self {
        Self { kind, section, index }
    }
}

/// Failure of a whole import; nothing is applied when this is returned.
#[derive(Debug, Error)]
pub enum ImportError {
    /// The payload is not JSON at all
    #[error("import is not valid JSON: {0}")]
    Parse(#[from] serde_json::Error),
    /// The payload is JSON but violates the import contract
    #[error("invalid import: {0}")]
    Validation(#[from] ValidationError),
}

/// A background image could not be loaded.
#[derive(Debug, Error)]
pub enum ResourceError {
    /// Reading the image source failed
    #[error("failed to read image `{url}`: {source}")]
    Io {
        /// Source the editor tried to read
        url: String,
        /// Underlying I/O failure
        #[source]
        source: std::io::Error,
    },
    /// The bytes are not a decodable image
    #[error("failed to decode image `{url}`: {source}")]
    Decode {
        /// Source the editor tried to decode
        url: String,
        /// Underlying decoder failure
        #[source]
        source: image::ImageError,
    },
}

/// An export could not be produced. Temporary scene changes are rolled back regardless.
#[derive(Debug, Error)]
pub enum ExportError {
    /// The render tree has not been mounted yet
    #[error("the canvas is not initialized yet")]
    NotInitialized,
    /// The caller asked for an unsupported pixel ratio or encoding
    #[error("invalid export options: {0}")]
    InvalidOptions(String),
    /// Rasterizing the scene failed
    #[error("failed to rasterize the canvas: {0}")]
    Raster(String),
    /// Encoding the raster failed
    #[error("failed to encode the image: {0}")]
    Encode(String),
}

/// An enumerated configuration value was not recognized; the prior value is kept.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    /// Aspect ratio outside `9:16`, `3:4`, `1:1`, `auto`
    #[error("unknown aspect ratio `{0}`")]
    UnknownAspectRatio(String),
    /// Background type outside `grid`, `image`, `color`
    #[error("unknown background type `{0}`")]
    UnknownBackgroundType(String),
}
