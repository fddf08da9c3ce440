//! Error types for editor commands.

use thiserror::Error;

use crate::ai::AiError;
use crate::format::{FormatError, ValidationIssue};

/// Errors returned by editor commands.
///
/// Every variant is recoverable; the editor stays usable after any of them.
#[derive(Error, Debug)]
pub enum EditorError {
    /// A mask commit produced no set pixels
    #[error("Mask has no pixels")]
    DegenerateMask,

    /// A polygon ring has fewer vertices than a closed shape needs
    #[error("Polygon ring has {vertices} vertices, at least {min} required")]
    PolygonTooSmall {
        /// Vertices in the rejected ring
        vertices: usize,
        /// Minimum vertex count
        min: usize,
    },

    /// A rectangle with zero width or height
    #[error("Rectangle has no area")]
    DegenerateRect,

    /// Command needs an image but none is loaded
    #[error("No image loaded")]
    NoImage,

    /// Command acts on the active object but none is selected
    #[error("No object is selected")]
    NoActiveObject,

    /// Object index out of range
    #[error("Invalid object index {index} (have {len} objects)")]
    InvalidIndex {
        /// Requested index
        index: usize,
        /// Number of objects
        len: usize,
    },

    /// Annotations are incomplete
    #[error("Validation failed with {} issue(s)", .0.len())]
    Validation(Vec<ValidationIssue>),

    /// AI request failed
    #[error("AI error: {0}")]
    Ai(#[from] AiError),

    /// Persisted annotations could not be translated
    #[error("Format error: {0}")]
    Format(#[from] FormatError),
}

impl EditorError {
    /// Create an invalid index error.
    pub fn invalid_index(index: usize, len: usize) -> Self {
        Self::InvalidIndex { index, len }
    }

    /// Create a polygon-too-small error.
    pub fn polygon_too_small(vertices: usize, min: usize) -> Self {
        Self::PolygonTooSmall { vertices, min }
    }

    /// True for errors raised by rejected geometry.
    pub fn is_geometry(&self) -> bool {
        matches!(
            self,
            Self::DegenerateMask | Self::PolygonTooSmall { .. } | Self::DegenerateRect
        )
    }
}

/// Result alias for editor commands.
pub type EditorResult<T> = Result<T, EditorError>;
