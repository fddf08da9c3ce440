//! Errors raised while loading or translating persisted annotations.

use thiserror::Error;

/// Failure to turn persisted annotations into editor objects.
#[derive(Error, Debug)]
pub enum FormatError {
    #[error("Cannot read annotations: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed annotation JSON: {0}")]
    Json(#[from] serde_json::Error),

    /// Segmentation string that does not parse into coordinate pairs
    #[error("Bad segmentation: {reason}")]
    BadSegmentation { reason: String },

    /// RLE mask whose `[height, width]` disagrees with the image
    #[error("Mask is {found_width}x{found_height} but the image is {width}x{height}")]
    MaskSizeMismatch {
        width: u32,
        height: u32,
        found_width: u32,
        found_height: u32,
    },

    /// Neither a bounding box, a segmentation, a mask nor a skeleton
    #[error("Annotation has no geometry")]
    NoGeometry,

    #[error("Image dimensions required but not available")]
    MissingDimensions,
}

impl FormatError {
    pub fn bad_segmentation(reason: impl Into<String>) -> Self {
        Self::BadSegmentation {
            reason: reason.into(),
        }
    }
}
