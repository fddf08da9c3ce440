//! Persisted annotation format.
//!
//! Translates between editor objects and the external annotation format, and
//! checks annotations for completeness before they are submitted.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use annotator::format::{load_annotations, persisted_to_objects};
//!
//! let annotations = load_annotations(&json)?;
//! let objects = persisted_to_objects(&annotations, &categories, client, natural);
//! ```

mod auto_save;
mod error;
mod persisted;
mod validate;

pub use auto_save::{AutoSave, AutoSaveCallback};
pub use error::FormatError;
pub use persisted::{
    format_segmentation, load_annotations, load_annotations_file, object_to_persisted,
    objects_to_persisted, parse_segmentation, persisted_to_object, persisted_to_objects,
    BoundingBox, PersistedAnnotation, PersistedMask,
};
pub use validate::{validate, ValidationIssue};
