//! Data models for the annotation editor.

mod category;
mod creating;
mod draw_data;
pub mod geometry;
mod object;
mod prompt;
pub mod template;
mod tool;

pub use category::{
    find_category, find_category_by_name, AttributeDef, AttributeKind, AttributeOption,
    AttributeValue, Category, Classification, LabelId, LabelType,
};
pub use creating::{CreatingObject, MaskStep};
pub use draw_data::{DrawData, EditState, FocusElement, MoveStart};
pub use geometry::{Direction, Point, Rect, RectAnchor, Size};
pub use object::{
    rescale_rings, AnnotationObject, Keypoint, KeypointVisibility, MaskData, ObjectStatus,
    ObjectType, PolygonGroup, RectElement, Shape, SkeletonData,
};
pub use prompt::{PromptItem, PromptKind, PromptState};
pub use tool::{EditorTool, ModelKind, ModelSelection, SubTool};
