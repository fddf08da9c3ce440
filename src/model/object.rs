//! Annotation objects and their per-type geometry.
//!
//! Geometry is stored in content coordinates (display pixels relative to the
//! image's top-left corner) for the current client size. Mask RLE and bitmaps
//! are the exception: they always live in natural pixels.

use std::sync::Arc;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::color::Rgb;

use super::category::{AttributeValue, LabelId};
use super::geometry::{bounding_rect, Point, Rect, Size};

/// Review state of an object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ObjectStatus {
    /// AI candidate below threshold or rejected by the reviewer
    Unchecked,
    /// AI candidate accepted for commit
    Checked,
    /// Part of the saved annotation set
    #[default]
    Committed,
}

/// Closed set of object kinds, used for tool dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObjectType {
    Rectangle,
    Polygon,
    Mask,
    Skeleton,
}

impl ObjectType {
    /// Display name for this object type.
    pub fn name(&self) -> &'static str {
        match self {
            ObjectType::Rectangle => "Rectangle",
            ObjectType::Polygon => "Polygon",
            ObjectType::Mask => "Mask",
            ObjectType::Skeleton => "Skeleton",
        }
    }
}

/// Tri-state keypoint visibility (COCO convention).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum KeypointVisibility {
    #[default]
    NotLabeled = 0,
    LabeledHidden = 1,
    LabeledVisible = 2,
}

impl KeypointVisibility {
    /// Parse the numeric wire value. Unknown values map to `NotLabeled`.
    pub fn from_value(value: f32) -> Self {
        match value.round() as i32 {
            1 => KeypointVisibility::LabeledHidden,
            2 => KeypointVisibility::LabeledVisible,
            _ => KeypointVisibility::NotLabeled,
        }
    }

    /// Numeric wire value.
    pub fn value(&self) -> f32 {
        match self {
            KeypointVisibility::NotLabeled => 0.0,
            KeypointVisibility::LabeledHidden => 1.0,
            KeypointVisibility::LabeledVisible => 2.0,
        }
    }
}

/// A rectangle with its own visibility toggle.
#[derive(Debug, Clone, PartialEq)]
pub struct RectElement {
    pub rect: Rect,
    pub visible: bool,
}

impl RectElement {
    pub fn new(rect: Rect) -> Self {
        Self { rect, visible: true }
    }
}

/// One or more closed rings forming a polygon annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct PolygonGroup {
    pub rings: Vec<Vec<Point>>,
    pub visible: bool,
}

impl PolygonGroup {
    pub fn new(rings: Vec<Vec<Point>>) -> Self {
        Self { rings, visible: true }
    }
}

/// Pixel mask: RLE over the natural image plus a decoded bitmap for rendering.
///
/// Equality only compares the RLE; the bitmap is derived data.
#[derive(Debug, Clone, Default)]
pub struct MaskData {
    /// `[start, length, start, length, ...]` over the row-major natural image
    pub rle: Vec<u32>,
    /// Decoded mask at natural resolution (255 = set)
    pub bitmap: Option<Arc<GrayImage>>,
}

impl PartialEq for MaskData {
    fn eq(&self, other: &Self) -> bool {
        self.rle == other.rle
    }
}

impl MaskData {
    /// Wrap an RLE without a decoded bitmap.
    pub fn from_rle(rle: Vec<u32>) -> Self {
        Self { rle, bitmap: None }
    }

    /// Number of set pixels.
    pub fn pixel_count(&self) -> u64 {
        self.rle.chunks(2).map(|run| run.get(1).copied().unwrap_or(0) as u64).sum()
    }
}

/// A skeleton keypoint.
#[derive(Debug, Clone, PartialEq)]
pub struct Keypoint {
    pub point: Point,
    pub z: f32,
    pub w: f32,
    pub visibility: KeypointVisibility,
    pub conf: f32,
    pub name: String,
    pub color: Rgb,
}

/// Keypoint skeleton with optional bounding rectangle.
#[derive(Debug, Clone, PartialEq)]
pub struct SkeletonData {
    pub rect: Option<RectElement>,
    pub keypoints: Vec<Keypoint>,
    /// Connectivity as flat index pairs into `keypoints`
    pub lines: Vec<usize>,
}

impl SkeletonData {
    /// Bounding box of the visible keypoints, falling back to the rectangle.
    pub fn hit_bounds(&self) -> Option<Rect> {
        let visible: Vec<Point> = self
            .keypoints
            .iter()
            .filter(|k| k.visibility == KeypointVisibility::LabeledVisible)
            .map(|k| k.point)
            .collect();
        bounding_rect(&visible).or_else(|| self.rect.as_ref().map(|r| r.rect))
    }

    /// Connected keypoint index pairs.
    pub fn segments(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.lines.chunks_exact(2).map(|pair| (pair[0], pair[1]))
    }
}

/// Type-specific geometry of an annotation.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rectangle(RectElement),
    Polygon(PolygonGroup),
    Mask(MaskData),
    Skeleton(SkeletonData),
}

impl Shape {
    /// The object type of this shape.
    pub fn object_type(&self) -> ObjectType {
        match self {
            Shape::Rectangle(_) => ObjectType::Rectangle,
            Shape::Polygon(_) => ObjectType::Polygon,
            Shape::Mask(_) => ObjectType::Mask,
            Shape::Skeleton(_) => ObjectType::Skeleton,
        }
    }

    /// Rectangle of rect-bearing shapes (boxes and skeletons).
    pub fn rect(&self) -> Option<&RectElement> {
        match self {
            Shape::Rectangle(r) => Some(r),
            Shape::Skeleton(s) => s.rect.as_ref(),
            _ => None,
        }
    }

    /// Mutable rectangle of rect-bearing shapes.
    pub fn rect_mut(&mut self) -> Option<&mut RectElement> {
        match self {
            Shape::Rectangle(r) => Some(r),
            Shape::Skeleton(s) => s.rect.as_mut(),
            _ => None,
        }
    }

    /// Proportionally map content geometry from one client size to another.
    pub fn rescale(&self, from: Size, to: Size) -> Shape {
        match self {
            Shape::Rectangle(r) => Shape::Rectangle(RectElement {
                rect: r.rect.rescale(from, to),
                visible: r.visible,
            }),
            Shape::Polygon(p) => Shape::Polygon(PolygonGroup {
                rings: rescale_rings(&p.rings, from, to),
                visible: p.visible,
            }),
            Shape::Mask(m) => Shape::Mask(m.clone()),
            Shape::Skeleton(s) => Shape::Skeleton(SkeletonData {
                rect: s.rect.as_ref().map(|r| RectElement {
                    rect: r.rect.rescale(from, to),
                    visible: r.visible,
                }),
                keypoints: s
                    .keypoints
                    .iter()
                    .map(|k| Keypoint {
                        point: k.point.rescale(from, to),
                        ..k.clone()
                    })
                    .collect(),
                lines: s.lines.clone(),
            }),
        }
    }
}

/// Rescale every point of every ring.
pub fn rescale_rings(rings: &[Vec<Point>], from: Size, to: Size) -> Vec<Vec<Point>> {
    rings
        .iter()
        .map(|ring| ring.iter().map(|p| p.rescale(from, to)).collect())
        .collect()
}

/// A single annotation.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationObject {
    pub label_id: Option<LabelId>,
    pub color: Rgb,
    pub hidden: bool,
    pub conf: Option<f32>,
    pub status: ObjectStatus,
    /// Values aligned with the category's attribute schema
    pub attributes: Vec<Option<AttributeValue>>,
    pub shape: Shape,
}

impl AnnotationObject {
    /// Create a visible, committed object with no label.
    pub fn new(shape: Shape) -> Self {
        Self {
            label_id: None,
            color: Rgb::WHITE,
            hidden: false,
            conf: None,
            status: ObjectStatus::Committed,
            attributes: Vec::new(),
            shape,
        }
    }

    /// Builder: set label and color.
    pub fn with_label(mut self, label_id: LabelId, color: Rgb) -> Self {
        self.label_id = Some(label_id);
        self.color = color;
        self
    }

    /// Builder: set review status and confidence.
    pub fn with_review(mut self, status: ObjectStatus, conf: Option<f32>) -> Self {
        self.status = status;
        self.conf = conf;
        self
    }

    /// The object type of this object.
    pub fn object_type(&self) -> ObjectType {
        self.shape.object_type()
    }

    /// True when the object is saved (not an AI candidate).
    pub fn is_committed(&self) -> bool {
        self.status == ObjectStatus::Committed
    }

    /// Mark as committed with full confidence.
    pub fn commit(&mut self) {
        self.status = ObjectStatus::Committed;
        self.conf = Some(1.0);
    }

    /// Copy with content geometry mapped from one client size to another.
    pub fn rescale(&self, from: Size, to: Size) -> AnnotationObject {
        AnnotationObject {
            shape: self.shape.rescale(from, to),
            ..self.clone()
        }
    }
}
