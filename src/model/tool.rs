//! Tool, sub-tool and AI model selection.

use super::object::ObjectType;

/// Top-level tools available in the editor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EditorTool {
    /// Select and pan
    #[default]
    Drag,
    Rectangle,
    Polygon,
    Mask,
    Skeleton,
}

impl EditorTool {
    /// Get the display name for this tool.
    pub fn name(&self) -> &'static str {
        match self {
            EditorTool::Drag => "Drag",
            EditorTool::Rectangle => "Rectangle",
            EditorTool::Polygon => "Polygon",
            EditorTool::Mask => "Mask",
            EditorTool::Skeleton => "Skeleton",
        }
    }

    /// Get all available tools.
    pub fn all() -> &'static [EditorTool] {
        &[
            EditorTool::Drag,
            EditorTool::Rectangle,
            EditorTool::Polygon,
            EditorTool::Mask,
            EditorTool::Skeleton,
        ]
    }

    /// Object type this tool creates, `None` for Drag.
    pub fn object_type(&self) -> Option<ObjectType> {
        match self {
            EditorTool::Drag => None,
            EditorTool::Rectangle => Some(ObjectType::Rectangle),
            EditorTool::Polygon => Some(ObjectType::Polygon),
            EditorTool::Mask => Some(ObjectType::Mask),
            EditorTool::Skeleton => Some(ObjectType::Skeleton),
        }
    }

    /// Check if this tool creates objects (not Drag).
    pub fn is_drawing_tool(&self) -> bool {
        !matches!(self, EditorTool::Drag)
    }

    /// Sub-tool selected when switching to this tool.
    pub fn default_sub_tool(&self, ai_annotation: bool) -> SubTool {
        match (self, ai_annotation) {
            (EditorTool::Rectangle, true) => SubTool::PositiveVisualPrompt,
            (EditorTool::Polygon, true) | (EditorTool::Mask, true) => SubTool::AutoSegmentByBox,
            _ => SubTool::PenAdd,
        }
    }
}

/// Secondary tool modes for rectangle prompts, masks and AI segmentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SubTool {
    PositiveVisualPrompt,
    NegativeVisualPrompt,
    #[default]
    PenAdd,
    PenErase,
    BrushAdd,
    BrushErase,
    AutoSegmentByBox,
    AutoSegmentByClick,
    AutoSegmentByStroke,
    AutoEdgeStitching,
    AutoSegmentEverything,
}

impl SubTool {
    /// Manual pen or brush drawing.
    pub fn is_manual_mask(&self) -> bool {
        self.is_pen() || self.is_brush()
    }

    pub fn is_pen(&self) -> bool {
        matches!(self, SubTool::PenAdd | SubTool::PenErase)
    }

    pub fn is_brush(&self) -> bool {
        matches!(self, SubTool::BrushAdd | SubTool::BrushErase)
    }

    /// Adds pixels rather than clearing them.
    pub fn is_additive(&self) -> bool {
        matches!(self, SubTool::PenAdd | SubTool::BrushAdd)
    }

    /// The additive counterpart of an erase tool.
    pub fn to_additive(self) -> SubTool {
        match self {
            SubTool::PenErase => SubTool::PenAdd,
            SubTool::BrushErase => SubTool::BrushAdd,
            other => other,
        }
    }
}

/// AI models the editor can call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ModelKind {
    Detection,
    VisualPrompt,
    SegmentByPolygon,
    SegmentByMask,
    Pose,
    MaskEdgeStitching,
    SegmentEverything,
}

impl ModelKind {
    /// Identifier used on the wire.
    pub fn wire_id(&self) -> &'static str {
        match self {
            ModelKind::Detection => "ai_detection",
            ModelKind::VisualPrompt => "ai_ivp",
            ModelKind::SegmentByPolygon => "ai_segmentation",
            ModelKind::SegmentByMask => "ai_segmentation_mask",
            ModelKind::Pose => "ai_pose",
            ModelKind::MaskEdgeStitching => "ai_mask_edge_stitching",
            ModelKind::SegmentEverything => "ai_segment_everything",
        }
    }
}

/// Which model each drawing tool uses in AI mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModelSelection {
    pub rectangle: ModelKind,
    pub polygon: ModelKind,
    pub mask: ModelKind,
    pub skeleton: ModelKind,
}

impl Default for ModelSelection {
    fn default() -> Self {
        Self {
            rectangle: ModelKind::Detection,
            polygon: ModelKind::SegmentByPolygon,
            mask: ModelKind::SegmentByMask,
            skeleton: ModelKind::Pose,
        }
    }
}

impl ModelSelection {
    /// Model selected for a tool, `None` for Drag.
    pub fn for_tool(&self, tool: EditorTool) -> Option<ModelKind> {
        match tool {
            EditorTool::Drag => None,
            EditorTool::Rectangle => Some(self.rectangle),
            EditorTool::Polygon => Some(self.polygon),
            EditorTool::Mask => Some(self.mask),
            EditorTool::Skeleton => Some(self.skeleton),
        }
    }

    /// Change the model for a tool. Ignored for Drag.
    pub fn set(&mut self, tool: EditorTool, model: ModelKind) {
        match tool {
            EditorTool::Drag => {}
            EditorTool::Rectangle => self.rectangle = model,
            EditorTool::Polygon => self.polygon = model,
            EditorTool::Mask => self.mask = model,
            EditorTool::Skeleton => self.skeleton = model,
        }
    }
}
