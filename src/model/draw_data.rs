//! Editor state: the snapshotted [`DrawData`] and the ephemeral [`EditState`].

use crate::constants::{DEFAULT_BRUSH_SIZE, DEFAULT_POINT_RESOLUTION};

use super::category::{Classification, LabelId};
use super::creating::CreatingObject;
use super::geometry::{Point, RectAnchor, Size};
use super::object::AnnotationObject;
use super::prompt::PromptState;
use super::tool::{EditorTool, ModelKind, ModelSelection, SubTool};

// ============================================================================
// DrawData
// ============================================================================

/// Everything undo/redo restores.
#[derive(Debug, Clone, PartialEq)]
pub struct DrawData {
    pub objects: Vec<AnnotationObject>,
    pub creating: Option<CreatingObject>,
    pub active_object_index: Option<usize>,
    pub selected_tool: EditorTool,
    pub selected_sub_tool: SubTool,
    pub selected_model: ModelSelection,
    /// AI-assisted annotation mode
    pub ai_annotation: bool,
    /// Reviewing AI candidates
    pub is_batch_editing: bool,
    /// Confidence threshold for candidates
    pub limit_conf: f32,
    /// Mask brush width in natural pixels
    pub brush_size: f32,
    /// Polygon density requested from segmentation
    pub point_resolution: f32,
    pub classifications: Vec<Classification>,
    pub prompt: PromptState,
}

impl Default for DrawData {
    fn default() -> Self {
        Self {
            objects: Vec::new(),
            creating: None,
            active_object_index: None,
            selected_tool: EditorTool::Drag,
            selected_sub_tool: SubTool::default(),
            selected_model: ModelSelection::default(),
            ai_annotation: false,
            is_batch_editing: false,
            limit_conf: 0.0,
            brush_size: DEFAULT_BRUSH_SIZE,
            point_resolution: DEFAULT_POINT_RESOLUTION,
            classifications: Vec::new(),
            prompt: PromptState::default(),
        }
    }
}

impl DrawData {
    /// The active object, if any.
    pub fn active_object(&self) -> Option<&AnnotationObject> {
        self.active_object_index.and_then(|i| self.objects.get(i))
    }

    /// Creating object if present, otherwise the active object.
    pub fn current_object(&self) -> Option<&AnnotationObject> {
        self.creating.as_ref().map(|c| &c.object).or_else(|| self.active_object())
    }

    /// Model used by the selected tool in AI mode.
    pub fn current_model(&self) -> Option<ModelKind> {
        self.selected_model.for_tool(self.selected_tool)
    }

    /// True when the selected tool sends visual prompts (creation allowed in batch mode).
    pub fn uses_visual_prompt(&self) -> bool {
        self.selected_tool == EditorTool::Rectangle && self.current_model() == Some(ModelKind::VisualPrompt)
    }

    /// Drop an active index that no longer points at an object.
    pub fn revalidate_active(&mut self) {
        if self.active_object_index.is_some_and(|i| i >= self.objects.len()) {
            self.active_object_index = None;
        }
    }

    /// Copy with all content geometry mapped between client sizes.
    pub fn rescale(&self, from: Size, to: Size) -> DrawData {
        if from == to {
            return self.clone();
        }
        DrawData {
            objects: self.objects.iter().map(|o| o.rescale(from, to)).collect(),
            creating: self.creating.as_ref().map(|c| c.rescale(from, to)),
            prompt: self.prompt.rescale(from, to),
            ..self.clone()
        }
    }
}

// ============================================================================
// EditState
// ============================================================================

/// Which part of the focused object is under the cursor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusElement {
    Rect,
    Keypoint(usize),
    PolygonVertex { ring: usize, vertex: usize },
    PolygonEdge { ring: usize, edge: usize },
    PolygonInside { ring: usize },
}

/// Where a move drag started and what the object looked like then.
#[derive(Debug, Clone, PartialEq)]
pub struct MoveStart {
    pub mouse: Point,
    pub origin: AnnotationObject,
}

/// Ephemeral interaction state. Never undone; reset on image change.
#[derive(Debug, Clone, Default)]
pub struct EditState {
    pub focus_object_index: Option<usize>,
    /// Every object under the cursor at the last right-click
    pub focus_all_indices: Vec<usize>,
    pub focus_element: Option<FocusElement>,
    pub start_rect_resize_anchor: Option<RectAnchor>,
    pub start_element_move_point: Option<MoveStart>,
    /// Set once the pointer moves during an element drag
    pub element_moved: bool,
    pub is_ctrl_pressed: bool,
    pub allow_move: bool,
    pub hide_creating_object: bool,
    /// An AI request is in flight
    pub is_requiring: bool,
    pub latest_label_id: Option<LabelId>,
    /// Last pointer position in container coordinates
    pub last_pointer: Option<Point>,
}

impl EditState {
    /// Forget any drag in progress.
    pub fn clear_drag(&mut self) {
        self.start_rect_resize_anchor = None;
        self.start_element_move_point = None;
        self.element_moved = false;
    }

    /// Forget hover and disambiguation state.
    pub fn clear_focus(&mut self) {
        self.focus_object_index = None;
        self.focus_element = None;
        self.focus_all_indices.clear();
    }
}
