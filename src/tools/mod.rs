//! Tool state machines.
//!
//! Each object type has a [`ToolHandler`] with a create phase and an edit
//! phase, each split into press/move/release. Handlers mutate the draw data
//! through a [`ToolContext`] and report what the controller must do next as
//! [`ToolEffect`]s.

mod mask;
mod polygon;
mod rectangle;
mod skeleton;

pub use mask::MaskTool;
pub use polygon::PolygonTool;
pub use rectangle::RectangleTool;
pub use skeleton::SkeletonTool;

pub(crate) use mask::{cancel_pending_step, flatten_mask_steps};
pub(crate) use polygon::{commit_polygon, drop_small_rings};
pub(crate) use rectangle::check_rect_commit;
pub(crate) use skeleton::fit_skeleton_commit;

use crate::ai::AiTrigger;
use crate::color::Rgb;
use crate::error::EditorError;
use crate::hit_test::element_hit;
use crate::model::geometry::{
    anchor_under_point, closest_point_on_segment, move_rect, rect_from_points, resize_rect,
};
use crate::model::{
    AnnotationObject, DrawData, EditState, FocusElement, LabelId, MoveStart, ObjectType, Point,
    PromptItem, PromptKind, RectAnchor, Shape, Size, SubTool,
};

// ============================================================================
// Input
// ============================================================================

/// Mouse button of a pointer event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MouseButton {
    #[default]
    Left,
    Middle,
    Right,
}

/// A pointer event.
///
/// The editor receives container coordinates and hands tools the same event
/// with `point` mapped to content coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct PointerInput {
    pub point: Point,
    pub button: MouseButton,
    /// A button is held (drag) during a move
    pub button_held: bool,
    pub alt: bool,
    pub ctrl: bool,
}

impl PointerInput {
    /// Left-button event at `point`.
    pub fn new(point: Point) -> Self {
        Self {
            point,
            ..Default::default()
        }
    }

    /// Builder: set the button.
    pub fn with_button(mut self, button: MouseButton) -> Self {
        self.button = button;
        self
    }

    /// Builder: mark a button as held.
    pub fn held(mut self) -> Self {
        self.button_held = true;
        self
    }

    /// Builder: hold Alt.
    pub fn with_alt(mut self) -> Self {
        self.alt = true;
        self
    }

    /// Builder: hold Ctrl.
    pub fn with_ctrl(mut self) -> Self {
        self.ctrl = true;
        self
    }

    /// Same event at another position.
    pub fn at(self, point: Point) -> Self {
        Self { point, ..self }
    }

    pub fn is_right(&self) -> bool {
        self.button == MouseButton::Right
    }

    /// Right-click, or left-click with Alt, asks for a negative prompt.
    pub fn prompt_is_positive(&self) -> bool {
        !(self.is_right() || (self.button == MouseButton::Left && self.alt))
    }
}

/// Label and color given to a newly created object.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ObjectBasics {
    pub label_id: Option<LabelId>,
    pub color: Rgb,
}

impl ObjectBasics {
    /// Apply label and color to a fresh object.
    pub fn apply(&self, object: AnnotationObject) -> AnnotationObject {
        AnnotationObject {
            label_id: self.label_id,
            color: self.color,
            ..object
        }
    }
}

// ============================================================================
// Effects and Context
// ============================================================================

/// Follow-up work a tool asks the controller to perform.
#[derive(Debug)]
pub enum ToolEffect {
    /// Append a finished object and make it active, with history
    AddObject(AnnotationObject),
    /// Write an edited object back, with history
    UpdateObject {
        index: usize,
        object: AnnotationObject,
    },
    /// Record the current draw data
    PushHistory,
    /// Start an AI request
    RequestAi(AiTrigger),
    /// A commit was rejected
    Warning(EditorError),
}

/// Mutable view of editor state handed to tools.
pub struct ToolContext<'a> {
    pub data: &'a mut DrawData,
    pub edit: &'a mut EditState,
    /// Current client size; content coordinates are bounded by it
    pub client: Size,
    pub natural: Size,
    effects: Vec<ToolEffect>,
}

impl<'a> ToolContext<'a> {
    pub fn new(data: &'a mut DrawData, edit: &'a mut EditState, client: Size, natural: Size) -> Self {
        Self {
            data,
            edit,
            client,
            natural,
            effects: Vec::new(),
        }
    }

    pub fn emit(&mut self, effect: ToolEffect) {
        self.effects.push(effect);
    }

    pub fn push_history(&mut self) {
        self.emit(ToolEffect::PushHistory);
    }

    /// Reject a commit: log it and report it to the controller.
    pub fn warn(&mut self, error: EditorError) {
        log::warn!("⚠️ Commit rejected: {}", error);
        self.emit(ToolEffect::Warning(error));
    }

    /// Effects emitted so far.
    pub fn effects(&self) -> &[ToolEffect] {
        &self.effects
    }

    pub fn into_effects(self) -> Vec<ToolEffect> {
        self.effects
    }

    /// Drop the active object and the creating object.
    pub fn deactivate(&mut self) {
        self.data.active_object_index = None;
        self.data.creating = None;
    }
}

// ============================================================================
// Tool Handler
// ============================================================================

/// Create/edit protocol of one object type.
///
/// Every method returns whether it handled the event.
pub trait ToolHandler {
    fn start_creating(
        &self,
        cx: &mut ToolContext<'_>,
        input: &PointerInput,
        basic: &ObjectBasics,
    ) -> bool;

    fn update_creating(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool;

    fn finish_creating(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool;

    fn start_editing(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool;

    fn update_editing(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool;

    fn finish_editing(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool;
}

/// One handler per object type, built once by the editor.
#[derive(Debug, Default)]
pub struct ToolSet {
    rectangle: RectangleTool,
    polygon: PolygonTool,
    mask: MaskTool,
    skeleton: SkeletonTool,
}

impl ToolSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Handler for an object type.
    pub fn handler(&self, object_type: ObjectType) -> &dyn ToolHandler {
        match object_type {
            ObjectType::Rectangle => &self.rectangle,
            ObjectType::Polygon => &self.polygon,
            ObjectType::Mask => &self.mask,
            ObjectType::Skeleton => &self.skeleton,
        }
    }
}

// ============================================================================
// Shared Element Editing
// ============================================================================

fn begin_move(edit: &mut EditState, mouse: Point, origin: AnnotationObject) {
    edit.start_element_move_point = Some(MoveStart { mouse, origin });
    edit.element_moved = false;
}

/// Start resizing or moving the element of the creating object under the cursor.
///
/// Pressing a polygon edge inserts a vertex at the closest point of the edge
/// (in both the active object and its creating copy) and drags that vertex.
pub(crate) fn start_element_edit(cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
    let Some(creating) = cx.data.creating.as_mut() else {
        return false;
    };
    let Some(element) = element_hit(&creating.object, input.point) else {
        return false;
    };
    cx.edit.focus_element = Some(element);
    let origin = creating.object.clone();

    match element {
        FocusElement::Rect => {
            let Some(rect) = creating.object.shape.rect().map(|r| r.rect) else {
                return false;
            };
            match anchor_under_point(&rect, input.point) {
                Some(direction) => {
                    cx.edit.start_rect_resize_anchor = Some(RectAnchor {
                        direction,
                        fixed: direction.fixed_point_on(&rect),
                    });
                }
                None => begin_move(cx.edit, input.point, origin),
            }
        }
        FocusElement::PolygonEdge { ring, edge } => {
            let Shape::Polygon(group) = &mut creating.object.shape else {
                return false;
            };
            let Some(points) = group.rings.get_mut(ring) else {
                return false;
            };
            let (a, b) = (points[edge], points[(edge + 1) % points.len()]);
            let inserted = closest_point_on_segment(input.point, a, b);
            points.insert(edge + 1, inserted);

            if let Some(index) = cx.data.active_object_index
                && let Some(active) = cx.data.objects.get_mut(index)
            {
                *active = creating.object.clone();
            }
            cx.edit.focus_element = Some(FocusElement::PolygonVertex {
                ring,
                vertex: edge + 1,
            });
            // Origin keeps the pre-insert ring so release can tell insertions from clicks
            begin_move(cx.edit, inserted, origin);
        }
        FocusElement::Keypoint(_)
        | FocusElement::PolygonVertex { .. }
        | FocusElement::PolygonInside { .. } => begin_move(cx.edit, input.point, origin),
    }
    true
}

/// Resize or move the rectangle of the creating object.
pub(crate) fn update_rect_edit(cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
    if cx.edit.focus_element != Some(FocusElement::Rect) {
        return false;
    }
    let Some(rect) = cx
        .data
        .creating
        .as_mut()
        .and_then(|c| c.object.shape.rect_mut())
    else {
        return false;
    };

    if let Some(anchor) = cx.edit.start_rect_resize_anchor {
        rect.rect = resize_rect(&rect.rect, &anchor, input.point, cx.client);
        cx.edit.element_moved = true;
        return true;
    }
    if let Some(start) = &cx.edit.start_element_move_point {
        let Some(origin) = start.origin.shape.rect().map(|r| r.rect) else {
            return false;
        };
        let top_left = Point::new(origin.x, origin.y);
        rect.rect = move_rect(&rect.rect, top_left, start.mouse, input.point, cx.client);
        cx.edit.element_moved = input.point != start.mouse;
        return true;
    }
    false
}

/// Write the edited copy back when a drag changed it, then forget the drag.
pub(crate) fn finish_element_edit(cx: &mut ToolContext<'_>) -> bool {
    let dragging =
        cx.edit.start_rect_resize_anchor.is_some() || cx.edit.start_element_move_point.is_some();
    if dragging {
        commit_creating_edit(cx);
    }
    cx.edit.clear_drag();
    true
}

/// Emit an update of the active object from its creating copy.
pub(crate) fn commit_creating_edit(cx: &mut ToolContext<'_>) {
    let Some(index) = cx.data.active_object_index else {
        return;
    };
    if let Some(object) = cx.data.creating.as_ref().map(|c| c.object.clone()) {
        cx.emit(ToolEffect::UpdateObject { index, object });
    }
}

// ============================================================================
// Shared AI Prompting
// ============================================================================

/// Begin a prompt for the selected AI sub-tool.
pub(crate) fn start_ai_prompt(cx: &mut ToolContext<'_>, input: &PointerInput) {
    let positive = input.prompt_is_positive();
    let brush = cx.data.brush_size;
    let prompt = match cx.data.selected_sub_tool {
        SubTool::AutoSegmentByBox => PromptItem::rect_from(input.point, positive),
        SubTool::AutoSegmentByClick => PromptItem::point(input.point, positive),
        SubTool::AutoSegmentByStroke => PromptItem::stroke(input.point, brush, positive),
        SubTool::AutoEdgeStitching => PromptItem::edge_stitch(input.point, brush),
        _ => return,
    };
    cx.data.prompt.creating_prompt = Some(prompt);
}

/// Follow the pointer with the prompt being drawn.
///
/// Returns true when a prompt is in progress.
pub(crate) fn update_ai_prompt(cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
    let client = cx.client;
    let Some(prompt) = cx.data.prompt.creating_prompt.as_mut() else {
        return false;
    };
    match prompt.kind {
        PromptKind::Rect => {
            if let Some(start) = prompt.start_point {
                prompt.rect = Some(rect_from_points(start, input.point, client));
            }
        }
        PromptKind::Stroke | PromptKind::EdgeStitch => {
            if input.button_held {
                prompt.stroke.push(input.point.clamp_to(client));
            }
        }
        PromptKind::Point | PromptKind::Modify => {}
    }
    true
}

/// Finish the prompt being drawn and ask for a result.
///
/// The request carries `base` followed by the new prompt. A box released
/// without extent is dropped.
pub(crate) fn finish_ai_prompt(
    cx: &mut ToolContext<'_>,
    input: &PointerInput,
    mut base: Vec<PromptItem>,
) -> bool {
    let Some(mut prompt) = cx.data.prompt.creating_prompt.clone() else {
        return false;
    };
    if prompt.kind == PromptKind::Rect {
        let Some(start) = prompt.start_point else {
            return false;
        };
        let end = input.point.clamp_to(cx.client);
        if end.x == start.x || end.y == start.y {
            cx.data.prompt.creating_prompt = None;
            return true;
        }
        let rect = rect_from_points(start, end, cx.client);
        prompt.rect = Some(rect);
        cx.data.prompt.creating_prompt = Some(prompt.clone());
        cx.data.prompt.active_rect_while_loading = Some(rect);
        cx.push_history();
    }
    base.push(prompt);
    if let Some(trigger) = AiTrigger::for_selected_tool(cx.data, base) {
        cx.emit(ToolEffect::RequestAi(trigger));
    }
    true
}
