//! Skeleton tool: drag a box and fit the body template into it.

use super::{
    commit_creating_edit, start_element_edit, update_rect_edit, ObjectBasics, PointerInput,
    ToolContext, ToolEffect, ToolHandler,
};
use crate::ai::AiTrigger;
use crate::error::EditorError;
use crate::model::geometry::rect_from_points;
use crate::model::template::{body_keypoints, fit_keypoints_to_rect, BODY_LINES};
use crate::model::{
    AnnotationObject, CreatingObject, FocusElement, ModelKind, Rect, RectElement, Shape,
    SkeletonData,
};

/// Fit the body template into a skeleton that only has its box so far.
///
/// A skeleton without keypoints and without a box area is discarded with a
/// warning and `false` is returned.
pub(crate) fn fit_skeleton_commit(cx: &mut ToolContext<'_>) -> bool {
    let Some(creating) = cx.data.creating.as_mut() else {
        return false;
    };
    let Shape::Skeleton(skeleton) = &mut creating.object.shape else {
        return false;
    };
    if !skeleton.keypoints.is_empty() {
        return true;
    }
    match skeleton.rect.as_ref().map(|r| r.rect) {
        Some(rect) if rect.width > 0.0 && rect.height > 0.0 => {
            skeleton.keypoints = fit_keypoints_to_rect(&body_keypoints(), &rect);
            skeleton.lines = BODY_LINES.to_vec();
            true
        }
        _ => {
            cx.data.creating = None;
            cx.warn(EditorError::DegenerateRect);
            false
        }
    }
}

/// Skeleton drawing and editing.
#[derive(Debug, Default)]
pub struct SkeletonTool;

impl ToolHandler for SkeletonTool {
    fn start_creating(
        &self,
        cx: &mut ToolContext<'_>,
        input: &PointerInput,
        basic: &ObjectBasics,
    ) -> bool {
        cx.deactivate();
        let p = input.point;
        let skeleton = SkeletonData {
            rect: Some(RectElement::new(Rect::new(p.x, p.y, 0.0, 0.0))),
            keypoints: Vec::new(),
            lines: Vec::new(),
        };
        let object = basic.apply(AnnotationObject::new(Shape::Skeleton(skeleton)));
        cx.data.creating = Some(CreatingObject::new(object).with_start_point(p));
        true
    }

    fn update_creating(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
        let client = cx.client;
        let Some(creating) = cx.data.creating.as_mut() else {
            return false;
        };
        if let Some(start) = creating.start_point
            && let Some(rect) = creating.object.shape.rect_mut()
        {
            rect.rect = rect_from_points(start, input.point, client);
        }
        true
    }

    fn finish_creating(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
        let Some(creating) = cx.data.creating.take() else {
            return false;
        };
        let Some(start) = creating.start_point else {
            return false;
        };
        let rect = rect_from_points(start, input.point, cx.client);
        if rect.width <= 0.0 || rect.height <= 0.0 {
            cx.warn(EditorError::DegenerateRect);
            return true;
        }
        let mut object = creating.object;
        object.shape = Shape::Skeleton(SkeletonData {
            rect: Some(RectElement::new(rect)),
            keypoints: fit_keypoints_to_rect(&body_keypoints(), &rect),
            lines: BODY_LINES.to_vec(),
        });
        object.commit();
        log::debug!("📝 Skeleton fitted into {:?}", rect);
        cx.emit(ToolEffect::AddObject(object));
        true
    }

    fn start_editing(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
        if input.is_right() {
            return false;
        }
        start_element_edit(cx, input)
    }

    fn update_editing(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
        let Some(FocusElement::Keypoint(index)) = cx.edit.focus_element else {
            return update_rect_edit(cx, input);
        };
        let Some(start) = &cx.edit.start_element_move_point else {
            return false;
        };
        let Some(Shape::Skeleton(skeleton)) = cx.data.creating.as_mut().map(|c| &mut c.object.shape)
        else {
            return false;
        };
        let Some(keypoint) = skeleton.keypoints.get_mut(index) else {
            return false;
        };
        keypoint.point = input.point.clamp_to(cx.client);
        cx.edit.element_moved = input.point != start.mouse;
        true
    }

    fn finish_editing(&self, cx: &mut ToolContext<'_>, _input: &PointerInput) -> bool {
        let dragging =
            cx.edit.start_rect_resize_anchor.is_some() || cx.edit.start_element_move_point.is_some();
        let changed = dragging && (cx.edit.element_moved || cx.edit.start_rect_resize_anchor.is_some());
        if changed {
            commit_creating_edit(cx);
            // Corrected poses feed back into the pose model
            if cx.data.ai_annotation && cx.data.current_model() == Some(ModelKind::Pose) {
                cx.emit(ToolEffect::RequestAi(AiTrigger::pose()));
            }
        }
        cx.edit.clear_drag();
        true
    }
}
