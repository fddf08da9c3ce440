//! Mask tool: pen polygons and brush strokes, or AI segmentation prompts.
//!
//! Manual steps stay vectors in content coordinates until the mask is
//! committed, when they are rasterized over the natural image.

use super::{
    finish_ai_prompt, start_ai_prompt, update_ai_prompt, ObjectBasics, PointerInput, ToolContext,
    ToolHandler,
};
use crate::constants::{MIN_POLYGON_VERTICES, POINT_HIT_RADIUS};
use crate::error::EditorError;
use crate::mask::{mask_with_bitmap, steps_to_rle};
use crate::model::geometry::point_near;
use crate::model::{AnnotationObject, CreatingObject, EditorTool, MaskData, MaskStep, Shape};

/// Mask drawing and editing.
#[derive(Debug, Default)]
pub struct MaskTool;

fn manual_mode(cx: &ToolContext<'_>) -> bool {
    cx.data.selected_sub_tool.is_manual_mask()
}

/// Add a pen vertex or start a brush stroke on the creating mask.
fn press_manual(cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
    let sub_tool = cx.data.selected_sub_tool;
    let brush = cx.data.brush_size;
    let p = input.point.clamp_to(cx.client);
    let Some(creating) = cx.data.creating.as_mut() else {
        return false;
    };
    if !matches!(creating.object.shape, Shape::Mask(_)) {
        return false;
    }

    if sub_tool.is_brush() {
        creating.mask_step = Some(MaskStep::start(sub_tool, p, brush));
    } else {
        match creating.mask_step.take() {
            Some(mut step) if step.tool == sub_tool => {
                let closes = step.points.len() >= MIN_POLYGON_VERTICES
                    && point_near(step.points[0], p, POINT_HIT_RADIUS);
                if closes {
                    creating.temp_mask_steps.push(step);
                } else {
                    step.points.push(p);
                    creating.mask_step = Some(step);
                }
            }
            _ => creating.mask_step = Some(MaskStep::start(sub_tool, p, brush)),
        }
        cx.push_history();
    }
    // Hand-drawn pixels invalidate the model's view of the mask
    cx.data.prompt.session_id = None;
    true
}

/// Follow a held brush.
fn drag_manual(cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
    let client = cx.client;
    let Some(creating) = cx.data.creating.as_mut() else {
        return false;
    };
    if input.button_held
        && let Some(step) = creating.mask_step.as_mut()
        && step.tool.is_brush()
    {
        step.points.push(input.point.clamp_to(client));
    }
    true
}

/// End a brush stroke. A stroke needs two points to count.
fn release_manual(cx: &mut ToolContext<'_>) -> bool {
    let Some(creating) = cx.data.creating.as_mut() else {
        return false;
    };
    let is_brush = creating.mask_step.as_ref().is_some_and(|s| s.tool.is_brush());
    if !is_brush {
        return true;
    }
    if let Some(step) = creating.mask_step.take()
        && step.points.len() > 1
    {
        creating.temp_mask_steps.push(step);
        cx.push_history();
    }
    true
}

/// Rasterize the creating mask's steps into its RLE.
///
/// Finished steps, plus a pending step that is already a shape, are drawn on
/// top of any bitmap the mask already has. A mask with no set pixel is
/// discarded with a warning and `false` is returned.
pub(crate) fn flatten_mask_steps(cx: &mut ToolContext<'_>) -> bool {
    let Some(creating) = cx.data.creating.as_mut() else {
        return false;
    };
    let Shape::Mask(mask) = &creating.object.shape else {
        return false;
    };

    let mut steps = std::mem::take(&mut creating.temp_mask_steps);
    if let Some(step) = creating.mask_step.take() {
        let min_points = if step.tool.is_pen() { MIN_POLYGON_VERTICES } else { 2 };
        if step.points.len() >= min_points {
            steps.push(step);
        }
    }

    let rle = if steps.is_empty() {
        mask.rle.clone()
    } else {
        let existing = mask.bitmap.as_deref();
        steps_to_rle(cx.natural, cx.client, existing, &steps)
    };
    if rle.is_empty() {
        cx.data.creating = None;
        cx.warn(EditorError::DegenerateMask);
        return false;
    }
    creating.object.shape = Shape::Mask(mask_with_bitmap(rle, cx.natural));
    true
}

/// Drop the pending step when finished steps remain.
///
/// Returns `false` when there was nothing to drop this way.
pub(crate) fn cancel_pending_step(creating: &mut CreatingObject) -> bool {
    if creating.mask_step.is_some() && !creating.temp_mask_steps.is_empty() {
        creating.mask_step = None;
        return true;
    }
    false
}

impl ToolHandler for MaskTool {
    fn start_creating(
        &self,
        cx: &mut ToolContext<'_>,
        input: &PointerInput,
        basic: &ObjectBasics,
    ) -> bool {
        let needs_object = cx.data.creating.is_none() || cx.data.active_object_index.is_some();

        if !manual_mode(cx) {
            if needs_object {
                cx.deactivate();
            }
            start_ai_prompt(cx, input);
            return cx.data.prompt.creating_prompt.is_some();
        }

        if needs_object {
            cx.deactivate();
            let shape = Shape::Mask(MaskData::from_rle(Vec::new()));
            let object = basic.apply(AnnotationObject::new(shape));
            cx.data.creating = Some(CreatingObject::new(object));
        }
        press_manual(cx, input)
    }

    fn update_creating(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
        if manual_mode(cx) {
            drag_manual(cx, input)
        } else {
            update_ai_prompt(cx, input)
        }
    }

    fn finish_creating(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
        if manual_mode(cx) {
            release_manual(cx)
        } else {
            let base = cx.data.prompt.prompts_queue.clone();
            finish_ai_prompt(cx, input, base)
        }
    }

    fn start_editing(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
        if cx.data.selected_tool != EditorTool::Mask {
            return false;
        }
        if manual_mode(cx) {
            press_manual(cx, input)
        } else {
            start_ai_prompt(cx, input);
            cx.data.prompt.creating_prompt.is_some()
        }
    }

    fn update_editing(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
        if cx.data.selected_tool != EditorTool::Mask {
            return false;
        }
        self.update_creating(cx, input)
    }

    fn finish_editing(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
        if cx.data.selected_tool != EditorTool::Mask {
            return false;
        }
        self.finish_creating(cx, input)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DrawData, EditState, ModelKind, PromptKind, SubTool};
    use crate::tools::tests::{at, context};
    use crate::tools::ToolEffect;

    fn mask_data(sub_tool: SubTool) -> DrawData {
        DrawData {
            selected_tool: EditorTool::Mask,
            selected_sub_tool: sub_tool,
            ..Default::default()
        }
    }

    fn pending<'a>(cx: &'a ToolContext<'_>) -> &'a CreatingObject {
        cx.data.creating.as_ref().unwrap()
    }

    #[test]
    fn test_pen_closes_near_first_vertex() {
        let tool = MaskTool;
        let mut data = mask_data(SubTool::PenAdd);
        data.prompt.session_id = Some("stale".to_string());
        let mut edit = EditState::default();
        let mut cx = context(&mut data, &mut edit);
        let basic = ObjectBasics::default();

        for (x, y) in [(20.0, 20.0), (80.0, 20.0), (80.0, 80.0), (21.0, 21.0)] {
            assert!(tool.start_creating(&mut cx, &at(x, y), &basic));
            tool.finish_creating(&mut cx, &at(x, y));
        }
        assert!(cx.data.prompt.session_id.is_none());
        assert!(pending(&cx).mask_step.is_none());
        assert_eq!(pending(&cx).temp_mask_steps.len(), 1);
        assert_eq!(pending(&cx).temp_mask_steps[0].points.len(), 3);
    }

    #[test]
    fn test_brush_stroke_needs_two_points() {
        let tool = MaskTool;
        let mut data = mask_data(SubTool::BrushAdd);
        let mut edit = EditState::default();
        let mut cx = context(&mut data, &mut edit);

        tool.start_creating(&mut cx, &at(50.0, 50.0), &ObjectBasics::default());
        tool.finish_creating(&mut cx, &at(50.0, 50.0));
        assert!(!pending(&cx).has_mask_steps());

        tool.start_creating(&mut cx, &at(50.0, 50.0), &ObjectBasics::default());
        tool.update_creating(&mut cx, &at(60.0, 50.0).held());
        tool.update_creating(&mut cx, &at(70.0, 50.0));
        tool.finish_creating(&mut cx, &at(70.0, 50.0));
        assert_eq!(pending(&cx).temp_mask_steps.len(), 1);
        assert_eq!(pending(&cx).temp_mask_steps[0].points.len(), 2);
        assert!(matches!(cx.effects(), [ToolEffect::PushHistory]));
    }

    #[test]
    fn test_flatten_rasterizes_steps() {
        let tool = MaskTool;
        let mut data = mask_data(SubTool::BrushAdd);
        data.brush_size = 10.0;
        let mut edit = EditState::default();
        let mut cx = context(&mut data, &mut edit);

        tool.start_creating(&mut cx, &at(20.0, 100.0), &ObjectBasics::default());
        tool.update_creating(&mut cx, &at(180.0, 100.0).held());
        tool.finish_creating(&mut cx, &at(180.0, 100.0));
        assert!(flatten_mask_steps(&mut cx));

        let creating = pending(&cx);
        assert!(!creating.has_mask_steps());
        match &creating.object.shape {
            Shape::Mask(mask) => {
                assert!(mask.pixel_count() > 1000);
                assert!(mask.bitmap.is_some());
            }
            other => panic!("unexpected shape {:?}", other),
        }
    }

    #[test]
    fn test_erase_only_mask_is_rejected() {
        let tool = MaskTool;
        let mut data = mask_data(SubTool::BrushErase);
        let mut edit = EditState::default();
        let mut cx = context(&mut data, &mut edit);

        tool.start_creating(&mut cx, &at(20.0, 100.0), &ObjectBasics::default());
        tool.update_creating(&mut cx, &at(180.0, 100.0).held());
        tool.finish_creating(&mut cx, &at(180.0, 100.0));
        assert!(!flatten_mask_steps(&mut cx));
        assert!(cx.data.creating.is_none());
        assert!(matches!(
            cx.effects().last(),
            Some(ToolEffect::Warning(EditorError::DegenerateMask))
        ));
    }

    #[test]
    fn test_cancel_drops_only_pending_step() {
        let mut creating = CreatingObject::new(AnnotationObject::new(Shape::Mask(
            MaskData::from_rle(Vec::new()),
        )));
        let start = at(0.0, 0.0).point;
        creating.mask_step = Some(MaskStep::start(SubTool::PenAdd, start, 5.0));
        assert!(!cancel_pending_step(&mut creating));

        creating.temp_mask_steps.push(MaskStep::start(SubTool::PenAdd, start, 5.0));
        assert!(cancel_pending_step(&mut creating));
        assert!(creating.mask_step.is_none());
        assert_eq!(creating.temp_mask_steps.len(), 1);
    }

    #[test]
    fn test_edge_stitch_stroke_requests_stitching() {
        let tool = MaskTool;
        let mut data = mask_data(SubTool::AutoEdgeStitching);
        data.ai_annotation = true;
        let mut edit = EditState::default();
        let mut cx = context(&mut data, &mut edit);

        assert!(tool.start_creating(&mut cx, &at(10.0, 10.0), &ObjectBasics::default()));
        tool.update_creating(&mut cx, &at(40.0, 10.0).held());
        assert!(tool.finish_creating(&mut cx, &at(40.0, 10.0)));
        match cx.effects() {
            [ToolEffect::RequestAi(trigger)] => {
                assert_eq!(trigger.model, ModelKind::MaskEdgeStitching);
                assert_eq!(trigger.prompts[0].kind, PromptKind::EdgeStitch);
                assert_eq!(trigger.prompts[0].stroke.len(), 2);
            }
            other => panic!("unexpected effects {:?}", other),
        }
    }

    #[test]
    fn test_editing_ignored_for_other_tools() {
        let tool = MaskTool;
        let mut data = mask_data(SubTool::PenAdd);
        data.selected_tool = EditorTool::Drag;
        let mut edit = EditState::default();
        let mut cx = context(&mut data, &mut edit);
        assert!(!tool.start_editing(&mut cx, &at(10.0, 10.0)));
    }
}
