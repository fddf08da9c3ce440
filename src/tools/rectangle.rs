//! Rectangle tool: drag out a box, or a visual prompt box in AI mode.

use super::{
    finish_element_edit, start_element_edit, update_rect_edit, ObjectBasics, PointerInput,
    ToolContext, ToolEffect, ToolHandler,
};
use crate::ai::AiTrigger;
use crate::constants::MIN_RECT_SIZE;
use crate::error::EditorError;
use crate::model::geometry::rect_from_points;
use crate::model::{
    AnnotationObject, CreatingObject, ModelKind, ObjectType, PromptItem, Rect, RectElement, Shape,
    SubTool,
};

/// Check the creating box before an explicit commit.
///
/// A box without area is discarded with a warning and `false` is returned.
pub(crate) fn check_rect_commit(cx: &mut ToolContext<'_>) -> bool {
    let has_area = cx.data.creating.as_ref().is_some_and(|creating| {
        creating
            .object
            .shape
            .rect()
            .is_some_and(|r| r.rect.width > MIN_RECT_SIZE && r.rect.height > MIN_RECT_SIZE)
    });
    if !has_area {
        cx.data.creating = None;
        cx.warn(EditorError::DegenerateRect);
    }
    has_area
}

/// Box drawing and editing.
#[derive(Debug, Default)]
pub struct RectangleTool;

fn uses_visual_prompt(cx: &ToolContext<'_>) -> bool {
    cx.data.ai_annotation && cx.data.current_model() == Some(ModelKind::VisualPrompt)
}

impl ToolHandler for RectangleTool {
    fn start_creating(
        &self,
        cx: &mut ToolContext<'_>,
        input: &PointerInput,
        basic: &ObjectBasics,
    ) -> bool {
        if uses_visual_prompt(cx) {
            let positive = cx.data.selected_sub_tool != SubTool::NegativeVisualPrompt;
            cx.data.prompt.creating_prompt = Some(PromptItem::rect_from(input.point, positive));
            return true;
        }
        cx.deactivate();
        let p = input.point;
        let rect = RectElement::new(Rect::new(p.x, p.y, 0.0, 0.0));
        let object = basic.apply(AnnotationObject::new(Shape::Rectangle(rect)));
        cx.data.creating = Some(CreatingObject::new(object).with_start_point(p));
        true
    }

    fn update_creating(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
        let client = cx.client;
        if uses_visual_prompt(cx)
            && let Some(prompt) = cx.data.prompt.creating_prompt.as_mut()
        {
            if let Some(start) = prompt.start_point {
                prompt.rect = Some(rect_from_points(start, input.point, client));
            }
            return true;
        }
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
        let end = input.point.clamp_to(cx.client);

        if uses_visual_prompt(cx) {
            let Some(mut prompt) = cx.data.prompt.creating_prompt.take() else {
                return false;
            };
            let Some(start) = prompt.start_point else {
                return false;
            };
            if end.x == start.x || end.y == start.y {
                return true;
            }
            prompt.rect = Some(rect_from_points(start, end, cx.client));
            cx.data.prompt.creating_prompt = Some(prompt.clone());
            let mut prompts = cx.data.prompt.prompts_queue.clone();
            prompts.push(prompt);
            let trigger = AiTrigger::new(ObjectType::Rectangle, ModelKind::VisualPrompt, prompts);
            cx.emit(ToolEffect::RequestAi(trigger));
            return true;
        }

        let Some(creating) = cx.data.creating.take() else {
            return false;
        };
        let Some(start) = creating.start_point else {
            return false;
        };
        let rect = rect_from_points(start, end, cx.client);
        if rect.width <= MIN_RECT_SIZE || rect.height <= MIN_RECT_SIZE {
            cx.warn(EditorError::DegenerateRect);
            return true;
        }
        let mut object = creating.object;
        object.shape = Shape::Rectangle(RectElement::new(rect));
        object.commit();
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
        update_rect_edit(cx, input)
    }

    fn finish_editing(&self, cx: &mut ToolContext<'_>, _input: &PointerInput) -> bool {
        finish_element_edit(cx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{DrawData, EditState, EditorTool, ObjectStatus};
    use crate::tools::tests::{at, context};

    fn rect_tool_data() -> DrawData {
        DrawData {
            selected_tool: EditorTool::Rectangle,
            ..Default::default()
        }
    }

    #[test]
    fn test_drag_commits_rectangle() {
        let tool = RectangleTool;
        let mut data = rect_tool_data();
        let mut edit = EditState::default();
        let mut cx = context(&mut data, &mut edit);
        let basic = ObjectBasics {
            label_id: Some(3),
            ..Default::default()
        };

        assert!(tool.start_creating(&mut cx, &at(10.0, 10.0), &basic));
        assert!(tool.update_creating(&mut cx, &at(60.0, 40.0).held()));
        let live = cx.data.creating.as_ref().unwrap().object.shape.rect().unwrap().rect;
        assert_eq!(live, Rect::new(10.0, 10.0, 50.0, 30.0));

        assert!(tool.finish_creating(&mut cx, &at(60.0, 40.0)));
        assert!(cx.data.creating.is_none());
        match cx.effects() {
            [ToolEffect::AddObject(object)] => {
                assert_eq!(object.label_id, Some(3));
                assert_eq!(object.status, ObjectStatus::Committed);
                assert_eq!(object.conf, Some(1.0));
                assert_eq!(object.shape.rect().unwrap().rect, Rect::new(10.0, 10.0, 50.0, 30.0));
            }
            other => panic!("unexpected effects {:?}", other),
        }
    }

    #[test]
    fn test_click_without_drag_is_discarded() {
        let tool = RectangleTool;
        let mut data = rect_tool_data();
        let mut edit = EditState::default();
        let mut cx = context(&mut data, &mut edit);

        tool.start_creating(&mut cx, &at(10.0, 10.0), &ObjectBasics::default());
        assert!(tool.finish_creating(&mut cx, &at(10.0, 50.0)));
        assert!(cx.data.creating.is_none());
        assert!(matches!(
            cx.effects(),
            [ToolEffect::Warning(EditorError::DegenerateRect)]
        ));
    }

    #[test]
    fn test_visual_prompt_box_requests_detection() {
        let tool = RectangleTool;
        let mut data = rect_tool_data();
        data.ai_annotation = true;
        data.selected_model.rectangle = ModelKind::VisualPrompt;
        data.selected_sub_tool = SubTool::NegativeVisualPrompt;
        let mut edit = EditState::default();
        let mut cx = context(&mut data, &mut edit);

        tool.start_creating(&mut cx, &at(10.0, 10.0), &ObjectBasics::default());
        assert!(cx.data.creating.is_none());
        tool.update_creating(&mut cx, &at(30.0, 30.0).held());
        assert!(tool.finish_creating(&mut cx, &at(30.0, 30.0)));

        match cx.effects() {
            [ToolEffect::RequestAi(trigger)] => {
                assert_eq!(trigger.model, ModelKind::VisualPrompt);
                assert_eq!(trigger.prompts.len(), 1);
                assert!(!trigger.prompts[0].is_positive);
                assert_eq!(trigger.prompts[0].rect, Some(Rect::new(10.0, 10.0, 20.0, 20.0)));
            }
            other => panic!("unexpected effects {:?}", other),
        }
    }
}
