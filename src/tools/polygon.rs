//! Polygon tool: click out rings by hand, or segment by prompts in AI mode.

use super::{
    commit_creating_edit, finish_ai_prompt, start_ai_prompt, start_element_edit,
    update_ai_prompt, ObjectBasics, PointerInput, ToolContext, ToolEffect, ToolHandler,
};
use crate::constants::{MIN_POLYGON_VERTICES, POINT_HIT_RADIUS};
use crate::error::EditorError;
use crate::model::geometry::{move_ring, point_near};
use crate::model::{
    AnnotationObject, CreatingObject, FocusElement, Point, PolygonGroup, PromptItem, Shape,
};

/// Polygon drawing and editing.
#[derive(Debug, Default)]
pub struct PolygonTool;

fn rings_mut(creating: &mut CreatingObject) -> Option<&mut Vec<Vec<Point>>> {
    match &mut creating.object.shape {
        Shape::Polygon(group) => Some(&mut group.rings),
        _ => None,
    }
}

/// Remove rings that cannot form an area, warning about them.
///
/// Returns `false` when no ring is left.
pub(crate) fn drop_small_rings(cx: &mut ToolContext<'_>, group: &mut PolygonGroup) -> bool {
    let mut rejected = None;
    group.rings.retain(|ring| {
        let keep = ring.len() >= MIN_POLYGON_VERTICES;
        if !keep {
            rejected = Some(ring.len());
        }
        keep
    });
    if let Some(vertices) = rejected {
        cx.warn(EditorError::polygon_too_small(vertices, MIN_POLYGON_VERTICES));
    }
    !group.rings.is_empty()
}

/// Turn the creating polygon into a finished object.
///
/// Rings that are too small are dropped with a warning; nothing is added when
/// no ring survives.
pub(crate) fn commit_polygon(cx: &mut ToolContext<'_>) -> bool {
    let Some(creating) = cx.data.creating.take() else {
        return false;
    };
    let mut object = creating.object;
    let Shape::Polygon(group) = &mut object.shape else {
        return false;
    };
    if !drop_small_rings(cx, group) {
        return true;
    }
    object.commit();
    cx.emit(ToolEffect::AddObject(object));
    true
}

impl PolygonTool {
    /// Prompts sent with a new AI prompt: the queue, or the rings of the
    /// current polygon when no session exists yet.
    fn base_prompts(cx: &ToolContext<'_>) -> Vec<PromptItem> {
        if !cx.data.prompt.prompts_queue.is_empty() {
            return cx.data.prompt.prompts_queue.clone();
        }
        if cx.data.prompt.session_id.is_none()
            && let Some(creating) = &cx.data.creating
            && let Shape::Polygon(group) = &creating.object.shape
        {
            return vec![PromptItem::modify(group.rings.clone())];
        }
        Vec::new()
    }

    fn finish_ai(cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
        let base = Self::base_prompts(cx);
        finish_ai_prompt(cx, input, base)
    }
}

impl ToolHandler for PolygonTool {
    fn start_creating(
        &self,
        cx: &mut ToolContext<'_>,
        input: &PointerInput,
        basic: &ObjectBasics,
    ) -> bool {
        let ai = cx.data.ai_annotation;
        let p = input.point;

        if cx.data.creating.is_none() || cx.data.active_object_index.is_some() {
            cx.deactivate();
            if ai {
                start_ai_prompt(cx, input);
            } else {
                let group = PolygonGroup::new(vec![vec![p]]);
                let mut creating =
                    CreatingObject::new(basic.apply(AnnotationObject::new(Shape::Polygon(group))));
                creating.curr_index = Some(0);
                cx.data.creating = Some(creating);
                cx.push_history();
            }
            return true;
        }

        if ai {
            start_ai_prompt(cx, input);
            return true;
        }

        let Some(creating) = cx.data.creating.as_mut() else {
            return false;
        };
        let curr_index = creating.curr_index;
        let Some(rings) = rings_mut(creating) else {
            return false;
        };
        let next_index = match curr_index.and_then(|i| rings.get_mut(i).map(|ring| (i, ring))) {
            Some((i, ring)) => {
                let closes = ring.len() >= MIN_POLYGON_VERTICES
                    && ring.first().is_some_and(|first| point_near(*first, p, POINT_HIT_RADIUS));
                if closes {
                    None
                } else {
                    ring.push(p);
                    Some(i)
                }
            }
            None => {
                rings.push(vec![p]);
                Some(rings.len() - 1)
            }
        };
        creating.curr_index = next_index;
        cx.push_history();
        true
    }

    fn update_creating(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
        if cx.data.ai_annotation {
            return update_ai_prompt(cx, input);
        }
        cx.data.creating.is_some()
    }

    fn finish_creating(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
        if cx.data.ai_annotation {
            return Self::finish_ai(cx, input);
        }
        let closed = cx.data.creating.as_ref().is_some_and(|c| c.curr_index.is_none());
        if !closed {
            return false;
        }
        // Alt keeps the polygon open; the next press starts another ring
        if input.alt {
            log::debug!("Ring closed, polygon kept open for another ring");
            return true;
        }
        commit_polygon(cx)
    }

    fn start_editing(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
        if cx.data.ai_annotation {
            start_ai_prompt(cx, input);
            return true;
        }
        if input.is_right() {
            return false;
        }
        start_element_edit(cx, input)
    }

    fn update_editing(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
        if cx.data.ai_annotation {
            return update_ai_prompt(cx, input);
        }
        let Some(start) = &cx.edit.start_element_move_point else {
            return false;
        };
        let Some(creating) = cx.data.creating.as_mut() else {
            return false;
        };
        let Some(rings) = rings_mut(creating) else {
            return false;
        };
        match cx.edit.focus_element {
            Some(FocusElement::PolygonVertex { ring, vertex }) => {
                let Some(point) = rings.get_mut(ring).and_then(|r| r.get_mut(vertex)) else {
                    return false;
                };
                *point = input.point.clamp_to(cx.client);
            }
            Some(FocusElement::PolygonInside { ring }) => {
                let Shape::Polygon(origin) = &start.origin.shape else {
                    return false;
                };
                let (Some(target), Some(original)) = (rings.get_mut(ring), origin.rings.get(ring))
                else {
                    return false;
                };
                *target = move_ring(original, start.mouse, input.point, cx.client);
            }
            _ => return false,
        }
        cx.edit.element_moved = input.point != start.mouse;
        true
    }

    fn finish_editing(&self, cx: &mut ToolContext<'_>, input: &PointerInput) -> bool {
        if cx.data.ai_annotation {
            return Self::finish_ai(cx, input);
        }
        if let Some(start) = cx.edit.start_element_move_point.take() {
            let moved = cx.edit.element_moved;
            let clicked_vertex = match cx.edit.focus_element {
                Some(FocusElement::PolygonVertex { ring, vertex }) if !moved => Some((ring, vertex)),
                _ => None,
            };
            let origin_len = |ring: usize| match &start.origin.shape {
                Shape::Polygon(group) => group.rings.get(ring).map_or(0, Vec::len),
                _ => 0,
            };
            if let Some((ring, vertex)) = clicked_vertex
                && let Some(rings) = cx.data.creating.as_mut().and_then(rings_mut)
                && let Some(points) = rings.get_mut(ring)
                && points.len() == origin_len(ring)
                && points.len() > MIN_POLYGON_VERTICES
            {
                // A click on a vertex without dragging removes it
                points.remove(vertex);
                cx.edit.focus_element = None;
                commit_creating_edit(cx);
            } else if moved || clicked_vertex.is_some() {
                commit_creating_edit(cx);
            }
        }
        cx.edit.clear_drag();
        true
    }
}
