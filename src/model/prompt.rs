//! AI prompt state: the prompt being drawn, the queue of finished prompts and the
//! model session.

use super::geometry::{Point, Rect, Size};
use super::object::rescale_rings;

/// Kind of AI prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptKind {
    Rect,
    Point,
    Stroke,
    EdgeStitch,
    /// Existing polygon rings sent for refinement
    Modify,
}

/// A single prompt, in content coordinates.
#[derive(Debug, Clone, PartialEq)]
pub struct PromptItem {
    pub kind: PromptKind,
    pub is_positive: bool,
    /// Press position while the prompt is being drawn
    pub start_point: Option<Point>,
    pub rect: Option<Rect>,
    pub point: Option<Point>,
    pub stroke: Vec<Point>,
    /// Stroke radius in natural pixels
    pub radius: Option<f32>,
    pub polygons: Vec<Vec<Point>>,
}

impl PromptItem {
    fn empty(kind: PromptKind, is_positive: bool) -> Self {
        Self {
            kind,
            is_positive,
            start_point: None,
            rect: None,
            point: None,
            stroke: Vec::new(),
            radius: None,
            polygons: Vec::new(),
        }
    }

    /// Box prompt in progress, anchored at `start`.
    pub fn rect_from(start: Point, is_positive: bool) -> Self {
        Self {
            start_point: Some(start),
            rect: Some(Rect::new(start.x, start.y, 0.0, 0.0)),
            ..Self::empty(PromptKind::Rect, is_positive)
        }
    }

    /// Finished box prompt.
    pub fn rect(rect: Rect, is_positive: bool) -> Self {
        Self {
            rect: Some(rect),
            ..Self::empty(PromptKind::Rect, is_positive)
        }
    }

    /// Click prompt.
    pub fn point(point: Point, is_positive: bool) -> Self {
        Self {
            start_point: Some(point),
            point: Some(point),
            ..Self::empty(PromptKind::Point, is_positive)
        }
    }

    /// Stroke prompt started at `start`.
    pub fn stroke(start: Point, radius: f32, is_positive: bool) -> Self {
        Self {
            start_point: Some(start),
            stroke: vec![start],
            radius: Some(radius),
            ..Self::empty(PromptKind::Stroke, is_positive)
        }
    }

    /// Edge-stitching stroke started at `start`.
    pub fn edge_stitch(start: Point, radius: f32) -> Self {
        Self {
            kind: PromptKind::EdgeStitch,
            ..Self::stroke(start, radius, true)
        }
    }

    /// Existing rings submitted for refinement.
    pub fn modify(polygons: Vec<Vec<Point>>) -> Self {
        Self {
            polygons,
            ..Self::empty(PromptKind::Modify, true)
        }
    }

    /// Copy with geometry mapped between client sizes.
    pub fn rescale(&self, from: Size, to: Size) -> PromptItem {
        PromptItem {
            start_point: self.start_point.map(|p| p.rescale(from, to)),
            rect: self.rect.map(|r| r.rescale(from, to)),
            point: self.point.map(|p| p.rescale(from, to)),
            stroke: self.stroke.iter().map(|p| p.rescale(from, to)).collect(),
            polygons: rescale_rings(&self.polygons, from, to),
            ..self.clone()
        }
    }
}

/// Prompt-related state of the current image.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PromptState {
    /// Server-side session of the last AI response
    pub session_id: Option<String>,
    pub creating_prompt: Option<PromptItem>,
    pub prompts_queue: Vec<PromptItem>,
    /// Region shaded while a box request is in flight
    pub active_rect_while_loading: Option<Rect>,
}

impl PromptState {
    /// Copy with geometry mapped between client sizes.
    pub fn rescale(&self, from: Size, to: Size) -> PromptState {
        PromptState {
            session_id: self.session_id.clone(),
            creating_prompt: self.creating_prompt.as_ref().map(|p| p.rescale(from, to)),
            prompts_queue: self.prompts_queue.iter().map(|p| p.rescale(from, to)).collect(),
            active_rect_while_loading: self.active_rect_while_loading.map(|r| r.rescale(from, to)),
        }
    }
}
