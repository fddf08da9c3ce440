//! The in-flight object and its tool scratch state.

use super::geometry::{Point, Size};
use super::object::AnnotationObject;
use super::tool::SubTool;

/// One pen polygon or brush stroke of a mask.
#[derive(Debug, Clone, PartialEq)]
pub struct MaskStep {
    pub tool: SubTool,
    /// Adds pixels (true) or clears them (false)
    pub positive: bool,
    /// Content coordinates
    pub points: Vec<Point>,
    /// Brush width in natural pixels
    pub radius: f32,
}

impl MaskStep {
    /// Start a step for `tool` at `point`.
    pub fn start(tool: SubTool, point: Point, radius: f32) -> Self {
        Self {
            tool,
            positive: tool.is_additive(),
            points: vec![point],
            radius,
        }
    }

    fn rescale(&self, from: Size, to: Size) -> MaskStep {
        MaskStep {
            points: self.points.iter().map(|p| p.rescale(from, to)).collect(),
            ..self.clone()
        }
    }
}

/// The object being created or edited, plus scratch state.
#[derive(Debug, Clone, PartialEq)]
pub struct CreatingObject {
    pub object: AnnotationObject,
    /// Ring being drawn; `None` once every ring is closed
    pub curr_index: Option<usize>,
    /// Drag anchor of rect-like creation
    pub start_point: Option<Point>,
    /// Pending pen or brush step
    pub mask_step: Option<MaskStep>,
    /// Finished steps not yet rasterized
    pub temp_mask_steps: Vec<MaskStep>,
}

impl CreatingObject {
    /// Wrap an object with empty scratch state.
    pub fn new(object: AnnotationObject) -> Self {
        Self {
            object,
            curr_index: None,
            start_point: None,
            mask_step: None,
            temp_mask_steps: Vec::new(),
        }
    }

    /// Builder: set the drag anchor.
    pub fn with_start_point(mut self, point: Point) -> Self {
        self.start_point = Some(point);
        self
    }

    /// True when a mask has manual steps waiting to be rasterized.
    pub fn has_mask_steps(&self) -> bool {
        self.mask_step.is_some() || !self.temp_mask_steps.is_empty()
    }

    /// Copy with content geometry mapped between client sizes.
    pub fn rescale(&self, from: Size, to: Size) -> CreatingObject {
        CreatingObject {
            object: self.object.rescale(from, to),
            curr_index: self.curr_index,
            start_point: self.start_point.map(|p| p.rescale(from, to)),
            mask_step: self.mask_step.as_ref().map(|s| s.rescale(from, to)),
            temp_mask_steps: self.temp_mask_steps.iter().map(|s| s.rescale(from, to)).collect(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::object::{MaskData, Shape};

    #[test]
    fn test_rescale_moves_steps_but_keeps_radius() {
        let mut creating = CreatingObject::new(AnnotationObject::new(Shape::Mask(MaskData::default())));
        creating.mask_step = Some(MaskStep::start(SubTool::BrushErase, Point::new(10.0, 20.0), 8.0));
        let scaled = creating.rescale(Size::new(100.0, 100.0), Size::new(200.0, 200.0));
        let step = scaled.mask_step.unwrap();
        assert_eq!(step.points[0], Point::new(20.0, 40.0));
        assert_eq!(step.radius, 8.0);
        assert!(!step.positive);
    }
}
