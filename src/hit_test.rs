//! Hit-testing of objects and their elements under the cursor.
//!
//! All points are in content coordinates. Masks are sampled through their
//! natural-resolution bitmap.

use crate::constants::{POINT_HIT_RADIUS, RECT_HIT_EXPAND};
use crate::mask::sample_bitmap;
use crate::model::geometry::{point_in_ring, point_near, point_on_segment, ring_edges};
use crate::model::{
    AnnotationObject, DrawData, EditorTool, FocusElement, KeypointVisibility, ObjectStatus, Point,
    Shape, Size,
};

/// Which objects may receive focus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FocusFilter {
    #[default]
    All,
    /// Batch review with Ctrl held: pick rejected candidates to re-check them
    UncheckedOnly,
    /// Batch review: skip rejected candidates
    ReviewedOnly,
}

impl FocusFilter {
    /// Filter for the current review state.
    pub fn for_state(data: &DrawData, ctrl_pressed: bool) -> Self {
        if !data.is_batch_editing {
            FocusFilter::All
        } else if data.selected_tool == EditorTool::Rectangle && ctrl_pressed {
            FocusFilter::UncheckedOnly
        } else {
            FocusFilter::ReviewedOnly
        }
    }

    /// True when `object` passes the filter.
    pub fn accepts(&self, object: &AnnotationObject) -> bool {
        match self {
            FocusFilter::All => true,
            FocusFilter::UncheckedOnly => object.status == ObjectStatus::Unchecked,
            FocusFilter::ReviewedOnly => object.status != ObjectStatus::Unchecked,
        }
    }
}

/// True when `p` hits the object.
///
/// `client` and `natural` are needed to map content points onto mask bitmaps.
pub fn object_hit(object: &AnnotationObject, p: Point, client: Size, natural: Size) -> bool {
    if object.hidden {
        return false;
    }
    match &object.shape {
        Shape::Rectangle(r) => r.rect.expand(RECT_HIT_EXPAND).contains(p),
        Shape::Polygon(group) => group.rings.iter().any(|ring| {
            point_in_ring(ring, p)
                || ring.iter().any(|v| point_near(*v, p, POINT_HIT_RADIUS))
                || ring_edges(ring).any(|(a, b)| point_on_segment(p, a, b))
        }),
        Shape::Mask(mask) => mask
            .bitmap
            .as_ref()
            .is_some_and(|bitmap| sample_bitmap(bitmap, p.rescale(client, natural))),
        Shape::Skeleton(skeleton) => skeleton.hit_bounds().is_some_and(|bounds| bounds.contains(p)),
    }
}

/// Element of `object` under `p`.
///
/// Order: visible keypoints, polygon vertices, polygon edges, polygon
/// interiors, then the rectangle expanded by the hit band.
pub fn element_hit(object: &AnnotationObject, p: Point) -> Option<FocusElement> {
    if object.hidden {
        return None;
    }

    if let Shape::Skeleton(skeleton) = &object.shape {
        let keypoint = skeleton.keypoints.iter().position(|k| {
            k.visibility == KeypointVisibility::LabeledVisible && point_near(k.point, p, POINT_HIT_RADIUS)
        });
        if let Some(index) = keypoint {
            return Some(FocusElement::Keypoint(index));
        }
    }

    if let Shape::Polygon(group) = &object.shape
        && group.visible
    {
        for (ring_index, ring) in group.rings.iter().enumerate() {
            if let Some(vertex) = ring.iter().position(|v| point_near(*v, p, POINT_HIT_RADIUS)) {
                return Some(FocusElement::PolygonVertex {
                    ring: ring_index,
                    vertex,
                });
            }
        }
        for (ring_index, ring) in group.rings.iter().enumerate() {
            if let Some(edge) = ring_edges(ring).position(|(a, b)| point_on_segment(p, a, b)) {
                return Some(FocusElement::PolygonEdge {
                    ring: ring_index,
                    edge,
                });
            }
        }
        if let Some(ring) = group.rings.iter().position(|ring| point_in_ring(ring, p)) {
            return Some(FocusElement::PolygonInside { ring });
        }
    }

    object
        .shape
        .rect()
        .filter(|r| r.rect.expand(RECT_HIT_EXPAND).contains(p))
        .map(|_| FocusElement::Rect)
}

/// Topmost object under `p`: the active object wins, then reverse list order.
pub fn focus_on_object(
    objects: &[AnnotationObject],
    active: Option<usize>,
    p: Point,
    client: Size,
    natural: Size,
    filter: FocusFilter,
) -> Option<usize> {
    let hits = |index: usize| {
        objects
            .get(index)
            .is_some_and(|o| filter.accepts(o) && object_hit(o, p, client, natural))
    };
    if let Some(index) = active
        && hits(index)
    {
        return Some(index);
    }
    (0..objects.len()).rev().find(|&i| hits(i))
}

/// Every object under `p`, topmost first.
pub fn focus_on_all_objects(
    objects: &[AnnotationObject],
    p: Point,
    client: Size,
    natural: Size,
    filter: FocusFilter,
) -> Vec<usize> {
    (0..objects.len())
        .rev()
        .filter(|&i| filter.accepts(&objects[i]) && object_hit(&objects[i], p, client, natural))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mask::mask_with_bitmap;
    use crate::model::{MaskData, PolygonGroup, Rect, RectElement};
    use proptest::prelude::*;

    const SIZE: Size = Size::new(100.0, 100.0);

    fn rect_object(x: f32, y: f32, w: f32, h: f32) -> AnnotationObject {
        AnnotationObject::new(Shape::Rectangle(RectElement::new(Rect::new(x, y, w, h))))
    }

    fn triangle() -> AnnotationObject {
        AnnotationObject::new(Shape::Polygon(PolygonGroup::new(vec![vec![
            Point::new(10.0, 10.0),
            Point::new(50.0, 10.0),
            Point::new(30.0, 50.0),
        ]])))
    }

    #[test]
    fn test_rect_hit_band() {
        let rect = rect_object(20.0, 20.0, 10.0, 10.0);
        assert!(object_hit(&rect, Point::new(13.0, 25.0), SIZE, SIZE));
        assert!(!object_hit(&rect, Point::new(11.0, 25.0), SIZE, SIZE));
    }

    #[test]
    fn test_hidden_objects_never_hit() {
        let mut rect = rect_object(0.0, 0.0, 50.0, 50.0);
        rect.hidden = true;
        assert!(!object_hit(&rect, Point::new(25.0, 25.0), SIZE, SIZE));
        assert_eq!(element_hit(&rect, Point::new(25.0, 25.0)), None);
    }

    #[test]
    fn test_polygon_element_order() {
        let poly = triangle();
        assert_eq!(
            element_hit(&poly, Point::new(11.0, 11.0)),
            Some(FocusElement::PolygonVertex { ring: 0, vertex: 0 })
        );
        assert_eq!(
            element_hit(&poly, Point::new(30.0, 10.0)),
            Some(FocusElement::PolygonEdge { ring: 0, edge: 0 })
        );
        assert_eq!(
            element_hit(&poly, Point::new(30.0, 25.0)),
            Some(FocusElement::PolygonInside { ring: 0 })
        );
        assert_eq!(element_hit(&poly, Point::new(80.0, 80.0)), None);
    }

    #[test]
    fn test_mask_hit_samples_bitmap_in_natural_space() {
        let natural = Size::new(10.0, 10.0);
        let client = Size::new(100.0, 100.0);
        // First row of the natural image is set
        let mask = mask_with_bitmap(vec![0, 10], natural);
        let object = AnnotationObject::new(Shape::Mask(mask));
        assert!(object_hit(&object, Point::new(55.0, 5.0), client, natural));
        assert!(!object_hit(&object, Point::new(55.0, 15.0), client, natural));

        let without_bitmap = AnnotationObject::new(Shape::Mask(MaskData::from_rle(vec![0, 10])));
        assert!(!object_hit(&without_bitmap, Point::new(5.0, 5.0), client, natural));
    }

    #[test]
    fn test_active_object_wins_then_topmost() {
        let objects = vec![rect_object(0.0, 0.0, 50.0, 50.0), rect_object(10.0, 10.0, 50.0, 50.0)];
        let p = Point::new(20.0, 20.0);
        assert_eq!(focus_on_object(&objects, None, p, SIZE, SIZE, FocusFilter::All), Some(1));
        assert_eq!(focus_on_object(&objects, Some(0), p, SIZE, SIZE, FocusFilter::All), Some(0));
        assert_eq!(focus_on_all_objects(&objects, p, SIZE, SIZE, FocusFilter::All), vec![1, 0]);
    }

    #[test]
    fn test_batch_filters() {
        let mut unchecked = rect_object(0.0, 0.0, 50.0, 50.0);
        unchecked.status = ObjectStatus::Unchecked;
        let checked = rect_object(0.0, 0.0, 50.0, 50.0).with_review(ObjectStatus::Checked, Some(0.9));
        let objects = vec![unchecked, checked];
        let p = Point::new(5.0, 5.0);

        let mut data = DrawData {
            is_batch_editing: true,
            selected_tool: EditorTool::Rectangle,
            ..Default::default()
        };
        let ctrl = FocusFilter::for_state(&data, true);
        assert_eq!(ctrl, FocusFilter::UncheckedOnly);
        assert_eq!(focus_on_all_objects(&objects, p, SIZE, SIZE, ctrl), vec![0]);

        let review = FocusFilter::for_state(&data, false);
        assert_eq!(focus_on_all_objects(&objects, p, SIZE, SIZE, review), vec![1]);

        data.is_batch_editing = false;
        assert_eq!(FocusFilter::for_state(&data, true), FocusFilter::All);
    }

    proptest! {
        #[test]
        fn prop_rect_hit_matches_expanded_bounds(
            x in 0.0f32..80.0,
            y in 0.0f32..80.0,
            w in 1.0f32..20.0,
            h in 1.0f32..20.0,
            px in -10.0f32..110.0,
            py in -10.0f32..110.0,
        ) {
            let object = rect_object(x, y, w, h);
            let p = Point::new(px, py);
            let expected = px >= x - RECT_HIT_EXPAND
                && px <= x + w + RECT_HIT_EXPAND
                && py >= y - RECT_HIT_EXPAND
                && py <= y + h + RECT_HIT_EXPAND;
            prop_assert_eq!(object_hit(&object, p, SIZE, SIZE), expected);
        }
    }
}
