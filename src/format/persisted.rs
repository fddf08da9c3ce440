//! The persisted annotation format and its translation to editor objects.
//!
//! Persisted geometry is resolution independent: boxes are normalized to
//! `[0, 1]`, polygon rings and keypoints are in natural pixels and masks are
//! run-length encoded over the natural image. Editor objects live in content
//! coordinates for the current client size, so every translation takes both
//! sizes.

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::error::FormatError;
use crate::color::Rgb;
use crate::mask::mask_with_bitmap;
use crate::model::{
    find_category, AnnotationObject, AttributeValue, Category, Keypoint, KeypointVisibility,
    LabelId, ObjectStatus, Point, PolygonGroup, Rect, RectElement, Shape, Size, SkeletonData,
};

/// Numbers stored per keypoint: `x, y, z, w, visible, conf`.
const KEYPOINT_STRIDE: usize = 6;

// ============================================================================
// Wire Types
// ============================================================================

/// Box normalized by the image size.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct BoundingBox {
    pub xmin: f32,
    pub ymin: f32,
    pub xmax: f32,
    pub ymax: f32,
}

/// Run-length encoded mask over the natural image.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PersistedMask {
    /// `[start, length, ...]` runs
    pub counts: Vec<u32>,
    /// `[height, width]`
    pub size: [u32; 2],
}

/// One stored annotation.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersistedAnnotation {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category_id: Option<LabelId>,
    #[serde(default)]
    pub category_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conf: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<BoundingBox>,
    /// Rings joined by `/`, coordinates by `,`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub segmentation: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mask: Option<PersistedMask>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lines: Option<Vec<usize>>,
    /// Three RGB channel strings per keypoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_colors: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point_names: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub attributes: Option<Vec<Option<AttributeValue>>>,
}

/// Parse a JSON array of annotations.
pub fn load_annotations(json: &str) -> Result<Vec<PersistedAnnotation>, FormatError> {
    Ok(serde_json::from_str(json)?)
}

/// Read and parse an annotation file.
pub fn load_annotations_file(path: &Path) -> Result<Vec<PersistedAnnotation>, FormatError> {
    let json = std::fs::read_to_string(path)?;
    load_annotations(&json)
}

// ============================================================================
// Geometry Helpers
// ============================================================================

fn rect_to_bounding_box(rect: &Rect, client: Size) -> BoundingBox {
    BoundingBox {
        xmin: rect.x / client.width,
        ymin: rect.y / client.height,
        xmax: rect.max_x() / client.width,
        ymax: rect.max_y() / client.height,
    }
}

fn bounding_box_to_rect(bbox: &BoundingBox, client: Size) -> Rect {
    Rect::from_corners(
        bbox.xmin * client.width,
        bbox.ymin * client.height,
        bbox.xmax * client.width,
        bbox.ymax * client.height,
    )
}

/// Parse `"x,y,x,y/x,y,..."` in natural pixels into content rings.
pub fn parse_segmentation(
    segmentation: &str,
    natural: Size,
    client: Size,
) -> Result<Vec<Vec<Point>>, FormatError> {
    segmentation
        .split('/')
        .filter(|ring| !ring.trim().is_empty())
        .map(|ring| {
            let numbers = ring
                .split(',')
                .map(|n| {
                    n.trim().parse::<f32>().map_err(|_| {
                        FormatError::bad_segmentation(format!("'{}' is not a number", n))
                    })
                })
                .collect::<Result<Vec<f32>, FormatError>>()?;
            if numbers.len() % 2 != 0 {
                return Err(FormatError::bad_segmentation(format!(
                    "ring has an odd number of coordinates ({})",
                    numbers.len()
                )));
            }
            Ok(numbers
                .chunks_exact(2)
                .map(|xy| Point::new(xy[0], xy[1]).rescale(natural, client))
                .collect())
        })
        .collect()
}

/// Format content rings as a natural-pixel segmentation string.
pub fn format_segmentation(rings: &[Vec<Point>], client: Size, natural: Size) -> String {
    rings
        .iter()
        .map(|ring| {
            ring.iter()
                .map(|p| p.rescale(client, natural))
                .flat_map(|p| [p.x.to_string(), p.y.to_string()])
                .collect::<Vec<_>>()
                .join(",")
        })
        .collect::<Vec<_>>()
        .join("/")
}

fn keypoints_from_persisted(
    points: &[f32],
    names: &[String],
    colors: &[String],
    natural: Size,
    client: Size,
) -> Vec<Keypoint> {
    points
        .chunks_exact(KEYPOINT_STRIDE)
        .enumerate()
        .map(|(i, values)| Keypoint {
            point: Point::new(values[0], values[1]).rescale(natural, client),
            z: values[2],
            w: values[3],
            visibility: KeypointVisibility::from_value(values[4]),
            conf: values[5],
            name: names.get(i).cloned().unwrap_or_default(),
            color: colors
                .get(i * 3..i * 3 + 3)
                .map_or(Rgb::WHITE, Rgb::from_channel_strings),
        })
        .collect()
}

// ============================================================================
// Translation
// ============================================================================

/// Translate a stored annotation into a committed editor object.
///
/// The geometry kind is inferred in the order mask, skeleton, polygon,
/// rectangle. The color comes from the category; unknown categories fall back
/// to white.
pub fn persisted_to_object(
    annotation: &PersistedAnnotation,
    categories: &[Category],
    client: Size,
    natural: Size,
) -> Result<AnnotationObject, FormatError> {
    if natural.is_empty() {
        return Err(FormatError::MissingDimensions);
    }
    let rect = annotation
        .bounding_box
        .as_ref()
        .map(|bbox| RectElement::new(bounding_box_to_rect(bbox, client)));

    let shape = if let Some(mask) = &annotation.mask {
        let (width, height) = natural.to_pixels();
        let [found_height, found_width] = mask.size;
        if (found_width, found_height) != (width, height) {
            return Err(FormatError::MaskSizeMismatch {
                width,
                height,
                found_width,
                found_height,
            });
        }
        Shape::Mask(mask_with_bitmap(mask.counts.clone(), natural))
    } else if let (Some(points), Some(lines)) = (&annotation.points, &annotation.lines)
        && !points.is_empty()
        && !lines.is_empty()
    {
        let names = annotation.point_names.as_deref().unwrap_or_default();
        let colors = annotation.point_colors.as_deref().unwrap_or_default();
        Shape::Skeleton(SkeletonData {
            rect,
            keypoints: keypoints_from_persisted(points, names, colors, natural, client),
            lines: lines.clone(),
        })
    } else if let Some(segmentation) = &annotation.segmentation {
        let rings = parse_segmentation(segmentation, natural, client)?;
        Shape::Polygon(PolygonGroup::new(rings))
    } else if let Some(rect) = rect {
        Shape::Rectangle(rect)
    } else {
        return Err(FormatError::NoGeometry);
    };

    let category = annotation.category_id.and_then(|id| find_category(categories, id));
    if annotation.category_id.is_some() && category.is_none() {
        log::warn!("⚠️ Unknown category {:?}", annotation.category_id);
    }

    let mut object = AnnotationObject::new(shape)
        .with_review(ObjectStatus::Committed, Some(annotation.conf.unwrap_or(1.0)));
    object.label_id = annotation.category_id;
    object.color = category.map_or(Rgb::WHITE, |c| c.color);
    object.attributes = annotation.attributes.clone().unwrap_or_default();
    Ok(object)
}

/// Translate an editor object into its stored form.
pub fn object_to_persisted(
    object: &AnnotationObject,
    categories: &[Category],
    client: Size,
    natural: Size,
) -> PersistedAnnotation {
    let category_name = object
        .label_id
        .and_then(|id| find_category(categories, id))
        .map(|c| c.name.clone())
        .unwrap_or_default();
    let mut annotation = PersistedAnnotation {
        category_id: object.label_id,
        category_name,
        conf: object.conf,
        attributes: (!object.attributes.is_empty()).then(|| object.attributes.clone()),
        ..Default::default()
    };
    annotation.bounding_box = object
        .shape
        .rect()
        .map(|r| rect_to_bounding_box(&r.rect, client));

    match &object.shape {
        Shape::Rectangle(_) => {}
        Shape::Polygon(group) => {
            annotation.segmentation = Some(format_segmentation(&group.rings, client, natural));
        }
        Shape::Mask(mask) => {
            let (width, height) = natural.to_pixels();
            annotation.mask = Some(PersistedMask {
                counts: mask.rle.clone(),
                size: [height, width],
            });
        }
        Shape::Skeleton(skeleton) => {
            let mut points = Vec::with_capacity(skeleton.keypoints.len() * KEYPOINT_STRIDE);
            let mut names = Vec::with_capacity(skeleton.keypoints.len());
            let mut colors = Vec::with_capacity(skeleton.keypoints.len() * 3);
            for keypoint in &skeleton.keypoints {
                let p = keypoint.point.rescale(client, natural);
                points.extend([p.x, p.y, keypoint.z, keypoint.w]);
                points.extend([keypoint.visibility.value(), keypoint.conf]);
                names.push(keypoint.name.clone());
                colors.extend(keypoint.color.to_channel_strings());
            }
            annotation.points = Some(points);
            annotation.lines = Some(skeleton.lines.clone());
            annotation.point_names = Some(names);
            annotation.point_colors = Some(colors);
        }
    }
    annotation
}

/// Translate committed objects for saving.
///
/// AI candidates awaiting review are left out.
pub fn objects_to_persisted(
    objects: &[AnnotationObject],
    categories: &[Category],
    client: Size,
    natural: Size,
) -> Vec<PersistedAnnotation> {
    objects
        .iter()
        .filter(|o| o.is_committed())
        .map(|o| object_to_persisted(o, categories, client, natural))
        .collect()
}

/// Translate every stored annotation. Invalid entries are skipped with a warning.
pub fn persisted_to_objects(
    annotations: &[PersistedAnnotation],
    categories: &[Category],
    client: Size,
    natural: Size,
) -> Vec<AnnotationObject> {
    annotations
        .iter()
        .enumerate()
        .filter_map(|(i, annotation)| {
            match persisted_to_object(annotation, categories, client, natural) {
                Ok(object) => Some(object),
                Err(e) => {
                    log::warn!("⚠️ Skipping annotation {}: {}", i, e);
                    None
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::template::{body_keypoints, fit_keypoints_to_rect, BODY_LINES};
    use crate::model::ObjectType;

    const EPSILON: f32 = 0.001;
    const NATURAL: Size = Size::new(400.0, 200.0);
    const CLIENT: Size = Size::new(200.0, 100.0);

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn categories() -> Vec<Category> {
        vec![Category::new(7, "car", Rgb::new(255, 0, 0))]
    }

    #[test]
    fn test_bounding_box_is_normalized() {
        let object = AnnotationObject::new(Shape::Rectangle(RectElement::new(Rect::new(
            50.0, 25.0, 100.0, 50.0,
        ))))
        .with_label(7, Rgb::new(255, 0, 0));
        let annotation = object_to_persisted(&object, &categories(), CLIENT, NATURAL);
        assert_eq!(annotation.category_name, "car");
        let bbox = annotation.bounding_box.unwrap();
        assert!(approx_eq(bbox.xmin, 0.25));
        assert!(approx_eq(bbox.ymax, 0.75));

        let json = serde_json::to_value(&annotation).unwrap();
        assert_eq!(json["categoryId"], 7);
        assert!(json.get("segmentation").is_none());
    }

    #[test]
    fn test_segmentation_is_in_natural_pixels() {
        let rings = vec![vec![
            Point::new(10.0, 10.0),
            Point::new(20.0, 10.0),
            Point::new(20.0, 30.0),
        ]];
        assert_eq!(format_segmentation(&rings, CLIENT, NATURAL), "20,20,40,20,40,60");

        let parsed = parse_segmentation("20,20,40,20,40,60/0,0,2,0,2,2", NATURAL, CLIENT).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[0], rings[0]);
    }

    #[test]
    fn test_bad_segmentation_is_rejected() {
        assert!(matches!(
            parse_segmentation("1,2,3", NATURAL, CLIENT),
            Err(FormatError::BadSegmentation { .. })
        ));
        assert!(parse_segmentation("1,x", NATURAL, CLIENT).is_err());
    }

    #[test]
    fn test_type_inference_order() {
        let annotation = PersistedAnnotation {
            bounding_box: Some(BoundingBox {
                xmin: 0.0,
                ymin: 0.0,
                xmax: 0.5,
                ymax: 0.5,
            }),
            segmentation: Some("0,0,100,0,100,100".to_string()),
            ..Default::default()
        };
        let object = persisted_to_object(&annotation, &[], CLIENT, NATURAL).unwrap();
        assert_eq!(object.object_type(), ObjectType::Polygon);
        assert_eq!(object.conf, Some(1.0));
        assert!(object.is_committed());

        let with_mask = PersistedAnnotation {
            mask: Some(PersistedMask {
                counts: vec![0, 10],
                size: [200, 400],
            }),
            ..annotation
        };
        let object = persisted_to_object(&with_mask, &[], CLIENT, NATURAL).unwrap();
        assert_eq!(object.object_type(), ObjectType::Mask);
    }

    #[test]
    fn test_mask_size_must_match_image() {
        let annotation = PersistedAnnotation {
            mask: Some(PersistedMask {
                counts: vec![0, 10],
                size: [10, 10],
            }),
            ..Default::default()
        };
        assert!(matches!(
            persisted_to_object(&annotation, &[], CLIENT, NATURAL),
            Err(FormatError::MaskSizeMismatch {
                found_width: 10,
                ..
            })
        ));
    }

    #[test]
    fn test_annotation_without_geometry_is_rejected() {
        let annotation = PersistedAnnotation::default();
        assert!(matches!(
            persisted_to_object(&annotation, &[], CLIENT, NATURAL),
            Err(FormatError::NoGeometry)
        ));
    }

    #[test]
    fn test_skeleton_keeps_keypoint_details() {
        let rect = Rect::new(10.0, 10.0, 60.0, 80.0);
        let skeleton = SkeletonData {
            rect: Some(RectElement::new(rect)),
            keypoints: fit_keypoints_to_rect(&body_keypoints(), &rect),
            lines: BODY_LINES.to_vec(),
        };
        let object = AnnotationObject::new(Shape::Skeleton(skeleton.clone()));
        let annotation = object_to_persisted(&object, &[], CLIENT, NATURAL);
        assert_eq!(annotation.points.as_ref().unwrap().len(), 17 * KEYPOINT_STRIDE);
        assert_eq!(annotation.point_colors.as_ref().unwrap().len(), 17 * 3);

        let restored = persisted_to_object(&annotation, &[], CLIENT, NATURAL).unwrap();
        let Shape::Skeleton(restored) = restored.shape else {
            panic!("not a skeleton");
        };
        assert_eq!(restored.lines, skeleton.lines);
        for (a, b) in restored.keypoints.iter().zip(&skeleton.keypoints) {
            assert_eq!(a.name, b.name);
            assert_eq!(a.color, b.color);
            assert_eq!(a.visibility, b.visibility);
            assert!(approx_eq(a.point.x, b.point.x) && approx_eq(a.point.y, b.point.y));
        }
    }

    #[test]
    fn test_candidates_are_not_saved() {
        let rect = Shape::Rectangle(RectElement::new(Rect::new(0.0, 0.0, 10.0, 10.0)));
        let objects = vec![
            AnnotationObject::new(rect.clone()),
            AnnotationObject::new(rect).with_review(ObjectStatus::Checked, Some(0.4)),
        ];
        assert_eq!(objects_to_persisted(&objects, &[], CLIENT, NATURAL).len(), 1);
    }

    #[test]
    fn test_invalid_entries_are_skipped() {
        let json = r#"[
            {"categoryId": 7, "categoryName": "car",
             "boundingBox": {"xmin": 0.1, "ymin": 0.1, "xmax": 0.2, "ymax": 0.3}},
            {"categoryName": "empty"}
        ]"#;
        let annotations = load_annotations(json).unwrap();
        let objects = persisted_to_objects(&annotations, &categories(), CLIENT, NATURAL);
        assert_eq!(objects.len(), 1);
        assert_eq!(objects[0].color, Rgb::new(255, 0, 0));
        let rect = objects[0].shape.rect().unwrap().rect;
        assert!(approx_eq(rect.x, 20.0) && approx_eq(rect.height, 20.0));
    }
}
