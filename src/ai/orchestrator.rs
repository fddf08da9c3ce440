//! Building model requests from editor state and folding results back in.
//!
//! Prompts and objects live in content coordinates; everything sent to or
//! received from the service is in natural pixels. The conversion happens here
//! and nowhere else in the AI layer.

use super::contract::{
    DetectionResult, MaskSegmentResult, MasksResult, ModelRequest, PolygonSegmentResult,
    PoseContext, PoseResult, SegmentEverythingParams, TaskStatusResponse, VisualPromptResult,
    WireMask, WirePrompt, WirePromptType,
};
use super::error::AiError;
use crate::color::{palette_color, Rgb};
use crate::constants::{MIN_POLYGON_VERTICES, VISUAL_PROMPT_CONFIDENCE};
use crate::mask::mask_with_bitmap;
use crate::model::template::{body_keypoints, BODY_LINES};
use crate::model::{
    AnnotationObject, CreatingObject, DrawData, EditorTool, Keypoint, KeypointVisibility,
    LabelId, ModelKind, ObjectStatus, ObjectType, Point, PolygonGroup, PromptItem, PromptKind,
    Rect, RectElement, Shape, Size, SkeletonData, SubTool,
};

// ============================================================================
// Triggers and Requests
// ============================================================================

/// What to ask the model service, in editor terms.
#[derive(Debug, Clone, PartialEq)]
pub struct AiTrigger {
    /// Object type the results become
    pub object_type: ObjectType,
    pub model: ModelKind,
    /// Prompts in content coordinates
    pub prompts: Vec<PromptItem>,
    /// Detection text prompt
    pub text: Option<String>,
    pub everything: Option<SegmentEverythingParams>,
}

impl AiTrigger {
    /// Trigger for `model` with the given prompts.
    pub fn new(object_type: ObjectType, model: ModelKind, prompts: Vec<PromptItem>) -> Self {
        Self {
            object_type,
            model,
            prompts,
            text: None,
            everything: None,
        }
    }

    /// Text-prompted box detection.
    pub fn detection(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(ObjectType::Rectangle, ModelKind::Detection, Vec::new())
        }
    }

    /// Pose estimation over the whole image.
    pub fn pose() -> Self {
        Self::new(ObjectType::Skeleton, ModelKind::Pose, Vec::new())
    }

    /// Automatic masks for the whole image.
    pub fn segment_everything(params: SegmentEverythingParams) -> Self {
        Self {
            everything: Some(params),
            ..Self::new(ObjectType::Mask, ModelKind::SegmentEverything, Vec::new())
        }
    }

    /// Trigger for the selected tool, resolving mask sub-tools to their model.
    ///
    /// Returns `None` for the Drag tool.
    pub fn for_selected_tool(data: &DrawData, prompts: Vec<PromptItem>) -> Option<Self> {
        let object_type = data.selected_tool.object_type()?;
        let model = match (data.selected_tool, data.selected_sub_tool) {
            (EditorTool::Mask, SubTool::AutoEdgeStitching) => ModelKind::MaskEdgeStitching,
            (EditorTool::Mask, SubTool::AutoSegmentEverything) => ModelKind::SegmentEverything,
            _ => data.current_model()?,
        };
        let mut trigger = Self::new(object_type, model, prompts);
        if model == ModelKind::SegmentEverything {
            trigger.everything = Some(SegmentEverythingParams::default());
        }
        Some(trigger)
    }
}

/// A built request, ready for a transport.
#[derive(Debug, Clone, PartialEq)]
pub struct AiRequest {
    pub trigger: AiTrigger,
    pub body: ModelRequest,
    /// Client size the prompts were captured at
    pub client_size: Size,
    /// Label and color given to results
    pub label_id: Option<LabelId>,
    pub color: Rgb,
    /// Confidence threshold for visual-prompt boxes
    pub visual_prompt_threshold: f32,
}

impl AiRequest {
    pub fn model(&self) -> ModelKind {
        self.trigger.model
    }
}

/// Where the image comes from when no session exists.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ImageSource {
    /// URL or path the service can fetch
    pub reference: String,
}

/// Settings the orchestrator needs from the editor.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RequestContext {
    pub natural: Size,
    pub client: Size,
    pub label_id: Option<LabelId>,
    pub color: Rgb,
    pub visual_prompt_threshold: f32,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            natural: Size::default(),
            client: Size::default(),
            label_id: None,
            color: Rgb::default(),
            visual_prompt_threshold: VISUAL_PROMPT_CONFIDENCE,
        }
    }
}

// ============================================================================
// Request Construction
// ============================================================================

fn to_natural(p: Point, client: Size, natural: Size) -> Point {
    p.rescale(client, natural)
}

fn flatten_points(points: &[Point], client: Size, natural: Size) -> Vec<f32> {
    points
        .iter()
        .flat_map(|p| {
            let n = to_natural(*p, client, natural);
            [n.x, n.y]
        })
        .collect()
}

fn rect_to_natural_corners(rect: &Rect, client: Size, natural: Size) -> [f32; 4] {
    rect.rescale(client, natural).to_corners()
}

/// Convert one prompt to its wire form in natural pixels.
pub fn to_wire_prompt(item: &PromptItem, client: Size, natural: Size) -> WirePrompt {
    let kind = match item.kind {
        PromptKind::Rect => WirePromptType::Rect,
        PromptKind::Point => WirePromptType::Point,
        PromptKind::Stroke => WirePromptType::Stroke,
        PromptKind::EdgeStitch => WirePromptType::EdgeStitch,
        PromptKind::Modify => WirePromptType::Modify,
    };
    let mut prompt = WirePrompt::new(kind);
    prompt.is_positive = Some(item.is_positive);
    prompt.rect = item.rect.map(|r| rect_to_natural_corners(&r, client, natural));
    prompt.point = item.point.map(|p| {
        let n = to_natural(p, client, natural);
        [n.x, n.y]
    });
    if !item.stroke.is_empty() {
        prompt.stroke = Some(flatten_points(&item.stroke, client, natural));
        prompt.radius = item.radius;
    }
    if !item.polygons.is_empty() {
        prompt.polygons = Some(
            item.polygons
                .iter()
                .map(|ring| flatten_points(ring, client, natural))
                .collect(),
        );
    }
    prompt
}

fn with_session_or_image(data: &DrawData, image: &ImageSource) -> ModelRequest {
    match &data.prompt.session_id {
        Some(session) => ModelRequest {
            session_id: Some(session.clone()),
            ..Default::default()
        },
        None => ModelRequest {
            image: Some(image.reference.clone()),
            ..Default::default()
        },
    }
}

fn mask_objects(objects: &[AnnotationObject]) -> impl Iterator<Item = &AnnotationObject> {
    objects.iter().filter(|o| o.object_type() == ObjectType::Mask)
}

fn pose_context(data: &DrawData, cx: &RequestContext) -> Vec<PoseContext> {
    let mut objects = data.objects.clone();
    if let (Some(index), Some(creating)) = (data.active_object_index, &data.creating)
        && let Some(slot) = objects.get_mut(index)
    {
        *slot = creating.object.clone();
    }
    objects
        .iter()
        .filter(|o| o.status == ObjectStatus::Checked)
        .filter_map(|o| match &o.shape {
            Shape::Skeleton(skeleton) => Some(PoseContext {
                bbox: skeleton
                    .rect
                    .as_ref()
                    .map(|r| rect_to_natural_corners(&r.rect, cx.client, cx.natural)),
                keypoints: Some(
                    skeleton
                        .keypoints
                        .iter()
                        .flat_map(|k| {
                            let n = to_natural(k.point, cx.client, cx.natural);
                            [n.x, n.y, k.visibility.value(), 1.0]
                        })
                        .collect(),
                ),
            }),
            _ => None,
        })
        .collect()
}

/// Build the request body for `trigger` from the current state.
pub fn build_request(
    trigger: AiTrigger,
    data: &DrawData,
    image: &ImageSource,
    cx: &RequestContext,
) -> Result<AiRequest, AiError> {
    let prompts: Vec<WirePrompt> = trigger
        .prompts
        .iter()
        .map(|p| to_wire_prompt(p, cx.client, cx.natural))
        .collect();

    let body = match trigger.model {
        ModelKind::Detection => {
            let text = trigger.text.as_deref().unwrap_or_default().trim();
            if text.is_empty() {
                return Err(AiError::invalid_request("detection needs a label text"));
            }
            ModelRequest {
                prompts: vec![WirePrompt::text(text)],
                ..with_session_or_image(data, image)
            }
        }
        ModelKind::VisualPrompt => {
            let label_type = match trigger.object_type {
                ObjectType::Mask => "mask",
                _ => "bbox",
            };
            let base = match &data.prompt.session_id {
                Some(session) => ModelRequest {
                    session_id: Some(session.clone()),
                    ..Default::default()
                },
                None => ModelRequest {
                    prompt_image: Some(image.reference.clone()),
                    infer_image: Some(image.reference.clone()),
                    ..Default::default()
                },
            };
            ModelRequest {
                prompts,
                label_types: vec![label_type.to_string()],
                ..base
            }
        }
        ModelKind::SegmentByPolygon => ModelRequest {
            density: Some(data.point_resolution),
            prompts,
            ..with_session_or_image(data, image)
        },
        ModelKind::SegmentByMask => ModelRequest {
            prompts,
            ..with_session_or_image(data, image)
        },
        ModelKind::Pose => {
            let objects = if data.is_batch_editing {
                pose_context(data, cx)
            } else {
                Vec::new()
            };
            ModelRequest {
                objects,
                ..with_session_or_image(data, image)
            }
        }
        ModelKind::MaskEdgeStitching => {
            let (width, height) = cx.natural.to_pixels();
            let masks: Vec<WireMask> = mask_objects(&data.objects)
                .filter_map(|o| match &o.shape {
                    Shape::Mask(mask) => Some(WireMask {
                        counts: mask.rle.clone(),
                        size: [height, width],
                    }),
                    _ => None,
                })
                .collect();
            if masks.len() < 2 {
                return Err(AiError::NotEnoughMasks);
            }
            let stroke = trigger
                .prompts
                .iter()
                .find(|p| !p.stroke.is_empty())
                .ok_or_else(|| AiError::invalid_request("edge stitching needs a stroke"))?;
            let mut prompt = WirePrompt::new(WirePromptType::Stroke);
            prompt.stroke = Some(flatten_points(&stroke.stroke, cx.client, cx.natural));
            prompt.radius = stroke.radius;
            ModelRequest {
                masks,
                prompts: vec![prompt],
                ..with_session_or_image(data, image)
            }
        }
        ModelKind::SegmentEverything => {
            let params = trigger.everything.clone().unwrap_or_default();
            ModelRequest {
                image: Some(image.reference.clone()),
                ..Default::default()
            }
            .with_everything(&params)
        }
    };

    if matches!(
        trigger.model,
        ModelKind::VisualPrompt | ModelKind::SegmentByPolygon | ModelKind::SegmentByMask
    ) && body.prompts.is_empty()
    {
        return Err(AiError::invalid_request("no prompts to send"));
    }

    Ok(AiRequest {
        trigger,
        body,
        client_size: cx.client,
        label_id: cx.label_id,
        color: cx.color,
        visual_prompt_threshold: cx.visual_prompt_threshold,
    })
}

// ============================================================================
// Response Translation
// ============================================================================

fn parse_result<T: serde::de::DeserializeOwned>(response: &TaskStatusResponse) -> Result<T, AiError> {
    let value = response
        .result
        .clone()
        .ok_or_else(|| AiError::invalid_response("missing result"))?;
    Ok(serde_json::from_value(value)?)
}

fn bbox_to_content(bbox: &[f32; 4], natural: Size, client: Size) -> Rect {
    Rect::from_corners(bbox[0], bbox[1], bbox[2], bbox[3]).rescale(natural, client)
}

fn labeled(object: AnnotationObject, request: &AiRequest) -> AnnotationObject {
    AnnotationObject {
        label_id: request.label_id,
        color: request.color,
        ..object
    }
}

/// Replace the candidates with `candidates`, keeping committed objects first.
fn merge_candidates(data: &mut DrawData, candidates: Vec<AnnotationObject>) {
    data.objects.retain(AnnotationObject::is_committed);
    data.objects.extend(candidates);
    data.revalidate_active();
    match data.active_object_index {
        Some(index) if data.creating.is_some() => {
            data.creating = Some(CreatingObject::new(data.objects[index].clone()));
        }
        Some(_) => {}
        None => data.creating = None,
    }
}

fn prompts_in(request: &AiRequest, client: Size) -> Vec<PromptItem> {
    request
        .trigger
        .prompts
        .iter()
        .map(|p| p.rescale(request.client_size, client))
        .collect()
}

fn keypoints_from_wire(values: &[f32], natural: Size, client: Size) -> Vec<Keypoint> {
    body_keypoints()
        .into_iter()
        .zip(values.chunks_exact(4))
        .map(|(template, v)| Keypoint {
            point: Point::new(v[0], v[1]).rescale(natural, client),
            visibility: KeypointVisibility::from_value(v[2]),
            conf: v[3],
            ..template
        })
        .collect()
}

/// Fold a successful response into `data`.
///
/// Returns `true` when the state changed and should be recorded in history.
pub fn apply_response(
    data: &mut DrawData,
    request: &AiRequest,
    response: &TaskStatusResponse,
    natural: Size,
    client: Size,
) -> Result<bool, AiError> {
    let session_id = response.session_id.clone();
    match request.trigger.model {
        ModelKind::Detection => {
            let result: DetectionResult = parse_result(response)?;
            let limit_conf = result.suggest_threshold.unwrap_or(0.0);
            let max_score = result
                .objects
                .iter()
                .map(|o| o.score)
                .fold(f32::NEG_INFINITY, f32::max);
            let candidates = result
                .objects
                .iter()
                .rev()
                .map(|item| {
                    let conf = if max_score > 0.0 {
                        item.score / max_score
                    } else {
                        item.score
                    };
                    let status = if conf >= limit_conf {
                        ObjectStatus::Checked
                    } else {
                        ObjectStatus::Unchecked
                    };
                    let rect = bbox_to_content(&item.bbox, natural, client);
                    labeled(AnnotationObject::new(Shape::Rectangle(RectElement::new(rect))), request)
                        .with_review(status, Some(conf))
                })
                .collect();
            data.is_batch_editing = true;
            data.limit_conf = limit_conf;
            merge_candidates(data, candidates);
            data.prompt.session_id = session_id;
            log::debug!("🤖 AI: detection returned {} candidates", result.objects.len());
            Ok(true)
        }
        ModelKind::VisualPrompt => {
            let result: VisualPromptResult = parse_result(response)?;
            let candidates: Vec<AnnotationObject> = match request.trigger.object_type {
                ObjectType::Mask => result
                    .objects
                    .iter()
                    .filter_map(|item| {
                        let mask = item.mask.as_ref()?;
                        let shape = Shape::Mask(mask_with_bitmap(mask.counts.clone(), natural));
                        Some(
                            labeled(AnnotationObject::new(shape), request)
                                .with_review(ObjectStatus::Checked, Some(item.score)),
                        )
                    })
                    .collect(),
                _ => {
                    let threshold = request.visual_prompt_threshold;
                    data.limit_conf = threshold;
                    result
                        .objects
                        .iter()
                        .rev()
                        .filter_map(|item| {
                            let rect = bbox_to_content(item.bbox.as_ref()?, natural, client);
                            let status = if item.score >= threshold {
                                ObjectStatus::Checked
                            } else {
                                ObjectStatus::Unchecked
                            };
                            let shape = Shape::Rectangle(RectElement::new(rect));
                            Some(
                                labeled(AnnotationObject::new(shape), request)
                                    .with_review(status, Some(item.score)),
                            )
                        })
                        .collect()
                }
            };
            log::debug!("🤖 AI: visual prompt returned {} candidates", candidates.len());
            data.is_batch_editing = true;
            merge_candidates(data, candidates);
            data.prompt.prompts_queue = prompts_in(request, client);
            data.prompt.session_id = session_id;
            data.prompt.creating_prompt = None;
            Ok(true)
        }
        ModelKind::SegmentByPolygon => {
            let result: PolygonSegmentResult = parse_result(response)?;
            let rings: Vec<Vec<Point>> = result
                .polygons
                .iter()
                .filter(|flat| flat.len() >= MIN_POLYGON_VERTICES * 2)
                .map(|flat| {
                    flat.chunks_exact(2)
                        .map(|xy| Point::new(xy[0], xy[1]).rescale(natural, client))
                        .collect()
                })
                .collect();
            if rings.is_empty() {
                return Ok(false);
            }
            let color = data.creating.as_ref().map_or(request.color, |c| c.object.color);
            let object = AnnotationObject {
                color,
                ..labeled(AnnotationObject::new(Shape::Polygon(PolygonGroup::new(rings))), request)
            }
            .with_review(ObjectStatus::Checked, None);
            data.creating = Some(CreatingObject::new(object));
            data.prompt.prompts_queue = prompts_in(request, client);
            data.prompt.session_id = session_id;
            data.prompt.creating_prompt = None;
            Ok(true)
        }
        ModelKind::SegmentByMask => {
            let result: MaskSegmentResult = parse_result(response)?;
            let color = data.creating.as_ref().map_or(request.color, |c| c.object.color);
            let shape = Shape::Mask(mask_with_bitmap(result.mask.counts, natural));
            let object = AnnotationObject {
                color,
                ..labeled(AnnotationObject::new(shape), request)
            }
            .with_review(ObjectStatus::Checked, None);
            data.creating = Some(CreatingObject::new(object));
            data.prompt.prompts_queue = prompts_in(request, client);
            data.prompt.session_id = session_id;
            data.prompt.creating_prompt = None;
            Ok(true)
        }
        ModelKind::Pose => {
            let result: PoseResult = parse_result(response)?;
            if result.objects.is_empty() {
                return Ok(false);
            }
            let skeletons = result
                .objects
                .iter()
                .map(|item| {
                    let skeleton = SkeletonData {
                        rect: item
                            .bbox
                            .as_ref()
                            .map(|b| RectElement::new(bbox_to_content(b, natural, client))),
                        keypoints: keypoints_from_wire(&item.keypoints, natural, client),
                        lines: BODY_LINES.to_vec(),
                    };
                    labeled(AnnotationObject::new(Shape::Skeleton(skeleton)), request)
                        .with_review(ObjectStatus::Checked, Some(item.score))
                })
                .collect();
            data.is_batch_editing = true;
            merge_candidates(data, skeletons);
            data.prompt.session_id = session_id;
            Ok(true)
        }
        ModelKind::MaskEdgeStitching => {
            let result: MasksResult = parse_result(response)?;
            if result.masks.is_empty() {
                return Ok(false);
            }
            let mask_count = mask_objects(&data.objects).count();
            if result.masks.len() != mask_count {
                return Err(AiError::invalid_response(format!(
                    "expected {} stitched masks, got {}",
                    mask_count,
                    result.masks.len()
                )));
            }
            let masks = data
                .objects
                .iter_mut()
                .filter(|o| o.object_type() == ObjectType::Mask);
            for (object, stitched) in masks.zip(&result.masks) {
                object.shape = Shape::Mask(mask_with_bitmap(stitched.counts.clone(), natural));
            }
            data.revalidate_active();
            data.prompt.creating_prompt = None;
            data.prompt.session_id = session_id;
            Ok(true)
        }
        ModelKind::SegmentEverything => {
            let result: MasksResult = parse_result(response)?;
            if result.masks.is_empty() {
                return Ok(false);
            }
            let masks = result
                .masks
                .iter()
                .enumerate()
                .map(|(i, mask)| AnnotationObject {
                    label_id: request.label_id,
                    color: palette_color(i),
                    ..AnnotationObject::new(Shape::Mask(mask_with_bitmap(mask.counts.clone(), natural)))
                        .with_review(ObjectStatus::Checked, Some(1.0))
                })
                .collect();
            data.active_object_index = None;
            data.creating = None;
            data.is_batch_editing = true;
            merge_candidates(data, masks);
            Ok(true)
        }
    }
}

/// Clean up after a failed request.
pub fn apply_failure(data: &mut DrawData) {
    data.prompt.creating_prompt = None;
}
