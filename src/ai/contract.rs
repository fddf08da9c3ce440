//! Wire types of the model service.
//!
//! All coordinates on the wire are natural image pixels. Masks travel as the
//! same `[start, length, ...]` runs used by [`MaskData`](crate::model::MaskData).

use serde::{Deserialize, Serialize};

// ============================================================================
// Requests
// ============================================================================

/// Prompt type tag on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WirePromptType {
    Rect,
    Point,
    Stroke,
    EdgeStitch,
    Modify,
    Text,
}

/// One prompt in a request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WirePrompt {
    #[serde(rename = "type")]
    pub kind: WirePromptType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_positive: Option<bool>,
    /// `[xmin, ymin, xmax, ymax]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rect: Option<[f32; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub point: Option<[f32; 2]>,
    /// Flat `[x, y, x, y, ...]`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub stroke: Option<Vec<f32>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub radius: Option<f32>,
    /// Flat rings
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub polygons: Option<Vec<Vec<f32>>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text: Option<String>,
}

impl WirePrompt {
    /// Prompt with only a type tag set.
    pub fn new(kind: WirePromptType) -> Self {
        Self {
            kind,
            is_positive: None,
            rect: None,
            point: None,
            stroke: None,
            radius: None,
            polygons: None,
            text: None,
        }
    }

    /// Free-text detection prompt.
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            ..Self::new(WirePromptType::Text)
        }
    }
}

/// A mask on the wire.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct WireMask {
    #[serde(default)]
    pub counts: Vec<u32>,
    /// `[height, width]`
    #[serde(default)]
    pub size: [u32; 2],
}

/// A skeleton sent as pose context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bbox: Option<[f32; 4]>,
    /// `[x, y, visible, conf]` per keypoint
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub keypoints: Option<Vec<f32>>,
}

/// Tuning knobs of segment-everything.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SegmentEverythingParams {
    pub points_per_side: u32,
    pub pred_iou_thresh: f32,
    pub min_mask_region_area: u32,
}

impl Default for SegmentEverythingParams {
    fn default() -> Self {
        Self {
            points_per_side: 32,
            pred_iou_thresh: 0.89,
            min_mask_region_area: 300,
        }
    }
}

/// Request body of any model.
///
/// Carries either `session_id` or an image reference. Model-specific fields
/// are omitted when unused.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_image: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub infer_image: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub prompts: Vec<WirePrompt>,
    /// Visual prompt output kinds: `"bbox"` or `"mask"`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub label_types: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub density: Option<f32>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub masks: Vec<WireMask>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub objects: Vec<PoseContext>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub points_per_side: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pred_iou_thresh: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_mask_region_area: Option<u32>,
}

impl ModelRequest {
    /// Builder: attach segment-everything tuning.
    pub fn with_everything(mut self, params: &SegmentEverythingParams) -> Self {
        self.points_per_side = Some(params.points_per_side);
        self.pred_iou_thresh = Some(params.pred_iou_thresh);
        self.min_mask_region_area = Some(params.min_mask_region_area);
        self
    }
}

// ============================================================================
// Responses
// ============================================================================

/// Answer to a task submission.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskCreated {
    pub task_uuid: String,
}

/// Task lifecycle reported by the service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskStatus {
    Waiting,
    Running,
    Success,
    Failed,
}

/// Envelope returned by status polls.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskStatusResponse {
    pub status: TaskStatus,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub session_id: Option<String>,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

/// A detected box.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DetectedObject {
    /// `[xmin, ymin, xmax, ymax]`
    pub bbox: [f32; 4],
    pub score: f32,
}

/// Detection result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DetectionResult {
    #[serde(default)]
    pub objects: Vec<DetectedObject>,
    #[serde(default)]
    pub suggest_threshold: Option<f32>,
}

/// One visual-prompt match; carries a box or a mask depending on `labelTypes`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualPromptObject {
    #[serde(default)]
    pub bbox: Option<[f32; 4]>,
    #[serde(default)]
    pub mask: Option<WireMask>,
    pub score: f32,
}

/// Visual-prompt result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct VisualPromptResult {
    #[serde(default)]
    pub objects: Vec<VisualPromptObject>,
}

/// Polygon segmentation result: flat rings.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PolygonSegmentResult {
    #[serde(default)]
    pub polygons: Vec<Vec<f32>>,
}

/// Mask segmentation result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MaskSegmentResult {
    #[serde(default)]
    pub mask: WireMask,
}

/// Edge stitching and segment-everything result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct MasksResult {
    #[serde(default)]
    pub masks: Vec<WireMask>,
}

/// A pose estimate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoseObject {
    #[serde(default)]
    pub bbox: Option<[f32; 4]>,
    /// `[x, y, visible, conf]` per keypoint
    #[serde(default)]
    pub keypoints: Vec<f32>,
    #[serde(default)]
    pub score: f32,
}

/// Pose estimation result.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PoseResult {
    #[serde(default)]
    pub objects: Vec<PoseObject>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_request_omits_unused_fields() {
        let request = ModelRequest {
            session_id: Some("s1".to_string()),
            prompts: vec![WirePrompt::text("cat")],
            ..Default::default()
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "sessionId": "s1",
                "prompts": [{ "type": "text", "text": "cat" }]
            })
        );
    }

    #[test]
    fn test_segment_everything_params_are_inlined() {
        let request = ModelRequest {
            image: Some("img.png".to_string()),
            ..Default::default()
        }
        .with_everything(&SegmentEverythingParams::default());
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["pointsPerSide"], 32);
        assert_eq!(json["minMaskRegionArea"], 300);
    }

    #[test]
    fn test_status_envelope_parses() {
        let body = r#"{"status":"success","sessionId":"abc","result":{"polygons":[[0,0,1,0,1,1]]}}"#;
        let response: TaskStatusResponse = serde_json::from_str(body).unwrap();
        assert_eq!(response.status, TaskStatus::Success);
        assert_eq!(response.session_id.as_deref(), Some("abc"));
        let result: PolygonSegmentResult = serde_json::from_value(response.result.unwrap()).unwrap();
        assert_eq!(result.polygons[0].len(), 6);
    }
}
