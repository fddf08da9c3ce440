//! Global constants for the annotation editor engine

use std::time::Duration;

// ============================================================================
// Viewport
// ============================================================================

/// Smallest allowed display scale
pub const MIN_SCALE: f32 = 0.1;

/// Largest allowed display scale
pub const MAX_SCALE: f32 = 20.0;

/// Scale step for zoom buttons
pub const BUTTON_SCALE_STEP: f32 = 0.5;

/// Scale step for a single mouse wheel notch
pub const WHEEL_SCALE_STEP: f32 = 0.1;

/// Distance from the container edge (in container pixels) that triggers autoscroll
pub const AUTOSCROLL_MOUSE_OFFSET: f32 = 10.0;

/// How far the image may be scrolled past the container edge during autoscroll
pub const AUTOSCROLL_BOUNDING_OFFSET: f32 = 40.0;

/// Offset shift applied per autoscroll tick
pub const AUTOSCROLL_STEP: f32 = 8.0;

/// Autoscroll tick interval (one frame at ~60 fps)
pub const AUTOSCROLL_INTERVAL: Duration = Duration::from_millis(16);

// ============================================================================
// History
// ============================================================================

/// Default number of snapshots kept by the history engine
pub const DEFAULT_HISTORY_CAPACITY: usize = 20;

// ============================================================================
// Hit testing (content pixels)
// ============================================================================

/// Rectangles are hit within this band around their bounds
pub const RECT_HIT_EXPAND: f32 = 8.0;

/// Radius for vertex and keypoint hits
pub const POINT_HIT_RADIUS: f32 = 5.0;

/// Tolerance for hits on polygon edges
pub const LINE_HIT_BUFFER: f32 = 0.75;

/// Side length of the square hit box around each resize anchor
pub const ANCHOR_HIT_SIZE: f32 = 16.0;

// ============================================================================
// Tools
// ============================================================================

/// Minimum width/height of a committed rectangle
pub const MIN_RECT_SIZE: f32 = 1.0;

/// Minimum number of vertices for a polygon ring
pub const MIN_POLYGON_VERTICES: usize = 3;

/// Default mask brush diameter in natural pixels
pub const DEFAULT_BRUSH_SIZE: f32 = 20.0;

/// Default polygon density for AI segmentation
pub const DEFAULT_POINT_RESOLUTION: f32 = 0.5;

// ============================================================================
// AI
// ============================================================================

/// Confidence threshold for visual-prompt detections
pub const VISUAL_PROMPT_CONFIDENCE: f32 = 0.3;

/// Interval between task status polls
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);

/// Maximum number of task status polls before giving up
pub const DEFAULT_MAX_POLL_ATTEMPTS: u32 = 5000;
