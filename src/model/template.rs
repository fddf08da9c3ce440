//! The 17-point COCO body template used to seed new skeletons.

use crate::color::Rgb;

use super::geometry::{bounding_rect, Point, Rect};
use super::object::{Keypoint, KeypointVisibility};

/// Keypoint names in template order.
pub const BODY_POINT_NAMES: [&str; 17] = [
    "nose",
    "left_eye",
    "right_eye",
    "left_ear",
    "right_ear",
    "left_shoulder",
    "right_shoulder",
    "left_elbow",
    "right_elbow",
    "left_wrist",
    "right_wrist",
    "left_hip",
    "right_hip",
    "left_knee",
    "right_knee",
    "left_ankle",
    "right_ankle",
];

/// Keypoint positions of the template, in template pixels.
const BODY_POINTS: [(f32, f32); 17] = [
    (175.257_73, 61.211_34),
    (179.982_82, 41.451_89),
    (170.962_2, 41.881_443),
    (189.862_54, 51.331_615),
    (163.230_24, 50.472_51),
    (192.869_42, 68.084_19),
    (158.295_15, 67.639_83),
    (202.749_14, 99.871_13),
    (150.343_64, 99.871_13),
    (208.762_89, 127.362_54),
    (142.611_68, 129.080_76),
    (182.130_58, 126.503_44),
    (162.227_95, 125.473_99),
    (184.707_9, 175.472_5),
    (158.786_75, 176.975_95),
    (190.292_1, 208.118_56),
    (152.920_96, 206.829_9),
];

/// Per-keypoint colors.
const BODY_POINT_COLORS: [Rgb; 17] = [
    Rgb::new(128, 0, 0),
    Rgb::new(255, 178, 102),
    Rgb::new(230, 230, 0),
    Rgb::new(255, 51, 255),
    Rgb::new(153, 204, 255),
    Rgb::new(255, 128, 0),
    Rgb::new(0, 255, 255),
    Rgb::new(128, 0, 255),
    Rgb::new(51, 153, 255),
    Rgb::new(169, 165, 139),
    Rgb::new(255, 0, 0),
    Rgb::new(102, 255, 102),
    Rgb::new(184, 97, 134),
    Rgb::new(128, 128, 0),
    Rgb::new(255, 190, 255),
    Rgb::new(0, 128, 0),
    Rgb::new(0, 0, 255),
];

/// Connectivity as flat index pairs.
pub const BODY_LINES: [usize; 38] = [
    15, 13, 13, 11, 16, 14, 14, 12, 11, 12, 5, 11, 6, 12, 5, 6, 5, 7, 6, 8, 7, 9, 8, 10, 1, 2, 0,
    1, 0, 2, 1, 3, 2, 4, 3, 5, 4, 6,
];

/// Template keypoints, all labeled visible with full confidence.
pub fn body_keypoints() -> Vec<Keypoint> {
    BODY_POINTS
        .iter()
        .zip(BODY_POINT_NAMES)
        .zip(BODY_POINT_COLORS)
        .map(|((&(x, y), name), color)| Keypoint {
            point: Point::new(x, y),
            z: 0.0,
            w: 1.0,
            visibility: KeypointVisibility::LabeledVisible,
            conf: 1.0,
            name: name.to_string(),
            color,
        })
        .collect()
}

/// Stretch keypoints so their bounding box fills `rect`.
pub fn fit_keypoints_to_rect(keypoints: &[Keypoint], rect: &Rect) -> Vec<Keypoint> {
    let positions: Vec<Point> = keypoints.iter().map(|k| k.point).collect();
    let Some(limits) = bounding_rect(&positions) else {
        return Vec::new();
    };
    let sx = if limits.width > 0.0 { rect.width / limits.width } else { 1.0 };
    let sy = if limits.height > 0.0 { rect.height / limits.height } else { 1.0 };
    keypoints
        .iter()
        .map(|k| Keypoint {
            point: Point::new(
                (k.point.x - limits.x) * sx + rect.x,
                (k.point.y - limits.y) * sy + rect.y,
            ),
            ..k.clone()
        })
        .collect()
}
