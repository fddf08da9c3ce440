//! Core geometry types and the pure geometric helpers used by tools and hit-testing.
//!
//! All functions here work in a single coordinate space; callers decide whether that
//! is content, container or natural space.

use crate::constants::{ANCHOR_HIT_SIZE, LINE_HIT_BUFFER, MIN_POLYGON_VERTICES};

// ============================================================================
// Core Geometry Types
// ============================================================================

/// A 2D point.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    /// Create a new point.
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Euclidean distance to another point.
    pub fn distance(&self, other: &Point) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Translate by a delta.
    pub fn offset(&self, dx: f32, dy: f32) -> Point {
        Point::new(self.x + dx, self.y + dy)
    }

    /// Map this point from one size to another (proportional rescale).
    pub fn rescale(&self, from: Size, to: Size) -> Point {
        let (sx, sy) = from.scale_factors_to(to);
        Point::new(self.x * sx, self.y * sy)
    }

    /// Clamp into `[0, bounds]` on both axes.
    pub fn clamp_to(&self, bounds: Size) -> Point {
        Point::new(self.x.clamp(0.0, bounds.width.max(0.0)), self.y.clamp(0.0, bounds.height.max(0.0)))
    }
}

/// Width and height of an image or canvas.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    /// Create a new size.
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// True when either dimension is zero or negative.
    pub fn is_empty(&self) -> bool {
        self.width <= 0.0 || self.height <= 0.0
    }

    /// Per-axis factors that map coordinates in `self` onto `to`.
    ///
    /// Returns identity factors for an empty source size.
    pub fn scale_factors_to(&self, to: Size) -> (f32, f32) {
        if self.is_empty() {
            return (1.0, 1.0);
        }
        (to.width / self.width, to.height / self.height)
    }

    /// Integer pixel dimensions, rounded up.
    pub fn to_pixels(&self) -> (u32, u32) {
        (self.width.max(0.0).ceil() as u32, self.height.max(0.0).ceil() as u32)
    }
}

/// Axis-aligned rectangle defined by its top-left corner and size.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// Create a new rectangle.
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }

    /// Rectangle from `(xmin, ymin, xmax, ymax)`.
    pub fn from_corners(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> Self {
        Self::new(xmin, ymin, xmax - xmin, ymax - ymin)
    }

    /// Right edge.
    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    /// Bottom edge.
    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    /// Grow (or shrink, with a negative delta) on every side.
    pub fn expand(&self, delta: f32) -> Rect {
        Rect::new(self.x - delta, self.y - delta, self.width + 2.0 * delta, self.height + 2.0 * delta)
    }

    /// Inclusive containment test.
    pub fn contains(&self, p: Point) -> bool {
        p.x >= self.x && p.x <= self.max_x() && p.y >= self.y && p.y <= self.max_y()
    }

    /// Proportionally map the rectangle from one size to another.
    pub fn rescale(&self, from: Size, to: Size) -> Rect {
        let (sx, sy) = from.scale_factors_to(to);
        Rect::new(self.x * sx, self.y * sy, self.width * sx, self.height * sy)
    }

    /// `(xmin, ymin, xmax, ymax)`.
    pub fn to_corners(&self) -> [f32; 4] {
        [self.x, self.y, self.max_x(), self.max_y()]
    }
}

// ============================================================================
// Rectangle Anchors
// ============================================================================

/// The eight resize handles of a rectangle, plus the compass directions used
/// by boundary autoscroll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    TopLeft,
    Top,
    TopRight,
    Left,
    Right,
    BottomLeft,
    Bottom,
    BottomRight,
}

impl Direction {
    /// All anchors in hit-test order.
    pub fn all() -> &'static [Direction] {
        &[
            Direction::TopLeft,
            Direction::Top,
            Direction::TopRight,
            Direction::Left,
            Direction::Right,
            Direction::BottomLeft,
            Direction::Bottom,
            Direction::BottomRight,
        ]
    }

    /// Position of this anchor on the given rectangle.
    pub fn position_on(&self, rect: &Rect) -> Point {
        let cx = rect.x + 0.5 * rect.width;
        let cy = rect.y + 0.5 * rect.height;
        match self {
            Direction::TopLeft => Point::new(rect.x, rect.y),
            Direction::Top => Point::new(cx, rect.y),
            Direction::TopRight => Point::new(rect.max_x(), rect.y),
            Direction::Left => Point::new(rect.x, cy),
            Direction::Right => Point::new(rect.max_x(), cy),
            Direction::BottomLeft => Point::new(rect.x, rect.max_y()),
            Direction::Bottom => Point::new(cx, rect.max_y()),
            Direction::BottomRight => Point::new(rect.max_x(), rect.max_y()),
        }
    }

    /// The corner that stays fixed while dragging this anchor.
    pub fn fixed_point_on(&self, rect: &Rect) -> Point {
        match self {
            Direction::Right | Direction::Bottom | Direction::BottomRight => Point::new(rect.x, rect.y),
            Direction::Left | Direction::Top | Direction::TopLeft => Point::new(rect.max_x(), rect.max_y()),
            Direction::BottomLeft => Point::new(rect.max_x(), rect.y),
            Direction::TopRight => Point::new(rect.x, rect.max_y()),
        }
    }
}

/// A resize in progress: which handle is dragged and which point stays put.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RectAnchor {
    pub direction: Direction,
    pub fixed: Point,
}

/// Find the resize handle under `p`, if any.
pub fn anchor_under_point(rect: &Rect, p: Point) -> Option<Direction> {
    Direction::all().iter().copied().find(|dir| {
        let center = dir.position_on(rect);
        let half = ANCHOR_HIT_SIZE * 0.5;
        Rect::new(center.x - half, center.y - half, ANCHOR_HIT_SIZE, ANCHOR_HIT_SIZE).contains(p)
    })
}

// ============================================================================
// Geometry Helpers
// ============================================================================

/// Normalized rectangle spanned by `start` and `end`, with `end` clamped into `bounds`.
pub fn rect_from_points(start: Point, end: Point, bounds: Size) -> Rect {
    let end = end.clamp_to(bounds);
    Rect::new(start.x.min(end.x), start.y.min(end.y), (start.x - end.x).abs(), (start.y - end.y).abs())
}

/// Resize `rect` by dragging `anchor` to `mouse`.
///
/// Edge anchors only move one axis; corner anchors move both.
pub fn resize_rect(rect: &Rect, anchor: &RectAnchor, mouse: Point, bounds: Size) -> Rect {
    let mut end = mouse.clamp_to(bounds);
    match anchor.direction {
        Direction::Right => end.y = rect.max_y(),
        Direction::Bottom => end.x = rect.max_x(),
        Direction::Left => end.y = rect.y,
        Direction::Top => end.x = rect.x,
        _ => {}
    }
    rect_from_points(anchor.fixed, end, bounds)
}

/// Move `rect` by the mouse delta since the drag started, keeping it inside `bounds`.
pub fn move_rect(rect: &Rect, origin: Point, drag_start: Point, mouse: Point, bounds: Size) -> Rect {
    let x = origin.x + (mouse.x - drag_start.x);
    let y = origin.y + (mouse.y - drag_start.y);
    let x = if x < 0.0 {
        0.0
    } else if x + rect.width > bounds.width {
        bounds.width - rect.width
    } else {
        x
    };
    let y = if y < 0.0 {
        0.0
    } else if y + rect.height > bounds.height {
        bounds.height - rect.height
    } else {
        y
    };
    Rect::new(x, y, rect.width, rect.height)
}

/// Translate every point of a ring by the mouse delta, clamped so the ring stays inside `bounds`.
pub fn move_ring(ring: &[Point], drag_start: Point, mouse: Point, bounds: Size) -> Vec<Point> {
    let Some(limits) = bounding_rect(ring) else {
        return ring.to_vec();
    };
    let mut dx = mouse.x - drag_start.x;
    let mut dy = mouse.y - drag_start.y;
    if dx + limits.max_x() > bounds.width {
        dx = bounds.width - limits.max_x();
    } else if dx + limits.x < 0.0 {
        dx = -limits.x;
    }
    if dy + limits.max_y() > bounds.height {
        dy = bounds.height - limits.max_y();
    } else if dy + limits.y < 0.0 {
        dy = -limits.y;
    }
    ring.iter().map(|p| p.offset(dx, dy)).collect()
}

/// Smallest rectangle containing all points.
pub fn bounding_rect(points: &[Point]) -> Option<Rect> {
    let first = points.first()?;
    let (mut min_x, mut min_y, mut max_x, mut max_y) = (first.x, first.y, first.x, first.y);
    for p in &points[1..] {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    Some(Rect::from_corners(min_x, min_y, max_x, max_y))
}

/// Closest point to `p` on the segment `a`-`b`.
pub fn closest_point_on_segment(p: Point, a: Point, b: Point) -> Point {
    let ab = Point::new(b.x - a.x, b.y - a.y);
    let ab2 = ab.x * ab.x + ab.y * ab.y;
    if ab2 <= f32::EPSILON {
        return a;
    }
    let t = (((p.x - a.x) * ab.x + (p.y - a.y) * ab.y) / ab2).clamp(0.0, 1.0);
    Point::new(a.x + ab.x * t, a.y + ab.y * t)
}

/// True when `p` is within `radius` of `center`.
pub fn point_near(center: Point, p: Point, radius: f32) -> bool {
    center.distance(&p) <= radius
}

/// True when `p` lies on the segment `a`-`b` within the edge hit buffer.
pub fn point_on_segment(p: Point, a: Point, b: Point) -> bool {
    let length = a.distance(&b);
    let sum = a.distance(&p) + b.distance(&p);
    sum >= length - LINE_HIT_BUFFER && sum <= length + LINE_HIT_BUFFER
}

/// Edges of a closed ring as `(start, end)` pairs, including the closing edge.
pub fn ring_edges(ring: &[Point]) -> impl Iterator<Item = (Point, Point)> + '_ {
    (0..ring.len()).map(move |i| (ring[i], ring[(i + 1) % ring.len()]))
}

/// Point-in-polygon test using the ray casting algorithm.
pub fn point_in_ring(ring: &[Point], p: Point) -> bool {
    if ring.len() < MIN_POLYGON_VERTICES {
        return false;
    }
    let mut inside = false;
    let mut j = ring.len() - 1;
    for i in 0..ring.len() {
        let (pi, pj) = (ring[i], ring[j]);
        if (pi.y > p.y) != (pj.y > p.y) && p.x < (pj.x - pi.x) * (p.y - pi.y) / (pj.y - pi.y) + pi.x {
            inside = !inside;
        }
        j = i;
    }
    inside
}

/// Shoelace area of a ring.
pub fn ring_area(ring: &[Point]) -> f32 {
    let twice: f32 = ring_edges(ring).map(|(a, b)| a.x * b.y - b.x * a.y).sum();
    (twice * 0.5).abs()
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPSILON: f32 = 0.0001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    #[test]
    fn test_rect_from_points_normalizes_and_clamps() {
        let bounds = Size::new(100.0, 100.0);
        let r = rect_from_points(Point::new(50.0, 60.0), Point::new(120.0, -10.0), bounds);
        assert_eq!(r, Rect::new(50.0, 0.0, 50.0, 60.0));
    }

    #[test]
    fn test_anchor_under_point() {
        let r = Rect::new(10.0, 10.0, 100.0, 50.0);
        assert_eq!(anchor_under_point(&r, Point::new(12.0, 9.0)), Some(Direction::TopLeft));
        assert_eq!(anchor_under_point(&r, Point::new(60.0, 61.0)), Some(Direction::Bottom));
        assert_eq!(anchor_under_point(&r, Point::new(60.0, 35.0)), None);
    }

    #[test]
    fn test_resize_from_bottom_right_keeps_top_left() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        let anchor = RectAnchor {
            direction: Direction::BottomRight,
            fixed: Direction::BottomRight.fixed_point_on(&r),
        };
        let resized = resize_rect(&r, &anchor, Point::new(50.0, 40.0), Size::new(100.0, 100.0));
        assert_eq!(resized, Rect::new(10.0, 10.0, 40.0, 30.0));
    }

    #[test]
    fn test_resize_edge_moves_single_axis() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        let anchor = RectAnchor {
            direction: Direction::Right,
            fixed: Direction::Right.fixed_point_on(&r),
        };
        let resized = resize_rect(&r, &anchor, Point::new(70.0, 90.0), Size::new(100.0, 100.0));
        assert_eq!(resized, Rect::new(10.0, 10.0, 60.0, 20.0));
    }

    #[test]
    fn test_move_rect_is_clamped() {
        let r = Rect::new(10.0, 10.0, 20.0, 20.0);
        let moved = move_rect(&r, Point::new(10.0, 10.0), Point::new(15.0, 15.0), Point::new(200.0, 0.0), Size::new(100.0, 100.0));
        assert_eq!(moved, Rect::new(80.0, 0.0, 20.0, 20.0));
    }

    #[test]
    fn test_move_ring_is_clamped() {
        let ring = vec![Point::new(10.0, 10.0), Point::new(30.0, 10.0), Point::new(20.0, 30.0)];
        let moved = move_ring(&ring, Point::new(20.0, 20.0), Point::new(-50.0, 25.0), Size::new(100.0, 100.0));
        assert!(approx_eq(moved[0].x, 0.0));
        assert!(approx_eq(moved[0].y, 15.0));
        assert!(approx_eq(moved[2].y, 35.0));
    }

    #[test]
    fn test_closest_point_on_segment() {
        let p = closest_point_on_segment(Point::new(5.0, 5.0), Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert!(approx_eq(p.x, 5.0));
        assert!(approx_eq(p.y, 0.0));
        let clamped = closest_point_on_segment(Point::new(-5.0, 1.0), Point::new(0.0, 0.0), Point::new(10.0, 0.0));
        assert_eq!(clamped, Point::new(0.0, 0.0));
    }

    #[test]
    fn test_point_in_ring_concave() {
        // L-shaped ring
        let ring = vec![
            Point::new(0.0, 0.0),
            Point::new(10.0, 0.0),
            Point::new(10.0, 4.0),
            Point::new(4.0, 4.0),
            Point::new(4.0, 10.0),
            Point::new(0.0, 10.0),
        ];
        assert!(point_in_ring(&ring, Point::new(2.0, 8.0)));
        assert!(!point_in_ring(&ring, Point::new(8.0, 8.0)));
    }

    #[test]
    fn test_point_on_segment_buffer() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(10.0, 0.0);
        assert!(point_on_segment(Point::new(5.0, 0.1), a, b));
        assert!(!point_on_segment(Point::new(5.0, 3.0), a, b));
    }

    #[test]
    fn test_ring_area() {
        let square = vec![Point::new(0.0, 0.0), Point::new(4.0, 0.0), Point::new(4.0, 4.0), Point::new(0.0, 4.0)];
        assert!(approx_eq(ring_area(&square), 16.0));
    }

    #[test]
    fn test_rescale_rect() {
        let r = Rect::new(10.0, 20.0, 30.0, 40.0).rescale(Size::new(100.0, 100.0), Size::new(200.0, 50.0));
        assert_eq!(r, Rect::new(20.0, 10.0, 60.0, 20.0));
    }
}
