//! Viewport math: fit, zoom-to-anchor, pan, coordinate conversion and boundary
//! autoscroll.
//!
//! Three coordinate spaces meet here:
//! - natural: pixels of the source image
//! - content: display pixels relative to the image's top-left corner
//! - container: display pixels relative to the canvas container
//!
//! `container = content + offset` and `content = natural * scale`.

use web_time::{Duration, Instant};

use crate::constants::{
    AUTOSCROLL_BOUNDING_OFFSET, AUTOSCROLL_INTERVAL, AUTOSCROLL_MOUSE_OFFSET, AUTOSCROLL_STEP,
    MAX_SCALE, MIN_SCALE,
};
use crate::model::{Direction, Point, Size};

/// Zoom direction for [`Viewport::zoom`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZoomDirection {
    In,
    Out,
}

/// Round to two decimals.
fn round2(value: f32) -> f32 {
    (value * 100.0).round() / 100.0
}

/// Display transform of the image inside its container.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    natural: Size,
    container: Size,
    scale: f32,
    offset: Point,
    padding: f32,
    min_scale: f32,
    max_scale: f32,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            natural: Size::default(),
            container: Size::default(),
            scale: 1.0,
            offset: Point::default(),
            padding: 0.0,
            min_scale: MIN_SCALE,
            max_scale: MAX_SCALE,
        }
    }
}

impl Viewport {
    /// Create a viewport with custom scale limits.
    pub fn with_scale_limits(min_scale: f32, max_scale: f32) -> Self {
        Self {
            min_scale,
            max_scale,
            ..Self::default()
        }
    }

    /// Current scale (client / natural).
    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// Top-left of the image in container coordinates.
    pub fn offset(&self) -> Point {
        self.offset
    }

    /// Source image size.
    pub fn natural_size(&self) -> Size {
        self.natural
    }

    /// Container size.
    pub fn container_size(&self) -> Size {
        self.container
    }

    /// On-screen size of the image.
    pub fn client_size(&self) -> Size {
        Size::new(self.natural.width * self.scale, self.natural.height * self.scale)
    }

    /// Fit the image into `container` minus `padding` on every side and center it.
    pub fn fit(&mut self, natural: Size, container: Size, padding: f32) {
        self.natural = natural;
        self.container = container;
        self.padding = padding;
        self.refit();
    }

    fn refit(&mut self) {
        let available = Size::new(
            (self.container.width - 2.0 * self.padding).max(1.0),
            (self.container.height - 2.0 * self.padding).max(1.0),
        );
        if self.natural.is_empty() {
            self.scale = 1.0;
            self.offset = Point::default();
            return;
        }
        let image_aspect = self.natural.width / self.natural.height;
        let container_aspect = available.width / available.height;
        self.scale = if image_aspect >= container_aspect {
            available.width / self.natural.width
        } else {
            available.height / self.natural.height
        };
        let client = self.client_size();
        self.offset = Point::new(
            (self.container.width - client.width) / 2.0,
            (self.container.height - client.height) / 2.0,
        );
        log::debug!(
            "🔍 Fit {}x{} into {}x{}: scale {:.3}",
            self.natural.width,
            self.natural.height,
            self.container.width,
            self.container.height,
            self.scale
        );
    }

    /// Refit after the container changed size. Returns the previous client size.
    pub fn resize_container(&mut self, container: Size) -> Size {
        let previous = self.client_size();
        self.container = container;
        self.refit();
        previous
    }

    /// Zoom by `step`, keeping the content point under `anchor` fixed.
    ///
    /// `anchor` is in container coordinates; `None` anchors on the container
    /// center. Returns the previous client size.
    pub fn zoom(&mut self, direction: ZoomDirection, step: f32, anchor: Option<Point>) -> Size {
        let target = match direction {
            ZoomDirection::In => self.scale + step,
            ZoomDirection::Out => self.scale - step,
        };
        self.zoom_to(round2(target), anchor)
    }

    /// Set the scale directly (clamped), keeping `anchor` fixed. Returns the previous client size.
    pub fn zoom_to(&mut self, scale: f32, anchor: Option<Point>) -> Size {
        let previous = self.client_size();
        let new_scale = scale.clamp(self.min_scale, self.max_scale);
        if (new_scale - self.scale).abs() <= f32::EPSILON || previous.is_empty() {
            return previous;
        }
        let anchor = anchor.unwrap_or(Point::new(self.container.width / 2.0, self.container.height / 2.0));
        let ratio_x = (anchor.x - self.offset.x) / previous.width;
        let ratio_y = (anchor.y - self.offset.y) / previous.height;

        self.scale = new_scale;
        let client = self.client_size();
        self.offset = Point::new(anchor.x - client.width * ratio_x, anchor.y - client.height * ratio_y);
        log::debug!("🔍 Zoom to {:.2} around ({:.1}, {:.1})", new_scale, anchor.x, anchor.y);
        previous
    }

    /// Apply a pan delta (container pixels).
    pub fn pan_by(&mut self, dx: f32, dy: f32) {
        self.offset = self.offset.offset(dx, dy);
    }

    /// Natural pixel to container coordinates.
    pub fn natural_to_display(&self, p: Point) -> Point {
        Point::new(p.x * self.scale + self.offset.x, p.y * self.scale + self.offset.y)
    }

    /// Container coordinates to natural pixels.
    pub fn display_to_natural(&self, p: Point) -> Point {
        Point::new((p.x - self.offset.x) / self.scale, (p.y - self.offset.y) / self.scale)
    }

    /// Natural pixel to content coordinates.
    pub fn natural_to_content(&self, p: Point) -> Point {
        Point::new(p.x * self.scale, p.y * self.scale)
    }

    /// Content coordinates to natural pixels.
    pub fn content_to_natural(&self, p: Point) -> Point {
        Point::new(p.x / self.scale, p.y / self.scale)
    }

    /// Container coordinates to content coordinates.
    pub fn container_to_content(&self, p: Point) -> Point {
        Point::new(p.x - self.offset.x, p.y - self.offset.y)
    }

    /// Content coordinates to container coordinates.
    pub fn content_to_container(&self, p: Point) -> Point {
        Point::new(p.x + self.offset.x, p.y + self.offset.y)
    }

    /// True when a container point lies on the image.
    pub fn is_on_image(&self, container_point: Point) -> bool {
        let p = self.container_to_content(container_point);
        let client = self.client_size();
        p.x >= 0.0 && p.y >= 0.0 && p.x <= client.width && p.y <= client.height
    }

    /// True when a container point lies inside the container.
    pub fn is_in_container(&self, p: Point) -> bool {
        p.x >= 0.0 && p.y >= 0.0 && p.x <= self.container.width && p.y <= self.container.height
    }
}

// ============================================================================
// Boundary autoscroll
// ============================================================================

/// Offset limits while autoscrolling.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
struct ScrollLimits {
    top_max: f32,
    top_min: f32,
    left_max: f32,
    left_min: f32,
}

/// Scrolls the image while a drag sits near the container edge.
#[derive(Debug, Clone)]
pub struct AutoScroll {
    direction: Option<Direction>,
    limits: ScrollLimits,
    last_tick: Option<Instant>,
    interval: Duration,
}

impl Default for AutoScroll {
    fn default() -> Self {
        Self {
            direction: None,
            limits: ScrollLimits::default(),
            last_tick: None,
            interval: AUTOSCROLL_INTERVAL,
        }
    }
}

impl AutoScroll {
    /// True while the timer is running.
    pub fn is_active(&self) -> bool {
        self.direction.is_some()
    }

    /// Current scroll direction.
    pub fn direction(&self) -> Option<Direction> {
        self.direction
    }

    /// Start, retarget or stop autoscroll for a drag at `pointer` (container coordinates).
    pub fn check(&mut self, viewport: &Viewport, pointer: Point) {
        let container = viewport.container_size();
        let client = viewport.client_size();
        let offset = viewport.offset();
        let limits = ScrollLimits {
            top_max: AUTOSCROLL_BOUNDING_OFFSET,
            top_min: container.height - client.height - AUTOSCROLL_BOUNDING_OFFSET,
            left_max: AUTOSCROLL_BOUNDING_OFFSET,
            left_min: container.width - client.width - AUTOSCROLL_BOUNDING_OFFSET,
        };

        let vertical = if pointer.y <= AUTOSCROLL_MOUSE_OFFSET && offset.y < limits.top_max {
            Some(Direction::Top)
        } else if pointer.y >= container.height - AUTOSCROLL_MOUSE_OFFSET && offset.y > limits.top_min {
            Some(Direction::Bottom)
        } else {
            None
        };
        let horizontal = if pointer.x <= AUTOSCROLL_MOUSE_OFFSET && offset.x < limits.left_max {
            Some(Direction::Left)
        } else if pointer.x >= container.width - AUTOSCROLL_MOUSE_OFFSET && offset.x > limits.left_min {
            Some(Direction::Right)
        } else {
            None
        };

        let direction = match (vertical, horizontal) {
            (Some(Direction::Top), Some(Direction::Left)) => Some(Direction::TopLeft),
            (Some(Direction::Top), Some(Direction::Right)) => Some(Direction::TopRight),
            (Some(Direction::Bottom), Some(Direction::Left)) => Some(Direction::BottomLeft),
            (Some(Direction::Bottom), Some(Direction::Right)) => Some(Direction::BottomRight),
            (v, h) => v.or(h),
        };

        if direction.is_none() {
            self.stop();
            return;
        }
        if self.direction.is_none() {
            log::trace!("Autoscroll started {:?}", direction);
        }
        self.direction = direction;
        self.limits = limits;
    }

    /// Stop scrolling.
    pub fn stop(&mut self) {
        self.direction = None;
        self.last_tick = None;
    }

    /// Advance the timer. Returns true when the viewport offset changed.
    ///
    /// Stops itself when no further movement is possible.
    pub fn tick(&mut self, viewport: &mut Viewport, now: Instant) -> bool {
        let Some(direction) = self.direction else {
            return false;
        };
        if let Some(last) = self.last_tick
            && now.duration_since(last) < self.interval
        {
            return false;
        }
        self.last_tick = Some(now);

        let offset = viewport.offset();
        let (mut dx, mut dy) = (0.0, 0.0);
        let top = matches!(direction, Direction::Top | Direction::TopLeft | Direction::TopRight);
        let bottom = matches!(direction, Direction::Bottom | Direction::BottomLeft | Direction::BottomRight);
        let left = matches!(direction, Direction::Left | Direction::TopLeft | Direction::BottomLeft);
        let right = matches!(direction, Direction::Right | Direction::TopRight | Direction::BottomRight);

        if top && offset.y < self.limits.top_max {
            dy = AUTOSCROLL_STEP;
        } else if bottom && offset.y > self.limits.top_min {
            dy = -AUTOSCROLL_STEP;
        }
        if left && offset.x < self.limits.left_max {
            dx = AUTOSCROLL_STEP;
        } else if right && offset.x > self.limits.left_min {
            dx = -AUTOSCROLL_STEP;
        }

        if dx == 0.0 && dy == 0.0 {
            self.stop();
            return false;
        }
        viewport.pan_by(dx, dy);
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    const EPSILON: f32 = 0.001;

    fn approx_eq(a: f32, b: f32) -> bool {
        (a - b).abs() < EPSILON
    }

    fn viewport_100_in_200() -> Viewport {
        let mut v = Viewport::default();
        v.fit(Size::new(100.0, 100.0), Size::new(200.0, 200.0), 0.0);
        v
    }

    #[test]
    fn test_fit_width_bound() {
        let mut v = Viewport::default();
        v.fit(Size::new(400.0, 100.0), Size::new(200.0, 200.0), 0.0);
        assert!(approx_eq(v.scale(), 0.5));
        assert!(approx_eq(v.offset().x, 0.0));
        assert!(approx_eq(v.offset().y, 75.0));
    }

    #[test]
    fn test_fit_height_bound_with_padding() {
        let mut v = Viewport::default();
        v.fit(Size::new(100.0, 400.0), Size::new(220.0, 220.0), 10.0);
        assert!(approx_eq(v.scale(), 0.5));
        assert!(approx_eq(v.client_size().width, 50.0));
        assert!(approx_eq(v.offset().x, 85.0));
        assert!(approx_eq(v.offset().y, 10.0));
    }

    #[test]
    fn test_zoom_rounds_and_clamps() {
        let mut v = viewport_100_in_200();
        v.zoom(ZoomDirection::Out, 1.95, None);
        assert!(approx_eq(v.scale(), 0.1));
        v.zoom_to(100.0, None);
        assert!(approx_eq(v.scale(), MAX_SCALE));
    }

    #[test]
    fn test_zoom_to_cursor_preserves_cursor_point() {
        // scale 1.0, anchored at display (50, 50)
        let mut v = Viewport::default();
        v.fit(Size::new(200.0, 200.0), Size::new(200.0, 200.0), 0.0);
        assert!(approx_eq(v.scale(), 1.0));
        let anchor = Point::new(50.0, 50.0);
        let before = v.display_to_natural(anchor);

        let previous = v.zoom(ZoomDirection::In, 1.0, Some(anchor));
        assert_eq!(previous, Size::new(200.0, 200.0));
        assert!(approx_eq(v.scale(), 2.0));

        let after = v.display_to_natural(anchor);
        assert!(approx_eq(before.x, after.x));
        assert!(approx_eq(before.y, after.y));
    }

    #[test]
    fn test_zoom_without_anchor_uses_center() {
        let mut v = viewport_100_in_200();
        let center = Point::new(100.0, 100.0);
        let before = v.display_to_natural(center);
        v.zoom(ZoomDirection::In, 0.5, None);
        let after = v.display_to_natural(center);
        assert!(approx_eq(before.x, after.x));
        assert!(approx_eq(before.y, after.y));
    }

    #[test]
    fn test_resize_container_refits() {
        let mut v = viewport_100_in_200();
        let previous = v.resize_container(Size::new(400.0, 400.0));
        assert_eq!(previous, Size::new(200.0, 200.0));
        assert_eq!(v.client_size(), Size::new(400.0, 400.0));
    }

    #[test]
    fn test_pan_by() {
        let mut v = viewport_100_in_200();
        v.pan_by(5.0, -10.0);
        assert_eq!(v.offset(), Point::new(5.0, -10.0));
        assert!(v.is_on_image(Point::new(6.0, 0.0)));
        assert!(!v.is_on_image(Point::new(4.0, 0.0)));
    }

    #[test]
    fn test_autoscroll_moves_until_limit() {
        let mut v = Viewport::default();
        v.fit(Size::new(400.0, 400.0), Size::new(200.0, 200.0), 0.0);
        v.zoom_to(1.0, Some(Point::new(0.0, 0.0)));
        assert_eq!(v.offset(), Point::new(0.0, 0.0));

        let mut scroll = AutoScroll::default();
        scroll.check(&v, Point::new(5.0, 100.0));
        assert_eq!(scroll.direction(), Some(Direction::Left));

        let mut now = Instant::now();
        let mut ticks = 0;
        while scroll.tick(&mut v, now) {
            ticks += 1;
            now += AUTOSCROLL_INTERVAL;
        }
        assert_eq!(ticks, 5);
        assert!(approx_eq(v.offset().x, 40.0));
        assert!(!scroll.is_active());
    }

    #[test]
    fn test_autoscroll_respects_interval() {
        let mut v = Viewport::default();
        v.fit(Size::new(400.0, 400.0), Size::new(200.0, 200.0), 0.0);
        v.zoom_to(1.0, Some(Point::new(0.0, 0.0)));
        let mut scroll = AutoScroll::default();
        scroll.check(&v, Point::new(195.0, 195.0));
        assert_eq!(scroll.direction(), Some(Direction::BottomRight));

        let now = Instant::now();
        assert!(scroll.tick(&mut v, now));
        assert!(!scroll.tick(&mut v, now));
        assert_eq!(v.offset(), Point::new(-8.0, -8.0));
    }

    #[test]
    fn test_autoscroll_stops_outside_band() {
        let v = viewport_100_in_200();
        let mut scroll = AutoScroll::default();
        scroll.check(&v, Point::new(100.0, 100.0));
        assert!(!scroll.is_active());
    }

    proptest! {
        #[test]
        fn prop_display_natural_inverse(
            scale in 0.1f32..20.0,
            ox in -500.0f32..500.0,
            oy in -500.0f32..500.0,
            x in 0.0f32..1000.0,
            y in 0.0f32..1000.0,
        ) {
            let mut v = Viewport::default();
            v.fit(Size::new(1000.0, 1000.0), Size::new(1000.0, 1000.0), 0.0);
            v.zoom_to(scale, Some(Point::new(0.0, 0.0)));
            v.pan_by(ox, oy);
            let p = Point::new(x, y);
            let back = v.display_to_natural(v.natural_to_display(p));
            let tolerance = 1e-3 * (1.0 + x.abs().max(y.abs()));
            prop_assert!((back.x - p.x).abs() < tolerance);
            prop_assert!((back.y - p.y).abs() < tolerance);
        }
    }
}
