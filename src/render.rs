//! Layered canvas rendering.
//!
//! The editor repaints three container-sized layers from its state on every
//! [`redraw_layers`] call:
//! - image: background and the image itself
//! - objects: every object that is not being edited
//! - overlay: the creating object, prompts, loading shade and hover focus
//!
//! Hosts blit the layers in that order, or use [`RenderLayers::composite`].

use image::{GrayImage, RgbaImage};
use tiny_skia::{
    Color, FillRule, FilterQuality, IntSize, LineCap, LineJoin, Paint, PathBuilder, Pixmap,
    PixmapPaint, Stroke, StrokeDash, Transform,
};

use crate::color::Rgb;
use crate::model::{
    AnnotationObject, DrawData, EditState, KeypointVisibility, MaskStep, ObjectStatus, Point,
    PromptItem, PromptKind, Rect, Shape,
};
use crate::viewport::Viewport;

// ============================================================================
// Styling
// ============================================================================

/// Container background outside the image.
const BACKGROUND: Rgb = Rgb::new(32, 32, 36);

/// Placeholder drawn when the host gave no pixels.
const IMAGE_PLACEHOLDER: Rgb = Rgb::new(96, 96, 104);

const POSITIVE_PROMPT: Rgb = Rgb::new(0, 200, 83);
const NEGATIVE_PROMPT: Rgb = Rgb::new(229, 57, 53);

const FILL_ALPHA: f32 = 0.2;
const MASK_ALPHA: f32 = 0.45;
const LINE_WIDTH: f32 = 2.0;
const FOCUS_LINE_WIDTH: f32 = 3.0;
const HANDLE_RADIUS: f32 = 3.5;
const KEYPOINT_RADIUS: f32 = 4.0;

/// How an object is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Style {
    color: Rgb,
    fill_alpha: f32,
    line_width: f32,
    dashed: bool,
    handles: bool,
}

impl Style {
    fn for_object(object: &AnnotationObject) -> Self {
        let (fill_alpha, dashed) = match object.status {
            ObjectStatus::Committed => (FILL_ALPHA, false),
            ObjectStatus::Checked => (FILL_ALPHA, true),
            ObjectStatus::Unchecked => (0.0, true),
        };
        Self {
            color: object.color,
            fill_alpha,
            line_width: LINE_WIDTH,
            dashed,
            handles: false,
        }
    }

    fn with_handles(mut self) -> Self {
        self.handles = true;
        self
    }

    fn with_line_width(mut self, width: f32) -> Self {
        self.line_width = width;
        self
    }
}

fn paint(color: Rgb, alpha: f32) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.set_color(color.to_skia(alpha));
    paint.anti_alias = true;
    paint
}

fn stroke(width: f32, dashed: bool) -> Stroke {
    Stroke {
        width,
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        dash: if dashed {
            StrokeDash::new(vec![6.0, 4.0], 0.0)
        } else {
            None
        },
        ..Stroke::default()
    }
}

// ============================================================================
// Layers
// ============================================================================

/// The three canvases of the editor.
#[derive(Debug, Clone)]
pub struct RenderLayers {
    image: Pixmap,
    objects: Pixmap,
    overlay: Pixmap,
}

impl RenderLayers {
    /// Allocate layers of the container size. `None` when either side is zero.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        Some(Self {
            image: Pixmap::new(width, height)?,
            objects: Pixmap::new(width, height)?,
            overlay: Pixmap::new(width, height)?,
        })
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &Pixmap {
        &self.image
    }

    pub fn objects(&self) -> &Pixmap {
        &self.objects
    }

    pub fn overlay(&self) -> &Pixmap {
        &self.overlay
    }

    /// All layers flattened into one pixmap.
    pub fn composite(&self) -> Pixmap {
        let mut out = self.image.clone();
        for layer in [&self.objects, &self.overlay] {
            out.draw_pixmap(0, 0, layer.as_ref(), &PixmapPaint::default(), Transform::identity(), None);
        }
        out
    }

    /// The composited canvas as a straight-alpha image.
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        let canvas = self.composite();
        let data = canvas
            .pixels()
            .iter()
            .flat_map(|p| {
                let c = p.demultiply();
                [c.red(), c.green(), c.blue(), c.alpha()]
            })
            .collect();
        RgbaImage::from_raw(canvas.width(), canvas.height(), data)
    }
}

/// Everything a redraw reads.
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub viewport: &'a Viewport,
    pub data: &'a DrawData,
    pub edit: &'a EditState,
    /// Image pixels at natural resolution, if the host provided them
    pub image: Option<&'a RgbaImage>,
}

impl Scene<'_> {
    /// Content to container transform.
    fn content_transform(&self) -> Transform {
        let offset = self.viewport.offset();
        Transform::from_translate(offset.x, offset.y)
    }

    /// Natural to container transform.
    fn natural_transform(&self) -> Transform {
        let offset = self.viewport.offset();
        let scale = self.viewport.scale();
        Transform::from_row(scale, 0.0, 0.0, scale, offset.x, offset.y)
    }

    /// Index whose creating copy is drawn on the overlay instead.
    fn edited_index(&self) -> Option<usize> {
        self.data
            .active_object_index
            .filter(|_| self.data.creating.is_some())
    }
}

/// Repaint every layer from `scene`.
pub fn redraw_layers(layers: &mut RenderLayers, scene: &Scene<'_>) {
    draw_image_layer(&mut layers.image, scene);
    draw_objects_layer(&mut layers.objects, scene);
    draw_overlay_layer(&mut layers.overlay, scene);
}

// ============================================================================
// Image Layer
// ============================================================================

/// Premultiply an RGBA image into a pixmap.
fn rgba_to_pixmap(image: &RgbaImage) -> Option<Pixmap> {
    let size = IntSize::from_wh(image.width(), image.height())?;
    let data = image
        .pixels()
        .flat_map(|p| {
            let [r, g, b, a] = p.0;
            let premultiply = |c: u8| (u16::from(c) * u16::from(a) / 255) as u8;
            [premultiply(r), premultiply(g), premultiply(b), a]
        })
        .collect();
    Pixmap::from_vec(data, size)
}

fn draw_image_layer(pixmap: &mut Pixmap, scene: &Scene<'_>) {
    pixmap.fill(BACKGROUND.to_skia(1.0));
    let offset = scene.viewport.offset();
    let client = scene.viewport.client_size();

    let image = scene.image.and_then(rgba_to_pixmap);
    match image {
        Some(image) => {
            let paint = PixmapPaint {
                quality: FilterQuality::Bilinear,
                ..PixmapPaint::default()
            };
            pixmap.draw_pixmap(0, 0, image.as_ref(), &paint, scene.natural_transform(), None);
        }
        None => {
            if let Some(rect) = tiny_skia::Rect::from_xywh(offset.x, offset.y, client.width, client.height) {
                pixmap.fill_rect(rect, &paint(IMAGE_PLACEHOLDER, 1.0), Transform::identity(), None);
            }
        }
    }
}

// ============================================================================
// Objects Layer
// ============================================================================

fn draw_objects_layer(pixmap: &mut Pixmap, scene: &Scene<'_>) {
    pixmap.fill(Color::TRANSPARENT);
    let edited = scene.edited_index();
    for (index, object) in scene.data.objects.iter().enumerate() {
        if object.hidden || Some(index) == edited {
            continue;
        }
        let mut style = Style::for_object(object);
        if scene.edit.focus_object_index == Some(index) {
            style = style.with_line_width(FOCUS_LINE_WIDTH);
        }
        draw_object(pixmap, scene, object, style);
    }
}

fn ring_path(points: &[Point], close: bool) -> Option<tiny_skia::Path> {
    let (first, rest) = points.split_first()?;
    let mut pb = PathBuilder::new();
    pb.move_to(first.x, first.y);
    for p in rest {
        pb.line_to(p.x, p.y);
    }
    if close {
        pb.close();
    }
    pb.finish()
}

fn rect_path(rect: &Rect) -> Option<tiny_skia::Path> {
    let rect = tiny_skia::Rect::from_xywh(rect.x, rect.y, rect.width, rect.height)?;
    Some(PathBuilder::from_rect(rect))
}

fn draw_handle(pixmap: &mut Pixmap, p: Point, color: Rgb, radius: f32, transform: Transform) {
    if let Some(dot) = PathBuilder::from_circle(p.x, p.y, radius) {
        pixmap.fill_path(&dot, &paint(color, 1.0), FillRule::Winding, transform, None);
    }
}

fn fill_and_stroke(pixmap: &mut Pixmap, path: &tiny_skia::Path, style: Style, transform: Transform) {
    if style.fill_alpha > 0.0 {
        pixmap.fill_path(path, &paint(style.color, style.fill_alpha), FillRule::EvenOdd, transform, None);
    }
    pixmap.stroke_path(
        path,
        &paint(style.color, 1.0),
        &stroke(style.line_width, style.dashed),
        transform,
        None,
    );
}

/// Colorize a natural-resolution mask bitmap.
fn mask_pixmap(bitmap: &GrayImage, color: Rgb, alpha: f32) -> Option<Pixmap> {
    let mut pixmap = Pixmap::new(bitmap.width(), bitmap.height())?;
    let fill = color.to_skia(alpha).premultiply().to_color_u8();
    let rgba = [fill.red(), fill.green(), fill.blue(), fill.alpha()];
    for (px, src) in pixmap.data_mut().chunks_exact_mut(4).zip(bitmap.pixels()) {
        if src.0[0] > 0 {
            px.copy_from_slice(&rgba);
        }
    }
    Some(pixmap)
}

fn draw_object(pixmap: &mut Pixmap, scene: &Scene<'_>, object: &AnnotationObject, style: Style) {
    let transform = scene.content_transform();
    match &object.shape {
        Shape::Rectangle(element) => {
            if !element.visible {
                return;
            }
            if let Some(path) = rect_path(&element.rect) {
                fill_and_stroke(pixmap, &path, style, transform);
            }
            if style.handles {
                let r = &element.rect;
                for corner in [
                    Point::new(r.x, r.y),
                    Point::new(r.max_x(), r.y),
                    Point::new(r.max_x(), r.max_y()),
                    Point::new(r.x, r.max_y()),
                ] {
                    draw_handle(pixmap, corner, style.color, HANDLE_RADIUS, transform);
                }
            }
        }
        Shape::Polygon(group) => {
            if !group.visible {
                return;
            }
            let mut pb = PathBuilder::new();
            for ring in group.rings.iter().filter(|r| !r.is_empty()) {
                pb.move_to(ring[0].x, ring[0].y);
                for p in &ring[1..] {
                    pb.line_to(p.x, p.y);
                }
                pb.close();
            }
            if let Some(path) = pb.finish() {
                fill_and_stroke(pixmap, &path, style, transform);
            }
            if style.handles {
                for p in group.rings.iter().flatten() {
                    draw_handle(pixmap, *p, style.color, HANDLE_RADIUS, transform);
                }
            }
        }
        Shape::Mask(mask) => {
            let Some(bitmap) = mask.bitmap.as_deref() else {
                return;
            };
            if let Some(colored) = mask_pixmap(bitmap, style.color, MASK_ALPHA) {
                pixmap.draw_pixmap(
                    0,
                    0,
                    colored.as_ref(),
                    &PixmapPaint::default(),
                    scene.natural_transform(),
                    None,
                );
            }
        }
        Shape::Skeleton(skeleton) => {
            if let Some(element) = &skeleton.rect
                && element.visible
                && let Some(path) = rect_path(&element.rect)
            {
                let frame = Style {
                    fill_alpha: 0.0,
                    dashed: true,
                    ..style
                };
                fill_and_stroke(pixmap, &path, frame, transform);
            }
            let visible = |i: usize| {
                skeleton
                    .keypoints
                    .get(i)
                    .filter(|k| k.visibility == KeypointVisibility::LabeledVisible)
            };
            for (a, b) in skeleton.segments() {
                let (Some(a), Some(b)) = (visible(a), visible(b)) else {
                    continue;
                };
                if let Some(path) = ring_path(&[a.point, b.point], false) {
                    pixmap.stroke_path(
                        &path,
                        &paint(style.color, 1.0),
                        &stroke(style.line_width, false),
                        transform,
                        None,
                    );
                }
            }
            for keypoint in &skeleton.keypoints {
                if keypoint.visibility == KeypointVisibility::LabeledVisible {
                    draw_handle(pixmap, keypoint.point, keypoint.color, KEYPOINT_RADIUS, transform);
                }
            }
        }
    }
}

// ============================================================================
// Overlay Layer
// ============================================================================

fn draw_mask_step(pixmap: &mut Pixmap, step: &MaskStep, color: Rgb, scene: &Scene<'_>) {
    let transform = scene.content_transform();
    let color = if step.positive { color } else { NEGATIVE_PROMPT };
    if step.tool.is_brush() {
        let Some(path) = ring_path(&step.points, false) else {
            return;
        };
        // Brush width is in natural pixels
        let width = step.radius * scene.viewport.scale();
        pixmap.stroke_path(&path, &paint(color, MASK_ALPHA), &stroke(width, false), transform, None);
    } else if let Some(path) = ring_path(&step.points, false) {
        pixmap.fill_path(&path, &paint(color, FILL_ALPHA), FillRule::Winding, transform, None);
        pixmap.stroke_path(&path, &paint(color, 1.0), &stroke(LINE_WIDTH, false), transform, None);
    }
}

fn draw_prompt(pixmap: &mut Pixmap, prompt: &PromptItem, transform: Transform) {
    let color = if prompt.is_positive {
        POSITIVE_PROMPT
    } else {
        NEGATIVE_PROMPT
    };
    match prompt.kind {
        PromptKind::Rect => {
            if let Some(path) = prompt.rect.as_ref().and_then(rect_path) {
                pixmap.stroke_path(&path, &paint(color, 1.0), &stroke(LINE_WIDTH, true), transform, None);
            }
        }
        PromptKind::Point => {
            if let Some(point) = prompt.point {
                draw_handle(pixmap, point, color, KEYPOINT_RADIUS, transform);
            }
        }
        PromptKind::Stroke | PromptKind::EdgeStitch => {
            if let Some(path) = ring_path(&prompt.stroke, false) {
                let width = prompt.radius.unwrap_or(LINE_WIDTH).max(1.0);
                pixmap.stroke_path(&path, &paint(color, 0.5), &stroke(width, false), transform, None);
            }
        }
        PromptKind::Modify => {}
    }
}

fn draw_overlay_layer(pixmap: &mut Pixmap, scene: &Scene<'_>) {
    pixmap.fill(Color::TRANSPARENT);
    let transform = scene.content_transform();
    let data = scene.data;

    if let Some(creating) = &data.creating
        && !scene.edit.hide_creating_object
    {
        let style = Style::for_object(&creating.object).with_handles();
        draw_object(pixmap, scene, &creating.object, style);

        // Rubber band from the last vertex of the open ring to the cursor
        if let Shape::Polygon(group) = &creating.object.shape
            && let Some(ring) = creating.curr_index.and_then(|i| group.rings.get(i))
            && let (Some(last), Some(cursor)) = (ring.last(), scene.edit.last_pointer)
            && let Some(path) = ring_path(&[*last, scene.viewport.container_to_content(cursor)], false)
        {
            pixmap.stroke_path(
                &path,
                &paint(creating.object.color, 1.0),
                &stroke(1.0, true),
                transform,
                None,
            );
        }

        for step in creating.temp_mask_steps.iter().chain(creating.mask_step.as_ref()) {
            draw_mask_step(pixmap, step, creating.object.color, scene);
        }
    }

    for prompt in data.prompt.prompts_queue.iter().chain(data.prompt.creating_prompt.as_ref()) {
        draw_prompt(pixmap, prompt, transform);
    }

    if let Some(path) = data.prompt.active_rect_while_loading.as_ref().and_then(rect_path) {
        pixmap.fill_path(&path, &paint(Rgb::WHITE, 0.25), FillRule::Winding, transform, None);
    }
}
