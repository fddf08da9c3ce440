//! Mask rasterization and run-length encoding.
//!
//! Masks are binary images at natural resolution. They are stored as a flat
//! `[start, length, start, length, ...]` run list over the row-major pixels and
//! decoded into a [`GrayImage`] (255 = set) for rendering and hit-testing.

use std::sync::Arc;

use image::GrayImage;
use tiny_skia::{
    BlendMode, Color, FillRule, LineCap, LineJoin, Paint, PathBuilder, Pixmap, Stroke, Transform,
};

use crate::model::{MaskData, MaskStep, Point, Size};

// ============================================================================
// RLE
// ============================================================================

/// Encode set pixels of a row-major bitmap as `[start, length, ...]` runs.
pub fn encode_rle(bits: impl IntoIterator<Item = bool>) -> Vec<u32> {
    let mut runs = Vec::new();
    let mut run_len = 0u32;
    let mut index = 0u32;
    for bit in bits {
        if bit {
            if run_len == 0 {
                runs.push(index);
            }
            run_len += 1;
        } else if run_len > 0 {
            runs.push(run_len);
            run_len = 0;
        }
        index += 1;
    }
    if run_len > 0 {
        runs.push(run_len);
    }
    runs
}

/// Decode runs into a 0/1 vector of `length` pixels.
///
/// Runs that reach past `length` are truncated; a trailing start without a
/// length is ignored.
pub fn decode_rle(rle: &[u32], length: usize) -> Vec<u8> {
    let mut bits = vec![0u8; length];
    for run in rle.chunks_exact(2) {
        let start = run[0] as usize;
        if start >= length {
            continue;
        }
        let len = (run[1] as usize).min(length - start);
        bits[start..start + len].fill(1);
    }
    bits
}

/// Decode runs into a grayscale bitmap of the given size.
pub fn rle_to_bitmap(rle: &[u32], width: u32, height: u32) -> GrayImage {
    let bits = decode_rle(rle, width as usize * height as usize);
    let pixels = bits.into_iter().map(|b| b * 255).collect();
    GrayImage::from_raw(width, height, pixels).unwrap_or_else(|| GrayImage::new(width, height))
}

/// Encode a grayscale bitmap; any non-zero pixel counts as set.
pub fn bitmap_to_rle(bitmap: &GrayImage) -> Vec<u32> {
    encode_rle(bitmap.pixels().map(|p| p.0[0] > 0))
}

/// Mask data for an RLE with its decoded bitmap attached.
pub fn mask_with_bitmap(rle: Vec<u32>, natural: Size) -> MaskData {
    let (width, height) = natural.to_pixels();
    let bitmap = rle_to_bitmap(&rle, width, height);
    MaskData {
        rle,
        bitmap: Some(Arc::new(bitmap)),
    }
}

/// True when the bitmap is set at the natural pixel containing `p`.
pub fn sample_bitmap(bitmap: &GrayImage, p: Point) -> bool {
    if p.x < 0.0 || p.y < 0.0 {
        return false;
    }
    let (x, y) = (p.x.floor() as u32, p.y.floor() as u32);
    x < bitmap.width() && y < bitmap.height() && bitmap.get_pixel(x, y).0[0] > 0
}

// ============================================================================
// Rasterization
// ============================================================================

fn path_from_points(points: &[Point], close: bool) -> Option<tiny_skia::Path> {
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

fn step_paint(positive: bool) -> Paint<'static> {
    let mut paint = Paint::default();
    paint.anti_alias = false;
    if positive {
        paint.set_color(Color::WHITE);
    } else {
        paint.blend_mode = BlendMode::Clear;
    }
    paint
}

/// Draw one mask step onto `pixmap`. Step points must already be in pixmap space.
fn draw_step(pixmap: &mut Pixmap, step: &MaskStep, points: &[Point]) {
    let paint = step_paint(step.positive);
    if step.tool.is_pen() {
        if let Some(path) = path_from_points(points, true) {
            pixmap.fill_path(&path, &paint, FillRule::Winding, Transform::identity(), None);
        }
        return;
    }

    let stroke = Stroke {
        width: step.radius.max(1.0),
        line_cap: LineCap::Round,
        line_join: LineJoin::Round,
        ..Stroke::default()
    };
    let distinct = points.windows(2).any(|w| w[0] != w[1]);
    match (distinct, points.first()) {
        (true, _) => {
            if let Some(path) = path_from_points(points, false) {
                pixmap.stroke_path(&path, &paint, &stroke, Transform::identity(), None);
            }
        }
        (false, Some(p)) => {
            // A brush click without movement paints a single dot
            if let Some(dot) = PathBuilder::from_circle(p.x, p.y, stroke.width / 2.0) {
                pixmap.fill_path(&dot, &paint, FillRule::Winding, Transform::identity(), None);
            }
        }
        (false, None) => {}
    }
}

/// Rasterize mask steps on top of an optional existing bitmap.
///
/// Steps are in content coordinates for `client`; the result has natural
/// resolution. Returns `None` when the natural size is empty.
pub fn rasterize_mask(
    natural: Size,
    client: Size,
    existing: Option<&GrayImage>,
    steps: &[MaskStep],
) -> Option<GrayImage> {
    let (width, height) = natural.to_pixels();
    let mut pixmap = Pixmap::new(width, height)?;

    if let Some(bitmap) = existing {
        for (pixel, src) in pixmap.data_mut().chunks_exact_mut(4).zip(bitmap.pixels()) {
            if src.0[0] > 0 {
                pixel.copy_from_slice(&[255, 255, 255, 255]);
            }
        }
    }

    for step in steps {
        let points: Vec<Point> = step.points.iter().map(|p| p.rescale(client, natural)).collect();
        draw_step(&mut pixmap, step, &points);
    }

    let pixels = pixmap
        .data()
        .chunks_exact(4)
        .map(|px| if px[3] > 0 { 255 } else { 0 })
        .collect();
    GrayImage::from_raw(width, height, pixels)
}

/// Rasterize and encode a mask. Returns an empty RLE when no pixel is set.
pub fn steps_to_rle(
    natural: Size,
    client: Size,
    existing: Option<&GrayImage>,
    steps: &[MaskStep],
) -> Vec<u32> {
    rasterize_mask(natural, client, existing, steps)
        .map(|bitmap| bitmap_to_rle(&bitmap))
        .unwrap_or_default()
}

/// Set every pixel inside a rectangle.
#[cfg(test)]
pub(crate) fn fill_rect(bitmap: &mut GrayImage, x: u32, y: u32, width: u32, height: u32) {
    for py in y..(y + height).min(bitmap.height()) {
        for px in x..(x + width).min(bitmap.width()) {
            bitmap.put_pixel(px, py, image::Luma([255]));
        }
    }
}
