//! End-to-end tests of the editor controller.
//!
//! These drive [`Editor`] the way a host does: pointer events in container
//! coordinates and named commands, then assertions on the draw data and the
//! persisted output.

mod ai_tests;
mod property_tests;
mod scenario_tests;

use super::Editor;
use crate::color::Rgb;
use crate::config::EditorConfig;
use crate::format::{BoundingBox, PersistedAnnotation};
use crate::model::{Category, EditorTool, Point, Size};
use crate::tools::{MouseButton, PointerInput};

pub(super) const EPSILON: f32 = 1e-4;

/// Natural size of the test image. The container matches it, so content,
/// container and natural coordinates coincide at scale 1.
pub(super) const NATURAL: Size = Size::new(200.0, 200.0);

pub(super) fn approx_eq(a: f32, b: f32) -> bool {
    (a - b).abs() < EPSILON
}

pub(super) fn categories() -> Vec<Category> {
    vec![
        Category::new(1, "cat", Rgb::new(255, 0, 0)),
        Category::new(2, "dog", Rgb::new(0, 0, 255)),
    ]
}

pub(super) fn config() -> EditorConfig {
    EditorConfig {
        categories: categories(),
        ..Default::default()
    }
}

/// Editor with the test image loaded and `tool` selected.
pub(super) fn editor_with(tool: EditorTool, annotations: &[PersistedAnnotation]) -> Editor {
    let mut editor = Editor::new(config());
    editor.load_image(NATURAL, NATURAL, annotations).unwrap();
    editor.select_tool(tool);
    editor
}

pub(super) fn editor(tool: EditorTool) -> Editor {
    editor_with(tool, &[])
}

/// Stored box annotation labeled "cat".
pub(super) fn cat_box(xmin: f32, ymin: f32, xmax: f32, ymax: f32) -> PersistedAnnotation {
    PersistedAnnotation {
        category_id: Some(1),
        category_name: "cat".to_string(),
        bounding_box: Some(BoundingBox {
            xmin,
            ymin,
            xmax,
            ymax,
        }),
        ..Default::default()
    }
}

pub(super) fn input(x: f32, y: f32) -> PointerInput {
    PointerInput::new(Point::new(x, y))
}

pub(super) fn click(editor: &mut Editor, x: f32, y: f32) {
    editor.pointer_down(input(x, y));
    editor.pointer_up(input(x, y));
}

pub(super) fn right_click(editor: &mut Editor, x: f32, y: f32) -> bool {
    let handled = editor.pointer_down(input(x, y).with_button(MouseButton::Right));
    editor.pointer_up(input(x, y).with_button(MouseButton::Right));
    handled
}

/// Press at `from`, drag through the midpoint and release at `to`.
pub(super) fn drag(editor: &mut Editor, from: (f32, f32), to: (f32, f32)) {
    editor.pointer_down(input(from.0, from.1));
    let mid = ((from.0 + to.0) / 2.0, (from.1 + to.1) / 2.0);
    editor.pointer_move(input(mid.0, mid.1).held());
    editor.pointer_move(input(to.0, to.1).held());
    editor.pointer_up(input(to.0, to.1));
}
