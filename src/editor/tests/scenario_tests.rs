//! Reference scenarios for drawing, zooming, detection and history.

use super::{approx_eq, drag, editor, EPSILON, NATURAL};
use crate::ai::client::tests::ScriptedTransport;
use crate::ai::AiTrigger;
use crate::config::EditorConfig;
use crate::editor::Editor;
use crate::model::{EditorTool, ModelKind, ObjectStatus, Point, Shape};
use crate::viewport::ZoomDirection;

#[test]
fn test_draw_and_commit_rectangle() {
    let mut editor = editor(EditorTool::Rectangle);
    editor.set_current_label(Some(1));

    drag(&mut editor, (10.0, 10.0), (100.0, 100.0));
    assert_eq!(editor.data().objects.len(), 1);
    assert_eq!(editor.finish_creating_object(Some(1)).unwrap(), Some(0));

    let data = editor.data();
    assert_eq!(data.objects.len(), 1);
    assert_eq!(data.objects[0].status, ObjectStatus::Committed);
    assert!(data.active_object_index.is_none());
    assert!(data.creating.is_none());

    let persisted = editor.persisted();
    assert_eq!(persisted.len(), 1);
    assert_eq!(persisted[0].category_name, "cat");
    let bbox = persisted[0].bounding_box.unwrap();
    assert!(approx_eq(bbox.xmin, 0.05));
    assert!(approx_eq(bbox.ymin, 0.05));
    assert!(approx_eq(bbox.xmax, 0.5));
    assert!(approx_eq(bbox.ymax, 0.5));
}

#[test]
fn test_zoom_keeps_anchor_fixed() {
    let mut editor = editor(EditorTool::Drag);
    let anchor = Point::new(50.0, 50.0);
    let before = editor.viewport().display_to_natural(anchor);

    editor.zoom(ZoomDirection::In, 1.0, Some(anchor));

    assert!(approx_eq(editor.viewport().scale(), 2.0));
    let after = editor.viewport().display_to_natural(anchor);
    assert!(approx_eq(before.x, after.x));
    assert!(approx_eq(before.y, after.y));
    assert_eq!(editor.store().client_size(), editor.viewport().client_size());
}

#[test]
fn test_zoom_rescales_objects() {
    let mut editor = editor(EditorTool::Rectangle);
    drag(&mut editor, (10.0, 10.0), (100.0, 100.0));
    let before = editor.persisted();

    editor.zoom(ZoomDirection::In, 1.0, None);

    let rect = editor.data().objects[0].shape.rect().unwrap().rect;
    assert!(approx_eq(rect.x, 20.0));
    assert!(approx_eq(rect.width, 180.0));
    // Normalized output does not depend on zoom
    let after = editor.persisted();
    let (a, b) = (before[0].bounding_box.unwrap(), after[0].bounding_box.unwrap());
    assert!((a.xmax - b.xmax).abs() < EPSILON);
}

#[test]
fn test_detection_candidates_follow_suggested_threshold() {
    let mut editor = editor(EditorTool::Rectangle);
    editor.set_current_label(Some(1));
    let mut transport = ScriptedTransport::succeeding(serde_json::json!({
        "objects": [
            {"bbox": [10.0, 10.0, 50.0, 50.0], "score": 0.9},
            {"bbox": [60.0, 60.0, 120.0, 120.0], "score": 0.2},
        ],
        "suggestThreshold": 0.5,
    }));

    let changed = editor
        .run_ai_request(&mut transport, AiTrigger::detection("cat"))
        .unwrap();
    assert!(changed);
    assert_eq!(transport.submitted.len(), 1);
    assert_eq!(transport.submitted[0].0, ModelKind::Detection);

    let data = editor.data();
    assert!(data.is_batch_editing);
    assert!(!editor.is_requiring());
    assert_eq!(data.objects.len(), 2);

    let status_at = |x: f32| {
        data.objects
            .iter()
            .find(|o| matches!(&o.shape, Shape::Rectangle(r) if approx_eq(r.rect.x, x)))
            .map(|o| o.status)
    };
    assert_eq!(status_at(10.0), Some(ObjectStatus::Checked));
    assert_eq!(status_at(60.0), Some(ObjectStatus::Unchecked));
    assert!(data.objects.iter().all(|o| o.label_id == Some(1)));
}

#[test]
fn test_history_keeps_most_recent_snapshots() {
    let mut config = EditorConfig::default();
    config.history.capacity = 20;
    let mut editor = Editor::new(config);
    editor.load_image(NATURAL, NATURAL, &[]).unwrap();

    for i in 0..25 {
        editor.set_classification(1, format!("v{}", i));
    }
    assert_eq!(editor.store().history().len(), 20);

    let mut undos = 0;
    while editor.undo() {
        undos += 1;
    }
    assert_eq!(undos, 19);
    assert!(!editor.can_undo());
    assert_eq!(editor.data().classifications[0].value, "v5");

    assert!(editor.redo());
    assert_eq!(editor.data().classifications[0].value, "v6");
}
