//! AI request lifecycle and batch review.

use serde_json::json;

use super::{approx_eq, drag, editor, input};
use crate::ai::client::tests::ScriptedTransport;
use crate::ai::{AiError, AiTrigger};
use crate::editor::Editor;
use crate::error::EditorError;
use crate::model::{EditorTool, ModelKind, ObjectStatus, PromptKind, Shape};

fn detection_result() -> serde_json::Value {
    json!({
        "objects": [
            {"bbox": [10.0, 10.0, 50.0, 50.0], "score": 0.9},
            {"bbox": [60.0, 60.0, 120.0, 120.0], "score": 0.2},
        ],
        "suggestThreshold": 0.5,
    })
}

fn detected() -> Editor {
    let mut editor = editor(EditorTool::Rectangle);
    editor.set_ai_annotation(true);
    editor.set_current_label(Some(1));
    let mut transport = ScriptedTransport::succeeding(detection_result());
    assert!(
        editor
            .run_ai_request(&mut transport, AiTrigger::detection("cat"))
            .unwrap()
    );
    editor
}

fn status_at(editor: &Editor, x: f32) -> Option<ObjectStatus> {
    editor
        .data()
        .objects
        .iter()
        .find(|o| matches!(&o.shape, Shape::Rectangle(r) if approx_eq(r.rect.x, x)))
        .map(|o| o.status)
}

#[test]
fn test_requests_block_input_until_completed() {
    let mut editor = editor(EditorTool::Rectangle);
    let request = editor
        .begin_ai_request(AiTrigger::detection("cat"))
        .unwrap()
        .unwrap();
    assert!(editor.is_requiring());

    assert!(!editor.pointer_down(input(20.0, 20.0)));
    assert!(editor.data().creating.is_none());
    assert!(editor.begin_ai_request(AiTrigger::detection("dog")).unwrap().is_none());

    let result = editor.complete_ai_request(&request, Err(AiError::TaskFailed("boom".to_string())));
    assert!(matches!(result, Err(EditorError::Ai(AiError::TaskFailed(_)))));
    assert!(!editor.is_requiring());
    assert!(editor.data().objects.is_empty());
}

#[test]
fn test_invalid_request_is_not_sent() {
    let mut editor = editor(EditorTool::Rectangle);
    let mut transport = ScriptedTransport::default();
    assert!(
        editor
            .run_ai_request(&mut transport, AiTrigger::detection("   "))
            .is_err()
    );
    assert!(transport.submitted.is_empty());
    assert!(!editor.is_requiring());
}

#[test]
fn test_rejected_submit_keeps_committed_objects() {
    let mut editor = editor(EditorTool::Rectangle);
    drag(&mut editor, (10.0, 10.0), (100.0, 100.0));
    let mut transport = ScriptedTransport {
        submit_error: Some(429),
        ..Default::default()
    };

    assert!(
        editor
            .run_ai_request(&mut transport, AiTrigger::detection("cat"))
            .is_err()
    );
    assert_eq!(editor.data().objects.len(), 1);
    assert!(editor.data().objects[0].is_committed());
}

#[test]
fn test_visual_prompt_flow() {
    let mut editor = editor(EditorTool::Rectangle);
    editor.set_ai_annotation(true);
    editor.select_model(EditorTool::Rectangle, ModelKind::VisualPrompt);
    editor.set_current_label(Some(1));

    drag(&mut editor, (20.0, 20.0), (80.0, 80.0));
    assert!(editor.data().objects.is_empty());
    let trigger = editor.take_pending_ai().unwrap();
    assert_eq!(trigger.model, ModelKind::VisualPrompt);
    assert_eq!(trigger.prompts.len(), 1);
    assert_eq!(trigger.prompts[0].kind, PromptKind::Rect);

    let mut transport = ScriptedTransport::succeeding(json!({
        "objects": [
            {"bbox": [100.0, 100.0, 150.0, 150.0], "score": 0.8},
            {"bbox": [10.0, 10.0, 40.0, 40.0], "score": 0.1},
        ],
    }));
    assert!(editor.run_ai_request(&mut transport, trigger).unwrap());
    assert_eq!(transport.submitted[0].1.label_types, vec!["bbox".to_string()]);

    let data = editor.data();
    assert!(data.is_batch_editing);
    assert_eq!(data.prompt.prompts_queue.len(), 1);
    assert!(data.prompt.creating_prompt.is_none());
    assert_eq!(status_at(&editor, 100.0), Some(ObjectStatus::Checked));
    assert_eq!(status_at(&editor, 10.0), Some(ObjectStatus::Unchecked));

    editor.set_confidence_threshold(0.05);
    assert_eq!(status_at(&editor, 10.0), Some(ObjectStatus::Checked));

    editor.accept_valid_objects();
    let data = editor.data();
    assert!(!data.is_batch_editing);
    assert!(data.prompt.prompts_queue.is_empty());
    assert_eq!(data.objects.len(), 2);
    assert!(data.objects.iter().all(|o| o.is_committed()));
    assert_eq!(editor.persisted().len(), 2);
}

#[test]
fn test_ctrl_click_rechecks_candidate() {
    let mut editor = detected();
    assert_eq!(status_at(&editor, 60.0), Some(ObjectStatus::Unchecked));

    editor.pointer_down(input(90.0, 90.0).with_ctrl());
    editor.pointer_up(input(90.0, 90.0).with_ctrl());

    assert_eq!(status_at(&editor, 60.0), Some(ObjectStatus::Checked));
    assert!(editor.data().active_object_index.is_none());
}

#[test]
fn test_accept_drops_unchecked_candidates() {
    let mut editor = detected();
    editor.accept_valid_objects();

    let data = editor.data();
    assert_eq!(data.objects.len(), 1);
    assert_eq!(data.objects[0].status, ObjectStatus::Committed);
    assert_eq!(data.objects[0].color, editor.categories()[0].color);
}

#[test]
fn test_confidence_range_checks_band() {
    let mut editor = detected();
    editor.set_confidence_range(0.1, 0.5);
    assert_eq!(status_at(&editor, 10.0), Some(ObjectStatus::Unchecked));
    assert_eq!(status_at(&editor, 60.0), Some(ObjectStatus::Checked));
}

#[test]
fn test_abort_batch_keeps_committed() {
    let mut editor = editor(EditorTool::Rectangle);
    drag(&mut editor, (150.0, 150.0), (190.0, 190.0));
    editor.cancel();
    let mut transport = ScriptedTransport::succeeding(detection_result());
    editor
        .run_ai_request(&mut transport, AiTrigger::detection("cat"))
        .unwrap();
    assert_eq!(editor.data().objects.len(), 3);

    editor.abort_batch_objects();
    assert_eq!(editor.data().objects.len(), 1);
    assert!(!editor.data().is_batch_editing);
}

#[test]
fn test_exit_ai_annotation_discards_candidates() {
    let mut editor = detected();
    editor.exit_ai_annotation();

    let data = editor.data();
    assert!(!data.ai_annotation);
    assert!(!data.is_batch_editing);
    assert!(data.objects.is_empty());
    assert!(data.prompt.session_id.is_none());
    assert!(editor.can_undo());
}
