//! Property tests over review thresholds and history.

use proptest::prelude::*;

use super::{drag, editor};
use crate::model::{AnnotationObject, EditorTool, ObjectStatus, Rect, RectElement, Shape};

fn candidate(conf: f32) -> AnnotationObject {
    AnnotationObject::new(Shape::Rectangle(RectElement::new(Rect::new(10.0, 10.0, 20.0, 20.0))))
        .with_review(ObjectStatus::Unchecked, Some(conf))
}

proptest! {
    #[test]
    fn prop_threshold_partitions_candidates(
        confs in prop::collection::vec(0.0f32..=1.0, 1..12),
        threshold in 0.0f32..=1.0,
    ) {
        let mut editor = editor(EditorTool::Rectangle);
        {
            let data = editor.store.data_mut();
            data.objects = confs.iter().map(|&c| candidate(c)).collect();
            data.objects.push(candidate(0.0).with_review(ObjectStatus::Committed, Some(0.0)));
            data.is_batch_editing = true;
        }

        editor.set_confidence_threshold(threshold);

        let objects = &editor.data().objects;
        for (object, &conf) in objects.iter().zip(&confs) {
            let expected = if conf >= threshold {
                ObjectStatus::Checked
            } else {
                ObjectStatus::Unchecked
            };
            prop_assert_eq!(object.status, expected);
        }
        prop_assert_eq!(objects.last().map(|o| o.status), Some(ObjectStatus::Committed));
    }

    #[test]
    fn prop_undo_restores_previous_objects(
        boxes in prop::collection::vec((0.0f32..150.0, 0.0f32..150.0, 5.0f32..50.0, 5.0f32..50.0), 1..6),
    ) {
        let mut editor = editor(EditorTool::Rectangle);
        for (x, y, w, h) in boxes {
            editor.cancel();
            let before = editor.data().objects.clone();

            drag(&mut editor, (x, y), (x + w, y + h));
            let after = editor.data().objects.clone();
            prop_assert_eq!(after.len(), before.len() + 1);

            prop_assert!(editor.undo());
            prop_assert_eq!(&editor.data().objects, &before);
            prop_assert!(editor.redo());
            prop_assert_eq!(&editor.data().objects, &after);
        }
    }
}
