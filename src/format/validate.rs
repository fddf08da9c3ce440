//! Completeness checks run before annotations are submitted.

use std::fmt;

use crate::model::{
    find_category, AnnotationObject, AttributeDef, AttributeValue, Category, Classification,
    LabelId, LabelType,
};

/// One reason the annotations cannot be submitted yet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationIssue {
    /// Object has no category
    MissingLabel { index: usize },
    /// Required attribute of an object is empty
    MissingAttribute { index: usize, field: String },
    /// Classification category without an answer
    MissingClassification { label_id: LabelId, name: String },
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingLabel { index } => write!(f, "Object {} has no label", index + 1),
            Self::MissingAttribute { index, field } => {
                write!(f, "Object {} is missing required attribute '{}'", index + 1, field)
            }
            Self::MissingClassification { name, .. } => {
                write!(f, "Classification '{}' is not answered", name)
            }
        }
    }
}

fn is_missing(value: Option<&Option<AttributeValue>>) -> bool {
    value.and_then(Option::as_ref).is_none_or(AttributeValue::is_empty)
}

/// Collect required fields that are empty, descending into chosen radio options.
fn missing_fields(defs: &[AttributeDef], values: &[Option<AttributeValue>], out: &mut Vec<String>) {
    for (i, def) in defs.iter().enumerate() {
        let value = values.get(i);
        if def.required && is_missing(value) {
            out.push(def.field.clone());
            continue;
        }
        if let Some(Some(AttributeValue::Radio { value, children })) = value {
            missing_fields(def.sub_attributes(value), children, out);
        }
    }
}

/// Check committed objects and classifications against the category schema.
pub fn validate(
    objects: &[AnnotationObject],
    categories: &[Category],
    classifications: &[Classification],
) -> Vec<ValidationIssue> {
    let mut issues = Vec::new();

    for category in categories.iter().filter(|c| c.label_type == LabelType::Classification) {
        let answered = classifications
            .iter()
            .any(|c| c.label_id == category.id && !c.value.trim().is_empty());
        if !answered {
            issues.push(ValidationIssue::MissingClassification {
                label_id: category.id,
                name: category.name.clone(),
            });
        }
    }

    for (index, object) in objects.iter().enumerate().filter(|(_, o)| o.is_committed()) {
        let Some(label_id) = object.label_id else {
            issues.push(ValidationIssue::MissingLabel { index });
            continue;
        };
        let Some(category) = find_category(categories, label_id) else {
            issues.push(ValidationIssue::MissingLabel { index });
            continue;
        };
        let mut fields = Vec::new();
        missing_fields(&category.attributes, &object.attributes, &mut fields);
        issues.extend(
            fields
                .into_iter()
                .map(|field| ValidationIssue::MissingAttribute { index, field }),
        );
    }

    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::color::Rgb;
    use crate::model::{AttributeKind, AttributeOption, Rect, RectElement, Shape};

    fn required(field: &str) -> AttributeDef {
        AttributeDef {
            field: field.to_string(),
            kind: AttributeKind::Radio,
            required: true,
            options: vec![AttributeOption {
                value: "yes".to_string(),
                attributes: vec![AttributeDef {
                    field: "detail".to_string(),
                    kind: AttributeKind::Text,
                    required: true,
                    options: Vec::new(),
                }],
            }],
        }
    }

    fn categories() -> Vec<Category> {
        vec![
            Category::new(1, "person", Rgb::WHITE).with_attributes(vec![required("occluded")]),
            Category::new(2, "weather", Rgb::WHITE).as_classification(),
        ]
    }

    fn labeled(label_id: LabelId) -> AnnotationObject {
        AnnotationObject::new(Shape::Rectangle(RectElement::new(Rect::new(0.0, 0.0, 5.0, 5.0))))
            .with_label(label_id, Rgb::WHITE)
    }

    #[test]
    fn test_reports_every_kind_of_issue() {
        let objects = vec![
            AnnotationObject::new(Shape::Rectangle(RectElement::new(Rect::new(0.0, 0.0, 5.0, 5.0)))),
            labeled(1),
        ];
        let issues = validate(&objects, &categories(), &[]);
        assert_eq!(
            issues,
            vec![
                ValidationIssue::MissingClassification {
                    label_id: 2,
                    name: "weather".to_string()
                },
                ValidationIssue::MissingLabel { index: 0 },
                ValidationIssue::MissingAttribute {
                    index: 1,
                    field: "occluded".to_string()
                },
            ]
        );
        assert_eq!(issues[2].to_string(), "Object 2 is missing required attribute 'occluded'");
    }

    #[test]
    fn test_checks_sub_attributes_of_chosen_option() {
        let mut object = labeled(1);
        object.attributes = vec![Some(AttributeValue::Radio {
            value: "yes".to_string(),
            children: vec![None],
        })];
        let classifications = vec![Classification {
            label_id: 2,
            value: "sunny".to_string(),
        }];
        let issues = validate(&[object.clone()], &categories(), &classifications);
        assert_eq!(
            issues,
            vec![ValidationIssue::MissingAttribute {
                index: 0,
                field: "detail".to_string()
            }]
        );

        object.attributes = vec![Some(AttributeValue::Radio {
            value: "yes".to_string(),
            children: vec![Some(AttributeValue::Text("partly".to_string()))],
        })];
        assert!(validate(&[object], &categories(), &classifications).is_empty());
    }
}
