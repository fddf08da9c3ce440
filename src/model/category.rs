//! Label categories, their attribute schema and per-object attribute values.

use serde::{Deserialize, Serialize};

use crate::color::Rgb;

/// Unique identifier for a category.
pub type LabelId = u32;

/// What kind of annotation a category is meant for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LabelType {
    /// Spatial object (box, polygon, mask, skeleton)
    #[default]
    Object,
    /// Whole-image classification
    Classification,
}

/// How an attribute is edited.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AttributeKind {
    /// Exactly one option
    #[default]
    Radio,
    /// Any subset of options
    Checkbox,
    /// Free text
    Text,
}

/// One selectable option of a radio or checkbox attribute.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributeOption {
    pub value: String,
    /// Sub-attributes shown when this option is chosen
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
}

/// Schema of a single attribute field.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct AttributeDef {
    pub field: String,
    #[serde(default)]
    pub kind: AttributeKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub options: Vec<AttributeOption>,
}

impl AttributeDef {
    /// Sub-attribute schema for the chosen option, if it has any.
    pub fn sub_attributes(&self, chosen: &str) -> &[AttributeDef] {
        self.options
            .iter()
            .find(|o| o.value == chosen)
            .map(|o| o.attributes.as_slice())
            .unwrap_or(&[])
    }
}

/// A value assigned to one attribute of an object.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    Text(String),
    Checkbox(Vec<String>),
    Radio {
        value: String,
        /// Values for the chosen option's sub-attributes
        #[serde(default)]
        children: Vec<Option<AttributeValue>>,
    },
}

impl AttributeValue {
    /// True when the value counts as "not filled in".
    pub fn is_empty(&self) -> bool {
        match self {
            AttributeValue::Text(text) => text.trim().is_empty(),
            AttributeValue::Checkbox(values) => values.is_empty(),
            AttributeValue::Radio { value, .. } => value.is_empty(),
        }
    }
}

/// An annotation category with a name and color.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    /// Unique identifier for the category
    pub id: LabelId,
    /// Display name of the category
    pub name: String,
    #[serde(default)]
    pub label_type: LabelType,
    /// Color used for objects of this category
    pub color: Rgb,
    #[serde(default)]
    pub attributes: Vec<AttributeDef>,
}

impl Category {
    /// Create a new object category with the given ID, name, and color.
    pub fn new(id: LabelId, name: &str, color: Rgb) -> Self {
        Self {
            id,
            name: name.to_string(),
            label_type: LabelType::Object,
            color,
            attributes: Vec::new(),
        }
    }

    /// Builder: attach an attribute schema.
    pub fn with_attributes(mut self, attributes: Vec<AttributeDef>) -> Self {
        self.attributes = attributes;
        self
    }

    /// Builder: mark as a classification category.
    pub fn as_classification(mut self) -> Self {
        self.label_type = LabelType::Classification;
        self
    }

    /// True when any top-level attribute is required.
    pub fn has_required_attributes(&self) -> bool {
        self.attributes.iter().any(|a| a.required)
    }
}

/// Find a category by ID.
pub fn find_category(categories: &[Category], id: LabelId) -> Option<&Category> {
    categories.iter().find(|c| c.id == id)
}

/// Find a category by name.
pub fn find_category_by_name<'a>(categories: &'a [Category], name: &str) -> Option<&'a Category> {
    categories.iter().find(|c| c.name == name)
}

/// Whole-image classification answer.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Classification {
    pub label_id: LabelId,
    #[serde(default)]
    pub value: String,
}
