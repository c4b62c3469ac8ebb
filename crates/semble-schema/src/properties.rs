//! Projection of a schema into UI property descriptors.

use crate::types::{FieldSchema, ResourceSchema, RuleType};
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};

/// Descriptor type understood by the host UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum PropertyType {
    /// Free text.
    String,
    /// Numeric input.
    Number,
    /// Toggle.
    Boolean,
    /// Date picker.
    DateTime,
    /// Single choice.
    Options,
    /// Multiple choice.
    MultiOptions,
    /// Raw JSON editor.
    Json,
}

impl PropertyType {
    /// Maps a field type tag; unknown tags map to [`PropertyType::String`].
    pub fn from_field_type(field_type: &str) -> Self {
        match field_type {
            "number" => Self::Number,
            "boolean" => Self::Boolean,
            "date" => Self::DateTime,
            "enum" => Self::Options,
            "array" => Self::MultiOptions,
            "object" => Self::Json,
            _ => Self::String,
        }
    }

    /// The value a fresh property starts with.
    pub fn zero_value(self) -> Value {
        match self {
            Self::Boolean => Value::Bool(false),
            Self::Number => json!(0),
            Self::MultiOptions => Value::Array(Vec::new()),
            Self::Json => Value::Object(Map::new()),
            Self::String | Self::DateTime | Self::Options => Value::String(String::new()),
        }
    }
}

/// A choice in an options list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyOption {
    /// Label.
    pub name: String,
    /// Stored value.
    pub value: Value,
}

/// A UI property descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeProperty {
    /// Label.
    pub display_name: String,
    /// Field name.
    pub name: String,
    /// Descriptor type.
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    /// Initial value.
    pub default: Value,
    /// Help text.
    pub description: String,
    /// Whether a value is mandatory.
    pub required: bool,
    /// Input constraints.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub type_options: Option<Map<String, Value>>,
    /// Show/hide conditions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_options: Option<Map<String, Value>>,
    /// Choices for option types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub options: Option<Vec<PropertyOption>>,
}

/// Generates one descriptor per field relevant to `action`.
///
/// An `id` field is skipped for `create`.
pub fn generate_node_properties(schema: &ResourceSchema, action: Option<&str>) -> Vec<NodeProperty> {
    schema
        .fields
        .iter()
        .filter(|field| !is_excluded(field, action))
        .map(to_property)
        .collect()
}

fn is_excluded(field: &FieldSchema, action: Option<&str>) -> bool {
    action == Some("create") && field.name == "id"
}

fn to_property(field: &FieldSchema) -> NodeProperty {
    let property_type = PropertyType::from_field_type(&field.field_type);
    NodeProperty {
        display_name: humanize(&field.name),
        name: field.name.clone(),
        property_type,
        default: field
            .metadata_value("default")
            .cloned()
            .unwrap_or_else(|| property_type.zero_value()),
        description: field.description.clone().unwrap_or_default(),
        required: field.required,
        type_options: type_options(field),
        display_options: display_options(field),
        options: options(field),
    }
}

fn type_options(field: &FieldSchema) -> Option<Map<String, Value>> {
    let mut type_options = Map::new();
    for rule in &field.validation {
        match (rule.rule_type, &rule.value) {
            (RuleType::Pattern, Some(pattern)) => {
                type_options.insert("pattern".to_string(), pattern.clone());
            }
            (RuleType::Range, Some(bounds)) => {
                if let Some(min) = bounds.get("min") {
                    type_options.insert("minValue".to_string(), min.clone());
                }
                if let Some(max) = bounds.get("max") {
                    type_options.insert("maxValue".to_string(), max.clone());
                }
            }
            _ => {}
        }
    }
    (!type_options.is_empty()).then_some(type_options)
}

fn display_options(field: &FieldSchema) -> Option<Map<String, Value>> {
    let conditional = field.conditional.as_ref()?;
    let mut display = Map::new();
    if let Some(show) = &conditional.show {
        display.insert("show".to_string(), Value::Object(show.clone()));
    }
    if let Some(hide) = &conditional.hide {
        display.insert("hide".to_string(), Value::Object(hide.clone()));
    }
    (!display.is_empty()).then_some(display)
}

fn options(field: &FieldSchema) -> Option<Vec<PropertyOption>> {
    let entries = field.metadata_value("options")?.as_array()?;
    Some(
        entries
            .iter()
            .map(|entry| match entry {
                Value::String(s) => PropertyOption {
                    name: humanize(s),
                    value: entry.clone(),
                },
                Value::Object(o) => PropertyOption {
                    name: o
                        .get("name")
                        .and_then(Value::as_str)
                        .map_or_else(|| entry.to_string(), ToString::to_string),
                    value: o.get("value").cloned().unwrap_or(Value::Null),
                },
                other => PropertyOption {
                    name: other.to_string(),
                    value: other.clone(),
                },
            })
            .collect(),
    )
}

/// Turns `camelCase` or `snake_case` into `Title Case` words.
pub fn humanize(name: &str) -> String {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let mut prev_lower = false;

    for ch in name.chars() {
        if ch == '_' || ch == '-' || ch.is_whitespace() {
            if !current.is_empty() {
                words.push(std::mem::take(&mut current));
            }
            prev_lower = false;
            continue;
        }
        if ch.is_uppercase() && prev_lower && !current.is_empty() {
            words.push(std::mem::take(&mut current));
        }
        prev_lower = ch.is_lowercase() || ch.is_ascii_digit();
        current.push(ch);
    }
    if !current.is_empty() {
        words.push(current);
    }

    words
        .iter()
        .map(|word| {
            let mut chars = word.chars();
            chars.next().map_or_else(String::new, |first| {
                first.to_uppercase().chain(chars).collect()
            })
        })
        .collect::<Vec<_>>()
        .join(" ")
}
