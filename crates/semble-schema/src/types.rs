//! Schema data types.
//!
//! All types serialize to camelCase JSON so exported schemas can be edited
//! by hand and imported again unchanged.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// A versioned description of one resource's fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSchema {
    /// Human-readable name.
    pub name: String,
    /// Resource-type key (matched case-insensitively by the registry).
    pub resource_type: String,
    /// Version descriptor.
    pub version: SchemaVersion,
    /// Fields in declaration order.
    #[serde(default)]
    pub fields: Vec<FieldSchema>,
    /// Supported actions (`get`, `create`, ...).
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub actions: Vec<String>,
    /// Required permissions.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub permissions: Option<Map<String, Value>>,
    /// Free-form metadata.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl ResourceSchema {
    /// Creates a schema with no fields.
    pub fn new(
        name: impl Into<String>,
        resource_type: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            resource_type: resource_type.into(),
            version: SchemaVersion::new(version),
            fields: Vec::new(),
            actions: Vec::new(),
            permissions: None,
            metadata: None,
        }
    }

    /// Appends a field.
    pub fn with_field(mut self, field: FieldSchema) -> Self {
        self.fields.push(field);
        self
    }

    /// Adds a supported action.
    pub fn with_action(mut self, action: impl Into<String>) -> Self {
        self.actions.push(action.into());
        self
    }

    /// Marks the version as intentionally breaking.
    pub fn breaking(mut self) -> Self {
        self.version.breaking = true;
        self
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Version descriptor.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaVersion {
    /// Semver-like version string.
    pub version: String,
    /// Creation time.
    pub timestamp: DateTime<Utc>,
    /// Author.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub author: Option<String>,
    /// Change description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Whether the version is flagged as breaking.
    #[serde(default)]
    pub breaking: bool,
}

impl SchemaVersion {
    /// Creates a non-breaking version stamped now.
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            timestamp: Utc::now(),
            author: None,
            description: None,
            breaking: false,
        }
    }
}

/// One field of a resource.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldSchema {
    /// Field name.
    pub name: String,
    /// Type tag: `string`, `number`, `boolean`, `date`, `enum`, `array`,
    /// `object`; anything else is treated as `string` for display.
    #[serde(rename = "type")]
    pub field_type: String,
    /// Whether the field is required.
    #[serde(default)]
    pub required: bool,
    /// Description.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Validation rules.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub validation: Vec<ValidationRule>,
    /// Names of fields this one depends on.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<String>,
    /// Conditional display rules.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditional: Option<ConditionalDisplay>,
    /// Free-form metadata (`default`, `options`, ...).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<Map<String, Value>>,
}

impl FieldSchema {
    /// Creates an optional field.
    pub fn new(name: impl Into<String>, field_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            field_type: field_type.into(),
            ..Self::default()
        }
    }

    /// Marks the field as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Sets the description.
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    /// Adds a validation rule.
    pub fn with_rule(mut self, rule: ValidationRule) -> Self {
        self.validation.push(rule);
        self
    }

    /// Adds a dependency on another field.
    pub fn depends_on(mut self, field: impl Into<String>) -> Self {
        self.dependencies.push(field.into());
        self
    }

    /// Sets the conditional display rules.
    pub fn with_conditional(mut self, conditional: ConditionalDisplay) -> Self {
        self.conditional = Some(conditional);
        self
    }

    /// Sets a metadata entry.
    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.metadata
            .get_or_insert_with(Map::new)
            .insert(key.into(), value.into());
        self
    }

    /// Returns a metadata entry.
    pub fn metadata_value(&self, key: &str) -> Option<&Value> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }
}

/// Kind of validation rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleType {
    /// Value must be present.
    Required,
    /// Value must have a given type.
    Type,
    /// Value must match a regex; `value` holds the pattern.
    Pattern,
    /// Value must lie in `value.min..=value.max`.
    Range,
    /// Host-defined rule.
    Custom,
}

/// A validation rule attached to a field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationRule {
    /// Rule kind.
    #[serde(rename = "type")]
    pub rule_type: RuleType,
    /// Rule parameter.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<Value>,
    /// Message shown when the rule fails.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ValidationRule {
    /// Creates a rule without a parameter.
    pub fn new(rule_type: RuleType) -> Self {
        Self {
            rule_type,
            value: None,
            message: None,
        }
    }

    /// Creates a pattern rule.
    pub fn pattern(pattern: impl Into<String>) -> Self {
        Self {
            value: Some(Value::String(pattern.into())),
            ..Self::new(RuleType::Pattern)
        }
    }

    /// Creates a range rule.
    pub fn range(min: impl Into<Value>, max: impl Into<Value>) -> Self {
        let mut bounds = Map::new();
        bounds.insert("min".to_string(), min.into());
        bounds.insert("max".to_string(), max.into());
        Self {
            value: Some(Value::Object(bounds)),
            ..Self::new(RuleType::Range)
        }
    }

    /// Sets the failure message.
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }
}

/// Show/hide conditions keyed by the controlling field's name.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct ConditionalDisplay {
    /// Show when the named fields have one of the listed values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub show: Option<Map<String, Value>>,
    /// Hide when the named fields have one of the listed values.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hide: Option<Map<String, Value>>,
}

/// Outcome of [`validate_schema`](crate::validate_schema).
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SchemaValidation {
    /// Blocking problems.
    pub errors: Vec<String>,
    /// Advisory problems.
    pub warnings: Vec<String>,
}

impl SchemaValidation {
    /// Returns `true` when there are no errors.
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }
}

/// Difference between two versions of a schema.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SchemaChangeAnalysis {
    /// Fields only in the new version.
    pub added_fields: Vec<String>,
    /// Fields only in the old version.
    pub removed_fields: Vec<String>,
    /// Fields in both versions whose definition changed.
    pub modified_fields: Vec<String>,
    /// Whether existing consumers may break.
    pub breaking: bool,
    /// Human-readable reasons for `breaking`.
    pub compatibility_issues: Vec<String>,
}
