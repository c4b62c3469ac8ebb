//! Schema validation and change-impact analysis.

use crate::types::{FieldSchema, ResourceSchema, SchemaChangeAnalysis, SchemaValidation};
use std::collections::HashSet;

/// Checks a schema for structural problems.
///
/// Missing names, types and versions and duplicate field names are errors.
/// A dependency on a field not declared earlier in `fields` is a warning,
/// so declaration order matters.
pub fn validate_schema(schema: &ResourceSchema) -> SchemaValidation {
    let mut report = SchemaValidation::default();

    if schema.name.trim().is_empty() {
        report.errors.push("Schema name is required".to_string());
    }
    if schema.resource_type.trim().is_empty() {
        report.errors.push("Resource type is required".to_string());
    }
    if schema.version.version.trim().is_empty() {
        report.errors.push("Schema version is required".to_string());
    }

    let mut seen = HashSet::new();
    for (index, field) in schema.fields.iter().enumerate() {
        if field.name.trim().is_empty() {
            report
                .errors
                .push(format!("Field at index {index} is missing a name"));
            continue;
        }
        if field.field_type.trim().is_empty() {
            report
                .errors
                .push(format!("Field '{}' is missing a type", field.name));
        }
        if !seen.insert(field.name.as_str()) {
            report
                .errors
                .push(format!("Duplicate field name: {}", field.name));
        }
        for dependency in &field.dependencies {
            if !seen.contains(dependency.as_str()) {
                report.warnings.push(format!(
                    "Field '{}' depends on unknown field '{}'",
                    field.name, dependency
                ));
            }
        }
    }

    report
}

/// Compares two versions of a schema.
///
/// `breaking` is set when a field was removed or any compatibility issue
/// was found.
pub fn analyze_schema_changes(old: &ResourceSchema, new: &ResourceSchema) -> SchemaChangeAnalysis {
    let mut analysis = SchemaChangeAnalysis::default();

    for field in &new.fields {
        if old.field(&field.name).is_none() {
            analysis.added_fields.push(field.name.clone());
        }
    }

    for before in &old.fields {
        let Some(after) = new.field(&before.name) else {
            analysis.removed_fields.push(before.name.clone());
            analysis
                .compatibility_issues
                .push(format!("Field '{}' was removed", before.name));
            continue;
        };

        if is_modified(before, after) {
            analysis.modified_fields.push(before.name.clone());
        }
        if !before.required && after.required {
            analysis
                .compatibility_issues
                .push(format!("Field '{}' is now required", before.name));
        }
        if before.field_type != after.field_type {
            analysis.compatibility_issues.push(format!(
                "Field '{}' changed type from '{}' to '{}'",
                before.name, before.field_type, after.field_type
            ));
        }
    }

    analysis.breaking =
        !analysis.removed_fields.is_empty() || !analysis.compatibility_issues.is_empty();
    analysis
}

fn is_modified(before: &FieldSchema, after: &FieldSchema) -> bool {
    before.field_type != after.field_type
        || before.required != after.required
        || before.validation != after.validation
        || before.dependencies != after.dependencies
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ValidationRule;

    fn schema(version: &str, fields: Vec<FieldSchema>) -> ResourceSchema {
        fields
            .into_iter()
            .fold(ResourceSchema::new("Patient", "patient", version), |s, f| {
                s.with_field(f)
            })
    }

    #[test]
    fn test_valid_schema() {
        let report = validate_schema(&schema(
            "1.0.0",
            vec![
                FieldSchema::new("id", "string"),
                FieldSchema::new("name", "string").depends_on("id"),
            ],
        ));
        assert!(report.is_valid());
        assert!(report.warnings.is_empty());
    }

    #[test]
    fn test_missing_envelope() {
        let mut bad = ResourceSchema::new("", "", "");
        bad.fields.push(FieldSchema::new("", "string"));
        bad.fields.push(FieldSchema::new("x", ""));
        let report = validate_schema(&bad);
        assert_eq!(
            report.errors,
            vec![
                "Schema name is required",
                "Resource type is required",
                "Schema version is required",
                "Field at index 0 is missing a name",
                "Field 'x' is missing a type",
            ]
        );
    }

    #[test]
    fn test_duplicate_fields() {
        let report = validate_schema(&schema(
            "1.0.0",
            vec![FieldSchema::new("id", "string"), FieldSchema::new("id", "number")],
        ));
        assert_eq!(report.errors, vec!["Duplicate field name: id"]);
    }

    #[test]
    fn test_forward_dependency_warns() {
        let report = validate_schema(&schema(
            "1.0.0",
            vec![
                FieldSchema::new("city", "string").depends_on("country"),
                FieldSchema::new("country", "string"),
            ],
        ));
        assert!(report.is_valid());
        assert_eq!(
            report.warnings,
            vec!["Field 'city' depends on unknown field 'country'"]
        );
    }

    #[test]
    fn test_change_analysis() {
        let old = schema(
            "1.0.0",
            vec![
                FieldSchema::new("id", "string"),
                FieldSchema::new("name", "string"),
                FieldSchema::new("oldField", "string"),
            ],
        );
        let new = schema(
            "2.0.0",
            vec![
                FieldSchema::new("id", "string"),
                FieldSchema::new("name", "string").required(),
                FieldSchema::new("newField", "string"),
            ],
        );

        let analysis = analyze_schema_changes(&old, &new);
        assert_eq!(analysis.added_fields, vec!["newField"]);
        assert_eq!(analysis.removed_fields, vec!["oldField"]);
        assert_eq!(analysis.modified_fields, vec!["name"]);
        assert!(analysis.breaking);
        assert_eq!(
            analysis.compatibility_issues,
            vec!["Field 'oldField' was removed", "Field 'name' is now required"]
        );
    }

    #[test]
    fn test_additive_change_is_not_breaking() {
        let old = schema("1.0.0", vec![FieldSchema::new("id", "string")]);
        let new = schema(
            "1.1.0",
            vec![
                FieldSchema::new("id", "string"),
                FieldSchema::new("email", "string").with_rule(ValidationRule::pattern("@")),
            ],
        );
        let analysis = analyze_schema_changes(&old, &new);
        assert_eq!(analysis.added_fields, vec!["email"]);
        assert!(!analysis.breaking);
    }

    #[test]
    fn test_rule_change_is_modified_but_not_breaking() {
        let old = schema("1.0.0", vec![FieldSchema::new("age", "number")]);
        let new = schema(
            "1.0.1",
            vec![FieldSchema::new("age", "number").with_rule(ValidationRule::range(0, 150))],
        );
        let analysis = analyze_schema_changes(&old, &new);
        assert_eq!(analysis.modified_fields, vec!["age"]);
        assert!(!analysis.breaking);
    }

    #[test]
    fn test_type_change_is_breaking() {
        let old = schema("1.0.0", vec![FieldSchema::new("age", "string")]);
        let new = schema("2.0.0", vec![FieldSchema::new("age", "number")]);
        let analysis = analyze_schema_changes(&old, &new);
        assert!(analysis.breaking);
        assert_eq!(
            analysis.compatibility_issues,
            vec!["Field 'age' changed type from 'string' to 'number'"]
        );
    }
}
