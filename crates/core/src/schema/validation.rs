//! Publication validation against a collection schema.

use std::collections::{BTreeMap, BTreeSet};

use super::errors::{SchemaError, ValidationError, ValidationResult};
use super::types::{FieldSchema, Schema};
use crate::tree::Publication;
use crate::value::Value;

/// Check a publication's metadata and artifacts against `schema`.
///
/// Metadata is only checked when the schema has a metadata schema. All
/// problems are collected before failing.
pub fn validate<A>(publication: &Publication<A>, schema: &Schema) -> Result<(), SchemaError> {
    let mut result = ValidationResult::success();

    if let Some(fields) = &schema.metadata_schema {
        result.merge(validate_metadata(&publication.metadata, fields));
    }
    result.merge(validate_artifacts(publication.artifacts.keys(), schema));

    result.into_result()
}

/// Validate metadata against field schemas. Keys without a schema are errors.
pub fn validate_metadata(
    metadata: &BTreeMap<String, Value>,
    fields: &BTreeMap<String, FieldSchema>,
) -> ValidationResult {
    let mut result = ValidationResult::success();

    for (name, schema) in fields {
        match metadata.get(name) {
            None if schema.required => {
                result.add_error(ValidationError::MissingRequired { field: name.clone() });
            }
            None => {}
            Some(value) => result.merge(validate_field(name, schema, value)),
        }
    }

    for name in metadata.keys().filter(|k| !fields.contains_key(*k)) {
        result.add_error(ValidationError::UnknownField { field: name.clone() });
    }

    result
}

fn validate_artifacts<'a>(
    provided: impl Iterator<Item = &'a String>,
    schema: &Schema,
) -> ValidationResult {
    let mut result = ValidationResult::success();
    let provided: BTreeSet<&str> = provided.map(String::as_str).collect();

    for artifact in &schema.required_artifacts {
        if !provided.contains(artifact.as_str()) {
            result.add_error(ValidationError::MissingArtifact { artifact: artifact.clone() });
        }
    }

    if !schema.allow_unspecified_artifacts {
        let known = |a: &str| {
            schema.required_artifacts.iter().chain(&schema.optional_artifacts).any(|k| k == a)
        };
        for artifact in provided.into_iter().filter(|a| !known(*a)) {
            result.add_error(ValidationError::UnknownArtifact { artifact: artifact.to_string() });
        }
    }

    result
}

fn validate_field(field: &str, schema: &FieldSchema, value: &Value) -> ValidationResult {
    let mut result = ValidationResult::success();

    if value.is_null() {
        if !schema.nullable {
            result.add_error(ValidationError::NullNotAllowed { field: field.to_string() });
        }
        return result;
    }

    if !schema.field_type.accepts(value) {
        result.add_error(ValidationError::TypeMismatch {
            field: field.to_string(),
            expected: schema.field_type.to_string(),
            actual: value.type_name().to_string(),
        });
        return result;
    }

    if let Some(allowed) = &schema.allowed {
        let items = match value {
            Value::List(items) => items.as_slice(),
            other => std::slice::from_ref(other),
        };
        for item in items.iter().filter(|item| !allowed.contains(item)) {
            result.add_error(ValidationError::NotAllowed {
                field: field.to_string(),
                value: item.to_string(),
                allowed: allowed.iter().map(ToString::to_string).collect(),
            });
        }
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = schema.min
            && n < min
        {
            result.add_error(ValidationError::InvalidValue {
                field: field.to_string(),
                message: format!("value {n} is less than minimum {min}"),
            });
        }
        if let Some(max) = schema.max
            && n > max
        {
            result.add_error(ValidationError::InvalidValue {
                field: field.to_string(),
                message: format!("value {n} is greater than maximum {max}"),
            });
        }
    }

    if let Value::String(s) = value
        && let Some(Ok(re)) = schema.compiled_regex()
        && !re.is_match(s)
    {
        result.add_error(ValidationError::InvalidValue {
            field: field.to_string(),
            message: format!(
                "value '{s}' does not match pattern '{}'",
                schema.regex.as_deref().unwrap_or_default()
            ),
        });
    }

    result
}
