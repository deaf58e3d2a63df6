//! Error types for schemas and publication validation.

use thiserror::Error;

/// A single way in which a publication breaks its collection's schema.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ValidationError {
    #[error("missing required field: {field}")]
    MissingRequired { field: String },

    #[error("unknown field: {field}")]
    UnknownField { field: String },

    #[error("invalid type for field '{field}': expected {expected}, got {actual}")]
    TypeMismatch { field: String, expected: String, actual: String },

    #[error("field '{field}' is null but not nullable")]
    NullNotAllowed { field: String },

    #[error("invalid value for field '{field}': {message}")]
    InvalidValue { field: String, message: String },

    #[error("value '{value}' of field '{field}' is not one of {allowed:?}")]
    NotAllowed { field: String, value: String, allowed: Vec<String> },

    #[error("required artifact omitted: {artifact}")]
    MissingArtifact { artifact: String },

    #[error("unknown artifact provided: {artifact}")]
    UnknownArtifact { artifact: String },
}

/// Outcome of validating a publication.
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<ValidationError>,
}

impl ValidationResult {
    pub fn success() -> Self {
        Self { valid: true, errors: vec![] }
    }

    pub fn failure(errors: Vec<ValidationError>) -> Self {
        Self { valid: false, errors }
    }

    pub fn add_error(&mut self, error: ValidationError) {
        self.errors.push(error);
        self.valid = false;
    }

    pub fn merge(&mut self, other: ValidationResult) {
        self.errors.extend(other.errors);
        if !other.valid {
            self.valid = false;
        }
    }

    pub fn into_result(self) -> Result<(), SchemaError> {
        if self.valid { Ok(()) } else { Err(SchemaError::Invalid(self.errors)) }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("invalid metadata schema for '{field}': {message}")]
    InvalidSchema { field: String, message: String },

    #[error("{}", join(.0))]
    Invalid(Vec<ValidationError>),
}

fn join(errors: &[ValidationError]) -> String {
    errors.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
