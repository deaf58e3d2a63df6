//! Collection schemas and validation of publications against them.

pub mod errors;
pub mod types;
pub mod validation;

pub use errors::{SchemaError, ValidationError, ValidationResult};
pub use types::{FieldSchema, FieldType, Schema};
pub use validation::{validate, validate_metadata};
