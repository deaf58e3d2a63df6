//! Collection schemas and metadata field definitions.

use std::collections::BTreeMap;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::errors::SchemaError;
use crate::value::Value;

/// Type of a metadata field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldType {
    String,
    Integer,
    Float,
    /// Integer or float.
    Number,
    Boolean,
    /// A date; datetimes are accepted too.
    Date,
    Datetime,
    /// A smart date string, or a date or datetime.
    Smartdate,
    /// A smart date string, or a datetime.
    Smartdatetime,
    List,
    Dict,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Smartdate => "smartdate",
            Self::Smartdatetime => "smartdatetime",
            Self::List => "list",
            Self::Dict => "dict",
        }
    }

    pub fn is_smart_date(&self) -> bool {
        matches!(self, Self::Smartdate | Self::Smartdatetime)
    }

    /// Whether `value` has this type. Nulls are handled by the caller.
    pub fn accepts(&self, value: &Value) -> bool {
        matches!(
            (self, value),
            (Self::String, Value::String(_))
                | (Self::Integer, Value::Integer(_))
                | (Self::Float, Value::Float(_))
                | (Self::Number, Value::Integer(_) | Value::Float(_))
                | (Self::Boolean, Value::Bool(_))
                | (Self::Date, Value::Date(_) | Value::DateTime(_))
                | (Self::Datetime, Value::DateTime(_))
                | (Self::Smartdate, Value::String(_) | Value::Date(_) | Value::DateTime(_))
                | (Self::Smartdatetime, Value::String(_) | Value::DateTime(_))
                | (Self::List, Value::List(_))
                | (Self::Dict, Value::Map(_))
        )
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl std::str::FromStr for FieldType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "string" => Ok(Self::String),
            "integer" => Ok(Self::Integer),
            "float" => Ok(Self::Float),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "date" => Ok(Self::Date),
            "datetime" => Ok(Self::Datetime),
            "smartdate" => Ok(Self::Smartdate),
            "smartdatetime" => Ok(Self::Smartdatetime),
            "list" => Ok(Self::List),
            "dict" => Ok(Self::Dict),
            _ => Err(format!("unknown field type: {s}")),
        }
    }
}

fn default_required() -> bool {
    true
}

/// Schema for a single metadata field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSchema {
    #[serde(rename = "type")]
    pub field_type: FieldType,

    /// Fields are required unless stated otherwise.
    #[serde(default = "default_required")]
    pub required: bool,

    #[serde(default)]
    pub nullable: bool,

    /// Filled in when the field is absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,

    /// Permitted values. For lists, every item must be permitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allowed: Option<Vec<Value>>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,

    /// Pattern the whole string must match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regex: Option<String>,
}

impl FieldSchema {
    pub fn new(field_type: FieldType) -> Self {
        Self {
            field_type,
            required: true,
            nullable: false,
            default: None,
            allowed: None,
            min: None,
            max: None,
            regex: None,
        }
    }

    /// The `regex` constraint anchored at both ends.
    pub fn compiled_regex(&self) -> Option<Result<Regex, regex::Error>> {
        self.regex.as_ref().map(|pattern| Regex::new(&format!("^(?:{pattern})$")))
    }
}

/// The rules every publication of a collection must follow.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Schema {
    pub required_artifacts: Vec<String>,

    #[serde(default)]
    pub optional_artifacts: Vec<String>,

    /// When absent, metadata is not checked.
    #[serde(default)]
    pub metadata_schema: Option<BTreeMap<String, FieldSchema>>,

    #[serde(default)]
    pub allow_unspecified_artifacts: bool,

    /// Publications are read in key order, each seeing the previous one's
    /// metadata as `previous.metadata.*`.
    #[serde(default)]
    pub is_ordered: bool,
}

impl Schema {
    pub fn new(required_artifacts: Vec<String>) -> Self {
        Self {
            required_artifacts,
            optional_artifacts: Vec::new(),
            metadata_schema: None,
            allow_unspecified_artifacts: false,
            is_ordered: false,
        }
    }

    /// Schema of the collection that holds publications found outside any
    /// `collection.yaml`.
    pub fn permissive() -> Self {
        Self { allow_unspecified_artifacts: true, ..Self::new(Vec::new()) }
    }

    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.metadata_schema.as_ref().and_then(|fields| fields.get(name))
    }

    /// Whether metadata field `name` holds a smart date to be resolved.
    pub fn is_smart_date(&self, name: &str) -> bool {
        self.field(name).is_some_and(|f| f.field_type.is_smart_date())
    }

    /// Reject metadata schemas that can never validate anything.
    pub fn check(&self) -> Result<(), SchemaError> {
        let Some(fields) = &self.metadata_schema else {
            return Ok(());
        };

        for (name, field) in fields {
            if let Some(Err(e)) = field.compiled_regex() {
                return Err(SchemaError::InvalidSchema {
                    field: name.clone(),
                    message: format!("invalid regex: {e}"),
                });
            }
            if let (Some(min), Some(max)) = (field.min, field.max)
                && min > max
            {
                return Err(SchemaError::InvalidSchema {
                    field: name.clone(),
                    message: format!("min {min} is greater than max {max}"),
                });
            }
        }

        Ok(())
    }

    /// Insert default values for absent metadata fields.
    pub fn apply_defaults(&self, metadata: &mut BTreeMap<String, Value>) {
        let Some(fields) = &self.metadata_schema else {
            return;
        };

        for (name, field) in fields {
            if let Some(default) = &field.default
                && !metadata.contains_key(name)
            {
                metadata.insert(name.clone(), default.clone());
            }
        }
    }
}
