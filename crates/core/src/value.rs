//! Metadata values as read from `publish.yaml` and written to the manifest.

use std::collections::BTreeMap;
use std::fmt;

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::smartdates::Temporal;

/// A YAML/JSON value with first-class dates.
///
/// Strings shaped like `YYYY-MM-DD` or `YYYY-MM-DD HH:MM:SS` are read as
/// [`Value::Date`] and [`Value::DateTime`], and written back in the same form.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Integer(i64),
    Float(f64),
    String(String),
    Date(NaiveDate),
    DateTime(NaiveDateTime),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    pub fn as_temporal(&self) -> Option<Temporal> {
        match self {
            Self::Date(d) => Some(Temporal::Date(*d)),
            Self::DateTime(dt) => Some(Temporal::DateTime(*dt)),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Name of the value's type, as used in validation messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "boolean",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::Date(_) => "date",
            Self::DateTime(_) => "datetime",
            Self::List(_) => "list",
            Self::Map(_) => "dict",
        }
    }
}

impl From<Temporal> for Value {
    fn from(t: Temporal) -> Self {
        match t {
            Temporal::Date(d) => Self::Date(d),
            Temporal::DateTime(dt) => Self::DateTime(dt),
        }
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(s.to_string())
    }
}

impl From<serde_yaml::Value> for Value {
    fn from(value: serde_yaml::Value) -> Self {
        use serde_yaml::Value as Yaml;

        match value {
            Yaml::Null => Self::Null,
            Yaml::Bool(b) => Self::Bool(b),
            Yaml::Number(n) => match n.as_i64() {
                Some(i) => Self::Integer(i),
                None => Self::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            Yaml::String(s) => match Temporal::parse(&s) {
                Some(t) => Self::from(t),
                None => Self::String(s),
            },
            Yaml::Sequence(seq) => Self::List(seq.into_iter().map(Self::from).collect()),
            Yaml::Mapping(map) => Self::Map(
                map.into_iter()
                    .filter_map(|(k, v)| key_string(k).map(|k| (k, Self::from(v))))
                    .collect(),
            ),
            Yaml::Tagged(tagged) => Self::from(tagged.value),
        }
    }
}

/// Mapping keys are kept when they are scalars.
fn key_string(key: serde_yaml::Value) -> Option<String> {
    match key {
        serde_yaml::Value::String(s) => Some(s),
        serde_yaml::Value::Number(n) => Some(n.to_string()),
        serde_yaml::Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Integer(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "{s}"),
            Self::Date(d) => write!(f, "{}", Temporal::Date(*d)),
            Self::DateTime(dt) => write!(f, "{}", Temporal::DateTime(*dt)),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::Null => serializer.serialize_none(),
            Self::Bool(b) => serializer.serialize_bool(*b),
            Self::Integer(i) => serializer.serialize_i64(*i),
            Self::Float(f) => serializer.serialize_f64(*f),
            Self::String(s) => serializer.serialize_str(s),
            Self::Date(d) => serializer.collect_str(&Temporal::Date(*d)),
            Self::DateTime(dt) => serializer.collect_str(&Temporal::DateTime(*dt)),
            Self::List(items) => serializer.collect_seq(items),
            Self::Map(map) => serializer.collect_map(map),
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        serde_yaml::Value::deserialize(deserializer).map(Self::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_yaml_dates_become_temporal() {
        let yaml = "due: 2020-12-15\nreleased: 2020-12-15 23:59:00\nname: Homework 01\nn: 3\n";
        let value: Value = serde_yaml::from_str(yaml).unwrap();

        let Value::Map(map) = value else {
            panic!("expected a map");
        };
        assert_eq!(map["due"], Value::Date(date(2020, 12, 15)));
        assert_eq!(
            map["released"],
            Value::DateTime(date(2020, 12, 15).and_hms_opt(23, 59, 0).unwrap())
        );
        assert_eq!(map["name"], Value::from("Homework 01"));
        assert_eq!(map["n"], Value::Integer(3));
    }

    #[test]
    fn test_json_round_trip_keeps_dates() {
        let mut map = BTreeMap::new();
        map.insert("due".to_string(), Value::Date(date(2021, 1, 4)));
        map.insert("tags".to_string(), Value::List(vec![Value::from("a"), Value::Null]));
        let value = Value::Map(map);

        let json = serde_json::to_string(&value).unwrap();
        assert_eq!(json, r#"{"due":"2021-01-04","tags":["a",null]}"#);

        let back: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(back, value);
    }

    #[test]
    fn test_as_temporal() {
        assert_eq!(
            Value::Date(date(2021, 1, 4)).as_temporal(),
            Some(Temporal::Date(date(2021, 1, 4)))
        );
        assert_eq!(Value::from("due").as_temporal(), None);
    }

    #[test]
    fn test_type_names() {
        assert_eq!(Value::Integer(1).type_name(), "integer");
        assert_eq!(Value::Map(BTreeMap::new()).type_name(), "dict");
    }
}
