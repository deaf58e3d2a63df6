//! Reading `collection.yaml` and `publish.yaml` files.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;

use chrono::NaiveDateTime;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::errors::DiscoveryError;
use crate::schema::{FieldType, Schema, validate};
use crate::smartdates::{DateContext, RawDate, SmartDateError, Temporal, resolve};
use crate::tree::{Collection, Publication, UnbuiltArtifact};
use crate::value::Value;

/// Prefix under which metadata is visible to release times.
const METADATA_PREFIX: &str = "metadata.";

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct CollectionFile {
    schema: Schema,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
struct PublicationFile {
    #[serde(default)]
    ready: Option<bool>,
    #[serde(default)]
    release_time: Option<Value>,
    #[serde(default)]
    metadata: Option<BTreeMap<String, Value>>,
    artifacts: BTreeMap<String, Option<ArtifactEntry>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct ArtifactEntry {
    #[serde(default)]
    file: Option<String>,
    #[serde(default)]
    recipe: Option<String>,
    #[serde(default)]
    ready: Option<bool>,
    #[serde(default)]
    missing_ok: bool,
    #[serde(default)]
    release_time: Option<Value>,
}

fn read_yaml<T: DeserializeOwned>(path: &Path) -> Result<T, DiscoveryError> {
    let s = fs::read_to_string(path)
        .map_err(|e| DiscoveryError::Io { path: path.to_path_buf(), source: e })?;
    serde_yaml::from_str(&s)
        .map_err(|e| DiscoveryError::Yaml { path: path.to_path_buf(), source: e })
}

/// Read a collection (with no publications yet) from a `collection.yaml`.
pub fn read_collection_file<A>(path: &Path) -> Result<Collection<A>, DiscoveryError> {
    let file: CollectionFile = read_yaml(path)?;

    file.schema
        .check()
        .map_err(|e| DiscoveryError::Schema { path: path.to_path_buf(), source: e })?;

    debug!(path = %path.display(), "read collection");
    Ok(Collection::new(file.schema))
}

/// Read a publication from a `publish.yaml`.
///
/// Smart dates in metadata fields typed `smartdate`/`smartdatetime` by the
/// schema are resolved first, then artifact and publication release times
/// are resolved against `metadata.<field>`. When a schema is given the result
/// is validated against it.
pub fn read_publication_file(
    path: &Path,
    schema: Option<&Schema>,
    date_context: &DateContext,
) -> Result<Publication<UnbuiltArtifact>, DiscoveryError> {
    let file: PublicationFile = read_yaml(path)?;
    let invalid = |message: String| DiscoveryError::Invalid { path: path.to_path_buf(), message };

    let mut metadata = file.metadata.unwrap_or_default();
    if let Some(schema) = schema {
        schema.apply_defaults(&mut metadata);
        restore_strings(&mut metadata, schema);
        metadata = resolve_metadata(metadata, schema, date_context)
            .map_err(|e| DiscoveryError::SmartDate { path: path.to_path_buf(), source: e })?;
    }

    let release_context = release_time_context(&metadata, date_context);
    let resolve_release = |raw: Option<Value>| {
        resolve_release_time(raw, &release_context).map_err(|e| match e {
            ReleaseTimeError::SmartDate(source) => {
                DiscoveryError::SmartDate { path: path.to_path_buf(), source }
            }
            ReleaseTimeError::Invalid(message) => invalid(message),
        })
    };

    let parent = path.parent().unwrap_or(Path::new("."));
    let workdir = std::path::absolute(parent)
        .map_err(|e| DiscoveryError::Io { path: parent.to_path_buf(), source: e })?;

    let mut artifacts = BTreeMap::new();
    for (key, entry) in file.artifacts {
        let entry = entry.unwrap_or_default();
        let artifact = UnbuiltArtifact {
            workdir: workdir.clone(),
            file: entry.file.unwrap_or_else(|| key.clone()),
            recipe: entry.recipe,
            release_time: resolve_release(entry.release_time)?,
            ready: entry.ready.unwrap_or(true),
            missing_ok: entry.missing_ok,
        };
        artifacts.insert(key, artifact);
    }

    let publication = Publication {
        release_time: resolve_release(file.release_time)?,
        ready: file.ready.unwrap_or(true),
        metadata,
        artifacts,
    };

    if let Some(schema) = schema {
        validate(&publication, schema)
            .map_err(|e| DiscoveryError::Schema { path: path.to_path_buf(), source: e })?;
    }

    debug!(path = %path.display(), artifacts = publication.artifacts.len(), "read publication");
    Ok(publication)
}

/// Date-shaped values in `string` fields go back to being strings.
fn restore_strings(metadata: &mut BTreeMap<String, Value>, schema: &Schema) {
    for (name, value) in metadata.iter_mut() {
        let is_string = schema.field(name).is_some_and(|f| f.field_type == FieldType::String);
        if is_string && let Some(t) = value.as_temporal() {
            *value = Value::String(t.to_string());
        }
    }
}

/// Replace the smart date fields of `metadata` with their resolved values.
fn resolve_metadata(
    mut metadata: BTreeMap<String, Value>,
    schema: &Schema,
    date_context: &DateContext,
) -> Result<BTreeMap<String, Value>, SmartDateError> {
    let mut batch = BTreeMap::new();
    let mut known = date_context.known.clone();

    for (name, value) in &metadata {
        if schema.is_smart_date(name) {
            match value {
                Value::String(s) => {
                    batch.insert(name.clone(), RawDate::Expr(s.clone()));
                }
                other => {
                    if let Some(t) = other.as_temporal() {
                        batch.insert(name.clone(), RawDate::Value(t));
                    }
                }
            }
        } else if let Some(t) = value.as_temporal() {
            known.insert(name.clone(), t);
        }
    }

    if batch.is_empty() {
        return Ok(metadata);
    }

    let context = date_context.clone().with_known(known);
    for (name, value) in resolve(&batch, &context)? {
        metadata.insert(name, Value::from(value));
    }
    Ok(metadata)
}

fn release_time_context(
    metadata: &BTreeMap<String, Value>,
    date_context: &DateContext,
) -> DateContext {
    let mut known = date_context.known.clone();
    for (name, value) in metadata {
        if let Some(t) = value.as_temporal() {
            known.insert(format!("{METADATA_PREFIX}{name}"), t);
        }
    }
    date_context.clone().with_known(known)
}

enum ReleaseTimeError {
    SmartDate(SmartDateError),
    Invalid(String),
}

fn resolve_release_time(
    raw: Option<Value>,
    context: &DateContext,
) -> Result<Option<NaiveDateTime>, ReleaseTimeError> {
    let raw = match raw {
        None | Some(Value::Null) => return Ok(None),
        Some(Value::DateTime(dt)) => return Ok(Some(dt)),
        Some(Value::String(s)) => RawDate::Expr(s),
        Some(Value::Date(d)) => RawDate::Value(Temporal::Date(d)),
        Some(other) => {
            return Err(ReleaseTimeError::Invalid(format!(
                "release_time must be a datetime or smart date, got {}",
                other.type_name()
            )));
        }
    };

    let batch = BTreeMap::from([("release_time".to_string(), raw)]);
    let resolved = resolve(&batch, context).map_err(ReleaseTimeError::SmartDate)?;

    match resolved.get("release_time") {
        Some(Temporal::DateTime(dt)) => Ok(Some(*dt)),
        _ => Err(ReleaseTimeError::Invalid("release_time is not a datetime".to_string())),
    }
}
