//! The JSON manifest written next to published artifacts.

use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::ser::PrettyFormatter;
use thiserror::Error;

use crate::tree::Universe;

pub const MANIFEST_FILE: &str = "published.json";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("failed to serialize manifest: {0}")]
    Serialize(#[source] serde_json::Error),

    #[error("failed to parse manifest: {0}")]
    Parse(#[source] serde_json::Error),

    #[error("failed to write manifest {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Pretty JSON with a four space indent.
pub fn to_json<A: Serialize>(universe: &Universe<A>) -> Result<String, ManifestError> {
    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(b"    ");
    let mut ser = serde_json::Serializer::with_formatter(&mut buf, formatter);
    universe.serialize(&mut ser).map_err(ManifestError::Serialize)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

/// Read a manifest back. Date-shaped strings in metadata become dates again.
pub fn from_json<A: DeserializeOwned>(s: &str) -> Result<Universe<A>, ManifestError> {
    serde_json::from_str(s).map_err(ManifestError::Parse)
}

/// Write `<outdir>/published.json` and return its path.
pub fn write_manifest<A: Serialize>(
    universe: &Universe<A>,
    outdir: &Path,
) -> Result<PathBuf, ManifestError> {
    let path = outdir.join(MANIFEST_FILE);
    let json = to_json(universe)?;
    fs::write(&path, json).map_err(|e| ManifestError::Write { path: path.clone(), source: e })?;
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::tree::{Collection, Publication, PublishedArtifact};
    use crate::value::Value;
    use chrono::NaiveDate;
    use std::collections::BTreeMap;

    fn published() -> Universe<PublishedArtifact> {
        let due = NaiveDate::from_ymd_opt(2020, 12, 15).unwrap();
        let mut collection = Collection::new(Schema::permissive());
        collection.publications.insert(
            "01".to_string(),
            Publication::new(
                BTreeMap::from([("due".to_string(), Value::Date(due))]),
                BTreeMap::from([(
                    "hw".to_string(),
                    PublishedArtifact { path: "default/01/hw".to_string() },
                )]),
            ),
        );
        Universe::new(BTreeMap::from([("default".to_string(), collection)]))
    }

    #[test]
    fn test_manifest_json() {
        let json = to_json(&published()).unwrap();
        insta::assert_snapshot!(json, @r#"
        {
            "collections": {
                "default": {
                    "schema": {
                        "required_artifacts": [],
                        "optional_artifacts": [],
                        "metadata_schema": null,
                        "allow_unspecified_artifacts": true,
                        "is_ordered": false
                    },
                    "publications": {
                        "01": {
                            "metadata": {
                                "due": "2020-12-15"
                            },
                            "artifacts": {
                                "hw": {
                                    "path": "default/01/hw"
                                }
                            }
                        }
                    }
                }
            }
        }
        "#);
    }

    #[test]
    fn test_manifest_restores_dates() {
        let universe = published();
        let back: Universe<PublishedArtifact> = from_json(&to_json(&universe).unwrap()).unwrap();

        assert_eq!(back, universe);
        let due = &back.collections["default"].publications["01"].metadata["due"];
        assert!(matches!(due, Value::Date(_)));
    }

    #[test]
    fn test_write_manifest() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = write_manifest(&published(), dir.path()).unwrap();

        assert!(path.ends_with(MANIFEST_FILE));
        assert!(fs::read_to_string(path).unwrap().contains("\"path\": \"default/01/hw\""));
    }

    #[test]
    fn test_bad_manifest() {
        assert!(matches!(
            from_json::<PublishedArtifact>("{\"collections\": 3}"),
            Err(ManifestError::Parse(_))
        ));
    }
}
