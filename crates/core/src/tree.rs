//! The collection / publication / artifact tree.
//!
//! The tree is generic over the artifact stage: discovery produces
//! [`UnbuiltArtifact`]s, building turns them into [`BuiltArtifact`]s and
//! publishing into [`PublishedArtifact`]s. All maps are ordered by key.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use crate::schema::Schema;
use crate::value::Value;

/// Every discovered collection, keyed by path relative to the input directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Universe<A> {
    pub collections: BTreeMap<String, Collection<A>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Collection<A> {
    pub schema: Schema,
    /// Keyed by path relative to the collection directory.
    pub publications: BTreeMap<String, Publication<A>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Publication<A> {
    pub metadata: BTreeMap<String, Value>,
    pub artifacts: BTreeMap<String, A>,
    /// Publications that are not ready are never built.
    #[serde(skip_serializing, default = "default_true")]
    pub ready: bool,
    /// Nothing in the publication is built before this time.
    #[serde(skip)]
    pub release_time: Option<NaiveDateTime>,
}

/// The inputs needed to build an artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnbuiltArtifact {
    /// Absolute directory the recipe runs in.
    pub workdir: PathBuf,
    /// Output file, relative to `workdir`.
    pub file: String,
    pub recipe: Option<String>,
    #[serde(default, with = "datetime_format")]
    pub release_time: Option<NaiveDateTime>,
    pub ready: bool,
    /// A missing output file drops the artifact instead of failing the build.
    pub missing_ok: bool,
}

/// The result of building an artifact. Output fields are `None` when no
/// recipe ran, or when output was not captured.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BuiltArtifact {
    pub workdir: PathBuf,
    pub file: String,
    pub returncode: Option<i32>,
    pub stdout: Option<String>,
    pub stderr: Option<String>,
}

/// A copied artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedArtifact {
    /// Path relative to the output directory, `/`-separated.
    pub path: String,
}

/// One artifact together with the keys that lead to it.
#[derive(Debug)]
pub struct ArtifactRef<'a, A> {
    pub collection_key: &'a str,
    pub collection: &'a Collection<A>,
    pub publication_key: &'a str,
    pub publication: &'a Publication<A>,
    pub artifact_key: &'a str,
    pub artifact: &'a A,
}

fn default_true() -> bool {
    true
}

impl<A> Universe<A> {
    pub fn new(collections: BTreeMap<String, Collection<A>>) -> Self {
        Self { collections }
    }

    /// Walk every artifact in key order.
    pub fn artifacts(&self) -> impl Iterator<Item = ArtifactRef<'_, A>> {
        self.collections.iter().flat_map(|(collection_key, collection)| {
            collection.publications.iter().flat_map(move |(publication_key, publication)| {
                publication.artifacts.iter().map(move |(artifact_key, artifact)| ArtifactRef {
                    collection_key,
                    collection,
                    publication_key,
                    publication,
                    artifact_key,
                    artifact,
                })
            })
        })
    }

    pub fn artifact_count(&self) -> usize {
        self.artifacts().count()
    }
}

impl<A> Collection<A> {
    pub fn new(schema: Schema) -> Self {
        Self { schema, publications: BTreeMap::new() }
    }
}

impl<A> Publication<A> {
    pub fn new(metadata: BTreeMap<String, Value>, artifacts: BTreeMap<String, A>) -> Self {
        Self { metadata, artifacts, ready: true, release_time: None }
    }

    /// Same publication with different artifacts.
    pub fn with_artifacts<B>(&self, artifacts: BTreeMap<String, B>) -> Publication<B> {
        Publication {
            metadata: self.metadata.clone(),
            artifacts,
            ready: self.ready,
            release_time: self.release_time,
        }
    }
}

/// Datetimes are written as `YYYY-MM-DD HH:MM:SS`, like metadata values.
mod datetime_format {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use crate::smartdates::Temporal;

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(dt) => serializer.collect_str(&Temporal::DateTime(*dt)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        match Option::<Temporal>::deserialize(deserializer)? {
            None => Ok(None),
            Some(Temporal::DateTime(dt)) => Ok(Some(dt)),
            Some(Temporal::Date(d)) => {
                Err(serde::de::Error::custom(format!("release time {d} is not a datetime")))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn universe() -> Universe<u8> {
        let mut a = Collection::new(Schema::permissive());
        a.publications.insert(
            "01".to_string(),
            Publication::new(
                BTreeMap::new(),
                BTreeMap::from([("x".to_string(), 1), ("y".to_string(), 2)]),
            ),
        );
        let mut b = Collection::new(Schema::permissive());
        b.publications.insert(
            "02".to_string(),
            Publication::new(BTreeMap::new(), BTreeMap::from([("z".to_string(), 3)])),
        );
        Universe::new(BTreeMap::from([("b".to_string(), b), ("a".to_string(), a)]))
    }

    #[test]
    fn test_artifacts_in_key_order() {
        let u = universe();
        let keys: Vec<_> = u
            .artifacts()
            .map(|r| {
                format!("{}/{}/{}={}", r.collection_key, r.publication_key, r.artifact_key, r.artifact)
            })
            .collect();

        assert_eq!(keys, vec!["a/01/x=1", "a/01/y=2", "b/02/z=3"]);
        assert_eq!(u.artifact_count(), 3);
    }

    #[test]
    fn test_with_artifacts_keeps_publication_fields() {
        let mut p: Publication<u8> = Publication::new(BTreeMap::new(), BTreeMap::new());
        p.ready = false;
        let q: Publication<String> = p.with_artifacts(BTreeMap::new());
        assert!(!q.ready);
    }

    #[test]
    fn test_unbuilt_release_time_format() {
        let artifact = UnbuiltArtifact {
            workdir: PathBuf::from("/tmp/hw"),
            file: "hw.pdf".to_string(),
            recipe: None,
            release_time: chrono::NaiveDate::from_ymd_opt(2020, 12, 15)
                .unwrap()
                .and_hms_opt(23, 0, 0),
            ready: true,
            missing_ok: false,
        };

        let json = serde_json::to_value(&artifact).unwrap();
        assert_eq!(json["release_time"], "2020-12-15 23:00:00");

        let back: UnbuiltArtifact = serde_json::from_value(json).unwrap();
        assert_eq!(back, artifact);
    }
}
