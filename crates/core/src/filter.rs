use std::collections::BTreeMap;

use tracing::debug;

use crate::tree::{Collection, Universe};

/// Keep only the artifacts for which `keep(artifact_key, artifact)` holds.
///
/// With `remove_empty`, publications left without artifacts and collections
/// left without publications are dropped as well.
pub fn filter_artifacts<A, F>(universe: Universe<A>, mut keep: F, remove_empty: bool) -> Universe<A>
where
    F: FnMut(&str, &A) -> bool,
{
    let mut collections = BTreeMap::new();

    for (collection_key, collection) in universe.collections {
        let mut publications = BTreeMap::new();

        for (publication_key, mut publication) in collection.publications {
            publication.artifacts.retain(|artifact_key, artifact| {
                let kept = keep(artifact_key, artifact);
                if !kept {
                    debug!("Removing {collection_key}/{publication_key}/{artifact_key}");
                }
                kept
            });

            if remove_empty && publication.artifacts.is_empty() {
                continue;
            }
            publications.insert(publication_key, publication);
        }

        if remove_empty && publications.is_empty() {
            continue;
        }
        collections.insert(collection_key, Collection { schema: collection.schema, publications });
    }

    Universe::new(collections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Schema;
    use crate::tree::Publication;

    fn universe() -> Universe<u8> {
        let mut hw = Collection::new(Schema::permissive());
        hw.publications.insert(
            "01".to_string(),
            Publication::new(
                BTreeMap::new(),
                BTreeMap::from([("homework".to_string(), 1), ("solution".to_string(), 2)]),
            ),
        );
        hw.publications.insert(
            "02".to_string(),
            Publication::new(BTreeMap::new(), BTreeMap::from([("homework".to_string(), 3)])),
        );
        let mut notes = Collection::new(Schema::permissive());
        notes.publications.insert(
            "intro".to_string(),
            Publication::new(BTreeMap::new(), BTreeMap::from([("slides".to_string(), 4)])),
        );
        Universe::new(BTreeMap::from([
            ("homeworks".to_string(), hw),
            ("notes".to_string(), notes),
        ]))
    }

    #[test]
    fn test_filter_by_key_removes_empty_nodes() {
        let filtered = filter_artifacts(universe(), |k, _| k == "solution", true);

        assert_eq!(filtered.collections.len(), 1);
        let hw = &filtered.collections["homeworks"];
        assert_eq!(hw.publications.len(), 1);
        assert_eq!(hw.publications["01"].artifacts.keys().collect::<Vec<_>>(), vec!["solution"]);
    }

    #[test]
    fn test_filter_keeps_empty_nodes_when_asked() {
        let filtered = filter_artifacts(universe(), |_, v| *v > 2, false);

        assert_eq!(filtered.collections.len(), 2);
        assert!(filtered.collections["homeworks"].publications["01"].artifacts.is_empty());
        assert_eq!(filtered.artifact_count(), 2);
    }
}
