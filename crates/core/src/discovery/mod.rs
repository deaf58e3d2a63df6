//! Discovery of collections and publications in an input directory.
//!
//! A directory holding `collection.yaml` is a collection; one holding
//! `publish.yaml` is a publication and belongs to the nearest collection
//! above it, or to the `default` collection when there is none.

pub mod errors;
pub mod reader;
pub mod walker;

use std::collections::BTreeMap;
use std::path::Path;

use tracing::info;

pub use errors::DiscoveryError;
pub use reader::{read_collection_file, read_publication_file};
pub use walker::{MarkedDir, MarkerKind, TreeWalker};

use crate::schema::Schema;
use crate::smartdates::{DateContext, Temporal};
use crate::tree::{Collection, Publication, UnbuiltArtifact, Universe};

pub const COLLECTION_FILE: &str = "collection.yaml";
pub const PUBLICATION_FILE: &str = "publish.yaml";
pub const DEFAULT_COLLECTION: &str = "default";

#[derive(Debug, Clone, Default)]
pub struct DiscoverOptions {
    /// Directory names that are never entered.
    pub skip_directories: Vec<String>,
    /// Context for smart dates in publication files.
    pub date_context: DateContext,
}

/// Find every collection and publication below `input_dir`.
pub fn discover(
    input_dir: &Path,
    options: &DiscoverOptions,
) -> Result<Universe<UnbuiltArtifact>, DiscoveryError> {
    let walker = TreeWalker::with_skipped(input_dir, options.skip_directories.clone())?;
    let found = walker.walk()?;

    let (collection_dirs, publication_dirs): (Vec<_>, Vec<_>) =
        found.iter().partition(|m| m.kind == MarkerKind::Collection);

    let mut collections: BTreeMap<String, Collection<UnbuiltArtifact>> = BTreeMap::new();
    collections.insert(DEFAULT_COLLECTION.to_string(), Collection::new(Schema::permissive()));

    for dir in &collection_dirs {
        let nested = collection_dirs.iter().any(|other| {
            other.relative_path != dir.relative_path
                && dir.relative_path.starts_with(&other.relative_path)
        });
        if nested {
            return Err(DiscoveryError::NestedCollection(dir.path.clone()));
        }

        let collection = read_collection_file(&dir.marker_file())?;
        info!("Found collection {}", dir.path.display());
        collections.insert(key_for(&dir.relative_path), collection);
    }

    // Group publications under their collection before reading them, so that
    // ordered collections can be read in key order.
    let mut grouped: BTreeMap<String, BTreeMap<String, &MarkedDir>> = BTreeMap::new();
    for dir in &publication_dirs {
        let owner = collection_dirs
            .iter()
            .find(|c| dir.relative_path.starts_with(&c.relative_path));

        let (collection_key, relative) = match owner {
            Some(c) => (
                key_for(&c.relative_path),
                dir.relative_path.strip_prefix(&c.relative_path).unwrap_or(&dir.relative_path),
            ),
            None => (DEFAULT_COLLECTION.to_string(), dir.relative_path.as_path()),
        };

        grouped.entry(collection_key).or_default().insert(key_for(relative), *dir);
    }

    for (collection_key, publications) in grouped {
        let Some(collection) = collections.get_mut(&collection_key) else {
            continue;
        };
        let schema = collection.schema.clone();

        let mut previous: Option<BTreeMap<String, Temporal>> = None;
        for (publication_key, dir) in publications {
            let mut context = options.date_context.clone();
            if schema.is_ordered
                && let Some(prev) = previous.take()
            {
                context = context.with_previous(prev);
            }

            let publication = read_publication_file(&dir.marker_file(), Some(&schema), &context)?;
            info!("Found publication {}", dir.path.display());

            if schema.is_ordered {
                previous = Some(temporal_metadata(&publication));
            }
            collection.publications.insert(publication_key, publication);
        }
    }

    Ok(Universe::new(collections))
}

/// `/`-separated key for a relative path; the empty path is `"."`.
fn key_for(relative: &Path) -> String {
    let parts: Vec<_> =
        relative.components().map(|c| c.as_os_str().to_string_lossy().into_owned()).collect();
    if parts.is_empty() { ".".to_string() } else { parts.join("/") }
}

fn temporal_metadata<A>(publication: &Publication<A>) -> BTreeMap<String, Temporal> {
    publication
        .metadata
        .iter()
        .filter_map(|(k, v)| v.as_temporal().map(|t| (k.clone(), t)))
        .collect()
}
