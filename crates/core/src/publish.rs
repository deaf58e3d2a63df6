//! Copying built artifacts into the output directory.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::tree::{BuiltArtifact, Collection, PublishedArtifact, Universe};

#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to copy {from} to {to}: {source}")]
    Copy {
        from: PathBuf,
        to: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Copy every artifact to `<outdir>/<collection>/<publication>/<artifact>`.
pub fn publish(
    universe: &Universe<BuiltArtifact>,
    outdir: &Path,
) -> Result<Universe<PublishedArtifact>, PublishError> {
    let mut collections = BTreeMap::new();

    for (collection_key, collection) in &universe.collections {
        let mut publications = BTreeMap::new();

        for (publication_key, publication) in &collection.publications {
            let mut artifacts = BTreeMap::new();
            for (artifact_key, artifact) in &publication.artifacts {
                let relative = format!("{collection_key}/{publication_key}/{artifact_key}");
                let published = publish_artifact(artifact, outdir, relative)?;
                artifacts.insert(artifact_key.clone(), published);
            }
            publications.insert(publication_key.clone(), publication.with_artifacts(artifacts));
        }

        collections.insert(
            collection_key.clone(),
            Collection { schema: collection.schema.clone(), publications },
        );
    }

    Ok(Universe::new(collections))
}

fn publish_artifact(
    artifact: &BuiltArtifact,
    outdir: &Path,
    relative: String,
) -> Result<PublishedArtifact, PublishError> {
    let from = artifact.workdir.join(&artifact.file);
    let to = outdir.join(&relative);

    if let Some(parent) = to.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| PublishError::CreateDir { path: parent.to_path_buf(), source: e })?;
    }

    debug!("Copying {} to {}", from.display(), to.display());
    fs::copy(&from, &to)
        .map_err(|e| PublishError::Copy { from: from.clone(), to: to.clone(), source: e })?;
    info!("Published {relative}");

    Ok(PublishedArtifact { path: relative })
}
