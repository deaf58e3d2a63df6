use std::path::PathBuf;

use thiserror::Error;

use crate::schema::SchemaError;
use crate::smartdates::SmartDateError;

/// Errors raised while reading the input tree. Each names the offending path.
#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("input directory does not exist: {0}")]
    MissingRoot(String),

    #[error("failed to walk input directory {0}: {1}")]
    WalkError(String, #[source] walkdir::Error),

    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("error reading {path}: {source}")]
    Yaml {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("error reading {path}: {message}")]
    Invalid { path: PathBuf, message: String },

    #[error("error reading {path}: {source}")]
    SmartDate {
        path: PathBuf,
        #[source]
        source: SmartDateError,
    },

    #[error("error reading {path}: {source}")]
    Schema {
        path: PathBuf,
        #[source]
        source: SchemaError,
    },

    #[error("cannot be both a publication and a collection: {0}")]
    CollectionAndPublication(PathBuf),

    #[error("nested collection found: {0}")]
    NestedCollection(PathBuf),
}
