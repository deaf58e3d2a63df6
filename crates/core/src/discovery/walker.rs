//! Recursive search for collection and publication directories.

use std::path::{Path, PathBuf};

use tracing::{debug, info};
use walkdir::WalkDir;

use super::errors::DiscoveryError;
use super::{COLLECTION_FILE, PUBLICATION_FILE};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerKind {
    Collection,
    Publication,
}

impl MarkerKind {
    pub fn file_name(self) -> &'static str {
        match self {
            Self::Collection => COLLECTION_FILE,
            Self::Publication => PUBLICATION_FILE,
        }
    }
}

/// A directory holding a marker file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkedDir {
    pub kind: MarkerKind,
    /// Absolute path of the directory.
    pub path: PathBuf,
    /// Path relative to the walk root; empty for the root itself.
    pub relative_path: PathBuf,
}

impl MarkedDir {
    pub fn marker_file(&self) -> PathBuf {
        self.path.join(self.kind.file_name())
    }
}

/// Walker for finding marked directories below an input directory.
#[derive(Debug)]
pub struct TreeWalker {
    root: PathBuf,
    /// Directory names that are never entered, at any depth.
    skip_directories: Vec<String>,
}

impl TreeWalker {
    pub fn new(root: &Path) -> Result<Self, DiscoveryError> {
        Self::with_skipped(root, Vec::new())
    }

    pub fn with_skipped(
        root: &Path,
        skip_directories: Vec<String>,
    ) -> Result<Self, DiscoveryError> {
        let root = root
            .canonicalize()
            .map_err(|_| DiscoveryError::MissingRoot(root.display().to_string()))?;

        if !root.is_dir() {
            return Err(DiscoveryError::MissingRoot(root.display().to_string()));
        }

        Ok(Self { root, skip_directories })
    }

    /// All marked directories, sorted by relative path so that a directory
    /// always comes before its descendants.
    pub fn walk(&self) -> Result<Vec<MarkedDir>, DiscoveryError> {
        let mut found = Vec::new();

        for entry in WalkDir::new(&self.root)
            .follow_links(false)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| !self.is_skipped(e))
        {
            let entry = entry
                .map_err(|e| DiscoveryError::WalkError(self.root.display().to_string(), e))?;

            if !entry.file_type().is_dir() {
                continue;
            }

            let path = entry.path();
            let is_collection = path.join(COLLECTION_FILE).is_file();
            let is_publication = path.join(PUBLICATION_FILE).is_file();

            let kind = match (is_collection, is_publication) {
                (true, true) => {
                    return Err(DiscoveryError::CollectionAndPublication(path.to_path_buf()));
                }
                (true, false) => MarkerKind::Collection,
                (false, true) => MarkerKind::Publication,
                (false, false) => continue,
            };

            let relative_path = path.strip_prefix(&self.root).unwrap_or(path).to_path_buf();
            debug!(path = %relative_path.display(), ?kind, "found marker");

            found.push(MarkedDir { kind, path: path.to_path_buf(), relative_path });
        }

        found.sort_by(|a, b| a.relative_path.cmp(&b.relative_path));
        Ok(found)
    }

    fn is_skipped(&self, entry: &walkdir::DirEntry) -> bool {
        // Never skip the root directory (depth 0)
        if entry.depth() == 0 || !entry.file_type().is_dir() {
            return false;
        }

        let name = entry.file_name().to_string_lossy();
        let skipped = self.skip_directories.iter().any(|s| *s == name);
        if skipped {
            info!("Skipping directory {}", entry.path().display());
        }
        skipped
    }

    pub fn root(&self) -> &Path {
        &self.root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn touch(root: &Path, rel: &str) {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, "").unwrap();
    }

    fn create_test_tree() -> TempDir {
        let dir = TempDir::new().unwrap();
        let root = dir.path();

        touch(root, "homeworks/collection.yaml");
        touch(root, "homeworks/01/publish.yaml");
        touch(root, "homeworks/02/publish.yaml");
        touch(root, "notes/publish.yaml");
        touch(root, "drafts/03/publish.yaml");
        touch(root, "misc/readme.txt");

        dir
    }

    fn relative(found: &[MarkedDir]) -> Vec<String> {
        found.iter().map(|m| m.relative_path.to_string_lossy().replace('\\', "/")).collect()
    }

    #[test]
    fn test_walk_finds_marked_directories() {
        let tree = create_test_tree();
        let found = TreeWalker::new(tree.path()).unwrap().walk().unwrap();

        assert_eq!(
            relative(&found),
            vec!["drafts/03", "homeworks", "homeworks/01", "homeworks/02", "notes"]
        );
        assert_eq!(found[1].kind, MarkerKind::Collection);
        assert_eq!(found[2].kind, MarkerKind::Publication);
        assert!(found[2].marker_file().ends_with("publish.yaml"));
    }

    #[test]
    fn test_walk_skips_named_directories() {
        let tree = create_test_tree();
        let walker = TreeWalker::with_skipped(tree.path(), vec!["drafts".to_string()]).unwrap();
        let found = walker.walk().unwrap();

        assert!(!relative(&found).iter().any(|p| p.starts_with("drafts")));
        assert_eq!(found.len(), 4);
    }

    #[test]
    fn test_walk_includes_root() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "publish.yaml");

        let found = TreeWalker::new(dir.path()).unwrap().walk().unwrap();
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].relative_path, PathBuf::new());
    }

    #[test]
    fn test_walk_rejects_double_marker() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "x/publish.yaml");
        touch(dir.path(), "x/collection.yaml");

        let result = TreeWalker::new(dir.path()).unwrap().walk();
        assert!(matches!(result, Err(DiscoveryError::CollectionAndPublication(_))));
    }

    #[test]
    fn test_missing_root() {
        let result = TreeWalker::new(Path::new("/nonexistent/path"));
        assert!(matches!(result.unwrap_err(), DiscoveryError::MissingRoot(_)));
    }
}
