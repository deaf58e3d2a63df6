//! Running artifact recipes.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::process::{Command, Stdio};

use chrono::NaiveDateTime;
use thiserror::Error;
use tracing::{info, warn};

use crate::tree::{BuiltArtifact, Collection, Publication, UnbuiltArtifact, Universe};

#[derive(Debug, Error)]
pub enum BuildError {
    #[error("failed to run recipe '{recipe}' in {workdir}: {source}")]
    Spawn {
        recipe: String,
        workdir: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("there was a problem while building the artifact {file} (exit code {code:?}):\n{stderr}")]
    RecipeFailed { file: PathBuf, code: Option<i32>, stderr: String },

    #[error("artifact file {0} does not exist")]
    MissingFile(PathBuf),
}

#[derive(Debug, Clone)]
pub struct BuildOptions {
    /// Build everything regardless of release times.
    pub ignore_release_time: bool,
    /// Let recipe output through instead of capturing it.
    pub verbose: bool,
    /// Release times after this are in the future.
    pub now: NaiveDateTime,
}

impl BuildOptions {
    pub fn new(now: NaiveDateTime) -> Self {
        Self { ignore_release_time: false, verbose: false, now }
    }

    fn too_soon(&self, release_time: Option<NaiveDateTime>) -> bool {
        !self.ignore_release_time && release_time.is_some_and(|t| t > self.now)
    }
}

/// Build every artifact in the universe.
///
/// Publications and artifacts that are not ready, or not yet released, are
/// dropped from the result.
pub fn build(
    universe: &Universe<UnbuiltArtifact>,
    options: &BuildOptions,
) -> Result<Universe<BuiltArtifact>, BuildError> {
    let mut collections = BTreeMap::new();

    for (collection_key, collection) in &universe.collections {
        let mut publications = BTreeMap::new();
        for (publication_key, publication) in &collection.publications {
            let label = format!("{collection_key}/{publication_key}");
            if let Some(built) = build_publication(&label, publication, options)? {
                publications.insert(publication_key.clone(), built);
            }
        }
        collections.insert(
            collection_key.clone(),
            Collection { schema: collection.schema.clone(), publications },
        );
    }

    Ok(Universe::new(collections))
}

/// Build one publication; `None` when it is not ready or not yet released.
pub fn build_publication(
    label: &str,
    publication: &Publication<UnbuiltArtifact>,
    options: &BuildOptions,
) -> Result<Option<Publication<BuiltArtifact>>, BuildError> {
    if !publication.ready {
        warn!("{label}: not ready, skipping");
        return Ok(None);
    }

    if options.too_soon(publication.release_time) {
        if let Some(t) = publication.release_time {
            warn!("{label}: release time {t} has not yet been reached, skipping");
        }
        return Ok(None);
    }

    let mut artifacts = BTreeMap::new();
    for (key, artifact) in &publication.artifacts {
        if let Some(built) = build_artifact(&format!("{label}/{key}"), artifact, options)? {
            artifacts.insert(key.clone(), built);
        }
    }

    Ok(Some(publication.with_artifacts(artifacts)))
}

/// Build one artifact; `None` when it is skipped or its missing file is
/// allowed.
pub fn build_artifact(
    label: &str,
    artifact: &UnbuiltArtifact,
    options: &BuildOptions,
) -> Result<Option<BuiltArtifact>, BuildError> {
    if options.too_soon(artifact.release_time) {
        if let Some(t) = artifact.release_time {
            warn!("{label}: release time {t} has not yet been reached, skipping");
        }
        return Ok(None);
    }

    if !artifact.ready {
        warn!("{label}: not ready, skipping");
        return Ok(None);
    }

    let mut built = BuiltArtifact {
        workdir: artifact.workdir.clone(),
        file: artifact.file.clone(),
        returncode: None,
        stdout: None,
        stderr: None,
    };

    if let Some(recipe) = &artifact.recipe {
        info!("{label}: running '{recipe}'");
        let (code, stdout, stderr) = run_recipe(recipe, artifact, options.verbose)?;
        built.returncode = code;
        built.stdout = stdout;
        built.stderr = stderr;
    }

    let path = artifact.workdir.join(&artifact.file);
    if !path.exists() {
        if artifact.missing_ok {
            warn!("{label}: file missing, but missing_ok is set");
            return Ok(None);
        }
        return Err(BuildError::MissingFile(path));
    }

    info!("{label}: build was successful");
    Ok(Some(built))
}

type RecipeOutput = (Option<i32>, Option<String>, Option<String>);

fn run_recipe(
    recipe: &str,
    artifact: &UnbuiltArtifact,
    verbose: bool,
) -> Result<RecipeOutput, BuildError> {
    let mut command = shell_command(recipe);
    command.current_dir(&artifact.workdir);

    let spawn_error = |e| BuildError::Spawn {
        recipe: recipe.to_string(),
        workdir: artifact.workdir.clone(),
        source: e,
    };

    let (status, stdout, stderr) = if verbose {
        let status = command
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit())
            .status()
            .map_err(spawn_error)?;
        (status, None, None)
    } else {
        let output = command.output().map_err(spawn_error)?;
        (
            output.status,
            Some(String::from_utf8_lossy(&output.stdout).into_owned()),
            Some(String::from_utf8_lossy(&output.stderr).into_owned()),
        )
    };

    if !status.success() {
        return Err(BuildError::RecipeFailed {
            file: artifact.workdir.join(&artifact.file),
            code: status.code(),
            stderr: stderr.unwrap_or_default(),
        });
    }

    Ok((status.code(), stdout, stderr))
}

#[cfg(not(windows))]
fn shell_command(recipe: &str) -> Command {
    let mut command = Command::new("sh");
    command.arg("-c").arg(recipe);
    command
}

#[cfg(windows)]
fn shell_command(recipe: &str) -> Command {
    let mut command = Command::new("cmd");
    command.arg("/C").arg(recipe);
    command
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use std::fs;
    use tempfile::TempDir;

    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2021, 1, 10).unwrap().and_hms_opt(12, 0, 0).unwrap()
    }

    fn artifact(dir: &TempDir, file: &str, recipe: Option<&str>) -> UnbuiltArtifact {
        UnbuiltArtifact {
            workdir: dir.path().to_path_buf(),
            file: file.to_string(),
            recipe: recipe.map(str::to_string),
            release_time: None,
            ready: true,
            missing_ok: false,
        }
    }

    #[test]
    fn test_recipe_runs_in_workdir() {
        let dir = TempDir::new().unwrap();
        let a = artifact(&dir, "out.txt", Some("echo hello > out.txt && echo done"));

        let built = build_artifact("a", &a, &BuildOptions::new(now())).unwrap().unwrap();

        assert_eq!(fs::read_to_string(dir.path().join("out.txt")).unwrap(), "hello\n");
        assert_eq!(built.returncode, Some(0));
        assert_eq!(built.stdout.as_deref(), Some("done\n"));
    }

    #[test]
    fn test_no_recipe_needs_existing_file() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("notes.pdf"), "pdf").unwrap();

        let built = build_artifact("a", &artifact(&dir, "notes.pdf", None), &BuildOptions::new(now()))
            .unwrap()
            .unwrap();
        assert_eq!(built.returncode, None);
        assert_eq!(built.stdout, None);
    }

    #[test]
    fn test_failing_recipe_is_error() {
        let dir = TempDir::new().unwrap();
        let a = artifact(&dir, "out.txt", Some("echo oops >&2; exit 3"));

        match build_artifact("a", &a, &BuildOptions::new(now())) {
            Err(BuildError::RecipeFailed { code, stderr, .. }) => {
                assert_eq!(code, Some(3));
                assert_eq!(stderr, "oops\n");
            }
            other => panic!("expected RecipeFailed, got {other:?}"),
        }
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut a = artifact(&dir, "never.txt", Some("true"));

        assert!(matches!(
            build_artifact("a", &a, &BuildOptions::new(now())),
            Err(BuildError::MissingFile(_))
        ));

        a.missing_ok = true;
        assert_eq!(build_artifact("a", &a, &BuildOptions::new(now())).unwrap(), None);
    }

    #[test]
    fn test_release_time_gates_artifact() {
        let dir = TempDir::new().unwrap();
        let mut a = artifact(&dir, "out.txt", Some("touch out.txt"));
        a.release_time = NaiveDate::from_ymd_opt(2021, 2, 1).unwrap().and_hms_opt(0, 0, 0);

        let options = BuildOptions::new(now());
        assert_eq!(build_artifact("a", &a, &options).unwrap(), None);
        assert!(!dir.path().join("out.txt").exists());

        let options = BuildOptions { ignore_release_time: true, ..options };
        assert!(build_artifact("a", &a, &options).unwrap().is_some());
    }

    #[test]
    fn test_not_ready_publication_is_dropped() {
        let dir = TempDir::new().unwrap();
        let mut p = Publication::new(
            BTreeMap::new(),
            BTreeMap::from([("x".to_string(), artifact(&dir, "out.txt", Some("touch out.txt")))]),
        );
        p.ready = false;

        let options = BuildOptions { ignore_release_time: true, ..BuildOptions::new(now()) };
        assert_eq!(build_publication("p", &p, &options).unwrap(), None);
    }

    #[test]
    fn test_build_universe_drops_unreleased_publications() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let released = Publication::new(
            BTreeMap::new(),
            BTreeMap::from([("a".to_string(), artifact(&dir, "a.txt", None))]),
        );
        let mut future = released.clone();
        future.release_time = NaiveDate::from_ymd_opt(2030, 1, 1).unwrap().and_hms_opt(0, 0, 0);

        let mut collection = Collection::new(crate::schema::Schema::permissive());
        collection.publications.insert("01".to_string(), released);
        collection.publications.insert("02".to_string(), future);
        let universe = Universe::new(BTreeMap::from([("default".to_string(), collection)]));

        let built = build(&universe, &BuildOptions::new(now())).unwrap();
        let publications = &built.collections["default"].publications;
        assert_eq!(publications.keys().collect::<Vec<_>>(), vec!["01"]);
    }
}
