use chrono::NaiveDate;
use publish_core::config::loader::ConfigLoader;
use std::fs;
use std::path::PathBuf;
use tempfile::tempdir;

fn write_file(path: &PathBuf, content: &str) {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

#[test]
fn load_full_config_ok() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.toml");
    let toml = r#"
version = 1
start_of_week_one = "2021-01-04"
skip_directories = ["drafts", ".git"]

[logging]
level = "debug"
file_level = "trace"
file = "/tmp/publish.log"
"#;

    write_file(&cfg_path, toml);

    let rc = ConfigLoader::load(Some(&cfg_path)).expect("should load");
    assert_eq!(rc.source.as_deref(), Some(cfg_path.as_path()));
    assert_eq!(rc.start_of_week_one, NaiveDate::from_ymd_opt(2021, 1, 4));
    assert_eq!(rc.skip_directories, vec!["drafts", ".git"]);
    assert_eq!(rc.logging.level, "debug");
    assert_eq!(rc.logging.file_level.as_deref(), Some("trace"));
    assert_eq!(rc.logging.file, Some(PathBuf::from("/tmp/publish.log")));
}

#[test]
fn load_minimal_config_uses_defaults() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("publish/config.toml");
    write_file(&cfg_path, "version = 1\n");

    let rc = ConfigLoader::load(Some(&cfg_path)).expect("should load");
    assert_eq!(rc.start_of_week_one, None);
    assert!(rc.skip_directories.is_empty());
    assert_eq!(rc.logging.level, "info");
    assert_eq!(rc.logging.file, None);
}

#[test]
fn log_file_path_is_expanded() {
    let tmp = tempdir().unwrap();
    let cfg_path = tmp.path().join("config.toml");
    write_file(&cfg_path, "version = 1\n[logging]\nfile = \"~/publish.log\"\n");

    let rc = ConfigLoader::load(Some(&cfg_path)).expect("should load");
    let file = rc.logging.file.unwrap();
    assert!(!file.to_string_lossy().starts_with('~'));
    assert!(file.ends_with("publish.log"));
}
