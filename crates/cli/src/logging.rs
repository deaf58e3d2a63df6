use publish_core::config::types::{LoggingConfig, ResolvedConfig};
use std::fs::{self, File};
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::filter::{EnvFilter, LevelFilter};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;

static LOG_GUARD: Mutex<Option<tracing_appender::non_blocking::WorkerGuard>> =
    Mutex::new(None);

/// Install the stderr layer, plus a file layer when `[logging] file` is set.
/// `RUST_LOG` overrides the configured levels.
pub fn init(cfg: &ResolvedConfig) {
    let logging = &cfg.logging;
    let stderr_level = parse_level(&logging.level).unwrap_or(LevelFilter::INFO);

    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .with_filter(env_filter(stderr_level));

    let file_layer = logging.file.as_deref().map(|path| {
        let file = open_log_file(path);
        let (non_blocking, guard) = tracing_appender::non_blocking(file);

        if let Ok(mut g) = LOG_GUARD.lock() {
            *g = Some(guard);
        }

        fmt::layer()
            .with_writer(non_blocking)
            .with_ansi(false)
            .with_file(true)
            .with_line_number(true)
            .with_filter(env_filter(file_level(logging)))
    });

    tracing_subscriber::registry().with(stderr_layer).with(file_layer).init();
}

fn env_filter(level: LevelFilter) -> EnvFilter {
    EnvFilter::builder().with_default_directive(level.into()).from_env_lossy()
}

fn file_level(logging: &LoggingConfig) -> LevelFilter {
    let name = logging.file_level.as_deref().unwrap_or(&logging.level);
    parse_level(name).unwrap_or(LevelFilter::DEBUG)
}

fn open_log_file(path: &Path) -> File {
    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        let _ = fs::create_dir_all(parent);
    }

    File::create(path).unwrap_or_else(|e| {
        eprintln!("Failed to create log file {}: {}", path.display(), e);
        std::process::exit(1);
    })
}

fn parse_level(s: &str) -> Option<LevelFilter> {
    match s.to_lowercase().as_str() {
        "off" => Some(LevelFilter::OFF),
        "error" => Some(LevelFilter::ERROR),
        "warn" => Some(LevelFilter::WARN),
        "info" => Some(LevelFilter::INFO),
        "debug" => Some(LevelFilter::DEBUG),
        "trace" => Some(LevelFilter::TRACE),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("off"), Some(LevelFilter::OFF));
        assert_eq!(parse_level("WARN"), Some(LevelFilter::WARN));
        assert_eq!(parse_level("Debug"), Some(LevelFilter::DEBUG));
        assert_eq!(parse_level("verbose"), None);
        assert_eq!(parse_level(""), None);
    }

    #[test]
    fn test_file_level_falls_back_to_level() {
        let mut logging = LoggingConfig {
            level: "warn".to_string(),
            file_level: None,
            file: Some(PathBuf::from("publish.log")),
        };
        assert_eq!(file_level(&logging), LevelFilter::WARN);

        logging.file_level = Some("trace".to_string());
        assert_eq!(file_level(&logging), LevelFilter::TRACE);

        logging.file_level = Some("loud".to_string());
        assert_eq!(file_level(&logging), LevelFilter::DEBUG);
    }
}
