use std::path::PathBuf;

use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigFile {
    pub version: u32,
    /// Anchor for `<weekday> of week <n>` smart dates, as `YYYY-MM-DD`.
    #[serde(default)]
    pub start_of_week_one: Option<String>,
    /// Directory names never entered during discovery.
    #[serde(default)]
    pub skip_directories: Vec<String>,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Deserialize, Clone, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub file_level: Option<String>,
    #[serde(default)]
    pub file: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { level: default_log_level(), file_level: None, file: None }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Configuration after path expansion and date parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConfig {
    /// File the configuration came from; `None` for built-in defaults.
    pub source: Option<PathBuf>,
    pub start_of_week_one: Option<NaiveDate>,
    pub skip_directories: Vec<String>,
    pub logging: LoggingConfig,
}
