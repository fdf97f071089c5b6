// Configuration - food-catalog.yaml
//
// Looked up in the working directory and then in `$HOME`. A missing file
// means defaults; an explicit `--config` path must exist.

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing_subscriber::filter::LevelFilter;

pub const CONFIG_FILE: &str = "food-catalog.yaml";

pub const DEFAULT_DATABASE: &str = "food-catalog.db";

pub const DEFAULT_LISTEN: &str = "0.0.0.0:8080";

/// Default per-request deadline in seconds.
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;

pub const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// SQLite file, or `:memory:`.
    pub database: PathBuf,
    pub listen: String,
    pub request_timeout_secs: u64,
    pub logger: LoggerConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LoggerConfig {
    /// JSON console output instead of the human-readable format.
    pub production: bool,
    /// Console level; `RUST_LOG` takes precedence when set.
    pub level: String,
    pub console: bool,
    pub file_appenders: Vec<FileAppender>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileAppender {
    pub file: PathBuf,
    #[serde(default = "default_level")]
    pub level: String,
}

fn default_level() -> String {
    DEFAULT_LOG_LEVEL.to_string()
}

impl Default for Config {
    fn default() -> Self {
        Config {
            database: PathBuf::from(DEFAULT_DATABASE),
            listen: DEFAULT_LISTEN.to_string(),
            request_timeout_secs: DEFAULT_REQUEST_TIMEOUT_SECS,
            logger: LoggerConfig::default(),
        }
    }
}

impl Default for LoggerConfig {
    fn default() -> Self {
        LoggerConfig {
            production: false,
            level: default_level(),
            console: true,
            file_appenders: Vec::new(),
        }
    }
}

impl Config {
    /// Load the explicit file if given, else the discovered one, else defaults.
    pub fn load(explicit: Option<&Path>) -> Result<Config> {
        match explicit {
            Some(path) => Config::from_file(path),
            None => match discover(&search_dirs()) {
                Some(path) => Config::from_file(&path),
                None => Ok(Config::default()),
            },
        }
    }

    pub fn from_file(path: &Path) -> Result<Config> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config = Config::from_yaml(&text)
            .with_context(|| format!("Invalid config {}", path.display()))?;
        Ok(config)
    }

    pub fn from_yaml(text: &str) -> Result<Config> {
        // An empty document deserializes to unit, not to defaults
        if text.trim().is_empty() {
            return Ok(Config::default());
        }
        let config: Config = serde_yaml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.request_timeout_secs == 0 {
            bail!("request_timeout_secs must be greater than zero");
        }
        parse_level(&self.logger.level)?;
        for appender in &self.logger.file_appenders {
            parse_level(&appender.level)?;
        }
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parse a level name (`trace`, `debug`, `info`, `warn`, `error`, `off`).
pub fn parse_level(level: &str) -> Result<LevelFilter> {
    level
        .trim()
        .parse::<LevelFilter>()
        .map_err(|_| anyhow::anyhow!("logger level not allowed: {level}"))
}

/// Working directory first, then home.
fn search_dirs() -> Vec<PathBuf> {
    let mut dirs = Vec::new();
    if let Ok(cwd) = std::env::current_dir() {
        dirs.push(cwd);
    }
    if let Some(home) = std::env::var_os("HOME") {
        dirs.push(PathBuf::from(home));
    }
    dirs
}

/// First directory holding a config file.
pub fn discover(dirs: &[PathBuf]) -> Option<PathBuf> {
    dirs.iter()
        .map(|dir| dir.join(CONFIG_FILE))
        .find(|candidate| candidate.is_file())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.database, PathBuf::from("food-catalog.db"));
        assert_eq!(config.listen, "0.0.0.0:8080");
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert!(config.logger.console);
        assert!(config.logger.file_appenders.is_empty());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = Config::from_yaml(
            "database: ':memory:'\nlogger:\n  production: true\n  file_appenders:\n    - file: app.log\n      level: debug\n",
        )
        .unwrap();

        assert_eq!(config.database, PathBuf::from(":memory:"));
        assert_eq!(config.listen, DEFAULT_LISTEN);
        assert!(config.logger.production);
        assert_eq!(config.logger.level, "info");
        assert_eq!(config.logger.file_appenders[0].level, "debug");
    }

    #[test]
    fn test_empty_yaml_is_default() {
        assert_eq!(Config::from_yaml("  \n").unwrap(), Config::default());
    }

    #[test]
    fn test_rejects_bad_level_and_unknown_keys() {
        assert!(Config::from_yaml("logger:\n  level: loud\n").is_err());
        assert!(Config::from_yaml("databse: x.db\n").is_err());
        assert!(Config::from_yaml("request_timeout_secs: 0\n").is_err());
    }

    #[test]
    fn test_discover_prefers_first_dir() {
        let first = tempfile::tempdir().unwrap();
        let second = tempfile::tempdir().unwrap();
        std::fs::write(second.path().join(CONFIG_FILE), "listen: 127.0.0.1:1\n").unwrap();

        let dirs = vec![first.path().to_path_buf(), second.path().to_path_buf()];
        assert_eq!(discover(&dirs), Some(second.path().join(CONFIG_FILE)));

        std::fs::write(first.path().join(CONFIG_FILE), "listen: 127.0.0.1:2\n").unwrap();
        assert_eq!(discover(&dirs), Some(first.path().join(CONFIG_FILE)));
    }

    #[test]
    fn test_explicit_missing_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(Config::load(Some(&dir.path().join("nope.yaml"))).is_err());
    }

    #[test]
    fn test_parse_level() {
        assert_eq!(parse_level("DEBUG").unwrap(), LevelFilter::DEBUG);
        assert_eq!(parse_level("off").unwrap(), LevelFilter::OFF);
        assert!(parse_level("verbose").is_err());
    }
}
